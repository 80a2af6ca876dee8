//! Object repository entry parser (`.rs`)

use std::collections::BTreeMap;

use super::xml::XmlElement;
use super::{parse_markup, required_text, strip_dir, ArtifactParser};
use crate::core::fs_utils::strip_extension;
use crate::core::ParseError;
use crate::model::{ArtifactKind, ElementProperty, ElementType, RepositoryObject};

/// Parses object repository entries; ids are computed relative to the
/// repository directory.
#[derive(Debug, Clone)]
pub struct ObjectRepositoryParser {
    repository_dir: String,
}

impl ObjectRepositoryParser {
    pub fn new(repository_dir: impl Into<String>) -> Self {
        Self {
            repository_dir: repository_dir.into(),
        }
    }

    /// `Object Repository/Page_Login/btn.rs` -> `Page_Login/btn`
    pub fn object_id(&self, path: &str) -> String {
        strip_extension(strip_dir(path, &self.repository_dir)).to_string()
    }

    fn element_type(root_name: &str) -> Option<ElementType> {
        match root_name {
            "WebElementEntity" => Some(ElementType::WebElement),
            "MobileElementEntity" => Some(ElementType::MobileElement),
            "WindowsElementEntity" => Some(ElementType::WindowsElement),
            other if other.ends_with("Entity") => Some(ElementType::Unspecified),
            _ => None,
        }
    }

    fn collect_entries(root: &XmlElement, collection: &str) -> BTreeMap<String, String> {
        let mut entries = BTreeMap::new();
        if let Some(collection) = root.child(collection) {
            for entry in collection.children_named("entry") {
                if let (Some(key), Some(value)) = (entry.child_text("key"), entry.child_text("value")) {
                    entries.insert(key.to_string(), value.to_string());
                }
            }
        }
        entries
    }

    fn collect_properties(root: &XmlElement, tag: &str) -> Vec<ElementProperty> {
        root.children_named(tag)
            .map(|prop| ElementProperty {
                name: prop.text_of("name"),
                value: prop.text_of("value"),
                property_type: prop.optional_text("type"),
                match_condition: prop.optional_text("matchCondition"),
                is_selected: prop.child_bool("isSelected", false),
            })
            .collect()
    }
}

impl Default for ObjectRepositoryParser {
    fn default() -> Self {
        Self::new("Object Repository")
    }
}

impl ArtifactParser for ObjectRepositoryParser {
    type Output = RepositoryObject;

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::RepositoryObject
    }

    fn parse(&self, path: &str, content: &str) -> Result<RepositoryObject, ParseError> {
        let root = parse_markup(path, self.kind(), content, &[])?;
        let element_type = Self::element_type(&root.name).ok_or_else(|| {
            ParseError::new(
                path,
                self.kind(),
                format!("unexpected root element <{}>, expected an element entity", root.name),
            )
        })?;

        Ok(RepositoryObject {
            path: path.to_string(),
            id: self.object_id(path),
            name: required_text(&root, "name", path, self.kind())?,
            description: root.text_of("description"),
            tag: root.optional_text("tag"),
            element_type,
            guid: root.optional_text("elementGuidId"),
            selector_method: root.optional_text("selectorMethod"),
            smart_locator_enabled: root.child_bool("smartLocatorEnabled", false),
            selectors: Self::collect_entries(&root, "selectorCollection"),
            smart_locators: Self::collect_entries(&root, "smartLocatorCollection"),
            properties: Self::collect_properties(&root, "webElementProperties"),
            xpaths: Self::collect_properties(&root, "webElementXpaths"),
        })
    }
}
