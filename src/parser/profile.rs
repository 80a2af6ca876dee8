//! Execution profile parser (`.glbl`)

use std::collections::BTreeMap;

use super::{parse_markup, ArtifactParser};
use crate::core::fs_utils::file_stem;
use crate::core::ParseError;
use crate::model::{ArtifactKind, Profile, ProfileVariable};

#[derive(Debug, Default, Clone)]
pub struct ProfileParser;

impl ProfileParser {
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactParser for ProfileParser {
    type Output = Profile;

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Profile
    }

    fn parse(&self, path: &str, content: &str) -> Result<Profile, ParseError> {
        let root = parse_markup(path, self.kind(), content, &["GlobalVariableEntities"])?;

        let mut variables = BTreeMap::new();
        for entity in root.children_named("GlobalVariableEntity") {
            let name = entity.optional_text("name").ok_or_else(|| {
                ParseError::new(path, self.kind(), "global variable without <name>")
            })?;

            let variable = ProfileVariable {
                init_value: entity.text_of("initValue"),
                value_type: entity.optional_text("valueType"),
                description: entity.text_of("description"),
                is_protected: entity.child_bool("protected", false),
            };

            if variables.insert(name.clone(), variable).is_some() {
                return Err(ParseError::new(
                    path,
                    self.kind(),
                    format!("variable '{}' is declared twice", name),
                ));
            }
        }

        Ok(Profile {
            path: path.to_string(),
            name: root
                .optional_text("name")
                .unwrap_or_else(|| file_stem(path).to_string()),
            description: root.text_of("description"),
            tag: root.optional_text("tag"),
            is_default: root.child_bool("defaultProfile", false),
            variables,
        })
    }
}
