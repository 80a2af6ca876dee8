//! Test case markup parser (`.tc`)

use super::{parse_markup, required_text, ArtifactParser};
use crate::core::fs_utils::strip_extension;
use crate::core::ParseError;
use crate::model::{ArtifactKind, TestCase};

/// Парсер тест-кейсов. Шаги заполняются позже, при привязке скрипта.
#[derive(Debug, Default, Clone)]
pub struct TestCaseParser;

impl TestCaseParser {
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactParser for TestCaseParser {
    type Output = TestCase;

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::TestCase
    }

    fn parse(&self, path: &str, content: &str) -> Result<TestCase, ParseError> {
        let root = parse_markup(path, self.kind(), content, &["TestCase"])?;

        Ok(TestCase {
            path: path.to_string(),
            id: strip_extension(path).to_string(),
            name: required_text(&root, "name", path, self.kind())?,
            description: root.text_of("description"),
            tag: root.optional_text("tag"),
            comment: root.optional_text("comment"),
            record_option: root.optional_text("recordOption"),
            guid: root.optional_text("testCaseGuid"),
            script_path: None,
            steps: Vec::new(),
        })
    }
}
