//! Test suite markup parser (`.ts`)

use super::xml::XmlElement;
use super::{parse_markup, required_text, ArtifactParser};
use crate::core::ParseError;
use crate::model::{ArtifactKind, SuiteEntry, TestSuite};

#[derive(Debug, Default, Clone)]
pub struct TestSuiteParser;

impl TestSuiteParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_entry(link: &XmlElement) -> Option<SuiteEntry> {
        // Ссылка без testCaseId ничего не адресует
        let test_case_id = link.optional_text("testCaseId")?;
        Some(SuiteEntry {
            test_case_id,
            guid: link.optional_text("guid"),
            is_run: link.child_bool("isRun", true),
            is_reuse_driver: link.child_bool("isReuseDriver", false),
            using_data_binding: link.child_bool("usingDataBindingAtTestSuiteLevel", false),
        })
    }
}

impl ArtifactParser for TestSuiteParser {
    type Output = TestSuite;

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::TestSuite
    }

    fn parse(&self, path: &str, content: &str) -> Result<TestSuite, ParseError> {
        let kind = self.kind();
        let root = parse_markup(path, kind, content, &["TestSuiteEntity"])?;
        let number = |field: &str, default: u32| {
            root.child_number(field, default)
                .map_err(|msg| ParseError::new(path, kind, msg))
        };

        Ok(TestSuite {
            path: path.to_string(),
            name: required_text(&root, "name", path, kind)?,
            description: root.text_of("description"),
            tag: root.optional_text("tag"),
            is_rerun: root.child_bool("isRerun", false),
            number_of_rerun: number("numberOfRerun", 0)?,
            rerun_failed_test_cases_only: root.child_bool("rerunFailedTestCasesOnly", false),
            rerun_immediately: root.child_bool("rerunImmediately", true),
            page_load_timeout: number("pageLoadTimeout", 30)?,
            page_load_timeout_default: root.child_bool("pageLoadTimeoutDefault", true),
            mail_recipient: root.optional_text("mailRecipient"),
            guid: root.optional_text("testSuiteGuid"),
            test_cases: root
                .children_named("testCaseLink")
                .filter_map(Self::parse_entry)
                .collect(),
            script: None,
            raw: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMOKE_TS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TestSuiteEntity>
   <description>Nightly smoke</description>
   <name>Smoke</name>
   <tag></tag>
   <isRerun>true</isRerun>
   <mailRecipient></mailRecipient>
   <numberOfRerun>2</numberOfRerun>
   <pageLoadTimeout>45</pageLoadTimeout>
   <pageLoadTimeoutDefault>false</pageLoadTimeoutDefault>
   <rerunFailedTestCasesOnly>true</rerunFailedTestCasesOnly>
   <testSuiteGuid>0b5e3e2c-44f1-4a34-a8b1-6b7bb1c7a0f2</testSuiteGuid>
   <testCaseLink>
      <guid>11111111-2222-3333-4444-555555555555</guid>
      <isReuseDriver>false</isReuseDriver>
      <isRun>true</isRun>
      <testCaseId>Test Cases/Login/Valid Login</testCaseId>
   </testCaseLink>
   <testCaseLink>
      <guid>66666666-7777-8888-9999-000000000000</guid>
      <isRun>false</isRun>
      <testCaseId>Test Cases/Checkout/Pay</testCaseId>
      <usingDataBindingAtTestSuiteLevel>true</usingDataBindingAtTestSuiteLevel>
   </testCaseLink>
</TestSuiteEntity>"#;

    #[test]
    fn test_parse_suite() {
        let suite = TestSuiteParser::new().parse("Test Suites/Smoke.ts", SMOKE_TS).unwrap();

        assert_eq!(suite.name, "Smoke");
        assert_eq!(suite.description, "Nightly smoke");
        assert!(suite.is_rerun);
        assert_eq!(suite.number_of_rerun, 2);
        assert_eq!(suite.page_load_timeout, 45);
        assert!(!suite.page_load_timeout_default);
        assert!(suite.rerun_failed_test_cases_only);
        assert!(suite.rerun_immediately);
        assert_eq!(suite.mail_recipient, None);
        assert!(!suite.raw);

        assert_eq!(suite.test_cases.len(), 2);
        assert_eq!(suite.test_cases[0].test_case_id, "Test Cases/Login/Valid Login");
        assert!(!suite.test_cases[0].using_data_binding);
        assert!(!suite.test_cases[1].is_run);
        assert!(suite.test_cases[1].using_data_binding);
        assert!(suite.uses_data_binding());
    }

    #[test]
    fn test_defaults() {
        let suite = TestSuiteParser::new()
            .parse("Test Suites/Empty.ts", "<TestSuiteEntity><name>Empty</name></TestSuiteEntity>")
            .unwrap();

        assert!(!suite.is_rerun);
        assert_eq!(suite.number_of_rerun, 0);
        assert_eq!(suite.page_load_timeout, 30);
        assert!(suite.test_cases.is_empty());
        assert!(!suite.uses_data_binding());
    }

    #[test]
    fn test_bad_number_is_error() {
        let err = TestSuiteParser::new()
            .parse(
                "Test Suites/Bad.ts",
                "<TestSuiteEntity><name>Bad</name><numberOfRerun>many</numberOfRerun></TestSuiteEntity>",
            )
            .unwrap_err();
        assert!(err.message.contains("numberOfRerun"));
    }

    #[test]
    fn test_suite_collection_is_not_a_suite() {
        let err = TestSuiteParser::new()
            .parse(
                "Test Suites/All.ts",
                "<TestSuiteCollectionEntity><name>All</name></TestSuiteCollectionEntity>",
            )
            .unwrap_err();
        assert_eq!(err.kind, ArtifactKind::TestSuite);
    }
}
