/*!
# Project Model

Typed records produced by the format parsers. All records are immutable
once the walker has assembled them; identity is the normalized relative
path of the source file (`path`), derived ids are kept alongside.
*/

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Artifact kinds known to the analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    TestCase,
    TestSuite,
    KeywordFile,
    Keyword,
    RepositoryObject,
    Profile,
    Script,
}

impl ArtifactKind {
    /// Kinds that own a path-keyed mapping in the project model
    pub const MAPPED: [ArtifactKind; 6] = [
        ArtifactKind::TestCase,
        ArtifactKind::TestSuite,
        ArtifactKind::KeywordFile,
        ArtifactKind::RepositoryObject,
        ArtifactKind::Profile,
        ArtifactKind::Script,
    ];
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::TestCase => "TestCase",
            ArtifactKind::TestSuite => "TestSuite",
            ArtifactKind::KeywordFile => "KeywordFile",
            ArtifactKind::Keyword => "Keyword",
            ArtifactKind::RepositoryObject => "RepositoryObject",
            ArtifactKind::Profile => "Profile",
            ArtifactKind::Script => "Script",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ArtifactKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.trim_end_matches('s') {
            "testcase" | "case" => Ok(ArtifactKind::TestCase),
            "testsuite" | "suite" => Ok(ArtifactKind::TestSuite),
            "keywordfile" | "package" => Ok(ArtifactKind::KeywordFile),
            "keyword" | "kw" => Ok(ArtifactKind::Keyword),
            "repositoryobject" | "object" | "testobject" | "objectrepository" => {
                Ok(ArtifactKind::RepositoryObject)
            }
            "profile" => Ok(ArtifactKind::Profile),
            "script" => Ok(ArtifactKind::Script),
            _ => Err(anyhow::anyhow!("Unknown artifact kind: {}", s)),
        }
    }
}

/// How a call site refers to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CallKind {
    /// `CustomKeywords.'pkg.Class.method'(...)`
    CustomKeyword,
    /// `name(...)` or `Receiver.name(...)`
    MethodCall,
    /// `findTestObject('...')`
    TestObject,
    /// `findTestCase('...')`
    TestCase,
}

/// One textual reference found in a script body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub kind: CallKind,
    /// Target exactly as written (dotted for qualified calls)
    pub target: String,
    /// 1-based line number
    pub line: usize,
}

impl CallSite {
    pub fn new(kind: CallKind, target: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            target: target.into(),
            line,
        }
    }

    /// Last dotted segment of the target
    pub fn bare_name(&self) -> &str {
        self.target.rsplit('.').next().unwrap_or(&self.target)
    }
}

/// `import` declaration of a script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDecl {
    /// Imported path, `a.b.C` or `a.b.*`
    pub path: String,
    pub alias: Option<String>,
    pub is_static: bool,
    pub line: usize,
}

impl ImportDecl {
    pub fn is_wildcard(&self) -> bool {
        self.path.ends_with(".*")
    }
}

/// Test case (`.tc`) with the steps of its bound script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub path: String,
    /// Path without extension, the form suites use to reference it
    pub id: String,
    pub name: String,
    pub description: String,
    pub tag: Option<String>,
    pub comment: Option<String>,
    pub record_option: Option<String>,
    pub guid: Option<String>,
    /// Script the steps were extracted from
    pub script_path: Option<String>,
    pub steps: Vec<CallSite>,
}

/// Entry of a suite: a name/path reference, not ownership
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteEntry {
    pub test_case_id: String,
    pub guid: Option<String>,
    pub is_run: bool,
    pub is_reuse_driver: bool,
    pub using_data_binding: bool,
}

/// Groovy companion of a suite (setup / teardown hooks)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteScript {
    pub path: String,
    pub imports: Vec<ImportDecl>,
    pub calls: Vec<CallSite>,
    pub has_setup: bool,
    pub has_teardown: bool,
    pub has_setup_test_case: bool,
    pub has_teardown_test_case: bool,
}

/// Test suite (`.ts`), or a raw suite made of a lone suite script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSuite {
    pub path: String,
    pub name: String,
    pub description: String,
    pub tag: Option<String>,
    pub is_rerun: bool,
    pub number_of_rerun: u32,
    pub rerun_failed_test_cases_only: bool,
    pub rerun_immediately: bool,
    pub page_load_timeout: u32,
    pub page_load_timeout_default: bool,
    pub mail_recipient: Option<String>,
    pub guid: Option<String>,
    pub test_cases: Vec<SuiteEntry>,
    pub script: Option<SuiteScript>,
    /// No markup file, only a script
    pub raw: bool,
}

impl TestSuite {
    /// Raw suite built from a script without a sibling `.ts`
    pub fn from_script(script: SuiteScript) -> Self {
        let name = crate::core::fs_utils::file_stem(&script.path).to_string();
        Self {
            path: script.path.clone(),
            name,
            description: String::new(),
            tag: None,
            is_rerun: false,
            number_of_rerun: 0,
            rerun_failed_test_cases_only: false,
            rerun_immediately: true,
            page_load_timeout: 30,
            page_load_timeout_default: true,
            mail_recipient: None,
            guid: None,
            test_cases: Vec::new(),
            script: Some(script),
            raw: true,
        }
    }

    pub fn uses_data_binding(&self) -> bool {
        self.test_cases.iter().any(|entry| entry.using_data_binding)
    }
}

/// `@Keyword` method of a keyword file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub name: String,
    /// `package.Class.name` (`Class.name` without a package)
    pub qualified_name: String,
    /// Owning keyword file path (non-owning back-reference)
    pub file: String,
    pub parameters: Vec<String>,
    pub param_count: usize,
    pub line: usize,
}

/// Groovy file under the keywords directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordFile {
    pub path: String,
    pub package: String,
    pub class_name: String,
    pub keywords: Vec<Keyword>,
    pub imports: Vec<ImportDecl>,
    pub calls: Vec<CallSite>,
}

impl KeywordFile {
    /// `package.Class`, the form other files import it by
    pub fn qualified_class(&self) -> String {
        if self.package.is_empty() {
            self.class_name.clone()
        } else {
            format!("{}.{}", self.package, self.class_name)
        }
    }
}

/// Platform an object repository entry targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ElementType {
    WebElement,
    MobileElement,
    WindowsElement,
    Unspecified,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::WebElement => write!(f, "WebElement"),
            ElementType::MobileElement => write!(f, "MobileElement"),
            ElementType::WindowsElement => write!(f, "WindowsElement"),
            ElementType::Unspecified => write!(f, "Unspecified"),
        }
    }
}

/// Extra property / xpath entry of an object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementProperty {
    pub name: String,
    pub value: String,
    pub property_type: Option<String>,
    pub match_condition: Option<String>,
    pub is_selected: bool,
}

/// Object repository entry (`.rs`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryObject {
    pub path: String,
    /// Path below the repository directory without extension
    pub id: String,
    pub name: String,
    pub description: String,
    pub tag: Option<String>,
    pub element_type: ElementType,
    pub guid: Option<String>,
    pub selector_method: Option<String>,
    pub smart_locator_enabled: bool,
    /// Selector method name -> selector
    pub selectors: BTreeMap<String, String>,
    pub smart_locators: BTreeMap<String, String>,
    pub properties: Vec<ElementProperty>,
    pub xpaths: Vec<ElementProperty>,
}

/// Default value of a profile variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileVariable {
    pub init_value: String,
    pub value_type: Option<String>,
    pub description: String,
    pub is_protected: bool,
}

/// Execution profile (`.glbl`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub path: String,
    pub name: String,
    pub description: String,
    pub tag: Option<String>,
    pub is_default: bool,
    pub variables: BTreeMap<String, ProfileVariable>,
}

/// Groovy file that is neither a keyword file nor a suite script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub path: String,
    pub name: String,
    pub content: String,
    pub line_count: usize,
    pub imports: Vec<ImportDecl>,
    pub calls: Vec<CallSite>,
    /// Test case whose steps come from this script
    pub bound_test_case: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str() {
        assert_eq!("test-cases".parse::<ArtifactKind>().unwrap(), ArtifactKind::TestCase);
        assert_eq!("keyword".parse::<ArtifactKind>().unwrap(), ArtifactKind::Keyword);
        assert_eq!("objects".parse::<ArtifactKind>().unwrap(), ArtifactKind::RepositoryObject);
        assert_eq!("Profiles".parse::<ArtifactKind>().unwrap(), ArtifactKind::Profile);
        assert!("widgets".parse::<ArtifactKind>().is_err());
    }

    #[test]
    fn test_call_site_bare_name() {
        let call = CallSite::new(CallKind::CustomKeyword, "com.acme.Login.submit", 3);
        assert_eq!(call.bare_name(), "submit");
    }
}
