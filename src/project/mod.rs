/*!
# Project Model

Path-keyed mappings of every parsed artifact kind, assembled by the
[`ProjectWalker`]. Keys are normalized relative paths; mappings are
ordered, so iteration order (and everything derived from it) is stable
across runs.
*/

pub mod walker;

pub use walker::{ProjectWalker, WalkOutput};

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::model::{
    ArtifactKind, Keyword, KeywordFile, Profile, RepositoryObject, Script, TestCase, TestSuite,
};

/// Parsed project. Read-only once the walker returns it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectModel {
    #[serde(skip)]
    root: PathBuf,
    pub(crate) test_cases: BTreeMap<String, TestCase>,
    pub(crate) test_suites: BTreeMap<String, TestSuite>,
    pub(crate) keyword_files: BTreeMap<String, KeywordFile>,
    pub(crate) objects: BTreeMap<String, RepositoryObject>,
    pub(crate) profiles: BTreeMap<String, Profile>,
    pub(crate) scripts: BTreeMap<String, Script>,
}

impl ProjectModel {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Analyzed root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn test_cases(&self) -> &BTreeMap<String, TestCase> {
        &self.test_cases
    }

    pub fn test_suites(&self) -> &BTreeMap<String, TestSuite> {
        &self.test_suites
    }

    pub fn keyword_files(&self) -> &BTreeMap<String, KeywordFile> {
        &self.keyword_files
    }

    pub fn objects(&self) -> &BTreeMap<String, RepositoryObject> {
        &self.objects
    }

    pub fn profiles(&self) -> &BTreeMap<String, Profile> {
        &self.profiles
    }

    pub fn scripts(&self) -> &BTreeMap<String, Script> {
        &self.scripts
    }

    /// All keywords, file order then declaration order
    pub fn keywords(&self) -> impl Iterator<Item = &Keyword> {
        self.keyword_files.values().flat_map(|file| file.keywords.iter())
    }

    /// Number of records of a kind (keywords are counted individually)
    pub fn count(&self, kind: ArtifactKind) -> usize {
        match kind {
            ArtifactKind::TestCase => self.test_cases.len(),
            ArtifactKind::TestSuite => self.test_suites.len(),
            ArtifactKind::KeywordFile => self.keyword_files.len(),
            ArtifactKind::Keyword => self.keywords().count(),
            ArtifactKind::RepositoryObject => self.objects.len(),
            ArtifactKind::Profile => self.profiles.len(),
            ArtifactKind::Script => self.scripts.len(),
        }
    }

    /// Number of source files behind a kind
    pub fn file_count(&self, kind: ArtifactKind) -> usize {
        match kind {
            ArtifactKind::Keyword => self.keyword_files.len(),
            ArtifactKind::TestSuite => self
                .test_suites
                .values()
                .map(|suite| if suite.raw || suite.script.is_none() { 1 } else { 2 })
                .sum(),
            other => self.count(other),
        }
    }

    pub fn test_case_by_id(&self, id: &str) -> Option<&TestCase> {
        self.test_cases.values().find(|tc| tc.id == id)
    }

    /// Test cases with this display name
    pub fn test_cases_by_name(&self, name: &str) -> Vec<&TestCase> {
        self.test_cases.values().filter(|tc| tc.name == name).collect()
    }

    /// Keywords matching a qualified name, or a bare name when unqualified
    pub fn find_keywords(&self, name: &str) -> Vec<&Keyword> {
        let qualified: Vec<_> = self.keywords().filter(|kw| kw.qualified_name == name).collect();
        if !qualified.is_empty() || name.contains('.') {
            return qualified;
        }
        self.keywords().filter(|kw| kw.name == name).collect()
    }

    pub fn object_by_id(&self, id: &str) -> Option<&RepositoryObject> {
        self.objects.values().find(|object| object.id == id)
    }

    /// Profile flagged as default, else the one named `default`
    pub fn default_profile(&self) -> Option<&Profile> {
        self.profiles
            .values()
            .find(|profile| profile.is_default)
            .or_else(|| self.profiles.values().find(|profile| profile.name == "default"))
    }

    pub fn is_empty(&self) -> bool {
        ArtifactKind::MAPPED.iter().all(|kind| self.count(*kind) == 0)
    }
}
