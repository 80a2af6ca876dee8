/*!
# Analysis Engine

Orchestrates walker -> resolver -> statistics for one project root. Each
stage fully consumes the previous one; parsing and resolution run on a
scoped rayon pool sized from the configuration.
*/

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use super::references::{ReferenceResolver, UsageIndex};
use super::search::{SearchIndex, SearchMatch};
use super::statistics::{StatisticsEngine, StatisticsSnapshot};
use crate::config::AnalyzerConfig;
use crate::core::{KatalonError, KatalonResult, ParseError};
use crate::model::{
    ArtifactKind, Keyword, KeywordFile, Profile, RepositoryObject, Script, TestCase, TestSuite,
};
use crate::project::{ProjectModel, ProjectWalker, WalkOutput};

/// Entry point of the engine
pub struct ProjectAnalyzer {
    walker: ProjectWalker,
}

impl ProjectAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            walker: ProjectWalker::new(config)?,
        })
    }

    /// Analyzer configured from `katalon-analyzer.toml` in `root`, if present
    pub fn for_project<P: AsRef<Path>>(root: P) -> Result<Self> {
        Self::new(AnalyzerConfig::discover(root)?)
    }

    pub fn config(&self) -> &AnalyzerConfig {
        self.walker.config()
    }

    /// Full pipeline. Fails only on an unreadable root, a duplicate
    /// identity key or a pool that can not be built.
    pub fn analyze<P: AsRef<Path>>(&self, root: P) -> KatalonResult<ProjectAnalysis> {
        let root = root.as_ref();
        let config = self.config();
        let started = Instant::now();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("katalon-worker-{}", i))
            .build()
            .map_err(|e| KatalonError::ThreadPool(e.to_string()))?;

        let (output, usage) = pool.install(|| -> KatalonResult<(WalkOutput, UsageIndex)> {
            let output = self.walker.walk(root)?;
            let usage = ReferenceResolver::new(&output.model, &config.layout).resolve();
            Ok((output, usage))
        })?;

        let WalkOutput { model, errors } = output;
        let statistics = StatisticsEngine::new(&model, &usage, config).snapshot();

        tracing::info!(
            "Analysis of {} finished in {:.2?}: coverage {}%, {} unused keywords, {} unused objects",
            root.display(),
            started.elapsed(),
            statistics.test_case_coverage.coverage_percentage,
            statistics.keyword_usage.unused,
            statistics.object_usage.unused
        );

        Ok(ProjectAnalysis {
            model,
            parse_errors: errors,
            usage,
            statistics,
        })
    }
}

/// Borrowed view of one kind's mapping
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Entities<'a> {
    TestCases(&'a BTreeMap<String, TestCase>),
    TestSuites(&'a BTreeMap<String, TestSuite>),
    KeywordFiles(&'a BTreeMap<String, KeywordFile>),
    /// Keywords have no file of their own; listed in file order
    Keywords(Vec<&'a Keyword>),
    Objects(&'a BTreeMap<String, RepositoryObject>),
    Profiles(&'a BTreeMap<String, Profile>),
    Scripts(&'a BTreeMap<String, Script>),
}

impl<'a> Entities<'a> {
    pub fn len(&self) -> usize {
        match self {
            Entities::TestCases(map) => map.len(),
            Entities::TestSuites(map) => map.len(),
            Entities::KeywordFiles(map) => map.len(),
            Entities::Keywords(list) => list.len(),
            Entities::Objects(map) => map.len(),
            Entities::Profiles(map) => map.len(),
            Entities::Scripts(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// (key, display name) pairs in mapping order
    pub fn names(&self) -> Vec<(String, String)> {
        fn pairs<T>(map: &BTreeMap<String, T>, name: impl Fn(&T) -> &str) -> Vec<(String, String)> {
            map.iter().map(|(key, value)| (key.clone(), name(value).to_string())).collect()
        }

        match self {
            Entities::TestCases(map) => pairs(map, |tc| tc.name.as_str()),
            Entities::TestSuites(map) => pairs(map, |suite| suite.name.as_str()),
            Entities::KeywordFiles(map) => pairs(map, |file| file.class_name.as_str()),
            Entities::Keywords(list) => list
                .iter()
                .map(|kw| (kw.qualified_name.clone(), kw.name.clone()))
                .collect(),
            Entities::Objects(map) => pairs(map, |object| object.name.as_str()),
            Entities::Profiles(map) => pairs(map, |profile| profile.name.as_str()),
            Entities::Scripts(map) => pairs(map, |script| script.name.as_str()),
        }
    }
}

/// Exported document; field order is the output order
#[derive(Serialize)]
struct ExportDocument<'a> {
    test_cases: &'a BTreeMap<String, TestCase>,
    test_suites: &'a BTreeMap<String, TestSuite>,
    keyword_files: &'a BTreeMap<String, KeywordFile>,
    objects: &'a BTreeMap<String, RepositoryObject>,
    profiles: &'a BTreeMap<String, Profile>,
    scripts: &'a BTreeMap<String, Script>,
    parse_errors: &'a [ParseError],
    usage: &'a UsageIndex,
    statistics: &'a StatisticsSnapshot,
}

/// Result of one analysis run. Read-only.
#[derive(Debug, Clone)]
pub struct ProjectAnalysis {
    model: ProjectModel,
    parse_errors: Vec<ParseError>,
    usage: UsageIndex,
    statistics: StatisticsSnapshot,
}

impl ProjectAnalysis {
    pub fn model(&self) -> &ProjectModel {
        &self.model
    }

    /// Files that were skipped, in walk order
    pub fn parse_errors(&self) -> &[ParseError] {
        &self.parse_errors
    }

    pub fn usage(&self) -> &UsageIndex {
        &self.usage
    }

    pub fn get_entities(&self, kind: ArtifactKind) -> Entities<'_> {
        let model = &self.model;
        match kind {
            ArtifactKind::TestCase => Entities::TestCases(model.test_cases()),
            ArtifactKind::TestSuite => Entities::TestSuites(model.test_suites()),
            ArtifactKind::KeywordFile => Entities::KeywordFiles(model.keyword_files()),
            ArtifactKind::Keyword => Entities::Keywords(model.keywords().collect()),
            ArtifactKind::RepositoryObject => Entities::Objects(model.objects()),
            ArtifactKind::Profile => Entities::Profiles(model.profiles()),
            ArtifactKind::Script => Entities::Scripts(model.scripts()),
        }
    }

    pub fn get_statistics(&self) -> &StatisticsSnapshot {
        &self.statistics
    }

    pub fn search(&self, kind: ArtifactKind, query: &str) -> KatalonResult<Vec<SearchMatch>> {
        SearchIndex::new(&self.model).search(kind, query)
    }

    pub fn test_cases_by_name(&self, name: &str) -> Vec<&TestCase> {
        self.model.test_cases_by_name(name)
    }

    /// Keyword by qualified name, or every keyword with that bare name
    pub fn find_keywords(&self, name: &str) -> Vec<&Keyword> {
        self.model.find_keywords(name)
    }

    /// Plain JSON snapshot of all entities, usage and statistics
    pub fn export(&self) -> KatalonResult<serde_json::Value> {
        let model = &self.model;
        let document = ExportDocument {
            test_cases: model.test_cases(),
            test_suites: model.test_suites(),
            keyword_files: model.keyword_files(),
            objects: model.objects(),
            profiles: model.profiles(),
            scripts: model.scripts(),
            parse_errors: &self.parse_errors,
            usage: &self.usage,
            statistics: &self.statistics,
        };
        Ok(serde_json::to_value(&document)?)
    }

    pub fn into_parts(self) -> (ProjectModel, Vec<ParseError>) {
        (self.model, self.parse_errors)
    }
}
