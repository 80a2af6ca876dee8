/*!
# Project Walker

Discovers project files, routes each to its parser and assembles the
[`ProjectModel`]. A file that fails to read or parse is recorded as a
[`ParseError`] and left out; it never aborts the walk.

Parsing runs on the current rayon pool. Results are merged sequentially in
walk order, so the outcome does not depend on scheduling.
*/

use anyhow::Result;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::ProjectModel;
use crate::config::{AnalyzerConfig, ProjectLayout};
use crate::core::fs_utils::strip_extension;
use crate::core::{normalize_relative, read_project_file, KatalonError, KatalonResult, ParseError};
use crate::model::{
    ArtifactKind, KeywordFile, Profile, RepositoryObject, Script, SuiteScript, TestCase, TestSuite,
};
use crate::parser::groovy::GroovyScanner;
use crate::parser::{
    strip_dir, ArtifactParser, KeywordFileParser, ObjectRepositoryParser, ProfileParser,
    ScriptParser, SuiteScriptParser, TestCaseParser, TestSuiteParser,
};

/// Walker result: successful mappings plus per-file failures
#[derive(Debug, Clone)]
pub struct WalkOutput {
    pub model: ProjectModel,
    pub errors: Vec<ParseError>,
}

/// Format a discovered file is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    TestCase,
    TestSuite,
    SuiteScript,
    KeywordFile,
    RepositoryObject,
    Profile,
    Script,
}

impl FileClass {
    fn kind(self) -> ArtifactKind {
        match self {
            FileClass::TestCase => ArtifactKind::TestCase,
            FileClass::TestSuite | FileClass::SuiteScript => ArtifactKind::TestSuite,
            FileClass::KeywordFile => ArtifactKind::KeywordFile,
            FileClass::RepositoryObject => ArtifactKind::RepositoryObject,
            FileClass::Profile => ArtifactKind::Profile,
            FileClass::Script => ArtifactKind::Script,
        }
    }
}

/// File selected for parsing
#[derive(Debug, Clone)]
pub struct Candidate {
    pub class: FileClass,
    pub path: PathBuf,
    /// Identity key
    pub relative: String,
}

enum Parsed {
    TestCase(TestCase),
    TestSuite(TestSuite),
    SuiteScript(SuiteScript),
    KeywordFile(KeywordFile),
    Object(RepositoryObject),
    Profile(Profile),
    Script(Script),
}

pub struct ProjectWalker {
    config: AnalyzerConfig,
    test_cases: TestCaseParser,
    test_suites: TestSuiteParser,
    suite_scripts: SuiteScriptParser,
    keyword_files: KeywordFileParser,
    objects: ObjectRepositoryParser,
    profiles: ProfileParser,
    scripts: ScriptParser,
}

impl ProjectWalker {
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        let scanner = GroovyScanner::new()?;
        let layout = &config.layout;

        Ok(Self {
            test_cases: TestCaseParser::new(),
            test_suites: TestSuiteParser::new(),
            suite_scripts: SuiteScriptParser::new(scanner.clone()),
            keyword_files: KeywordFileParser::new(layout.keywords_dir.trim_matches('/'), scanner.clone()),
            objects: ObjectRepositoryParser::new(layout.object_repository_dir.trim_matches('/')),
            profiles: ProfileParser::new(),
            scripts: ScriptParser::new(scanner),
            config,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Walks `root` and parses everything found
    pub fn walk(&self, root: &Path) -> KatalonResult<WalkOutput> {
        let candidates = self.discover(root)?;
        tracing::info!("Discovered {} project files under {}", candidates.len(), root.display());

        let parsed: Vec<Result<Parsed, ParseError>> = candidates
            .par_iter()
            .map(|candidate| self.parse_candidate(candidate))
            .collect();

        let mut model = ProjectModel::new(root);
        let mut suite_scripts = Vec::new();
        let mut errors = Vec::new();

        for result in parsed {
            match result {
                Ok(Parsed::TestCase(tc)) => {
                    insert_unique(&mut model.test_cases, ArtifactKind::TestCase, tc.path.clone(), tc)?
                }
                Ok(Parsed::TestSuite(suite)) => insert_unique(
                    &mut model.test_suites,
                    ArtifactKind::TestSuite,
                    suite.path.clone(),
                    suite,
                )?,
                Ok(Parsed::SuiteScript(script)) => suite_scripts.push(script),
                Ok(Parsed::KeywordFile(file)) => insert_unique(
                    &mut model.keyword_files,
                    ArtifactKind::KeywordFile,
                    file.path.clone(),
                    file,
                )?,
                Ok(Parsed::Object(object)) => insert_unique(
                    &mut model.objects,
                    ArtifactKind::RepositoryObject,
                    object.path.clone(),
                    object,
                )?,
                Ok(Parsed::Profile(profile)) => insert_unique(
                    &mut model.profiles,
                    ArtifactKind::Profile,
                    profile.path.clone(),
                    profile,
                )?,
                Ok(Parsed::Script(script)) => {
                    insert_unique(&mut model.scripts, ArtifactKind::Script, script.path.clone(), script)?
                }
                Err(error) => {
                    tracing::warn!("Skipping {}", error);
                    errors.push(error);
                }
            }
        }

        attach_suite_scripts(&mut model, suite_scripts)?;
        bind_test_case_scripts(&mut model, &self.config.layout);

        tracing::info!(
            "Parsed {} test cases, {} suites, {} keyword files, {} objects, {} profiles, {} scripts ({} errors)",
            model.test_cases.len(),
            model.test_suites.len(),
            model.keyword_files.len(),
            model.objects.len(),
            model.profiles.len(),
            model.scripts.len(),
            errors.len()
        );

        Ok(WalkOutput { model, errors })
    }

    /// Candidate files under `root`, in walk (file name) order
    pub fn discover(&self, root: &Path) -> KatalonResult<Vec<Candidate>> {
        check_root(root)?;

        let mut candidates = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(self.config.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| self.config.is_excluded(name))
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = normalize_relative(entry.path(), root);
            if let Some(class) = classify(&relative, &self.config.layout) {
                tracing::debug!("{:?}: {}", class, relative);
                candidates.push(Candidate {
                    class,
                    path: entry.into_path(),
                    relative,
                });
            }
        }

        Ok(candidates)
    }

    fn parse_candidate(&self, candidate: &Candidate) -> Result<Parsed, ParseError> {
        let relative = candidate.relative.as_str();
        let content = read_project_file(&candidate.path).map_err(|e| {
            ParseError::new(relative, candidate.class.kind(), format!("failed to read file: {}", e))
        })?;

        Ok(match candidate.class {
            FileClass::TestCase => Parsed::TestCase(self.test_cases.parse(relative, &content)?),
            FileClass::TestSuite => Parsed::TestSuite(self.test_suites.parse(relative, &content)?),
            FileClass::SuiteScript => {
                Parsed::SuiteScript(self.suite_scripts.parse(relative, &content)?)
            }
            FileClass::KeywordFile => {
                Parsed::KeywordFile(self.keyword_files.parse(relative, &content)?)
            }
            FileClass::RepositoryObject => Parsed::Object(self.objects.parse(relative, &content)?),
            FileClass::Profile => Parsed::Profile(self.profiles.parse(relative, &content)?),
            FileClass::Script => Parsed::Script(self.scripts.parse(relative, &content)?),
        })
    }
}

fn check_root(root: &Path) -> KatalonResult<()> {
    let not_found = |reason: String| KatalonError::ProjectNotFound {
        path: root.to_path_buf(),
        reason,
    };

    let metadata = std::fs::metadata(root).map_err(|e| not_found(e.to_string()))?;
    if !metadata.is_dir() {
        return Err(not_found("not a directory".to_string()));
    }
    std::fs::read_dir(root).map_err(|e| not_found(e.to_string()))?;
    Ok(())
}

/// `true` when `relative` lies somewhere below `dir`
fn in_dir(relative: &str, dir: &str) -> bool {
    let dir = dir.trim_matches('/');
    relative
        .strip_prefix(dir)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Routes a relative path to its format by location and extension
pub fn classify(relative: &str, layout: &ProjectLayout) -> Option<FileClass> {
    let extension = relative
        .rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)?;

    match extension {
        "tc" if in_dir(relative, &layout.test_cases_dir) => Some(FileClass::TestCase),
        "ts" if in_dir(relative, &layout.test_suites_dir) => Some(FileClass::TestSuite),
        "rs" if in_dir(relative, &layout.object_repository_dir) => Some(FileClass::RepositoryObject),
        "glbl" if in_dir(relative, &layout.profiles_dir) => Some(FileClass::Profile),
        "groovy" if in_dir(relative, &layout.test_suites_dir) => Some(FileClass::SuiteScript),
        "groovy" if in_dir(relative, &layout.keywords_dir) => Some(FileClass::KeywordFile),
        "groovy" => Some(FileClass::Script),
        _ => None,
    }
}

fn insert_unique<T>(
    map: &mut BTreeMap<String, T>,
    kind: ArtifactKind,
    key: String,
    value: T,
) -> KatalonResult<()> {
    if map.contains_key(&key) {
        return Err(KatalonError::DuplicatePath { kind, path: key });
    }
    map.insert(key, value);
    Ok(())
}

/// Suite scripts go to their sibling `.ts`; lone ones become raw suites
fn attach_suite_scripts(model: &mut ProjectModel, scripts: Vec<SuiteScript>) -> KatalonResult<()> {
    for script in scripts {
        let sibling = format!("{}.ts", strip_extension(&script.path));
        match model.test_suites.get_mut(&sibling) {
            Some(suite) if suite.script.is_none() => suite.script = Some(script),
            Some(_) => {
                return Err(KatalonError::DuplicatePath {
                    kind: ArtifactKind::TestSuite,
                    path: script.path,
                })
            }
            None => {
                let suite = TestSuite::from_script(script);
                insert_unique(&mut model.test_suites, ArtifactKind::TestSuite, suite.path.clone(), suite)?;
            }
        }
    }
    Ok(())
}

/// `Test Cases/<p>.tc` takes its steps from the first script in `Scripts/<p>/`
fn bind_test_case_scripts(model: &mut ProjectModel, layout: &ProjectLayout) {
    let test_cases_dir = layout.test_cases_dir.trim_matches('/');
    let scripts_dir = layout.scripts_dir.trim_matches('/');

    for tc in model.test_cases.values_mut() {
        let below = strip_dir(strip_extension(&tc.path), test_cases_dir);
        let prefix = format!("{}/{}/", scripts_dir, below);

        let bound = model
            .scripts
            .range::<str, _>((std::ops::Bound::Included(prefix.as_str()), std::ops::Bound::Unbounded))
            .take_while(|(path, _)| path.starts_with(&prefix))
            .find(|(path, _)| !path[prefix.len()..].contains('/'))
            .map(|(path, _)| path.clone());

        let Some(script_path) = bound else {
            tracing::debug!("No script for test case {}", tc.id);
            continue;
        };
        if let Some(script) = model.scripts.get_mut(&script_path) {
            script.bound_test_case = Some(tc.path.clone());
            tc.steps = script.calls.clone();
            tc.script_path = Some(script_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn walker() -> ProjectWalker {
        ProjectWalker::new(AnalyzerConfig::default()).unwrap()
    }

    #[test]
    fn test_classify() {
        let layout = ProjectLayout::default();
        assert_eq!(classify("Test Cases/A/B.tc", &layout), Some(FileClass::TestCase));
        assert_eq!(classify("Test Suites/S.ts", &layout), Some(FileClass::TestSuite));
        assert_eq!(classify("Test Suites/S.groovy", &layout), Some(FileClass::SuiteScript));
        assert_eq!(classify("Keywords/a/K.groovy", &layout), Some(FileClass::KeywordFile));
        assert_eq!(classify("Object Repository/P/o.rs", &layout), Some(FileClass::RepositoryObject));
        assert_eq!(classify("Profiles/default.glbl", &layout), Some(FileClass::Profile));
        assert_eq!(classify("Scripts/A/B/Script1.groovy", &layout), Some(FileClass::Script));
        assert_eq!(classify("Include/scripts/groovy/x.groovy", &layout), Some(FileClass::Script));
        assert_eq!(classify("Test Cases/A.ts", &layout), None);
        assert_eq!(classify("build.gradle", &layout), None);
        assert_eq!(classify("Test Cases X/A.tc", &layout), None);
    }

    #[test]
    fn test_missing_root() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = walker().walk(&missing).unwrap_err();
        assert!(matches!(err, KatalonError::ProjectNotFound { .. }));

        let file = dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            walker().walk(&file).unwrap_err(),
            KatalonError::ProjectNotFound { .. }
        ));
    }

    #[test]
    fn test_walk_tolerates_bad_files_and_binds_scripts() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "Test Cases/Login/Valid.tc", "<TestCase><name>Valid</name></TestCase>");
        write(root, "Test Cases/Broken.tc", "<TestCase><name>Broken</TestCase>");
        write(
            root,
            "Scripts/Login/Valid/Script1600000000000.groovy",
            "WebUI.openBrowser('')\nWebUI.click(findTestObject('Page/btn'))\n",
        );
        write(root, "Test Suites/Smoke.ts", "<TestSuiteEntity><name>Smoke</name></TestSuiteEntity>");
        write(root, "Test Suites/Smoke.groovy", "@SetUp\ndef setUp() {}\n");
        write(root, "Test Suites/Lonely.groovy", "@TearDown\ndef tearDown() {}\n");
        write(root, "Reports/old.tc", "<TestCase><name>Old</name></TestCase>");
        write(root, "bin/Keywords/x.groovy", "class x {}");

        let output = walker().walk(root).unwrap();
        let model = &output.model;

        assert_eq!(output.errors.len(), 1);
        assert_eq!(output.errors[0].path, "Test Cases/Broken.tc");

        let tc = &model.test_cases()["Test Cases/Login/Valid.tc"];
        assert_eq!(tc.steps.len(), 3);
        assert_eq!(
            tc.script_path.as_deref(),
            Some("Scripts/Login/Valid/Script1600000000000.groovy")
        );
        let script = &model.scripts()["Scripts/Login/Valid/Script1600000000000.groovy"];
        assert_eq!(script.bound_test_case.as_deref(), Some("Test Cases/Login/Valid.tc"));

        assert_eq!(model.test_suites().len(), 2);
        assert!(model.test_suites()["Test Suites/Smoke.ts"].script.as_ref().unwrap().has_setup);
        let lonely = &model.test_suites()["Test Suites/Lonely.groovy"];
        assert!(lonely.raw);
        assert_eq!(lonely.name, "Lonely");

        assert!(model.keyword_files().is_empty(), "excluded dirs are skipped");
        assert_eq!(model.test_cases().len(), 1);
    }

    #[test]
    fn test_duplicate_path_is_error() {
        let mut map = BTreeMap::new();
        insert_unique(&mut map, ArtifactKind::Profile, "Profiles/a.glbl".to_string(), 1).unwrap();
        let err = insert_unique(&mut map, ArtifactKind::Profile, "Profiles/a.glbl".to_string(), 2)
            .unwrap_err();
        assert!(matches!(err, KatalonError::DuplicatePath { kind: ArtifactKind::Profile, .. }));
        assert_eq!(map["Profiles/a.glbl"], 1);
    }

    fn suite_script(path: &str) -> SuiteScript {
        SuiteScript {
            path: path.to_string(),
            imports: Vec::new(),
            calls: Vec::new(),
            has_setup: true,
            has_teardown: false,
            has_setup_test_case: false,
            has_teardown_test_case: false,
        }
    }

    #[test]
    fn test_second_suite_script_is_duplicate() {
        let mut model = ProjectModel::new("/project");
        let smoke = TestSuite {
            path: "Test Suites/Smoke.ts".to_string(),
            script: None,
            raw: false,
            ..TestSuite::from_script(suite_script("Test Suites/Smoke.groovy"))
        };
        model.test_suites.insert(smoke.path.clone(), smoke);

        let err = attach_suite_scripts(
            &mut model,
            vec![
                suite_script("Test Suites/Smoke.groovy"),
                suite_script("Test Suites/Lonely.groovy"),
                suite_script("Test Suites/Smoke.groovy"),
            ],
        )
        .unwrap_err();

        match err {
            KatalonError::DuplicatePath { kind, path } => {
                assert_eq!(kind, ArtifactKind::TestSuite);
                assert_eq!(path, "Test Suites/Smoke.groovy");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(model.test_suites["Test Suites/Smoke.ts"].script.is_some());
        assert!(model.test_suites["Test Suites/Lonely.groovy"].raw);
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_rejects_colliding_suite_scripts() {
        // обратный слеш в имени файла нормализуется в `/`
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "Test Suites/Smoke.ts", "<TestSuiteEntity><name>Smoke</name></TestSuiteEntity>");
        write(root, "Test Suites/Smoke.groovy", "@SetUp\ndef setUp() {}\n");
        write(root, "Test Suites\\Smoke.groovy", "@TearDown\ndef tearDown() {}\n");

        let err = walker().walk(root).unwrap_err();
        assert!(matches!(
            err,
            KatalonError::DuplicatePath { kind: ArtifactKind::TestSuite, ref path } if path == "Test Suites/Smoke.groovy"
        ));
    }
}
