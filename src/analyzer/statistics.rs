/*!
# Statistics Engine

Pure function from (project model, usage index) to a
[`StatisticsSnapshot`]. Every list is sorted, so two runs over the same
input produce the same snapshot.
*/

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::references::UsageIndex;
use crate::config::AnalyzerConfig;
use crate::core::UnresolvedReference;
use crate::model::{ArtifactKind, ImportDecl, KeywordFile};
use crate::parser::strip_dir;
use crate::project::ProjectModel;

/// `used / total * 100`, 0 for an empty set. Not rounded; reports format it.
pub fn percentage(used: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    used as f64 / total as f64 * 100.0
}

/// Count and file count of one kind, grouped by first folder
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KindSummary {
    pub total: usize,
    pub files: usize,
    pub by_folder: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub test_cases: KindSummary,
    pub test_suites: KindSummary,
    pub keyword_files: KindSummary,
    pub keywords: KindSummary,
    pub objects: KindSummary,
    pub profiles: KindSummary,
    pub scripts: KindSummary,
    pub objects_by_type: BTreeMap<String, usize>,
    pub default_profile: Option<String>,
    pub total_variables: usize,
}

/// Share of test cases included by at least one suite
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TestCaseCoverage {
    pub total: usize,
    pub used: usize,
    pub unused: usize,
    pub coverage_percentage: f64,
    pub unused_test_cases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageCount {
    pub name: String,
    pub count: usize,
}

/// Usage of keywords or repository objects
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageReport {
    pub total: usize,
    pub used: usize,
    pub unused: usize,
    pub usage_percentage: f64,
    pub unused_names: Vec<String>,
    pub most_used: Vec<UsageCount>,
}

/// Imports of one keyword file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileImports {
    pub path: String,
    pub package: String,
    /// Paths of imported project keyword files
    pub resolved: Vec<String>,
    /// Imports matching no project class or package
    pub unresolved: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportAnalysis {
    pub files: Vec<FileImports>,
    pub total_unique_imports: usize,
    pub top_imports: Vec<UsageCount>,
    /// Keyword files importing each other, each cycle sorted
    pub cycles: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SuiteReport {
    pub path: String,
    pub name: String,
    /// Entries as listed, unresolved stubs included
    pub test_case_count: usize,
    pub unresolved_count: usize,
    pub is_rerun: bool,
    pub uses_data_binding: bool,
    pub has_setup: bool,
    pub has_teardown: bool,
    pub raw: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TestSuiteAnalysis {
    pub total_suites: usize,
    pub suites_with_rerun: usize,
    pub suites_with_data_binding: usize,
    pub suites_with_setup: usize,
    pub suites_with_teardown: usize,
    pub total_test_cases_in_suites: usize,
    pub average_test_cases_per_suite: f64,
    pub suites: Vec<SuiteReport>,
}

/// Everything the statistics engine derives
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatisticsSnapshot {
    pub summary: Summary,
    pub test_case_coverage: TestCaseCoverage,
    pub keyword_usage: UsageReport,
    pub object_usage: UsageReport,
    pub import_analysis: ImportAnalysis,
    pub test_suite_analysis: TestSuiteAnalysis,
    pub unresolved_references: Vec<UnresolvedReference>,
}

pub struct StatisticsEngine<'a> {
    model: &'a ProjectModel,
    usage: &'a UsageIndex,
    config: &'a AnalyzerConfig,
}

impl<'a> StatisticsEngine<'a> {
    pub fn new(model: &'a ProjectModel, usage: &'a UsageIndex, config: &'a AnalyzerConfig) -> Self {
        Self {
            model,
            usage,
            config,
        }
    }

    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            summary: self.summary(),
            test_case_coverage: self.test_case_coverage(),
            keyword_usage: self.keyword_usage(),
            object_usage: self.object_usage(),
            import_analysis: self.import_analysis(),
            test_suite_analysis: self.test_suite_analysis(),
            unresolved_references: self.usage.unresolved().iter().cloned().collect(),
        }
    }

    pub fn summary(&self) -> Summary {
        let model = self.model;
        let layout = &self.config.layout;

        let kind_summary = |kind: ArtifactKind, paths: Vec<&str>, dir: &str| KindSummary {
            total: model.count(kind),
            files: model.file_count(kind),
            by_folder: count_by_folder(paths, dir),
        };

        let mut objects_by_type = BTreeMap::new();
        for object in model.objects().values() {
            *objects_by_type.entry(object.element_type.to_string()).or_insert(0) += 1;
        }

        Summary {
            test_cases: kind_summary(
                ArtifactKind::TestCase,
                model.test_cases().keys().map(String::as_str).collect(),
                &layout.test_cases_dir,
            ),
            test_suites: kind_summary(
                ArtifactKind::TestSuite,
                model.test_suites().keys().map(String::as_str).collect(),
                &layout.test_suites_dir,
            ),
            keyword_files: kind_summary(
                ArtifactKind::KeywordFile,
                model.keyword_files().keys().map(String::as_str).collect(),
                &layout.keywords_dir,
            ),
            keywords: kind_summary(
                ArtifactKind::Keyword,
                model.keywords().map(|kw| kw.file.as_str()).collect(),
                &layout.keywords_dir,
            ),
            objects: kind_summary(
                ArtifactKind::RepositoryObject,
                model.objects().keys().map(String::as_str).collect(),
                &layout.object_repository_dir,
            ),
            profiles: kind_summary(
                ArtifactKind::Profile,
                model.profiles().keys().map(String::as_str).collect(),
                &layout.profiles_dir,
            ),
            scripts: kind_summary(
                ArtifactKind::Script,
                model.scripts().keys().map(String::as_str).collect(),
                &layout.scripts_dir,
            ),
            objects_by_type,
            default_profile: model.default_profile().map(|p| p.name.clone()),
            total_variables: model.profiles().values().map(|p| p.variables.len()).sum(),
        }
    }

    /// Only suite referrers count as coverage
    pub fn test_case_coverage(&self) -> TestCaseCoverage {
        let total = self.model.test_cases().len();
        let unused_test_cases: Vec<String> = self
            .model
            .test_cases()
            .values()
            .filter(|tc| self.usage.suite_referrers(&tc.id) == 0)
            .map(|tc| tc.id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let used = total - unused_test_cases.len();

        TestCaseCoverage {
            total,
            used,
            unused: unused_test_cases.len(),
            coverage_percentage: percentage(used, total),
            unused_test_cases,
        }
    }

    pub fn keyword_usage(&self) -> UsageReport {
        let counts = self
            .model
            .keywords()
            .map(|kw| (kw.qualified_name.as_str(), self.usage.keyword_referrers(&kw.qualified_name)));
        usage_report(counts, self.config.top_n)
    }

    pub fn object_usage(&self) -> UsageReport {
        let counts = self
            .model
            .objects()
            .values()
            .map(|object| (object.id.as_str(), self.usage.object_referrers(&object.id)));
        usage_report(counts, self.config.top_n)
    }

    pub fn import_analysis(&self) -> ImportAnalysis {
        let model = self.model;
        let files: Vec<&KeywordFile> = model.keyword_files().values().collect();

        let mut by_class: HashMap<String, &str> = HashMap::new();
        let mut by_package: HashMap<&str, BTreeSet<&str>> = HashMap::new();
        for file in &files {
            by_class.insert(file.qualified_class(), file.path.as_str());
            by_package
                .entry(file.package.as_str())
                .or_default()
                .insert(file.path.as_str());
        }

        let mut reports = Vec::with_capacity(files.len());
        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let nodes: HashMap<&str, NodeIndex> = files
            .iter()
            .map(|file| (file.path.as_str(), graph.add_node(file.path.as_str())))
            .collect();

        for file in &files {
            let mut resolved = BTreeSet::new();
            let mut unresolved = Vec::new();

            for import in &file.imports {
                let targets = resolve_import(import, &by_class, &by_package);
                if targets.is_empty() {
                    if !unresolved.contains(&import.path) {
                        unresolved.push(import.path.clone());
                    }
                } else {
                    resolved.extend(targets.into_iter().filter(|target| *target != file.path));
                }
            }

            for target in &resolved {
                if let (Some(from), Some(to)) = (nodes.get(file.path.as_str()), nodes.get(target)) {
                    graph.update_edge(*from, *to, ());
                }
            }

            reports.push(FileImports {
                path: file.path.clone(),
                package: file.package.clone(),
                resolved: resolved.into_iter().map(str::to_string).collect(),
                unresolved,
            });
        }

        let mut cycles: Vec<Vec<String>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .map(|component| {
                let mut cycle: Vec<String> =
                    component.iter().map(|node| graph[*node].to_string()).collect();
                cycle.sort();
                cycle
            })
            .collect();
        cycles.sort();

        // частоты импортов по всем скриптам проекта
        let mut frequencies: BTreeMap<&str, usize> = BTreeMap::new();
        let all_imports = files
            .iter()
            .flat_map(|file| file.imports.iter())
            .chain(
                model
                    .test_suites()
                    .values()
                    .filter_map(|suite| suite.script.as_ref())
                    .flat_map(|script| script.imports.iter()),
            )
            .chain(model.scripts().values().flat_map(|script| script.imports.iter()));
        for import in all_imports {
            *frequencies.entry(import.path.as_str()).or_insert(0) += 1;
        }

        ImportAnalysis {
            files: reports,
            total_unique_imports: frequencies.len(),
            top_imports: ranked(frequencies.into_iter(), self.config.top_imports),
            cycles,
        }
    }

    pub fn test_suite_analysis(&self) -> TestSuiteAnalysis {
        let test_cases_dir = &self.config.layout.test_cases_dir;
        let mut analysis = TestSuiteAnalysis::default();

        for suite in self.model.test_suites().values() {
            let unresolved_count = suite
                .test_cases
                .iter()
                .filter(|entry| {
                    let id = super::references::normalize_test_case_ref(&entry.test_case_id, test_cases_dir);
                    self.model.test_case_by_id(&id).is_none()
                })
                .count();
            let (has_setup, has_teardown) = suite
                .script
                .as_ref()
                .map_or((false, false), |s| (s.has_setup, s.has_teardown));

            let report = SuiteReport {
                path: suite.path.clone(),
                name: suite.name.clone(),
                test_case_count: suite.test_cases.len(),
                unresolved_count,
                is_rerun: suite.is_rerun,
                uses_data_binding: suite.uses_data_binding(),
                has_setup,
                has_teardown,
                raw: suite.raw,
            };

            analysis.total_suites += 1;
            analysis.suites_with_rerun += usize::from(report.is_rerun);
            analysis.suites_with_data_binding += usize::from(report.uses_data_binding);
            analysis.suites_with_setup += usize::from(report.has_setup);
            analysis.suites_with_teardown += usize::from(report.has_teardown);
            analysis.total_test_cases_in_suites += report.test_case_count;
            analysis.suites.push(report);
        }

        analysis.average_test_cases_per_suite = if analysis.total_suites == 0 {
            0.0
        } else {
            analysis.total_test_cases_in_suites as f64 / analysis.total_suites as f64
        };
        analysis
    }
}

/// First folder below `dir`, `root` for files directly inside it
fn count_by_folder(paths: Vec<&str>, dir: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for path in paths {
        let inner = strip_dir(path, dir.trim_matches('/'));
        let folder = match inner.split_once('/') {
            Some((first, _)) => first,
            None => "root",
        };
        *counts.entry(folder.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Count descending, then name ascending; zero counts dropped
fn ranked<'n>(counts: impl Iterator<Item = (&'n str, usize)>, limit: usize) -> Vec<UsageCount> {
    let mut ranked: Vec<(&str, usize)> = counts.filter(|(_, count)| *count > 0).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(name, count)| UsageCount {
            name: name.to_string(),
            count,
        })
        .collect()
}

fn usage_report<'n>(counts: impl Iterator<Item = (&'n str, usize)>, top_n: usize) -> UsageReport {
    let counts: Vec<(&str, usize)> = counts.collect();
    let total = counts.len();

    let mut unused_names: Vec<String> = counts
        .iter()
        .filter(|(_, count)| *count == 0)
        .map(|(name, _)| name.to_string())
        .collect();
    unused_names.sort();
    let used = total - unused_names.len();

    UsageReport {
        total,
        used,
        unused: unused_names.len(),
        usage_percentage: percentage(used, total),
        unused_names,
        most_used: ranked(counts.into_iter(), top_n),
    }
}

/// Keyword file paths an import points to
fn resolve_import<'a>(
    import: &ImportDecl,
    by_class: &HashMap<String, &'a str>,
    by_package: &HashMap<&str, BTreeSet<&'a str>>,
) -> Vec<&'a str> {
    if import.is_wildcard() {
        let package = import.path.trim_end_matches(".*");
        if let Some(files) = by_package.get(package) {
            return files.iter().copied().collect();
        }
        // static wildcard: `import static a.b.C.*`
        return by_class.get(package).map(|path| vec![*path]).unwrap_or_default();
    }

    if let Some(path) = by_class.get(import.path.as_str()) {
        return vec![*path];
    }
    if import.is_static {
        if let Some((class, _member)) = import.path.rsplit_once('.') {
            if let Some(path) = by_class.get(class) {
                return vec![*path];
            }
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::references::ReferenceResolver;
    use crate::model::Keyword;
    use pretty_assertions::assert_eq;

    fn import(path: &str) -> ImportDecl {
        ImportDecl {
            path: path.to_string(),
            alias: None,
            is_static: false,
            line: 1,
        }
    }

    fn keyword_file(path: &str, package: &str, class: &str, imports: Vec<ImportDecl>) -> KeywordFile {
        KeywordFile {
            path: path.to_string(),
            package: package.to_string(),
            class_name: class.to_string(),
            keywords: vec![Keyword {
                name: "run".to_string(),
                qualified_name: format!("{}.{}.run", package, class),
                file: path.to_string(),
                parameters: Vec::new(),
                param_count: 0,
                line: 1,
            }],
            imports,
            calls: Vec::new(),
        }
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(7, 10), 70.0);
        assert_eq!(percentage(1, 3), 1.0 / 3.0 * 100.0);
        assert_eq!(percentage(2, 3), 2.0 / 3.0 * 100.0);
        assert_eq!(percentage(3, 3), 100.0);
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let ranked = ranked(vec![("b", 2), ("a", 2), ("c", 5), ("z", 0)].into_iter(), 10);
        let names: Vec<_> = ranked.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);

        let report = usage_report(vec![("k2", 0), ("k1", 0), ("k3", 1)].into_iter(), 1);
        assert_eq!(report.total, 3);
        assert_eq!(report.used + report.unused, report.total);
        assert_eq!(report.unused_names, vec!["k1", "k2"]);
        assert_eq!(report.most_used.len(), 1);
    }

    #[test]
    fn test_count_by_folder() {
        let counts = count_by_folder(vec!["Test Cases/A/x.tc", "Test Cases/A/y.tc", "Test Cases/z.tc"], "Test Cases");
        assert_eq!(counts["A"], 2);
        assert_eq!(counts["root"], 1);
    }

    #[test]
    fn test_import_analysis_and_cycles() {
        let mut model = ProjectModel::new("/p");
        let files = vec![
            keyword_file("Keywords/a/A.groovy", "a", "A", vec![import("b.B"), import("java.util.List")]),
            keyword_file("Keywords/b/B.groovy", "b", "B", vec![import("a.*")]),
            keyword_file("Keywords/c/C.groovy", "c", "C", vec![import("a.A"), import("java.util.List")]),
        ];
        for file in files {
            model.keyword_files.insert(file.path.clone(), file);
        }

        let config = AnalyzerConfig::default();
        let usage = ReferenceResolver::new(&model, &config.layout).resolve();
        let analysis = StatisticsEngine::new(&model, &usage, &config).import_analysis();

        assert_eq!(analysis.files[0].resolved, vec!["Keywords/b/B.groovy"]);
        assert_eq!(analysis.files[0].unresolved, vec!["java.util.List"]);
        assert_eq!(analysis.files[1].resolved, vec!["Keywords/a/A.groovy"]);
        assert_eq!(
            analysis.cycles,
            vec![vec!["Keywords/a/A.groovy".to_string(), "Keywords/b/B.groovy".to_string()]]
        );
        assert_eq!(analysis.total_unique_imports, 4);
        assert_eq!(analysis.top_imports[0], UsageCount { name: "java.util.List".to_string(), count: 2 });
    }

    #[test]
    fn test_empty_project_snapshot() {
        let model = ProjectModel::default();
        let config = AnalyzerConfig::default();
        let usage = UsageIndex::default();
        let snapshot = StatisticsEngine::new(&model, &usage, &config).snapshot();

        assert_eq!(snapshot.test_case_coverage.coverage_percentage, 0.0);
        assert_eq!(snapshot.keyword_usage.usage_percentage, 0.0);
        assert_eq!(snapshot.test_suite_analysis.average_test_cases_per_suite, 0.0);
        assert_eq!(snapshot.summary.default_profile, None);
    }
}
