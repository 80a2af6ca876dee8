/*!
# Katalon Analyzer Module

Cross-reference analysis over a parsed project:

- [`references`] - call sites and suite entries -> [`UsageIndex`]
- [`statistics`] - summary, coverage, usage rankings, imports, suites
- [`search`] - substring search over names and descriptions
- [`engine`] - [`ProjectAnalyzer`], the pipeline façade
*/

pub mod engine;
pub mod references;
pub mod search;
pub mod statistics;

pub use engine::{Entities, ProjectAnalysis, ProjectAnalyzer};
pub use references::{ReferenceResolver, Referrer, UsageIndex};
pub use search::{SearchIndex, SearchMatch};
pub use statistics::{
    ImportAnalysis, StatisticsEngine, StatisticsSnapshot, Summary, TestCaseCoverage,
    TestSuiteAnalysis, UsageCount, UsageReport,
};
