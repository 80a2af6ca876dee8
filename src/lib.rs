/*!
# Katalon Analyzer

Static analyzer for Katalon Studio test projects. Reads the project tree
once, parses every artifact into a typed model and answers cross-reference
questions about it: which test cases are never run by a suite, which
keywords and test objects nobody uses, how scripts import each other.

## Features

- **Format parsers** for test cases (`.tc`), test suites (`.ts` + suite
  `.groovy`), object repository entries (`.rs`), execution profiles
  (`.glbl`), keyword classes and plain Groovy scripts
- **Parallel walk** - files are parsed on a rayon pool, results merged
  into path-ordered mappings
- **Reference resolution** - keyword calls, `findTestObject`,
  `callTestCase` and suite entries, with unresolved targets recorded
- **Statistics** - coverage, usage rankings, import frequencies and import
  cycles, suite traits
- **Deterministic export** - identical trees produce identical JSON
- **CLI** - `katalon-analyzer analyze|search|list|unused|export`

## Architecture

```text
Katalon Analyzer
├── Core      - Errors, file decoding, path normalization
├── Model     - Typed records of every artifact kind
├── Parser    - One parser per file format
├── Project   - Walker and the assembled ProjectModel
├── Analyzer  - Reference resolver, statistics, search, engine
├── Config    - TOML/YAML analyzer configuration
└── Reports   - Text and JSON rendering
```

## Usage

### CLI
```bash
# Console report
katalon-analyzer analyze ./MyProject

# Statistics as JSON
katalon-analyzer analyze ./MyProject --format json --output stats.json

# Everything nobody references
katalon-analyzer unused ./MyProject

# Full deterministic export
katalon-analyzer export ./MyProject --pretty --output export.json
```

### Library
```rust,no_run
use katalon_analyzer::{analyze_project, ArtifactKind};

let analysis = analyze_project("./MyProject")?;
let coverage = &analysis.get_statistics().test_case_coverage;
println!("{}% of test cases are in a suite", coverage.coverage_percentage);

for found in analysis.search(ArtifactKind::Keyword, "login")? {
    println!("{} ({})", found.key, found.matched_fields.join(", "));
}
# Ok::<(), anyhow::Error>(())
```
*/

pub mod analyzer;
pub mod cli_common;
pub mod config;
pub mod core;
pub mod model;
pub mod parser;
pub mod project;
pub mod reports;

// Re-export main types for convenience
pub use analyzer::{
    Entities, ProjectAnalysis, ProjectAnalyzer, SearchMatch, StatisticsSnapshot, UsageIndex,
};
pub use config::{AnalyzerConfig, ProjectLayout};
pub use core::{KatalonError, KatalonResult, ParseError, UnresolvedReference};
pub use model::ArtifactKind;
pub use project::ProjectModel;
pub use reports::{ReportFormat, TextReporter};

use anyhow::{Context, Result};
use std::path::Path;

/// Analyze a Katalon project with the configuration found in its root
pub fn analyze_project<P: AsRef<Path>>(project_root: P) -> Result<ProjectAnalysis> {
    let root = project_root.as_ref();
    let analyzer = ProjectAnalyzer::for_project(root)?;
    analyzer
        .analyze(root)
        .with_context(|| format!("Failed to analyze {}", root.display()))
}
