/*!
# Reports Module

Рендеринг [`StatisticsSnapshot`] для консоли и для внешних инструментов.

## Поддерживаемые форматы:
- **Text** - человекочитаемый отчет для консоли ([`TextReporter`])
- **Json** - снимок статистики как есть

```rust,no_run
use katalon_analyzer::{AnalyzerConfig, ProjectAnalyzer};
use katalon_analyzer::reports::{render_statistics, ReportFormat};

let analysis = ProjectAnalyzer::new(AnalyzerConfig::default())?.analyze("./MyProject")?;
let report = render_statistics(analysis.get_statistics(), ReportFormat::Text)?;
println!("{}", report);
# Ok::<(), anyhow::Error>(())
```
*/

pub mod text;

pub use text::TextReporter;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::analyzer::StatisticsSnapshot;

/// Формат отчета
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => Err(anyhow::anyhow!("Unknown report format: {}", s)),
        }
    }
}

/// Statistics snapshot in the requested format
pub fn render_statistics(snapshot: &StatisticsSnapshot, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(TextReporter::new().render(snapshot)),
        ReportFormat::Json => Ok(serde_json::to_string_pretty(snapshot)?),
    }
}
