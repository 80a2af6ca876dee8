/*!
# Text Reporter

Консольный отчет по снимку статистики: сводка, покрытие тест-кейсов,
использование ключевых слов и объектов, импорты и тест-сьюты.

```rust,ignore
let reporter = TextReporter::new();
println!("{}", reporter.render(analysis.get_statistics()));
```
*/

use colored::{ColoredString, Colorize};
use std::fmt::Write;

use crate::analyzer::statistics::{KindSummary, UsageReport};
use crate::analyzer::StatisticsSnapshot;

/// Текстовый репортер для консольного вывода
pub struct TextReporter {
    use_colors: bool,
    /// Списки неиспользуемых элементов целиком
    detailed: bool,
}

impl Default for TextReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TextReporter {
    pub fn new() -> Self {
        Self {
            use_colors: Self::supports_colors(),
            detailed: true,
        }
    }

    /// Без цветов и без длинных списков, для CI
    pub fn brief() -> Self {
        Self {
            use_colors: false,
            detailed: false,
        }
    }

    pub fn with_config(use_colors: bool, detailed: bool) -> Self {
        Self {
            use_colors,
            detailed,
        }
    }

    fn supports_colors() -> bool {
        if std::env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if std::env::var_os("FORCE_COLOR").is_some() {
            return true;
        }
        !matches!(std::env::var("TERM").as_deref(), Ok("dumb") | Ok(""))
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.use_colors {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn header(&self, out: &mut String, title: &str) {
        let _ = writeln!(out, "\n{}", self.paint(title, |t| t.bold().blue()));
        let _ = writeln!(out, "{}", "=".repeat(title.chars().count()));
    }

    pub fn render(&self, snapshot: &StatisticsSnapshot) -> String {
        let mut out = String::new();
        self.render_summary(&mut out, snapshot);
        self.render_coverage(&mut out, snapshot);
        self.render_usage(&mut out, "Keyword usage", &snapshot.keyword_usage);
        self.render_usage(&mut out, "Object repository usage", &snapshot.object_usage);
        self.render_imports(&mut out, snapshot);
        self.render_suites(&mut out, snapshot);

        if !snapshot.unresolved_references.is_empty() {
            self.header(&mut out, "Unresolved references");
            let limit = if self.detailed { usize::MAX } else { 10 };
            for reference in snapshot.unresolved_references.iter().take(limit) {
                let _ = writeln!(out, "  • {}", reference);
            }
            if snapshot.unresolved_references.len() > limit {
                let _ = writeln!(out, "  ... {} more", snapshot.unresolved_references.len() - limit);
            }
        }
        out
    }

    fn render_summary(&self, out: &mut String, snapshot: &StatisticsSnapshot) {
        let summary = &snapshot.summary;
        self.header(out, "Project summary");

        let kinds: [(&str, &KindSummary); 7] = [
            ("Test cases", &summary.test_cases),
            ("Test suites", &summary.test_suites),
            ("Keyword files", &summary.keyword_files),
            ("Keywords", &summary.keywords),
            ("Objects", &summary.objects),
            ("Profiles", &summary.profiles),
            ("Scripts", &summary.scripts),
        ];
        for (label, kind) in kinds {
            let _ = writeln!(out, "  {:<14} {:>6}  ({} files)", label, kind.total, kind.files);
            if self.detailed {
                for (folder, count) in &kind.by_folder {
                    let _ = writeln!(out, "      {:<28} {}", self.paint(folder, |t| t.dimmed()), count);
                }
            }
        }

        if !summary.objects_by_type.is_empty() {
            let by_type: Vec<String> = summary
                .objects_by_type
                .iter()
                .map(|(kind, count)| format!("{}: {}", kind, count))
                .collect();
            let _ = writeln!(out, "  Object types: {}", by_type.join(", "));
        }
        let _ = writeln!(
            out,
            "  Default profile: {} ({} variables in all profiles)",
            summary.default_profile.as_deref().unwrap_or("-"),
            summary.total_variables
        );
    }

    fn render_coverage(&self, out: &mut String, snapshot: &StatisticsSnapshot) {
        let coverage = &snapshot.test_case_coverage;
        self.header(out, "Test case coverage");

        let percentage = format!("{:.2}%", coverage.coverage_percentage);
        let painted = if coverage.coverage_percentage >= 80.0 {
            self.paint(&percentage, |t| t.green())
        } else if coverage.coverage_percentage >= 50.0 {
            self.paint(&percentage, |t| t.yellow())
        } else {
            self.paint(&percentage, |t| t.red())
        };
        let _ = writeln!(
            out,
            "  {} of {} test cases are in a suite: {}",
            coverage.used, coverage.total, painted
        );
        if self.detailed {
            for id in &coverage.unused_test_cases {
                let _ = writeln!(out, "  • {}", id);
            }
        }
    }

    fn render_usage(&self, out: &mut String, title: &str, report: &UsageReport) {
        self.header(out, title);
        let _ = writeln!(
            out,
            "  {} total, {} used, {} unused ({:.2}%)",
            report.total, report.used, report.unused, report.usage_percentage
        );

        if !report.most_used.is_empty() {
            let _ = writeln!(out, "  Most used:");
            for usage in &report.most_used {
                let _ = writeln!(out, "    {:>4}  {}", usage.count, usage.name);
            }
        }
        if self.detailed && !report.unused_names.is_empty() {
            let _ = writeln!(out, "  {}", self.paint("Unused:", |t| t.yellow()));
            for name in &report.unused_names {
                let _ = writeln!(out, "    • {}", name);
            }
        }
    }

    fn render_imports(&self, out: &mut String, snapshot: &StatisticsSnapshot) {
        let imports = &snapshot.import_analysis;
        self.header(out, "Imports");
        let _ = writeln!(out, "  {} unique imports", imports.total_unique_imports);
        for usage in &imports.top_imports {
            let _ = writeln!(out, "    {:>4}  {}", usage.count, usage.name);
        }
        for cycle in &imports.cycles {
            let _ = writeln!(
                out,
                "  {} {}",
                self.paint("cycle:", |t| t.red()),
                cycle.join(" <-> ")
            );
        }
    }

    fn render_suites(&self, out: &mut String, snapshot: &StatisticsSnapshot) {
        let suites = &snapshot.test_suite_analysis;
        self.header(out, "Test suites");
        let _ = writeln!(
            out,
            "  {} suites, {} test case entries, {:.2} per suite",
            suites.total_suites, suites.total_test_cases_in_suites, suites.average_test_cases_per_suite
        );
        let _ = writeln!(
            out,
            "  rerun: {}, data binding: {}, setup: {}, teardown: {}",
            suites.suites_with_rerun,
            suites.suites_with_data_binding,
            suites.suites_with_setup,
            suites.suites_with_teardown
        );

        if self.detailed {
            for suite in &suites.suites {
                let mut flags = Vec::new();
                if suite.raw {
                    flags.push("script only");
                }
                if suite.is_rerun {
                    flags.push("rerun");
                }
                if suite.uses_data_binding {
                    flags.push("data binding");
                }
                let unresolved = if suite.unresolved_count > 0 {
                    format!(", {} unresolved", suite.unresolved_count)
                } else {
                    String::new()
                };
                let _ = writeln!(
                    out,
                    "  • {} ({} test cases{}) {}",
                    suite.name,
                    suite.test_case_count,
                    unresolved,
                    flags.join(" ")
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::statistics::{TestCaseCoverage, UsageCount};

    #[test]
    fn test_render_plain_text() {
        let mut snapshot = StatisticsSnapshot::default();
        snapshot.test_case_coverage = TestCaseCoverage {
            total: 10,
            used: 7,
            unused: 3,
            coverage_percentage: 70.0,
            unused_test_cases: vec!["Test Cases/Orphan".to_string()],
        };
        snapshot.keyword_usage.most_used = vec![UsageCount {
            name: "com.acme.Auth.login".to_string(),
            count: 4,
        }];

        let text = TextReporter::with_config(false, true).render(&snapshot);
        assert!(text.contains("7 of 10 test cases are in a suite: 70.00%"));
        assert!(text.contains("• Test Cases/Orphan"));
        assert!(text.contains("com.acme.Auth.login"));
        assert!(!text.contains("\x1b["));
    }

    #[test]
    fn test_percentages_are_rounded_for_display() {
        let mut snapshot = StatisticsSnapshot::default();
        snapshot.keyword_usage.total = 3;
        snapshot.keyword_usage.used = 2;
        snapshot.keyword_usage.unused = 1;
        snapshot.keyword_usage.usage_percentage = 2.0 / 3.0 * 100.0;

        let text = TextReporter::with_config(false, false).render(&snapshot);
        assert!(text.contains("3 total, 2 used, 1 unused (66.67%)"));
    }

    #[test]
    fn test_brief_hides_lists() {
        let mut snapshot = StatisticsSnapshot::default();
        snapshot.keyword_usage.unused_names = vec!["a.B.c".to_string()];
        let text = TextReporter::brief().render(&snapshot);
        assert!(!text.contains("a.B.c"));
    }
}
