//! Форматирование и вывод результатов команд

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

/// Формат вывода списков
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Table,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "table" => Ok(OutputFormat::Table),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(anyhow::anyhow!("Unknown output format: {}", s)),
        }
    }
}

/// Writer в stdout или файл
pub struct OutputWriter {
    writer: Box<dyn Write>,
    format: OutputFormat,
    pretty: bool,
}

impl OutputWriter {
    pub fn stdout(format: OutputFormat) -> Self {
        Self {
            writer: Box::new(io::stdout()),
            format,
            pretty: false,
        }
    }

    pub fn file(path: &Path, format: OutputFormat) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file {}", path.display()))?;
        Ok(Self {
            writer: Box::new(BufWriter::new(file)),
            format,
            pretty: false,
        })
    }

    /// stdout when `path` is `None`
    pub fn create(path: Option<&Path>, format: OutputFormat) -> Result<Self> {
        match path {
            Some(path) => Self::file(path, format),
            None => Ok(Self::stdout(format)),
        }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// JSON-сериализация объекта
    pub fn write_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        writeln!(self.writer, "{}", json)?;
        Ok(())
    }

    pub fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{}", line)?;
        Ok(())
    }

    pub fn write_header(&mut self, header: &str) -> Result<()> {
        match self.format {
            OutputFormat::Text => {
                writeln!(self.writer, "\n{}", header.bold().blue())?;
                writeln!(self.writer, "{}", "=".repeat(header.chars().count()).blue())?;
            }
            _ => writeln!(self.writer, "{}", header)?,
        }
        Ok(())
    }

    pub fn write_list_item(&mut self, item: &str) -> Result<()> {
        writeln!(self.writer, "  • {}", item)?;
        Ok(())
    }

    /// Таблица в текущем формате (text/table, csv или json-массив объектов)
    pub fn write_table(&mut self, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
        match self.format {
            OutputFormat::Table | OutputFormat::Text => {
                let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
                for row in rows {
                    for (width, cell) in widths.iter_mut().zip(row) {
                        *width = (*width).max(cell.chars().count());
                    }
                }

                let header_line: Vec<String> = headers
                    .iter()
                    .zip(&widths)
                    .map(|(header, width)| format!("{:width$}", header, width = *width))
                    .collect();
                writeln!(self.writer, "{}", header_line.join(" │ ").bold())?;

                let separator: Vec<String> = widths.iter().map(|width| "─".repeat(*width)).collect();
                writeln!(self.writer, "{}", separator.join("─┼─"))?;

                for row in rows {
                    let cells: Vec<String> = row
                        .iter()
                        .enumerate()
                        .map(|(i, cell)| match widths.get(i) {
                            Some(width) => format!("{:width$}", cell, width = *width),
                            None => cell.clone(),
                        })
                        .collect();
                    writeln!(self.writer, "{}", cells.join(" │ "))?;
                }
            }
            OutputFormat::Csv => {
                writeln!(self.writer, "{}", headers.join(","))?;
                for row in rows {
                    let cells: Vec<String> = row.iter().map(|cell| csv_escape(cell)).collect();
                    writeln!(self.writer, "{}", cells.join(","))?;
                }
            }
            OutputFormat::Json => {
                let objects: Vec<serde_json::Value> = rows
                    .iter()
                    .map(|row| {
                        let object: serde_json::Map<String, serde_json::Value> = headers
                            .iter()
                            .zip(row)
                            .map(|(header, cell)| {
                                (header.to_string(), serde_json::Value::String(cell.clone()))
                            })
                            .collect();
                        serde_json::Value::Object(object)
                    })
                    .collect();
                self.write_json(&objects)?;
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Кавычки для ячеек с запятыми, кавычками или переводами строк
fn csv_escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
