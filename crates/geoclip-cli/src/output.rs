use console::style;
use serde::Serialize;
use std::fmt::Display;
use tabled::{settings::Style, Table, Tabled};

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self { format: if json { OutputFormat::Json } else { OutputFormat::Human } }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Human-only notice on stderr; JSON mode keeps stderr for logs
    pub fn warning(&self, message: impl Display) {
        match self.format {
            OutputFormat::Human => {
                eprintln!("{} {}", style("⚠").yellow().bold(), message);
            }
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "status": "warning",
                    "message": message.to_string(),
                });
                eprintln!("{}", output);
            }
        }
    }

    pub fn success(&self, message: impl Display) {
        if self.format == OutputFormat::Human {
            eprintln!("{} {}", style("✓").green().bold(), message);
        }
    }

    pub fn table<T: Tabled>(&self, data: Vec<T>) {
        if data.is_empty() {
            println!("{}", style("(no data)").dim());
        } else {
            let mut table = Table::new(data);
            table.with(Style::rounded());
            println!("{}", table);
        }
    }

    pub fn kv(&self, key: impl Display, value: impl Display) {
        println!("{}: {}", style(key).bold(), value);
    }

    pub fn section(&self, title: impl Display) {
        println!("\n{}", style(title).bold().underlined());
    }

    /// Pretty JSON for people, one line for pipes
    pub fn data<T: Serialize>(&self, data: &T) -> anyhow::Result<()> {
        let text = match self.format {
            OutputFormat::Human => serde_json::to_string_pretty(data)?,
            OutputFormat::Json => serde_json::to_string(data)?,
        };
        println!("{}", text);
        Ok(())
    }
}
