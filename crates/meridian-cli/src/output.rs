use console::style;
use serde::Serialize;
use std::fmt::Display;
use tabled::{settings::Style, Table, Tabled};

/// Output format mode
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Human,
    Json,
}

pub struct OutputWriter {
    format: OutputFormat,
}

fn print_json(value: &serde_json::Value, to_stderr: bool) {
    let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    if to_stderr {
        eprintln!("{}", text);
    } else {
        println!("{}", text);
    }
}

fn status(status: &str, message: impl Display) -> serde_json::Value {
    serde_json::json!({
        "status": status,
        "message": message.to_string(),
    })
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self {
            format: if json {
                OutputFormat::Json
            } else {
                OutputFormat::Human
            },
        }
    }

    pub fn info(&self, message: impl Display) {
        match self.format {
            OutputFormat::Human => {
                println!("{} {}", style("ℹ").blue().bold(), message);
            }
            OutputFormat::Json => print_json(&status("info", message), false),
        }
    }

    pub fn warning(&self, message: impl Display) {
        match self.format {
            OutputFormat::Human => {
                eprintln!("{} {}", style("⚠").yellow().bold(), message);
            }
            OutputFormat::Json => print_json(&status("warning", message), true),
        }
    }

    pub fn table<T: Tabled + Serialize>(&self, data: Vec<T>) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Human => {
                if data.is_empty() {
                    println!("{}", style("(no data)").dim());
                } else {
                    let mut table = Table::new(data);
                    table.with(Style::rounded());
                    println!("{}", table);
                }
            }
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "status": "success",
                    "data": data,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
        }
        Ok(())
    }

    pub fn data<T: Serialize>(&self, data: &T) -> anyhow::Result<()> {
        let json_str = serde_json::to_string_pretty(data)?;
        println!("{}", json_str);
        Ok(())
    }

    pub fn result<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Human => {
                self.data(&data)?;
            }
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "status": "success",
                    "data": data,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
        }
        Ok(())
    }

    /// Plain text in human mode; `data` in the JSON envelope otherwise.
    pub fn text_or_result<T: Serialize>(&self, text: impl Display, data: T) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!("{}", text);
                Ok(())
            }
            OutputFormat::Json => self.result(data),
        }
    }

    pub fn kv(&self, key: impl Display, value: impl Display) {
        match self.format {
            OutputFormat::Human => {
                println!("{}: {}", style(key).bold(), value);
            }
            OutputFormat::Json => {
                let output = serde_json::json!({
                    key.to_string(): value.to_string(),
                });
                print_json(&output, false);
            }
        }
    }

    pub fn section(&self, title: impl Display) {
        match self.format {
            OutputFormat::Human => {
                println!("\n{}", style(title).bold().underlined());
            }
            OutputFormat::Json => {}
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }
}
