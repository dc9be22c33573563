use anyhow::{anyhow, Result};
use serde::Serialize;
use std::io::{self, Write};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    Jsonl,
    #[default]
    Text,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "jsonl" => Ok(OutputFormat::Jsonl),
            "text" | "txt" => Ok(OutputFormat::Text),
            _ => Err(anyhow!("unknown format: {s}")),
        }
    }
}

#[derive(Serialize)]
struct JsonlEvent<'a, T> {
    #[serde(rename = "type")]
    kind: &'a str,
    data: &'a T,
}

/// Print `value` in the requested format. `text` renders the human form and
/// is only called for [`OutputFormat::Text`].
pub fn emit<T, F>(format: OutputFormat, kind: &str, value: &T, text: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    let mut stdout = io::stdout().lock();
    match format {
        OutputFormat::Json => {
            let data = serde_json::to_string_pretty(value)?;
            writeln!(stdout, "{data}")?;
        }
        OutputFormat::Jsonl => {
            let line = serde_json::to_string(&JsonlEvent { kind, data: value })?;
            writeln!(stdout, "{line}")?;
        }
        OutputFormat::Text => {
            writeln!(stdout, "{}", text(value))?;
        }
    }
    Ok(())
}
