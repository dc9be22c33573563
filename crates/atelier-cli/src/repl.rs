use anyhow::{anyhow, Result};
use atelier_core::{AspectRatio, OutputKind};
use std::path::PathBuf;

pub const HELP: &str = "\
commands:
  prompt <text>    edit the draft prompt (not recorded until blur or generate)
  blur             commit the draft prompt
  aspect <ratio>   1:1, 16:9, 9:16, 3:4 or 4:3
  quality <tier>   image: fast, standard, hd, uhd; video: fast, standard, quality, pro
  tab <kind>       create, edit or video
  ref <path>       attach a reference image
  unref            drop the reference image
  undo / redo      move through history
  show             print the current snapshot
  history          list every snapshot
  generate         run a generation with the current snapshot
  help             this text
  quit             leave the studio";

/// One line of studio input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Prompt(String),
    Blur,
    Aspect(AspectRatio),
    Quality(String),
    Tab(OutputKind),
    Ref(PathBuf),
    Unref,
    Undo,
    Redo,
    Show,
    History,
    Generate,
    Help,
    Quit,
}

/// Parse a line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<SessionCommand>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_lowercase().as_str() {
        "prompt" => SessionCommand::Prompt(rest.to_string()),
        "blur" => SessionCommand::Blur,
        "aspect" => SessionCommand::Aspect(required(word, rest)?.parse()?),
        "quality" => SessionCommand::Quality(required(word, rest)?.to_lowercase()),
        "tab" => SessionCommand::Tab(required(word, rest)?.parse()?),
        "ref" => SessionCommand::Ref(PathBuf::from(required(word, rest)?)),
        "unref" => SessionCommand::Unref,
        "undo" => SessionCommand::Undo,
        "redo" => SessionCommand::Redo,
        "show" => SessionCommand::Show,
        "history" => SessionCommand::History,
        "generate" | "go" => SessionCommand::Generate,
        "help" | "?" => SessionCommand::Help,
        "quit" | "exit" | "q" => SessionCommand::Quit,
        other => return Err(anyhow!("unknown command: {other} (try `help`)")),
    };
    Ok(Some(command))
}

fn required<'a>(word: &str, rest: &'a str) -> Result<&'a str> {
    if rest.is_empty() {
        Err(anyhow!("{word} needs an argument"))
    } else {
        Ok(rest)
    }
}
