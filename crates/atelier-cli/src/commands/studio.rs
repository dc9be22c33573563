use anyhow::{Context, Result};
use atelier_core::media::ReferenceFile;
use atelier_core::output::{emit, OutputFormat};
use atelier_core::{Snapshot, Studio};
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

use crate::commands::{generate_once, GenerationReport};
use crate::orchestrator::Orchestrator;
use crate::repl::{parse_line, SessionCommand, HELP};
use crate::AppContext;

enum Flow {
    Continue,
    Quit,
}

pub(crate) async fn handle_studio(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let mut studio = Studio::new(ctx.seed()?);
    let orchestrator = ctx.orchestrator(studio.status_publisher())?;
    let interactive = io::stdin().is_terminal();
    if interactive {
        eprintln!(
            "atelier studio, saving to {}. Type `help` for commands.",
            orchestrator.store().dir().display()
        );
    }

    loop {
        if interactive {
            eprint!("{}> ", studio.kind());
            let _ = io::stderr().flush();
        }
        let Some(line) = ctx.input.next_line().await.context("read command")? else {
            break;
        };
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                eprintln!("error: {err}");
                continue;
            }
        };
        match apply(&mut studio, &orchestrator, command, format).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(err) => eprintln!("error: {err:#}"),
        }
    }
    Ok(())
}

async fn apply(
    studio: &mut Studio,
    orchestrator: &Orchestrator,
    command: SessionCommand,
    format: OutputFormat,
) -> Result<Flow> {
    match command {
        SessionCommand::Prompt(text) => studio.set_draft(text),
        SessionCommand::Blur => {
            studio.commit_draft();
        }
        SessionCommand::Aspect(ratio) => {
            studio.set_aspect_ratio(ratio);
        }
        SessionCommand::Quality(tier) => {
            studio.set_quality(&tier)?;
        }
        SessionCommand::Tab(kind) => {
            studio.switch_kind(kind);
        }
        SessionCommand::Ref(path) => {
            let reference = ReferenceFile::from_path(&path)?;
            studio.set_reference(Some(reference));
        }
        SessionCommand::Unref => {
            studio.set_reference(None);
        }
        SessionCommand::Undo => {
            if !studio.undo() {
                eprintln!("nothing to undo");
            }
        }
        SessionCommand::Redo => {
            if !studio.redo() {
                eprintln!("nothing to redo");
            }
        }
        SessionCommand::Show => {
            let view = SnapshotView::new(studio);
            emit(format, "studio.snapshot", &view, SnapshotView::render_text)?;
        }
        SessionCommand::History => {
            let entries = history_lines(studio);
            emit(format, "studio.history", &entries, |entries| {
                entries
                    .iter()
                    .map(HistoryLine::render_text)
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        SessionCommand::Generate => {
            let outcome = generate_once(studio, orchestrator).await?;
            let report = GenerationReport::new(studio, &outcome);
            emit(format, "studio.generate", &report, GenerationReport::render_text)?;
        }
        SessionCommand::Help => println!("{HELP}"),
        SessionCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

#[derive(Serialize)]
struct SnapshotView<'a> {
    position: usize,
    entries: usize,
    can_undo: bool,
    can_redo: bool,
    draft: &'a str,
    snapshot: &'a Snapshot,
}

impl<'a> SnapshotView<'a> {
    fn new(studio: &'a Studio) -> Self {
        let history = studio.history();
        Self {
            position: history.cursor() + 1,
            entries: history.len(),
            can_undo: history.can_undo(),
            can_redo: history.can_redo(),
            draft: studio.draft(),
            snapshot: studio.current(),
        }
    }

    fn render_text(&self) -> String {
        let snapshot = self.snapshot;
        let mut lines = vec![
            format!(
                "[{}/{}] {} {}",
                self.position,
                self.entries,
                snapshot.quality(),
                snapshot.aspect_ratio()
            ),
            format!("prompt: {}", snapshot.prompt()),
        ];
        if self.draft != snapshot.prompt() {
            lines.push(format!("draft: {} (uncommitted)", self.draft));
        }
        if let Some(reference) = snapshot.reference() {
            lines.push(format!("reference: {}", reference.path.display()));
        }
        if let Some(result) = snapshot.result() {
            lines.push(format!("result: {}", result.path.display()));
        }
        lines.join("\n")
    }
}

#[derive(Serialize)]
struct HistoryLine {
    index: usize,
    current: bool,
    quality: String,
    aspect_ratio: String,
    prompt: String,
    result: Option<String>,
}

impl HistoryLine {
    fn render_text(&self) -> String {
        let marker = if self.current { '>' } else { ' ' };
        let mut line = format!(
            "{marker} {:>3} {} {} {:?}",
            self.index, self.quality, self.aspect_ratio, self.prompt
        );
        if let Some(result) = &self.result {
            line.push_str(&format!(" -> {result}"));
        }
        line
    }
}

fn history_lines(studio: &Studio) -> Vec<HistoryLine> {
    let cursor = studio.history().cursor();
    studio
        .history()
        .entries()
        .iter()
        .enumerate()
        .map(|(index, snapshot)| HistoryLine {
            index,
            current: index == cursor,
            quality: snapshot.quality().to_string(),
            aspect_ratio: snapshot.aspect_ratio().to_string(),
            prompt: snapshot.prompt().to_string(),
            result: snapshot.result().map(|r| r.file_name.clone()),
        })
        .collect()
}
