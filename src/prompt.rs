// src/prompt.rs
//
// Interactive GAQL prompt. Each line is run as one query and its tables are
// printed before the next prompt.

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::app::Application;
use crate::render::{write_outcome, OutputFormat};

const PROMPT: &str = ">>> ";
const EXIT_COMMAND: &str = "exit";
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Install the Ctrl-C handling used while a query runs: the first Ctrl-C sets
/// the returned flag, a second one before it is cleared terminates the process.
pub fn interrupt_flag() -> Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register_conditional_shutdown(
        signal_hook::consts::SIGINT,
        INTERRUPTED_EXIT_CODE,
        Arc::clone(&flag),
    )
    .context("installing SIGINT handler")?;
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&flag))
        .context("installing SIGINT handler")?;
    Ok(flag)
}

/// What the prompt should do with one line of input.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Skip,
    Exit,
    Query(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Line::Skip
    } else if trimmed == EXIT_COMMAND {
        Line::Exit
    } else {
        Line::Query(trimmed)
    }
}

pub struct Prompt<'a> {
    app: &'a Application,
    format: OutputFormat,
    history: Option<PathBuf>,
    interrupt: Arc<AtomicBool>,
}

impl<'a> Prompt<'a> {
    pub fn new(app: &'a Application, format: OutputFormat, interrupt: Arc<AtomicBool>) -> Self {
        Self {
            app,
            format,
            history: None,
            interrupt,
        }
    }

    /// Load and save line history at `path`.
    pub fn with_history(mut self, path: PathBuf) -> Self {
        self.history = Some(path);
        self
    }

    /// Read queries until `exit`, Ctrl-D or a terminal error.
    pub fn run(&self) -> Result<()> {
        let mut editor = DefaultEditor::new().context("initializing line editor")?;
        if let Some(path) = &self.history {
            if let Err(err) = editor.load_history(path) {
                debug!(path = %path.display(), error = %err, "no prompt history loaded");
            }
        }

        loop {
            match editor.readline(PROMPT) {
                Ok(line) => match classify(&line) {
                    Line::Skip => continue,
                    Line::Exit => break,
                    Line::Query(query) => {
                        if let Err(err) = editor.add_history_entry(query) {
                            debug!(error = %err, "query not added to prompt history");
                        }
                        self.execute(query)?;
                    }
                },
                // Ctrl-C at the prompt only abandons the current line
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err).context("reading prompt input"),
            }
        }

        if let Some(path) = &self.history {
            if let Some(parent) = path.parent() {
                if let Err(err) = std::fs::create_dir_all(parent) {
                    warn!(path = %parent.display(), error = %err, "could not create history directory");
                }
            }
            if let Err(err) = editor.save_history(path) {
                warn!(path = %path.display(), error = %err, "could not save prompt history");
            }
        }
        Ok(())
    }

    /// Run one query and print its outcome. Query failures are reported and
    /// the prompt carries on; only output errors are returned.
    fn execute(&self, query: &str) -> Result<()> {
        self.interrupt.store(false, Ordering::SeqCst);
        let result = self.app.query_until(query, &self.interrupt);
        self.interrupt.store(false, Ordering::SeqCst);

        let stdout = io::stdout();
        let stderr = io::stderr();
        let mut out = stdout.lock();
        let mut err = stderr.lock();
        match result {
            Ok(done) => {
                if done.interrupted {
                    writeln!(err, "Query interrupted; showing the rows received so far.")?;
                }
                write_outcome(&done.outcome, self.format, &mut out, &mut err)?;
            }
            Err(failure) => writeln!(err, "{}", failure.report())?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_input_lines() {
        assert_eq!(classify(""), Line::Skip);
        assert_eq!(classify("   \t"), Line::Skip);
        assert_eq!(classify("exit"), Line::Exit);
        assert_eq!(classify("  exit "), Line::Exit);
        assert_eq!(classify("EXIT"), Line::Query("EXIT"));
        assert_eq!(
            classify(" SELECT campaign.id FROM campaign "),
            Line::Query("SELECT campaign.id FROM campaign")
        );
        assert_eq!(classify("exit now"), Line::Query("exit now"));
    }
}
