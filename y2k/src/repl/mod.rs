//! REPL (Read-Eval-Print Loop) for digit streams
//!
//! Every line is stripped like raw program text and run against one
//! interpreter, so variables survive from line to line.

use crate::interp::{Context, Interpreter, Outcome, RunOptions};
use crate::source::strip_raw;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::io::{self, Stdout, Write};
use std::path::PathBuf;

const PROMPT: &str = "y2k> ";
const HISTORY_FILE: &str = ".y2k_history";

/// Interpreter state shared by every line of a session
pub struct Session<W: Write> {
    interpreter: Interpreter<W>,
}

impl<W: Write> Session<W> {
    pub fn new(interpreter: Interpreter<W>) -> Self {
        Session { interpreter }
    }

    pub fn interpreter(&self) -> &Interpreter<W> {
        &self.interpreter
    }

    /// Run one line of input. Returns a message for the user, if any.
    pub fn eval_line(&mut self, line: &str) -> Option<String> {
        let digits = strip_raw(line);
        if digits.is_empty() {
            return None;
        }
        match self.interpreter.run(&digits) {
            Ok(Outcome::Finished) => None,
            Ok(Outcome::Aborted) => Some("(continue)".to_string()),
            Err(err) => Some(format!("{err}")),
        }
    }

    /// Handle a `:` command. Returns `None` to quit, otherwise text to show.
    pub fn handle_command(&mut self, cmd: &str) -> Option<String> {
        let mut parts = cmd.split_whitespace();
        let name = parts.next().unwrap_or("");
        let arg = parts.next();

        let reply = match name {
            ":quit" | ":q" | ":exit" => return None,
            ":help" | ":h" | ":?" => help_text(),
            ":vars" => {
                let vars: Vec<String> = self
                    .interpreter
                    .variables()
                    .iter()
                    .map(|v| v.to_string())
                    .collect();
                if vars.is_empty() {
                    "(no variables)".to_string()
                } else {
                    vars.join("\n")
                }
            }
            ":window" => match arg.map(str::parse::<usize>) {
                Some(Ok(window)) if window > 0 => {
                    let ctx = self.interpreter.context();
                    self.interpreter.set_context(Context::new(window, ctx.debug));
                    format!("window = {window}")
                }
                _ => "usage: :window <digits>".to_string(),
            },
            ":debug" => {
                let ctx = self.interpreter.context();
                self.interpreter.set_context(Context::new(ctx.window, !ctx.debug));
                format!("debug = {}", !ctx.debug)
            }
            _ => format!("Unknown command: {cmd}\nType :help for help."),
        };
        Some(reply)
    }
}

/// REPL state
pub struct Repl {
    editor: DefaultEditor,
    session: Session<Stdout>,
    history_path: Option<PathBuf>,
}

impl Repl {
    /// Create a new REPL
    pub fn new(context: Context, options: RunOptions) -> RlResult<Self> {
        let editor = DefaultEditor::new()?;
        let interpreter = Interpreter::with_writer(context, io::stdout()).with_options(options);
        let history_path = dirs_home().map(|h| h.join(HISTORY_FILE));

        let mut repl = Repl {
            editor,
            session: Session::new(interpreter),
            history_path,
        };

        if let Some(ref path) = repl.history_path {
            let _ = repl.editor.load_history(path);
        }

        Ok(repl)
    }

    /// Run the REPL
    pub fn run(&mut self) -> RlResult<()> {
        println!("Y2K REPL");
        println!("Type :help for help, :quit to exit.\n");

        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(line);

                    let reply = if line.starts_with(':') {
                        match self.session.handle_command(line) {
                            Some(reply) => Some(reply),
                            None => break,
                        }
                    } else {
                        self.session.eval_line(line)
                    };
                    if let Some(reply) = reply {
                        println!("{reply}");
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_path {
            let _ = self.editor.save_history(path);
        }
        Ok(())
    }
}

fn help_text() -> String {
    [
        "Y2K REPL Commands:",
        "  :help, :h, :?    Show this help",
        "  :quit, :q        Exit the REPL",
        "  :vars            List variables",
        "  :window <n>      Set the digit window",
        "  :debug           Toggle the step trace",
        "",
        "Anything else is run as digits; text after # or : is a comment.",
        "  9 1 2 8 9        print \"hi\"",
    ]
    .join("\n")
}

/// Get home directory
fn dirs_home() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}
