//! Line-based chat for pipes, dumb terminals and `--plain`

use anyhow::Result;
use std::io::{BufRead, Write};

use tapix_core::{Role, SUGGESTED_QUESTIONS};

use super::{Renderer, SessionView, stats_text};
use crate::app::App;
use crate::commands::{Command, Input, help_text, parse_input};

pub struct PlainRenderer<W: Write> {
    out: W,
    printed: usize,
    notice_shown: bool,
}

impl<W: Write> PlainRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            printed: 0,
            notice_shown: false,
        }
    }

    pub fn print(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{}", text.trim_end())?;
        Ok(())
    }

    fn prompt(&mut self) -> Result<()> {
        write!(self.out, "> ")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> Renderer for PlainRenderer<W> {
    /// Prints only what is new since the previous call
    fn render(&mut self, view: &SessionView<'_>) -> Result<()> {
        if !self.notice_shown {
            writeln!(self.out, "{}", view.title)?;
            if let Some(n) = view.notice {
                writeln!(self.out, "note: {n}")?;
            }
            self.notice_shown = true;
        }
        for m in view.messages.iter().skip(self.printed) {
            match m.role {
                // the user already sees what they typed
                Role::User => {}
                Role::Assistant => writeln!(self.out, "\ntapix: {}\n", m.content)?,
                Role::System => writeln!(self.out, "[{}]", m.content)?,
            }
        }
        self.printed = view.messages.len();
        if let Some(s) = view.status {
            writeln!(self.out, "({s})")?;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// `echo` repeats typed questions as `you: …`, for input that is not a
/// terminal and so never appears on screen
pub fn run_plain(app: &mut App, input: impl BufRead, out: impl Write, echo: bool) -> Result<()> {
    let mut r = PlainRenderer::new(out);
    r.render(&app.view(None, ""))?;
    r.print("Type a question, /1-/5 for a suggestion, /help for commands, /quit to leave.")?;

    let mut lines = input.lines();
    loop {
        r.prompt()?;
        let Some(line) = lines.next() else { break };
        let line = line?;

        match parse_input(&line) {
            Input::Empty => continue,
            Input::Question(q) => {
                if echo {
                    r.print(&format!("you: {q}"))?;
                }
                r.render(&app.view(Some("thinking…"), ""))?;
                app.ask(&q);
            }
            Input::Suggestion(i) => {
                if let Some(q) = SUGGESTED_QUESTIONS.get(i) {
                    r.print(&format!("you: {q}"))?;
                }
                r.render(&app.view(Some("thinking…"), ""))?;
                app.ask_suggestion(i);
            }
            Input::Command(Command::Help) => r.print(&help_text())?,
            Input::Command(Command::Stats) => r.print(&stats_text(&app.view(None, "")))?,
            Input::Command(Command::Context) => r.print(&app.session.context().to_lines())?,
            Input::Command(Command::Quit) => break,
            Input::Command(Command::Unknown(s)) => r.print(&format!("Unknown command {s}. Try /help"))?,
        }
        r.render(&app.view(None, ""))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::offline_app;

    fn run(script: &str, echo: bool) -> (String, App) {
        let mut app = offline_app();
        let mut out = Vec::new();
        run_plain(&mut app, script.as_bytes(), &mut out, echo).unwrap();
        (String::from_utf8(out).unwrap(), app)
    }

    fn transcript(script: &str) -> (String, App) {
        run(script, true)
    }

    #[test]
    fn test_greeting_and_notice_first() {
        let (out, _) = transcript("");
        assert!(out.starts_with("Tapix · July 2025 · bundled sample"));
        assert!(out.contains("note: "));
        assert!(out.contains("tapix: Hello!"));
    }

    #[test]
    fn test_question_and_suggestion_turns() {
        let (out, app) = transcript("/5\nWhat about Groceries?\n");
        assert!(out.contains("you: What are my recurring subscriptions?"));
        assert!(out.contains("you: What about Groceries?"));
        assert!(out.contains("Recurring payments"));
        assert!(out.contains("Groceries in July 2025"));
        assert!(out.contains("(thinking…)"));
        // greeting + two turns
        assert_eq!(app.session.messages().len(), 5);
    }

    #[test]
    fn test_typed_questions_not_echoed_on_a_terminal() {
        let (out, app) = run("What about Groceries?\n/5\n", false);
        assert!(!out.contains("you: What about Groceries?"));
        // suggestions are always spelled out
        assert!(out.contains("you: What are my recurring subscriptions?"));
        assert!(out.contains("Groceries in July 2025"));
        assert_eq!(app.session.messages().len(), 5);
    }

    #[test]
    fn test_commands_do_not_touch_history() {
        let (out, app) = transcript("/stats\n/context\n/nope\n\n/quit\nignored question\n");
        assert!(out.contains("Top category  Income"));
        assert!(out.contains("- period: 2025-07"));
        assert!(out.contains("Unknown command /nope"));
        assert_eq!(app.session.messages().len(), 1);
    }
}
