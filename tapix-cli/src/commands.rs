//! Chat input line parsing shared by the terminal UIs

use tapix_core::SUGGESTED_QUESTIONS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Stats,
    Context,
    Quit,
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Question(String),
    /// Zero-based index into the suggested questions
    Suggestion(usize),
    Command(Command),
}

pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Input::Question(line.to_string());
    };

    let word = rest.split_whitespace().next().unwrap_or("").to_ascii_lowercase();
    if let Ok(n) = word.parse::<usize>() {
        if (1..=SUGGESTED_QUESTIONS.len()).contains(&n) {
            return Input::Suggestion(n - 1);
        }
    }
    Input::Command(match word.as_str() {
        "help" | "h" | "?" => Command::Help,
        "stats" => Command::Stats,
        "context" | "ctx" => Command::Context,
        "quit" | "exit" | "q" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    })
}

pub fn help_text() -> String {
    let mut out = String::from(
        "Ask anything about your spending, or use a command:\n\
  /1../5     ask a suggested question\n\
  /stats     quick stats for the period\n\
  /context   show what the assistant can see\n\
  /help      this help\n\
  /quit      leave\n\nSuggested questions:\n",
    );
    for (i, q) in SUGGESTED_QUESTIONS.iter().enumerate() {
        out.push_str(&format!("  /{}  {q}\n", i + 1));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_question() {
        assert_eq!(parse_input("  How much on Tesco? "), Input::Question("How much on Tesco?".to_string()));
        assert_eq!(parse_input("   "), Input::Empty);
    }

    #[test]
    fn test_suggestion_shortcuts() {
        assert_eq!(parse_input("/1"), Input::Suggestion(0));
        assert_eq!(parse_input("/5"), Input::Suggestion(4));
        assert_eq!(parse_input("/6"), Input::Command(Command::Unknown("/6".to_string())));
        assert_eq!(parse_input("/0"), Input::Command(Command::Unknown("/0".to_string())));
    }

    #[test]
    fn test_commands() {
        assert_eq!(parse_input("/help"), Input::Command(Command::Help));
        assert_eq!(parse_input("/STATS"), Input::Command(Command::Stats));
        assert_eq!(parse_input("/ctx"), Input::Command(Command::Context));
        assert_eq!(parse_input("/exit"), Input::Command(Command::Quit));
        assert_eq!(parse_input("/"), Input::Command(Command::Unknown("/".to_string())));
    }

    #[test]
    fn test_help_lists_every_suggestion() {
        let h = help_text();
        for q in SUGGESTED_QUESTIONS {
            assert!(h.contains(q));
        }
    }
}
