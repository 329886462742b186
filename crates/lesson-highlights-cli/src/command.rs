use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use lesson_highlights_engine::{ElementId, HighlightColor};

/// A paragraph key and a logical offset inside it
pub type Position = (ElementId, usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Select between two positions and let the session react as if a
    /// drag had ended there
    Select { from: Position, to: Position },
    Mode(Option<bool>),
    Color(HighlightColor),
    List,
    /// 1-based index into the `list` output
    Remove(usize),
    Recolor(usize, HighlightColor),
    Clear,
    Undo,
    Redo,
    Next,
    Prev,
    Show,
    Export(PathBuf),
    Help,
    Quit,
}

pub const HELP: &str = "\
select <p> <offset> <p> <offset>   highlight a range (needs mode on)
mode [on|off]                      toggle or set highlight mode
color <yellow|green|blue|purple>   pick the color for new highlights
list                               list highlights with their indices
remove <n>                         remove highlight n (and its group)
recolor <n> <color>                recolor highlight n (and its group)
clear                              remove every highlight in the lesson
undo | redo                        step through history
next | prev                        jump between highlights
show                               redraw the lesson
export <file.html>                 write the highlighted lesson as HTML
quit";

impl ReplCommand {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match (name, args.as_slice()) {
            ("select" | "s", [p1, o1, p2, o2]) => ReplCommand::Select {
                from: (ElementId::from(*p1), offset(o1)?),
                to: (ElementId::from(*p2), offset(o2)?),
            },
            ("mode" | "m", []) => ReplCommand::Mode(None),
            ("mode" | "m", ["on"]) => ReplCommand::Mode(Some(true)),
            ("mode" | "m", ["off"]) => ReplCommand::Mode(Some(false)),
            ("color" | "c", [color]) => ReplCommand::Color(color.parse()?),
            ("list" | "ls", []) => ReplCommand::List,
            ("remove" | "rm", [n]) => ReplCommand::Remove(index(n)?),
            ("recolor", [n, color]) => ReplCommand::Recolor(index(n)?, color.parse()?),
            ("clear", []) => ReplCommand::Clear,
            ("undo" | "u", []) => ReplCommand::Undo,
            ("redo" | "r", []) => ReplCommand::Redo,
            ("next" | "n", []) => ReplCommand::Next,
            ("prev" | "p", []) => ReplCommand::Prev,
            ("show", []) => ReplCommand::Show,
            ("export", [path]) => ReplCommand::Export(PathBuf::from(*path)),
            ("help" | "?", []) => ReplCommand::Help,
            ("quit" | "q" | "exit", []) => ReplCommand::Quit,
            _ => bail!("Unrecognised command: {}", line.trim()),
        };
        Ok(Some(command))
    }
}

fn offset(word: &str) -> Result<usize> {
    word.parse()
        .with_context(|| format!("Offset must be a number, got '{word}'"))
}

fn index(word: &str) -> Result<usize> {
    match word.parse::<usize>() {
        Ok(0) => bail!("Highlight numbers start at 1"),
        Ok(n) => Ok(n),
        Err(_) => bail!("Highlight number must be a number, got '{word}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_parse_select() {
        let command = ReplCommand::parse("select 1 4 3 2").unwrap();

        assert_eq!(
            command,
            Some(ReplCommand::Select {
                from: (ElementId::from("1"), 4),
                to: (ElementId::from("3"), 2),
            })
        );
    }

    #[rstest]
    #[case("mode", ReplCommand::Mode(None))]
    #[case("mode off", ReplCommand::Mode(Some(false)))]
    #[case("c purple", ReplCommand::Color(HighlightColor::Purple))]
    #[case("recolor 2 GREEN", ReplCommand::Recolor(2, HighlightColor::Green))]
    #[case("rm 1", ReplCommand::Remove(1))]
    #[case("u", ReplCommand::Undo)]
    #[case("export out.html", ReplCommand::Export(PathBuf::from("out.html")))]
    fn test_parse_commands(#[case] line: &str, #[case] expected: ReplCommand) {
        assert_eq!(ReplCommand::parse(line).unwrap(), Some(expected));
    }

    #[test]
    fn test_blank_line_is_nothing() {
        assert_eq!(ReplCommand::parse("   ").unwrap(), None);
    }

    #[rstest]
    #[case("select 1 x 2 3")]
    #[case("remove 0")]
    #[case("color magenta")]
    #[case("frobnicate")]
    fn test_parse_errors(#[case] line: &str) {
        assert!(ReplCommand::parse(line).is_err());
    }
}
