//! Commands understood by the terminal dashboard.

use crate::report::{Collection, Field, RowField};
use crate::sync::Edit;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Show,
    Apply(Edit),
    Status,
    Flush,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  show                                   Show the report
  set <field> <value>                    Set a report field (empty value clears it)
  row <list> <index> <column> <value>    Set one cell of a row list
  add <list>                             Append a blank row
  rm <list> <index>                      Remove a row
  status                                 Show load and save state
  flush                                  Save now
  q                                      Quit
Lists: program, current, next";

/// Splits off the first whitespace-delimited word.
fn next_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(at) => (&input[..at], input[at..].trim_start()),
        None => (input, ""),
    }
}

fn parse_index(word: &str) -> Result<usize, String> {
    word.parse()
        .map_err(|_| format!("invalid row index: {word}"))
}

/// Parses one input line. The error is the status text to show.
pub fn parse(line: &str) -> Result<Command, String> {
    let (verb, rest) = next_word(line.trim());
    match verb {
        "show" => Ok(Command::Show),
        "status" => Ok(Command::Status),
        "flush" => Ok(Command::Flush),
        "help" => Ok(Command::Help),
        "q" | "quit" => Ok(Command::Quit),
        "set" => {
            let (name, value) = next_word(rest);
            let field: Field = name.parse().map_err(|e| format!("{e}"))?;
            Ok(Command::Apply(Edit::SetField {
                field,
                value: value.to_string(),
            }))
        }
        "row" => {
            let (list, rest) = next_word(rest);
            let (index, rest) = next_word(rest);
            let (column, value) = next_word(rest);
            let collection: Collection = list.parse().map_err(|e| format!("{e}"))?;
            let field: RowField = column.parse().map_err(|e| format!("{e}"))?;
            Ok(Command::Apply(Edit::SetRowField {
                collection,
                index: parse_index(index)?,
                field,
                value: value.to_string(),
            }))
        }
        "add" => {
            let collection: Collection = rest.parse().map_err(|e| format!("{e}"))?;
            Ok(Command::Apply(Edit::AddRow { collection }))
        }
        "rm" => {
            let (list, index) = next_word(rest);
            let collection: Collection = list.parse().map_err(|e| format!("{e}"))?;
            Ok(Command::Apply(Edit::RemoveRow {
                collection,
                index: parse_index(index.trim())?,
            }))
        }
        "" => Err("invalid command".to_string()),
        other => Err(format!("invalid command: {other}")),
    }
}
