//! Command-line definitions for the interactive loop.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Sections,
    Filter(String),
    More,
    Select(String),
    Next,
    Prev,
    Refresh,
    Stats,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command '{0}' (type 'help')")]
    Unknown(String),
    #[error("'{command}' needs a {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
}

pub const HELP: &str = "\
commands:
  sections         list known sections
  filter <name>    switch to a section
  more             load the next page
  select <id>      select an item by id
  next | prev      move the selection
  refresh          reload the current section
  stats            re-fetch summary stats
  show             print the feed
  help             this text
  quit             exit";

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let argument = words.next();

    let command = match head.to_ascii_lowercase().as_str() {
        "sections" | "ls" => Command::Sections,
        "filter" | "f" => Command::Filter(required(argument, "filter", "section name")?),
        "more" | "m" => Command::More,
        "select" | "s" => Command::Select(required(argument, "select", "item id")?),
        "next" | "n" | "j" => Command::Next,
        "prev" | "p" | "k" => Command::Prev,
        "refresh" | "r" => Command::Refresh,
        "stats" => Command::Stats,
        "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn required(
    argument: Option<&str>,
    command: &'static str,
    name: &'static str,
) -> Result<String, CommandError> {
    argument
        .map(str::to_string)
        .ok_or(CommandError::MissingArgument {
            command,
            argument: name,
        })
}
