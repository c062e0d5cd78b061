use navfm_core::event::Command;
use navfm_core::nav::filter::{SortDirection, SortField};

/// One parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Dispatch a core Command.
    Core(Command),
    /// Reprint the current listing.
    List,
    /// Print the breadcrumb trail of the current directory.
    Pwd,
    /// Print storage roots.
    Roots,
    /// Resolve the icon of an entry (name or absolute path).
    Icon(String),
    /// Drop the cached icon of an entry and resolve it again.
    RefreshIcon(String),
    /// Rename an entry; the second string is the typed name.
    Rename(String, String),
    /// Open an entry with the default application.
    Open(String),
    /// Print the command overview.
    Help,
    /// Quit the application.
    Quit,
}

pub const HELP: &str = "\
commands:
  cd <path>            go to a directory (absolute, or relative to the current one)
  home                 go to the home folder
  up | back | fwd      parent directory / history
  refresh              reload the current directory
  ls                   show the listing again
  pwd                  show the breadcrumb trail
  sort <field> [asc|desc]   name, size, type or date
  hidden | group | ext toggle hidden entries / directories first / known extensions
  find [text]          filter by name (no text clears)
  rename <entry> -> <new name>
  open <entry>
  icon <entry> | reicon <entry>
  roots                storage roots
  quit";

fn required<'a>(arg: &'a str, usage: &str) -> Result<&'a str, String> {
    if arg.is_empty() {
        Err(format!("usage: {usage}"))
    } else {
        Ok(arg)
    }
}

/// Parses a line. Blank lines give `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Input>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let input = match word.to_ascii_lowercase().as_str() {
        "cd" => match rest {
            "" | "~" => Input::Core(Command::OpenHome),
            ".." => Input::Core(Command::GoUp),
            path => Input::Core(Command::Navigate(path.to_string())),
        },
        "home" => Input::Core(Command::OpenHome),
        "up" | ".." => Input::Core(Command::GoUp),
        "back" | "b" => Input::Core(Command::GoBack),
        "fwd" | "forward" | "f" => Input::Core(Command::GoForward),
        "refresh" | "r" => Input::Core(Command::Refresh),
        "ls" | "l" => Input::List,
        "pwd" => Input::Pwd,
        "hidden" => Input::Core(Command::ToggleHidden),
        "group" => Input::Core(Command::ToggleGroupDirectories),
        "ext" => Input::Core(Command::ToggleHideExtensions),
        "find" | "/" => Input::Core(Command::Search(rest.to_string())),
        "sort" => {
            let mut parts = rest.split_whitespace();
            let field: SortField = required(parts.next().unwrap_or(""), "sort <field> [asc|desc]")?
                .parse()?;
            let direction = match parts.next() {
                Some(dir) => dir.parse::<SortDirection>()?,
                None => SortDirection::Ascending,
            };
            Input::Core(Command::SetSort(field, direction))
        }
        "rename" | "mv" => {
            let usage = "rename <entry> -> <new name>";
            let (from, to) = rest
                .split_once("->")
                .ok_or_else(|| format!("usage: {usage}"))?;
            Input::Rename(
                required(from.trim(), usage)?.to_string(),
                required(to.trim(), usage)?.to_string(),
            )
        }
        "open" | "o" => Input::Open(required(rest, "open <entry>")?.to_string()),
        "icon" => Input::Icon(required(rest, "icon <entry>")?.to_string()),
        "reicon" => Input::RefreshIcon(required(rest, "reicon <entry>")?.to_string()),
        "roots" | "drives" => Input::Roots,
        "help" | "?" => Input::Help,
        "quit" | "q" | "exit" => Input::Quit,
        other => return Err(format!("unknown command: {other} (try `help`)")),
    };
    Ok(Some(input))
}
