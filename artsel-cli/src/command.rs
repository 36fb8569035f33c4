//! Command line parsing for the interactive session.

use std::str::FromStr;

use artsel_lib::selection::parse_count;

use crate::error::CliError;

pub const HELP: &str = "\
commands:
  page <n>          show page n
  next | prev       show the next / previous page
  first | last      show the first / last page
  reload            fetch the current page again
  toggle [ids...]   select exactly these ids on the current page
  pick <n>          select the first n artworks (runs in the background)
  all               select every reachable artwork (runs in the background)
  clear             clear the whole selection
  cancel            stop the running background selection
  status            show pagination and selection state
  selected          list the selected artworks
  help              show this help
  quit              leave";

/// One line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Page(u32),
    Next,
    Prev,
    First,
    Last,
    Reload,
    Toggle(Vec<u64>),
    Pick(usize),
    All,
    Clear,
    Cancel,
    Status,
    Selected,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = CliError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(CliError::usage("type `help` for commands"));
        };
        let args: Vec<&str> = words.collect();

        let command = match name.to_ascii_lowercase().as_str() {
            "page" | "p" => Self::Page(single(name, &args)?.parse().map_err(|_| {
                CliError::usage(format!("not a page number: {:?}", args[0]))
            })?),
            "next" | "n" => Self::Next,
            "prev" | "previous" => Self::Prev,
            "first" => Self::First,
            "last" => Self::Last,
            "reload" => Self::Reload,
            "toggle" | "t" => Self::Toggle(
                args.iter()
                    .map(|id| {
                        id.trim_matches(',')
                            .parse()
                            .map_err(|_| CliError::usage(format!("not an artwork id: {id:?}")))
                    })
                    .collect::<Result<_, _>>()?,
            ),
            "pick" => Self::Pick(parse_count(single(name, &args)?)?),
            "all" => Self::All,
            "clear" => Self::Clear,
            "cancel" => Self::Cancel,
            "status" => Self::Status,
            "selected" | "ls" => Self::Selected,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(CliError::usage(format!("unknown command {other:?}"))),
        };
        Ok(command)
    }
}

/// Returns the only argument of `name`.
fn single<'a>(name: &str, args: &[&'a str]) -> Result<&'a str, CliError> {
    match args {
        [arg] => Ok(arg),
        _ => Err(CliError::usage(format!("`{name}` takes exactly one argument"))),
    }
}
