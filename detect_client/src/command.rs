//! User commands read from the terminal.
//!
use std::{path::PathBuf, str::FromStr};

pub const HELP: &str = "\
Commands:
  start               start the camera
  capture             capture a frame and run detection on it
  upload <path>...    run detection on the first of the given files
  status              show the current state
  help                show this message
  quit                exit";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    StartCamera,
    Capture,
    /// File selection, possibly empty.
    Upload(Vec<PathBuf>),
    Status,
    Help,
    Quit,
}

#[derive(Debug, Eq, PartialEq)]
pub struct UnknownCommand(pub String);

impl std::fmt::Display for UnknownCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown command {:?}", self.0)
    }
}

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = match words.next().unwrap_or_default() {
            "start" => Command::StartCamera,
            "capture" | "c" => Command::Capture,
            "upload" | "u" => Command::Upload(words.map(PathBuf::from).collect()),
            "status" => Command::Status,
            "help" | "?" | "" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(UnknownCommand(other.to_owned())),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("start".parse(), Ok(Command::StartCamera));
        assert_eq!("  capture ".parse(), Ok(Command::Capture));
        assert_eq!("q".parse(), Ok(Command::Quit));
        assert_eq!("".parse(), Ok(Command::Help));
    }

    #[test]
    fn test_parse_upload_selection() {
        assert_eq!("upload".parse(), Ok(Command::Upload(vec![])));
        assert_eq!(
            "upload photo.png other.jpg".parse(),
            Ok(Command::Upload(vec![
                PathBuf::from("photo.png"),
                PathBuf::from("other.jpg")
            ]))
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            "detect".parse::<Command>(),
            Err(UnknownCommand("detect".to_owned()))
        );
    }
}
