//! This module defines the `Command` enum and its associated methods for parsing
//! and handling user commands in the FATX inspection tool.
//!
//! The `Command` enum represents the commands that the user can input, such as opening
//! an image, listing a directory, extracting a file, or handling invalid or unknown
//! commands.

/// Represents a user command in the FATX inspection tool.
#[derive(Debug, PartialEq)]
pub enum Command {
    /// Command to quit the program.
    Quit,
    /// Command to open an image, with the path and the byte offset of the volume.
    Open(String, u64),
    /// Command to print the superblock and the volume layout.
    Print,
    /// List a directory, the root directory if no path is given.
    Ls(Option<String>),
    /// Print the whole directory tree.
    Tree,
    /// Print the content of a file.
    Cat(String),
    /// Copy a file out of the image: path in the image, destination path.
    Extract(String, String),
    /// Command for an unknown input, encapsulating the raw input as a `String`.
    Unknown(String),
    /// Command for invalid input, encapsulating an error message as a `String`.
    Invalid(String),
    /// Command for an empty input.
    Empty,
}

impl Command {
    /// Parses a string into a `Command` instance.
    ///
    /// # Parameters
    /// - `s`: A string slice representing the user input.
    ///
    /// # Returns
    /// - `Command::Quit` if the input is "quit".
    /// - `Command::Open` with the image path and offset (default 0) if the input starts with "open".
    /// - `Command::Print` if the input is "print".
    /// - `Command::Ls` if the input starts with "ls", with an optional path.
    /// - `Command::Tree` if the input is "tree".
    /// - `Command::Cat` if the input is "cat" followed by a path.
    /// - `Command::Extract` if the input is "extract" followed by two paths.
    /// - `Command::Unknown` if the input does not match any known command.
    /// - `Command::Invalid` if arguments are missing or malformed.
    /// - `Command::Empty` if the input is empty or contains only whitespace.
    pub fn from_string(s: &str) -> Self {
        let mut parts = s.split_whitespace();
        match parts.next() {
            Some("quit") => Command::Quit,
            Some("open") => match (parts.next(), parts.next()) {
                (Some(path), None) => Command::Open(path.to_string(), 0),
                (Some(path), Some(offset)) => match parse_offset(offset) {
                    Some(offset) => Command::Open(path.to_string(), offset),
                    None => Command::Invalid(String::from(
                        "Arg parsing error: 'open' expects the offset as an unsigned integer.",
                    )),
                },
                (None, _) => Command::Invalid(String::from(
                    "Missing arg: 'open' expects the path to an image file.",
                )),
            },
            Some("print") => Command::Print,
            Some("ls") => Command::Ls(parts.next().map(String::from)),
            Some("tree") => Command::Tree,
            Some("cat") => match parts.next() {
                Some(path) => Command::Cat(path.to_string()),
                None => Command::Invalid(String::from(
                    "Missing arg: 'cat' expects the path of a file.",
                )),
            },
            Some("extract") => match (parts.next(), parts.next()) {
                (Some(path), Some(dest)) => Command::Extract(path.to_string(), dest.to_string()),
                _ => Command::Invalid(String::from(
                    "Missing arg: 'extract' expects the path of a file and a destination.",
                )),
            },
            Some(other) => Command::Unknown(other.to_string()),
            None => Command::Empty,
        }
    }
}

/// Parses a decimal or `0x`-prefixed hexadecimal offset.
pub fn parse_offset(s: &str) -> Option<u64> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse::<u64>().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open() {
        assert_eq!(
            Command::from_string("open disk.img\n"),
            Command::Open("disk.img".to_string(), 0)
        );
        assert_eq!(
            Command::from_string("open disk.img 0x80000"),
            Command::Open("disk.img".to_string(), 0x80000)
        );
        assert!(matches!(Command::from_string("open"), Command::Invalid(_)));
        assert!(matches!(
            Command::from_string("open disk.img twelve"),
            Command::Invalid(_)
        ));
    }

    #[test]
    fn test_navigation_commands() {
        assert_eq!(Command::from_string("ls"), Command::Ls(None));
        assert_eq!(
            Command::from_string("ls UDATA/4d530004"),
            Command::Ls(Some("UDATA/4d530004".to_string()))
        );
        assert_eq!(Command::from_string("tree"), Command::Tree);
        assert_eq!(
            Command::from_string("cat default.xbe"),
            Command::Cat("default.xbe".to_string())
        );
        assert_eq!(
            Command::from_string("extract a/b.sav out.sav"),
            Command::Extract("a/b.sav".to_string(), "out.sav".to_string())
        );
        assert!(matches!(Command::from_string("extract a"), Command::Invalid(_)));
        assert!(matches!(Command::from_string("cat"), Command::Invalid(_)));
    }

    #[test]
    fn test_other_commands() {
        assert_eq!(Command::from_string("quit"), Command::Quit);
        assert_eq!(Command::from_string("print"), Command::Print);
        assert_eq!(Command::from_string("   \n"), Command::Empty);
        assert_eq!(
            Command::from_string("format"),
            Command::Unknown("format".to_string())
        );
    }

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("4096"), Some(4096));
        assert_eq!(parse_offset("0x1000"), Some(4096));
        assert_eq!(parse_offset("0XFF"), Some(255));
        assert_eq!(parse_offset("-1"), None);
    }
}
