use crate::utils::validation::validate_file_name;
use thiserror::Error;

pub const DEFAULT_CATEGORY: &str = "default";

pub const UPLOAD_USAGE: &str = "Usage: upload [category] filename";
pub const OPEN_USAGE: &str = "Usage: open filename";
pub const LIST_USAGE: &str = "Usage: list [category]";
pub const RENAME_USAGE: &str = "Usage: rename <old_filename> <new_filename>";
pub const DELETE_USAGE: &str = "Usage: delete <filename>";

/// A text message, split on whitespace and keyed by its first token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    Upload { category: &'a str, file_name: &'a str },
    Open { file_name: &'a str },
    List { category: Option<&'a str> },
    Rename { old_name: &'a str, new_name: &'a str },
    Delete { file_name: &'a str },
    /// Not a command keyword. Becomes file content when an upload is pending.
    Other,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("{0}")]
    Usage(&'static str),

    #[error("Error: {0}")]
    InvalidName(String),
}

impl<'a> Command<'a> {
    /// `None` for blank text.
    pub fn parse(text: &'a str) -> Option<Result<Self, CommandError>> {
        let mut tokens = text.split_whitespace();
        let keyword = tokens.next()?;
        let args: Vec<&'a str> = tokens.collect();

        Some(match keyword {
            "upload" => parse_upload(&args),
            "open" => one_arg(&args, OPEN_USAGE).map(|file_name| Command::Open { file_name }),
            "list" => match args.as_slice() {
                [] => Ok(Command::List { category: None }),
                [category] => Ok(Command::List {
                    category: Some(*category),
                }),
                _ => Err(CommandError::Usage(LIST_USAGE)),
            },
            "rename" => match args.as_slice() {
                [old_name, new_name] => checked_name(*new_name).map(|new_name| Command::Rename {
                    old_name: *old_name,
                    new_name,
                }),
                _ => Err(CommandError::Usage(RENAME_USAGE)),
            },
            "delete" => one_arg(&args, DELETE_USAGE).map(|file_name| Command::Delete { file_name }),
            _ => Ok(Command::Other),
        })
    }
}

fn parse_upload<'a>(args: &[&'a str]) -> Result<Command<'a>, CommandError> {
    let (category, file_name) = match args {
        [file_name] => (DEFAULT_CATEGORY, *file_name),
        [category, file_name] => (*category, *file_name),
        _ => return Err(CommandError::Usage(UPLOAD_USAGE)),
    };
    let file_name = checked_name(file_name)?;
    Ok(Command::Upload {
        category,
        file_name,
    })
}

fn one_arg<'a>(args: &[&'a str], usage: &'static str) -> Result<&'a str, CommandError> {
    match args {
        [arg] => Ok(*arg),
        _ => Err(CommandError::Usage(usage)),
    }
}

fn checked_name<'a>(name: &'a str) -> Result<&'a str, CommandError> {
    validate_file_name(name).map_err(|e| CommandError::InvalidName(e.message))?;
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Command<'_>, CommandError> {
        Command::parse(text).expect("non-blank input")
    }

    #[test]
    fn test_blank_text_is_ignored() {
        assert!(Command::parse("").is_none());
        assert!(Command::parse("  \n\t ").is_none());
    }

    #[test]
    fn test_upload_with_default_category() {
        assert_eq!(
            parse("upload report"),
            Ok(Command::Upload {
                category: DEFAULT_CATEGORY,
                file_name: "report"
            })
        );
    }

    #[test]
    fn test_upload_with_category() {
        assert_eq!(
            parse("upload   docs\treport"),
            Ok(Command::Upload {
                category: "docs",
                file_name: "report"
            })
        );
    }

    #[test]
    fn test_upload_arity() {
        assert_eq!(parse("upload"), Err(CommandError::Usage(UPLOAD_USAGE)));
        assert_eq!(
            parse("upload a b c"),
            Err(CommandError::Usage(UPLOAD_USAGE))
        );
    }

    #[test]
    fn test_upload_rejects_path_names() {
        assert!(matches!(
            parse("upload docs ../secret"),
            Err(CommandError::InvalidName(_))
        ));
    }

    #[test]
    fn test_open_and_delete() {
        assert_eq!(parse("open report"), Ok(Command::Open { file_name: "report" }));
        assert_eq!(parse("open"), Err(CommandError::Usage(OPEN_USAGE)));
        assert_eq!(
            parse("delete report"),
            Ok(Command::Delete { file_name: "report" })
        );
        assert_eq!(parse("delete"), Err(CommandError::Usage(DELETE_USAGE)));
    }

    #[test]
    fn test_list_variants() {
        assert_eq!(parse("list"), Ok(Command::List { category: None }));
        assert_eq!(
            parse("list docs"),
            Ok(Command::List {
                category: Some("docs")
            })
        );
        assert_eq!(parse("list a b"), Err(CommandError::Usage(LIST_USAGE)));
    }

    #[test]
    fn test_rename() {
        assert_eq!(
            parse("rename a b"),
            Ok(Command::Rename {
                old_name: "a",
                new_name: "b"
            })
        );
        assert_eq!(parse("rename a"), Err(CommandError::Usage(RENAME_USAGE)));
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        assert_eq!(parse("Upload report"), Ok(Command::Other));
        assert_eq!(parse("hello there"), Ok(Command::Other));
    }

    #[test]
    fn test_invalid_name_message() {
        let err = parse("upload a/b").unwrap_err();
        assert_eq!(err.to_string(), "Error: filename cannot contain path separators");
    }
}
