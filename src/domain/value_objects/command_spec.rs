use serde::{Deserialize, Serialize};
use std::fmt;

use crate::common::error::GitGroupError;
use crate::common::result::GitGroupResult;

/// Command to run in each repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CommandSpec {
    /// Program plus argument vector, executed directly
    Args { program: String, args: Vec<String> },
    /// A line interpreted by the platform shell
    Shell { line: String },
}

impl CommandSpec {
    /// Build from an argument vector; the first element is the program.
    pub fn from_args<I, S>(argv: I) -> GitGroupResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut iter = argv.into_iter().map(Into::into);
        let program = iter
            .next()
            .filter(|p: &String| !p.trim().is_empty())
            .ok_or_else(|| GitGroupError::validation_error("command", "command is empty", None))?;
        Ok(Self::Args {
            program,
            args: iter.collect(),
        })
    }

    pub fn shell(line: impl Into<String>) -> GitGroupResult<Self> {
        let line = line.into();
        if line.trim().is_empty() {
            return Err(GitGroupError::validation_error(
                "command",
                "shell line is empty",
                None,
            ));
        }
        Ok(Self::Shell { line })
    }

    /// `git <args...>`
    pub fn git(args: &[&str]) -> Self {
        Self::Args {
            program: "git".to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Program and arguments as handed to the OS.
    pub fn to_program_and_args(&self) -> (String, Vec<String>) {
        match self {
            Self::Args { program, args } => (program.clone(), args.clone()),
            Self::Shell { line } => {
                if cfg!(target_os = "windows") {
                    ("cmd".to_string(), vec!["/C".to_string(), line.clone()])
                } else {
                    ("sh".to_string(), vec!["-c".to_string(), line.clone()])
                }
            }
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Args { program, args } => {
                write!(f, "{}", program)?;
                for arg in args {
                    if arg.is_empty() || arg.contains(char::is_whitespace) {
                        write!(f, " '{}'", arg)?;
                    } else {
                        write!(f, " {}", arg)?;
                    }
                }
                Ok(())
            }
            Self::Shell { line } => write!(f, "{}", line),
        }
    }
}

/// What the coordinator does in each repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Porcelain status check plus branch query
    Status,
    /// Run an arbitrary command
    Execute(CommandSpec),
}

impl Operation {
    /// Literal command text recorded in each result
    pub fn command_text(&self) -> String {
        match self {
            Self::Status => crate::application::use_cases::status_check::STATUS_COMMAND.join(" "),
            Self::Execute(spec) => spec.to_string(),
        }
    }
}
