pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::debug;

use crate::common::error::GitGroupError;
use crate::common::result::{GitGroupResult, OptionExt};
use crate::domain::value_objects::command_spec::CommandSpec;
use crate::infrastructure::filesystem::ConfigStore;
use crate::presentation::ui::display::DisplayHelper;

use commands::{AddCommand, CommandContext, GotoCommand, GroupsCommand, RunCommand, StatusCommand};

/// gitgroup - Run one command across groups of git repositories
///
/// Besides the subcommands, `gitgroup @group1 @group2 <command>...` runs a
/// command in the listed groups, and `gitgroup <group> <command>...` does the
/// same for a single defined group. Run options for those forms go before the
/// first group: `gitgroup -j 4 --allow-failure @web git pull`.
#[derive(Parser, Debug)]
#[command(name = "gitgroup")]
#[command(about = "Run one command across groups of git repositories")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ", built ", env!("BUILD_DATE"), ")"))]
#[command(propagate_version = true)]
#[command(allow_external_subcommands = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to <config dir>/gitgroup/config.json)
    #[arg(short, long, global = true, env = "GITGROUP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run options given before the subcommand or the shorthand groups
    #[command(flatten)]
    pub options: RunOptions,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by the commands that fan out over repositories
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
#[command(next_help_heading = "Run options")]
pub struct RunOptions {
    /// Exit with status 0 even if some repositories fail
    #[arg(long)]
    pub allow_failure: bool,

    /// Maximum number of concurrent processes (0 = unbounded)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Overall timeout in seconds
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
}

impl RunOptions {
    /// Fill unset values from `outer`; values given closer to the command win
    pub fn or(self, outer: RunOptions) -> Self {
        Self {
            allow_failure: self.allow_failure || outer.allow_failure,
            jobs: self.jobs.or(outer.jobs),
            timeout: self.timeout.or(outer.timeout),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a command in every repository of the given groups
    Run {
        /// Groups to run in (repeatable)
        #[arg(short, long = "group", required = true)]
        groups: Vec<String>,

        /// Run the command through the platform shell
        #[arg(long)]
        shell: bool,

        #[command(flatten)]
        options: RunOptions,

        /// Command and its arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Show branch and working tree state of every repository in the given groups
    Status {
        /// Groups to check (repeatable)
        #[arg(short, long = "group", required = true)]
        groups: Vec<String>,

        #[command(flatten)]
        options: RunOptions,
    },

    /// Print the path of a repository, for `cd "$(gitgroup goto web)"`
    Goto {
        /// Repository name
        repository: String,
    },

    /// Register a repository, optionally adding it to a group
    Add {
        /// Repository name
        name: String,

        /// Path to the repository
        path: PathBuf,

        /// Group to add the repository to
        #[arg(short, long)]
        group: Option<String>,
    },

    /// List groups and their members
    Groups,

    #[command(external_subcommand)]
    External(Vec<String>),
}

/// What one invocation does, after the grammar has been resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Status {
        groups: Vec<String>,
        options: RunOptions,
    },
    Execute {
        groups: Vec<String>,
        command: CommandSpec,
        options: RunOptions,
    },
    Goto {
        repository: String,
    },
    AddRepository {
        name: String,
        path: PathBuf,
        group: Option<String>,
    },
    ListGroups,
}

/// Strip an optional leading `@` from a group name
fn group_name(token: &str) -> &str {
    token.strip_prefix('@').unwrap_or(token)
}

/// Resolve the shorthand forms that clap hands over as an external subcommand.
///
/// Leading `@name` tokens are groups and the rest is the command. Without any
/// `@` token the first token must be a defined group (`is_group`); otherwise it
/// is an unknown command. `status` as the only command word selects the status
/// operation.
pub fn parse_shorthand(
    tokens: &[String],
    options: RunOptions,
    is_group: impl Fn(&str) -> bool,
) -> GitGroupResult<Action> {
    let mut groups: Vec<String> = tokens
        .iter()
        .take_while(|t| t.starts_with('@'))
        .map(|t| group_name(t).to_string())
        .collect();

    if groups.iter().any(String::is_empty) {
        return Err(GitGroupError::validation_error(
            "groups",
            "'@' must be followed by a group name",
            None,
        ));
    }

    let rest = if groups.is_empty() {
        let first = tokens
            .first()
            .ok_or_validation_error("command", "no command given")?;
        if !is_group(first) {
            return Err(GitGroupError::validation_error(
                "command",
                format!("unknown command or group '{}'", first),
                Some(first.clone()),
            ));
        }
        groups.push(first.clone());
        &tokens[1..]
    } else {
        &tokens[groups.len()..]
    };

    match rest {
        [] => Err(GitGroupError::validation_error(
            "command",
            format!("no command given for groups: {}", groups.join(", ")),
            None,
        )),
        [only] if only == "status" => Ok(Action::Status { groups, options }),
        command => Ok(Action::Execute {
            groups,
            command: CommandSpec::from_args(command.iter().cloned())?,
            options,
        }),
    }
}

impl Commands {
    /// Map a parsed subcommand to its action.
    ///
    /// `outer` holds the run options given before the subcommand. `is_group` is
    /// consulted only for the shorthand forms.
    pub fn into_action(
        self,
        outer: RunOptions,
        is_group: impl Fn(&str) -> bool,
    ) -> GitGroupResult<Action> {
        match self {
            Commands::Run {
                groups,
                shell,
                options,
                command,
            } => {
                let command = if shell {
                    CommandSpec::shell(command.join(" "))?
                } else {
                    CommandSpec::from_args(command)?
                };
                Ok(Action::Execute {
                    groups: groups.iter().map(|g| group_name(g).to_string()).collect(),
                    command,
                    options: options.or(outer),
                })
            }
            Commands::Status { groups, options } => Ok(Action::Status {
                groups: groups.iter().map(|g| group_name(g).to_string()).collect(),
                options: options.or(outer),
            }),
            Commands::Goto { repository } => Ok(Action::Goto { repository }),
            Commands::Add { name, path, group } => Ok(Action::AddRepository { name, path, group }),
            Commands::Groups => Ok(Action::ListGroups),
            Commands::External(tokens) => parse_shorthand(&tokens, outer, is_group),
        }
    }

    fn needs_group_lookup(&self) -> bool {
        matches!(self, Commands::External(tokens) if !tokens.first().is_some_and(|t| t.starts_with('@')))
    }
}

/// CLI application runner
pub struct CliApp {
    cli: Cli,
}

impl CliApp {
    pub fn from_cli(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the invocation and return the process exit code
    pub async fn run(self) -> i32 {
        let use_color = !self.cli.no_color && std::io::stdout().is_terminal();
        colored::control::set_override(use_color);
        let display = DisplayHelper::new(use_color);

        match self.handle_command(display).await {
            Ok(code) => code,
            Err(e) => {
                display.error(&format!("{:#}", e));
                1
            }
        }
    }

    async fn handle_command(self, display: DisplayHelper) -> anyhow::Result<i32> {
        let config_path = match self.cli.config {
            Some(path) => path,
            None => ConfigStore::default_config_path()?,
        };
        let context = CommandContext::new(config_path, self.cli.json, display);

        let action = if self.cli.command.needs_group_lookup() {
            let registry = context.load_or_default()?.to_registry();
            self.cli
                .command
                .into_action(self.cli.options, |name| registry.has_group(name))?
        } else {
            self.cli.command.into_action(self.cli.options, |_| false)?
        };
        debug!(?action, "dispatching");

        match action {
            Action::Status { groups, options } => {
                StatusCommand::new(groups, options).execute(&context).await
            }
            Action::Execute {
                groups,
                command,
                options,
            } => RunCommand::new(groups, command, options).execute(&context).await,
            Action::Goto { repository } => GotoCommand::new(repository).execute(&context),
            Action::AddRepository { name, path, group } => {
                AddCommand::new(name, path, group).execute(&context)
            }
            Action::ListGroups => GroupsCommand.execute(&context),
        }
    }
}
