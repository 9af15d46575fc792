//! CLI Argument Parsing
//!
//! This module defines the CLI interface using clap.
//!
//! ## Design Notes
//!
//! - Global flags (--env, --json, --color, --verbose, --dry-run, --yes) are
//!   inherited by all subcommands
//! - Every subcommand maps onto exactly one [`Task`]; `run` accepts the
//!   task-style syntax (`deploy:v1.2.0,upgrade=yes`) for several at once

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::application::tasks::{parse_invocation, Invocation, Task};
use crate::domain::value_objects::{DeploymentRequest, MaintenanceState, ManageArgs};
use crate::error::HoistResult;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorWhen {
    Auto,
    Always,
    Never,
}

/// hoist - ship a git revision to every host of an environment
#[derive(Parser, Debug)]
#[command(name = "hoist")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Task-style invocation: hoist run environment:production deploy:v1.2.0,upgrade=yes")]
pub struct Cli {
    /// Environment to run against (a key of the environments file)
    #[arg(short, long, global = true, env = "HOIST_ENV")]
    pub env: Option<String>,

    /// Environments file (JSON)
    #[arg(long, global = true, env = "HOIST_ENVIRONMENTS", value_name = "PATH")]
    pub environments: Option<PathBuf>,

    /// Project configuration file (TOML, optional)
    #[arg(long, global = true, default_value = "hoist.toml", value_name = "PATH")]
    pub config: PathBuf,

    /// Output format for CI
    #[arg(long, global = true)]
    pub json: bool,

    /// Color output mode
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorWhen>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Print remote commands and transfers instead of running them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Skip confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy a git reference to every host
    Deploy {
        /// Branch, tag or commit
        git_ref: String,

        /// Upgrade already installed requirements
        #[arg(long)]
        upgrade: bool,
    },

    /// Turn the maintenance page on or off
    Maintenance {
        /// on/off (also true/false, yes/no, 1/0)
        state: MaintenanceState,
    },

    /// Register a deployment with the tracking service
    #[command(alias = "register_deployment")]
    RegisterDeployment { commit: String, branch: String },

    /// Install Python requirements for the environment
    #[command(alias = "install_requirements")]
    InstallRequirements {
        #[arg(long)]
        upgrade: bool,
    },

    /// Apply database migrations
    Migrate {
        /// Positional arguments (app label, migration name)
        args: Vec<String>,

        /// Management command option, repeatable
        #[arg(short = 'o', long = "option", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        options: Vec<(String, String)>,
    },

    /// Create migrations for model changes
    Makemigrations {
        args: Vec<String>,

        #[arg(short = 'o', long = "option", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        options: Vec<(String, String)>,
    },

    /// Collect static files
    Collectstatic,

    /// Load fixtures into the database
    Loaddata {
        #[arg(required = true)]
        fixtures: Vec<String>,
    },

    /// Create the project database
    Createdb,

    /// Drop the project database
    Dropdb,

    /// Drop, create and migrate the project database
    Resetdb,

    /// Create the database, migrate and collect static files
    Bootstrap,

    /// Create a superuser (interactive)
    Createsuperuser,

    /// Start a new app
    Startapp { name: String },

    /// Run the test suite under coverage
    Runtests { app: Option<String> },

    /// Start the development server
    Runserver,

    /// Compile stylus stylesheets
    Styluscompile {
        #[arg(short, long)]
        watch: bool,
    },

    /// Install one bower package and save it
    #[command(alias = "bower_install_package")]
    BowerInstallPackage { package: String },

    /// Run tasks given as `name:arg,key=value`
    Run {
        #[arg(required = true, value_name = "TASK")]
        tasks: Vec<String>,
    },
}

fn parse_key_value(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((key, val)) if !key.is_empty() => Ok((key.to_string(), val.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", value)),
    }
}

impl Commands {
    /// Validated tasks for this command line
    pub fn into_invocation(self) -> HoistResult<Invocation> {
        let task = match self {
            Commands::Run { tasks } => return parse_invocation(&tasks),
            Commands::Deploy { git_ref, upgrade } => {
                Task::Deploy(DeploymentRequest::new(git_ref).with_upgrade(upgrade))
            }
            Commands::Maintenance { state } => Task::Maintenance(state),
            Commands::RegisterDeployment { commit, branch } => {
                Task::RegisterDeployment { commit, branch }
            }
            Commands::InstallRequirements { upgrade } => Task::InstallRequirements { upgrade },
            Commands::Migrate { args, options } => Task::Migrate(ManageArgs {
                positionals: args,
                options,
            }),
            Commands::Makemigrations { args, options } => Task::MakeMigrations(ManageArgs {
                positionals: args,
                options,
            }),
            Commands::Collectstatic => Task::CollectStatic,
            Commands::Loaddata { fixtures } => Task::LoadData { fixtures },
            Commands::Createdb => Task::CreateDb,
            Commands::Dropdb => Task::DropDb,
            Commands::Resetdb => Task::ResetDb,
            Commands::Bootstrap => Task::Bootstrap,
            Commands::Createsuperuser => Task::CreateSuperuser,
            Commands::Startapp { name } => Task::StartApp { name },
            Commands::Runtests { app } => Task::RunTests { app },
            Commands::Runserver => Task::RunServer,
            Commands::Styluscompile { watch } => Task::StylusCompile { watch },
            Commands::BowerInstallPackage { package } => Task::BowerInstallPackage { package },
        };

        Ok(Invocation {
            environment: None,
            tasks: vec![task],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn deploy_with_upgrade() {
        let cli = parse(&["hoist", "--env", "production", "deploy", "v1.2.0", "--upgrade"]);
        assert_eq!(cli.env.as_deref(), Some("production"));

        let invocation = cli.command.into_invocation().unwrap();
        assert_eq!(
            invocation.tasks,
            vec![Task::Deploy(
                DeploymentRequest::new("v1.2.0").with_upgrade(true)
            )]
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&["hoist", "collectstatic", "--dry-run", "--json", "-e", "staging"]);
        assert!(cli.dry_run);
        assert!(cli.json);
        assert_eq!(cli.env.as_deref(), Some("staging"));
    }

    #[test]
    fn maintenance_state_is_validated_by_clap() {
        let cli = parse(&["hoist", "maintenance", "off"]);
        assert!(matches!(
            cli.command,
            Commands::Maintenance {
                state: MaintenanceState::Off
            }
        ));
        assert!(Cli::try_parse_from(["hoist", "maintenance", "maybe"]).is_err());
    }

    #[test]
    fn migrate_options() {
        let cli = parse(&["hoist", "migrate", "blog", "-o", "fake=true", "--option", "database=replica"]);
        let invocation = cli.command.into_invocation().unwrap();
        assert_eq!(
            invocation.tasks,
            vec![Task::Migrate(
                ManageArgs::new()
                    .positional("blog")
                    .option("fake", "true")
                    .option("database", "replica")
            )]
        );
        assert!(Cli::try_parse_from(["hoist", "migrate", "-o", "novalue"]).is_err());
    }

    #[test]
    fn underscore_aliases() {
        let cli = parse(&["hoist", "install_requirements", "--upgrade"]);
        assert!(matches!(
            cli.command,
            Commands::InstallRequirements { upgrade: true }
        ));
    }

    #[test]
    fn run_parses_task_style_tokens() {
        let cli = parse(&["hoist", "run", "environment:vagrant", "migrate:noinput=True", "collectstatic"]);
        let invocation = cli.command.into_invocation().unwrap();

        assert_eq!(invocation.environment.as_deref(), Some("vagrant"));
        assert_eq!(invocation.tasks.len(), 2);
        assert_eq!(invocation.tasks[1], Task::CollectStatic);
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["hoist"]).is_err());
    }
}
