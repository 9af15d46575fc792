//! Hoist CLI - remote deployment orchestrator
//!
//! Usage: hoist [--env <name>] <COMMAND>
//!
//! Commands:
//!   deploy       Snapshot a git reference and ship it to every host
//!   maintenance  Turn the maintenance page on or off
//!   migrate      Apply database migrations
//!   run          Run tasks given as `name:arg,key=value`

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use is_terminal::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use hoist::application::tasks::Task;
use hoist::presentation::factory::{create_runtime, select_environment, RuntimeOptions};
use hoist::presentation::output::{print_config_warnings, print_error, print_outcome};
use hoist::presentation::{Cli, Palette};
use hoist::HoistError;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let json = cli.json;
    let palette = if json {
        Palette::plain()
    } else {
        Palette::detect(cli.color)
    };

    match run(cli, palette) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            print_error(&err, json, &palette);
            let code = err
                .downcast_ref::<HoistError>()
                .map(HoistError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "hoist=info,warn",
        2 => "hoist=debug,info",
        _ => "hoist=trace,debug",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli, palette: Palette) -> Result<()> {
    let invocation = cli.command.into_invocation()?;
    let environment = select_environment(invocation.environment, cli.env)?;
    tracing::info!(environment = %environment, tasks = invocation.tasks.len(), "invocation");

    let options = RuntimeOptions {
        cwd: std::env::current_dir()?,
        environment,
        environments_file: cli.environments,
        config_file: cli.config,
        json: cli.json,
        dry_run: cli.dry_run,
        palette,
    };
    let runtime = create_runtime(&options)?;
    print_config_warnings(&runtime.warnings, &palette);

    let runner = runtime.runner();
    runner.check(&invocation.tasks)?;

    if !cli.yes && !cli.dry_run {
        confirm_destructive(
            &invocation.tasks,
            &runtime.ctx.project_name,
            runtime.ctx.environment.name(),
        )?;
    }

    for task in &invocation.tasks {
        let outcome = runner.run(task)?;
        if !cli.json {
            print_outcome(&outcome, &palette);
        }
    }

    Ok(())
}

/// Ask before dropping a database; non-interactive runs need `--yes`
fn confirm_destructive(tasks: &[Task], project: &str, environment: &str) -> Result<()> {
    let Some(task) = tasks.iter().find(|t| t.is_destructive()) else {
        return Ok(());
    };

    if !std::io::stdin().is_terminal() {
        tracing::warn!(task = task.name(), "refusing destructive task without --yes");
        return Err(HoistError::Aborted.into());
    }

    use dialoguer::Confirm;
    let confirmed = Confirm::new()
        .with_prompt(format!(
            "{} drops database '{}' on '{}'. Continue?",
            task.name(),
            project,
            environment
        ))
        .default(false)
        .interact()?;

    if !confirmed {
        return Err(HoistError::Aborted.into());
    }
    Ok(())
}
