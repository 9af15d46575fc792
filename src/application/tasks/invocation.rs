//! Task-style invocations
//!
//! `name[:arg,arg,key=value,...]`, one task per token. A backslash escapes `,`
//! and `=` inside a value. Names accept `-` for `_`. The pseudo-task
//! `environment:<name>` selects the environment and must come before any task.

use std::collections::VecDeque;
use std::str::FromStr;

use crate::domain::value_objects::{parse_flag, DeploymentRequest, MaintenanceState, ManageArgs};
use crate::error::{HoistError, HoistResult};

use super::Task;

/// Every name `parse_task` understands
pub const TASK_NAMES: &[&str] = &[
    "environment",
    "deploy",
    "maintenance",
    "register_deployment",
    "install_requirements",
    "migrate",
    "makemigrations",
    "collectstatic",
    "loaddata",
    "createdb",
    "dropdb",
    "resetdb",
    "bootstrap",
    "createsuperuser",
    "startapp",
    "runtests",
    "runserver",
    "styluscompile",
    "bower_install_package",
];

/// A validated command line of tasks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub environment: Option<String>,
    pub tasks: Vec<Task>,
}

/// Parse every token; nothing is returned unless all of them are valid
pub fn parse_invocation<S: AsRef<str>>(tokens: &[S]) -> HoistResult<Invocation> {
    let mut invocation = Invocation::default();

    for token in tokens {
        let raw = RawTask::parse(token.as_ref())?;
        if raw.name == "environment" {
            if !invocation.tasks.is_empty() {
                return Err(raw.error("must come before every other task"));
            }
            let mut args = ArgReader::new(raw);
            let name = args.required("env_name")?;
            args.finish()?;
            invocation.environment = Some(name);
        } else {
            invocation.tasks.push(build_task(raw)?);
        }
    }

    if invocation.tasks.is_empty() {
        return Err(HoistError::InvalidTask {
            task: tokens
                .iter()
                .map(|t| t.as_ref())
                .collect::<Vec<_>>()
                .join(" "),
            message: "no task given".to_string(),
        });
    }

    Ok(invocation)
}

/// Parse a single `name:args` token into a task
pub fn parse_task(token: &str) -> HoistResult<Task> {
    let raw = RawTask::parse(token)?;
    if raw.name == "environment" {
        return Err(raw.error("selects an environment, it is not a task"));
    }
    build_task(raw)
}

fn build_task(raw: RawTask) -> HoistResult<Task> {
    let mut args = ArgReader::new(raw);

    let task = match args.task.name.as_str() {
        "deploy" => {
            let git_ref = args.required("git_ref")?;
            let upgrade = args.flag("upgrade")?;
            Task::Deploy(DeploymentRequest::new(git_ref).with_upgrade(upgrade))
        }
        "maintenance" => {
            let state = args.required("state")?;
            Task::Maintenance(MaintenanceState::from_str(&state)?)
        }
        "register_deployment" => Task::RegisterDeployment {
            commit: args.required("commit")?,
            branch: args.required("branch")?,
        },
        "install_requirements" => Task::InstallRequirements {
            upgrade: args.flag("upgrade")?,
        },
        "migrate" => Task::Migrate(args.manage_args()),
        "makemigrations" => Task::MakeMigrations(args.manage_args()),
        "collectstatic" => Task::CollectStatic,
        "loaddata" => {
            let fixtures = args.rest();
            if fixtures.is_empty() {
                return Err(args.task.error("expects at least one fixture"));
            }
            Task::LoadData { fixtures }
        }
        "createdb" => Task::CreateDb,
        "dropdb" => Task::DropDb,
        "resetdb" => Task::ResetDb,
        "bootstrap" => Task::Bootstrap,
        "createsuperuser" => Task::CreateSuperuser,
        "startapp" => Task::StartApp {
            name: args.required("app_name")?,
        },
        "runtests" => Task::RunTests {
            app: args.optional("app"),
        },
        "runserver" => Task::RunServer,
        "styluscompile" => Task::StylusCompile {
            watch: args.flag("watch")?,
        },
        "bower_install_package" => Task::BowerInstallPackage {
            package: args.required("package")?,
        },
        other => {
            let hint = crate::config::closest(other, TASK_NAMES)
                .map(|s| format!(" - did you mean '{}'?", s))
                .unwrap_or_default();
            return Err(args.task.error(&format!("unknown task{}", hint)));
        }
    };

    args.finish()?;
    Ok(task)
}

/// One token split into name, positionals and keyword arguments
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawTask {
    token: String,
    name: String,
    args: Vec<String>,
    kwargs: Vec<(String, String)>,
}

impl RawTask {
    fn parse(token: &str) -> HoistResult<Self> {
        let (name, rest) = match token.split_once(':') {
            Some((name, rest)) => (name, Some(rest)),
            None => (token, None),
        };
        let name = name.trim().replace('-', "_");

        let mut raw = RawTask {
            token: token.to_string(),
            name,
            args: Vec::new(),
            kwargs: Vec::new(),
        };
        if raw.name.is_empty() {
            return Err(raw.error("missing task name"));
        }

        if let Some(rest) = rest {
            for part in split_unescaped(rest, ',') {
                let mut pieces = split_unescaped(&part, '=').into_iter();
                let first = unescape(&pieces.next().unwrap_or_default());
                match pieces.next() {
                    Some(value) => {
                        if pieces.next().is_some() {
                            return Err(raw.error(&format!("'{}' has more than one '='", part)));
                        }
                        if first.is_empty() {
                            return Err(raw.error("keyword argument without a name"));
                        }
                        raw.kwargs.push((first, unescape(&value)));
                    }
                    None => raw.args.push(first),
                }
            }
        }

        Ok(raw)
    }

    fn error(&self, message: &str) -> HoistError {
        HoistError::InvalidTask {
            task: self.token.clone(),
            message: message.to_string(),
        }
    }
}

/// Split on `sep` unless preceded by a backslash; escapes are kept
fn split_unescaped(input: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            current.push(c);
            if let Some(next) = chars.next() {
                current.push(next);
            }
        } else if c == sep {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    parts
}

fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(next @ (',' | '=' | '\\')) => out.push(next),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            },
            other => out.push(other),
        }
    }
    out
}

/// Hands out arguments by name (keyword first, then next positional)
struct ArgReader {
    task: RawTask,
    args: VecDeque<String>,
}

impl ArgReader {
    fn new(mut task: RawTask) -> Self {
        let args = std::mem::take(&mut task.args).into();
        Self { task, args }
    }

    fn optional(&mut self, name: &str) -> Option<String> {
        if let Some(index) = self.task.kwargs.iter().position(|(k, _)| k == name) {
            return Some(self.task.kwargs.remove(index).1);
        }
        self.args.pop_front()
    }

    fn required(&mut self, name: &str) -> HoistResult<String> {
        match self.optional(name) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(self.task.error(&format!("missing argument '{}'", name))),
        }
    }

    fn flag(&mut self, name: &str) -> HoistResult<bool> {
        match self.optional(name) {
            None => Ok(false),
            Some(value) => parse_flag(&value).ok_or_else(|| {
                self.task
                    .error(&format!("'{}' is not a boolean for '{}'", value, name))
            }),
        }
    }

    /// All remaining positionals
    fn rest(&mut self) -> Vec<String> {
        self.args.drain(..).collect()
    }

    /// Everything left, as management command arguments
    fn manage_args(&mut self) -> ManageArgs {
        ManageArgs {
            positionals: self.rest(),
            options: std::mem::take(&mut self.task.kwargs),
        }
    }

    fn finish(self) -> HoistResult<()> {
        if let Some(extra) = self.args.front() {
            return Err(self.task.error(&format!("unexpected argument '{}'", extra)));
        }
        if let Some((key, _)) = self.task.kwargs.first() {
            return Err(self.task.error(&format!("unexpected keyword '{}'", key)));
        }
        Ok(())
    }
}
