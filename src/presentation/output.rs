//! Output Rendering
//!
//! Final summaries, configuration warnings and errors. Progress lines are
//! emitted by the event sinks; this module covers what is printed once.

use std::io::Write;

use crate::application::tasks::TaskOutcome;
use crate::config::ConfigWarning;
use crate::error::HoistError;

use super::theme::{Icon, Palette};

pub const SUCCESS_ART: &str = r"
  _     _     _
 | |__ (_)___| |_
 | '_ \| / __| __|
 | | | | \__ \ |_
 |_| |_|_|___/\__|  done
";

/// Text summary printed after a task finishes
pub fn render_outcome(outcome: &TaskOutcome, palette: &Palette) -> String {
    match outcome {
        TaskOutcome::Deployed(result) => {
            let message = format!(
                "Code from {} was successfully deployed to host {}",
                result.git_ref,
                result.host_names().join(", ")
            );
            format!(
                "{}\n{}\n",
                palette.success(SUCCESS_ART.trim_start_matches('\n').trim_end()),
                palette.bold(&message)
            )
        }
        TaskOutcome::Completed { task, hosts } => {
            let target = if hosts.is_empty() {
                "no hosts".to_string()
            } else {
                hosts.join(", ")
            };
            format!(
                "{} {} finished on {}\n",
                palette.success(palette.icon(Icon::Success)),
                task,
                target
            )
        }
    }
}

pub fn print_outcome(outcome: &TaskOutcome, palette: &Palette) {
    print!("{}", render_outcome(outcome, palette));
    let _ = std::io::stdout().flush();
}

pub fn format_config_warnings(warnings: &[ConfigWarning], palette: &Palette) -> String {
    let mut out = String::new();
    for w in warnings {
        let location = match w.line {
            Some(line) => format!("{}:{}", w.file.display(), line),
            None => w.file.display().to_string(),
        };
        out.push_str(&format!(
            "{} Unknown config key '{}' in {}\n",
            palette.warning(palette.icon(Icon::Warning)),
            w.key,
            location
        ));
        if let Some(suggestion) = &w.suggestion {
            out.push_str(&format!("   Did you mean '{}'?\n", suggestion));
        }
    }
    out
}

pub fn print_config_warnings(warnings: &[ConfigWarning], palette: &Palette) {
    for w in warnings {
        tracing::debug!(key = %w.key, file = %w.file.display(), "unknown config key");
    }
    eprint!("{}", format_config_warnings(warnings, palette));
}

/// Error event body for `--json`
pub fn error_to_json(err: &anyhow::Error) -> serde_json::Value {
    let mut body = serde_json::json!({
        "event": "error",
        "message": err.to_string(),
    });

    if let Some(map) = body.as_object_mut() {
        let exit_code = err
            .downcast_ref::<HoistError>()
            .map(HoistError::exit_code)
            .unwrap_or(1);
        map.insert("exit_code".to_string(), exit_code.into());

        match err.downcast_ref::<HoistError>() {
            Some(HoistError::CommandFailed {
                host,
                command,
                stderr,
                ..
            }) => {
                map.insert("host".to_string(), host.as_str().into());
                map.insert("command".to_string(), command.as_str().into());
                map.insert("stderr".to_string(), stderr.as_str().into());
            }
            Some(HoistError::TransferFailed { host, stderr, .. }) => {
                map.insert("host".to_string(), host.as_str().into());
                map.insert("stderr".to_string(), stderr.as_str().into());
            }
            _ => {}
        }
    }

    body
}

pub fn format_error(err: &anyhow::Error, palette: &Palette) -> String {
    let mut out = format!(
        "{} {}\n",
        palette.error(palette.icon(Icon::Error)),
        palette.error(&err.to_string())
    );
    if let Some(hint) = err.downcast_ref::<HoistError>().and_then(hint) {
        out.push_str(&format!("  {}\n", palette.dim(hint)));
    }
    out
}

fn hint(err: &HoistError) -> Option<&'static str> {
    match err {
        HoistError::MissingEnvironmentKey { .. } => {
            Some("Add the key to the environment entry in environments.json.")
        }
        HoistError::CommandFailed { .. } | HoistError::TransferFailed { .. } => Some(
            "The run stopped here. Maintenance mode and the local snapshot are left as they were.",
        ),
        HoistError::InvalidTask { .. } => Some("Task syntax: name:arg,key=value"),
        _ => None,
    }
}

pub fn print_error(err: &anyhow::Error, json: bool, palette: &Palette) {
    if json {
        println!("{}", error_to_json(err));
        let _ = std::io::stdout().flush();
        return;
    }
    eprint!("{}", format_error(err, palette));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::deploy::{DeployResult, HostReport};
    use crate::domain::value_objects::Revision;
    use std::path::PathBuf;

    #[test]
    fn deploy_summary_names_every_host() {
        let outcome = TaskOutcome::Deployed(DeployResult {
            git_ref: "v1.2.0".to_string(),
            revision: Revision::new("luke", "abc1234", "main"),
            snapshot_dir: PathBuf::from("/tmp/blob-luke-abc1234"),
            file_count: 3,
            hosts: vec![
                HostReport {
                    host: "web1".to_string(),
                    steps: Vec::new(),
                },
                HostReport {
                    host: "web2".to_string(),
                    steps: Vec::new(),
                },
            ],
        });

        let text = render_outcome(&outcome, &Palette::plain());
        assert!(text.ends_with("Code from v1.2.0 was successfully deployed to host web1, web2\n"));
    }

    #[test]
    fn task_summary() {
        let outcome = TaskOutcome::Completed {
            task: "collectstatic",
            hosts: vec!["web1".to_string()],
        };
        insta::assert_snapshot!(render_outcome(&outcome, &Palette::plain()), @"[OK] collectstatic finished on web1");
    }

    #[test]
    fn warnings_carry_line_and_suggestion() {
        let warnings = vec![ConfigWarning {
            key: "bowr".to_string(),
            file: PathBuf::from("hoist.toml"),
            line: Some(3),
            suggestion: Some("bower".to_string()),
        }];

        insta::assert_snapshot!(format_config_warnings(&warnings, &Palette::plain()), @r###"
        [WARN] Unknown config key 'bowr' in hoist.toml:3
           Did you mean 'bower'?
        "###);
    }

    #[test]
    fn json_error_carries_command_details() {
        let err = anyhow::Error::new(HoistError::CommandFailed {
            host: "web1".to_string(),
            command: "python manage.py migrate".to_string(),
            code: Some(3),
            stderr: "boom".to_string(),
        });

        let body = error_to_json(&err);
        assert_eq!(body["event"], "error");
        assert_eq!(body["exit_code"], 3);
        assert_eq!(body["host"], "web1");
        assert_eq!(body["stderr"], "boom");
    }

    #[test]
    fn text_error_has_hint() {
        let err = anyhow::Error::new(HoistError::MissingEnvironmentKey {
            environment: "staging".to_string(),
            key: "site_dir".to_string(),
        });
        let text = format_error(&err, &Palette::plain());
        assert!(text.starts_with("[FAIL] environment 'staging' is missing required key 'site_dir'"));
        assert!(text.contains("environments.json"));
    }
}
