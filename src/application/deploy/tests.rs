//! Deploy Use Case Tests

use super::*;
use crate::application::testing::{context, CallLog, MockShell, MockTransfer, MockVcs, RecordingSink};
use crate::config::{Environment, EnvironmentEntry, RunContext};
use crate::domain::ports::{DeployEvent, NoopEventSink};
use crate::domain::value_objects::{DeployPhase, DeploymentRequest, ProvisionStep, Revision};
use crate::error::HoistError;
use std::path::Path;
use tempfile::tempdir;

const SITE: &str = "cd /srv/luke/site && export DJANGO_SETTINGS_MODULE=luke.settings.production && ";

fn use_case(log: &CallLog) -> DeployUseCase<MockShell, MockTransfer, MockVcs> {
    DeployUseCase::new(
        MockShell::new(log.clone()),
        MockTransfer::new(log.clone()),
        MockVcs::new(log.clone(), Revision::new("luke", "abc1234", "main")),
    )
}

#[test]
fn deploy_single_host_runs_full_pipeline() {
    let root = tempdir().unwrap();
    let log = CallLog::default();
    let ctx = context(&["host1"], root.path());

    let result = use_case(&log)
        .execute(&ctx, &DeploymentRequest::new("v1.2.0"), &NoopEventSink)
        .unwrap();

    assert_eq!(result.revision.commit, "abc1234");
    assert_eq!(result.revision.branch, "main");
    assert_eq!(result.snapshot_dir, root.path().join("blob-luke-abc1234"));
    assert!(!result.snapshot_dir.exists());
    assert_eq!(result.host_names(), vec!["host1"]);

    let entries: Vec<String> = log.entries().iter().map(|e| e.replace(SITE, "")).collect();
    insta::assert_snapshot!(entries.join("\n"), @r###"
    resolve v1.2.0
    export abc1234 src
    push host1: maintenance -> /srv/luke/maintenance (delete=true, chmod=750, excludes=)
    run host1: cd /srv/luke/maintenance && chgrp -R www-data .
    release host1
    push host1: blob-luke-abc1234 -> /srv/luke/site (delete=true, chmod=750, excludes=*.pyc env/ cover/ *.style bower_components)
    run host1: pip install -r /srv/luke/site/requirements/production.txt
    run host1: python manage.py migrate --noinput
    run host1: python manage.py collectstatic --noinput
    run host1: chgrp -R www-data .
    run host1: chgrp -R www-data ../media
    run host1: touch ../reload
    run host1: sudo /usr/bin/supervisorctl restart luke-celeryd
    run host1: opbeat -o $OPBEAT_ORGANIZATION_ID -a $OPBEAT_APP_ID -t $OPBEAT_SECRET_TOKEN deployment --component path:. vcs:git rev:abc1234 branch:main
    release host1
    run host1: cd /srv/luke/maintenance && rm -rf ./*
    release host1
    "###);
}

#[test]
fn upgrade_flag_reaches_pip() {
    let root = tempdir().unwrap();
    let log = CallLog::default();
    let ctx = context(&["host1"], root.path());

    use_case(&log)
        .execute(
            &ctx,
            &DeploymentRequest::new("v1.2.0").with_upgrade(true),
            &NoopEventSink,
        )
        .unwrap();

    assert!(log.position("pip install -Ur").is_some());
}

#[test]
fn migration_failure_leaves_maintenance_on_and_snapshot_in_place() {
    let root = tempdir().unwrap();
    let log = CallLog::default();
    let ctx = context(&["host1"], root.path());
    let use_case = DeployUseCase::new(
        MockShell::new(log.clone()).failing_on("manage.py migrate", 1),
        MockTransfer::new(log.clone()),
        MockVcs::new(log.clone(), Revision::new("luke", "abc1234", "main")),
    );
    let sink = RecordingSink::default();

    let err = use_case
        .execute(&ctx, &DeploymentRequest::new("v1.2.0"), &sink)
        .unwrap_err();

    assert!(matches!(err, HoistError::CommandFailed { code: Some(1), .. }));
    assert!(err.to_string().starts_with("[host1]"));
    assert!(log.position("collectstatic").is_none());
    assert!(log.position("rm -rf").is_none());
    assert!(root.path().join("blob-luke-abc1234").exists());

    let migrate = log.position("manage.py migrate").unwrap();
    assert_eq!(log.entries()[migrate + 1], "release host1");

    let events = sink.events();
    assert!(!events.iter().any(|e| matches!(e, DeployEvent::Completed { .. })));
    assert!(!events.contains(&DeployEvent::PhaseCompleted {
        phase: DeployPhase::Provision,
        host: Some("host1".to_string()),
    }));
}

#[test]
fn provisioning_order_is_fixed() {
    let root = tempdir().unwrap();
    let log = CallLog::default();
    let mut ctx = context(&["host1"], root.path());
    ctx.project.tools.bower = true;

    let result = use_case(&log)
        .execute(&ctx, &DeploymentRequest::new("main"), &NoopEventSink)
        .unwrap();

    assert_eq!(result.hosts[0].steps, ProvisionStep::ALL.to_vec());

    let order = [
        "pip install",
        "manage.py migrate",
        "bower install",
        "collectstatic",
        "chgrp -R www-data ../media",
        "touch ../reload",
        "supervisorctl restart",
        "opbeat",
    ];
    let positions: Vec<usize> = order.iter().map(|n| log.position(n).unwrap()).collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{:?}", positions);
}

#[test]
fn hosts_are_processed_one_after_another() {
    let root = tempdir().unwrap();
    let log = CallLog::default();
    let ctx = context(&["web1", "web2"], root.path());

    use_case(&log)
        .execute(&ctx, &DeploymentRequest::new("v1.2.0"), &NoopEventSink)
        .unwrap();

    let entries = log.entries();
    let last_web1 = entries.iter().rposition(|e| e.contains("web1")).unwrap();
    let first_web2 = entries.iter().position(|e| e.contains("web2")).unwrap();
    assert!(last_web1 < first_web2);
    assert_eq!(entries.iter().filter(|e| e.starts_with("export")).count(), 1);
}

#[test]
fn failure_on_first_host_never_touches_second() {
    let root = tempdir().unwrap();
    let log = CallLog::default();
    let ctx = context(&["web1", "web2"], root.path());
    let use_case = DeployUseCase::new(
        MockShell::new(log.clone()),
        MockTransfer::new(log.clone()).failing(),
        MockVcs::new(log.clone(), Revision::new("luke", "abc1234", "main")),
    );

    let err = use_case
        .execute(&ctx, &DeploymentRequest::new("v1.2.0"), &NoopEventSink)
        .unwrap_err();

    assert_eq!(err.exit_code(), 23);
    assert!(log.position("web2").is_none());
}

#[test]
fn missing_key_fails_before_snapshot() {
    let root = tempdir().unwrap();
    let log = CallLog::default();
    let env = Environment::from_entry(
        "staging",
        EnvironmentEntry {
            hosts: vec!["web1".to_string()],
            user: Some("luke".to_string()),
            site_dir: Some("/srv/luke/site".to_string()),
            ..Default::default()
        },
    )
    .unwrap();
    let ctx = RunContext::new(env, context(&[], root.path()).project, "luke");

    let err = use_case(&log)
        .execute(&ctx, &DeploymentRequest::new("v1.2.0"), &NoopEventSink)
        .unwrap_err();

    assert!(matches!(err, HoistError::MissingEnvironmentKey { .. }));
    assert!(log.entries().is_empty());
}

#[test]
fn unresolvable_reference_stops_before_remote_work() {
    let root = tempdir().unwrap();
    let log = CallLog::default();
    let ctx = context(&["web1"], root.path());

    let err = use_case(&log)
        .execute(&ctx, &DeploymentRequest::new("missing"), &NoopEventSink)
        .unwrap_err();

    assert!(matches!(err, HoistError::UnresolvedReference { .. }));
    assert_eq!(log.entries(), vec!["resolve missing"]);
}

#[test]
fn events_bracket_every_phase() {
    let root = tempdir().unwrap();
    let log = CallLog::default();
    let ctx = context(&["web1"], root.path());
    let sink = RecordingSink::default();

    use_case(&log)
        .execute(&ctx, &DeploymentRequest::new("v1.2.0"), &sink)
        .unwrap();

    let phases: Vec<(DeployPhase, bool)> = sink
        .events()
        .into_iter()
        .filter_map(|e| match e {
            DeployEvent::PhaseStarted { phase, .. } => Some((phase, false)),
            DeployEvent::PhaseCompleted { phase, .. } => Some((phase, true)),
            _ => None,
        })
        .collect();

    let expected: Vec<(DeployPhase, bool)> = [
        DeployPhase::Snapshot,
        DeployPhase::MaintenanceOn,
        DeployPhase::Upload,
        DeployPhase::Provision,
        DeployPhase::MaintenanceOff,
        DeployPhase::Cleanup,
    ]
    .into_iter()
    .flat_map(|p| [(p, false), (p, true)])
    .collect();
    assert_eq!(phases, expected);

    let events = sink.events();
    assert!(matches!(events.first(), Some(DeployEvent::Started { .. })));
    assert!(matches!(events.last(), Some(DeployEvent::Completed { .. })));
    assert!(events.contains(&DeployEvent::StepSkipped {
        host: "web1".to_string(),
        step: ProvisionStep::BowerInstall,
        reason: "bower is disabled for this project".to_string(),
    }));
}

#[test]
fn redeploying_same_reference_recreates_snapshot() {
    let root = tempdir().unwrap();
    let log = CallLog::default();
    let ctx = context(&["web1"], root.path());
    let use_case = use_case(&log);

    use_case
        .execute(&ctx, &DeploymentRequest::new("v1.2.0"), &NoopEventSink)
        .unwrap();
    let first = log.entries();
    use_case
        .execute(&ctx, &DeploymentRequest::new("v1.2.0"), &NoopEventSink)
        .unwrap();
    let all = log.entries();

    assert_eq!(all.len(), first.len() * 2);
    assert_eq!(all[first.len()..], first[..]);
    assert!(!Path::new(&root.path().join("blob-luke-abc1234")).exists());
}
