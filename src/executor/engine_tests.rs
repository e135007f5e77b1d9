//! Tests for the execution engine
//!
//! Extraction and execution are exercised together against a recording
//! runner, so no shell or container runtime is needed.

use super::testing::{RecordingRunner, capture_logs};
use super::*;
use crate::infrastructure::{
    ContainerInvocationBuilder, Environment, HostIdentity, RunConfig, VolumeResolver,
};
use crate::pipeline::{PipelineError, PipelineExtractor, Step};
use pretty_assertions::assert_eq;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const PIPELINE: &str = r"
pipeline {
    agent any
    stages {
        stage('build') {
            steps {
                script {
                    dockerImage.inside() {
                        sh('make')
                        sh('make test')
                    }
                }
            }
        }
    }
}
";

const MIXED: &str = r"
stage('lint') {
    steps {
        script {
            sh('lint.sh')
        }
    }
}
stage('build') {
    steps {
        script {
            docker.image('gcc').inside() {
                sh 'make'
            }
        }
    }
}
stage('test') {
    steps {
        script {
            sh('run-tests.sh')
        }
    }
}
";

fn steps(text: &str) -> Vec<Step> {
    PipelineExtractor::new().extract(text).unwrap()
}

fn identity() -> HostIdentity {
    HostIdentity::Posix {
        uid: "1000".to_string(),
        gid: "1000".to_string(),
        home: PathBuf::from("/home/dev"),
    }
}

fn builder(workdir: &Path) -> ContainerInvocationBuilder {
    ContainerInvocationBuilder::new(RunConfig::default(), identity(), Environment::new(), workdir)
        .unwrap()
        .with_volume_resolver(VolumeResolver::new(Vec::<PathBuf>::new(), Vec::new()))
}

fn container_engine(
    workdir: &Path,
    options: EngineOptions,
) -> ExecutionEngine<RecordingRunner> {
    ExecutionEngine::new(RecordingRunner::new(), Some(builder(workdir)), options)
}

fn host_engine(runner: RecordingRunner, options: EngineOptions) -> ExecutionEngine<RecordingRunner> {
    ExecutionEngine::new(runner, None, options)
}

#[test]
fn test_container_steps_run_through_builder() {
    let dir = TempDir::new().unwrap();
    let mut engine = container_engine(dir.path(), EngineOptions::new());

    let outcome = engine.run(&steps(PIPELINE)).unwrap();

    assert_eq!(outcome, RunOutcome::Completed { executed: 2, skipped: 0 });
    let commands = engine.runner().commands();
    assert_eq!(commands.len(), 2);
    for command in &commands {
        assert!(command.starts_with("docker run --rm --name autobuild "));
        assert!(command.ends_with(" -u 1000:1000 autobuild /bin/sh /autobuild/step.sh"));
    }
}

#[test]
fn test_scripts_are_removed_after_each_step() {
    let dir = TempDir::new().unwrap();
    let mut engine = container_engine(dir.path(), EngineOptions::new());

    engine.run(&steps(PIPELINE)).unwrap();

    let leftover = fs::read_dir(dir.path().join(TMP_DIR)).unwrap().count();
    assert_eq!(leftover, 0);
}

#[test]
fn test_skip_token_filters_step() {
    let dir = TempDir::new().unwrap();
    let options = EngineOptions::new().with_skip(["build:1"]);
    let mut engine = container_engine(dir.path(), options);

    let outcome = engine.run(&steps(PIPELINE)).unwrap();

    assert_eq!(outcome, RunOutcome::Completed { executed: 1, skipped: 1 });
    assert_eq!(engine.runner().commands().len(), 1);
}

#[test]
fn test_host_step_bypasses_builder() {
    let mut engine = host_engine(RecordingRunner::new(), EngineOptions::new());
    let text = "
stage('lint') {
    steps {
        script {
            sh('lint.sh')
        }
    }
}";

    let outcome = engine.run(&steps(text)).unwrap();

    assert_eq!(outcome, RunOutcome::Completed { executed: 1, skipped: 0 });
    assert_eq!(engine.runner().commands(), vec!["lint.sh"]);
}

#[test]
fn test_until_halts_after_first_step() {
    let dir = TempDir::new().unwrap();
    let options = EngineOptions::new().with_until(Some("build:0".to_string()));
    let mut engine = container_engine(dir.path(), options);

    let outcome = engine.run(&steps(PIPELINE)).unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Halted {
            step: "build:0".to_string(),
            executed: 1,
            skipped: 0,
        }
    );
    assert_eq!(engine.runner().commands().len(), 1);
}

#[test]
fn test_until_only_matches_executed_steps() {
    let options = EngineOptions::new()
        .with_skip(["lint"])
        .with_until(Some("lint".to_string()))
        .with_no_container(true);
    let mut engine = host_engine(RecordingRunner::new(), options);

    let outcome = engine.run(&steps(MIXED)).unwrap();

    assert_eq!(outcome, RunOutcome::Completed { executed: 2, skipped: 1 });
}

#[test]
fn test_missing_extra_volume_still_runs() {
    let dir = TempDir::new().unwrap();
    let missing = "/nonexistent/autobuild/cache";
    let builder = ContainerInvocationBuilder::new(
        RunConfig::default(),
        identity(),
        Environment::new(),
        dir.path(),
    )
    .unwrap()
    .with_volume_resolver(VolumeResolver::new(
        Vec::<PathBuf>::new(),
        vec![missing.to_string()],
    ));
    let mut engine = ExecutionEngine::new(RecordingRunner::new(), Some(builder), EngineOptions::new());

    let (outcome, logs) = capture_logs(|| engine.run(&steps(PIPELINE)));

    assert_eq!(outcome.unwrap(), RunOutcome::Completed { executed: 2, skipped: 0 });
    assert!(engine.runner().commands().iter().all(|c| !c.contains(missing)));
    assert!(logs.contains("WARN"));
    assert!(logs.contains("Extra volume does not exist on host, not mounting it"));
    assert!(logs.contains(missing));
}

#[test]
fn test_dry_run_makes_no_runner_calls() {
    let runner = RecordingRunner::new();
    let options = EngineOptions::new().with_dry_run(true, ListFormat::Text);
    let mut engine = host_engine(runner, options);

    let outcome = engine.run(&steps(MIXED)).unwrap();

    assert_eq!(outcome, RunOutcome::Listed { steps: 3 });
    assert!(engine.runner().commands().is_empty());
    assert_eq!(engine.runner().syncs(), 0);
}

#[test]
fn test_dry_run_needs_no_builder() {
    let options = EngineOptions::new().with_dry_run(true, ListFormat::Json);
    let mut engine = host_engine(RecordingRunner::new(), options);

    assert!(engine.run(&steps(PIPELINE)).is_ok());
}

#[test]
fn test_container_step_without_builder_is_an_error() {
    let mut engine = host_engine(RecordingRunner::new(), EngineOptions::new());

    let err = engine.run(&steps(PIPELINE)).unwrap_err();

    assert!(matches!(err, PipelineError::Assembly(_)));
    assert!(engine.runner().commands().is_empty());
}

#[test]
fn test_no_container_runs_on_host() {
    let options = EngineOptions::new().with_no_container(true);
    let mut engine = host_engine(RecordingRunner::new(), options);

    engine.run(&steps(MIXED)).unwrap();

    assert_eq!(
        engine.runner().commands(),
        vec!["lint.sh", "make", "run-tests.sh"]
    );
}

#[test]
fn test_failure_stops_the_run() {
    let runner = RecordingRunner::new().failing_on("lint.sh", 3);
    let options = EngineOptions::new().with_no_container(true);
    let mut engine = host_engine(runner, options);

    let err = engine.run(&steps(MIXED)).unwrap_err();

    assert_eq!(
        err,
        PipelineError::CommandFailed {
            code: 3,
            command: "lint.sh".to_string(),
            message: Some("step: lint failed".to_string()),
        }
    );
    assert_eq!(err.exit_code(), 3);
    assert_eq!(engine.runner().commands(), vec!["lint.sh"]);
    assert_eq!(engine.runner().syncs(), 0);
}

#[test]
fn test_ignored_failure_continues() {
    let runner = RecordingRunner::new().failing_on("lint.sh", 3);
    let options = EngineOptions::new()
        .with_no_container(true)
        .with_ignore_failures(["lint"]);
    let mut engine = host_engine(runner, options);

    let outcome = engine.run(&steps(MIXED)).unwrap();

    assert_eq!(outcome, RunOutcome::Completed { executed: 3, skipped: 0 });
}

#[test]
fn test_sync_after_each_executed_step() {
    let options = EngineOptions::new()
        .with_no_container(true)
        .with_skip(["test"]);
    let mut engine = host_engine(RecordingRunner::new(), options);

    engine.run(&steps(MIXED)).unwrap();

    assert_eq!(engine.runner().syncs(), 2);
}

#[test]
fn test_stage_selection() {
    let options = EngineOptions::new()
        .with_no_container(true)
        .with_selection(Selection::from_parts(None, vec!["build".into(), "test".into()]));
    let mut engine = host_engine(RecordingRunner::new(), options);

    let outcome = engine.run(&steps(MIXED)).unwrap();

    assert_eq!(outcome, RunOutcome::Completed { executed: 2, skipped: 1 });
    assert_eq!(engine.runner().commands(), vec!["make", "run-tests.sh"]);
}

#[test]
fn test_step_selection_wins_over_stages() {
    let options = EngineOptions::new()
        .with_no_container(true)
        .with_selection(Selection::from_parts(
            Some("BUILD:0".to_string()),
            vec!["lint".into()],
        ));
    let mut engine = host_engine(RecordingRunner::new(), options);

    engine.run(&steps(MIXED)).unwrap();

    assert_eq!(engine.runner().commands(), vec!["make"]);
}

#[test]
fn test_pause_reads_confirmation() {
    let options = EngineOptions::new().with_no_container(true).with_pause(true);
    let mut engine =
        host_engine(RecordingRunner::new(), options).with_input(Cursor::new("\n\n\n"));

    let outcome = engine.run(&steps(MIXED)).unwrap();

    assert_eq!(outcome, RunOutcome::Completed { executed: 3, skipped: 0 });
}

#[test]
fn test_render_listing_text() {
    let listing = render_listing(
        &[Step::host("lint", "lint.sh"), Step::container("build", 0, "make")],
        ListFormat::Text,
    );

    assert_eq!(
        listing,
        "Step: lint [host]\n    lint.sh\nStep: build:0 [container]\n    make"
    );
}

#[test]
fn test_render_listing_json() {
    let listed = vec![Step::container("build", 0, "make")];
    let listing = render_listing(&listed, ListFormat::Json);

    let parsed: Vec<Step> = serde_json::from_str(&listing).unwrap();
    assert_eq!(parsed, listed);
}
