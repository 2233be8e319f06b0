//! The library facade running a fake npm through the shell runner.

use std::collections::BTreeMap;
use std::sync::Arc;

use npmcall::config::{ExecSettings, NpmOptions, UserconfigStyle};
use npmcall::core::NpmError;
use npmcall::npm::Npm;
use npmcall::npm::discovery::Discovery;
use npmcall::npm::runner::ShellRunner;
use serial_test::serial;

use super::common::TestProject;

fn npm_for(project: &TestProject, options: NpmOptions) -> Npm {
    let discovery =
        Discovery::discover_at(Some(project.npm_path().to_path_buf()), &ShellRunner::new());
    Npm::with_parts(project.project_path(), options, Arc::new(discovery), Arc::new(ShellRunner::new()))
}

#[test]
#[serial]
fn test_discovery_reads_listing() {
    let project = TestProject::new().unwrap();
    let npm = npm_for(&project, NpmOptions::new());

    assert_eq!(
        npm.registry().commands(),
        ["access", "dist-tag", "install", "run-script", "fail", "mute", "pwd", "printenv", "sleep", "count"]
    );
    assert!(npm.registry().contains("runScript"));
    assert!(!npm.registry().contains("not-a-command"));
}

#[test]
#[serial]
fn test_invoke_sync_passes_params_and_flags() {
    let project = TestProject::new().unwrap();
    let options = NpmOptions::new().username("u").registry("http://localhost:4873");
    let npm = npm_for(&project, options);

    let output = npm.invoke_sync("install", Some("left-pad --save-dev")).unwrap();
    assert_eq!(
        output.trim(),
        "install left-pad --save-dev --username u --registry http://localhost:4873 \
         --always-auth --no-strict-ssl"
    );
}

#[test]
#[serial]
fn test_userconfig_styles_reach_npm() {
    let project = TestProject::new().unwrap();

    let attached = npm_for(&project, NpmOptions::new().userconfig("/tmp/rc"));
    let output = attached.invoke_sync("install", None).unwrap();
    assert!(output.contains("--userconfig/tmp/rc "), "{output}");

    let separated = npm_for(
        &project,
        NpmOptions::new().userconfig("/tmp/rc").userconfig_style(UserconfigStyle::Separated),
    );
    let output = separated.invoke_sync("install", None).unwrap();
    assert!(output.contains("--userconfig /tmp/rc "), "{output}");
}

#[test]
#[serial]
fn test_failure_carries_stderr() {
    let project = TestProject::new().unwrap();
    let npm = npm_for(&project, NpmOptions::new());

    let err = npm.call_sync("fail", None).unwrap_err();
    assert_eq!(err.to_string(), "npm ERR! something broke");
    assert_eq!(err.exit_code(), Some(3));
}

#[test]
#[serial]
fn test_failure_without_output_reports_code() {
    let project = TestProject::new().unwrap();
    let npm = npm_for(&project, NpmOptions::new());

    let err = npm.call_sync("mute", None).unwrap_err();
    assert_eq!(err.to_string(), "Incorrect code #4");
}

#[test]
#[serial]
fn test_cd_scopes_working_directory() {
    let project = TestProject::new().unwrap();
    let mut npm = npm_for(&project, NpmOptions::new());
    let before = std::env::current_dir().unwrap();

    let output = npm.cd("packages").cd("core").call_sync("pwd", None).unwrap();

    let expected = project.project_path().join("packages").join("core").canonicalize().unwrap();
    assert_eq!(std::path::Path::new(output.trim()).canonicalize().unwrap(), expected);
    assert_eq!(std::env::current_dir().unwrap(), before);
}

#[test]
#[serial]
fn test_exec_env_reaches_npm() {
    let project = TestProject::new().unwrap();
    let mut env = BTreeMap::new();
    env.insert("NPMCALL_TEST_VALUE".to_string(), "from-exec".to_string());
    let options = NpmOptions::new().exec(ExecSettings {
        env,
        ..ExecSettings::default()
    });
    let npm = npm_for(&project, options);

    assert_eq!(npm.call_sync("printenv", None).unwrap().trim(), "from-exec");
}

#[test]
#[serial]
fn test_timeout_kills_npm() {
    let project = TestProject::new().unwrap();
    let options = NpmOptions::new().exec(ExecSettings {
        timeout_secs: Some(1),
        ..ExecSettings::default()
    });
    let npm = npm_for(&project, options);

    let err = npm.call_sync("sleep", None).unwrap_err();
    assert_eq!(err.exit_code(), Some(-1));
    assert!(err.to_string().starts_with("partial\n"), "{err}");
    assert!(err.to_string().ends_with("Command timed out after 1 seconds"), "{err}");
}

#[test]
#[serial]
fn test_cd_into_missing_directory_is_command_failure() {
    let project = TestProject::new().unwrap();
    let mut npm = npm_for(&project, NpmOptions::new());

    match npm.cd("missing").call_sync("pwd", None) {
        Err(NpmError::CommandExecution {
            code,
            message,
        }) => {
            assert_eq!(code, 1);
            assert!(message.contains("missing"), "{message}");
        }
        other => panic!("expected a command execution error, got {other:?}"),
    }
}

#[tokio::test]
#[serial]
async fn test_async_cd_into_missing_directory_is_command_failure() {
    let project = TestProject::new().unwrap();
    let mut npm = npm_for(&project, NpmOptions::new());

    let err = npm.cd("missing").call("pwd", None).await.unwrap_err();
    assert!(matches!(err, NpmError::CommandExecution { code: 1, .. }), "{err:?}");
}

#[tokio::test]
#[serial]
async fn test_async_call_resolves_method_identifier() {
    let project = TestProject::new().unwrap();
    let npm = npm_for(&project, NpmOptions::new());

    let output = npm.call("distTag", Some("ls left-pad")).await.unwrap();
    assert_eq!(output.trim(), "dist-tag ls left-pad --always-auth --no-strict-ssl");
}

#[tokio::test]
#[serial]
async fn test_completion_receives_failure() {
    let project = TestProject::new().unwrap();
    let npm = npm_for(&project, NpmOptions::new());

    let (tx, rx) = tokio::sync::oneshot::channel();
    npm.call_with("fail", None, move |result| {
        let _ = tx.send(result);
    })
    .await
    .unwrap();

    match rx.await.unwrap() {
        Err(NpmError::CommandExecution {
            code,
            message,
        }) => {
            assert_eq!(code, 3);
            assert_eq!(message, "npm ERR! something broke");
        }
        other => panic!("expected a command execution error, got {other:?}"),
    }
}

#[tokio::test]
#[serial]
async fn test_concurrent_instances_keep_their_directories() {
    let project = TestProject::new().unwrap();
    let root = npm_for(&project, NpmOptions::new());
    let mut nested = root.clone();
    nested.cd("packages/core");

    let (a, b) = tokio::join!(root.call("pwd", None), nested.call("pwd", None));

    let canon = |s: String| std::path::Path::new(s.trim()).canonicalize().unwrap();
    assert_eq!(canon(a.unwrap()), project.project_path().canonicalize().unwrap());
    assert_eq!(
        canon(b.unwrap()),
        project.project_path().join("packages/core").canonicalize().unwrap()
    );
}
