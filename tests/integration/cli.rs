//! The `npmcall` binary against the fake npm.

use predicates::prelude::*;
use serial_test::serial;

use super::common::{LISTING, TestProject};

#[test]
#[serial]
fn test_fake_npm_prints_listing() {
    let project = TestProject::new().unwrap();
    let output = project.run_fake_npm(&["-l"]).unwrap();
    assert_eq!(output.trim_matches('\n'), LISTING.trim_matches('\n'));
}

#[test]
#[serial]
fn test_which_prints_binary() {
    let project = TestProject::new().unwrap();
    project
        .npmcall()
        .arg("which")
        .assert()
        .success()
        .stdout(predicate::str::contains(project.npm_path().to_string_lossy().to_string()));
}

#[test]
#[serial]
fn test_which_without_npm_fails() {
    let project = TestProject::new().unwrap();
    project
        .npmcall()
        .env_remove("NPMCALL_NPM")
        .env("PATH", project.project_path())
        .arg("which")
        .assert()
        .failure()
        .stderr(predicate::str::contains("npm: command not found"))
        .stderr(predicate::str::contains("--npm"));
}

#[test]
#[serial]
fn test_commands_json() {
    let project = TestProject::new().unwrap();
    let assert = project.npmcall().args(["commands", "--json"]).assert().success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let entries: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 10);
    assert_eq!(entries[1]["name"], "dist-tag");
    assert_eq!(entries[1]["method"], "distTag");
}

#[test]
#[serial]
fn test_commands_table() {
    let project = TestProject::new().unwrap();
    project
        .npmcall()
        .arg("commands")
        .assert()
        .success()
        .stdout(predicate::str::contains("Discovered 10 npm commands"))
        .stdout(predicate::str::contains("runScript"))
        .stdout(predicate::str::contains("not-a-command").not());
}

#[test]
#[serial]
fn test_run_by_method_identifier() {
    let project = TestProject::new().unwrap();
    project
        .npmcall()
        .args(["run", "distTag", "add", "left-pad@1.0.0", "beta"])
        .assert()
        .success()
        .stdout("dist-tag add left-pad@1.0.0 beta --always-auth --no-strict-ssl\n");
}

#[test]
#[serial]
fn test_run_passes_hyphenated_params() {
    let project = TestProject::new().unwrap();
    project
        .npmcall()
        .args(["run", "install", "left-pad", "--save-dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("install left-pad --save-dev --always-auth"));
}

#[test]
#[serial]
fn test_run_keeps_quoted_params_as_one_word() {
    let project = TestProject::new().unwrap();
    // One parameter plus the two always-on flags.
    project.npmcall().args(["run", "count", "a b"]).assert().success().stdout("3\n");
}

#[test]
#[serial]
fn test_run_in_missing_dir_fails_cleanly() {
    let project = TestProject::new().unwrap();
    project
        .npmcall()
        .args(["--dir", "nowhere", "run", "pwd"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nowhere"))
        .stderr(predicate::str::contains("exited with code 1"));
}

#[test]
#[serial]
fn test_run_flags_become_npm_flags() {
    let project = TestProject::new().unwrap();
    project
        .npmcall()
        .args(["--registry", "http://localhost:4873", "--username", "ci", "run", "install"])
        .assert()
        .success()
        .stdout(
            "install --username ci --registry http://localhost:4873 --always-auth --no-strict-ssl\n",
        );
}

#[test]
#[serial]
fn test_run_uses_config_file_options() {
    let project = TestProject::new().unwrap();
    project
        .write_config(
            r#"
[options]
username = "from-config"
registry = "http://config"
"#,
        )
        .unwrap();

    project
        .npmcall()
        .args(["--registry", "http://flag", "run", "install"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--username from-config --registry http://flag "));
}

#[test]
#[serial]
fn test_run_in_dir() {
    let project = TestProject::new().unwrap();

    project
        .npmcall()
        .args(["--dir", "packages/core", "run", "pwd"])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("/project/packages/core\n"));
}

#[test]
#[serial]
fn test_run_failure_reports_npm_output() {
    let project = TestProject::new().unwrap();
    project
        .npmcall()
        .args(["run", "fail"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("npm ERR! something broke"))
        .stderr(predicate::str::contains("exited with code 3"));
}

#[test]
#[serial]
fn test_run_failure_without_output() {
    let project = TestProject::new().unwrap();
    project
        .npmcall()
        .args(["run", "mute"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Incorrect code #4"));
}

#[test]
#[serial]
fn test_run_unknown_command() {
    let project = TestProject::new().unwrap();
    project
        .npmcall()
        .args(["run", "frobnicate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown npm command: frobnicate"))
        .stderr(predicate::str::contains("npmcall commands"));
}

#[test]
#[serial]
fn test_invalid_config_is_reported() {
    let project = TestProject::new().unwrap();
    project.write_config("options = 3").unwrap();

    project
        .npmcall()
        .arg("which")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load npmcall configuration"));
}

#[test]
#[serial]
fn test_config_init_then_run_uses_it() {
    let project = TestProject::new().unwrap();
    project
        .npmcall()
        .args(["--registry", "http://saved", "config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config at"));

    let saved = std::fs::read_to_string(project.config_path()).unwrap();
    assert!(saved.contains("registry = \"http://saved\""), "{saved}");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(project.config_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    project
        .npmcall()
        .args(["run", "install"])
        .assert()
        .success()
        .stdout("install --registry http://saved --always-auth --no-strict-ssl\n");
}

#[test]
#[serial]
fn test_config_init_refuses_to_overwrite() {
    let project = TestProject::new().unwrap();
    project.write_config("npm_path = \"/keep/me\"\n").unwrap();

    project
        .npmcall()
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
    assert_eq!(std::fs::read_to_string(project.config_path()).unwrap(), "npm_path = \"/keep/me\"\n");
}

#[test]
#[serial]
fn test_config_show_masks_password() {
    let project = TestProject::new().unwrap();
    project
        .write_config(
            r#"
[options]
username = "ci"
password = "hunter2"
"#,
        )
        .unwrap();

    project
        .npmcall()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("username = \"ci\""))
        .stdout(predicate::str::contains("********"))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
#[serial]
fn test_config_path_follows_env() {
    let project = TestProject::new().unwrap();
    project
        .npmcall()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(format!("{}\n", project.config_path().display()));
}
