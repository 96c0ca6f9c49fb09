//! Upload command integration tests.
//!
//! Only dry runs and failures that happen before any network access are
//! exercised here.

use predicates::prelude::*;

use super::common::{MYFUNC, TestEnv, zip_names};

#[test]
fn dry_run_reports_both_keys() {
  let env = TestEnv::new(MYFUNC);

  env
    .lambdapack_cmd()
    .args(["upload", "--dry-run"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Dry run"))
    .stdout(predicate::str::contains("Versioned: v1.2.3/myfunc.zip"))
    .stdout(predicate::str::contains("Latest: latest/myfunc.zip"));

  assert_eq!(zip_names(&env.archive_path()), vec!["handler.py", "bootstrap.sh"]);
}

#[test]
fn dry_run_json_output() {
  let env = TestEnv::new(MYFUNC);

  let output = env
    .lambdapack_cmd()
    .args(["-P", "bucket_prefix=fn/"])
    .args(["upload", "--dry-run", "--output", "json"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["publish"]["bucket"], "releases");
  assert_eq!(report["publish"]["keys"]["versioned"], "fn/v1.2.3/myfunc.zip");
  assert_eq!(report["publish"]["keys"]["latest"], "fn/latest/myfunc.zip");
  assert_eq!(report["publish"]["sha256"], report["package"]["sha256"]);
  assert_eq!(report["notified"], false);
}

#[test]
fn dry_run_never_notifies_teamcity() {
  let env = TestEnv::new(MYFUNC);

  env
    .lambdapack_cmd()
    .args(["-P", "teamcity_output=true", "upload", "--dry-run"])
    .assert()
    .success()
    .stdout(predicate::str::contains("##teamcity").not());
}

#[test]
fn missing_bucket_fails_before_packaging() {
  let env = TestEnv::new("[project]\nname = \"myfunc\"\nversion = \"1.2.3\"\n");

  env
    .lambdapack_cmd()
    .args(["upload", "--dry-run"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("missing mandatory property 'bucket_name'"));

  assert!(!env.path().join("target").exists());
}

#[test]
fn unknown_acl_fails_before_network() {
  let env = TestEnv::new(MYFUNC);

  env
    .lambdapack_cmd()
    .args(["-P", "lambda_file_access_control=everyone", "upload"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("lambda_file_access_control"));

  assert!(!env.path().join("target").exists());
}

#[test]
fn invalid_teamcity_flag_fails_before_network() {
  let env = TestEnv::new(MYFUNC);

  env
    .lambdapack_cmd()
    .args(["-P", "teamcity_output=maybe", "upload"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("teamcity_output"));

  assert!(!env.path().join("target").exists());
}

#[test]
fn dry_run_still_validates_teamcity_flag() {
  let env = TestEnv::new(MYFUNC);

  env
    .lambdapack_cmd()
    .args(["-P", "teamcity_output=maybe", "upload", "--dry-run"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("teamcity_output"));

  assert!(!env.path().join("target").exists());
}

#[test]
fn dry_run_json_stdout_is_only_the_report() {
  let env = TestEnv::new(MYFUNC);

  let output = env
    .lambdapack_cmd()
    .args(["-P", "teamcity_output=true", "upload", "--dry-run", "--output", "json"])
    .output()
    .unwrap();

  assert!(output.status.success());
  serde_json::from_slice::<serde_json::Value>(&output.stdout).unwrap();
}
