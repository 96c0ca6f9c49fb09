//! Keys command integration tests.

use predicates::prelude::*;

use super::common::{MYFUNC, TestEnv};

#[test]
fn keys_text_output() {
  let env = TestEnv::new(MYFUNC);

  env
    .lambdapack_cmd()
    .arg("keys")
    .assert()
    .success()
    .stdout(predicate::str::contains("Bucket: releases"))
    .stdout(predicate::str::contains("Versioned: v1.2.3/myfunc.zip"))
    .stdout(predicate::str::contains("Latest: latest/myfunc.zip"))
    .stdout(predicate::str::contains("ACL: bucket-owner-full-control"));

  assert!(!env.path().join("target").exists());
}

#[test]
fn keys_json_output_with_overrides() {
  let env = TestEnv::new(MYFUNC);

  let output = env
    .lambdapack_cmd()
    .args(["-P", "bucket_prefix=lambdas/", "-P", "lambda_file_access_control=private"])
    .args(["keys", "--output", "json"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let keys: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(keys["bucket"], "releases");
  assert_eq!(keys["versioned"], "lambdas/v1.2.3/myfunc.zip");
  assert_eq!(keys["latest"], "lambdas/latest/myfunc.zip");
  assert_eq!(keys["acl"], "private");
}

#[test]
fn keys_missing_bucket_fails() {
  let env = TestEnv::new("[project]\nname = \"myfunc\"\nversion = \"1.2.3\"\n");

  env
    .lambdapack_cmd()
    .arg("keys")
    .assert()
    .failure()
    .stderr(predicate::str::contains("missing mandatory property 'bucket_name'"));
}
