//! End-to-end workflow tests through the public API.

use std::collections::BTreeSet;

use lambdapack_lib::notify::Notifier;
use lambdapack_lib::pipeline::{PipelineError, package, upload};
use lambdapack_lib::project::{Project, ProjectError};
use lambdapack_lib::publish::{AccessControl, MemoryStore};

use super::common::{ProjectDir, TreeInstaller, zip_entries};

const MYFUNC: &str = r#"
[project]
name = "myfunc"
version = "1.2.3"

[properties]
bucket_name = "releases"
bucket_prefix = ""
"#;

#[tokio::test]
async fn myfunc_is_packaged_and_published() {
  let dir = ProjectDir::new(
    MYFUNC,
    &[
      ("src/main/python/handler.py", "def handler(event, context):\n    return 'ok'\n"),
      ("src/main/scripts/.keep", ""),
    ],
  );
  let project = Project::load(&dir.manifest_path(), &[]).unwrap();
  let store = MemoryStore::new();
  let mut notifier = Notifier::from_project(&project, Vec::new()).unwrap();

  let report = upload(&project, &TreeInstaller::default(), &store, &mut notifier)
    .await
    .unwrap();

  assert!(report.package.archive.path.ends_with("target/myfunc.zip"));
  let names: Vec<_> = zip_entries(&report.package.archive.path)
    .into_iter()
    .map(|(n, _)| n)
    .collect();
  assert!(names.contains(&"handler.py".to_string()));

  let keys: Vec<_> = store.objects().into_iter().map(|o| o.key).collect();
  assert_eq!(keys, vec!["v1.2.3/myfunc.zip", "latest/myfunc.zip"]);
  assert!(!report.notified);
  assert!(notifier.into_inner().is_empty());
}

#[tokio::test]
async fn archive_reproduces_every_file() {
  let files = [
    ("src/main/python/handler.py", "print('handler')\n"),
    ("src/main/python/app/__init__.py", ""),
    ("src/main/python/app/models/user.py", "class User: pass\n"),
    ("src/main/python/app/templates/index.html", "<html></html>"),
    ("src/main/scripts/migrate.sh", "#!/bin/sh\nexit 0\n"),
  ];
  let dir = ProjectDir::new(
    r#"
      [project]
      name = "web"
      version = "0.1"
      dependencies = ["jinja2>=3", "boto3"]
    "#,
    &files,
  );
  let project = Project::load(&dir.manifest_path(), &[]).unwrap();
  let installer = TreeInstaller::default();

  let report = package(&project, &installer).await.unwrap();

  assert_eq!(*installer.calls.borrow(), vec!["jinja2>=3"]);

  let entries = zip_entries(&report.archive.path);
  let expected: BTreeSet<String> = [
    "jinja2/__init__.py",
    "handler.py",
    "app/__init__.py",
    "app/models/user.py",
    "app/templates/index.html",
    "migrate.sh",
  ]
  .into_iter()
  .map(String::from)
  .collect();
  let actual: BTreeSet<String> = entries.iter().map(|(n, _)| n.clone()).collect();
  assert_eq!(actual, expected);
  assert_eq!(entries.len(), expected.len());

  for (path, content) in files {
    let name = path
      .trim_start_matches("src/main/python/")
      .trim_start_matches("src/main/scripts/");
    let (_, stored) = entries.iter().find(|(n, _)| n == name).unwrap();
    assert_eq!(stored, content.as_bytes(), "{name}");
  }
}

#[tokio::test]
async fn repackaging_unchanged_project_is_identical() {
  let dir = ProjectDir::new(
    MYFUNC,
    &[
      ("src/main/python/b.py", "b"),
      ("src/main/python/a.py", "a"),
      ("src/main/scripts/run.sh", "run"),
    ],
  );
  let project = Project::load(&dir.manifest_path(), &[]).unwrap();

  let first = package(&project, &TreeInstaller::default()).await.unwrap();
  let first_bytes = std::fs::read(&first.archive.path).unwrap();
  let second = package(&project, &TreeInstaller::default()).await.unwrap();
  let second_bytes = std::fs::read(&second.archive.path).unwrap();

  assert_eq!(first.archive.entries, second.archive.entries);
  assert_eq!(first.sha256, second.sha256);
  assert_eq!(first_bytes, second_bytes);
}

#[tokio::test]
async fn overrides_change_keys_and_acl() {
  let dir = ProjectDir::new(
    MYFUNC,
    &[("src/main/python/handler.py", "x"), ("src/main/scripts/.keep", "")],
  );
  let overrides = vec![
    ("bucket_prefix".to_string(), "functions/".to_string()),
    ("lambda_file_access_control".to_string(), "private".to_string()),
    ("teamcity_output".to_string(), "true".to_string()),
  ];
  let project = Project::load(&dir.manifest_path(), &overrides).unwrap();
  let store = MemoryStore::new();
  let mut notifier = Notifier::from_project(&project, Vec::new()).unwrap();

  upload(&project, &TreeInstaller::default(), &store, &mut notifier)
    .await
    .unwrap();

  let objects = store.objects();
  assert_eq!(objects[0].key, "functions/v1.2.3/myfunc.zip");
  assert_eq!(objects[1].key, "functions/latest/myfunc.zip");
  assert!(objects.iter().all(|o| o.acl == AccessControl::Private));

  let line = String::from_utf8(notifier.into_inner()).unwrap();
  assert_eq!(
    line,
    "##teamcity[setParameter name='crassus_filename' value='functions/v1.2.3/myfunc.zip']\n"
  );
}

#[tokio::test]
async fn missing_bucket_fails_before_packaging() {
  let dir = ProjectDir::new(
    r#"
      [project]
      name = "myfunc"
      version = "1.2.3"
      dependencies = ["requests"]
    "#,
    &[("src/main/python/handler.py", "x"), ("src/main/scripts/.keep", "")],
  );
  let project = Project::load(&dir.manifest_path(), &[]).unwrap();
  let installer = TreeInstaller::default();
  let store = MemoryStore::new();
  let mut notifier = Notifier::from_project(&project, Vec::new()).unwrap();

  let err = upload(&project, &installer, &store, &mut notifier)
    .await
    .unwrap_err();

  assert!(matches!(
    err,
    PipelineError::Project(ProjectError::MissingProperty(ref key)) if key == "bucket_name"
  ));
  assert_eq!(err.to_string(), "missing mandatory property 'bucket_name'");
  assert!(installer.calls.borrow().is_empty());
  assert!(store.objects().is_empty());
  assert!(!project.archive_path().exists());
}
