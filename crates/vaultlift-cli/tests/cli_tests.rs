//! End-to-end tests of the vaultlift binary

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Workspace {
    temp: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let ws = Self {
            temp: TempDir::new().unwrap(),
        };
        fs::create_dir_all(ws.path("images")).unwrap();
        fs::create_dir_all(ws.path("notes")).unwrap();
        ws
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.temp.path().join(relative)
    }

    fn write(&self, relative: &str, content: &[u8]) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative)).unwrap()
    }

    /// `vaultlift run` with the directory backend
    fn run(&self, target: &Path) -> Command {
        let mut cmd = Command::cargo_bin("vaultlift").unwrap();
        cmd.env("VAULTLIFT_TEST_MODE", "1")
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .arg("run")
            .arg(target)
            .arg("--image-root")
            .arg(self.path("images"))
            .arg("--output-dir")
            .arg(self.path("out"))
            .arg("--backend")
            .arg("directory")
            .arg("--storage-dir")
            .arg(self.path("published"))
            .arg("--public-base-url")
            .arg("https://static.example")
            .arg("--no-progress");
        cmd
    }
}

#[test]
#[serial]
fn test_run_folder_migrates_and_mirrors_layout() {
    let ws = Workspace::new();
    ws.write("images/a.png", b"A");
    ws.write("images/nested/b.jpg", b"B");
    ws.write("notes/one.md", b"# One\n![[a.png|first]]\ntext\n");
    ws.write("notes/trip/two.md", b"![b](../images/nested/b.jpg)\n![[missing.png]]\n");

    ws.run(&ws.path("notes"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Finished [one.md] (1/1)"))
        .stdout(predicate::str::contains("Finished [two.md] (1/1)"))
        .stdout(predicate::str::contains("Total converts: 2"));

    assert_eq!(
        ws.read("out/one.md"),
        "# One\n![first](https://static.example/one/a.png)\ntext\n"
    );
    assert_eq!(
        ws.read("out/trip/two.md"),
        "![b](https://static.example/trip/two/b.jpg)\n![[missing.png]]\n"
    );
    assert_eq!(fs::read(ws.path("published/trip/two/b.jpg")).unwrap(), b"B");
    // originals untouched
    assert_eq!(ws.read("notes/one.md"), "# One\n![[a.png|first]]\ntext\n");
}

#[test]
#[serial]
fn test_run_with_largest_timeout() {
    let ws = Workspace::new();
    ws.write("images/a.png", b"A");
    let note = ws.write("notes/doc1.md", b"![[a.png]]\n");

    ws.run(&note)
        .arg("--timeout")
        .arg(u64::MAX.to_string())
        .assert()
        .success()
        .stdout(predicate::str::contains("Finished [doc1.md] (1/1)"));

    assert_eq!(ws.read("out/doc1.md"), "![](https://static.example/doc1/a.png)\n");
}

#[test]
#[serial]
fn test_run_single_file_with_overwrite() {
    let ws = Workspace::new();
    ws.write("images/a.png", b"A");
    let note = ws.write("notes/doc1.md", b"![[a.png]]\r\nend");

    ws.run(&note).arg("--overwrite").assert().success();

    assert_eq!(
        ws.read("notes/doc1.md"),
        "![](https://static.example/doc1/a.png)\r\nend"
    );
    assert!(!ws.path("out").exists());
}

#[test]
#[serial]
fn test_dry_run_writes_nothing() {
    let ws = Workspace::new();
    ws.write("images/a.png", b"A");
    ws.write("notes/doc.md", b"![[a.png]]\n");

    ws.run(&ws.path("notes"))
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Images that would be uploaded: 1"));

    assert!(!ws.path("out").exists());
    assert!(!ws.path("published").exists());
}

#[test]
#[serial]
fn test_empty_folder_fails() {
    let ws = Workspace::new();

    ws.run(&ws.path("notes"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No markdown files in"));
}

#[test]
#[serial]
fn test_missing_image_root_fails_before_any_document() {
    let ws = Workspace::new();
    ws.write("notes/doc.md", b"![[a.png]]\n");
    fs::remove_dir_all(ws.path("images")).unwrap();

    ws.run(&ws.path("notes"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Image directory not found"));

    assert!(!ws.path("out/doc.md").exists());
}

#[test]
#[serial]
fn test_failed_document_sets_exit_code_but_others_finish() {
    let ws = Workspace::new();
    ws.write("images/a.png", b"A");
    ws.write("notes/bad.md", b"![[a.png]]\n");
    ws.write("notes/good.md", b"![[a.png]]\n");
    // A directory where the output file should go makes the rename fail
    fs::create_dir_all(ws.path("out/bad.md/blocker")).unwrap();

    ws.run(&ws.path("notes"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("Finished [good.md] (1/1)"))
        .stderr(predicate::str::contains("bad.md"));

    assert_eq!(
        ws.read("out/good.md"),
        "![](https://static.example/good/a.png)\n"
    );
}

#[tokio::test(flavor = "multi_thread")]
#[serial]
async fn test_http_backend_partial_failure_keeps_line() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(wiremock::matchers::path("/doc/bad.png"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let ws = Workspace::new();
    ws.write("images/ok.png", b"1");
    ws.write("images/bad.png", b"2");
    ws.write("notes/doc.md", b"![[ok.png]]\n![[bad.png]]\n");

    let uri = server.uri();
    let images = ws.path("images");
    let out = ws.path("out");
    let note = ws.path("notes/doc.md");
    let assert = tokio::task::spawn_blocking(move || {
        Command::cargo_bin("vaultlift")
            .unwrap()
            .env("VAULTLIFT_TEST_MODE", "1")
            .env("NO_COLOR", "1")
            .arg("run")
            .arg(note)
            .arg("--image-root")
            .arg(images)
            .arg("--output-dir")
            .arg(out)
            .arg("--endpoint")
            .arg(uri)
            .arg("--public-base-url")
            .arg("https://cdn.example")
            .arg("--no-progress")
            .assert()
    })
    .await
    .unwrap();

    assert
        .success()
        .stdout(predicate::str::contains("Finished [doc.md] (1/2)"));
    assert_eq!(
        ws.read("out/doc.md"),
        "![](https://cdn.example/doc/ok.png)\n![[bad.png]]\n"
    );
}

#[test]
#[serial]
fn test_config_init_and_show() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("config.toml");

    Command::cargo_bin("vaultlift")
        .unwrap()
        .env("NO_COLOR", "1")
        .args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config file at"));
    assert!(fs::read_to_string(&config_path)
        .unwrap()
        .contains("Vaultlift Configuration"));

    Command::cargo_bin("vaultlift")
        .unwrap()
        .env("NO_COLOR", "1")
        .env("VAULTLIFT_STORAGE_TOKEN", "hidden-token")
        .arg("-C")
        .arg(&config_path)
        .args(["config", "show", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"concurrency_limit\": 8"))
        .stdout(predicate::str::contains("hidden-token").not());
}

#[test]
#[serial]
fn test_config_init_refuses_to_clobber() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("config.toml");
    fs::write(&config_path, "existing").unwrap();

    Command::cargo_bin("vaultlift")
        .unwrap()
        .env("NO_COLOR", "1")
        .args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    assert_eq!(fs::read_to_string(&config_path).unwrap(), "existing");
}

#[test]
fn test_config_path_honours_flag() {
    Command::cargo_bin("vaultlift")
        .unwrap()
        .args(["-C", "/tmp/custom.toml", "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/tmp/custom.toml"));
}
