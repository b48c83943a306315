use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SAMPLE: &str = r#"{
    "timeStamp": "Fri Jul 30 21:25:10 BST 2021",
    "groups": {
        "UserA": {
            "notes": {
                "note": "hi",
                "ml!bank": "Login at https://bank.example/login today"
            },
            "acct": {
                "limit": 5,
                "isa": {
                    "transactions": [
                        {"date": "2021-01-02T10:00:00", "val": 10, "ref": "a"},
                        {"date": "2021-01-01T10:00:00", "val": -5, "ref": "b"}
                    ]
                }
            }
        }
    }
}"#;

struct Fixture {
    dir: TempDir,
    file: PathBuf,
}

impl Fixture {
    fn new(content: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("keepsake.json");
        std::fs::write(&file, content).unwrap();
        Self { dir, file }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("keepsake").unwrap();
        cmd.env("KEEPSAKE_DATA_DIR", self.dir.path().join("config"))
            .env_remove("KEEPSAKE_PASSWORD")
            .env_remove("KEEPSAKE_SALT")
            .env_remove("RUST_LOG")
            .arg(&self.file);
        cmd
    }

    fn file(&self) -> &Path {
        &self.file
    }
}

#[test]
fn tree_prints_interior_nodes() {
    let fixture = Fixture::new(SAMPLE);
    fixture
        .cmd()
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "UserA\n  acct\n    isa\n      transactions\n  notes\n",
        ))
        .stdout(predicate::str::contains("limit").not())
        .stdout(predicate::str::contains("Selected: UserA"));
}

#[test]
fn invalid_document_exits_with_status_one() {
    let fixture = Fixture::new(r#"{"groups": {}}"#);
    fixture
        .cmd()
        .arg("tree")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Missing field: timeStamp"));
}

#[test]
fn missing_file_exits_with_status_one() {
    let dir = TempDir::new().unwrap();
    Command::cargo_bin("keepsake")
        .unwrap()
        .env("KEEPSAKE_DATA_DIR", dir.path())
        .arg(dir.path().join("nope.json"))
        .assert()
        .code(1);
}

#[test]
fn get_prints_leaf_and_subtree() {
    let fixture = Fixture::new(SAMPLE);
    fixture
        .cmd()
        .args(["get", "UserA.notes.note"])
        .assert()
        .success()
        .stdout("hi\n");

    fixture
        .cmd()
        .args(["get", "UserA.acct.isa.transactions.1.ref"])
        .assert()
        .success()
        .stdout("b\n");

    fixture
        .cmd()
        .args(["get", "UserA.notes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("    \"note\": \"hi\""));
}

#[test]
fn get_remembers_selection() {
    let fixture = Fixture::new(SAMPLE);
    fixture.cmd().args(["get", "UserA.acct"]).assert().success();

    fixture
        .cmd()
        .arg("tree")
        .assert()
        .success()
        .stdout(predicate::str::contains("Selected: UserA.acct"));
}

#[test]
fn set_updates_and_saves() {
    let fixture = Fixture::new(SAMPLE);
    fixture
        .cmd()
        .args(["set", "UserA.acct.limit", "7.5"])
        .assert()
        .success();

    let saved = std::fs::read_to_string(fixture.file()).unwrap();
    assert!(saved.contains("\"limit\": 7.5"));
    assert!(!saved.contains("Fri Jul 30 21:25:10 BST 2021"));

    fixture
        .cmd()
        .args(["set", "UserA.acct.limit", "lots"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Cannot store 'lots'"));
}

#[test]
fn search_lists_hits() {
    let fixture = Fixture::new(SAMPLE);
    fixture
        .cmd()
        .args(["search", "BANK.EXAMPLE"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "UserA.notes.ml!bank\tUserA [Notes] bank: In Text: 'bank'",
        ));

    fixture
        .cmd()
        .args(["search", "BANK.EXAMPLE", "--case-sensitive"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matches"));
}

#[test]
fn structural_edits() {
    let fixture = Fixture::new(SAMPLE);
    fixture.cmd().args(["add-user", "UserB"]).assert().success();
    fixture
        .cmd()
        .args(["add-note", "UserB", "pin"])
        .assert()
        .success();
    fixture
        .cmd()
        .args(["add-user", "UserB"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));

    fixture
        .cmd()
        .args(["rename", "UserB", "UserC"])
        .assert()
        .success();
    fixture
        .cmd()
        .args(["get", "UserC.notes.pin"])
        .assert()
        .success()
        .stdout("\n");

    fixture.cmd().args(["remove", "UserC"]).assert().success();
    fixture
        .cmd()
        .args(["remove", "UserA"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("at least 1"));
}

#[test]
fn ledger_prints_running_balance() {
    let fixture = Fixture::new(SAMPLE);
    fixture
        .cmd()
        .args(["ledger", "UserA.acct.isa", "--initial", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Closing Balance:     95.00"))
        .stdout(predicate::str::contains("   105.00"));
}

#[test]
fn link_extracts_first_url() {
    let fixture = Fixture::new(SAMPLE);
    fixture
        .cmd()
        .args(["link", "see http://example.com for info"])
        .assert()
        .success()
        .stdout("http://example.com\n");

    fixture
        .cmd()
        .args(["link", "http://x"])
        .assert()
        .success()
        .stdout("No link found.\n");
}

#[test]
fn link_needs_no_file() {
    Command::cargo_bin("keepsake")
        .unwrap()
        .env_remove("RUST_LOG")
        .args(["link", "see https://example.com/a for info"])
        .assert()
        .success()
        .stdout("https://example.com/a\n");
}

#[test]
fn other_commands_need_a_file() {
    let dir = TempDir::new().unwrap();
    Command::cargo_bin("keepsake")
        .unwrap()
        .env("KEEPSAKE_DATA_DIR", dir.path())
        .arg("tree")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("FILE is required"));
}

#[test]
#[ignore = "full-cost scrypt allocates 1 GiB"]
fn encrypt_and_decrypt_round_trip() {
    let fixture = Fixture::new(SAMPLE);
    fixture
        .cmd()
        .args(["--password", "correct horse", "encrypt"])
        .assert()
        .success();
    assert!(!std::fs::read(fixture.file()).unwrap().starts_with(b"{"));

    fixture
        .cmd()
        .args(["--password", "wrong", "tree"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Decryption failed"));

    fixture
        .cmd()
        .args(["--password", "correct horse", "decrypt"])
        .assert()
        .success();
    assert!(std::fs::read(fixture.file()).unwrap().starts_with(b"{"));
}
