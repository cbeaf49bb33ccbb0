//! Headless command harness.
//!
//! # What this covers
//!
//! This harness runs `campusfind` as a compiled binary via
//! [`std::process::Command`] against a throwaway `dir` store, the way a
//! script or a second terminal would use it.
//!
//! - `report` prints the new id; `feed --format jsonl` shows the document.
//! - `feed` honours `--scope`, `--type` and `--search`.
//! - Invalid reports and anonymous deletes exit non-zero with a message.
//! - `delete` by the reporter removes the report.
//!
//! # What this does NOT cover
//!
//! - The dashboard itself (see the `cf-tui` unit tests)
//!
//! # Running
//!
//! ```sh
//! cargo test --test cli_harness
//! ```

use std::path::Path;
use std::process::{Command, Output};

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "").unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    /// `campusfind --config <tmp> --store dir --data-dir <tmp>/data <global...> <args...>`
    fn run(&self, global: &[&str], args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_campusfind"))
            .arg("--config")
            .arg(self.path().join("config.toml"))
            .args(["--store", "dir", "--data-dir"])
            .arg(self.path().join("data"))
            .args(global)
            .args(args)
            .output()
            .expect("failed to spawn campusfind")
    }

    fn report(&self, uid: Option<&str>, kind: &str, name: &str) -> String {
        let mut global = Vec::new();
        if let Some(uid) = uid {
            global.extend(["--user-id", uid, "--email"]);
            global.push("someone@campus.test");
        }
        let out = self.run(
            &global,
            &[
                "report",
                "--type",
                kind,
                "--name",
                name,
                "--description",
                "Navy blue, laptop sleeve inside",
                "--category",
                "electronics",
                "--location",
                "Main Library",
                "--date",
                "2024-09-01",
            ],
        );
        assert!(out.status.success(), "report failed: {}", stderr(&out));
        stdout(&out).trim().to_string()
    }

    fn feed_jsonl(&self, global: &[&str], filters: &[&str]) -> Vec<serde_json::Value> {
        let mut args = vec!["feed", "--format", "jsonl"];
        args.extend_from_slice(filters);
        let out = self.run(global, &args);
        assert!(out.status.success(), "feed failed: {}", stderr(&out));
        stdout(&out)
            .lines()
            .map(|line| serde_json::from_str(line).expect("every line is a JSON document"))
            .collect()
    }
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn reported_item_shows_up_in_the_feed() {
    let ws = Workspace::new();
    let id = ws.report(Some("u-ada"), "lost", "Blue backpack");
    assert!(!id.is_empty());

    let docs = ws.feed_jsonl(&[], &[]);
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["id"], id.as_str());
    assert_eq!(docs[0]["type"], "lost");
    assert_eq!(docs[0]["itemName"], "Blue backpack");
    assert_eq!(docs[0]["category"], "Electronics");
    assert_eq!(docs[0]["userId"], "u-ada");
    assert_eq!(docs[0]["userEmail"], "someone@campus.test");
    assert_eq!(docs[0]["date"], "2024-09-01");
}

#[test]
fn feed_filters_apply() {
    let ws = Workspace::new();
    let backpack = ws.report(Some("u-ada"), "lost", "Blue backpack");
    let charger = ws.report(None, "found", "Laptop charger");

    let all = ws.feed_jsonl(&[], &[]);
    let ids: Vec<&str> = all.iter().filter_map(|d| d["id"].as_str()).collect();
    assert_eq!(ids, [charger.as_str(), backpack.as_str()]);

    let found = ws.feed_jsonl(&[], &["--type", "found"]);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["id"], charger.as_str());

    let search = ws.feed_jsonl(&[], &["--search", "BACKPACK"]);
    assert_eq!(search.len(), 1);
    assert_eq!(search[0]["id"], backpack.as_str());

    let mine = ws.feed_jsonl(&["--user-id", "u-ada"], &["--scope", "mine"]);
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["id"], backpack.as_str());

    let anonymous_mine = ws.feed_jsonl(&[], &["--scope", "mine"]);
    assert!(anonymous_mine.is_empty());
}

#[test]
fn invalid_report_exits_non_zero() {
    let ws = Workspace::new();
    let out = ws.run(
        &[],
        &[
            "report",
            "--type",
            "found",
            "--name",
            "x",
            "--description",
            "too short",
            "--category",
            "book",
            "--location",
            "Gym",
            "--date",
            "2024-09-01",
        ],
    );
    assert!(!out.status.success());
    assert!(stderr(&out).contains("report is invalid"), "{}", stderr(&out));
    assert!(ws.feed_jsonl(&[], &[]).is_empty());
}

#[test]
fn delete_needs_the_reporter() {
    let ws = Workspace::new();
    let id = ws.report(Some("u-ada"), "found", "Student card");

    let anonymous = ws.run(&[], &["delete", "--type", "found", "--id", &id]);
    assert!(!anonymous.status.success());
    assert!(stderr(&anonymous).contains("requires --user-id"), "{}", stderr(&anonymous));

    let stranger = ws.run(&["--user-id", "u-bo"], &["delete", "--type", "found", "--id", &id]);
    assert!(!stranger.status.success());
    assert_eq!(ws.feed_jsonl(&[], &[]).len(), 1);

    let owner = ws.run(&["--user-id", "u-ada"], &["delete", "--type", "found", "--id", &id]);
    assert!(owner.status.success(), "{}", stderr(&owner));
    assert_eq!(stdout(&owner).trim(), "deleted");
    assert!(ws.feed_jsonl(&[], &[]).is_empty());
}

#[test]
fn table_output_tags_each_row() {
    let ws = Workspace::new();
    ws.report(None, "lost", "Blue backpack");
    ws.report(None, "found", "Laptop charger");

    let out = ws.run(&[], &["feed"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let text = stdout(&out);
    let rows: Vec<&str> = text.lines().collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].starts_with("FOUND"), "{text}");
    assert!(rows[1].starts_with("LOST"), "{text}");
}
