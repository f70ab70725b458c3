use chatlens_core::extract::timestamp::utc_to_apple_ns;
use chatlens_core::snapshot;
use chrono::{TimeZone, Utc};
use rusqlite::{params, Connection};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        seed_store_fixture(&home);

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
        }
    }

    fn store_path(&self) -> PathBuf {
        self.home.join("Library/Messages/chat.db")
    }

    fn snapshot_path(&self) -> PathBuf {
        self.xdg_data.join("chatlens/messages.bin")
    }

    fn preview_dir(&self) -> PathBuf {
        self.xdg_data.join("chatlens/previews")
    }

    fn map_path(&self) -> PathBuf {
        self.xdg_config.join("chatlens/id_map.toml")
    }
}

/// Build a small store at the default location under the test HOME:
/// two chats, three messages, one of them mentioning pizza.
fn seed_store_fixture(home: &Path) {
    let store = home.join("Library/Messages/chat.db");
    fs::create_dir_all(store.parent().expect("missing store parent"))
        .expect("failed to create store directories");

    let conn = Connection::open(&store).expect("failed to create store");
    conn.execute_batch(
        r#"
        CREATE TABLE message (
            ROWID INTEGER PRIMARY KEY,
            guid TEXT,
            text TEXT,
            attributedBody BLOB,
            date INTEGER,
            is_from_me INTEGER,
            service TEXT,
            handle_id INTEGER
        );
        CREATE TABLE chat (
            ROWID INTEGER PRIMARY KEY,
            guid TEXT,
            chat_identifier TEXT,
            display_name TEXT
        );
        CREATE TABLE chat_message_join (chat_id INTEGER, message_id INTEGER);
        CREATE TABLE chat_handle_join (chat_id INTEGER, handle_id INTEGER);
        CREATE TABLE handle (ROWID INTEGER PRIMARY KEY, id TEXT);

        INSERT INTO chat (ROWID, chat_identifier, display_name)
            VALUES (1, '+15550001111', NULL);
        INSERT INTO chat (ROWID, chat_identifier, display_name)
            VALUES (2, 'family-group', 'Family');
        INSERT INTO handle (ROWID, id) VALUES (10, '+15550001111');
        INSERT INTO chat_handle_join (chat_id, handle_id) VALUES (1, 10);
        "#,
    )
    .expect("failed to apply store schema");

    let rows = [
        (1i64, 1i64, "morning run?", (2023, 6, 5, 9, 0), false),
        (2, 1, "yes, pizza after", (2023, 6, 5, 9, 5), true),
        (3, 2, "dinner sunday", (2023, 6, 7, 18, 0), false),
    ];
    for (rowid, chat, text, (y, mo, d, h, mi), from_me) in rows {
        let sent_at = Utc
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .single()
            .expect("valid fixture instant");
        conn.execute(
            "INSERT INTO message (ROWID, text, date, is_from_me, service)
             VALUES (?1, ?2, ?3, ?4, 'iMessage')",
            params![rowid, text, utc_to_apple_ns(sent_at), from_me as i64],
        )
        .expect("failed to insert fixture message");
        conn.execute(
            "INSERT INTO chat_message_join (chat_id, message_id) VALUES (?1, ?2)",
            params![chat, rowid],
        )
        .expect("failed to insert fixture join");
    }
}

fn run_bin(env: &CliTestEnv, bin_name: &str, args: &[&str]) -> Output {
    let bin_path = match bin_name {
        "chatlens-extract" => PathBuf::from(assert_cmd::cargo::cargo_bin!("chatlens-extract")),
        "chatlens-report" => PathBuf::from(assert_cmd::cargo::cargo_bin!("chatlens-report")),
        _ => panic!("unsupported binary in test harness: {bin_name}"),
    };

    let mut command = Command::new(bin_path);

    command
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute {bin_name}: {e}"))
}

fn assert_success(bin_name: &str, args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "{bin_name} {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

#[test]
fn extract_builds_snapshot_and_previews() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, "chatlens-extract", &[]);
    assert_success("chatlens-extract", &[], &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Extract complete:"));
    assert!(
        stdout.contains("Messages: 3"),
        "expected extract summary in stdout, got:\n{stdout}"
    );

    let snapshot_path = env.snapshot_path();
    assert!(
        snapshot_path.exists(),
        "snapshot should exist at {}",
        snapshot_path.display()
    );
    let records = snapshot::read(&snapshot_path).expect("failed to read snapshot");
    assert_eq!(records.len(), 3, "expected three extracted rows");
    assert_eq!(records[0].text, "morning run?");

    assert!(env.preview_dir().join("chat_1.html").is_file());
    assert!(env.preview_dir().join("chat_2.html").is_file());
}

#[test]
fn report_summarizes_and_searches_extracted_table() {
    let env = CliTestEnv::new();

    let extract_output = run_bin(&env, "chatlens-extract", &[]);
    assert_success("chatlens-extract", &[], &extract_output);

    // Without an identity map every chat reports as "other".
    let report_args = ["--timezone", "UTC"];
    let report = run_bin(&env, "chatlens-report", &report_args);
    assert_success("chatlens-report", &report_args, &report);
    let report_stdout = String::from_utf8_lossy(&report.stdout);
    assert!(report_stdout.contains("MESSAGES"));
    assert!(report_stdout.contains("CONTACTS"));
    assert!(report_stdout.contains("WEEKLY RHYTHM"));
    assert!(report_stdout.contains("other"));

    let json_args = ["--timezone", "UTC", "--format", "json"];
    let json_report = run_bin(&env, "chatlens-report", &json_args);
    assert_success("chatlens-report", &json_args, &json_report);
    let parsed: serde_json::Value = serde_json::from_slice(&json_report.stdout)
        .expect("json report should parse");
    assert_eq!(parsed["messages"]["rows"], 3);
    assert_eq!(parsed["messages"]["sent"], 1);

    // With a map, chat 1 shows up under its name.
    fs::create_dir_all(env.map_path().parent().expect("missing map parent"))
        .expect("failed to create config dir");
    fs::write(env.map_path(), "\"1\" = \"Koala\"\n").expect("failed to write identity map");

    let named = run_bin(&env, "chatlens-report", &report_args);
    assert_success("chatlens-report", &report_args, &named);
    let named_stdout = String::from_utf8_lossy(&named.stdout);
    assert!(
        named_stdout.contains("Koala"),
        "expected mapped contact in report, got:\n{named_stdout}"
    );

    // Search renders the match in context with the highlight escape.
    let search_args = ["--timezone", "UTC", "--search", "pizza"];
    let search = run_bin(&env, "chatlens-report", &search_args);
    assert_success("chatlens-report", &search_args, &search);
    let search_stdout = String::from_utf8_lossy(&search.stdout);
    assert!(search_stdout.contains("match(es) for 'pizza'"));
    assert!(search_stdout.contains("Koala (chat 1)"));
    assert!(search_stdout.contains("\u{1b}[43mpizza\u{1b}[0m"));
    assert!(search_stdout.contains("morning run?"), "context rows should appear");
}

#[test]
fn extract_fails_cleanly_without_store() {
    let env = CliTestEnv::new();
    fs::remove_file(env.store_path()).expect("failed to remove fixture store");

    let output = run_bin(&env, "chatlens-extract", &[]);
    assert!(
        !output.status.success(),
        "extract should fail without a store"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("message store not found"),
        "expected a pointed error, got:\n{stderr}"
    );
}
