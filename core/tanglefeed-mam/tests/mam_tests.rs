//! Exercises the subprocess encrypter against small stand-in helper
//! scripts, the same way the real deployment drives the JS MAM helper.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use tanglefeed_ledger::TryteString;
use tanglefeed_mam::{MamCliEncrypter, MamConfig, MamError, MessageEncrypter};
use tempfile::TempDir;

fn write_helper(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("mam_encrypt.sh");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn config(encrypt_path: PathBuf) -> MamConfig {
    MamConfig {
        start: 2,
        count: 4,
        channel_key_index: 1,
        security_level: 2,
        encrypt_path,
    }
}

// ── Happy path ──────────────────────────────────────────────────

#[tokio::test]
async fn decodes_a_json_array_of_trytes() {
    let dir = TempDir::new().unwrap();
    let helper = write_helper(&dir, r#"printf '["ABC9DEF", "GHI9JKL"]'"#);
    let encrypter = MamCliEncrypter::new(config(helper)).unwrap();

    let units = encrypter.encrypt("SEED9", r#"{"price":0.5}"#).await.unwrap();
    assert_eq!(units, vec![
        TryteString::new("ABC9DEF").unwrap(),
        TryteString::new("GHI9JKL").unwrap(),
    ]);
}

#[tokio::test]
async fn passes_seed_message_and_key_schedule_flags() {
    let dir = TempDir::new().unwrap();
    let args_file = dir.path().join("args.txt");
    let helper = write_helper(
        &dir,
        &format!(
            "printf '%s\\n' \"$@\" > {}\nprintf '[\"ABC\"]'",
            args_file.display()
        ),
    );
    let encrypter = MamCliEncrypter::new(config(helper)).unwrap();

    encrypter.encrypt("SEED9SEED", "payload").await.unwrap();

    let argv: Vec<String> = fs::read_to_string(&args_file)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    assert_eq!(argv, vec![
        "SEED9SEED",
        "payload",
        "--channel-key-index",
        "1",
        "--start",
        "2",
        "--count",
        "4",
        "--security-level",
        "2",
    ]);
}

// ── Unusable output ─────────────────────────────────────────────

#[tokio::test]
async fn non_json_output_is_an_encryption_failure() {
    let dir = TempDir::new().unwrap();
    let helper = write_helper(&dir, "printf 'mam error: something broke'");
    let encrypter = MamCliEncrypter::new(config(helper)).unwrap();

    let err = encrypter.encrypt("SEED", "msg").await.unwrap_err();
    assert!(matches!(err, MamError::InvalidOutput(_)));
}

#[tokio::test]
async fn non_tryte_strings_are_an_encryption_failure() {
    let dir = TempDir::new().unwrap();
    let helper = write_helper(&dir, r#"printf '["abc-lowercase"]'"#);
    let encrypter = MamCliEncrypter::new(config(helper)).unwrap();

    let err = encrypter.encrypt("SEED", "msg").await.unwrap_err();
    assert!(matches!(err, MamError::InvalidOutput(_)));
}

#[tokio::test]
async fn empty_array_is_an_encryption_failure() {
    let dir = TempDir::new().unwrap();
    let helper = write_helper(&dir, "printf '[]'");
    let encrypter = MamCliEncrypter::new(config(helper)).unwrap();

    let err = encrypter.encrypt("SEED", "msg").await.unwrap_err();
    assert!(matches!(err, MamError::InvalidOutput(_)));
}

// ── Helper process failures ─────────────────────────────────────

#[tokio::test]
async fn nonzero_exit_surfaces_status_and_stderr() {
    let dir = TempDir::new().unwrap();
    let helper = write_helper(&dir, "echo 'seed too short' >&2\nexit 3");
    let encrypter = MamCliEncrypter::new(config(helper)).unwrap();

    let err = encrypter.encrypt("SEED", "msg").await.unwrap_err();
    match err {
        MamError::Helper { status, stderr } => {
            assert_eq!(status, 3);
            assert_eq!(stderr, "seed too short");
        }
        other => panic!("expected Helper error, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_helper_is_a_spawn_error() {
    let dir = TempDir::new().unwrap();
    let encrypter =
        MamCliEncrypter::new(config(dir.path().join("no-such-helper"))).unwrap();

    let err = encrypter.encrypt("SEED", "msg").await.unwrap_err();
    assert!(matches!(err, MamError::Spawn { .. }));
}

// ── Construction ────────────────────────────────────────────────

#[test]
fn empty_helper_path_is_a_config_error() {
    let err = MamCliEncrypter::new(config(PathBuf::new())).unwrap_err();
    assert!(matches!(err, MamError::Config(_)));
}
