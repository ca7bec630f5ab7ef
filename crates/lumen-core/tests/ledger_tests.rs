use lumen_core::upload::HashLedger;
use std::fs;
use tempfile::TempDir;

fn ledger_in(dir: &TempDir) -> HashLedger {
    HashLedger::open(Some(dir.path().join("uploaded_assets.db"))).unwrap()
}

#[test]
fn test_fresh_ledger_is_empty() {
    let dir = TempDir::new().unwrap();
    let ledger = ledger_in(&dir);
    assert!(ledger.is_empty());
    assert!(!ledger.contains("deadbeefdeadbeef"));
}

#[test]
fn test_add_then_contains() {
    let dir = TempDir::new().unwrap();
    let ledger = ledger_in(&dir);

    ledger.add("aaaa000011112222").unwrap();
    assert!(ledger.contains("aaaa000011112222"));
    assert!(!ledger.contains("bbbb000011112222"));
    assert_eq!(ledger.len(), 1);
}

#[test]
fn test_add_is_idempotent_on_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("uploaded_assets.db");
    let ledger = HashLedger::open(Some(path.clone())).unwrap();

    for _ in 0..5 {
        ledger.add("cafe0123cafe0123").unwrap();
    }
    assert_eq!(ledger.len(), 1);

    let contents = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines, vec!["cafe0123cafe0123"]);
}

#[test]
fn test_entries_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("uploaded_assets.db");

    {
        let ledger = HashLedger::open(Some(path.clone())).unwrap();
        ledger.add("1111111111111111").unwrap();
        ledger.add("2222222222222222").unwrap();
    }

    let reopened = HashLedger::open(Some(path)).unwrap();
    assert_eq!(reopened.len(), 2);
    assert!(reopened.contains("1111111111111111"));
    assert!(reopened.contains("2222222222222222"));
    assert!(!reopened.contains("3333333333333333"));
}

#[test]
fn test_open_creates_missing_parent_dirs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("ledger.db");
    let ledger = HashLedger::open(Some(path.clone())).unwrap();
    ledger.add("feedfacefeedface").unwrap();
    assert!(path.exists());
}

#[test]
fn test_blank_lines_in_store_are_ignored() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.db");
    fs::write(&path, "aaaa\n\n  \nbbbb\n").unwrap();

    let ledger = HashLedger::open(Some(path)).unwrap();
    assert_eq!(ledger.len(), 2);
    assert!(ledger.contains("aaaa"));
    assert!(ledger.contains("bbbb"));
}
