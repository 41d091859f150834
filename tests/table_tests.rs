//! Tests for the Table
//!
//! These tests verify:
//! - Open/close lifecycle and existence checks
//! - Basic CRUD operations
//! - Entry size limits
//! - Dump and reopen persistence
//! - Corrupt or inconsistent files are rejected

use std::cmp::Ordering;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use huffkv::codec::HuffmanCodec;
use huffkv::{Comparator, Options, Table};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_table() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.tbl");
    (temp_dir, path)
}

fn create_options() -> Options {
    Options::builder()
        .create_if_missing(true)
        .dump_when_close(true)
        .level_seed(7)
        .build()
}

fn open_table(path: &PathBuf, options: Options) -> Table {
    let table = Table::new(options, path);
    table.open().unwrap();
    table
}

struct Descending;

impl Comparator for Descending {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        b.cmp(a)
    }

    fn name(&self) -> &'static str {
        "test.Descending"
    }
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_open_missing_without_create() {
    let (_temp, path) = setup_temp_table();
    let table = Table::new(Options::default(), &path);

    let err = table.open().unwrap_err();
    assert!(err.is_io_error());
    assert!(!table.is_open());
    assert!(!path.exists());
}

#[test]
fn test_open_creates_file() {
    let (_temp, path) = setup_temp_table();
    let table = open_table(&path, create_options());

    assert!(table.is_open());
    assert!(path.exists());
    assert!(table.is_empty().unwrap());
}

#[test]
fn test_error_if_exists() {
    let (_temp, path) = setup_temp_table();
    fs::write(&path, b"").unwrap();

    let options = Options::builder()
        .create_if_missing(true)
        .error_if_exists(true)
        .build();
    let table = Table::new(options, &path);
    assert!(table.open().unwrap_err().is_io_error());
    assert!(!table.is_open());
}

#[test]
fn test_double_open_keeps_state() {
    let (_temp, path) = setup_temp_table();
    let table = open_table(&path, create_options());
    table.put(b"key", b"value").unwrap();

    assert!(table.open().unwrap_err().is_invalid_operation());
    assert_eq!(table.get(b"key").unwrap(), b"value");
}

#[test]
fn test_double_close() {
    let (_temp, path) = setup_temp_table();
    let table = open_table(&path, create_options());

    table.close().unwrap();
    assert!(!table.is_open());
    assert!(table.close().unwrap_err().is_invalid_operation());
}

#[test]
fn test_operations_on_closed_table() {
    let (_temp, path) = setup_temp_table();
    let table = Table::new(create_options(), &path);

    assert!(table.get(b"k").unwrap_err().is_invalid_operation());
    assert!(table.put(b"k", b"v").unwrap_err().is_invalid_operation());
    assert!(table.del(b"k").unwrap_err().is_invalid_operation());
    assert!(table.dump().unwrap_err().is_invalid_operation());
    assert!(table.contains(b"k").unwrap_err().is_invalid_operation());
    assert!(table.entries().unwrap_err().is_invalid_operation());
}

#[test]
fn test_codebook_path() {
    let (_temp, path) = setup_temp_table();
    let table = Table::new(create_options(), &path);

    let expected = PathBuf::from(format!("{}.huffman_code", path.display()));
    assert_eq!(table.codebook_path(), expected.as_path());
    assert_eq!(table.path(), path.as_path());
}

// =============================================================================
// CRUD Tests
// =============================================================================

#[test]
fn test_put_update_delete() {
    let (_temp, path) = setup_temp_table();
    let table = open_table(&path, create_options());

    table.put(b"key", b"value").unwrap();
    assert_eq!(table.get(b"key").unwrap(), b"value");

    table.put(b"key", b"new-value").unwrap();
    assert_eq!(table.get(b"key").unwrap(), b"new-value");
    assert_eq!(table.len().unwrap(), 1);

    // Same value again is accepted
    table.put(b"key", b"new-value").unwrap();
    assert_eq!(table.get(b"key").unwrap(), b"new-value");

    table.del(b"key").unwrap();
    assert!(table.get(b"key").unwrap_err().is_not_found());
    assert!(!table.contains(b"key").unwrap());
}

#[test]
fn test_delete_missing_key() {
    let (_temp, path) = setup_temp_table();
    let table = open_table(&path, create_options());
    assert!(table.del(b"missing").unwrap_err().is_not_found());
}

#[test]
fn test_entries_in_key_order() {
    let (_temp, path) = setup_temp_table();
    let table = open_table(&path, create_options());

    for key in [b"c", b"a", b"d", b"b"] {
        table.put(key, key).unwrap();
    }
    let keys: Vec<Vec<u8>> = table.entries().unwrap().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec(), b"d".to_vec()]);
}

#[test]
fn test_max_file_size_rejects_entry() {
    let (_temp, path) = setup_temp_table();
    let options = Options::builder()
        .create_if_missing(true)
        .max_file_size(1)
        .build();
    let table = open_table(&path, options);

    let err = table.put(b"key", b"value").unwrap_err();
    assert!(err.is_invalid_operation());
    assert!(table.get(b"key").unwrap_err().is_not_found());
    assert!(table.is_empty().unwrap());
}

#[test]
fn test_entry_exactly_at_limit() {
    let (_temp, path) = setup_temp_table();
    let options = Options::builder()
        .create_if_missing(true)
        .max_file_size(2 + 3 + 5)
        .build();
    let table = open_table(&path, options);

    table.put(b"key", b"value").unwrap();
    assert!(table.put(b"key", b"value!").unwrap_err().is_invalid_operation());
    assert_eq!(table.get(b"key").unwrap(), b"value");
}

#[test]
fn test_over_long_fields_rejected() {
    let (_temp, path) = setup_temp_table();
    let table = open_table(&path, create_options());

    let long = vec![b'x'; 256];
    assert!(table.put(&long, b"v").unwrap_err().is_invalid_operation());
    assert!(table.put(b"k", &long).unwrap_err().is_invalid_operation());
    assert!(table.is_empty().unwrap());
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_dump_and_reopen() {
    let (_temp, path) = setup_temp_table();
    {
        let table = open_table(&path, create_options());
        table.put(b"apple", b"red").unwrap();
        table.put(b"banana", b"yellow").unwrap();
        table.put(b"cherry", b"dark red").unwrap();
        table.close().unwrap();
    }

    let table = Table::new(create_options(), &path);
    assert!(table.codebook_path().exists());
    table.open().unwrap();

    assert_eq!(table.len().unwrap(), 3);
    assert_eq!(table.get(b"apple").unwrap(), b"red");
    assert_eq!(table.get(b"banana").unwrap(), b"yellow");
    assert_eq!(table.get(b"cherry").unwrap(), b"dark red");
    assert!(!table.codebook().unwrap().is_empty());
}

#[test]
fn test_explicit_dump_keeps_table_open() {
    let (_temp, path) = setup_temp_table();
    let table = open_table(&path, create_options());
    table.put(b"key", b"value").unwrap();
    table.dump().unwrap();

    assert!(table.is_open());
    assert!(fs::metadata(&path).unwrap().len() > 0);
    assert_eq!(table.get(b"key").unwrap(), b"value");
}

#[test]
fn test_close_without_dump_discards_changes() {
    let (_temp, path) = setup_temp_table();
    let options = Options::builder()
        .create_if_missing(true)
        .dump_when_close(false)
        .build();
    {
        let table = open_table(&path, options.clone());
        table.put(b"key", b"value").unwrap();
        table.close().unwrap();
    }

    let table = open_table(&path, options);
    assert!(table.get(b"key").unwrap_err().is_not_found());
}

#[test]
fn test_drop_dumps_open_table() {
    let (_temp, path) = setup_temp_table();
    {
        let table = open_table(&path, create_options());
        table.put(b"key", b"value").unwrap();
    }

    let table = open_table(&path, create_options());
    assert_eq!(table.get(b"key").unwrap(), b"value");
}

#[test]
fn test_deletes_persist() {
    let (_temp, path) = setup_temp_table();
    {
        let table = open_table(&path, create_options());
        table.put(b"keep", b"1").unwrap();
        table.put(b"drop", b"2").unwrap();
        table.close().unwrap();
    }
    {
        let table = open_table(&path, create_options());
        table.del(b"drop").unwrap();
        table.close().unwrap();
    }

    let table = open_table(&path, create_options());
    assert_eq!(table.get(b"keep").unwrap(), b"1");
    assert!(table.get(b"drop").unwrap_err().is_not_found());
}

#[test]
fn test_empty_and_binary_fields() {
    let (_temp, path) = setup_temp_table();
    let binary: Vec<u8> = (0..=u8::MAX).rev().take(100).collect();
    {
        let table = open_table(&path, create_options());
        table.put(b"", b"").unwrap();
        table.put(b"empty", b"").unwrap();
        table.put(&binary, b"\x00\n\r \xff").unwrap();
        table.close().unwrap();
    }

    let table = open_table(&path, create_options());
    assert_eq!(table.get(b"").unwrap(), b"");
    assert_eq!(table.get(b"empty").unwrap(), b"");
    assert_eq!(table.get(&binary).unwrap(), b"\x00\n\r \xff");
}

#[test]
fn test_only_empty_fields_roundtrip() {
    let (_temp, path) = setup_temp_table();
    {
        let table = open_table(&path, create_options());
        table.put(b"", b"").unwrap();
        table.close().unwrap();
    }
    assert_eq!(fs::read(&path).unwrap(), vec![0, 0]);

    let table = open_table(&path, create_options());
    assert_eq!(table.len().unwrap(), 1);
    assert_eq!(table.get(b"").unwrap(), b"");
}

#[test]
fn test_empty_table_dump() {
    let (_temp, path) = setup_temp_table();
    {
        let table = open_table(&path, create_options());
        table.close().unwrap();
    }
    assert_eq!(fs::metadata(&path).unwrap().len(), 0);

    let table = open_table(&path, create_options());
    assert!(table.is_empty().unwrap());
}

#[test]
fn test_custom_comparator_persists() {
    let (_temp, path) = setup_temp_table();
    let options = Options::builder()
        .create_if_missing(true)
        .comparator(Arc::new(Descending))
        .build();
    {
        let table = open_table(&path, options.clone());
        for key in [b"a", b"c", b"b"] {
            table.put(key, b"v").unwrap();
        }
        table.close().unwrap();
    }

    let table = open_table(&path, options);
    let keys: Vec<Vec<u8>> = table.entries().unwrap().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![b"c".to_vec(), b"b".to_vec(), b"a".to_vec()]);
}

// =============================================================================
// Dump Failure Tests
// =============================================================================

#[test]
fn test_failed_dump_keeps_table_open() {
    let (_temp, path) = setup_temp_table();
    let table = open_table(&path, create_options());
    table.put(b"seed", b"s").unwrap();
    table.dump().unwrap();
    let data_before = fs::read(&path).unwrap();
    let codebook_before = fs::read(table.codebook_path()).unwrap();

    let value: Vec<u8> = (0..200u8).collect();
    for i in 0..2000 {
        table.put(format!("key{:04}", i).as_bytes(), &value).unwrap();
    }
    // 0xff is rare enough that 255 of them encode past the length prefix
    let rare_key = vec![0xffu8; 255];
    table.put(&rare_key, b"v").unwrap();

    assert!(table.dump().unwrap_err().is_invalid_operation());
    assert!(table.close().unwrap_err().is_invalid_operation());
    assert!(table.is_open());

    // Neither file was touched by the failed dumps
    assert_eq!(fs::read(&path).unwrap(), data_before);
    assert_eq!(fs::read(table.codebook_path()).unwrap(), codebook_before);

    table.del(&rare_key).unwrap();
    table.close().unwrap();
    assert!(!table.is_open());

    let table = open_table(&path, create_options());
    assert_eq!(table.len().unwrap(), 2001);
    assert_eq!(table.get(b"key1999").unwrap(), value);
    assert!(table.get(&rare_key).unwrap_err().is_not_found());
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_duplicate_entries_rejected() {
    let (_temp, path) = setup_temp_table();
    let table = Table::new(create_options(), &path);

    let mut codec = HuffmanCodec::new();
    codec.observe(b"kv");
    codec.build().unwrap();
    codec.save(table.codebook_path()).unwrap();

    let mut data = Vec::new();
    for _ in 0..2 {
        for field in [&b"k"[..], &b"v"[..]] {
            let encoded = codec.encode(field).unwrap();
            data.push(encoded.len() as u8);
            data.extend_from_slice(&encoded);
        }
    }
    fs::write(&path, &data).unwrap();

    assert!(table.open().unwrap_err().is_invalid_operation());
    assert!(!table.is_open());
}

#[test]
fn test_truncated_data_file() {
    let (_temp, path) = setup_temp_table();
    {
        let table = open_table(&path, create_options());
        table.put(b"key", b"value").unwrap();
        table.close().unwrap();
    }

    let mut data = fs::read(&path).unwrap();
    data.pop();
    fs::write(&path, &data).unwrap();

    let table = Table::new(create_options(), &path);
    assert!(table.open().unwrap_err().is_io_error());
    assert!(!table.is_open());
}

#[test]
fn test_missing_codebook() {
    let (_temp, path) = setup_temp_table();
    let codebook_path = {
        let table = open_table(&path, create_options());
        table.put(b"key", b"value").unwrap();
        table.close().unwrap();
        table.codebook_path().to_path_buf()
    };
    fs::remove_file(&codebook_path).unwrap();

    let table = Table::new(create_options(), &path);
    assert!(table.open().unwrap_err().is_io_error());
}
