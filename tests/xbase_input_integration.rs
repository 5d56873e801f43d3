//! # XBase Input Integration Tests
//!
//! Multi-file reading through the item reader: file masks, compression,
//! generated columns, row limits and serialized configuration.

pub mod common;

use std::{
    fs::{self, File},
    io::Write,
    path::Path,
};

use anyhow::Result;
use common::Table;
use flate2::{Compression, write::GzEncoder};
use tempfile::TempDir;
use xbase_batch_rs::{
    BatchError,
    core::item::ItemReader,
    item::xbase::{
        field::ValueType,
        file_list::FileSpec,
        value::{Row, Value},
        xbase_item_reader::{XBaseInputConfig, XBaseItemReader, XBaseItemReaderBuilder},
    },
};
use zip::{ZipWriter, write::SimpleFileOptions};

fn orders(ids: &[&str]) -> Table {
    ids.iter().fold(
        Table::new().numeric("ID", 6, 0).character("CITY", 10),
        |table, id| table.row(&[*id, "Lyon"]),
    )
}

fn read_all(reader: &XBaseItemReader) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    while let Some(row) = reader.read()? {
        rows.push(row);
    }
    Ok(rows)
}

fn ids(rows: &[Row]) -> Vec<f64> {
    rows.iter()
        .filter_map(|row| row[0].as_ref().and_then(Value::as_f64))
        .collect()
}

fn write_gzip(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut encoder = GzEncoder::new(File::create(path)?, Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()?;
    Ok(())
}

fn write_zip(path: &Path, entries: &[(&str, Option<&[u8]>)]) -> Result<()> {
    let mut writer = ZipWriter::new(File::create(path)?);
    for (name, content) in entries {
        match content {
            Some(content) => {
                writer.start_file(*name, SimpleFileOptions::default())?;
                writer.write_all(content)?;
            }
            None => writer.add_directory(*name, SimpleFileOptions::default())?,
        }
    }
    writer.finish()?;
    Ok(())
}

#[test]
fn should_read_every_matching_file_of_a_directory_tree() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new()?;
    fs::create_dir(dir.path().join("archive"))?;

    orders(&["1", "2"]).write_to(&dir.path().join("2024_01.dbf"))?;
    orders(&["3"]).write_to(&dir.path().join("2024_02.DBF"))?;
    orders(&["4"]).write_to(&dir.path().join("archive").join("2023_12.dbf"))?;
    orders(&["99"]).write_to(&dir.path().join("scratch.dbf"))?;
    fs::write(dir.path().join("notes.txt"), "not a table")?;

    let reader = XBaseItemReaderBuilder::new()
        .file(
            FileSpec::new(dir.path())
                .mask(r"(?i)\d{4}_\d{2}\.dbf")
                .exclude_mask("scratch.*")
                .include_subfolders(true)
                .required(true),
        )
        .build()?;

    let rows = read_all(&reader)?;

    assert_eq!(ids(&rows), vec![1.0, 2.0, 3.0, 4.0]);
    assert!(!reader.has_error());
    Ok(())
}

#[test]
fn should_read_gzip_compressed_files() -> Result<()> {
    let dir = TempDir::new()?;
    let first = dir.path().join("a.dbf.gz");
    let second = dir.path().join("b.dbf.gz");
    write_gzip(&first, &orders(&["1", "2"]).bytes())?;
    write_gzip(&second, &orders(&["3"]).bytes())?;

    let reader = XBaseItemReaderBuilder::new()
        .path(&first)
        .path(&second)
        .compression("GZip")
        .build()?;

    assert_eq!(ids(&read_all(&reader)?), vec![1.0, 2.0, 3.0]);
    Ok(())
}

#[test]
fn should_read_first_entry_of_zip_archives() -> Result<()> {
    let dir = TempDir::new()?;
    let archive = dir.path().join("orders.zip");
    let table = orders(&["7", "8"]).bytes();
    let other = orders(&["9"]).bytes();
    write_zip(
        &archive,
        &[
            ("tables/", None),
            ("tables/orders.dbf", Some(table.as_slice())),
            ("tables/other.dbf", Some(other.as_slice())),
        ],
    )?;

    let reader = XBaseItemReaderBuilder::new()
        .path(&archive)
        .compression("zip")
        .build()?;

    assert_eq!(ids(&read_all(&reader)?), vec![7.0, 8.0]);
    Ok(())
}

#[test]
fn empty_zip_archive_should_fail_build() -> Result<()> {
    let dir = TempDir::new()?;
    let archive = dir.path().join("empty.zip");
    write_zip(&archive, &[])?;

    let result = XBaseItemReaderBuilder::new()
        .path(&archive)
        .compression("Zip")
        .build();

    match result {
        Err(BatchError::File { source, .. }) => {
            assert!(matches!(*source, BatchError::Compression(_)))
        }
        Err(other) => panic!("expected a file error, got {}", other),
        Ok(_) => panic!("expected a file error"),
    }
    Ok(())
}

#[test]
fn unknown_compression_should_fail_build() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("a.dbf");
    orders(&["1"]).write_to(&path)?;

    let result = XBaseItemReaderBuilder::new()
        .path(&path)
        .compression("Snappy")
        .build();

    assert!(matches!(result, Err(BatchError::File { .. })));
    Ok(())
}

#[test]
fn missing_required_file_should_fail_build() -> Result<()> {
    let dir = TempDir::new()?;

    let result = XBaseItemReaderBuilder::new()
        .path(dir.path().join("missing.dbf"))
        .build();

    assert!(matches!(result, Err(BatchError::Configuration(_))));
    Ok(())
}

#[test]
fn optional_missing_file_should_be_ignored() -> Result<()> {
    let dir = TempDir::new()?;
    let present = dir.path().join("present.dbf");
    orders(&["5"]).write_to(&present)?;

    let reader = XBaseItemReaderBuilder::new()
        .file(FileSpec::new(dir.path().join("missing.dbf")))
        .file(FileSpec::new(&present))
        .build()?;

    assert_eq!(ids(&read_all(&reader)?), vec![5.0]);
    Ok(())
}

#[test]
fn should_add_generated_columns_and_stop_at_limit() -> Result<()> {
    let dir = TempDir::new()?;
    let first = dir.path().join("a.dbf");
    let second = dir.path().join("b.dbf");
    orders(&["1", "2"]).write_to(&first)?;
    orders(&["3", "4"]).write_to(&second)?;

    let reader = XBaseItemReaderBuilder::new()
        .path(&first)
        .path(&second)
        .filename_field("filename")
        .rownr_field("rownr")
        .row_limit(3)
        .build()?;

    let fields: Vec<(&str, ValueType)> = reader
        .fields()
        .iter()
        .map(|f| (f.name.as_str(), f.value_type))
        .collect();
    assert_eq!(
        fields,
        vec![
            ("ID", ValueType::Number),
            ("CITY", ValueType::String),
            ("filename", ValueType::String),
            ("rownr", ValueType::Integer),
        ]
    );

    let rows = read_all(&reader)?;
    assert_eq!(rows.len(), 3);

    let json = serde_json::to_string(&rows[2])?;
    assert_eq!(
        json,
        serde_json::json!([3.0, "Lyon", second.display().to_string(), 3]).to_string()
    );
    assert!(reader.read()?.is_none());
    Ok(())
}

#[test]
fn type_conflict_between_files_should_fail_build() -> Result<()> {
    let dir = TempDir::new()?;
    let first = dir.path().join("a.dbf");
    let second = dir.path().join("b.dbf");
    orders(&["1"]).write_to(&first)?;
    Table::new()
        .character("ID", 6)
        .row(&["A-1"])
        .write_to(&second)?;

    let result = XBaseItemReaderBuilder::new()
        .path(&first)
        .path(&second)
        .build();

    assert!(matches!(result, Err(BatchError::SchemaMismatch(_))));
    Ok(())
}

#[test]
fn should_build_from_json_configuration() -> Result<()> {
    let dir = TempDir::new()?;
    let archive = dir.path().join("cities.dbf.gz");
    let table = Table::new()
        .character("CITY", 10)
        .row(&["K\u{f8}benhavn"]);
    write_gzip(&archive, &table.bytes())?;

    let config_path = dir.path().join("input.json");
    let config = XBaseInputConfig {
        files: vec![FileSpec::new(dir.path()).mask(r".*\.gz").required(true)],
        compression: Some("GZip".to_string()),
        charset: Some("utf-8".to_string()),
        row_limit: 0,
        filename_field: None,
        rownr_field: Some("line".to_string()),
    };
    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;

    let loaded = XBaseInputConfig::from_json(&fs::read_to_string(&config_path)?)?;
    assert_eq!(loaded, config);

    let reader = XBaseItemReaderBuilder::from_config(loaded).build()?;
    let rows = read_all(&reader)?;

    assert_eq!(
        rows,
        vec![vec![
            Some(Value::String("K\u{f8}benhavn".to_string())),
            Some(Value::Integer(1)),
        ]]
    );
    Ok(())
}
