// Reading and appending rows of a JSON array, as exported from a hosted table.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use fs2::FileExt;
use serde_json::Map as JSMap;
use tempfile::NamedTempFile;

use crate::tally::io_common::{read_voter, FieldMap};
use crate::tally::*;

fn read_rows(path: &str) -> TallyResult<Vec<JSValue>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("read_rows: {} does not exist yet, no votes", path);
            return Ok(Vec::new());
        }
        Err(e) => return Err(e).context(OpeningJsonSnafu { path }),
    };
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    match js {
        JSValue::Array(rows) => Ok(rows),
        _ => NotAnArraySnafu { path }.fail(),
    }
}

fn read_ranking(idx: usize, field: &str, js: &JSValue) -> Option<Vec<String>> {
    match js {
        JSValue::Null => None,
        JSValue::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    JSValue::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        other => {
            warn!(
                "read_ranking: row {}: {}: expected a list of names, found {}",
                idx, field, other
            );
            None
        }
    }
}

fn read_record(idx: usize, row: &JSValue, fields: &FieldMap) -> Option<VoteRecord> {
    let obj = match row.as_object() {
        Some(obj) => obj,
        None => {
            warn!("read_record: row {} is not an object, skipping it", idx);
            return None;
        }
    };
    let mut record = VoteRecord::new(None);
    record.voter = match obj.get(&fields.voter_field) {
        Some(JSValue::String(s)) => read_voter(s),
        None | Some(JSValue::Null) => None,
        Some(other) => {
            warn!("read_record: row {}: unexpected voter {}", idx, other);
            None
        }
    };
    for (key, field) in fields.question_fields.iter() {
        if let Some(ranking) = obj.get(field).and_then(|js| read_ranking(idx, field, js)) {
            record.answers.insert(key.clone(), ranking);
        }
    }
    Some(record)
}

/// Reads all the records of a JSON source. A file that does not exist holds no
/// record.
pub fn read_json_records(path: &str, fields: &FieldMap) -> TallyResult<Vec<VoteRecord>> {
    let rows = read_rows(path)?;
    let records: Vec<VoteRecord> = rows
        .iter()
        .enumerate()
        .filter_map(|(idx, row)| read_record(idx, row, fields))
        .collect();
    debug!("read_json_records: {}: {} records", path, records.len());
    Ok(records)
}

fn record_to_row(record: &VoteRecord, fields: &FieldMap) -> JSValue {
    let mut row = JSMap::new();
    row.insert(fields.voter_field.clone(), json!(record.voter));
    for (key, field) in fields.question_fields.iter() {
        row.insert(field.clone(), json!(record.answer(key)));
    }
    JSValue::Object(row)
}

// Held for the whole read-modify-write of an append. Released when dropped.
fn lock_store(path: &str) -> TallyResult<File> {
    let lock_path = format!("{}.lock", path);
    let lock_file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(&lock_path)
        .context(LockingStoreSnafu { path: &lock_path })?;
    FileExt::lock_exclusive(&lock_file).context(LockingStoreSnafu { path: &lock_path })?;
    Ok(lock_file)
}

/// Appends one record.
///
/// Concurrent appends to the same file are serialized by an exclusive lock on
/// a sibling `.lock` file. The new content goes to a temporary file of the
/// same directory that then replaces the store, so a reader never sees a
/// partial write and a failed append leaves the store unchanged.
pub fn append_json_record(path: &str, record: &VoteRecord, fields: &FieldMap) -> TallyResult<()> {
    let _lock = lock_store(path)?;

    let mut rows = read_rows(path)?;
    rows.push(record_to_row(record, fields));
    let contents =
        serde_json::to_string_pretty(&JSValue::Array(rows)).context(SerializingJsonSnafu {})?;

    let dir = match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).context(WritingFileSnafu {
        path: dir.display().to_string(),
    })?;
    let tmp_name = tmp.path().display().to_string();
    tmp.write_all(contents.as_bytes())
        .context(WritingFileSnafu { path: &tmp_name })?;
    tmp.as_file()
        .sync_all()
        .context(WritingFileSnafu { path: &tmp_name })?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .context(WritingFileSnafu { path })?;
    debug!("append_json_record: {}: stored {:?}", path, record.voter);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> FieldMap {
        FieldMap {
            voter_field: "voter_name".to_string(),
            question_fields: vec![
                ("wealth".to_string(), "wealth_rank".to_string()),
                ("difficulty".to_string(), "difficulty_rank".to_string()),
            ],
        }
    }

    #[test]
    fn degenerate_rows_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("responses.json").display().to_string();
        let rows = json!([
            {"voter_name": "A", "wealth_rank": ["A", "B"], "difficulty_rank": null},
            {"voter_name": null, "wealth_rank": ["B"], "difficulty_rank": "oops"},
            {"voter_name": "", "wealth_rank": [], "created_at": "2024-01-01"},
            "not a row"
        ]);
        fs::write(&path, rows.to_string()).unwrap();

        let records = read_json_records(&path, &fields()).unwrap();
        assert_eq!(
            records,
            vec![
                VoteRecord::new(Some("A")).with_answer("wealth", &["A", "B"]),
                VoteRecord::new(None).with_answer("wealth", &["B"]),
                VoteRecord::new(None).with_answer("wealth", &[]),
            ]
        );
    }

    #[test]
    fn missing_file_has_no_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("responses.json").display().to_string();
        assert_eq!(read_json_records(&path, &fields()).unwrap(), vec![]);
    }

    #[test]
    fn other_documents_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("responses.json").display().to_string();
        fs::write(&path, r#"{"voter_name": "A"}"#).unwrap();
        let res = read_json_records(&path, &fields());
        assert!(matches!(res, Err(TallyError::NotAnArray { .. })));

        fs::write(&path, "[{").unwrap();
        let res = read_json_records(&path, &fields());
        assert!(matches!(res, Err(TallyError::ParsingJson { .. })));
    }

    #[test]
    fn appended_records_are_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("responses.json").display().to_string();
        let first = VoteRecord::new(Some("A")).with_answer("wealth", &["B", "A"]);
        let second = VoteRecord::new(Some("B"))
            .with_answer("wealth", &["A", "B"])
            .with_answer("difficulty", &["B", "A"]);
        append_json_record(&path, &first, &fields()).unwrap();
        append_json_record(&path, &second, &fields()).unwrap();

        assert_eq!(
            read_json_records(&path, &fields()).unwrap(),
            vec![first, second]
        );
        let stored: JSValue = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stored[0]["difficulty_rank"], JSValue::Null);

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["responses.json", "responses.json.lock"]);
    }

    #[test]
    fn concurrent_appends_keep_every_record() {
        let voters: Vec<String> = (0..8).map(|i| format!("voter{}", i)).collect();
        for _round in 0..10 {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("responses.json").display().to_string();
            let barrier = std::sync::Arc::new(std::sync::Barrier::new(voters.len()));
            let handles: Vec<_> = voters
                .iter()
                .map(|voter| {
                    let path = path.clone();
                    let voter = voter.clone();
                    let barrier = barrier.clone();
                    std::thread::spawn(move || {
                        let record =
                            VoteRecord::new(Some(voter.as_str())).with_answer("wealth", &["A", "B"]);
                        barrier.wait();
                        append_json_record(&path, &record, &fields()).is_ok()
                    })
                })
                .collect();
            for handle in handles {
                assert!(handle.join().unwrap());
            }

            let mut stored: Vec<String> = read_json_records(&path, &fields())
                .unwrap()
                .into_iter()
                .filter_map(|r| r.voter)
                .collect();
            stored.sort();
            assert_eq!(stored, voters);
        }
    }
}
