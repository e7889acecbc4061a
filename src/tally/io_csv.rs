// Primitives for reading CSV files.

use csv::ReaderBuilder;

use crate::tally::config_reader::VoteSource;
use crate::tally::io_common::{ColumnIndex, FieldMap};
use crate::tally::*;

/// Reads a CSV file with a header row. Each ranking is held in a single cell.
pub fn read_csv_records(
    path: &str,
    source: &VoteSource,
    fields: &FieldMap,
) -> TallyResult<Vec<VoteRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let header: Vec<String> = rdr
        .headers()
        .context(CsvOpenSnafu { path })?
        .iter()
        .map(|h| h.to_string())
        .collect();
    debug!("read_csv_records: header: {:?}", header);
    let columns = ColumnIndex::locate(&header, path, fields)?;
    let delimiter = source.ranking_delimiter();

    let mut res: Vec<VoteRecord> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        let cells: Vec<String> = line.iter().map(|s| s.to_string()).collect();
        let record = columns.read_record(&cells, delimiter);
        debug!("read_csv_records: lineno: {:?} record: {:?}", lineno, record);
        res.push(record);
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> FieldMap {
        FieldMap {
            voter_field: "voter_name".to_string(),
            question_fields: vec![("wealth".to_string(), "wealth_rank".to_string())],
        }
    }

    fn source(path: &str, delimiter: Option<&str>) -> VoteSource {
        VoteSource {
            provider: "csv".to_string(),
            file_path: path.to_string(),
            excel_worksheet_name: None,
            ranking_delimiter: delimiter.map(|d| d.to_string()),
        }
    }

    #[test]
    fn reads_rankings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("responses.csv").display().to_string();
        fs::write(
            &path,
            "voter_name,wealth_rank\nA,A|B\n,B\nB,\nC,\"A|B|C\",extra\n",
        )
        .unwrap();
        let records = read_csv_records(&path, &source(&path, Some("|")), &fields()).unwrap();
        assert_eq!(
            records,
            vec![
                VoteRecord::new(Some("A")).with_answer("wealth", &["A", "B"]),
                VoteRecord::new(None).with_answer("wealth", &["B"]),
                VoteRecord::new(Some("B")),
                VoteRecord::new(Some("C")).with_answer("wealth", &["A", "B", "C"]),
            ]
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let res = read_csv_records("/nonexistent/responses.csv", &source("", None), &fields());
        assert!(matches!(res, Err(TallyError::CsvOpen { .. })));
    }
}
