use async_trait::async_trait;

use crate::tally::config_reader::VoteSource;
use crate::tally::io_common::FieldMap;
use crate::tally::*;

pub const PROVIDERS: [&str; 3] = ["json", "csv", "xlsx"];

/// Where vote records are kept.
#[async_trait(?Send)]
pub trait VoteStore {
    /// All the stored records, in storage order.
    async fn fetch_all(&self) -> TallyResult<Vec<VoteRecord>>;

    /// Stores one record. Nothing is stored when an error is returned.
    async fn submit(&self, record: &VoteRecord) -> TallyResult<()>;
}

/// Records kept in local files, in any of the [`PROVIDERS`] formats.
///
/// Submissions go to the first `json` source. The other formats are exports
/// and are only read.
pub struct FileStore {
    sources: Vec<VoteSource>,
    fields: FieldMap,
}

impl FileStore {
    pub fn new(sources: Vec<VoteSource>, fields: FieldMap) -> FileStore {
        FileStore { sources, fields }
    }
}

pub fn read_source(source: &VoteSource, fields: &FieldMap) -> TallyResult<Vec<VoteRecord>> {
    info!("Attempting to read vote file {:?}", source.file_path);
    match source.provider.as_str() {
        "json" => io_json::read_json_records(&source.file_path, fields),
        "csv" => io_csv::read_csv_records(&source.file_path, source, fields),
        "xlsx" => io_xlsx::read_xlsx_records(&source.file_path, source, fields),
        x => UnknownProviderSnafu { provider: x }.fail(),
    }
}

#[async_trait(?Send)]
impl VoteStore for FileStore {
    async fn fetch_all(&self) -> TallyResult<Vec<VoteRecord>> {
        let mut res: Vec<VoteRecord> = Vec::new();
        for source in self.sources.iter() {
            let mut records = read_source(source, &self.fields)?;
            res.append(&mut records);
        }
        Ok(res)
    }

    async fn submit(&self, record: &VoteRecord) -> TallyResult<()> {
        let target = self
            .sources
            .iter()
            .find(|s| s.provider == "json")
            .context(ReadOnlyStoreSnafu {})?;
        io_json::append_json_record(&target.file_path, record, &self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(provider: &str, path: &str) -> VoteSource {
        VoteSource {
            provider: provider.to_string(),
            file_path: path.to_string(),
            excel_worksheet_name: None,
            ranking_delimiter: None,
        }
    }

    fn fields() -> FieldMap {
        FieldMap {
            voter_field: "voter_name".to_string(),
            question_fields: vec![("wealth".to_string(), "wealth_rank".to_string())],
        }
    }

    #[tokio::test]
    async fn sources_are_concatenated() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("export.csv").display().to_string();
        let json_path = dir.path().join("responses.json").display().to_string();
        fs::write(&csv_path, "voter_name,wealth_rank\nA,A;B\n").unwrap();

        let store = FileStore::new(
            vec![source("csv", &csv_path), source("json", &json_path)],
            fields(),
        );
        assert_eq!(store.fetch_all().await.unwrap().len(), 1);

        let record = VoteRecord::new(Some("B")).with_answer("wealth", &["B", "A"]);
        store.submit(&record).await.unwrap();
        let records = store.fetch_all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1], record);
    }

    #[tokio::test]
    async fn exports_are_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("export.csv").display().to_string();
        let store = FileStore::new(vec![source("csv", &csv_path)], fields());
        let res = store.submit(&VoteRecord::new(Some("A"))).await;
        assert!(matches!(res, Err(TallyError::ReadOnlyStore {})));
    }
}
