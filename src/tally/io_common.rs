// Helpers shared by the vote source readers.

use crate::tally::*;

pub const DEFAULT_DELIMITER: &str = ";";

/// Where the voter name and the rankings are found in a row.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FieldMap {
    pub voter_field: String,
    /// Pairs of (question key, field name).
    pub question_fields: Vec<(String, String)>,
}

/// Splits a cell such as `LD;Berk;Egemit` into a ranking. An empty cell is an
/// empty ranking.
pub fn split_ranking(cell: &str, delimiter: &str) -> Vec<String> {
    cell.split(delimiter)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

pub fn read_voter(cell: &str) -> Option<String> {
    let voter = cell.trim();
    if voter.is_empty() {
        None
    } else {
        Some(voter.to_string())
    }
}

/// Positions of the columns of a tabular source (csv or Excel).
pub struct ColumnIndex {
    voter: usize,
    questions: Vec<(String, usize)>,
}

impl ColumnIndex {
    pub fn locate(header: &[String], path: &str, fields: &FieldMap) -> TallyResult<ColumnIndex> {
        let position = |field: &str| header.iter().position(|h| h.trim() == field);
        let voter = position(&fields.voter_field).context(MissingColumnSnafu {
            path,
            column: &fields.voter_field,
        })?;
        let mut questions = Vec::new();
        for (key, field) in fields.question_fields.iter() {
            match position(field) {
                Some(idx) => questions.push((key.clone(), idx)),
                None => debug!("locate: {}: no column {}, nobody answered {}", path, field, key),
            }
        }
        Ok(ColumnIndex { voter, questions })
    }

    pub fn read_record(&self, cells: &[String], delimiter: &str) -> VoteRecord {
        let mut record = VoteRecord::new(None);
        record.voter = cells.get(self.voter).and_then(|c| read_voter(c));
        for (key, idx) in self.questions.iter() {
            let ranking = cells
                .get(*idx)
                .map(|c| split_ranking(c, delimiter))
                .unwrap_or_default();
            if !ranking.is_empty() {
                record.answers.insert(key.clone(), ranking);
            }
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> FieldMap {
        FieldMap {
            voter_field: "voter_name".to_string(),
            question_fields: vec![
                ("wealth".to_string(), "wealth_rank".to_string()),
                ("housing".to_string(), "housing_rank".to_string()),
            ],
        }
    }

    fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn splits_rankings() {
        assert_eq!(split_ranking("LD;Berk", ";"), strings(&["LD", "Berk"]));
        assert_eq!(split_ranking(" LD | Berk ", "|"), strings(&["LD", "Berk"]));
        assert_eq!(split_ranking("", ";"), Vec::<String>::new());
        assert_eq!(split_ranking("  ", ";"), Vec::<String>::new());
    }

    #[test]
    fn reads_records_from_cells() {
        let header = strings(&["housing_rank", "when", "voter_name"]);
        let columns = ColumnIndex::locate(&header, "test.csv", &fields()).unwrap();
        let record = columns.read_record(&strings(&["B;A", "monday", " A "]), ";");
        assert_eq!(
            record,
            VoteRecord::new(Some("A")).with_answer("housing", &["B", "A"])
        );
        let record = columns.read_record(&strings(&["", "monday"]), ";");
        assert_eq!(record, VoteRecord::new(None));
    }

    #[test]
    fn voter_column_is_required() {
        let header = strings(&["wealth_rank"]);
        let res = ColumnIndex::locate(&header, "test.csv", &fields());
        assert!(matches!(res, Err(TallyError::MissingColumn { .. })));
    }
}
