// Primitives for reading Excel worksheets.

use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::tally::config_reader::VoteSource;
use crate::tally::io_common::{ColumnIndex, FieldMap};
use crate::tally::*;

fn read_cell(cell: &DataType, lineno: usize) -> TallyResult<String> {
    match cell {
        DataType::String(s) => Ok(s.clone()),
        DataType::Empty => Ok(String::new()),
        _ => ExcelWrongCellTypeSnafu {
            lineno,
            content: format!("{:?}", cell),
        }
        .fail(),
    }
}

/// Reads a worksheet laid out like a CSV file: a header row, then one
/// submission per row. Only text cells are accepted.
pub fn read_xlsx_records(
    path: &str,
    source: &VoteSource,
    fields: &FieldMap,
) -> TallyResult<Vec<VoteRecord>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match source.excel_worksheet_name.as_deref() {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { path, name })?,
        None => workbook
            .worksheet_range_at(0)
            .context(MissingWorksheetSnafu {
                path,
                name: "<first>",
            })?,
    }
    .context(OpeningExcelSnafu { path })?;

    let mut rows = wrange.rows();
    let header: Vec<String> = rows
        .next()
        .context(EmptyExcelSnafu { path })?
        .iter()
        .map(|c| read_cell(c, 1))
        .collect::<TallyResult<Vec<String>>>()?;
    debug!("read_xlsx_records: header: {:?}", header);
    let columns = ColumnIndex::locate(&header, path, fields)?;
    let delimiter = source.ranking_delimiter();

    let mut res: Vec<VoteRecord> = Vec::new();
    for (idx, row) in rows.enumerate() {
        let lineno = idx + 2;
        let cells = row
            .iter()
            .map(|c| read_cell(c, lineno))
            .collect::<TallyResult<Vec<String>>>()?;
        if cells.iter().all(|c| c.trim().is_empty()) {
            debug!("read_xlsx_records: lineno {}: empty row", lineno);
            continue;
        }
        let record = columns.read_record(&cells, delimiter);
        debug!("read_xlsx_records: lineno: {:?} record: {:?}", lineno, record);
        res.push(record);
    }
    Ok(res)
}
