use crate::domain::model::{Encoding, RawRow};
use crate::utils::error::{Result, SantaError};
use calamine::{Data, Reader, Xlsx};
use csv::ReaderBuilder;
use std::io::Cursor;

/// Decode file contents into header-keyed rows. Every row carries every
/// header; cells missing on a given row read as `""`. Rows whose cells are
/// all empty are kept, so a written table reads back with the same row count.
/// An empty data section is not an error.
pub fn parse(encoding: Encoding, contents: &[u8]) -> Result<Vec<RawRow>> {
    let rows = match encoding {
        Encoding::Csv => parse_csv(contents)?,
        Encoding::Xlsx => parse_xlsx(contents)?,
    };
    tracing::debug!("Parsed {} data rows from {} input", rows.len(), encoding);
    Ok(rows)
}

fn csv_error(message: impl ToString) -> SantaError {
    SantaError::ParseError {
        encoding: Encoding::Csv.label().to_string(),
        message: message.to_string(),
    }
}

fn xlsx_error(message: impl ToString) -> SantaError {
    SantaError::ParseError {
        encoding: Encoding::Xlsx.label().to_string(),
        message: message.to_string(),
    }
}

fn parse_csv(contents: &[u8]) -> Result<Vec<RawRow>> {
    let text = std::str::from_utf8(contents).map_err(csv_error)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // 允許行長度不一致，缺少的欄位視為空字串
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        let row: RawRow = headers
            .iter()
            .enumerate()
            .filter(|(_, header)| !header.is_empty())
            .map(|(idx, header)| (header.clone(), record.get(idx).unwrap_or("").to_string()))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

fn cell_text(cell: Option<&Data>) -> String {
    match cell {
        Some(Data::Empty) | None => String::new(),
        Some(cell) => cell.to_string(),
    }
}

fn parse_xlsx(contents: &[u8]) -> Result<Vec<RawRow>> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(contents)).map_err(xlsx_error)?;

    // 只讀第一個工作表（依位置，不依名稱）
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| xlsx_error("workbook contains no worksheets"))?
        .map_err(xlsx_error)?;

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = match sheet_rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|cell| cell_text(Some(cell)).trim().to_string())
            .collect(),
        None => return Ok(Vec::new()),
    };

    let rows = sheet_rows
        .map(|data_row| {
            headers
                .iter()
                .enumerate()
                .filter(|(_, header)| !header.is_empty())
                .map(|(idx, header)| (header.clone(), cell_text(data_row.get(idx))))
                .collect::<RawRow>()
        })
        .collect();

    Ok(rows)
}
