//! Minimal SpreadsheetML package writer: one worksheet of text cells, shared
//! string table, optional fixed column widths.

use crate::domain::model::Encoding;
use crate::utils::error::{Result, SantaError};
use std::collections::HashMap;
use std::io::{Cursor, Write};
use zip::write::{SimpleFileOptions, ZipWriter};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;

const SPREADSHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const RELATIONSHIP_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Display widths in character units, one per column. Empty means default.
    pub column_widths: Vec<f64>,
}

fn serialize_error(message: impl ToString) -> SantaError {
    SantaError::SerializeError {
        encoding: Encoding::Xlsx.label().to_string(),
        message: message.to_string(),
    }
}

/// 0 -> A, 25 -> Z, 26 -> AA
pub(crate) fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{fffe}' && c != '\u{ffff}')
}

fn escape_xml(value: &str) -> Result<String> {
    if let Some(bad) = value.chars().find(|c| !is_xml_char(*c)) {
        return Err(serialize_error(format!(
            "value {:?} contains character U+{:04X} which cannot be stored in a worksheet",
            value, bad as u32
        )));
    }

    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    Ok(escaped)
}

#[derive(Default)]
struct SharedStrings {
    index: HashMap<String, usize>,
    values: Vec<String>,
    references: usize,
}

impl SharedStrings {
    fn intern(&mut self, value: &str) -> usize {
        self.references += 1;
        if let Some(idx) = self.index.get(value) {
            return *idx;
        }
        let idx = self.values.len();
        self.values.push(value.to_string());
        self.index.insert(value.to_string(), idx);
        idx
    }

    fn to_xml(&self) -> Result<String> {
        let mut xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="{}" count="{}" uniqueCount="{}">"#,
            SPREADSHEET_NS,
            self.references,
            self.values.len()
        );
        for value in &self.values {
            xml.push_str(r#"<si><t xml:space="preserve">"#);
            xml.push_str(&escape_xml(value)?);
            xml.push_str("</t></si>");
        }
        xml.push_str("</sst>");
        Ok(xml)
    }
}

fn workbook_xml(sheet_name: &str) -> Result<String> {
    Ok(format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{}" xmlns:r="{}"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        SPREADSHEET_NS,
        RELATIONSHIP_NS,
        escape_xml(sheet_name)?
    ))
}

fn worksheet_xml(sheet: &Sheet, strings: &mut SharedStrings) -> String {
    let width = sheet
        .rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(sheet.headers.len()))
        .max()
        .unwrap_or(0)
        .max(1);
    let height = sheet.rows.len() + 1;

    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="{}" xmlns:r="{}"><dimension ref="A1:{}{}"/>"#,
        SPREADSHEET_NS,
        RELATIONSHIP_NS,
        column_name(width - 1),
        height
    );

    if !sheet.column_widths.is_empty() {
        xml.push_str("<cols>");
        for (idx, w) in sheet.column_widths.iter().enumerate() {
            xml.push_str(&format!(
                r#"<col min="{0}" max="{0}" width="{1}" customWidth="1"/>"#,
                idx + 1,
                w
            ));
        }
        xml.push_str("</cols>");
    }

    xml.push_str("<sheetData>");
    let all_rows = std::iter::once(&sheet.headers).chain(sheet.rows.iter());
    for (row_idx, cells) in all_rows.enumerate() {
        xml.push_str(&format!(r#"<row r="{}">"#, row_idx + 1));
        // 空字串也寫成儲存格，全空的列才會留在工作表範圍內
        for (col_idx, value) in cells.iter().enumerate() {
            xml.push_str(&format!(
                r#"<c r="{}{}" t="s"><v>{}</v></c>"#,
                column_name(col_idx),
                row_idx + 1,
                strings.intern(value)
            ));
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

/// Build a complete `.xlsx` package holding `sheet` as its only worksheet.
pub fn write_workbook(sheet: &Sheet) -> Result<Vec<u8>> {
    let mut strings = SharedStrings::default();
    let worksheet = worksheet_xml(sheet, &mut strings);
    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("xl/workbook.xml", workbook_xml(&sheet.name)?),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.to_string()),
        ("xl/styles.xml", STYLES.to_string()),
        ("xl/sharedStrings.xml", strings.to_xml()?),
        ("xl/worksheets/sheet1.xml", worksheet),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (path, content) in parts {
        zip.start_file(path, SimpleFileOptions::default())
            .map_err(serialize_error)?;
        zip.write_all(content.as_bytes()).map_err(serialize_error)?;
    }

    let cursor = zip.finish().map_err(serialize_error)?;
    Ok(cursor.into_inner())
}
