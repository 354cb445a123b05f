use crate::core::xlsx::{write_workbook, Sheet};
use crate::domain::model::{
    Artifact, Assignment, Employee, Encoding, EMPLOYEE_EMAIL, EMPLOYEE_NAME, SECRET_CHILD_EMAIL,
    SECRET_CHILD_NAME,
};
use crate::utils::error::{Result, SantaError};
use csv::WriterBuilder;

pub const ASSIGNMENT_HEADERS: [&str; 4] = [
    EMPLOYEE_NAME,
    EMPLOYEE_EMAIL,
    SECRET_CHILD_NAME,
    SECRET_CHILD_EMAIL,
];
pub const ASSIGNMENT_COLUMN_WIDTHS: [f64; 4] = [20.0, 30.0, 20.0, 30.0];
pub const ASSIGNMENT_SHEET_NAME: &str = "Assignments";

pub const ROSTER_HEADERS: [&str; 2] = [EMPLOYEE_NAME, EMPLOYEE_EMAIL];
pub const ROSTER_COLUMN_WIDTHS: [f64; 2] = [20.0, 30.0];
pub const ROSTER_SHEET_NAME: &str = "Employees";

pub fn assignments_file_name(encoding: Encoding, year: i32) -> String {
    format!("secret_santa_assignments_{}.{}", year, encoding.extension())
}

pub fn roster_file_name(encoding: Encoding, year: i32) -> String {
    format!("secret_santa_employees_{}.{}", year, encoding.extension())
}

/// Export rows in the fixed column order; givers fill the `Employee_*`
/// columns and receivers the `Secret_Child_*` ones.
fn assignment_rows(assignments: &[Assignment]) -> Vec<Vec<String>> {
    assignments
        .iter()
        .map(|a| {
            vec![
                a.giver_name.clone(),
                a.giver_email.clone(),
                a.receiver_name.clone(),
                a.receiver_email.clone(),
            ]
        })
        .collect()
}

fn roster_rows(roster: &[Employee]) -> Vec<Vec<String>> {
    roster
        .iter()
        .map(|e| vec![e.name.clone(), e.email.clone()])
        .collect()
}

fn write_csv(headers: &[&str], rows: &[Vec<String>]) -> Result<Vec<u8>> {
    let csv_error = |e: &dyn std::fmt::Display| SantaError::SerializeError {
        encoding: Encoding::Csv.label().to_string(),
        message: e.to_string(),
    };

    // 表頭一律寫出，即使沒有資料列
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(headers).map_err(|e| csv_error(&e))?;
    for row in rows {
        writer.write_record(row).map_err(|e| csv_error(&e))?;
    }
    writer.into_inner().map_err(|e| csv_error(&e))
}

fn serialize_table(
    encoding: Encoding,
    sheet_name: &str,
    headers: &[&str],
    widths: &[f64],
    rows: Vec<Vec<String>>,
) -> Result<Vec<u8>> {
    match encoding {
        Encoding::Csv => write_csv(headers, &rows),
        Encoding::Xlsx => write_workbook(&Sheet {
            name: sheet_name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
            column_widths: widths.to_vec(),
        }),
    }
}

pub struct ExportSerializer;

impl ExportSerializer {
    pub fn serialize(encoding: Encoding, assignments: &[Assignment], year: i32) -> Result<Artifact> {
        let bytes = serialize_table(
            encoding,
            ASSIGNMENT_SHEET_NAME,
            &ASSIGNMENT_HEADERS,
            &ASSIGNMENT_COLUMN_WIDTHS,
            assignment_rows(assignments),
        )?;

        let artifact = Artifact {
            encoding,
            file_name: assignments_file_name(encoding, year),
            bytes,
        };
        tracing::debug!(
            "Serialized {} assignments to {} ({} bytes)",
            assignments.len(),
            artifact.file_name,
            artifact.bytes.len()
        );
        Ok(artifact)
    }

    /// Write a roster back out using the upload column names, so the file
    /// can be fed straight back through the upload path.
    pub fn serialize_roster(encoding: Encoding, roster: &[Employee], year: i32) -> Result<Artifact> {
        let bytes = serialize_table(
            encoding,
            ROSTER_SHEET_NAME,
            &ROSTER_HEADERS,
            &ROSTER_COLUMN_WIDTHS,
            roster_rows(roster),
        )?;

        Ok(Artifact {
            encoding,
            file_name: roster_file_name(encoding, year),
            bytes,
        })
    }
}
