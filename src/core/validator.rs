use crate::domain::model::{
    Assignment, AssignmentSet, Employee, RawRow, Roster, EMPLOYEE_EMAIL, EMPLOYEE_NAME,
    SECRET_CHILD_EMAIL, SECRET_CHILD_NAME,
};
use crate::utils::error::{Result, SantaError};
use regex::Regex;
use std::sync::LazyLock;

pub const MIN_ROSTER_SIZE: usize = 2;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern is a valid regex")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Outcome of a successful validation, with per-reason rejection counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterReport {
    pub roster: Roster,
    pub total_rows: usize,
    pub incomplete_rows: usize,
    pub invalid_emails: Vec<String>,
}

pub struct RosterValidator;

impl RosterValidator {
    pub fn validate(rows: &[RawRow]) -> Result<Roster> {
        Self::validate_with_report(rows).map(|report| report.roster)
    }

    pub fn validate_with_report(rows: &[RawRow]) -> Result<RosterReport> {
        check_headers(rows, &[EMPLOYEE_NAME, EMPLOYEE_EMAIL])?;

        let employees: Vec<Employee> = rows
            .iter()
            .filter_map(|row| match (row.get(EMPLOYEE_NAME), row.get(EMPLOYEE_EMAIL)) {
                (Some(name), Some(email)) if !name.is_empty() && !email.is_empty() => {
                    Some(Employee::new(name, email))
                }
                _ => None,
            })
            .collect();
        let incomplete_rows = rows.len() - employees.len();

        let (roster, rejected): (Vec<Employee>, Vec<Employee>) = employees
            .into_iter()
            .partition(|employee| is_valid_email(&employee.email));
        let invalid_emails: Vec<String> = rejected.into_iter().map(|e| e.email).collect();

        tracing::info!(
            "Validated roster: {} rows, {} accepted, {} incomplete, {} invalid emails",
            rows.len(),
            roster.len(),
            incomplete_rows,
            invalid_emails.len()
        );
        if !invalid_emails.is_empty() {
            tracing::debug!("Rejected email addresses: {:?}", invalid_emails);
        }

        if roster.len() < MIN_ROSTER_SIZE {
            return Err(SantaError::CardinalityError {
                found: roster.len(),
                required: MIN_ROSTER_SIZE,
            });
        }

        Ok(RosterReport {
            roster,
            total_rows: rows.len(),
            incomplete_rows,
            invalid_emails,
        })
    }
}

/// 只看第一列的欄位集合；沒有任何資料列時同樣視為缺欄
fn check_headers(rows: &[RawRow], required: &[&str]) -> Result<()> {
    let missing: Vec<String> = match rows.first() {
        Some(first) => required
            .iter()
            .filter(|column| !first.has_column(column))
            .map(|column| column.to_string())
            .collect(),
        None => required.iter().map(|column| column.to_string()).collect(),
    };

    if missing.is_empty() {
        return Ok(());
    }

    Err(SantaError::SchemaError {
        required: required.iter().map(|column| column.to_string()).collect(),
        missing,
    })
}

/// Rebuild an assignment set from rows of a previously exported file.
pub fn read_assignments(rows: &[RawRow]) -> Result<AssignmentSet> {
    check_headers(
        rows,
        &[
            EMPLOYEE_NAME,
            EMPLOYEE_EMAIL,
            SECRET_CHILD_NAME,
            SECRET_CHILD_EMAIL,
        ],
    )?;

    let field = |row: &RawRow, column: &str| row.get(column).unwrap_or_default().to_string();
    Ok(rows
        .iter()
        .map(|row| Assignment {
            giver_name: field(row, EMPLOYEE_NAME),
            giver_email: field(row, EMPLOYEE_EMAIL),
            receiver_name: field(row, SECRET_CHILD_NAME),
            receiver_email: field(row, SECRET_CHILD_EMAIL),
        })
        .collect())
}
