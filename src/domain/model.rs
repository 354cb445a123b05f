use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub const EMPLOYEE_NAME: &str = "Employee_Name";
pub const EMPLOYEE_EMAIL: &str = "Employee_EmailID";
pub const SECRET_CHILD_NAME: &str = "Secret_Child_Name";
pub const SECRET_CHILD_EMAIL: &str = "Secret_Child_EmailID";

/// Tabular encodings accepted for upload and produced on export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Csv,
    Xlsx,
}

impl Encoding {
    pub fn extension(&self) -> &'static str {
        match self {
            Encoding::Csv => "csv",
            Encoding::Xlsx => "xlsx",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Encoding::Csv => "CSV",
            Encoding::Xlsx => "XLSX",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Encoding::Csv),
            "xlsx" => Ok(Encoding::Xlsx),
            other => Err(format!("unsupported encoding: {}", other)),
        }
    }
}

/// One parsed input row, keyed by the source header. Only the validator turns
/// these into typed records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    fields: HashMap<String, String>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub name: String,
    pub email: String,
}

impl Employee {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

pub type Roster = Vec<Employee>;

/// Wire shape of one record returned by the assignment service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub giver_name: String,
    pub giver_email: String,
    pub receiver_name: String,
    pub receiver_email: String,
}

pub type AssignmentSet = Vec<Assignment>;

/// A serialized export ready to be written somewhere.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub encoding: Encoding,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Success,
    /// The action went through but the result needs the user's attention.
    Warning,
    Error,
}
