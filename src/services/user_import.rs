//! Bulk user import from CSV text.
//!
//! The header row must name an `email` column and a `name` (or `fullname` /
//! `full_name`) column; `role` and `organization` are optional. Each data
//! row is checked on its own so one bad row never aborts the batch.

use std::fmt;

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;

use crate::{
    errors::{AppError, AppResult},
    models::domain::UserRole,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    /// 1-based position among the data rows.
    pub row: usize,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub organization: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportRowError {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub message: String,
}

impl ImportRowError {
    pub fn new(row: usize, email: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            row,
            email: email.filter(|e| !e.is_empty()).map(str::to_string),
            message: message.into(),
        }
    }
}

impl fmt::Display for ImportRowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.email {
            Some(email) => write!(f, "row {} ({}): {}", self.row, email, self.message),
            None => write!(f, "row {}: {}", self.row, self.message),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<ImportRowError>,
}

impl ImportSummary {
    pub fn record_success(&mut self) {
        self.success += 1;
    }

    pub fn record_failure(&mut self, error: ImportRowError) {
        self.failed += 1;
        self.errors.push(error);
    }
}

struct Columns {
    email: usize,
    name: usize,
    role: Option<usize>,
    organization: Option<usize>,
}

impl Columns {
    fn from_header(header: &StringRecord) -> AppResult<Self> {
        let names: Vec<String> = header.iter().map(str::to_ascii_lowercase).collect();
        let position = |candidates: &[&str]| {
            names
                .iter()
                .position(|n| candidates.contains(&n.as_str()))
        };

        match (
            position(&["email"]),
            position(&["name", "fullname", "full_name"]),
        ) {
            (Some(email), Some(name)) => Ok(Columns {
                email,
                name,
                role: position(&["role"]),
                organization: position(&["organization", "org"]),
            }),
            _ => Err(AppError::ValidationError(
                "Import must contain email and name columns".to_string(),
            )),
        }
    }

    fn parse(
        &self,
        row: usize,
        record: &StringRecord,
        default_organization: Option<&str>,
    ) -> Result<ImportRow, ImportRowError> {
        let cell = |index: Option<usize>| index.and_then(|i| record.get(i)).unwrap_or("");

        let email = cell(Some(self.email));
        let full_name = cell(Some(self.name));

        if email.is_empty() {
            return Err(ImportRowError::new(row, None, "Email is required"));
        }
        if !email.contains('@') {
            return Err(ImportRowError::new(row, Some(email), "Invalid email format"));
        }
        if full_name.is_empty() {
            return Err(ImportRowError::new(row, Some(email), "Name is required"));
        }

        // Blank or unrecognized roles import as learners.
        let role = cell(self.role).parse().unwrap_or_default();

        let organization = Some(cell(self.organization))
            .filter(|o| !o.is_empty())
            .or(default_organization)
            .map(str::to_string);

        Ok(ImportRow {
            row,
            email: email.to_string(),
            full_name: full_name.to_string(),
            role,
            organization,
        })
    }
}

fn is_blank(record: &csv::Result<StringRecord>) -> bool {
    matches!(record, Ok(fields) if fields.iter().all(str::is_empty))
}

/// Parse the import text into per-row results. Fails only when the header
/// itself is unusable. Quoted fields may contain commas.
pub fn parse_rows(
    content: &str,
    default_organization: Option<&str>,
) -> AppResult<Vec<Result<ImportRow, ImportRowError>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());
    let mut records = reader.records().filter(|r| !is_blank(r));

    let header = records
        .next()
        .ok_or_else(|| AppError::ValidationError("Import is empty".to_string()))?
        .map_err(|e| AppError::ValidationError(format!("Unreadable header: {}", e)))?;
    let columns = Columns::from_header(&header)?;

    let rows = records
        .enumerate()
        .map(|(index, record)| {
            let row = index + 1;
            match record {
                Ok(record) => columns.parse(row, &record, default_organization),
                Err(e) => Err(ImportRowError::new(row, None, format!("Malformed row: {}", e))),
            }
        })
        .collect();

    Ok(rows)
}
