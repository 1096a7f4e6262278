//! Spreadsheet import.
//!
//! Excel workbooks go through calamine (first worksheet only); anything else
//! is treated as delimited text with a sniffed delimiter. The first row holds
//! the field names, which are normalized before rows are mapped onto records.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, DataType, Reader};
use chrono::Local;
use serde::Serialize;
use sha1::{Digest, Sha1};
use tracing::{info, warn};

use crate::error::{AnnotatorError, Result};
use crate::record::{FieldValue, Record, RecordStore, ID_COLUMN};

pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "csv", "tsv", "txt"];

/// Columns of an imported TIDE application, in display order.
pub const APPLICATION_COLUMNS: &[&str] = &[
    "timestamp",
    "application_code",
    "eligibility",
    "email",
    "brand_name",
    "applicant_name",
    "description",
    "business_model",
    "target_market",
    "funding_stage",
    "team_size",
];

const ELIGIBLE: &str = "Eligible";
const NOT_ELIGIBLE: &str = "Not Eligible";

/// Raw cell grid read from a file, headers as written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// How rows of a sheet become records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportProfile {
    /// Every normalized header becomes a column; cell types are inferred.
    Generic,
    /// Fixed application columns with fallbacks for missing values.
    Applications { code_prefix: String },
}

#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub store: RecordStore,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetPreview {
    pub headers: Vec<String>,
    pub normalized_headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn import_path(path: &Path, profile: &ImportProfile) -> Result<ImportOutcome> {
    let table = read_spreadsheet(path, None)?;
    let outcome = import_table(&table, profile)?;
    info!(
        path = %path.display(),
        records = outcome.store.len(),
        warnings = outcome.warnings.len(),
        "imported spreadsheet"
    );
    Ok(outcome)
}

/// Imports delimited text already in memory.
pub fn import_delimited(data: &[u8], profile: &ImportProfile) -> Result<ImportOutcome> {
    let table = read_delimited(data, None)?;
    import_table(&table, profile)
}

pub fn preview_spreadsheet(path: &Path, max_rows: usize) -> Result<SpreadsheetPreview> {
    let SheetTable { headers, rows } = read_spreadsheet(path, Some(max_rows))?;
    let normalized_headers = headers.iter().map(|header| normalize_header(header)).collect();

    Ok(SpreadsheetPreview {
        headers,
        normalized_headers,
        rows,
    })
}

pub fn import_table(table: &SheetTable, profile: &ImportProfile) -> Result<ImportOutcome> {
    if table.rows.is_empty() {
        return Err(AnnotatorError::ImportParseFailure(
            "The file appears to be empty or in an unsupported format.".into(),
        ));
    }

    let mut warnings = Vec::new();
    let keys: Vec<String> = table
        .headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            let key = normalize_header(header);
            if key.is_empty() && !table.rows.iter().all(|row| cell(row, index).is_empty()) {
                warnings.push(format!(
                    "Column {} ('{header}') has no usable name and was skipped.",
                    index + 1
                ));
            }
            key
        })
        .collect();

    let (columns, mut records) = match profile {
        ImportProfile::Generic => map_generic(&keys, &table.rows),
        ImportProfile::Applications { code_prefix } => {
            map_applications(&keys, &table.rows, code_prefix, &mut warnings)
        }
    };

    dedup_record_ids(&mut records, &mut warnings);
    for message in &warnings {
        warn!("{message}");
    }

    let store = RecordStore::new(columns, records)?;
    Ok(ImportOutcome { store, warnings })
}

/// Lower-cases, turns whitespace runs into `_` and drops anything that is not
/// a word character.
pub fn normalize_header(header: &str) -> String {
    let mut normalized = String::with_capacity(header.len());
    let mut in_whitespace = false;
    for ch in header.trim().to_lowercase().chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                normalized.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if ch.is_alphanumeric() || ch == '_' {
            normalized.push(ch);
        }
    }
    normalized
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

/// Header/value pairs of one row. Later duplicates of a key win, keys keep
/// their first position.
fn row_fields<'a>(keys: &'a [String], row: &'a [String]) -> Vec<(&'a str, &'a str)> {
    let mut fields: Vec<(&str, &str)> = Vec::new();
    for (index, key) in keys.iter().enumerate() {
        if key.is_empty() {
            continue;
        }
        let value = cell(row, index);
        match fields.iter_mut().find(|(existing, _)| *existing == key.as_str()) {
            Some(entry) => entry.1 = value,
            None => fields.push((key.as_str(), value)),
        }
    }
    fields
}

fn map_generic(keys: &[String], rows: &[Vec<String>]) -> (Vec<String>, Vec<Record>) {
    let mut columns: Vec<String> = Vec::new();
    for key in keys {
        if !key.is_empty() && key != ID_COLUMN && !columns.contains(key) {
            columns.push(key.clone());
        }
    }

    let records = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let fields = row_fields(keys, row);
            let id = fields
                .iter()
                .find(|(key, value)| *key == ID_COLUMN && !value.is_empty())
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| (index + 1).to_string());

            let mut record = Record::new(id);
            for (key, value) in fields {
                if key != ID_COLUMN {
                    record.values.insert(key.to_string(), infer_value(value));
                }
            }
            record
        })
        .collect();

    (columns, records)
}

fn infer_value(raw: &str) -> FieldValue {
    if raw.eq_ignore_ascii_case("true") {
        return FieldValue::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return FieldValue::Bool(false);
    }
    match raw.parse::<f64>() {
        // Only when the number prints back as written, so "007" or "1e3"
        // keep their text form for filtering.
        Ok(number) if number.is_finite() && number.to_string() == raw => FieldValue::Number(number),
        _ => FieldValue::text(raw),
    }
}

fn map_applications(
    keys: &[String],
    rows: &[Vec<String>],
    code_prefix: &str,
    warnings: &mut Vec<String>,
) -> (Vec<String>, Vec<Record>) {
    let columns = APPLICATION_COLUMNS.iter().map(|column| column.to_string()).collect();

    let records = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let pairs = row_fields(keys, row);
            let fields: HashMap<&str, &str> = pairs.iter().copied().collect();
            let first = |names: &[&str]| -> String {
                names
                    .iter()
                    .filter_map(|name| fields.get(name).copied())
                    .find(|value| !value.is_empty())
                    .unwrap_or("")
                    .to_string()
            };
            let row_number = index + 1;

            let application_code = match first(&["application_code"]) {
                code if code.is_empty() => format!("{code_prefix}-{row_number:04}"),
                code => code,
            };
            let id = match first(&["id", "application_code"]) {
                id if id.is_empty() => fingerprint(&pairs),
                id => id,
            };
            let timestamp = match first(&["timestamp"]) {
                stamp if stamp.is_empty() => Local::now().format("%d/%m/%Y %H:%M:%S").to_string(),
                stamp => stamp,
            };

            let raw_eligibility = first(&["eligibility"]);
            let eligibility = match raw_eligibility.as_str() {
                ELIGIBLE | NOT_ELIGIBLE => raw_eligibility.clone(),
                "" => NOT_ELIGIBLE.to_string(),
                other => {
                    warnings.push(format!(
                        "Row {row_number}: eligibility '{other}' is not recognized; recorded as '{NOT_ELIGIBLE}'."
                    ));
                    NOT_ELIGIBLE.to_string()
                }
            };

            let raw_team_size = first(&["team_size"]);
            let team_size = match parse_leading_int(&raw_team_size) {
                Some(size) => size,
                None => {
                    if !raw_team_size.is_empty() {
                        warnings.push(format!(
                            "Row {row_number}: team size '{raw_team_size}' is not a number; recorded as 0."
                        ));
                    }
                    0
                }
            };

            Record::new(id)
                .with("timestamp", timestamp)
                .with("application_code", application_code)
                .with("eligibility", eligibility)
                .with("email", first(&["email"]))
                .with("brand_name", first(&["brand_name", "company_name"]))
                .with("applicant_name", first(&["applicant_name", "founder_name", "name"]))
                .with("description", first(&["description", "business_description"]))
                .with("business_model", first(&["business_model"]))
                .with("target_market", first(&["target_market"]))
                .with("funding_stage", first(&["funding_stage"]))
                .with("team_size", team_size)
        })
        .collect();

    (columns, records)
}

/// Integer prefix of `raw` ("12 people" → 12), like a lenient form parser.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map(|(index, _)| index)
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|value| sign * value)
}

/// Stable 12 hex digit id derived from the row contents.
fn fingerprint(pairs: &[(&str, &str)]) -> String {
    let payload = serde_json::to_string(pairs).unwrap_or_default();
    let digest = Sha1::digest(payload.as_bytes());
    digest
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>()
        .chars()
        .take(12)
        .collect()
}

fn dedup_record_ids(records: &mut [Record], warnings: &mut Vec<String>) {
    let mut seen = HashSet::new();
    for record in records.iter_mut() {
        if seen.insert(record.id.clone()) {
            continue;
        }
        let original = record.id.clone();
        let mut suffix = 2;
        while seen.contains(&format!("{original}#{suffix}")) {
            suffix += 1;
        }
        record.id = format!("{original}#{suffix}");
        seen.insert(record.id.clone());
        warnings.push(format!(
            "Duplicate id '{original}' was renamed to '{}'.",
            record.id
        ));
    }
}

pub fn read_spreadsheet(path: &Path, max_rows: Option<usize>) -> Result<SheetTable> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    if matches!(extension.as_str(), "xlsx" | "xlsm" | "xls" | "xlsb") {
        read_excel(path, max_rows)
    } else {
        let data = fs::read(path).map_err(|err| {
            AnnotatorError::ImportParseFailure(format!("Unable to open the spreadsheet: {err}"))
        })?;
        read_delimited(&data, max_rows)
    }
}

fn read_delimited(data: &[u8], max_rows: Option<usize>) -> Result<SheetTable> {
    let delimiter = detect_delimiter(data)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let mut headers: Vec<String> = reader
        .headers()
        .map_err(|err| {
            AnnotatorError::ImportParseFailure(format!("Unable to read spreadsheet headers: {err}"))
        })?
        .iter()
        .map(|value| value.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| {
            AnnotatorError::ImportParseFailure(format!("Unable to read spreadsheet rows: {err}"))
        })?;
        let values: Vec<String> = record
            .iter()
            .map(|value| value.trim().to_string())
            .collect();
        if values.iter().all(|value| value.is_empty()) {
            continue;
        }
        rows.push(values);
        if let Some(limit) = max_rows {
            if rows.len() >= limit {
                break;
            }
        }
    }

    align_row_lengths(&mut headers, &mut rows);
    Ok(SheetTable { headers, rows })
}

fn read_excel(path: &Path, max_rows: Option<usize>) -> Result<SheetTable> {
    let parse_failure = |message: String| AnnotatorError::ImportParseFailure(message);

    let mut workbook = open_workbook_auto(path)
        .map_err(|err| parse_failure(format!("Unable to open the spreadsheet: {err}")))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| parse_failure("The workbook does not contain any worksheets.".into()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .ok_or_else(|| parse_failure(format!("Unable to read the worksheet named '{sheet_name}'.")))?
        .map_err(|err| parse_failure(format!("Unable to read the worksheet data: {err}")))?;

    let mut rows_iter = range.rows();
    let header_row = rows_iter
        .next()
        .ok_or_else(|| parse_failure("The worksheet is empty.".into()))?;

    let mut headers: Vec<String> = header_row.iter().map(cell_to_string).collect();
    let mut rows = Vec::new();

    for row in rows_iter {
        let values: Vec<String> = row.iter().map(cell_to_string).collect();
        if values.iter().all(|value| value.is_empty()) {
            continue;
        }
        rows.push(values);
        if let Some(limit) = max_rows {
            if rows.len() >= limit {
                break;
            }
        }
    }

    align_row_lengths(&mut headers, &mut rows);
    Ok(SheetTable { headers, rows })
}

fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::Empty => String::new(),
        _ => cell.to_string().trim().to_string(),
    }
}

fn align_row_lengths(headers: &mut Vec<String>, rows: &mut [Vec<String>]) {
    let mut column_count = headers.len();
    for row in rows.iter() {
        if row.len() > column_count {
            column_count = row.len();
        }
    }

    if headers.len() < column_count {
        headers.resize(column_count, String::new());
    }

    for row in rows.iter_mut() {
        if row.len() < column_count {
            row.resize(column_count, String::new());
        }
    }
}

fn detect_delimiter(data: &[u8]) -> Result<u8> {
    let mut reader = BufReader::new(data);
    let mut buffer = String::new();

    for _ in 0..5 {
        buffer.clear();
        let bytes_read = reader.read_line(&mut buffer).map_err(|err| {
            AnnotatorError::ImportParseFailure(format!("Unable to inspect the spreadsheet: {err}"))
        })?;
        if bytes_read == 0 {
            break;
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let counts = [
            (b'\t', buffer.matches('\t').count()),
            (b',', buffer.matches(',').count()),
            (b';', buffer.matches(';').count()),
        ];

        if let Some((delimiter, count)) = counts.iter().max_by_key(|(_, count)| *count) {
            if *count > 0 {
                return Ok(*delimiter);
            }
        }
    }

    Ok(b'\t')
}

/// Resolves a user-supplied path (with `~` expansion) to an existing file.
pub fn resolve_existing_file(raw_path: &str, label: &str) -> Result<PathBuf> {
    let provided = raw_path.trim();
    if provided.is_empty() {
        return Err(AnnotatorError::ImportParseFailure(format!("{label} path is required.")));
    }

    let path = expand_home(provided);
    let metadata = fs::metadata(&path).map_err(|_| {
        AnnotatorError::ImportParseFailure(format!("{label} was not found: {}", path.display()))
    })?;

    if !metadata.is_file() {
        return Err(AnnotatorError::ImportParseFailure(format!(
            "{label} is expected to be a file: {}",
            path.display()
        )));
    }

    Ok(path)
}

pub fn validate_extension(path: &Path, allowed: &[&str], label: &str) -> Option<String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if allowed.iter().any(|value| ext.eq_ignore_ascii_case(value)) => None,
        Some(ext) => Some(format!(
            "The selected {label} uses '.{ext}', which is outside the expected extensions: {}.",
            allowed.join(", ")
        )),
        None => Some(format!(
            "The selected {label} does not include an extension. Confirm it is supported."
        )),
    }
}

fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = home_dir() {
            return home;
        }
        return PathBuf::from(path);
    }

    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }

    PathBuf::from(path)
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .map(PathBuf::from)
        .or_else(|_| std::env::var("USERPROFILE").map(PathBuf::from))
        .ok()
}
