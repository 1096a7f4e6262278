//! Frontend-facing operations.
//!
//! Each function takes the shared [`AppState`] and returns a serializable
//! response or a message ready to show the user. The desktop shell wraps them
//! one-to-one as IPC commands.

use std::sync::MutexGuard;

use serde::Serialize;
use tracing::info;

use crate::error::AnnotatorError;
use crate::facet::{self, ColumnHeader};
use crate::filter::{ClauseField, FilterClause};
use crate::highlight::{HighlightAction, HighlightSet, Span};
use crate::import::{self, SpreadsheetPreview, SPREADSHEET_EXTENSIONS};
use crate::rating::RatingScale;
use crate::record::{FieldValue, Record};
use crate::report::ReportGenerator;
use crate::session::{AppState, GenerationKind, ViewKind, ViewSession};

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    pub key: String,
    pub label: String,
    pub text: String,
    pub spans: Vec<Span>,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RowView {
    pub id: String,
    pub cells: Vec<FieldView>,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshot {
    pub view: ViewKind,
    pub headers: Vec<ColumnHeader>,
    pub rows: Vec<RowView>,
    pub total_count: usize,
    pub filtered_count: usize,
    pub filters: Vec<FilterClause>,
    pub highlights: Vec<String>,
    pub selected_id: Option<String>,
    pub generating: bool,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RecordDetail {
    pub id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub fields: Vec<FieldView>,
    pub rating_scale: RatingScale,
    pub latest_rating: Option<f64>,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HighlightOutcome {
    pub action: Option<HighlightAction>,
    pub term: String,
    pub message: Option<String>,
    pub highlights: Vec<String>,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedReport {
    pub view: ViewKind,
    pub kind: GenerationKind,
    pub title: String,
    pub record_id: Option<String>,
    pub body: String,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RatingReceipt {
    pub record_id: String,
    pub score: f64,
    pub message: String,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetAnalysis {
    pub preview: SpreadsheetPreview,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub message: String,
    pub warnings: Vec<String>,
    pub snapshot: ViewSnapshot,
}

fn lock_session(state: &AppState, view: ViewKind) -> Result<MutexGuard<'_, ViewSession>, String> {
    state
        .session(view)
        .lock()
        .map_err(|_| "Unable to lock the view state.".to_string())
}

fn field_view(highlights: &HighlightSet, record: &Record, column: &str) -> FieldView {
    let text = record.display(column);
    let spans = match record.get(column) {
        Some(FieldValue::Text(value)) => highlights.segment(value),
        _ if text.is_empty() => Vec::new(),
        _ => vec![Span::plain(&text)],
    };

    FieldView {
        key: column.to_string(),
        label: facet::column_label(column),
        text,
        spans,
    }
}

fn snapshot(session: &ViewSession) -> ViewSnapshot {
    let store = session.store();
    let filtered = session.filtered();
    let rows = filtered
        .iter()
        .map(|record| RowView {
            id: record.id.clone(),
            cells: store
                .columns()
                .iter()
                .map(|column| field_view(session.highlights(), record, column))
                .collect(),
        })
        .collect();

    ViewSnapshot {
        view: session.kind(),
        headers: facet::headers(store),
        rows,
        total_count: store.len(),
        filtered_count: filtered.len(),
        filters: session.filters().clauses().to_vec(),
        highlights: session.highlights().terms().to_vec(),
        selected_id: session.selection().map(|record| record.id.clone()),
        generating: session.is_generating(),
    }
}

fn detail(session: &ViewSession, scale: RatingScale, record: &Record) -> RecordDetail {
    let view = session.kind();
    RecordDetail {
        id: record.id.clone(),
        title: view.record_title(record),
        subtitle: view.record_subtitle(record),
        fields: session
            .store()
            .columns()
            .iter()
            .map(|column| field_view(session.highlights(), record, column))
            .collect(),
        rating_scale: scale,
        latest_rating: session
            .ratings()
            .latest_for(&record.id)
            .map(|submission| submission.score),
    }
}

pub fn load_view(state: &AppState, view: ViewKind) -> Result<ViewSnapshot, String> {
    let session = lock_session(state, view)?;
    Ok(snapshot(&session))
}

pub fn add_filter(state: &AppState, view: ViewKind) -> Result<ViewSnapshot, String> {
    let mut session = lock_session(state, view)?;
    session.filters_mut().add_clause();
    Ok(snapshot(&session))
}

pub fn remove_filter(state: &AppState, view: ViewKind, index: usize) -> Result<ViewSnapshot, String> {
    let mut session = lock_session(state, view)?;
    session
        .filters_mut()
        .remove_clause(index)
        .map_err(|err| err.to_string())?;
    Ok(snapshot(&session))
}

pub fn update_filter(
    state: &AppState,
    view: ViewKind,
    index: usize,
    field: ClauseField,
    value: String,
) -> Result<ViewSnapshot, String> {
    let mut session = lock_session(state, view)?;
    session
        .filters_mut()
        .update_clause(index, field, &value)
        .map_err(|err| err.to_string())?;
    Ok(snapshot(&session))
}

pub fn reset_filters(state: &AppState, view: ViewKind) -> Result<ViewSnapshot, String> {
    let mut session = lock_session(state, view)?;
    session.filters_mut().reset_clauses();
    Ok(snapshot(&session))
}

/// Distinct values of `column` across all loaded records, for the value
/// selector of a clause.
pub fn column_values(state: &AppState, view: ViewKind, column: String) -> Result<Vec<String>, String> {
    let session = lock_session(state, view)?;
    Ok(session.unique_values(&column))
}

pub fn select_record(state: &AppState, view: ViewKind, record_id: String) -> Result<RecordDetail, String> {
    let scale = view.rating_scale(state.config());
    let mut session = lock_session(state, view)?;
    let record = session
        .select(&record_id)
        .map_err(|err| err.to_string())?
        .clone();
    Ok(detail(&session, scale, &record))
}

pub fn clear_selection(state: &AppState, view: ViewKind) -> Result<ViewSnapshot, String> {
    let mut session = lock_session(state, view)?;
    session.clear_selection();
    Ok(snapshot(&session))
}

pub fn highlight_action(
    state: &AppState,
    view: ViewKind,
    selection: String,
) -> Result<Option<HighlightAction>, String> {
    let session = lock_session(state, view)?;
    Ok(session.highlights().action_for(&selection))
}

pub fn toggle_highlight(state: &AppState, view: ViewKind, selection: String) -> Result<HighlightOutcome, String> {
    let mut session = lock_session(state, view)?;
    let term = selection.trim().to_string();
    let action = session.highlights_mut().toggle(&term);
    let message = action.map(|action| match action {
        HighlightAction::Add => format!("\"{term}\" has been highlighted."),
        HighlightAction::Remove => format!("\"{term}\" highlight has been removed."),
    });

    Ok(HighlightOutcome {
        action,
        term,
        message,
        highlights: session.highlights().terms().to_vec(),
    })
}

pub fn remove_highlight(state: &AppState, view: ViewKind, term: String) -> Result<HighlightOutcome, String> {
    let mut session = lock_session(state, view)?;
    let term = term.trim().to_string();
    let removed = session.highlights_mut().remove_term(&term);

    Ok(HighlightOutcome {
        action: removed.then_some(HighlightAction::Remove),
        message: removed.then(|| format!("\"{term}\" highlight has been removed.")),
        term,
        highlights: session.highlights().terms().to_vec(),
    })
}

pub fn list_highlights(state: &AppState, view: ViewKind) -> Result<Vec<String>, String> {
    let session = lock_session(state, view)?;
    Ok(session.highlights().terms().to_vec())
}

/// Aggregate insights over the records that currently pass the filters.
pub async fn generate_insights(state: &AppState, view: ViewKind) -> Result<GeneratedReport, String> {
    let (ticket, records) = {
        let mut session = lock_session(state, view)?;
        let records: Vec<Record> = session.filtered().into_iter().cloned().collect();
        if records.is_empty() {
            return Err(AnnotatorError::NoRecords.to_string());
        }
        let ticket = session
            .begin_generation(GenerationKind::Insights)
            .map_err(|err| err.to_string())?;
        (ticket, records)
    };

    let template = state.templates(view).insights.clone();
    let body = ReportGenerator::new(state.config().insights_delay())
        .generate(|| {
            let refs: Vec<&Record> = records.iter().collect();
            template.render(&refs)
        })
        .await;

    lock_session(state, view)?
        .finish_generation(ticket)
        .map_err(|err| err.to_string())?;
    info!(view = ?view, records = records.len(), "generated insights");

    Ok(GeneratedReport {
        view,
        kind: GenerationKind::Insights,
        title: view.insights_title().to_string(),
        record_id: None,
        body,
    })
}

/// Summary (data rows) or evaluation (applications) of a single record.
pub async fn generate_record_report(
    state: &AppState,
    view: ViewKind,
    record_id: String,
) -> Result<GeneratedReport, String> {
    let (ticket, record) = {
        let mut session = lock_session(state, view)?;
        let record = session.record(&record_id).map_err(|err| err.to_string())?.clone();
        let ticket = session
            .begin_generation(GenerationKind::RecordReport)
            .map_err(|err| err.to_string())?;
        (ticket, record)
    };

    let template = state.templates(view).record.clone();
    let body = ReportGenerator::new(view.record_report_delay(state.config()))
        .generate(|| template.render(&record))
        .await;

    lock_session(state, view)?
        .finish_generation(ticket)
        .map_err(|err| err.to_string())?;
    info!(view = ?view, id = %record.id, "generated record report");

    Ok(GeneratedReport {
        view,
        kind: GenerationKind::RecordReport,
        title: view.record_report_title().to_string(),
        record_id: Some(record.id),
        body,
    })
}

pub fn submit_rating(
    state: &AppState,
    view: ViewKind,
    record_id: String,
    input: String,
) -> Result<RatingReceipt, String> {
    let scale = view.rating_scale(state.config());
    let mut session = lock_session(state, view)?;
    let score = session
        .submit_rating(&record_id, &input, scale)
        .map_err(|err| err.to_string())?
        .score;
    let record = session.record(&record_id).map_err(|err| err.to_string())?;

    Ok(RatingReceipt {
        message: view.rating_confirmation(record, score),
        record_id,
        score,
    })
}

pub fn analyze_spreadsheet(state: &AppState, path: String) -> Result<SpreadsheetAnalysis, String> {
    if path.trim().is_empty() {
        return Err("Provide a spreadsheet path to analyze.".into());
    }

    let source = import::resolve_existing_file(&path, "Spreadsheet file").map_err(|err| err.to_string())?;
    let warnings = import::validate_extension(&source, SPREADSHEET_EXTENSIONS, "spreadsheet")
        .into_iter()
        .collect();
    let preview = import::preview_spreadsheet(&source, state.config().preview_row_limit)
        .map_err(|err| err.to_string())?;

    Ok(SpreadsheetAnalysis { preview, warnings })
}

/// Replaces the records of `view` with the contents of the file at `path`.
/// Nothing changes when the file cannot be read.
pub fn import_spreadsheet(state: &AppState, view: ViewKind, path: String) -> Result<ImportSummary, String> {
    if path.trim().is_empty() {
        return Err("Select a TSV, CSV, or Excel file to import.".into());
    }

    let source = import::resolve_existing_file(&path, "Spreadsheet file").map_err(|err| err.to_string())?;
    let mut outcome =
        import::import_path(&source, &view.import_profile(state.config())).map_err(|err| err.to_string())?;
    if let Some(warning) = import::validate_extension(&source, SPREADSHEET_EXTENSIONS, "spreadsheet") {
        outcome.warnings.insert(0, warning);
    }

    let count = outcome.store.len();
    let noun = match view {
        ViewKind::DataRows => "records",
        ViewKind::Applications => "applications",
    };

    let mut session = lock_session(state, view)?;
    session.replace_store(outcome.store);

    Ok(ImportSummary {
        message: format!("Loaded {count} {noun} from file"),
        warnings: outcome.warnings,
        snapshot: snapshot(&session),
    })
}
