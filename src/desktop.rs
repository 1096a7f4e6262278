use tauri::{Manager, State};
use tracing::warn;

use crate::commands::{
    self, GeneratedReport, HighlightOutcome, ImportSummary, RatingReceipt, RecordDetail,
    SpreadsheetAnalysis, ViewSnapshot,
};
use crate::config::{AnnotatorConfig, CONFIG_FILE_NAME};
use crate::filter::ClauseField;
use crate::highlight::HighlightAction;
use crate::logging;
use crate::session::{AppState, ViewKind};

#[tauri::command]
fn load_view(state: State<'_, AppState>, view: ViewKind) -> Result<ViewSnapshot, String> {
    commands::load_view(&state, view)
}

#[tauri::command]
fn add_filter(state: State<'_, AppState>, view: ViewKind) -> Result<ViewSnapshot, String> {
    commands::add_filter(&state, view)
}

#[tauri::command]
fn remove_filter(state: State<'_, AppState>, view: ViewKind, index: usize) -> Result<ViewSnapshot, String> {
    commands::remove_filter(&state, view, index)
}

#[tauri::command]
fn update_filter(
    state: State<'_, AppState>,
    view: ViewKind,
    index: usize,
    field: ClauseField,
    value: String,
) -> Result<ViewSnapshot, String> {
    commands::update_filter(&state, view, index, field, value)
}

#[tauri::command]
fn reset_filters(state: State<'_, AppState>, view: ViewKind) -> Result<ViewSnapshot, String> {
    commands::reset_filters(&state, view)
}

#[tauri::command]
fn column_values(state: State<'_, AppState>, view: ViewKind, column: String) -> Result<Vec<String>, String> {
    commands::column_values(&state, view, column)
}

#[tauri::command]
fn select_record(state: State<'_, AppState>, view: ViewKind, record_id: String) -> Result<RecordDetail, String> {
    commands::select_record(&state, view, record_id)
}

#[tauri::command]
fn clear_selection(state: State<'_, AppState>, view: ViewKind) -> Result<ViewSnapshot, String> {
    commands::clear_selection(&state, view)
}

#[tauri::command]
fn highlight_action(
    state: State<'_, AppState>,
    view: ViewKind,
    selection: String,
) -> Result<Option<HighlightAction>, String> {
    commands::highlight_action(&state, view, selection)
}

#[tauri::command]
fn toggle_highlight(state: State<'_, AppState>, view: ViewKind, selection: String) -> Result<HighlightOutcome, String> {
    commands::toggle_highlight(&state, view, selection)
}

#[tauri::command]
fn remove_highlight(state: State<'_, AppState>, view: ViewKind, term: String) -> Result<HighlightOutcome, String> {
    commands::remove_highlight(&state, view, term)
}

#[tauri::command]
fn list_highlights(state: State<'_, AppState>, view: ViewKind) -> Result<Vec<String>, String> {
    commands::list_highlights(&state, view)
}

#[tauri::command]
async fn generate_insights(state: State<'_, AppState>, view: ViewKind) -> Result<GeneratedReport, String> {
    commands::generate_insights(&state, view).await
}

#[tauri::command]
async fn generate_record_report(
    state: State<'_, AppState>,
    view: ViewKind,
    record_id: String,
) -> Result<GeneratedReport, String> {
    commands::generate_record_report(&state, view, record_id).await
}

#[tauri::command]
fn submit_rating(
    state: State<'_, AppState>,
    view: ViewKind,
    record_id: String,
    input: String,
) -> Result<RatingReceipt, String> {
    commands::submit_rating(&state, view, record_id, input)
}

#[tauri::command]
fn analyze_spreadsheet(state: State<'_, AppState>, path: String) -> Result<SpreadsheetAnalysis, String> {
    commands::analyze_spreadsheet(&state, path)
}

#[tauri::command]
fn import_spreadsheet(
    state: State<'_, AppState>,
    view: ViewKind,
    path: String,
) -> Result<ImportSummary, String> {
    commands::import_spreadsheet(&state, view, path)
}

/// Settings from `annotator.toml` in the app config directory, plus the reason
/// the defaults were used instead, if any.
fn load_config(app: &tauri::App) -> (AnnotatorConfig, Option<String>) {
    let path = match app.path().app_config_dir() {
        Ok(dir) => dir.join(CONFIG_FILE_NAME),
        Err(err) => {
            return (
                AnnotatorConfig::default(),
                Some(format!("Unable to locate the app config directory: {err}")),
            )
        }
    };

    match AnnotatorConfig::load(&path) {
        Ok(config) => (config, None),
        Err(err) => (
            AnnotatorConfig::default(),
            Some(format!("{err} ({})", path.display())),
        ),
    }
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            let (config, problem) = load_config(app);
            logging::init(&config.log_level);
            if let Some(problem) = problem {
                warn!("{problem}; using default settings");
            }
            app.manage(AppState::new(config)?);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            load_view,
            add_filter,
            remove_filter,
            update_filter,
            reset_filters,
            column_values,
            select_record,
            clear_selection,
            highlight_action,
            toggle_highlight,
            remove_highlight,
            list_highlights,
            generate_insights,
            generate_record_report,
            submit_rating,
            analyze_spreadsheet,
            import_spreadsheet
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
