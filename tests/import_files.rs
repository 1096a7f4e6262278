use std::fs;
use std::path::Path;

use rust_xlsxwriter::Workbook;
use tempfile::tempdir;

use record_annotator_lib::commands;
use record_annotator_lib::record::FieldValue;
use record_annotator_lib::{AnnotatorConfig, AppState, ViewKind};

fn state() -> AppState {
    AppState::new(AnnotatorConfig::without_delays()).unwrap()
}

fn write_applications_workbook(path: &Path) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let headers = ["Brand Name", "Founder Name", "Eligibility", "Team Size", "Business Model"];
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    sheet.write_string(1, 0, "Acme Robotics").unwrap();
    sheet.write_string(1, 1, "Ana Diaz").unwrap();
    sheet.write_string(1, 2, "Eligible").unwrap();
    sheet.write_number(1, 3, 8).unwrap();
    sheet.write_string(1, 4, "B2B SaaS").unwrap();
    sheet.write_string(2, 0, "Loom Works").unwrap();
    sheet.write_string(2, 1, "Ravi Rao").unwrap();
    sheet.write_string(2, 2, "pending").unwrap();
    sheet.write_string(2, 3, "a few").unwrap();
    workbook.save(path).unwrap();
}

#[test]
fn workbook_import_replaces_applications() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("applications.xlsx");
    write_applications_workbook(&path);

    let state = state();
    commands::add_filter(&state, ViewKind::Applications).unwrap();
    commands::select_record(&state, ViewKind::Applications, "2025A-TIDEC4-0001".into()).unwrap();

    let summary = commands::import_spreadsheet(
        &state,
        ViewKind::Applications,
        path.to_string_lossy().into_owned(),
    )
    .unwrap();

    assert_eq!(summary.message, "Loaded 2 applications from file");
    assert_eq!(summary.warnings.len(), 2, "{:?}", summary.warnings);
    assert!(summary.warnings[0].contains("eligibility 'pending'"));
    assert!(summary.warnings[1].contains("team size 'a few'"));

    let snapshot = summary.snapshot;
    assert_eq!(snapshot.total_count, 2);
    assert!(snapshot.filters.is_empty());
    assert_eq!(snapshot.selected_id, None);

    let session = state.session(ViewKind::Applications).lock().unwrap();
    let acme = &session.store().records()[0];
    assert_eq!(acme.display("brand_name"), "Acme Robotics");
    assert_eq!(acme.display("applicant_name"), "Ana Diaz");
    assert_eq!(acme.get("team_size"), Some(&FieldValue::Number(8.0)));
    assert_eq!(acme.display("application_code"), "2025A-TIDEC4-0001");

    let loom = &session.store().records()[1];
    assert_eq!(loom.display("eligibility"), "Not Eligible");
    assert_eq!(loom.display("application_code"), "2025A-TIDEC4-0002");
    assert_eq!(loom.get("team_size"), Some(&FieldValue::Number(0.0)));
}

#[test]
fn csv_import_of_generic_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("people.csv");
    fs::write(
        &path,
        "Name,City,Has Pet,Age\nAda Lovelace,London,true,36\nAlan Turing,Wilmslow,false,41\n",
    )
    .unwrap();

    let state = state();
    let summary =
        commands::import_spreadsheet(&state, ViewKind::DataRows, path.to_string_lossy().into_owned())
            .unwrap();

    assert_eq!(summary.message, "Loaded 2 records from file");
    assert!(summary.warnings.is_empty());
    let keys: Vec<&str> = summary.snapshot.headers.iter().map(|h| h.key.as_str()).collect();
    assert_eq!(keys, vec!["name", "city", "has_pet", "age"]);

    let values = commands::column_values(&state, ViewKind::DataRows, "has_pet".into()).unwrap();
    assert_eq!(values, vec!["No", "Yes"]);
}

#[test]
fn failed_import_keeps_the_loaded_records() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.tsv");
    fs::write(&path, "Brand Name\tTeam Size\n").unwrap();

    let state = state();
    commands::toggle_highlight(&state, ViewKind::Applications, "AI".into()).unwrap();

    let err = commands::import_spreadsheet(
        &state,
        ViewKind::Applications,
        path.to_string_lossy().into_owned(),
    )
    .unwrap_err();
    assert!(err.starts_with("Unable to import the spreadsheet"), "{err}");

    let missing = dir.path().join("missing.xlsx");
    assert!(commands::import_spreadsheet(
        &state,
        ViewKind::Applications,
        missing.to_string_lossy().into_owned()
    )
    .is_err());

    let snapshot = commands::load_view(&state, ViewKind::Applications).unwrap();
    assert_eq!(snapshot.total_count, 5);
    assert_eq!(snapshot.highlights, vec!["AI"]);
}

#[test]
fn analysis_previews_the_first_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("export.dat");
    let mut body = String::from("Brand Name;Team Size\n");
    for index in 0..5 {
        body.push_str(&format!("Startup {index};{index}\n"));
    }
    fs::write(&path, body).unwrap();

    let config = AnnotatorConfig {
        preview_row_limit: 3,
        ..AnnotatorConfig::without_delays()
    };
    let state = AppState::new(config).unwrap();

    let analysis = commands::analyze_spreadsheet(&state, path.to_string_lossy().into_owned()).unwrap();
    assert_eq!(analysis.preview.headers, vec!["Brand Name", "Team Size"]);
    assert_eq!(analysis.preview.normalized_headers, vec!["brand_name", "team_size"]);
    assert_eq!(analysis.preview.rows.len(), 3);
    assert_eq!(analysis.preview.rows[2], vec!["Startup 2", "2"]);
    assert_eq!(analysis.warnings.len(), 1);
    assert!(analysis.warnings[0].contains("'.dat'"));

    assert!(commands::analyze_spreadsheet(&state, "   ".into()).is_err());
}
