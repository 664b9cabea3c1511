// ==========================================
// CSV 目录数据源端到端测试
// ==========================================


use school_loader::domain::EntityKind;
use school_loader::logging;
use school_loader::{run_load, LoadConfig, LoadError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use test_helpers::{count_rows, create_test_db, open_test_connection};

/// 每个工作表写一个 CSV; 未列出的工作表只有表头
fn write_sheets(dir: &Path, sheets: &[(EntityKind, &str)]) {
    for kind in EntityKind::ALL {
        let content = sheets
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, content)| content.to_string())
            .unwrap_or_else(|| "placeholder\n".to_string());
        fs::write(dir.join(format!("{}.csv", kind.default_sheet_name())), content).unwrap();
    }
}

fn school_sheets() -> Vec<(EntityKind, &'static str)> {
    vec![
        (EntityKind::School, "school_name,address\nGreen Valley School,12 Park Road\n"),
        (EntityKind::Grade, "grade_name,description,tuition_fee\n5,Fifth,1000\n6,Sixth,NULL\n"),
        (EntityKind::Section, "grade_name,section_name,capacity\n5,A,30\n7,A,30\n"),
        (
            EntityKind::Student,
            "grade_name,section_name,first_name,email,student_id_hint\n5,A,Ria,ria@gv.edu,1\n",
        ),
        (
            EntityKind::AttendanceRecord,
            "student_id_hint,date,status\n1,2024-06-03,Present\n1,2024-06-04,N/A\n",
        ),
    ]
}

#[test]
fn test_run_load_from_csv_directory() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().unwrap();
    let source = TempDir::new().unwrap();
    write_sheets(source.path(), &school_sheets());

    let config = LoadConfig::from_args(&db_path, source.path()).unwrap();
    let report = run_load(&config).unwrap();

    let conn = open_test_connection(&db_path);
    assert_eq!(count_rows(&conn, "ss_t_schools"), 1);
    assert_eq!(count_rows(&conn, "ss_t_grades"), 2);
    assert_eq!(count_rows(&conn, "ss_t_sections"), 1);
    assert_eq!(count_rows(&conn, "ss_t_students"), 1);
    assert_eq!(count_rows(&conn, "ss_t_attendance"), 1);

    let tuition: Option<f64> = conn
        .query_row("SELECT tuition_fee FROM ss_t_grades WHERE grade_name = '6'", [], |row| row.get(0))
        .unwrap();
    assert_eq!(tuition, None);

    assert_eq!(report.stage(EntityKind::Section).unwrap().skipped_for("unknown_grade"), 1);
    assert_eq!(
        report.stage(EntityKind::AttendanceRecord).unwrap().skipped_for("missing_field"),
        1
    );
}

#[test]
fn test_run_load_twice_from_csv_is_idempotent() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().unwrap();
    let source = TempDir::new().unwrap();
    write_sheets(source.path(), &school_sheets());
    let config = LoadConfig::from_args(&db_path, source.path()).unwrap();

    run_load(&config).unwrap();
    run_load(&config).unwrap();

    let conn = open_test_connection(&db_path);
    assert_eq!(count_rows(&conn, "ss_t_schools"), 1);
    assert_eq!(count_rows(&conn, "ss_t_grades"), 2);
    assert_eq!(count_rows(&conn, "ss_t_students"), 1);
    assert_eq!(count_rows(&conn, "ss_t_attendance"), 1);
}

#[test]
fn test_missing_sheet_aborts_before_opening_database() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().unwrap();
    let source = TempDir::new().unwrap();
    write_sheets(source.path(), &school_sheets());
    fs::remove_file(source.path().join("installments.csv")).unwrap();

    let config = LoadConfig::from_args(&db_path, source.path()).unwrap();
    let err = run_load(&config).unwrap_err();

    match err {
        LoadError::SheetNotFound { sheet } => assert_eq!(sheet, "installments"),
        other => panic!("unexpected error: {other:?}"),
    }
    let conn = open_test_connection(&db_path);
    assert_eq!(count_rows(&conn, "ss_t_schools"), 0);
}

#[test]
fn test_unsupported_connection_is_rejected() {
    let err = LoadConfig::from_args("postgres://localhost/school", "data.xlsx").unwrap_err();
    assert!(matches!(err, LoadError::UnsupportedConnection(_)));
}
