use indicators_mlops::schema::{
    DATA_COLUMNS, DATA_SHEET, DATA_TABLE, INFO_COLUMNS, INFO_SHEET, INFO_TABLE,
};
use indicators_mlops::spreadsheet::{write_workbook, Cell, Sheet};
use indicators_mlops::storage::{load_workbook, Database};
use std::path::Path;

fn workbook(path: &Path, rows: usize) {
    let header: Vec<String> = DATA_COLUMNS.iter().map(|c| c.to_string()).collect();
    let mut data = Sheet::new(DATA_SHEET, header);
    for id in 1..=rows {
        let mut row = vec![Cell::Number(id as f64)];
        row.extend((1..DATA_COLUMNS.len()).map(|j| {
            if j % 10 == 0 {
                Cell::Empty
            } else {
                Cell::Text(format!("{},{}", id, j % 10))
            }
        }));
        data.rows.push(row);
    }
    let mut about = Sheet::new(INFO_SHEET, INFO_COLUMNS.iter().map(|c| c.to_string()).collect());
    for (i, name) in DATA_COLUMNS.iter().skip(1).enumerate() {
        about.rows.push(vec![
            Cell::Number((i + 1) as f64),
            Cell::Text(name.to_string()),
            Cell::Text(format!("label {i}")),
        ]);
    }
    write_workbook(path, &[data, about]).unwrap();
}

#[test]
fn test_reload_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.xlsx");
    workbook(&path, 6);
    let url = format!("sqlite:///{}", dir.path().join("store/indicators.db").display());

    let mut db = Database::open(&url).unwrap();
    let first = load_workbook(&path, &mut db).unwrap();
    let second = load_workbook(&path, &mut db).unwrap();
    assert_eq!(first, second);
    assert_eq!(db.count_rows(DATA_TABLE).unwrap(), 6);
    assert_eq!(db.count_rows(INFO_TABLE).unwrap(), DATA_COLUMNS.len() - 1);

    let table = db.load_indicators().unwrap();
    assert_eq!(table.n_rows(), 6);
    assert_eq!(table.n_cols(), DATA_COLUMNS.len());
    assert_eq!(table.column("edu_index").unwrap().to_f64()[2], 3.1);
    assert_eq!(table.column(DATA_COLUMNS[10]).unwrap().missing_count(), 6);
}

#[test]
fn test_reload_replaces_previous_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.xlsx");
    let url = format!("sqlite:///{}", dir.path().join("indicators.db").display());

    workbook(&path, 8);
    load_workbook(&path, &mut Database::open(&url).unwrap()).unwrap();
    workbook(&path, 3);
    load_workbook(&path, &mut Database::open(&url).unwrap()).unwrap();

    let db = Database::open(&url).unwrap();
    assert_eq!(db.count_rows(DATA_TABLE).unwrap(), 3);
    let info = db.load_info().unwrap();
    assert_eq!(info[0].var_name.as_deref(), Some("edu_index"));
    assert_eq!(info[0].var_description.as_deref(), Some("label 0"));
}

#[test]
fn test_missing_workbook_leaves_store_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.xlsx");
    workbook(&path, 4);
    let mut db = Database::open(":memory:").unwrap();
    load_workbook(&path, &mut db).unwrap();

    assert!(load_workbook(dir.path().join("absent.xlsx"), &mut db).is_err());
    assert_eq!(db.count_rows(DATA_TABLE).unwrap(), 4);
}
