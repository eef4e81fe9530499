use indicators_mlops::artifacts::ArtifactStore;
use indicators_mlops::dataset::TabularDataset;
use indicators_mlops::estimator::Estimator;
use indicators_mlops::pipe::{FittedPipe, Pipe};
use indicators_mlops::schema::{DATA_COLUMNS, DATA_SHEET, INFO_COLUMNS, INFO_SHEET};
use indicators_mlops::spreadsheet::{read_sheet, write_workbook, Cell, Sheet};
use indicators_mlops::table::{Column, Table};
use indicators_mlops::{tasks, ModelKind, Settings};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use std::path::Path;

fn small_table() -> Table {
    let ids: Vec<Option<f64>> = (1..=10).map(|i| Some(i as f64)).collect();
    let science: Vec<Option<f64>> = (1..=10).map(|i| Some((i * 7 % 10) as f64)).collect();
    let edu: Vec<Option<f64>> = ids
        .iter()
        .zip(&science)
        .map(|(id, s)| Some(2.0 * id.unwrap() - s.unwrap() + 1.0))
        .collect();
    Table::from_columns([
        ("id", Column::Numeric(ids)),
        ("edu_index", Column::Numeric(edu)),
        ("science_index", Column::Numeric(science)),
    ])
    .unwrap()
}

#[test]
fn test_split_shapes_and_artifact_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = TabularDataset::new(
        &small_table(),
        "small",
        "edu_index",
        0.3,
        Some(dir.path()),
        Some(3),
    )
    .unwrap();
    assert_eq!(dataset.split().x_train.n_rows(), 7);
    assert_eq!(dataset.split().x_test.n_rows(), 3);
    assert_eq!(dataset.features(), ["id", "science_index"]);
    let (train_file, test_file) = dataset.split_files().unwrap();
    assert!(train_file.exists() && test_file.exists());

    let (fitted, path) = Pipe::new(dataset, ModelKind::LinearRegression)
        .fit(None, dir.path())
        .unwrap();
    assert!(path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .ends_with("_LINEAR_REGRESSION_model.bin"));

    let loaded = FittedPipe::load(&path).unwrap();
    assert_eq!(loaded.kind(), ModelKind::LinearRegression);
    assert_eq!(loaded.predict().unwrap(), fitted.predict().unwrap());

    // exact linear target: held-out predictions land close to the truth
    let truth = &loaded.dataset().split().y_test;
    for (p, t) in loaded.predict().unwrap().iter().zip(truth) {
        assert!((p - t).abs() < 0.5, "prediction {p} vs target {t}");
    }
}

/// Every schema column present: indicators are noisy copies of one size
/// measure, and roughly one cell in twenty is missing.
fn wide_table(rows: usize) -> Table {
    let mut rng = StdRng::seed_from_u64(11);
    let base: Vec<f64> = (0..rows).map(|i| 1.0 + 0.5 * i as f64).collect();
    let columns = DATA_COLUMNS.iter().enumerate().map(|(j, name)| {
        let values: Vec<Option<f64>> = base
            .iter()
            .enumerate()
            .map(|(i, b)| match j {
                0 => Some((i + 1) as f64),
                1 => Some(2.0 * b + 1.0 + rng.gen_range(-0.05..0.05)),
                _ if rng.gen_bool(0.05) => None,
                _ => Some(b * (1.0 + 0.01 * j as f64) + rng.gen_range(-0.05..0.05)),
            })
            .collect();
        (*name, Column::Numeric(values))
    });
    Table::from_columns(columns.collect::<Vec<_>>()).unwrap()
}

#[test]
fn test_every_family_fits_wide_correlated_table() {
    let dir = tempfile::tempdir().unwrap();
    let table = wide_table(60);
    for kind in ModelKind::ALL {
        let dataset = TabularDataset::new(&table, "wide", "edu_index", 0.3, None, Some(7)).unwrap();
        assert_eq!(dataset.features().len(), DATA_COLUMNS.len() - 1);
        let (fitted, _) = Pipe::new(dataset, kind).fit(None, dir.path()).unwrap();

        let predictions = fitted.predict().unwrap();
        let truth = &fitted.dataset().split().y_test;
        assert_eq!(predictions.len(), truth.len());
        assert!(predictions.iter().all(|p| p.is_finite()), "{kind}");
        // targets span roughly 2..61
        let mae = predictions
            .iter()
            .zip(truth)
            .map(|(p, t)| (p - t).abs())
            .sum::<f64>()
            / truth.len() as f64;
        assert!(mae < 6.0, "{kind}: mean absolute error {mae}");
    }
}

#[test]
fn test_load_missing_artifact_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(FittedPipe::load(dir.path().join("absent_model.bin")).is_err());
}

fn indicator_workbook(path: &Path, rows: usize) {
    let header: Vec<String> = DATA_COLUMNS.iter().map(|c| c.to_string()).collect();
    let mut data = Sheet::new(DATA_SHEET, header);
    for id in 1..=rows {
        let x = id as f64;
        let mut row = vec![Cell::Empty; DATA_COLUMNS.len()];
        row[0] = Cell::Number(x);
        row[2] = Cell::Number((id * 3 % 7) as f64);
        row[3] = Cell::Text(format!("{},5", id % 4));
        row[1] = Cell::Number(0.5 * x + (id * 3 % 7) as f64);
        data.rows.push(row);
    }
    // the last entity has no target and is dropped before training
    let mut unlabelled = vec![Cell::Empty; DATA_COLUMNS.len()];
    unlabelled[0] = Cell::Number((rows + 1) as f64);
    data.rows.push(unlabelled);

    let mut about = Sheet::new(INFO_SHEET, INFO_COLUMNS.iter().map(|c| c.to_string()).collect());
    for (i, name) in DATA_COLUMNS.iter().skip(1).enumerate() {
        about.rows.push(vec![
            Cell::Number((i + 1) as f64),
            Cell::Text(name.to_string()),
            Cell::Text(format!("description of {name}")),
        ]);
    }
    write_workbook(path, &[data, about]).unwrap();
}

fn settings_in(root: &Path) -> Settings {
    Settings {
        sqlalchemy_database: format!("sqlite:///{}", root.join("db/indicators.db").display()),
        data_path: root.join("data.xlsx"),
        estimated_models_path: root.join("models"),
        model_parameters_path: root.join("parameters"),
        storage_path: root.join("split"),
        prediction_path: root.join("predictions"),
        random_state: Some(42),
        ..Settings::default()
    }
}

#[test]
fn test_import_train_predict_workflow() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    indicator_workbook(&settings.data_path, 12);

    let summary = tasks::import_data(&settings).unwrap();
    assert_eq!(summary.data_rows, 13);
    assert_eq!(summary.info_rows, DATA_COLUMNS.len() - 1);

    let store = ArtifactStore::from_settings(&settings);
    store.ensure_dirs().unwrap();
    let params = json!({"alpha": 0.5, "max_iter": 300, "tol": 0.001});
    store
        .write_params(ModelKind::RidgeRegression, params.as_object().unwrap())
        .unwrap();

    let artifact = tasks::train(&settings, ModelKind::RidgeRegression).unwrap();
    assert!(artifact.starts_with(&settings.estimated_models_path));
    let name = artifact.file_name().unwrap().to_string_lossy().to_string();
    assert_eq!(store.list().unwrap(), vec![name.clone()]);

    let pipe = FittedPipe::load(&artifact).unwrap();
    match pipe.estimator() {
        Estimator::Ridge { alpha, config } => {
            assert_eq!(*alpha, 0.5);
            assert_eq!(config.max_iter, 300);
        }
        other => panic!("unexpected estimator {other:?}"),
    }
    // 12 labelled rows, 30% held out
    assert_eq!(pipe.dataset().len(), 12);
    assert_eq!(pipe.dataset().split().y_test.len(), 4);

    let split_files = std::fs::read_dir(&settings.storage_path).unwrap().count();
    assert_eq!(split_files, 2);

    // a bare file name resolves inside the estimated-models directory
    let predictions = tasks::predict(&settings, Path::new(&name)).unwrap();
    assert!(predictions.starts_with(&settings.prediction_path));
    let grid = read_sheet(&predictions, "predictions").unwrap();
    assert_eq!(grid.len(), 1 + 4);
    assert_eq!(grid[0][0].as_text().as_deref(), Some("index"));
    assert_eq!(grid[0][1].as_text().as_deref(), Some("prediction"));
    assert!(grid[1..].iter().all(|row| row[1].as_number().is_some_and(f64::is_finite)));
}

#[test]
fn test_train_without_store_fails() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    assert!(tasks::train(&settings, ModelKind::LinearRegression).is_err());
}
