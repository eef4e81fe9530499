use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use indicators_mlops::estimator::Estimator;
use indicators_mlops::preprocessing::{FittedTransformer, Preprocessor, Transformer};
use indicators_mlops::table::{Column, Table};
use indicators_mlops::ModelKind;
use ndarray::Array1;

/// Indicator-shaped table: sparse numeric columns plus one categorical column.
fn synthetic_table(rows: usize, numeric: usize) -> Table {
    let mut table = Table::new();
    for j in 0..numeric {
        let values = (0..rows)
            .map(|i| {
                // every fifth column is mostly empty
                if j % 5 == 0 && i % 3 != 0 {
                    None
                } else {
                    Some(((i * 31 + j * 17) % 97) as f64 / 7.0)
                }
            })
            .collect();
        table.push_column(format!("x{j}"), Column::Numeric(values)).unwrap();
    }
    let region = (0..rows)
        .map(|i| (i % 11 != 0).then(|| format!("region_{}", i % 8)))
        .collect();
    table.push_column("region", Column::Text(region)).unwrap();
    table
}

fn bench_preprocessor(c: &mut Criterion) {
    for rows in [100usize, 1000] {
        let table = synthetic_table(rows, 125);
        c.bench_with_input(BenchmarkId::new("preprocessor_fit", rows), &table, |b, t| {
            b.iter(|| black_box(Preprocessor::default().fit(black_box(t)).unwrap()))
        });

        let fitted = Preprocessor::default().fit(&table).unwrap();
        c.bench_with_input(
            BenchmarkId::new("preprocessor_transform", rows),
            &table,
            |b, t| b.iter(|| black_box(fitted.transform(black_box(t)).unwrap())),
        );
    }
}

fn bench_estimator_fit(c: &mut Criterion) {
    let table = synthetic_table(500, 125);
    let x = Preprocessor::default()
        .fit(&table)
        .unwrap()
        .transform(&table)
        .unwrap();
    let y: Array1<f64> = x.column(1).mapv(|v| 3.0 * v + 1.0);

    let mut group = c.benchmark_group("estimator_fit");
    group.sample_size(10);
    for kind in ModelKind::ALL {
        let estimator = Estimator::new(kind);
        group.bench_function(kind.name(), |b| {
            b.iter(|| black_box(estimator.fit(x.clone(), y.clone()).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_preprocessor, bench_estimator_fit);
criterion_main!(benches);
