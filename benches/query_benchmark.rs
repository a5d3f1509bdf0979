use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use csvql::{CsvConfig, Database, Table, Value, storage};
use std::hint::black_box;

fn employees(n: usize) -> Table {
    let rows = (0..n)
        .map(|i| {
            vec![
                Value::Int(i as i64),
                Value::from(format!("user{i}")),
                Value::from(["eng", "ops", "sales", "hr"][i % 4]),
                Value::Int(1000 + (i % 100) as i64 * 10),
            ]
        })
        .collect();
    Table::from_rows("employees", &["id", "name", "dept", "salary"], rows).unwrap()
}

fn setup_populated_db(n: usize) -> Database {
    let mut db = Database::new();
    db.register_table("employees", employees(n));
    db
}

fn bench_filter_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("Select_Where_Performance");

    for n in [1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
            let db = setup_populated_db(n);
            b.iter(|| {
                let res = db
                    .query("SELECT name FROM employees WHERE salary > 1500 AND dept = 'eng'")
                    .unwrap();
                black_box(res);
            });
        });
    }
    group.finish();
}

fn bench_group_by(c: &mut Criterion) {
    let mut group = c.benchmark_group("Group_By_Performance");

    for n in [1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
            let db = setup_populated_db(n);
            b.iter(|| {
                let res = db
                    .query(
                        "SELECT dept, COUNT(*), AVG(salary), STDDEV(salary) \
                         FROM employees GROUP BY dept ORDER BY dept",
                    )
                    .unwrap();
                black_box(res);
            });
        });
    }
    group.finish();
}

fn bench_window(c: &mut Criterion) {
    let mut group = c.benchmark_group("Window_Performance");
    let db = setup_populated_db(5000);
    group.bench_function("rank_partitioned", |b| {
        b.iter(|| {
            let res = db
                .query(
                    "SELECT name, RANK() OVER (PARTITION BY dept ORDER BY salary DESC) \
                     FROM employees",
                )
                .unwrap();
            black_box(res);
        });
    });
    group.finish();
}

fn bench_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("Join_Performance");
    let mut db = setup_populated_db(500);
    let depts = Table::from_rows(
        "depts",
        &["code", "title"],
        ["eng", "ops", "sales", "hr"]
            .iter()
            .map(|d| vec![Value::from(*d), Value::from(d.to_uppercase())])
            .collect(),
    )
    .unwrap();
    db.register_table("depts", depts);

    group.bench_function("inner_join_500x4", |b| {
        b.iter(|| {
            let res = db
                .query("SELECT e.name, d.title FROM employees e JOIN depts d ON e.dept = d.code")
                .unwrap();
            black_box(res);
        });
    });
    group.finish();
}

fn bench_csv_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("Csv_Load");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("employees.csv");
    storage::save(&path, &employees(10000), &CsvConfig::default()).unwrap();

    group.bench_function("load_10000_rows", |b| {
        b.iter(|| {
            let table = storage::load(black_box(&path), &CsvConfig::default()).unwrap();
            black_box(table);
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_filter_scaling,
    bench_group_by,
    bench_window,
    bench_join,
    bench_csv_load
);
criterion_main!(benches);
