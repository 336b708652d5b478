use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use datagrid_core::config::ColumnConfigMap;
use datagrid_core::data::RawValue;
use datagrid_core::editor::{DataEditor, RowPolicy};
use datagrid_core::snapshot::TableSnapshot;
use datagrid_core::sort::{SortDirection, SortIndexMapper};
use datagrid_core::source::{Field, PhysicalType, SourceColumn, SourceTable};

fn generate_orders(rows: usize) -> SourceTable {
    let mut ids = Vec::with_capacity(rows);
    let mut totals = Vec::with_capacity(rows);
    let mut statuses = Vec::with_capacity(rows);
    for i in 0..rows {
        ids.push(RawValue::Int(i as i64));
        totals.push(RawValue::Float(((i * 7919) % 10_007) as f64 / 100.0));
        statuses.push(RawValue::Text(
            match i % 3 {
                0 => "shipped",
                1 => "pending",
                _ => "processing",
            }
            .to_string(),
        ));
    }
    SourceTable::new(
        vec![SourceColumn::new(Field::new("id", PhysicalType::Int64), ids)],
        vec![
            SourceColumn::new(Field::new("total", PhysicalType::Float64), totals),
            SourceColumn::new(Field::new("status", PhysicalType::Text), statuses),
        ],
        None,
    )
    .expect("orders table")
}

fn bench_sort(c: &mut Criterion) {
    let snapshot = TableSnapshot::new(generate_orders(10_000), &ColumnConfigMap::new());

    let mut group = c.benchmark_group("sort_permutation");
    group.bench_function("smart_numeric_desc", |b| {
        b.iter(|| {
            let mut mapper = SortIndexMapper::new();
            mapper.sort_by(&snapshot, 1, SortDirection::Desc);
            mapper.to_unsorted_row(0)
        })
    });
    group.bench_function("text_asc", |b| {
        b.iter(|| {
            let mut mapper = SortIndexMapper::new();
            mapper.sort_by(&snapshot, 2, SortDirection::Asc);
            mapper.to_unsorted_row(0)
        })
    });
    group.bench_function("edit_while_sorted", |b| {
        b.iter_batched(
            || {
                let snapshot = TableSnapshot::new(generate_orders(2_000), &ColumnConfigMap::new());
                let mut editor = DataEditor::new(snapshot, RowPolicy::Dynamic);
                editor.sort(1, SortDirection::Asc).expect("sort");
                editor
            },
            |mut editor| {
                editor
                    .edit_cell(1, 0, RawValue::Float(1.0))
                    .expect("edit");
                editor
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_sort);
criterion_main!(benches);
