use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use medcat::prelude::*;

// Synthetic reference table shaped like the CNOPS list
fn synthetic_table(rows: usize) -> SourceTable {
    let rates = ["70%", "0%", "85%", "100%", "Taux 75 %", "", "non remboursable"];
    let flags = ["P", "G", ""];

    let rows = (0..rows)
        .map(|i| SourceRow {
            name: CellValue::Text(format!("MEDICAMENT {}", i)),
            active_ingredient: CellValue::Text("PARACETAMOL".to_string()),
            dosage_value: CellValue::Text(((i % 10 + 1) * 100).to_string()),
            dosage_unit: CellValue::Text("MG".to_string()),
            form: CellValue::Text("COMPRIME".to_string()),
            presentation: CellValue::Text("BOITE DE 20".to_string()),
            public_price: if i % 50 == 0 {
                CellValue::Empty
            } else {
                CellValue::Text(format!("{:.2}", 5.0 + (i % 400) as f64 * 1.25))
            },
            base_reimbursement_price: CellValue::Number(4.0 + (i % 300) as f64),
            reference_rate_raw: CellValue::Text(rates[i % rates.len()].to_string()),
            product_kind_flag: CellValue::Text(flags[i % flags.len()].to_string()),
        })
        .collect();

    SourceTable::new(rows)
}

fn benchmark_rate_parsing(c: &mut Criterion) {
    let cells = [
        CellValue::Text("70%".to_string()),
        CellValue::Text("Taux de remboursement : 80 %".to_string()),
        CellValue::Number(90.0),
        CellValue::Empty,
    ];

    c.bench_function("parse_and_derive_rate", |b| {
        b.iter(|| {
            for cell in &cells {
                black_box(derive_rate(parse_percentage(black_box(cell))));
            }
        })
    });
}

fn benchmark_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform");

    for size in [1_000usize, 10_000] {
        let table = synthetic_table(size);

        group.bench_with_input(BenchmarkId::new("sequential", size), &table, |b, table| {
            let transformer = Transformer::new().with_progress_bar(false);
            b.iter(|| black_box(transformer.transform(table)))
        });

        group.bench_with_input(BenchmarkId::new("parallel", size), &table, |b, table| {
            let transformer = Transformer::new().with_progress_bar(false).with_parallel(true);
            b.iter(|| black_box(transformer.transform(table)))
        });
    }

    group.finish();
}

fn benchmark_export(c: &mut Criterion) {
    let result = Transformer::new()
        .with_progress_bar(false)
        .transform(&synthetic_table(5_000));

    c.bench_function("render_pretty_json_5000", |b| {
        let exporter = JsonExporter::new();
        b.iter(|| black_box(exporter.render(&result.records)))
    });
}

criterion_group!(benches, benchmark_rate_parsing, benchmark_transform, benchmark_export);
criterion_main!(benches);
