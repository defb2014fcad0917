//! Benchmarks for docxcraft building performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks cover table merging, section traversal and loading.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use docxcraft::Document;

/// Creates a document with `section_count` sections of five paragraphs each.
fn create_sectioned_document(section_count: usize) -> Document {
    let mut doc = Document::new();
    for s in 0..section_count {
        for i in 0..5 {
            doc.append_paragraph_with_text(&format!("Section {} paragraph {}", s, i));
        }
        if s + 1 < section_count {
            doc.append_section_break();
        }
    }
    doc
}

/// Benchmark building a table and merging every row into one wide cell.
fn bench_table_merges(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_merges");

    for size in [4usize, 16, 32].iter() {
        group.bench_with_input(BenchmarkId::new("grid", size), size, |b, &size| {
            b.iter(|| {
                let mut doc = Document::new();
                let table = doc.append_table(size, size);
                for row in 0..size {
                    let mut first = table.cell(&doc, row, 0);
                    for col in 1..size {
                        let mut next = table.cell(&doc, row, col);
                        table.merge_cells(&mut doc, &mut first, &mut next);
                    }
                }
                black_box(table.physical_cell_count(&doc, 0))
            });
        });
    }

    group.finish();
}

/// Benchmark walking sections from first to last.
fn bench_section_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("section_traversal");

    for count in [10usize, 50, 200].iter() {
        let doc = create_sectioned_document(*count);

        group.bench_with_input(BenchmarkId::new("sections", count), &doc, |b, doc| {
            b.iter(|| {
                let mut section = doc.first_section();
                let mut visited = 0;
                while section.is_valid(doc) {
                    visited += 1;
                    section = section.next(doc);
                }
                black_box(visited)
            });
        });
    }

    group.finish();
}

/// Benchmark loading a saved package.
fn bench_loading(c: &mut Criterion) {
    let mut group = c.benchmark_group("loading");

    for count in [10usize, 100].iter() {
        let mut doc = create_sectioned_document(*count);
        let table = doc.append_table(10, 10);
        let mut a = table.cell(&doc, 0, 0);
        let mut b = table.cell(&doc, 1, 0);
        table.merge_cells(&mut doc, &mut a, &mut b);
        let data = doc.to_bytes().unwrap();

        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("sections", count), &data, |b, data| {
            b.iter(|| {
                let _ = Document::from_bytes(black_box(data.clone()));
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_table_merges,
    bench_section_traversal,
    bench_loading,
);
criterion_main!(benches);
