use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use makini_diff::{compute_line_alignments, DiffOptions};

/// A source-like file with `n` numbered three-line blocks.
fn blocks(n: usize, tag: &str) -> Vec<String> {
    let mut lines = Vec::with_capacity(n * 4);
    for i in 0..n {
        lines.push(format!("fn {tag}_{i}() {{"));
        lines.push(format!("    work({i});"));
        lines.push("}".to_string());
        lines.push(String::new());
    }
    lines
}

/// Touches every 10th block: rename and body change.
fn scattered_edits(n: usize) -> (Vec<String>, Vec<String>) {
    let before = blocks(n, "item");
    let mut after = before.clone();
    for i in (0..n).step_by(10) {
        after[i * 4] = format!("fn item_{i}_renamed() {{");
        after[i * 4 + 1] = format!("    work_harder({i});");
    }
    (before, after)
}

/// Appends one block, the common editor hot path.
fn appended_block(n: usize) -> (Vec<String>, Vec<String>) {
    let before = blocks(n, "item");
    let mut after = before.clone();
    after.extend(blocks(1, "appended"));
    (before, after)
}

/// Nothing in common: worst case for the edit-script search.
fn disjoint(n: usize) -> (Vec<String>, Vec<String>) {
    (blocks(n, "left"), blocks(n, "right"))
}

fn bench_pipeline(c: &mut Criterion) {
    let options = DiffOptions::default();
    let mut group = c.benchmark_group("pipeline");
    for size in [50usize, 500] {
        let (before, after) = scattered_edits(size);
        group.bench_with_input(BenchmarkId::new("scattered", size * 4), &size, |b, _| {
            b.iter(|| compute_line_alignments(black_box(&before), black_box(&after), &options))
        });
        let (before, after) = appended_block(size);
        group.bench_with_input(BenchmarkId::new("append", size * 4), &size, |b, _| {
            b.iter(|| compute_line_alignments(black_box(&before), black_box(&after), &options))
        });
    }
    group.finish();
}

fn bench_pathological(c: &mut Criterion) {
    // a budget keeps the disjoint case bounded, as an editor host would
    let options = DiffOptions {
        timeout_ms: 20,
        ..DiffOptions::default()
    };
    let mut group = c.benchmark_group("pathological");
    let (before, after) = disjoint(500);
    group.bench_function("disjoint_with_budget", |b| {
        b.iter(|| compute_line_alignments(black_box(&before), black_box(&after), &options))
    });
    group.finish();
}

criterion_group!(benches, bench_pipeline, bench_pathological);
criterion_main!(benches);
