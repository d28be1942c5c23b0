//! Gradebook performance benchmarks
//!
//! Measures the hot paths of a request:
//! - Grade computation from marks
//! - Form body decoding
//! - Scanning a store file with many records
//!
//! Run with: cargo bench --bench gradebook_performance

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gradebook::form::{parse_form, url_decode};
use gradebook::grade::compute_grade;
use gradebook::record::StudentRecord;
use gradebook::store::block::{decode_all, encode};
use std::io::Cursor;

const FORM: &str = "name=John%20Doe&roll=42&branch=Computer+Science&semester=5&year=3\
                    &mark1=78.5&mark2=91&mark3=66.25&mark4=88&mark5=73";

fn bench_compute_grade(c: &mut Criterion) {
    let marks = [95.0, 90.0, 88.0, 92.0, 97.0];

    c.bench_function("compute_grade", |b| {
        b.iter(|| black_box(compute_grade(black_box(&marks))));
    });
}

fn bench_form_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("form_decoding");
    group.throughput(Throughput::Bytes(FORM.len() as u64));

    group.bench_function("parse_form", |b| {
        b.iter(|| black_box(parse_form(black_box(FORM))));
    });

    group.bench_function("url_decode", |b| {
        b.iter(|| black_box(url_decode(black_box("John%20Doe+%26+Jane%2FDoe"))));
    });

    group.finish();
}

fn store_contents(records: usize) -> Vec<u8> {
    let mut contents = String::new();
    for roll in 1..=records {
        let record = StudentRecord {
            name: format!("Student {}", roll),
            branch: "CS".to_string(),
            roll: roll as i32,
            semester: 3,
            year: 2,
            marks: [70.0, 75.5, 80.0, 65.25, 90.0],
        };
        contents.push_str(&encode(&record));
    }
    contents.into_bytes()
}

fn bench_store_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_scan");

    for records in [10, 100, 1000] {
        let contents = store_contents(records);
        group.throughput(Throughput::Bytes(contents.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(records), &contents, |b, contents| {
            b.iter(|| black_box(decode_all(Cursor::new(contents.as_slice())).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compute_grade, bench_form_decoding, bench_store_scan);
criterion_main!(benches);
