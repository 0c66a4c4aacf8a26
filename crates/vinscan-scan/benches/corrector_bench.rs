// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for OCR candidate correction.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use vinscan_scan::corrector::{correct_barcode_text, correct_ocr_text};

fn bench_correct(c: &mut Criterion) {
    c.bench_function("correct clean VIN", |b| {
        b.iter(|| correct_ocr_text(black_box("1HGCM82633A004352")));
    });

    c.bench_function("correct noisy line", |b| {
        b.iter(|| correct_ocr_text(black_box("VIN: 1HGCM8Z633AOO4352 / MADE IN USA")));
    });

    // Sixteen ambiguous positions, the largest possible expansion.
    c.bench_function("correct ambiguous B/8 run", |b| {
        b.iter(|| correct_ocr_text(black_box("88888888O88888888")));
    });

    c.bench_function("correct barcode payload", |b| {
        b.iter(|| correct_barcode_text(black_box("I1HGCM82633A004352")));
    });
}

criterion_group!(benches, bench_correct);
criterion_main!(benches);
