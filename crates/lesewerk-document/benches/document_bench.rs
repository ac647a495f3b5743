// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for page rasterisation in the lesewerk-document crate.
// Renders a synthetic one-page scan (letter-sized gray image) at the
// resolutions a pipeline run typically uses, then converts to RGB the way a
// worker does before recognition.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lopdf::{Document, Object, Stream, dictionary};

use lesewerk_document::{ImageProcessor, PdfReader};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// One US-letter page carrying a 1275x1650 gray scan (150 dpi).
fn letter_scan_pdf() -> Vec<u8> {
    let (width, height) = (1275_i64, 1650_i64);
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8_i64,
        },
        vec![200u8; (width * height) as usize],
    ));
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        b"q 612 0 0 792 0 0 cm /Im0 Do Q".to_vec(),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(612), Object::Integer(792)],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1_i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .expect("in-memory PDF serialisation cannot fail");
    output
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_render_page(c: &mut Criterion) {
    let bytes = letter_scan_pdf();
    let reader = PdfReader::from_bytes(&bytes).expect("fixture PDF parses");

    for dpi in [150.0_f32, 300.0] {
        c.bench_function(&format!("render_page letter @ {dpi} dpi"), |b| {
            b.iter(|| {
                let page = reader.render(black_box(0), black_box(dpi)).expect("page renders");
                black_box(ImageProcessor::from_dynamic(page).into_rgb8());
            });
        });
    }
}

criterion_group!(benches, bench_render_page);
criterion_main!(benches);
