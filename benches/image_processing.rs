use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{DynamicImage, ImageBuffer, ImageOutputFormat, RgbImage};
use std::io::Cursor;

use stackit_server::storage::local::{transcode_image, validate_pdf};

fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let img: RgbImage = ImageBuffer::from_fn(width, height, |x, y| {
        let r = (x % 256) as u8;
        let g = (y % 256) as u8;
        let b = ((x + y) % 256) as u8;
        image::Rgb([r, g, b])
    });

    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buffer), ImageOutputFormat::Png)
        .expect("Failed to encode PNG");
    buffer
}

fn bench_transcode_by_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("transcode_by_size");
    group.sample_size(20);

    // The first two fit within the bound and are only re-encoded.
    let sizes = vec![(800, 600), (1920, 1080), (2560, 1440), (4000, 3000)];

    for (width, height) in sizes {
        let png = create_test_png(width, height);
        group.bench_with_input(
            BenchmarkId::new("png_to_jpeg", format!("{}x{}", width, height)),
            &png,
            |b, data| b.iter(|| transcode_image(black_box(data), 1920, 85)),
        );
    }

    group.finish();
}

fn bench_transcode_quality(c: &mut Criterion) {
    let mut group = c.benchmark_group("transcode_quality");

    let png = create_test_png(1280, 720);
    let qualities = vec![50, 75, 85, 95];

    for quality in qualities {
        group.bench_with_input(
            BenchmarkId::new("quality", quality),
            &quality,
            |b, &q| b.iter(|| transcode_image(black_box(&png), 1920, black_box(q))),
        );
    }

    group.finish();
}

fn bench_pdf_validation(c: &mut Criterion) {
    let mut pdf = b"%PDF-1.7\n".to_vec();
    pdf.resize(5 * 1024 * 1024, b' ');

    c.bench_function("validate_pdf_5mb", |b| b.iter(|| validate_pdf(black_box(&pdf))));
}

criterion_group!(
    benches,
    bench_transcode_by_size,
    bench_transcode_quality,
    bench_pdf_validation
);
criterion_main!(benches);
