use biffwriter::biff::BiffEncoder;
use biffwriter::ole::{self, SectorLayout};
use biffwriter::types::{CellFormat, Font, HAlign, VAlign};
use biffwriter::XlsWriter;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tempfile::NamedTempFile;

fn build_encoder(rows: u16) -> BiffEncoder {
    let mut encoder = BiffEncoder::new();
    let font = encoder.add_font(&Font::new("Arial", 10));
    let style = encoder.add_cell_style(&CellFormat::new(font, 0, HAlign::General, VAlign::Bottom));

    for row in 0..rows {
        encoder.add_data(f64::from(row), row, 0, style);
        encoder.add_data(format!("Name_{}", row % 500), row, 1, style);
        encoder.add_data(f64::from(row) * 100.0, row, 2, style);
    }
    encoder
}

fn benchmark_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    group.sample_size(10); // Reduce samples for large benchmarks

    for size in [100u16, 1000, 10000, 60000].iter() {
        let encoder = build_encoder(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(encoder.get_biff_data().unwrap()));
        });
    }

    group.finish();
}

fn benchmark_upload(c: &mut Criterion) {
    let mut group = c.benchmark_group("upload");
    group.sample_size(10);

    for size in [1000u16, 10000, 60000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let temp = NamedTempFile::new().unwrap();
                let mut writer = XlsWriter::new(temp.path());
                for row in 0..size {
                    writer.add_text_or_number(&row.to_string(), row, 0, Default::default());
                    writer.add_data(format!("Name_{}", row), row, 1, Default::default());
                }
                writer.upload().unwrap();
            });
        });
    }

    group.finish();
}

fn benchmark_container(c: &mut Criterion) {
    let mut group = c.benchmark_group("container");

    for sectors in [8usize, 1_000, 20_000].iter() {
        let stream = vec![0x5Au8; sectors * ole::SECTOR_SIZE];
        group.bench_with_input(BenchmarkId::from_parameter(sectors), sectors, |b, _| {
            b.iter(|| {
                let layout = SectorLayout::compute(stream.len());
                black_box(ole::format_sat(&layout));
                black_box(ole::format_msat(&layout));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_encode, benchmark_upload, benchmark_container);
criterion_main!(benches);
