//! Pipeline performance benchmarks

use antforge::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::fs;
use tempfile::TempDir;

fn primary_button() -> RawNode {
    RawNode::new("1:1", "Primary Button", NodeKind::Frame)
        .with_box(0.0, 0.0, 120.0, 32.0)
        .with_child(RawNode::text("1:2", "Label", "Submit").with_box(16.0, 8.0, 60.0, 16.0))
}

/// A vertical form with `fields` labelled inputs and a submit button
fn large_form(fields: usize) -> RawNode {
    let mut form = RawNode::new("2:0", "Signup Form", NodeKind::Frame).with_box(0.0, 0.0, 400.0, 80.0 * fields as f64);
    for i in 0..fields {
        let y = 80.0 * i as f64;
        let item = RawNode::new(format!("3:{}", i), format!("Form Item {}", i), NodeKind::Frame)
            .with_box(0.0, y, 400.0, 72.0)
            .with_children(vec![
                RawNode::text(format!("4:{}", i), "Label", format!("Field {}", i)).with_box(0.0, y, 120.0, 20.0),
                RawNode::new(format!("5:{}", i), "Text Input", NodeKind::Frame)
                    .with_box(0.0, y + 28.0, 400.0, 40.0)
                    .with_child(RawNode::text(format!("6:{}", i), "Placeholder", "Type here").with_box(12.0, y + 38.0, 100.0, 20.0)),
            ]);
        form = form.with_child(item);
    }
    form.with_child(primary_button())
}

fn bench_simple_conversion(c: &mut Criterion) {
    let raw = primary_button();

    c.bench_function("simple_conversion", |b| {
        b.iter(|| convert_document(black_box(&raw), None).unwrap())
    });
}

fn bench_large_form_conversion(c: &mut Criterion) {
    let raw = large_form(200);
    let pipeline = Pipeline::new(PipelineOptions::default()).unwrap();

    c.bench_function("large_form_conversion", |b| {
        b.iter(|| pipeline.convert_document(black_box(&raw), None).unwrap())
    });
}

fn bench_mapping_only(c: &mut Criterion) {
    let semantic = ingest(&large_form(200), None).unwrap();
    let engine = MappingEngine::new(std::sync::Arc::new(CatalogIndex::builtin()), MappingConfig::default());

    c.bench_function("mapping_only", |b| b.iter(|| engine.map_tree(black_box(&semantic))));
}

fn bench_validation_only(c: &mut Criterion) {
    let raw = large_form(200);
    let options = PipelineOptions {
        validate_output: false,
        ..Default::default()
    };
    let source = Pipeline::new(options)
        .unwrap()
        .convert_document(&raw, None)
        .unwrap()
        .output
        .source_text;
    let validator = Validator::new();
    let validator_options = ValidatorOptions::default();

    c.bench_function("validation_only", |b| {
        b.iter(|| validator.validate(black_box(&source), &validator_options))
    });
}

fn bench_file_conversion(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let input_path = temp_dir.path().join("signup.json");
    let output_path = temp_dir.path().join("SignupForm.tsx");

    let document = RawNode::new("0:0", "Document", NodeKind::Document).with_child(large_form(50));
    fs::write(&input_path, serde_json::to_string(&document).unwrap()).unwrap();

    c.bench_function("file_conversion", |b| {
        b.iter(|| {
            convert_file_with_options(
                black_box(input_path.to_str().unwrap()),
                black_box(output_path.to_str().unwrap()),
                Some("2:0"),
                PipelineOptions::default(),
            )
            .unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_simple_conversion,
    bench_large_form_conversion,
    bench_mapping_only,
    bench_validation_only,
    bench_file_conversion
);
criterion_main!(benches);
