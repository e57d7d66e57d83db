//! Benchmarks for pipeline execution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use docflow::pipeline::{DocumentPipeline, DocumentRequest};
use docflow::stages::StageName;
use docflow::testing::ScriptedGenerator;
use std::sync::Arc;

fn scripted_run(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");

    c.bench_function("scripted_full_run", |b| {
        b.iter(|| {
            rt.block_on(async {
                let generator = ScriptedGenerator::new()
                    .with_reply(StageName::Enhancement, "enhanced prompt")
                    .with_reply(StageName::Processing, "the extract")
                    .with_reply(StageName::Processing, "the draft")
                    .with_reply(StageName::Validation, "Score: 90\nFeedback: fine");

                let pipeline = DocumentPipeline::builder()
                    .generator(Arc::new(generator))
                    .max_review_cycles(1)
                    .build()
                    .expect("pipeline builds");

                let report = pipeline
                    .run(DocumentRequest::new("The sky is blue.", "What color?"))
                    .await
                    .expect("run completes");
                black_box(report);
            });
        });
    });
}

criterion_group!(benches, scripted_run);
criterion_main!(benches);
