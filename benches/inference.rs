use criterion::{black_box, criterion_group, criterion_main, Criterion};
use car_price_engine::inference::InferenceConfig;
use car_price_engine::pipeline::LoadedPipeline;
use car_price_engine::service::PricingService;

#[path = "../tests/common/mod.rs"]
mod common;

fn create_service(config: InferenceConfig) -> PricingService {
    let artifact = common::car_artifact();
    let pipeline = LoadedPipeline::from_artifact(artifact, "bench".to_string()).unwrap();
    PricingService::new(pipeline, config)
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");
    let service = create_service(InferenceConfig::default());
    let raw = common::corolla();

    group.bench_function("predict", |b| {
        b.iter(|| service.predict(black_box(&raw)))
    });

    group.finish();
}

fn bench_explain(c: &mut Criterion) {
    let mut group = c.benchmark_group("explain");

    let cached = create_service(InferenceConfig::default());
    group.bench_function("cached", |b| b.iter(|| cached.explain()));

    let uncached = create_service(InferenceConfig::default().without_importance_cache());
    group.bench_function("uncached", |b| b.iter(|| uncached.explain()));

    group.finish();
}

criterion_group!(benches, bench_prediction, bench_explain);
criterion_main!(benches);
