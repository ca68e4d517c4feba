//! Criterion benchmarks for Glaive.
//!
//! Covers feature extraction, training and inference on a synthetic corpus.

use std::hint::black_box;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use glaive::analysis::{FeatureExtractor, FeatureSet, SimpleFeatureExtractor};
use glaive::classifier::{IntentModel, Trainer, TrainingConfig, TrainingExample};

const WORDS: &[&str] = &[
    "book", "flight", "hotel", "weather", "today", "tomorrow", "play", "music", "song", "stop",
    "cancel", "order", "pizza", "call", "mom", "alarm", "set", "timer", "news", "read", "turn",
    "lights", "off", "on", "volume", "up", "down", "price", "stock", "traffic",
];

/// Generate a corpus of `intents` intents with `per_intent` utterances each.
fn generate_corpus(intents: usize, per_intent: usize) -> Vec<TrainingExample> {
    let mut examples = Vec::with_capacity(intents * per_intent);
    for intent in 0..intents {
        for i in 0..per_intent {
            let keys: Vec<String> = (0..4)
                .map(|k| {
                    let word = WORDS[(intent * 7 + i * 3 + k) % WORDS.len()];
                    format!("{word}_{}", (intent + k) % 5)
                })
                .collect();
            examples.push(TrainingExample::new(
                FeatureSet::from_keys(keys),
                format!("intent_{intent}"),
            ));
        }
    }
    examples
}

fn trained_model(examples: &[TrainingExample]) -> IntentModel {
    let config = TrainingConfig {
        fixed_error: true,
        max_iterations: 200,
        ..Default::default()
    };
    Trainer::new(config).train(examples).unwrap().0
}

fn bench_feature_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("feature_extraction");
    let extractor = SimpleFeatureExtractor::new().with_english_stop_words();
    let text = "Could you please book a flight to Tokyo for tomorrow morning?";

    group.bench_function("extract_single_utterance", |b| {
        b.iter(|| extractor.extract(black_box("en"), black_box(text)).unwrap())
    });
    group.finish();
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10);

    let examples = generate_corpus(20, 10);
    group.throughput(Throughput::Elements(examples.len() as u64));
    group.bench_function("train_fixed_100_iterations", |b| {
        let config = TrainingConfig {
            fixed_error: true,
            max_iterations: 100,
            ..Default::default()
        };
        b.iter(|| {
            Trainer::new(config.clone())
                .train(black_box(&examples))
                .unwrap()
        })
    });
    group.finish();
}

fn bench_inference(c: &mut Criterion) {
    let mut group = c.benchmark_group("inference");
    let examples = generate_corpus(20, 10);
    let model = trained_model(&examples);
    let inputs: Vec<FeatureSet> = examples.iter().map(|e| e.features.clone()).collect();

    group.bench_function("classify_single", |b| {
        b.iter(|| model.classify(black_box(&inputs[0])))
    });

    group.throughput(Throughput::Elements(inputs.len() as u64));
    group.bench_function("classify_sequential", |b| {
        b.iter(|| {
            inputs
                .iter()
                .map(|input| model.classify(input))
                .collect::<Vec<_>>()
        })
    });
    group.bench_function("classify_batch_parallel", |b| {
        b.iter(|| model.classify_batch(black_box(&inputs)))
    });

    group.bench_function("explain_single", |b| {
        b.iter(|| model.explain(black_box(&inputs[0]), "intent_0"))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_feature_extraction,
    bench_training,
    bench_inference
);
criterion_main!(benches);
