use std::sync::{Arc, Mutex};

use glaive::analysis::FeatureSet;
use glaive::classifier::{
    CancellationToken, Classification, ExampleEncoder, IntentClassifier, IntentModel,
    ModelHandle, NONE_LABEL, Trainer, TrainingConfig, TrainingExample, TrainingJob,
    TrainingState, Vocabulary, train_many,
};
use glaive::error::{GlaiveError, Result};

fn greetings() -> Vec<TrainingExample> {
    vec![
        TrainingExample::new(FeatureSet::from_keys(["hello"]), "greet"),
        TrainingExample::new(FeatureSet::from_keys(["hi"]), "greet"),
        TrainingExample::new(FeatureSet::from_keys(["bye"]), "farewell"),
        TrainingExample::new(FeatureSet::from_keys(["goodbye"]), "farewell"),
    ]
}

fn assert_normalized(model: &IntentModel, input: &FeatureSet) {
    let ranked = model.classify(input);
    assert_eq!(ranked.len(), model.labels().len());
    let total: f64 = ranked.iter().map(|s| s.score).sum();
    assert!((total - 1.0).abs() < 1e-9, "confidences sum to {total}");
    assert!(ranked.iter().all(|s| (0.0..=1.0).contains(&s.score)));
}

#[test]
fn greeting_corpus_ranks_known_and_unknown_input() -> Result<()> {
    let (model, result) = Trainer::default().train(&greetings())?;
    assert_eq!(result.state, TrainingState::Converged);

    let ranked = model.classify(&FeatureSet::from_keys(["hello"]));
    assert_eq!(ranked[0].label, "greet");
    assert!(ranked[0].score > 0.5);

    let ranked = model.classify(&FeatureSet::from_keys(["xyz"]));
    assert_eq!(ranked[0].label, NONE_LABEL);
    Ok(())
}

#[test]
fn fixed_error_training_is_deterministic() -> Result<()> {
    let config = TrainingConfig {
        fixed_error: true,
        max_iterations: 250,
        ..Default::default()
    };
    let (first, first_result) = Trainer::new(config.clone()).train(&greetings())?;
    let (second, second_result) = Trainer::new(config).train(&greetings())?;

    assert_eq!(first_result.iterations, 250);
    assert_eq!(first_result.iterations, second_result.iterations);
    assert_eq!(first_result.final_error, second_result.final_error);
    assert_eq!(first.classifier(), second.classifier());

    for keys in [vec!["hello"], vec!["bye", "hi"], vec!["unknown"]] {
        let input = FeatureSet::from_keys(keys);
        assert_eq!(first.classify(&input), second.classify(&input));
    }
    Ok(())
}

#[test]
fn confidences_are_normalized_for_any_input() -> Result<()> {
    let (model, _) = Trainer::default().train(&greetings())?;
    let inputs = [
        FeatureSet::new(),
        FeatureSet::from_keys(["hello"]),
        FeatureSet::from_keys(["hello", "bye", "xyz", "abc"]),
        [("goodbye", 1000.0)].into_iter().collect(),
        [("hi", -50.0)].into_iter().collect(),
    ];
    for input in &inputs {
        assert_normalized(&model, input);
    }
    Ok(())
}

#[test]
fn extreme_inputs_keep_confidences_normalized() -> Result<()> {
    let (model, _) = Trainer::default().train(&greetings())?;

    let flood: FeatureSet = (0..4_000).map(|i| (format!("oov-{i}"), 1.0)).collect();
    assert_normalized(&model, &flood);
    assert_eq!(model.classify(&flood)[0].label, NONE_LABEL);

    let huge: FeatureSet = [("goodbye", 1e308)].into_iter().collect();
    assert_normalized(&model, &huge);
    assert_eq!(model.classify(&huge)[0].label, "farewell");

    let mixed: FeatureSet = [("goodbye", 1e308), ("hi", -1e308)].into_iter().collect();
    assert_normalized(&model, &mixed);
    Ok(())
}

#[test]
fn out_of_vocabulary_input_falls_back_to_biases_without_none_feature() -> Result<()> {
    let mut config = TrainingConfig::default();
    config.none_feature.enabled = false;
    let (model, _) = Trainer::new(config).train(&greetings())?;

    let oov = FeatureSet::from_keys(["xyz", "qwerty"]);
    let empty = FeatureSet::new();
    assert_eq!(model.raw_scores(&oov), model.raw_scores(&empty));
    assert_eq!(model.raw_scores(&oov), model.classifier().biases());
    assert_normalized(&model, &oov);
    Ok(())
}

#[test]
fn two_label_corpus_converges_within_bounded_iterations() -> Result<()> {
    let (_, first) = Trainer::default().train(&greetings())?;
    let (_, second) = Trainer::default().train(&greetings())?;

    assert_eq!(first.state, TrainingState::Converged);
    assert!(first.iterations < 200, "took {} iterations", first.iterations);
    assert!(first.final_error < 1e-3);
    assert_eq!(first.iterations, second.iterations);
    Ok(())
}

#[test]
fn explanation_sums_to_raw_score() -> Result<()> {
    let (model, _) = Trainer::default().train(&greetings())?;
    let inputs = [
        FeatureSet::from_keys(["hello", "bye"]),
        FeatureSet::from_keys(["hi", "never-seen"]),
        FeatureSet::new(),
    ];
    for input in &inputs {
        let raw = model.raw_scores(input);
        for (index, label) in model.labels().iter().enumerate() {
            let explanation = model.explain(input, label).expect("known label");
            let sum: f64 = explanation
                .contributions
                .iter()
                .map(|c| c.contribution)
                .sum::<f64>()
                + explanation.bias;
            assert!((sum - raw[index]).abs() < 1e-9);
        }
    }

    let explanation = model
        .explain(&FeatureSet::from_keys(["hello"]), "greet")
        .expect("known label");
    assert_eq!(explanation.contributions.len(), 1);
    assert_eq!(explanation.contributions[0].feature, "hello");
    assert!(explanation.contributions[0].weight > 0.0);
    Ok(())
}

#[test]
fn examples_without_known_features_still_train() -> Result<()> {
    let mut examples = greetings();
    examples.push(TrainingExample::new(FeatureSet::new(), "greet"));
    examples.push(TrainingExample::none(FeatureSet::from_keys(["meh"])));

    let (model, result) = Trainer::default().train(&examples)?;
    assert!(result.iterations > 0);
    assert_eq!(model.classify(&FeatureSet::from_keys(["meh"]))[0].label, NONE_LABEL);
    Ok(())
}

#[test]
fn empty_corpus_is_a_configuration_error() {
    let err = Trainer::default().train(&[]).unwrap_err();
    assert!(matches!(err, GlaiveError::Corpus(_)));
}

#[test]
fn cancellation_stops_at_iteration_boundary() -> Result<()> {
    let token = CancellationToken::new();
    let trigger = token.clone();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let trainer = Trainer::new(TrainingConfig {
        fixed_error: true,
        max_iterations: 10_000,
        ..Default::default()
    })
    .with_cancellation(token)
    .with_progress(move |p| {
        sink.lock().unwrap().push(p.iteration);
        if p.iteration == 5 {
            trigger.cancel();
        }
    });

    let (model, result) = trainer.train(&greetings())?;
    assert_eq!(result.state, TrainingState::Stopped);
    assert_eq!(result.iterations, 5);
    assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3, 4, 5]);
    assert_eq!(model.metadata().iterations, 5);
    assert_eq!(model.classify(&FeatureSet::from_keys(["hello"]))[0].label, "greet");
    Ok(())
}

#[test]
fn progress_callback_does_not_change_outcome() -> Result<()> {
    let config = TrainingConfig {
        fixed_error: true,
        max_iterations: 100,
        ..Default::default()
    };
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);

    let (observed, observed_result) = Trainer::new(config.clone())
        .with_progress(move |p| sink.lock().unwrap().push(p.error))
        .train(&greetings())?;
    let (plain, plain_result) = Trainer::new(config).train(&greetings())?;

    assert_eq!(observed.classifier(), plain.classifier());
    assert_eq!(observed_result.final_error, plain_result.final_error);

    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 100);
    assert_eq!(errors.last().copied(), Some(plain_result.final_error));
    assert!(errors[99] < errors[0]);
    Ok(())
}

#[test]
fn trainer_accepts_injected_vocabularies() -> Result<()> {
    let encoder = ExampleEncoder::new(
        Vocabulary::from_keys(["goodbye", "bye", "hi", "hello"]),
        Vocabulary::from_keys(["farewell", "greet"]),
    )?;
    let mut config = TrainingConfig::default();
    config.none_feature.enabled = false;

    let (model, _) = Trainer::new(config).train_with_encoder(encoder, &greetings())?;
    assert_eq!(model.labels(), ["farewell", "greet", "None"]);
    assert_eq!(
        model.encoder().features().keys(),
        ["goodbye", "bye", "hi", "hello"]
    );
    assert_eq!(model.classify(&FeatureSet::from_keys(["hi"]))[0].label, "greet");
    Ok(())
}

#[test]
fn injected_label_vocabulary_must_cover_corpus_intents() -> Result<()> {
    let encoder = ExampleEncoder::new(
        Vocabulary::from_keys(["hello", "hi", "bye", "goodbye"]),
        Vocabulary::from_keys(["greet"]),
    )?;

    let err = Trainer::default()
        .train_with_encoder(encoder, &greetings())
        .unwrap_err();
    assert!(matches!(err, GlaiveError::Vocabulary(_)));
    assert!(err.to_string().contains("farewell"));
    Ok(())
}

#[test]
fn handle_serves_untrained_until_swap() -> Result<()> {
    let handle = ModelHandle::new();
    let input = FeatureSet::from_keys(["bye"]);
    assert_eq!(handle.predict(&input), Classification::Untrained);

    let (model, _) = Trainer::default().train(&greetings())?;
    handle.replace(model);

    let current = handle.current().expect("trained model");
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let model = Arc::clone(&current);
            let input = input.clone();
            std::thread::spawn(move || model.classify(&input)[0].label.clone())
        })
        .collect();
    for reader in readers {
        assert_eq!(reader.join().unwrap(), "farewell");
    }

    assert_eq!(
        handle.predict(&input).top().map(|s| s.label.as_str()),
        Some("farewell")
    );
    Ok(())
}

#[test]
fn batch_classification_matches_sequential() -> Result<()> {
    let (model, _) = Trainer::default().train(&greetings())?;
    let inputs: Vec<FeatureSet> = ["hello", "bye", "hi", "goodbye", "nope"]
        .into_iter()
        .map(|k| FeatureSet::from_keys([k]))
        .collect();

    let batch = model.classify_batch(&inputs);
    assert_eq!(batch.len(), inputs.len());
    for (input, ranked) in inputs.iter().zip(&batch) {
        assert_eq!(&model.classify(input), ranked);
    }
    Ok(())
}

#[test]
fn independent_models_train_in_parallel() {
    let jobs = (0..4)
        .map(|i| TrainingJob {
            name: format!("job-{i}"),
            config: TrainingConfig {
                fixed_error: true,
                max_iterations: 50 + i * 10,
                ..Default::default()
            },
            examples: greetings(),
        })
        .collect();

    let results = train_many(jobs);
    assert_eq!(results.len(), 4);
    for (i, (name, result)) in results.into_iter().enumerate() {
        assert_eq!(name, format!("job-{i}"));
        let (_, result) = result.expect("job trains");
        assert_eq!(result.iterations, 50 + i * 10);
    }
}
