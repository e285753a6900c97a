use {
    tracing::{info, warn},
    crate::{
        aspects::{AspectTables, PriorTables},
        classifier::{ClassifiedCorpus, Model, shuffle_rng},
        config::{PipelineConfig, PriorCorpus},
        error::Result,
        features::to_features,
        models::{ClassifiedItem, Item},
        subjectivity::SubjectivityFilter,
    },
};

pub struct Trained {
    pub model: Model,
    pub accuracy: Option<f64>,
}

pub struct Mined {
    pub accepted: Vec<ClassifiedItem>,
    pub rejected: usize,
    pub priors: PriorTables,
}

/// Shuffles the labeled corpus, trains on the first `train_split_size`
/// examples and measures accuracy on the rest.
pub fn train_classifier(mut corpus: ClassifiedCorpus, config: &PipelineConfig) -> Result<Trained> {
    corpus.shuffle(&mut shuffle_rng(config.seed));

    let total = corpus.len();
    let (train, held_out) = corpus.split(config.train_split_size);
    info!("{} examples for training, {} held out (of {})", train.len(), held_out.len(), total);

    let model = Model::train(&train)?;
    let accuracy = model.evaluate(&held_out);
    match accuracy {
        Some(accuracy) => info!("accuracy is: {:.4}", accuracy),
        None => warn!("no held-out examples, accuracy not measured"),
    }

    Ok(Trained {
        model,
        accuracy,
    })
}

pub fn classify(model: &Model, item: Item) -> ClassifiedItem {
    let scores = model.score_probabilities(&to_features(&item.tokens));
    item.classified(scores)
}

/// Classifies and filters `items`, then counts prior n-grams over the
/// configured share of them.
pub fn mine(model: &Model, items: impl IntoIterator<Item = Item>, config: &PipelineConfig) -> Mined {
    let classified: Vec<ClassifiedItem> = items.into_iter()
        .map(|item| classify(model, item))
        .collect();
    info!("classified {} items", classified.len());

    let mut tables = AspectTables::new(config.min_n()..=config.max_n());
    if config.prior_corpus == PriorCorpus::All {
        tables.prior_pass(classified.iter().map(|item| &item.tokens));
    }

    let filtered = SubjectivityFilter::new(config.subjectivity_threshold).apply(classified);
    if config.prior_corpus == PriorCorpus::Accepted {
        tables.prior_pass(filtered.accepted.iter().map(|item| &item.tokens));
    }

    Mined {
        accepted: filtered.accepted,
        rejected: filtered.rejected,
        priors: tables.priors(),
    }
}

/// Seeds aspect tables from `priors` and runs the sentiment pass over the
/// items that pass the filter.
pub fn analyze(items: &[ClassifiedItem], priors: &PriorTables, config: &PipelineConfig) -> AspectTables {
    let filter = SubjectivityFilter::new(config.subjectivity_threshold);
    let mut tables = AspectTables::from_priors(priors, config.min_n()..=config.max_n());

    let mut rejected = 0;
    for item in items {
        if filter.accept(item) {
            tables.record_sentiment(item);
        } else {
            rejected += 1;
        }
    }

    if rejected > 0 {
        warn!("{} loaded items are below the subjectivity threshold and were not counted", rejected);
    }

    tables
}
