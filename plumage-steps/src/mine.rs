use {
    std::sync::Arc,
    anyhow::Context,
    tracing::{info, warn},
    tokio::task::spawn_blocking,
    plumage_core::{
        classifier::{ClassifiedCorpus, Label, LabeledExample},
        config::{MineStepConfig, PipelineConfig},
        features::to_features,
        normalizer::Normalizer,
        pipeline::{mine, train_classifier},
    },
    crate::{
        data_loading::{load_items, load_reference_corpus, save_mined},
        nltk::Nltk,
        progress::Progress,
    },
};

/// Trains the classifier on the reference corpus, classifies and filters the
/// items, counts prior n-grams and saves survivors and prior tables.
pub async fn run_mine_step(config: &MineStepConfig, pipeline: &PipelineConfig, nltk: Arc<Nltk>) -> anyhow::Result<()> {
    info!("running mine step");

    let raw_corpus = match config.reference_corpus() {
        Some(path) => load_reference_corpus(path).context("mine: loading reference corpus")?,
        None => twitter_samples(&nltk).context("mine: loading twitter samples")?,
    };

    let corpus = {
        let nltk = nltk.clone();
        spawn_blocking(move || build_corpus(&nltk, raw_corpus)).await?
    };

    let trained = {
        let pipeline = pipeline.clone();
        spawn_blocking(move || train_classifier(corpus, &pipeline)).await?
            .context("mine: training classifier")?
    };

    let items = load_items(&config.items(), pipeline.max_items).context("mine: loading items")?;
    if items.is_empty() {
        warn!("no items to mine");
    }

    let mined = {
        let pipeline = pipeline.clone();
        spawn_blocking(move || mine(&trained.model, items, &pipeline)).await?
    };
    info!("{} items kept, {} rejected", mined.accepted.len(), mined.rejected);

    save_mined(&config.classified_items(), &mined.accepted, &config.grams(), &mined.priors)
        .context("mine: saving results")?;

    Ok(())
}

fn twitter_samples(nltk: &Nltk) -> anyhow::Result<Vec<(Label, Vec<String>)>> {
    let mut corpus = Vec::new();

    for label in Label::ALL {
        let tweets = nltk.twitter_samples(label)?;
        info!("{} {:?} reference tweets", tweets.len(), label);
        corpus.extend(tweets.into_iter().map(|tokens| (label, tokens)));
    }

    Ok(corpus)
}

fn build_corpus(nltk: &Nltk, raw_corpus: Vec<(Label, Vec<String>)>) -> ClassifiedCorpus {
    let normalizer = Normalizer::new(nltk, nltk);
    let mut progress = Progress::new("normalizing reference corpus");
    let mut skipped = 0;

    let examples = raw_corpus.into_iter()
        .map(|(label, tokens)| {
            let normalized = normalizer.normalize_counted(&tokens);
            skipped += normalized.skipped;
            progress.update();

            LabeledExample::new(to_features(&normalized.tokens), label)
        })
        .collect();

    progress.finish();
    if skipped > 0 {
        warn!("{} reference tokens could not be normalized", skipped);
    }

    ClassifiedCorpus::new(examples)
}
