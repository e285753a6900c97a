use {
    std::{collections::VecDeque, sync::Arc},
    anyhow::Context,
    tracing::{info, warn},
    tokio::task::spawn_blocking,
    plumage_core::{
        aspects::{AspectTables, PriorTables},
        config::{AnalyzeStepConfig, PipelineConfig},
        models::ClassifiedItem,
        pipeline::analyze,
        report::{Reporter, Stopwords},
        subjectivity::SubjectivityFilter,
    },
    crate::{
        data_loading::{load_classified_items, load_priors, load_stopwords, save_report},
        nltk::Nltk,
    },
};

/// Counts sentiment per phrase over the saved survivors, logs the ranked
/// report and exports it.
pub async fn run_analyze_step(config: &AnalyzeStepConfig, pipeline: &PipelineConfig, nltk: Option<Arc<Nltk>>) -> anyhow::Result<()> {
    info!("running analyze step");

    let items = load_classified_items(&config.classified_items()).context("analyze: loading classified items")?;
    let priors = load_priors(&config.grams()).context("analyze: loading prior tables")?;

    let stopwords = match (config.stopwords(), nltk) {
        (Some(path), _) => load_stopwords(path).context("analyze: loading stopwords")?,
        (None, Some(nltk)) => nltk.stopwords().context("analyze: loading nltk stopwords")?,
        (None, None) => anyhow::bail!("analyze: no stopwords file configured and nltk is not loaded"),
    };
    let stopwords = Stopwords::new(stopwords);
    if stopwords.is_empty() {
        warn!("stopword list is empty, only the built-in fillers are left out of the 1-gram report");
    }
    let stopwords = stopwords.with_extras();
    info!("{} stopwords", stopwords.len());

    let tables = if pipeline.workers > 1 {
        sentiment_pass_parallel(items, &priors, pipeline).await?
    } else {
        let pipeline = pipeline.clone();
        spawn_blocking(move || analyze(&items, &priors, &pipeline)).await?
    };

    let reporter = Reporter::new(pipeline.report_limit, pipeline.rate_unit, &stopwords);
    reporter.log_report(&tables);

    if let Some(path) = config.report() {
        save_report(path, &reporter, &reporter.export_rows(&tables)).context("analyze: exporting report")?;
    }

    Ok(())
}

/// Folds chunks of the accepted items into local tables on blocking tasks,
/// then merges the partial tables into ones seeded from `priors`.
async fn sentiment_pass_parallel(items: Vec<ClassifiedItem>, priors: &PriorTables, pipeline: &PipelineConfig) -> anyhow::Result<AspectTables> {
    let orders = pipeline.min_n()..=pipeline.max_n();
    let accepted = SubjectivityFilter::new(pipeline.subjectivity_threshold).apply(items).accepted;

    let chunk_size = ((accepted.len() + pipeline.workers - 1) / pipeline.workers).max(1);
    info!("sentiment pass over {} items in chunks of {}", accepted.len(), chunk_size);

    let mut join_handles = VecDeque::new();
    let mut remaining = accepted.into_iter();
    loop {
        let chunk: Vec<ClassifiedItem> = remaining.by_ref().take(chunk_size).collect();
        if chunk.is_empty() {
            break;
        }

        let orders = orders.clone();
        join_handles.push_back(spawn_blocking(move || {
            let mut partial = AspectTables::new(orders);
            partial.sentiment_pass(&chunk);
            partial
        }));
    }

    let mut tables = AspectTables::from_priors(priors, orders);
    while let Some(handle) = join_handles.pop_front() {
        tables.merge(handle.await?);
    }

    Ok(tables)
}
