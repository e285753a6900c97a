use {
    std::{process, sync::Arc},
    anyhow::Context,
    tracing::{info, error},
    plumage_core::config::Config,
    crate::{
        analyze::run_analyze_step,
        mine::run_mine_step,
        nltk::Nltk,
    },
};

mod analyze;
mod data_loading;
mod mine;
mod nltk;
mod progress;
mod utils;

#[tokio::main]
async fn main() {
    utils::init_logging();

    info!("plumage aspect mining");

    if let Err(err) = run(Config::load()).await {
        error!("{:#}", err);
        process::exit(1);
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let pipeline = config.pipeline();
    pipeline.validate().context("validating pipeline config")?;

    let steps = &config.steps;
    let nltk = if steps.mine.enabled || (steps.analyze.enabled && steps.analyze.stopwords().is_none()) {
        pyo3::prepare_freethreaded_python();
        let nltk = tokio::task::spawn_blocking(Nltk::load).await?.context("loading nltk")?;
        Some(Arc::new(nltk))
    } else {
        None
    };

    if steps.mine.enabled {
        let nltk = nltk.clone().context("mine: nltk is not loaded")?;
        run_mine_step(&steps.mine, &pipeline, nltk).await?;
    }

    if steps.analyze.enabled {
        run_analyze_step(&steps.analyze, &pipeline, nltk).await?;
    }

    Ok(())
}
