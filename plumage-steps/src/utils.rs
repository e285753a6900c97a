use {
    std::env,
    tracing::{Level, Metadata},
    tracing_subscriber::{
        prelude::*,
        filter::{filter_fn, FilterFn},
    },
};

/// Installs the fmt subscriber. `LOG_LEVEL` picks the level (info by
/// default), `LOG_FORMAT=json` switches to json lines.
pub fn init_logging() {
    let level = env::var("LOG_LEVEL")
        .ok()
        .and_then(|v| v.parse::<Level>().ok())
        .unwrap_or(Level::INFO);
    let json = env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(level)
            .finish()
            .with(token_skips_filter(level))
            .init();
    } else {
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(level)
            .finish()
            .with(token_skips_filter(level))
            .init();
    }
}

// per-token rejections are only shown at trace level
fn token_skips_filter(level: Level) -> FilterFn<impl Fn(&Metadata<'_>) -> bool> {
    filter_fn(move |metadata| {
        if level == Level::TRACE || !metadata.target().starts_with("plumage_core::normalizer") {
            true
        } else {
            metadata.level() <= &Level::INFO
        }
    })
}
