use {
    std::fs::read_to_string,
    tracing::warn,
    serde::Deserialize,
    crate::error::{PlumageError, Result},
};

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(default)]
    pub steps: StepsConfig,
    pub pipeline: Option<PipelineConfig>,
}

#[derive(Deserialize, Debug)]
pub struct StepsConfig {
    #[serde(default)]
    pub mine: MineStepConfig,
    #[serde(default)]
    pub analyze: AnalyzeStepConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct MineStepConfig {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    items: Option<String>,
    classified_items: Option<String>,
    grams: Option<String>,
    reference_corpus: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AnalyzeStepConfig {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    classified_items: Option<String>,
    grams: Option<String>,
    report: Option<String>,
    stopwords: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct PipelineConfig {
    pub subjectivity_threshold: f64,
    pub report_limit: usize,
    pub train_split_size: usize,
    pub max_items: Option<usize>,
    pub ngram_range: [usize; 2],
    pub seed: Option<u64>,
    pub workers: usize,
    pub rate_unit: RateUnit,
    pub prior_corpus: PriorCorpus,
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RateUnit {
    Percent,
    Fraction,
}

/// Which items feed the prior (frequency) pass of the mine step.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PriorCorpus {
    Accepted,
    All,
}

fn enabled_by_default() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            steps: StepsConfig::default(),
            pipeline: None,
        }
    }
}

impl Default for StepsConfig {
    fn default() -> Self {
        Self {
            mine: MineStepConfig::default(),
            analyze: AnalyzeStepConfig::default(),
        }
    }
}

impl Default for MineStepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            items: None,
            classified_items: None,
            grams: None,
            reference_corpus: None,
        }
    }
}

impl Default for AnalyzeStepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            classified_items: None,
            grams: None,
            report: None,
            stopwords: None,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            subjectivity_threshold: 0.30,
            report_limit: 25,
            train_split_size: 7000,
            max_items: None,
            ngram_range: [1, 4],
            seed: None,
            workers: 1,
            rate_unit: RateUnit::Percent,
            prior_corpus: PriorCorpus::Accepted,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        read_to_string("./config.toml")
            .or_else(|_| read_to_string("/config/config.toml"))
            .map_err(|err| err.to_string())
            .and_then(|v| Self::parse(&v).map_err(|err| err.to_string()))
            .unwrap_or_else(|err| {
                warn!("failed to read config: {}", err);
                Config::default()
            })
    }

    pub fn parse(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn pipeline(&self) -> PipelineConfig {
        self.pipeline.as_ref().cloned().unwrap_or_default()
    }
}

impl MineStepConfig {
    pub fn items(&self) -> String {
        self.items.as_ref().cloned().unwrap_or("_preprocess".to_owned())
    }

    pub fn classified_items(&self) -> String {
        self.classified_items.as_ref().cloned().unwrap_or("_tweets".to_owned())
    }

    pub fn grams(&self) -> String {
        self.grams.as_ref().cloned().unwrap_or("_grams".to_owned())
    }

    pub fn reference_corpus(&self) -> Option<&String> {
        self.reference_corpus.as_ref()
    }
}

impl AnalyzeStepConfig {
    pub fn classified_items(&self) -> String {
        self.classified_items.as_ref().cloned().unwrap_or("_tweets".to_owned())
    }

    pub fn grams(&self) -> String {
        self.grams.as_ref().cloned().unwrap_or("_grams".to_owned())
    }

    pub fn report(&self) -> Option<&String> {
        self.report.as_ref()
    }

    pub fn stopwords(&self) -> Option<&String> {
        self.stopwords.as_ref()
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.subjectivity_threshold) {
            return Err(PlumageError::InvalidConfig(format!(
                "subjectivity_threshold must be in [0, 1), got {}",
                self.subjectivity_threshold,
            )));
        }

        if self.report_limit == 0 {
            return Err(PlumageError::InvalidConfig("report_limit must be positive".to_owned()));
        }

        if self.workers == 0 {
            return Err(PlumageError::InvalidConfig("workers must be positive".to_owned()));
        }

        let [min_n, max_n] = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(PlumageError::InvalidConfig(format!("ngram_range [{}, {}] is empty or starts at 0", min_n, max_n)));
        }

        Ok(())
    }

    pub fn min_n(&self) -> usize {
        self.ngram_range[0]
    }

    pub fn max_n(&self) -> usize {
        self.ngram_range[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_sections_missing() {
        let config = Config::parse("").unwrap();
        let pipeline = config.pipeline();

        assert!(config.steps.mine.enabled);
        assert!(config.steps.analyze.enabled);
        assert_eq!(config.steps.mine.items(), "_preprocess");
        assert_eq!(config.steps.analyze.report(), None);
        assert_eq!(pipeline.subjectivity_threshold, 0.30);
        assert_eq!(pipeline.report_limit, 25);
        assert_eq!(pipeline.train_split_size, 7000);
        assert_eq!(pipeline.max_items, None);
        assert_eq!(pipeline.ngram_range, [1, 4]);
        assert_eq!(pipeline.rate_unit, RateUnit::Percent);
        assert_eq!(pipeline.prior_corpus, PriorCorpus::Accepted);
        assert!(pipeline.validate().is_ok());
    }

    #[test]
    fn parses_partial_pipeline_section() {
        let config = Config::parse(r#"
[steps.mine]
enabled = false
items = "tweets.csv"

[steps.analyze]
enabled = true
report = "report.csv"

[pipeline]
subjectivity_threshold = 0.5
seed = 7
rate_unit = "fraction"
prior_corpus = "all"
"#).unwrap();
        let pipeline = config.pipeline();

        assert!(!config.steps.mine.enabled);
        assert_eq!(config.steps.mine.items(), "tweets.csv");
        assert_eq!(config.steps.analyze.report().map(|v| v.as_str()), Some("report.csv"));
        assert_eq!(pipeline.subjectivity_threshold, 0.5);
        assert_eq!(pipeline.seed, Some(7));
        assert_eq!(pipeline.report_limit, 25);
        assert_eq!(pipeline.rate_unit, RateUnit::Fraction);
        assert_eq!(pipeline.prior_corpus, PriorCorpus::All);
    }

    #[test]
    fn step_section_without_enabled_keeps_the_rest_of_the_file() {
        let config = Config::parse(r#"
[steps.mine]
items = "tweets.csv"

[steps.analyze]
stopwords = "stopwords.txt"

[pipeline]
subjectivity_threshold = 0.6
"#).unwrap();

        assert!(config.steps.mine.enabled);
        assert!(config.steps.analyze.enabled);
        assert_eq!(config.steps.mine.items(), "tweets.csv");
        assert_eq!(config.pipeline().subjectivity_threshold, 0.6);
    }

    #[test]
    fn rejects_degenerate_pipeline_settings() {
        let mut pipeline = PipelineConfig::default();
        pipeline.ngram_range = [0, 4];
        assert!(matches!(pipeline.validate(), Err(PlumageError::InvalidConfig(_))));

        let mut pipeline = PipelineConfig::default();
        pipeline.ngram_range = [3, 2];
        assert!(pipeline.validate().is_err());

        let mut pipeline = PipelineConfig::default();
        pipeline.subjectivity_threshold = 1.0;
        assert!(pipeline.validate().is_err());

        let mut pipeline = PipelineConfig::default();
        pipeline.report_limit = 0;
        assert!(pipeline.validate().is_err());
    }
}
