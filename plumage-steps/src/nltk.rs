use {
    tracing::info,
    pyo3::prelude::*,
    plumage_core::{
        classifier::Label,
        error::{PlumageError, Result},
        normalizer::{Lemmatizer, PartOfSpeech, Tagger},
    },
};

/// Handles to the NLTK perceptron tagger, the WordNet lemmatizer and the
/// corpora shipped with NLTK.
pub struct Nltk {
    pos_tag: Py<PyAny>,
    lemmatizer: Py<PyAny>,
}

impl Nltk {
    pub fn load() -> PyResult<Self> {
        Python::with_gil(|py| {
            py.run(r#"
import nltk
for resource in ["averaged_perceptron_tagger", "wordnet", "omw-1.4", "twitter_samples", "stopwords"]:
    nltk.download(resource, quiet=True)
"#, None, None)?;

            let pos_tag = py.import("nltk.tag")?.getattr("pos_tag")?;
            let lemmatizer = py.import("nltk.stem.wordnet")?.getattr("WordNetLemmatizer")?.call0()?;
            info!("nltk is ready");

            Ok(Self {
                pos_tag: pos_tag.into(),
                lemmatizer: lemmatizer.into(),
            })
        })
    }

    pub fn stopwords(&self) -> PyResult<Vec<String>> {
        Python::with_gil(|py| {
            py.import("nltk.corpus")?
                .getattr("stopwords")?
                .call_method1("words", ("english",))?
                .extract()
        })
    }

    /// Tokenized tweets of the `twitter_samples` corpus for one label.
    pub fn twitter_samples(&self, label: Label) -> PyResult<Vec<Vec<String>>> {
        let file_id = match label {
            Label::Positive => "positive_tweets.json",
            Label::Negative => "negative_tweets.json",
        };

        Python::with_gil(|py| {
            py.import("nltk.corpus")?
                .getattr("twitter_samples")?
                .call_method1("tokenized", (file_id,))?
                .extract()
        })
    }
}

impl Tagger for Nltk {
    fn tag(&self, tokens: &[String]) -> Result<Vec<String>> {
        Python::with_gil(|py| {
            let tagged: Vec<(String, String)> = self.pos_tag
                .call1(py, (tokens.to_vec(),))
                .and_then(|v| v.extract(py))
                .map_err(|err| PlumageError::token_rejected(&tokens.join(" "), err))?;

            Ok(tagged.into_iter().map(|(_, tag)| tag).collect())
        })
    }
}

impl Lemmatizer for Nltk {
    fn lemmatize(&self, token: &str, pos: PartOfSpeech) -> Result<String> {
        Python::with_gil(|py| {
            self.lemmatizer
                .call_method1(py, "lemmatize", (token, pos.wordnet_code()))
                .and_then(|v| v.extract(py))
                .map_err(|err| PlumageError::token_rejected(token, err))
        })
    }
}
