use {
    std::slice,
    tracing::debug,
    crate::error::Result,
};

/// Lemmatizer part-of-speech hint derived from a tagger's tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
}

/// Assigns a coarse (Penn Treebank style) tag to every token of a sequence.
pub trait Tagger {
    fn tag(&self, tokens: &[String]) -> Result<Vec<String>>;
}

pub trait Lemmatizer {
    fn lemmatize(&self, token: &str, pos: PartOfSpeech) -> Result<String>;
}

pub struct Normalizer<'a> {
    tagger: &'a dyn Tagger,
    lemmatizer: &'a dyn Lemmatizer,
}

pub struct Normalized {
    pub tokens: Vec<String>,
    pub skipped: usize,
}

impl PartOfSpeech {
    pub fn from_tag(tag: &str) -> Self {
        if tag.starts_with("NN") {
            Self::Noun
        } else if tag.starts_with("VB") {
            Self::Verb
        } else {
            Self::Adjective
        }
    }

    /// Single-letter code used by WordNet.
    pub fn wordnet_code(&self) -> &'static str {
        match self {
            Self::Noun => "n",
            Self::Verb => "v",
            Self::Adjective => "a",
        }
    }
}

impl<'a> Normalizer<'a> {
    pub fn new(tagger: &'a dyn Tagger, lemmatizer: &'a dyn Lemmatizer) -> Self {
        Self {
            tagger,
            lemmatizer,
        }
    }

    pub fn normalize(&self, tokens: &[String]) -> Vec<String> {
        self.normalize_counted(tokens).tokens
    }

    pub fn normalize_counted(&self, tokens: &[String]) -> Normalized {
        let mut skipped = 0;
        let mut normalized = Vec::with_capacity(tokens.len());

        for (token, tag) in tokens.iter().zip(self.tags(tokens)) {
            let tag = match tag {
                Some(v) => v,
                None => {
                    skipped += 1;
                    continue;
                },
            };

            let lemma = match self.lemmatizer.lemmatize(token, PartOfSpeech::from_tag(&tag)) {
                Ok(v) => v,
                Err(err) => {
                    debug!("skipping token: {}", err);
                    skipped += 1;
                    continue;
                },
            };

            if lemma.is_empty() || is_punctuation(&lemma) {
                continue;
            }

            normalized.push(lemma.to_lowercase());
        }

        Normalized {
            tokens: normalized,
            skipped,
        }
    }

    // Tags depend on context, so the whole sequence is tagged at once. When the
    // tagger refuses the sequence, tokens are tagged one by one and only the
    // rejected ones are lost.
    fn tags(&self, tokens: &[String]) -> Vec<Option<String>> {
        match self.tagger.tag(tokens) {
            Ok(tags) if tags.len() == tokens.len() => tags.into_iter().map(Some).collect(),
            _ => tokens.iter()
                .map(|token| match self.tagger.tag(slice::from_ref(token)) {
                    Ok(tags) => tags.into_iter().next(),
                    Err(err) => {
                        debug!("skipping token: {}", err);
                        None
                    },
                })
                .collect(),
        }
    }
}

fn is_punctuation(token: &str) -> bool {
    token.chars().all(|c| c.is_ascii_punctuation())
}
