use {
    std::collections::{BTreeMap, HashMap},
    serde::{Serialize, Deserialize},
    rand::{Rng, SeedableRng, seq::SliceRandom},
    rand_xoshiro::Xoshiro256PlusPlus,
    tracing::info,
    crate::{
        features::Features,
        error::{PlumageError, Result},
    },
};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    Positive,
    Negative,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LabeledExample {
    pub features: Features,
    pub label: Label,
}

/// Labeled reference corpus, shuffled once and then split into a training
/// prefix and a held-out suffix.
pub struct ClassifiedCorpus {
    examples: Vec<LabeledExample>,
}

/// Class posteriors for one item.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Scores {
    pub positivity: f64,
    pub negativity: f64,
}

/// Naive Bayes over presence features.
///
/// Probabilities are expected-likelihood estimates (add 0.5 to every bin).
/// A feature has two bins, present and absent, unless it was present in every
/// training example, in which case the absent bin never exists.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Model {
    label_log_priors: [f64; 2],
    feature_log_probs: BTreeMap<String, [f64; 2]>,
    trained_on: usize,
}

impl Label {
    pub const ALL: [Label; 2] = [Label::Positive, Label::Negative];

    fn index(self) -> usize {
        match self {
            Self::Positive => 0,
            Self::Negative => 1,
        }
    }
}

impl LabeledExample {
    pub fn new(features: Features, label: Label) -> Self {
        Self {
            features,
            label,
        }
    }
}

impl ClassifiedCorpus {
    pub fn new(examples: Vec<LabeledExample>) -> Self {
        Self {
            examples,
        }
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        self.examples.shuffle(rng);
    }

    /// First `train_size` examples train, the rest are held out.
    pub fn split(mut self, train_size: usize) -> (Vec<LabeledExample>, Vec<LabeledExample>) {
        let held_out = self.examples.split_off(train_size.min(self.examples.len()));
        (self.examples, held_out)
    }
}

/// Shuffling source: fixed seed for reproducible runs, entropy otherwise.
pub fn shuffle_rng(seed: Option<u64>) -> Xoshiro256PlusPlus {
    match seed {
        Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
        None => Xoshiro256PlusPlus::from_entropy(),
    }
}

impl Scores {
    pub fn separation(&self) -> f64 {
        (self.positivity - self.negativity).abs()
    }
}

impl Model {
    pub fn train(examples: &[LabeledExample]) -> Result<Self> {
        if examples.is_empty() {
            return Err(PlumageError::EmptyCorpus);
        }

        let mut label_counts = [0u64; 2];
        let mut present_counts: HashMap<&str, [u64; 2]> = HashMap::new();

        for example in examples {
            let label = example.label.index();
            label_counts[label] += 1;

            for (feature, _) in example.features.iter().filter(|(_, present)| **present) {
                present_counts.entry(feature.as_str()).or_insert([0, 0])[label] += 1;
            }
        }

        if let Some(label) = Label::ALL.into_iter().find(|label| label_counts[label.index()] as usize == examples.len()) {
            return Err(PlumageError::SingleClassCorpus {
                label,
                examples: examples.len(),
            });
        }

        let total = examples.len() as f64;
        let label_log_priors = [
            ele_log_prob(label_counts[0] as f64, total, 2.0),
            ele_log_prob(label_counts[1] as f64, total, 2.0),
        ];

        let feature_log_probs = present_counts.into_iter()
            .map(|(feature, present)| {
                let bins = if present[0] + present[1] == examples.len() as u64 { 1.0 } else { 2.0 };
                let log_probs = [
                    ele_log_prob(present[0] as f64, label_counts[0] as f64, bins),
                    ele_log_prob(present[1] as f64, label_counts[1] as f64, bins),
                ];
                (feature.to_owned(), log_probs)
            })
            .collect::<BTreeMap<_, _>>();

        info!(
            "trained classifier on {} examples ({} positive, {} negative, {} features)",
            examples.len(),
            label_counts[0],
            label_counts[1],
            feature_log_probs.len(),
        );

        Ok(Self {
            label_log_priors,
            feature_log_probs,
            trained_on: examples.len(),
        })
    }

    /// Normalized class posteriors. Features never seen in training are ignored.
    pub fn score_probabilities(&self, features: &Features) -> Scores {
        let mut present: Vec<&String> = features.iter()
            .filter(|(_, present)| **present)
            .map(|(feature, _)| feature)
            .collect();
        present.sort();

        let mut log_scores = self.label_log_priors;
        for feature in present {
            if let Some(log_probs) = self.feature_log_probs.get(feature) {
                log_scores[0] += log_probs[0];
                log_scores[1] += log_probs[1];
            }
        }

        let max = log_scores[0].max(log_scores[1]);
        let positive = (log_scores[0] - max).exp();
        let negative = (log_scores[1] - max).exp();
        let sum = positive + negative;

        Scores {
            positivity: positive / sum,
            negativity: negative / sum,
        }
    }

    pub fn classify(&self, features: &Features) -> Label {
        let scores = self.score_probabilities(features);
        if scores.positivity > scores.negativity {
            Label::Positive
        } else {
            Label::Negative
        }
    }

    /// Fraction of held-out examples classified correctly, `None` when there
    /// is nothing held out.
    pub fn evaluate(&self, held_out: &[LabeledExample]) -> Option<f64> {
        if held_out.is_empty() {
            return None;
        }

        let correct = held_out.iter()
            .filter(|example| self.classify(&example.features) == example.label)
            .count();

        Some(correct as f64 / held_out.len() as f64)
    }

    pub fn trained_on(&self) -> usize {
        self.trained_on
    }
}

fn ele_log_prob(count: f64, total: f64, bins: f64) -> f64 {
    ((count + 0.5) / (total + 0.5 * bins)).ln()
}
