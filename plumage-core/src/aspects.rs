use {
    std::{collections::HashMap, ops::RangeInclusive},
    serde::{Serialize, Deserialize},
    tracing::info,
    crate::{
        classifier::Label,
        models::ClassifiedItem,
    },
};

/// Phrase key: the tokens of one n-gram, compared by value.
pub type Gram = Vec<String>;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Aspect {
    pub prior_count: u64,
    pub positive_count: u64,
    pub negative_count: u64,
}

pub type AspectTable = HashMap<Gram, Aspect>;

/// One table per phrase length; index 0 is never populated.
#[derive(Clone, Debug)]
pub struct AspectTables {
    tables: Vec<AspectTable>,
    min_n: usize,
}

/// Pre-computed phrase frequencies, the output of a prior pass.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(from = "PriorTablesFile", into = "PriorTablesFile")]
pub struct PriorTables {
    tables: Vec<HashMap<Gram, u64>>,
}

/// On-disk layout of [`PriorTables`]: per order, entries sorted by count.
#[derive(Serialize, Deserialize)]
pub struct PriorTablesFile {
    pub tables: Vec<Vec<GramCount>>,
}

#[derive(Serialize, Deserialize)]
pub struct GramCount {
    pub gram: Gram,
    pub count: u64,
}

/// Contiguous windows of `n` tokens, left to right.
pub struct NGrams<'a, S> {
    tokens: &'a [S],
    n: usize,
    cursor: usize,
}

pub fn ngrams<S>(tokens: &[S], n: usize) -> NGrams<'_, S> {
    NGrams {
        tokens,
        n,
        cursor: 0,
    }
}

impl<'a, S> Iterator for NGrams<'a, S> {
    type Item = &'a [S];

    fn next(&mut self) -> Option<Self::Item> {
        if self.n == 0 || self.cursor + self.n > self.tokens.len() {
            return None;
        }

        let window = &self.tokens[self.cursor..self.cursor + self.n];
        self.cursor += 1;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.n == 0 {
            0
        } else {
            (self.tokens.len() + 1).saturating_sub(self.n + self.cursor)
        };
        (remaining, Some(remaining))
    }
}

impl<'a, S> ExactSizeIterator for NGrams<'a, S> {}

impl Aspect {
    /// Phrase count within subjectivity-surviving items.
    pub fn sentiment_count(&self) -> u64 {
        self.positive_count + self.negative_count
    }

    fn merge(&mut self, other: &Aspect) {
        self.prior_count += other.prior_count;
        self.positive_count += other.positive_count;
        self.negative_count += other.negative_count;
    }
}

impl AspectTables {
    pub fn new(orders: RangeInclusive<usize>) -> Self {
        let min_n = (*orders.start()).max(1);
        Self {
            tables: vec![AspectTable::new(); orders.end() + 1],
            min_n,
        }
    }

    /// Tables for `orders` with `prior_count` taken from `priors`. Orders the
    /// priors do not cover start out empty.
    pub fn from_priors(priors: &PriorTables, orders: RangeInclusive<usize>) -> Self {
        let mut tables = Self::new(orders);

        for n in tables.orders() {
            let table = &mut tables.tables[n];
            for (gram, count) in priors.tables.get(n).into_iter().flatten() {
                table.entry(gram.clone()).or_default().prior_count += count;
            }
        }

        tables
    }

    pub fn orders(&self) -> RangeInclusive<usize> {
        self.min_n..=self.max_n()
    }

    pub fn max_n(&self) -> usize {
        self.tables.len().saturating_sub(1)
    }

    pub fn table(&self, n: usize) -> Option<&AspectTable> {
        if self.orders().contains(&n) {
            self.tables.get(n)
        } else {
            None
        }
    }

    pub fn aspect(&self, gram: &[String]) -> Option<&Aspect> {
        self.table(gram.len()).and_then(|table| table.get(gram))
    }

    /// Counts every window of every tracked length across `corpus`.
    pub fn prior_pass<'a, I, T>(&mut self, corpus: I)
    where
        I: IntoIterator<Item = &'a T>,
        T: AsRef<[String]> + ?Sized + 'a,
    {
        let mut sequences = 0;
        for tokens in corpus {
            self.record_prior(tokens.as_ref());
            sequences += 1;
        }

        info!("counted prior n-grams over {} token sequences", sequences);
    }

    pub fn record_prior(&mut self, tokens: &[String]) {
        for n in self.orders() {
            let table = &mut self.tables[n];
            for gram in ngrams(tokens, n) {
                update(table, gram, |aspect| aspect.prior_count += 1);
            }
        }
    }

    /// Splits window counts by predicted class. Callers pass only items that
    /// survived the subjectivity filter.
    pub fn sentiment_pass<'a>(&mut self, items: impl IntoIterator<Item = &'a ClassifiedItem>) {
        for item in items {
            self.record_sentiment(item);
        }
    }

    pub fn record_sentiment(&mut self, item: &ClassifiedItem) {
        let polarity = item.polarity();
        for n in self.orders() {
            let table = &mut self.tables[n];
            for gram in ngrams(&item.tokens, n) {
                update(table, gram, |aspect| match polarity {
                    Label::Positive => aspect.positive_count += 1,
                    Label::Negative => aspect.negative_count += 1,
                });
            }
        }
    }

    /// Adds every count of `other` into `self`, creating missing phrases.
    pub fn merge(&mut self, other: AspectTables) {
        if other.tables.len() > self.tables.len() {
            self.tables.resize(other.tables.len(), AspectTable::new());
        }
        self.min_n = self.min_n.min(other.min_n);

        for (n, table) in other.tables.into_iter().enumerate() {
            let target = &mut self.tables[n];
            for (gram, aspect) in table {
                target.entry(gram).or_default().merge(&aspect);
            }
        }
    }

    pub fn priors(&self) -> PriorTables {
        let tables = self.tables.iter()
            .enumerate()
            .map(|(n, table)| {
                if n < self.min_n {
                    return HashMap::new();
                }

                table.iter()
                    .filter(|(_, aspect)| aspect.prior_count > 0)
                    .map(|(gram, aspect)| (gram.clone(), aspect.prior_count))
                    .collect()
            })
            .collect();

        PriorTables {
            tables,
        }
    }
}

fn update(table: &mut AspectTable, gram: &[String], f: impl FnOnce(&mut Aspect)) {
    match table.get_mut(gram) {
        Some(aspect) => f(aspect),
        None => {
            let mut aspect = Aspect::default();
            f(&mut aspect);
            table.insert(gram.to_vec(), aspect);
        },
    }
}

impl PriorTables {
    pub fn count(&self, gram: &[String]) -> u64 {
        self.tables.get(gram.len())
            .and_then(|table| table.get(gram))
            .cloned()
            .unwrap_or(0)
    }

    pub fn max_n(&self) -> usize {
        self.tables.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.iter().all(|table| table.is_empty())
    }
}

impl From<PriorTablesFile> for PriorTables {
    fn from(file: PriorTablesFile) -> Self {
        Self {
            tables: file.tables.into_iter()
                .map(|entries| entries.into_iter().map(|entry| (entry.gram, entry.count)).collect())
                .collect(),
        }
    }
}

impl From<PriorTables> for PriorTablesFile {
    fn from(priors: PriorTables) -> Self {
        Self {
            tables: priors.tables.into_iter()
                .map(|table| {
                    let mut entries: Vec<GramCount> = table.into_iter()
                        .map(|(gram, count)| GramCount { gram, count })
                        .collect();
                    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.gram.cmp(&b.gram)));
                    entries
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{classifier::Scores, models::Item},
    };

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|v| v.to_string()).collect()
    }

    fn gram(words: &[&str]) -> Gram {
        tokens(words)
    }

    fn classified(words: &[&str], positivity: f64) -> ClassifiedItem {
        Item::new(words.join("-"), tokens(words)).classified(Scores {
            positivity,
            negativity: 1.0 - positivity,
        })
    }

    #[test]
    fn window_count_matches_length() {
        for len in 0..7 {
            let sequence: Vec<usize> = (0..len).collect();
            for n in 1..6 {
                let windows: Vec<&[usize]> = ngrams(&sequence, n).collect();
                assert_eq!(windows.len(), (len + 1).saturating_sub(n));
                assert_eq!(ngrams(&sequence, n).len(), windows.len());

                for (start, window) in windows.iter().enumerate() {
                    assert_eq!(*window, &sequence[start..start + n]);
                }
            }
        }
    }

    #[test]
    fn zero_length_windows_are_empty() {
        assert_eq!(ngrams(&[1, 2, 3], 0).count(), 0);
    }

    #[test]
    fn windows_can_be_regenerated() {
        let sequence = tokens(&["a", "b", "c"]);
        let first: Vec<_> = ngrams(&sequence, 2).collect();
        let second: Vec<_> = ngrams(&sequence, 2).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn prior_and_sentiment_counts() {
        let corpus = vec![
            tokens(&["i", "love", "this"]),
            tokens(&["i", "hate", "this"]),
            tokens(&["this", "is", "great"]),
        ];
        let items = vec![
            classified(&["i", "love", "this"], 0.9),
            classified(&["i", "hate", "this"], 0.1),
            classified(&["this", "is", "great"], 0.8),
        ];

        let mut tables = AspectTables::new(1..=4);
        tables.prior_pass(&corpus);
        tables.sentiment_pass(&items);

        let unigrams = tables.table(1).unwrap();
        assert_eq!(unigrams[&gram(&["this"])].prior_count, 3);
        assert_eq!(unigrams[&gram(&["i"])].prior_count, 2);
        for word in ["love", "hate", "is", "great"] {
            assert_eq!(unigrams[&gram(&[word])].prior_count, 1);
        }

        let this = tables.aspect(&gram(&["this"])).unwrap();
        assert_eq!((this.positive_count, this.negative_count), (2, 1));

        let i_hate = tables.aspect(&gram(&["i", "hate"])).unwrap();
        assert_eq!(*i_hate, Aspect { prior_count: 1, positive_count: 0, negative_count: 1 });

        assert_eq!(tables.table(3).unwrap().len(), 3);
        assert!(tables.table(4).unwrap().is_empty());
        assert!(tables.table(0).is_none());
        assert!(tables.table(5).is_none());
    }

    #[test]
    fn sentiment_pass_adds_unseen_phrases() {
        let mut tables = AspectTables::new(1..=2);
        tables.prior_pass(&[tokens(&["good", "day"])]);
        tables.sentiment_pass(&[classified(&["bad", "day"], 0.05)]);

        let bad_day = tables.aspect(&gram(&["bad", "day"])).unwrap();
        assert_eq!(*bad_day, Aspect { prior_count: 0, positive_count: 0, negative_count: 1 });
    }

    #[test]
    fn repeated_phrase_counts_every_occurrence() {
        let mut tables = AspectTables::new(1..=2);
        let item = classified(&["so", "so", "so"], 0.9);
        tables.sentiment_pass(&[item]);

        assert_eq!(tables.aspect(&gram(&["so"])).unwrap().positive_count, 3);
        assert_eq!(tables.aspect(&gram(&["so", "so"])).unwrap().sentiment_count(), 2);
    }

    #[test]
    fn priors_seed_new_tables() {
        let mut counted = AspectTables::new(1..=3);
        counted.prior_pass(&[tokens(&["a", "b", "a", "b"])]);
        let priors = counted.priors();

        assert_eq!(priors.count(&gram(&["a", "b"])), 2);
        assert_eq!(priors.count(&gram(&["b", "a"])), 1);
        assert_eq!(priors.count(&gram(&["z"])), 0);

        let seeded = AspectTables::from_priors(&priors, 1..=4);
        assert_eq!(seeded.orders(), 1..=4);
        assert!(seeded.table(4).unwrap().is_empty());
        assert_eq!(seeded.aspect(&gram(&["a"])).unwrap().prior_count, 2);
        assert_eq!(seeded.aspect(&gram(&["a"])).unwrap().positive_count, 0);
    }

    #[test]
    fn prior_file_layout() {
        let mut counted = AspectTables::new(1..=2);
        counted.prior_pass(&[tokens(&["a", "b", "a"])]);

        let json = serde_json::to_value(counted.priors()).unwrap();
        assert_eq!(json["tables"][0], serde_json::json!([]));
        assert_eq!(json["tables"][1][0], serde_json::json!({ "gram": ["a"], "count": 2 }));
        assert_eq!(json["tables"][2].as_array().unwrap().len(), 2);

        let priors: PriorTables = serde_json::from_value(json).unwrap();
        assert_eq!(priors, counted.priors());
    }

    #[test]
    fn merged_partials_equal_sequential_pass() {
        let items = vec![
            classified(&["love", "this", "phone"], 0.9),
            classified(&["hate", "this", "phone"], 0.2),
            classified(&["this", "phone"], 0.7),
            classified(&["love", "it"], 0.95),
        ];

        let mut sequential = AspectTables::new(1..=4);
        sequential.sentiment_pass(&items);

        let mut merged = AspectTables::new(1..=4);
        for chunk in items.chunks(3) {
            let mut partial = AspectTables::new(1..=4);
            partial.sentiment_pass(chunk);
            merged.merge(partial);
        }

        for n in 1..=4 {
            assert_eq!(merged.table(n), sequential.table(n));
        }
    }
}
