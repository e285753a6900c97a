use {
    std::{collections::HashSet, fmt, io},
    typed_builder::TypedBuilder,
    serde::Serialize,
    tracing::info,
    crate::{
        aspects::{Aspect, AspectTable, AspectTables, Gram},
        config::RateUnit,
    },
};

// Contractions with the apostrophe stripped by cleaning, plus fillers.
const EXTRA_STOPWORDS: &[&str] = &[
    "dont", "arent", "isnt", "didnt", "hadnt", "hasnt", "couldnt", "shant", "shouldnt", "wouldns",
    "wasnt", "werent", "wont", "neednt", "mustnt", "mightnt", "thats", "get", "go", "like",
];

pub struct Stopwords {
    words: HashSet<String>,
}

/// Share of a phrase's prior count, undefined when the prior count is zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rate {
    value: Option<f64>,
    unit: RateUnit,
}

#[derive(TypedBuilder, Serialize, Clone, Debug, PartialEq)]
pub struct ReportRow {
    n: usize,
    aspect: String,
    count: u64,
    positive: u64,
    negative: u64,
    positive_rate: Option<f64>,
    negative_rate: Option<f64>,
}

pub struct Reporter<'a> {
    limit: usize,
    unit: RateUnit,
    stopwords: &'a Stopwords,
}

impl Stopwords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words.into_iter().map(|word| word.as_ref().to_lowercase()).collect(),
        }
    }

    pub fn with_extras(mut self) -> Self {
        self.words.extend(EXTRA_STOPWORDS.iter().map(|word| word.to_string()));
        self
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Rate {
    pub fn new(count: u64, total: u64, unit: RateUnit) -> Self {
        let value = if total == 0 {
            None
        } else {
            let fraction = count as f64 / total as f64;
            Some(match unit {
                RateUnit::Percent => 100.0 * fraction,
                RateUnit::Fraction => fraction,
            })
        };

        Self {
            value,
            unit,
        }
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match (self.value, self.unit) {
            (None, _) => "n/a".to_owned(),
            (Some(v), RateUnit::Percent) => format!("{:.2}%", v),
            (Some(v), RateUnit::Fraction) => format!("{:.4}", v),
        };
        f.pad(&text)
    }
}

impl ReportRow {
    pub fn from_aspect(n: usize, gram: &Gram, aspect: &Aspect, unit: RateUnit) -> Self {
        Self::builder()
            .n(n)
            .aspect(gram.join(" "))
            .count(aspect.prior_count)
            .positive(aspect.positive_count)
            .negative(aspect.negative_count)
            .positive_rate(Rate::new(aspect.positive_count, aspect.prior_count, unit).value())
            .negative_rate(Rate::new(aspect.negative_count, aspect.prior_count, unit).value())
            .build()
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn aspect(&self) -> &str {
        &self.aspect
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn positive(&self) -> u64 {
        self.positive
    }

    pub fn negative(&self) -> u64 {
        self.negative
    }

    pub fn positive_rate(&self) -> Option<f64> {
        self.positive_rate
    }

    pub fn negative_rate(&self) -> Option<f64> {
        self.negative_rate
    }
}

/// Entries by descending prior count; equal counts keep phrase order.
pub fn rank(table: &AspectTable) -> Vec<(&Gram, &Aspect)> {
    let mut ranked: Vec<_> = table.iter().collect();
    ranked.sort_by(|(a_gram, a), (b_gram, b)| {
        b.prior_count.cmp(&a.prior_count).then_with(|| a_gram.cmp(b_gram))
    });
    ranked
}

impl<'a> Reporter<'a> {
    pub fn new(limit: usize, unit: RateUnit, stopwords: &'a Stopwords) -> Self {
        Self {
            limit,
            unit,
            stopwords,
        }
    }

    /// Top entries for display. Single-word phrases that are stopwords are
    /// passed over without counting towards the limit.
    pub fn display_rows(&self, n: usize, table: &AspectTable) -> Vec<ReportRow> {
        rank(table).into_iter()
            .filter(|(gram, _)| n != 1 || !gram.first().map(|word| self.stopwords.contains(word)).unwrap_or(false))
            .take(self.limit)
            .map(|(gram, aspect)| ReportRow::from_aspect(n, gram, aspect, self.unit))
            .collect()
    }

    /// Top entries of every order, unfiltered.
    pub fn export_rows(&self, tables: &AspectTables) -> Vec<ReportRow> {
        tables.orders()
            .filter_map(|n| tables.table(n).map(|table| (n, table)))
            .flat_map(|(n, table)| {
                rank(table).into_iter()
                    .take(self.limit)
                    .map(move |(gram, aspect)| ReportRow::from_aspect(n, gram, aspect, self.unit))
            })
            .collect()
    }

    pub fn render(&self, tables: &AspectTables) -> Vec<String> {
        let mut lines = Vec::new();

        for n in tables.orders() {
            let table = match tables.table(n) {
                Some(v) => v,
                None => continue,
            };

            if n == 1 {
                lines.push(format!("Top {} 1-grams (stop-words removed):", self.limit));
            }
            lines.push(format!("|             {}-gram             | Count |  Positivity  |  Negativity  |", n));
            lines.push("- - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -".to_owned());

            for row in self.display_rows(n, table) {
                lines.push(self.render_row(&row));
            }
        }

        lines
    }

    pub fn log_report(&self, tables: &AspectTables) {
        for line in self.render(tables) {
            info!("{}", line);
        }
    }

    pub fn render_row(&self, row: &ReportRow) -> String {
        let positive_rate = Rate::new(row.positive, row.count, self.unit);
        let negative_rate = Rate::new(row.negative, row.count, self.unit);

        format!(
            "| {:>30} | {:>5} | {:>3} ({:>8}) | {:>3} ({:>8}) |",
            row.aspect,
            row.count,
            row.positive,
            positive_rate,
            row.negative,
            negative_rate,
        )
    }

    /// Headerless CSV, one row per exported phrase. Undefined rates are empty cells.
    pub fn write_csv<W: io::Write>(&self, rows: &[ReportRow], writer: W) -> csv::Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        for row in rows {
            writer.serialize(row)?;
        }

        writer.flush()?;
        Ok(())
    }
}
