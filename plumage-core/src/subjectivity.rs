use {
    tracing::info,
    crate::models::ClassifiedItem,
};

#[derive(Clone, Copy, Debug)]
pub struct SubjectivityFilter {
    threshold: f64,
}

/// Items that passed the filter plus how many were dropped.
pub struct Filtered {
    pub accepted: Vec<ClassifiedItem>,
    pub rejected: usize,
}

impl SubjectivityFilter {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
        }
    }

    pub fn accept(&self, item: &ClassifiedItem) -> bool {
        (item.positivity - item.negativity).abs() > self.threshold
    }

    pub fn apply(&self, items: impl IntoIterator<Item = ClassifiedItem>) -> Filtered {
        let mut accepted = Vec::new();
        let mut rejected = 0;

        for item in items {
            if self.accept(&item) {
                accepted.push(item);
            } else {
                rejected += 1;
            }
        }

        info!("{} items were rejected for not being subjective enough (threshold {})", rejected, self.threshold);

        Filtered {
            accepted,
            rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{classifier::Scores, models::Item},
    };

    fn item(positivity: f64) -> ClassifiedItem {
        Item::new(format!("{}", positivity), vec!["x".to_owned()]).classified(Scores {
            positivity,
            negativity: 1.0 - positivity,
        })
    }

    #[test]
    fn separation_must_strictly_exceed_threshold() {
        let filter = SubjectivityFilter::new(0.30);

        assert!(filter.accept(&item(0.9)));
        assert!(filter.accept(&item(0.1)));
        assert!(!filter.accept(&item(0.55)));
        assert!(!filter.accept(&item(0.5)));
    }

    #[test]
    fn counts_rejections() {
        let filtered = SubjectivityFilter::new(0.30).apply(vec![item(0.9), item(0.5), item(0.6), item(0.02)]);

        assert_eq!(filtered.accepted.len(), 2);
        assert_eq!(filtered.rejected, 2);
    }

    #[test]
    fn raising_threshold_never_accepts_more() {
        let items: Vec<_> = (0..=20).map(|i| item(i as f64 / 20.0)).collect();

        let mut previous = usize::MAX;
        for step in 0..20 {
            let threshold = step as f64 / 20.0;
            let accepted = SubjectivityFilter::new(threshold).apply(items.clone()).accepted.len();
            assert!(accepted <= previous);
            previous = accepted;
        }
    }
}
