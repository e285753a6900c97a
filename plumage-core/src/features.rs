use std::collections::HashMap;

/// Presence-only bag of words: every key maps to `true`.
pub type Features = HashMap<String, bool>;

pub fn to_features<S: AsRef<str>>(tokens: &[S]) -> Features {
    tokens.iter()
        .map(|token| (token.as_ref().to_owned(), true))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_collapse_to_presence() {
        let features = to_features(&["good", "good", "day"]);

        assert_eq!(features.len(), 2);
        assert_eq!(features.get("good"), Some(&true));
        assert_eq!(features.get("day"), Some(&true));
        assert_eq!(features.get("bad"), None);
    }

    #[test]
    fn order_does_not_matter() {
        assert_eq!(to_features(&["a", "b", "c"]), to_features(&["c", "a", "b", "a"]));
    }

    #[test]
    fn empty_sequence_is_empty_bag() {
        assert!(to_features::<&str>(&[]).is_empty());
    }
}
