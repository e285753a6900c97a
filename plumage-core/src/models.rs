use {
    serde::{Serialize, Deserialize},
    crate::{
        classifier::{Label, Scores},
        error::{PlumageError, Result},
    },
};

/// One row of the preprocessed item file, in column order.
///
/// Only `id` and `cleaned_tokens` are read by the pipeline; everything else is
/// carried through to the exported items untouched.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ItemRecord {
    pub full_text: String,
    pub created_at: String,
    pub source: String,
    pub id: String,
    pub retweet_count: String,
    pub favorite_count: String,
    pub user_name: String,
    pub user_id_str: String,
    pub user_handle: String,
    pub user_location: String,
    pub user_desc: String,
    pub user_protected: String,
    pub user_followers: String,
    pub user_created: String,
    pub user_verified: String,
    pub user_tweet_count: String,
    pub cleaned_text: String,
    /// JSON array of cleaned tokens.
    pub cleaned_tokens: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Item {
    pub id: String,
    pub tokens: Vec<String>,
    pub record: ItemRecord,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ClassifiedItem {
    pub id: String,
    pub tokens: Vec<String>,
    pub record: ItemRecord,
    pub positivity: f64,
    pub negativity: f64,
    pub difference: f64,
}

impl ItemRecord {
    pub fn into_item(self, index: usize) -> Result<Item> {
        let tokens: Vec<String> = serde_json::from_str(&self.cleaned_tokens)
            .map_err(|err| PlumageError::MalformedRecord {
                index,
                reason: format!("cleaned tokens are not a json string array: {}", err),
            })?;

        Ok(Item {
            id: self.id.clone(),
            tokens,
            record: self,
        })
    }
}

impl Item {
    pub fn new(id: impl Into<String>, tokens: Vec<String>) -> Self {
        let id = id.into();
        Self {
            record: ItemRecord {
                id: id.clone(),
                cleaned_tokens: serde_json::to_string(&tokens).unwrap_or_default(),
                ..ItemRecord::default()
            },
            id,
            tokens,
        }
    }

    pub fn classified(self, scores: Scores) -> ClassifiedItem {
        ClassifiedItem {
            id: self.id,
            tokens: self.tokens,
            record: self.record,
            positivity: scores.positivity,
            negativity: scores.negativity,
            difference: scores.separation(),
        }
    }
}

impl ClassifiedItem {
    /// Predicted class used by the sentiment pass. A tie counts as negative.
    pub fn polarity(&self) -> Label {
        if self.positivity > self.negativity {
            Label::Positive
        } else {
            Label::Negative
        }
    }
}
