use {
    thiserror::Error,
    crate::classifier::Label,
};

pub type Result<T> = std::result::Result<T, PlumageError>;

#[derive(Error, Debug)]
pub enum PlumageError {
    #[error("training corpus is empty")]
    EmptyCorpus,

    #[error("training corpus only contains {label:?} examples ({examples} total), nothing to discriminate")]
    SingleClassCorpus { label: Label, examples: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("missing required input {what}: {path}")]
    MissingInput { what: String, path: String },

    #[error("malformed record #{index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    #[error("token rejected: {token:?} ({reason})")]
    TokenRejected { token: String, reason: String },
}

impl PlumageError {
    pub fn token_rejected(token: &str, reason: impl ToString) -> Self {
        Self::TokenRejected {
            token: token.to_owned(),
            reason: reason.to_string(),
        }
    }

    /// Fatal errors abort the run; the rest are skipped and counted by the caller.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::EmptyCorpus
            | Self::SingleClassCorpus { .. }
            | Self::InvalidConfig(_)
            | Self::MissingInput { .. } => true,
            Self::MalformedRecord { .. } | Self::TokenRejected { .. } => false,
        }
    }
}
