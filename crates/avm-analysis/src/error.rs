use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("failed to read lexicon {path}: {source}")]
    LexiconIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse lexicon {path}: {source}")]
    LexiconParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid lexicon weight for '{keyword}': {weight} (must be non-zero and within [-1, 1])")]
    InvalidWeight { keyword: String, weight: f64 },
}
