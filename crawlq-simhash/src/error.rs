use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimhashError {
    #[error("Fingerprints have different algorithms ({0} vs {1}), distance can not be measured")]
    IncompatibleAlgorithms(&'static str, &'static str),

    #[error("Fingerprints have different sizes ({0} vs {1} bits)")]
    IncompatibleWidths(u32, u32),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Invalid fingerprint: {0}")]
    InvalidFingerprint(String),
}

pub type Result<T> = std::result::Result<T, SimhashError>;
