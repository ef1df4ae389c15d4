//! Analysis constants shared by the metrics, comparison and section code.

/// Fingerprints closer than this (strictly) are near-duplicates.
pub const NEAR_DUPLICATE_DISTANCE: u32 = 4;

/// A page whose fingerprint moved by more than this between two captures
/// counts as changed.
pub const CHANGE_THRESHOLD: u32 = 8;

/// Tokens per shingle for page fingerprints.
pub const SHINGLE_WINDOW: usize = 3;

/// MIME prefix of HTML resources.
pub const HTML_MIME_PREFIX: &str = "text/html";

/// MIME prefix of image resources.
pub const IMAGE_MIME_PREFIX: &str = "image/";

/// Records at or above this status are errors.
pub const ERROR_STATUS: u16 = 400;

/// How often (in edge-list lines) the graph builder reports progress.
pub const PROGRESS_INTERVAL: usize = 1000;
