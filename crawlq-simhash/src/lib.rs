pub mod error;
pub mod extract;
pub mod fingerprint;
pub mod shingle;

pub use error::SimhashError;
pub use extract::{
    PageText, breadcrumb_section, decode_html, extract_text, fingerprint_document, fingerprint_html,
    tokenize,
};
pub use fingerprint::{Algorithm, Fingerprint};
pub use shingle::FingerprintBuilder;
