//! Address-level detectors: format validation, lexical red flags and
//! look-alike (phishing) similarity.

pub mod format;
pub mod pattern;
pub mod similarity;
