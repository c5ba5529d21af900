use once_cell::sync::Lazy;
use regex::Regex;

static BASE58: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[1-9A-HJ-NP-Za-km-z]+$").expect("valid Base58 regex"));

/// Characters that Base58 leaves out because they are easy to confuse.
const AMBIGUOUS_CHARS: [char; 4] = ['0', 'O', 'I', 'l'];

/// Textual encoding rules for addresses on one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainProfile {
    pub name: String,
    pub min_len: usize,
    pub max_len: usize,
}

impl ChainProfile {
    /// Solana-style Base58 public keys (32–44 characters).
    pub fn solana() -> Self {
        Self {
            name: "solana".to_string(),
            min_len: 32,
            max_len: 44,
        }
    }

    /// Look up a profile by chain name. Unknown chains fall back to the Solana rules.
    pub fn for_chain(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "solana" | "sol" => Self::solana(),
            other => {
                tracing::debug!(chain = %other, "No address profile for chain, using Solana rules");
                Self {
                    name: other.to_string(),
                    ..Self::solana()
                }
            }
        }
    }
}

impl Default for ChainProfile {
    fn default() -> Self {
        Self::solana()
    }
}

/// Outcome of a format check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatCheck {
    pub valid: bool,
    pub reason: Option<&'static str>,
}

impl FormatCheck {
    fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    fn invalid(reason: &'static str) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
        }
    }
}

/// Validate an address against the default (Solana) profile.
pub fn validate(address: &str) -> FormatCheck {
    validate_for(&ChainProfile::solana(), address)
}

/// Validate an address against a chain profile. Length is counted in characters.
pub fn validate_for(profile: &ChainProfile, address: &str) -> FormatCheck {
    let len = address.chars().count();
    if len < profile.min_len || len > profile.max_len {
        return FormatCheck::invalid("incorrect length");
    }

    if address.chars().any(|c| AMBIGUOUS_CHARS.contains(&c)) {
        return FormatCheck::invalid("invalid characters for Base58");
    }

    if !BASE58.is_match(address) {
        return FormatCheck::invalid("not Base58");
    }

    FormatCheck::ok()
}
