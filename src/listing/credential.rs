//! # SAS Token
//!
//! Opaque credential appended to listing requests.

use zeroize::Zeroizing;

/// Shared access signature read from the `sas-token` secret
///
/// The value is wiped on drop and never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct SasToken(Zeroizing<String>);

impl SasToken {
    /// Build a token from a raw secret value
    ///
    /// A single trailing line terminator (`\n` or `\r\n`) is removed, as is a
    /// leading `?` left over from copying a full SAS URL query string.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let trimmed = raw
            .strip_suffix("\r\n")
            .or_else(|| raw.strip_suffix('\n'))
            .unwrap_or(raw);
        let trimmed = trimmed.strip_prefix('?').unwrap_or(trimmed);
        Self(Zeroizing::new(trimmed.to_string()))
    }

    /// Query-string form of the token
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SasToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SasToken(***)")
    }
}
