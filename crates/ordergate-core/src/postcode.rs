//! Postal code normalization.
//!
//! Postcodes act as a weak second factor gating disclosure of order details,
//! so every comparison happens between normalized forms: uppercase, all
//! whitespace removed. The normalized value is never stored anywhere.

/// A postcode in normalized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Postcode(String);

impl Postcode {
    /// Normalizes a raw postcode: strips all whitespace and uppercases.
    ///
    /// Idempotent: normalizing an already-normalized value is a no-op.
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        Self(compact.to_uppercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Postcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
