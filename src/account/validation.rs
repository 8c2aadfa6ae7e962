//! Input validation for account fields
//!
//! Validated types keep their fields private so the only way to get one is
//! through the checking constructor.

use std::fmt;

/// Validation errors for account input
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("Currency code must be uppercase: got '{got}', expected '{expected}'")]
    CurrencyNotUppercase { got: String, expected: String },

    #[error("Invalid length for {field}: expected {expected}, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid format for {field}: '{value}' (expected: {expected})")]
    InvalidFormat {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// ISO-4217 style currency code (exactly three uppercase ASCII letters)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub const LEN: usize = 3;

    /// Validate a currency code
    ///
    /// # Validation Rules
    /// - Surrounding whitespace is ignored
    /// - Exactly 3 characters
    /// - Uppercase letters A-Z only
    ///
    /// # Examples
    /// ```
    /// use bank_ledger::account::validation::CurrencyCode;
    ///
    /// let usd = CurrencyCode::new(" USD ").unwrap();
    /// assert_eq!(usd.as_str(), "USD");
    ///
    /// assert!(CurrencyCode::new("usd").is_err());
    /// ```
    pub fn new(code: &str) -> Result<Self, ValidationError> {
        let code = code.trim();

        let actual = code.chars().count();
        if actual != Self::LEN {
            return Err(ValidationError::InvalidLength {
                field: "currency",
                expected: Self::LEN,
                actual,
            });
        }

        let expected = code.to_uppercase();
        if code != expected {
            return Err(ValidationError::CurrencyNotUppercase {
                got: code.to_string(),
                expected,
            });
        }

        if !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::InvalidFormat {
                field: "currency",
                value: code.to_string(),
                expected: "three letters A-Z",
            });
        }

        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
