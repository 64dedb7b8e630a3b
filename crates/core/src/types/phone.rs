//! Pakistani mobile phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input is empty (after stripping separators).
    #[error("phone number cannot be empty")]
    Empty,
    /// The input does not start with `+92`, `0` or the mobile prefix `3`.
    #[error("phone number must start with +92, 0 or 3")]
    MissingPrefix,
    /// The subscriber part does not start with the mobile prefix `3`.
    #[error("phone number must be a mobile number starting with 3 after the prefix")]
    NotMobile,
    /// The subscriber part has the wrong number of digits.
    #[error("phone number must have 10 digits after the prefix (got {got})")]
    WrongLength {
        /// Number of digits found after the prefix.
        got: usize,
    },
    /// The input contains something other than digits and separators.
    #[error("phone number may only contain digits, spaces and hyphens")]
    InvalidCharacter,
}

/// A validated Pakistani mobile number.
///
/// ## Accepted input
///
/// Spaces and hyphens are stripped first. What remains must be an optional
/// `+92` or `0` prefix followed by `3` and nine more digits.
///
/// The number is stored in canonical international form (`+923001234567`)
/// so `0300-1234567` and `+92 300 1234567` resolve to the same customer.
///
/// ## Examples
///
/// ```
/// use yousuf_rice_core::PhoneNumber;
///
/// assert!(PhoneNumber::parse("03001234567").is_ok());
/// assert!(PhoneNumber::parse("+923001234567").is_ok());
/// assert!(PhoneNumber::parse("0300-123 4567").is_ok());
/// assert!(PhoneNumber::parse("3001234567").is_ok());
///
/// assert!(PhoneNumber::parse("123456").is_err());
/// assert!(PhoneNumber::parse("03001234").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// International dialling prefix for Pakistan.
    pub const COUNTRY_PREFIX: &'static str = "+92";

    /// Digits after the prefix (`3XXXXXXXXX`).
    pub const SUBSCRIBER_DIGITS: usize = 10;

    /// Parse a `PhoneNumber` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input, with spaces and hyphens removed:
    /// - Is empty
    /// - Contains anything but digits (and a leading `+`)
    /// - Does not start with `+92`, `0` or `3`
    /// - Does not continue with `3` after a prefix
    /// - Does not have exactly ten digits after the prefix
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let compact: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();

        if compact.is_empty() {
            return Err(PhoneError::Empty);
        }

        let subscriber = if let Some(rest) = compact.strip_prefix(Self::COUNTRY_PREFIX) {
            rest
        } else if let Some(rest) = compact.strip_prefix('0') {
            rest
        } else if compact.starts_with('3') {
            compact.as_str()
        } else if compact.chars().all(|c| c.is_ascii_digit()) {
            return Err(PhoneError::MissingPrefix);
        } else {
            return Err(PhoneError::InvalidCharacter);
        };

        if !subscriber.chars().all(|c| c.is_ascii_digit()) {
            return Err(PhoneError::InvalidCharacter);
        }

        if !subscriber.starts_with('3') {
            return Err(PhoneError::NotMobile);
        }

        if subscriber.len() != Self::SUBSCRIBER_DIGITS {
            return Err(PhoneError::WrongLength {
                got: subscriber.len(),
            });
        }

        Ok(Self(format!("{}{subscriber}", Self::COUNTRY_PREFIX)))
    }

    /// Returns the canonical `+92…` form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the local `03XX…` form used on delivery slips.
    #[must_use]
    pub fn local(&self) -> String {
        let subscriber = self.0.trim_start_matches(Self::COUNTRY_PREFIX);
        format!("0{subscriber}")
    }

    /// Consumes the `PhoneNumber` and returns its canonical string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
