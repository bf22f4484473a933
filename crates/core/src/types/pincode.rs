//! Postal index number (pincode) type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Pincode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PincodeError {
    /// The input string is empty.
    #[error("pincode cannot be empty")]
    Empty,
    /// The input does not have exactly six characters.
    #[error("pincode must be exactly {expected} digits")]
    WrongLength {
        /// Required number of digits.
        expected: usize,
    },
    /// The input contains a character that is not an ASCII digit.
    #[error("pincode must contain only digits")]
    NonDigit,
}

/// A six-digit delivery pincode.
///
/// Validation is purely local and happens before any backend call, so a
/// malformed pincode never reaches the network.
///
/// ## Constraints
///
/// - Exactly 6 characters
/// - ASCII digits only (no whitespace, signs or separators)
///
/// ## Examples
///
/// ```
/// use freshcart_core::Pincode;
///
/// assert!(Pincode::parse("123456").is_ok());
///
/// assert!(Pincode::parse("12345").is_err());  // too short
/// assert!(Pincode::parse("abcdef").is_err()); // not numeric
/// assert!(Pincode::parse("").is_err());       // empty
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Pincode(String);

impl Pincode {
    /// Number of digits in a pincode.
    pub const LENGTH: usize = 6;

    /// Parse a `Pincode` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, is not exactly six characters
    /// long, or contains anything other than ASCII digits.
    pub fn parse(s: &str) -> Result<Self, PincodeError> {
        if s.is_empty() {
            return Err(PincodeError::Empty);
        }

        if s.len() != Self::LENGTH {
            return Err(PincodeError::WrongLength {
                expected: Self::LENGTH,
            });
        }

        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PincodeError::NonDigit);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the pincode as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Pincode` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Pincode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Pincode {
    type Err = PincodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Pincode {
    type Error = PincodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Pincode> for String {
    fn from(pincode: Pincode) -> Self {
        pincode.0
    }
}

impl AsRef<str> for Pincode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
