use crate::errors::GamepassError;
use std::fmt;
use std::str::FromStr;

/// Identifier accepted by the upstream platform: one or more ASCII digits.
///
/// Kept as a string so arbitrarily long ids pass through untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NumericId(String);

impl NumericId {
    /// Parses `value`, naming `field` in the error so callers can report which
    /// parameter was wrong.
    pub fn parse(field: &str, value: &str) -> Result<Self, GamepassError> {
        value
            .parse()
            .map_err(|_| GamepassError::invalid_input(format!("{field} must be numeric")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct NotNumeric;

impl FromStr for NumericId {
    type Err = NotNumeric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(NumericId(s.to_string()))
        } else {
            Err(NotNumeric)
        }
    }
}

impl fmt::Display for NumericId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
