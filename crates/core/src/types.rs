//! Validated text types used across the core.
//!
//! These wrappers push input validation to the construction site so that
//! downstream code can assume well-formed values: a `NonEmptyText` always has
//! visible content, and an `EmailAddress` is always trimmed, lowercased, and
//! shaped like `local@domain`.

use crate::{CoreError, CoreResult};
use std::fmt;

/// A string guaranteed to contain at least one non-whitespace character.
///
/// Input is trimmed during construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a `NonEmptyText`, rejecting empty or whitespace-only input.
    pub fn new(input: impl AsRef<str>) -> CoreResult<Self> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidInput("text cannot be empty".into()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NonEmptyText::new(&raw).map_err(serde::de::Error::custom)
    }
}

/// A normalised email address.
///
/// Normalisation lowercases and trims the input; validation requires exactly
/// one `@` with a non-empty local part and a domain containing no whitespace.
/// Uniqueness checks in the user store compare the normalised form, so
/// `Alice@example.com` and `alice@example.com` are the same account.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parses and normalises an email address.
    pub fn parse(input: impl AsRef<str>) -> CoreResult<Self> {
        let normalised = input.as_ref().trim().to_lowercase();

        let invalid = || CoreError::InvalidInput(format!("invalid email address: '{normalised}'"));

        let (local, domain) = normalised.split_once('@').ok_or_else(invalid)?;
        if local.is_empty() || domain.is_empty() {
            return Err(invalid());
        }
        if domain.contains('@') || normalised.chars().any(char::is_whitespace) {
            return Err(invalid());
        }

        Ok(Self(normalised))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl serde::Serialize for EmailAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for EmailAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        EmailAddress::parse(&raw).map_err(serde::de::Error::custom)
    }
}
