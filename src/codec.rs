//! Conversion between internal numeric IDs and public Letterboxd IDs.
//!
//! A public ID is the base-62 rendering of `internal_id * 10 + tag`, where the
//! tag digit marks the namespace: 0 for films and other items
//! ([`IdKind::Primary`]), 7 for members ([`IdKind::Secondary`]). The alphabet
//! puts lowercase before uppercase (the "inverted" ordering), which must
//! match the service's table for IDs to be interchangeable.
//!
//! # Example
//!
//! ```
//! use lbxd::codec::{IdKind, decode_id, decode_id_with_kind, encode_id};
//!
//! let external = encode_id(12345, IdKind::Secondary)?;
//! assert_eq!(decode_id(&external)?, 12345);
//! assert_eq!(
//!     decode_id_with_kind(&external)?,
//!     (12345, Some(IdKind::Secondary))
//! );
//! # Ok::<(), lbxd::codec::CodecError>(())
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The 62-symbol alphabet, digit value = index.
pub const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

const BASE: u64 = 62;

/// Largest internal ID whose tagged value still fits in a `u64`.
pub const MAX_INTERNAL_ID: u64 = (u64::MAX - 7) / 10;

/// Namespace of an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    /// Films and other items. Tag digit 0.
    Primary,
    /// Members. Tag digit 7.
    Secondary,
}

impl IdKind {
    /// The low decimal digit this kind adds to the tagged value.
    #[must_use]
    pub fn tag(self) -> u64 {
        match self {
            Self::Primary => 0,
            Self::Secondary => 7,
        }
    }

    fn from_tag(tag: u64) -> Option<Self> {
        match tag {
            0 => Some(Self::Primary),
            7 => Some(Self::Secondary),
            _ => None,
        }
    }
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Secondary => f.write_str("secondary"),
        }
    }
}

/// Errors from encoding or decoding IDs. All are caller input errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A signed internal ID below zero.
    #[error("internal ID must be non-negative, got {value}")]
    NegativeId {
        /// The rejected value.
        value: i64,
    },

    /// The internal ID or the decoded value does not fit in 64 bits.
    #[error("ID out of range: {input}")]
    OutOfRange {
        /// The offending input, as given.
        input: String,
    },

    /// Decoding an empty string.
    #[error("external ID is empty")]
    Empty,

    /// A character outside the alphabet.
    #[error("invalid character {character:?} at position {position} in external ID {input:?}")]
    InvalidCharacter {
        /// The full input.
        input: String,
        /// The offending character.
        character: char,
        /// Its character index.
        position: usize,
    },
}

/// Converts a signed ID from an external source, rejecting negatives.
///
/// # Errors
///
/// Returns [`CodecError::NegativeId`] for values below zero.
pub fn internal_id_from_signed(value: i64) -> Result<u64, CodecError> {
    u64::try_from(value).map_err(|_| CodecError::NegativeId { value })
}

/// Encodes an internal ID as a public ID.
///
/// # Errors
///
/// Returns [`CodecError::OutOfRange`] if `internal_id` exceeds [`MAX_INTERNAL_ID`].
pub fn encode_id(internal_id: u64, kind: IdKind) -> Result<String, CodecError> {
    let tagged = internal_id
        .checked_mul(10)
        .and_then(|v| v.checked_add(kind.tag()))
        .ok_or_else(|| CodecError::OutOfRange {
            input: internal_id.to_string(),
        })?;
    Ok(to_base62(tagged))
}

/// Decodes a public ID to its internal ID, discarding the namespace tag.
///
/// # Errors
///
/// Returns [`CodecError::Empty`], [`CodecError::InvalidCharacter`], or
/// [`CodecError::OutOfRange`] for malformed input.
pub fn decode_id(external_id: &str) -> Result<u64, CodecError> {
    Ok(from_base62(external_id)? / 10)
}

/// Decodes a public ID and also reports its namespace.
///
/// The kind is `None` when the tag digit is neither 0 nor 7, which no encoded
/// ID produces but hand-written input can.
///
/// # Errors
///
/// Same as [`decode_id`].
pub fn decode_id_with_kind(external_id: &str) -> Result<(u64, Option<IdKind>), CodecError> {
    let tagged = from_base62(external_id)?;
    Ok((tagged / 10, IdKind::from_tag(tagged % 10)))
}

fn to_base62(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        // value % BASE < 62, so the index is in bounds
        #[allow(clippy::cast_possible_truncation)]
        let index = (value % BASE) as usize;
        digits.push(ALPHABET[index]);
        value /= BASE;
    }
    digits.iter().rev().map(|&b| char::from(b)).collect()
}

fn from_base62(input: &str) -> Result<u64, CodecError> {
    if input.is_empty() {
        return Err(CodecError::Empty);
    }

    input
        .chars()
        .enumerate()
        .try_fold(0u64, |acc, (position, character)| {
            let digit = digit_value(character).ok_or_else(|| CodecError::InvalidCharacter {
                input: input.to_string(),
                character,
                position,
            })?;
            acc.checked_mul(BASE)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| CodecError::OutOfRange {
                    input: input.to_string(),
                })
        })
}

fn digit_value(character: char) -> Option<u64> {
    let value = match character {
        '0'..='9' => u32::from(character) - u32::from('0'),
        'a'..='z' => u32::from(character) - u32::from('a') + 10,
        'A'..='Z' => u32::from(character) - u32::from('A') + 36,
        _ => return None,
    };
    Some(u64::from(value))
}

/// A public ID that has already been validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalId(String);

impl ExternalId {
    /// Encodes `internal_id` under `kind`.
    ///
    /// # Errors
    ///
    /// Same as [`encode_id`].
    pub fn encode(internal_id: u64, kind: IdKind) -> Result<Self, CodecError> {
        encode_id(internal_id, kind).map(Self)
    }

    /// The internal ID this public ID stands for.
    #[must_use]
    pub fn internal_id(&self) -> u64 {
        // Validated on construction.
        from_base62(&self.0).map_or(0, |tagged| tagged / 10)
    }

    /// The namespace, when the tag digit identifies one.
    #[must_use]
    pub fn kind(&self) -> Option<IdKind> {
        from_base62(&self.0)
            .ok()
            .and_then(|tagged| IdKind::from_tag(tagged % 10))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ExternalId {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        from_base62(s)?;
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
