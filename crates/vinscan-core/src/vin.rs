// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// VIN grammar — the 17-character alphabet, the check-character position, and
// the `Vin` newtype that can only hold structurally valid values.
//
// Validation is format-only: position and character class of the check
// character are enforced, the ISO 3779 weighted checksum is not.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VinScanError};

/// Number of characters in a VIN.
pub const VIN_LENGTH: usize = 17;

/// Zero-based index of the check character (position 9).
pub const CHECK_DIGIT_INDEX: usize = 8;

/// Every character a VIN may contain: digits plus letters minus I, O, Q.
pub const VIN_ALPHABET: &str = "0123456789ABCDEFGHJKLMNPRSTUVWXYZ";

/// Letters that never appear in a VIN because they read as digits.
pub const FORBIDDEN_LETTERS: [char; 3] = ['I', 'O', 'Q'];

/// Whether `c` belongs to the VIN alphabet.
pub fn is_vin_char(c: char) -> bool {
    c.is_ascii_digit() || (c.is_ascii_uppercase() && !FORBIDDEN_LETTERS.contains(&c))
}

/// Whether `c` may sit at the check-character position.
pub fn is_check_char(c: char) -> bool {
    c.is_ascii_digit() || c == 'X'
}

/// Length, alphabet, and check-character class conformance.
pub fn is_structurally_valid(candidate: &str) -> bool {
    // Byte length first: anything non-ASCII fails `is_vin_char` anyway.
    if candidate.len() != VIN_LENGTH {
        return false;
    }
    candidate.chars().enumerate().all(|(i, c)| {
        if i == CHECK_DIGIT_INDEX {
            is_check_char(c)
        } else {
            is_vin_char(c)
        }
    })
}

/// A structurally valid Vehicle Identification Number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Vin(String);

impl Vin {
    /// Validate `candidate` exactly as given (no cleaning, no correction).
    pub fn parse(candidate: &str) -> Result<Self> {
        if is_structurally_valid(candidate) {
            Ok(Self(candidate.to_string()))
        } else {
            Err(VinScanError::InvalidVin(candidate.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// World manufacturer identifier (positions 1-3).
    pub fn wmi(&self) -> &str {
        &self.0[..3]
    }

    /// The check character (position 9).
    pub fn check_char(&self) -> char {
        self.0.as_bytes()[CHECK_DIGIT_INDEX] as char
    }
}

impl fmt::Display for Vin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Vin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Vin {
    type Error = VinScanError;

    fn try_from(value: String) -> Result<Self> {
        if is_structurally_valid(&value) {
            Ok(Self(value))
        } else {
            Err(VinScanError::InvalidVin(value))
        }
    }
}

impl From<Vin> for String {
    fn from(vin: Vin) -> Self {
        vin.0
    }
}

impl std::str::FromStr for Vin {
    type Err = VinScanError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
