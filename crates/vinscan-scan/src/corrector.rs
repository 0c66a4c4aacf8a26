// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Candidate corrector — turns noisy recognition output into the set of VINs
// it could plausibly have been.
//
// OCR confuses a handful of glyph pairs on stamped plates. Letters the VIN
// alphabet forbids (I, O, Q) are always read as digits, the check position is
// forced through a numeral table, and every B/8 outside the check position is
// kept both ways. Whatever survives the VIN grammar is a candidate.
//
// A line with a 17-character token (the VIN next to a "VIN:" label) is
// corrected token by token. Sliding windows are the fallback for text where
// the VIN ran into its neighbours.

use std::collections::BTreeSet;

use tracing::trace;
use vinscan_core::vin::{CHECK_DIGIT_INDEX, VIN_LENGTH, Vin, is_check_char, is_structurally_valid};

/// Barcode payloads of this length carry one leading padding character.
const PADDED_BARCODE_LENGTH: usize = VIN_LENGTH + 1;

/// Strip whitespace and punctuation, uppercase what is left.
pub fn clean(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Forbidden letters read as the digit they resemble.
fn forbidden_to_digit(c: char) -> char {
    match c {
        'O' | 'Q' => '0',
        'I' => '1',
        other => other,
    }
}

/// Letters that turn up where the check digit belongs.
fn check_numeral(c: char) -> char {
    match c {
        'O' | 'Q' | 'D' => '0',
        'I' | 'L' => '1',
        'Z' => '2',
        'A' => '4',
        'S' => '5',
        'G' => '6',
        'T' => '7',
        'B' => '8',
        other => other,
    }
}

/// All candidates for OCR output.
///
/// Returns an empty vector when nothing plausible survives; that is the
/// normal "no candidate this cycle" outcome, not an error.
pub fn correct_ocr_text(raw: &str) -> Vec<Vin> {
    let cleaned = clean(raw);

    if is_structurally_valid(&cleaned) {
        trace!(candidate = %cleaned, "Fast path");
        return Vin::parse(&cleaned).into_iter().collect();
    }
    if cleaned.len() < VIN_LENGTH {
        return Vec::new();
    }

    let mut candidates = BTreeSet::new();
    let tokens = vin_sized_tokens(raw);
    if tokens.is_empty() {
        let chars: Vec<char> = cleaned.chars().collect();
        for window in chars.windows(VIN_LENGTH) {
            insert_variants(window, &mut candidates);
        }
    } else {
        for token in &tokens {
            insert_variants(token, &mut candidates);
        }
    }
    trace!(input = %cleaned, tokens = tokens.len(), count = candidates.len(), "Corrected OCR text");
    candidates.into_iter().collect()
}

/// Candidates for a barcode payload: no variation, only padding removal.
pub fn correct_barcode_text(raw: &str) -> Vec<Vin> {
    let cleaned = clean(raw);
    let payload = if cleaned.len() == PADDED_BARCODE_LENGTH {
        &cleaned[1..]
    } else {
        cleaned.as_str()
    };
    Vin::parse(payload).into_iter().collect()
}

/// Cleaned runs of exactly 17 characters between whitespace or punctuation.
fn vin_sized_tokens(raw: &str) -> Vec<Vec<char>> {
    raw.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .map(|token| clean(token).chars().collect::<Vec<char>>())
        .filter(|token| token.len() == VIN_LENGTH)
        .collect()
}

/// A token that already reads as a VIN is kept unchanged; anything else goes
/// through substitution and B/8 expansion.
fn insert_variants(chars: &[char], candidates: &mut BTreeSet<Vin>) {
    let read: String = chars.iter().collect();
    if let Ok(vin) = Vin::parse(&read) {
        candidates.insert(vin);
        return;
    }
    for variant in expand(chars) {
        if let Ok(vin) = Vin::parse(&variant) {
            candidates.insert(vin);
        }
    }
}

/// Substitutions plus the full B/8 cartesian product over every non-check
/// position.
fn expand(chars: &[char]) -> Vec<String> {
    let mut base: Vec<char> = chars.iter().copied().map(forbidden_to_digit).collect();

    let check = base[CHECK_DIGIT_INDEX];
    if !is_check_char(check) {
        base[CHECK_DIGIT_INDEX] = check_numeral(check);
    }

    let ambiguous: Vec<usize> = base
        .iter()
        .enumerate()
        .filter(|&(i, &c)| i != CHECK_DIGIT_INDEX && (c == 'B' || c == '8'))
        .map(|(i, _)| i)
        .collect();

    let combinations = 1usize << ambiguous.len();
    let mut variants = Vec::with_capacity(combinations);
    for mask in 0..combinations {
        let mut chars = base.clone();
        for (bit, &pos) in ambiguous.iter().enumerate() {
            chars[pos] = if mask & (1 << bit) == 0 { 'B' } else { '8' };
        }
        variants.push(chars.into_iter().collect());
    }
    variants
}
