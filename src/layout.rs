// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Dubeolsik keyboard layout: Korean↔QWERTY conversion and key geometry.
//!
//! Two failure modes this module exists to absorb:
//!
//! 1. **Wrong keyboard mode.** The user wanted 프론트엔드 but their IME was
//!    in Latin mode, so the query arrived as `vmfhsxmdpsem`. Mapping each
//!    key to its jamo and running the assembler recovers the intended
//!    Hangul. The reverse slip (Hangul mode, Latin intent: ㄴㄷㅁㄱ초 for
//!    `search`) inverts the same table.
//! 2. **Fat fingers.** 검색 typed as 검삭 is an ㅐ→ㅏ slip, and on the
//!    physical keyboard those are the adjacent keys `o` and `k`… well,
//!    nearly adjacent — which is exactly what the keyboard-distance score
//!    measures. Each key gets an (x, y) position from a fixed staggered
//!    QWERTY grid, and substitution cost grows with Manhattan distance.
//!
//! Tense consonants live on the shifted row (Q→ㅃ, W→ㅉ, E→ㄸ, R→ㄲ, T→ㅆ),
//! as do ㅒ (O) and ㅖ (P). Compound vowels and finals have no key of their
//! own; they convert to the key sequence of their components (ㅘ → `hk`).

use crate::compose::Assembler;
use crate::jamo::disassemble;

// =============================================================================
// KEY TABLES
// =============================================================================

/// Latin key → jamo, dubeolsik standard.
const KEY_TO_JAMO: [(char, char); 33] = [
    ('q', 'ㅂ'),
    ('w', 'ㅈ'),
    ('e', 'ㄷ'),
    ('r', 'ㄱ'),
    ('t', 'ㅅ'),
    ('y', 'ㅛ'),
    ('u', 'ㅕ'),
    ('i', 'ㅑ'),
    ('o', 'ㅐ'),
    ('p', 'ㅔ'),
    ('a', 'ㅁ'),
    ('s', 'ㄴ'),
    ('d', 'ㅇ'),
    ('f', 'ㄹ'),
    ('g', 'ㅎ'),
    ('h', 'ㅗ'),
    ('j', 'ㅓ'),
    ('k', 'ㅏ'),
    ('l', 'ㅣ'),
    ('z', 'ㅋ'),
    ('x', 'ㅌ'),
    ('c', 'ㅊ'),
    ('v', 'ㅍ'),
    ('b', 'ㅠ'),
    ('n', 'ㅜ'),
    ('m', 'ㅡ'),
    ('Q', 'ㅃ'),
    ('W', 'ㅉ'),
    ('E', 'ㄸ'),
    ('R', 'ㄲ'),
    ('T', 'ㅆ'),
    ('O', 'ㅒ'),
    ('P', 'ㅖ'),
];

/// Jamo → Latin key sequence. Compounds write both component keys.
const JAMO_TO_KEYS: [(char, &str); 51] = [
    ('ㅂ', "q"),
    ('ㅈ', "w"),
    ('ㄷ', "e"),
    ('ㄱ', "r"),
    ('ㅅ', "t"),
    ('ㅛ', "y"),
    ('ㅕ', "u"),
    ('ㅑ', "i"),
    ('ㅐ', "o"),
    ('ㅔ', "p"),
    ('ㅁ', "a"),
    ('ㄴ', "s"),
    ('ㅇ', "d"),
    ('ㄹ', "f"),
    ('ㅎ', "g"),
    ('ㅗ', "h"),
    ('ㅓ', "j"),
    ('ㅏ', "k"),
    ('ㅣ', "l"),
    ('ㅋ', "z"),
    ('ㅌ', "x"),
    ('ㅊ', "c"),
    ('ㅍ', "v"),
    ('ㅠ', "b"),
    ('ㅜ', "n"),
    ('ㅡ', "m"),
    ('ㅃ', "Q"),
    ('ㅉ', "W"),
    ('ㄸ', "E"),
    ('ㄲ', "R"),
    ('ㅆ', "T"),
    ('ㅒ', "O"),
    ('ㅖ', "P"),
    // Compound vowels
    ('ㅘ', "hk"),
    ('ㅙ', "ho"),
    ('ㅚ', "hl"),
    ('ㅝ', "nj"),
    ('ㅞ', "np"),
    ('ㅟ', "nl"),
    ('ㅢ', "ml"),
    // Compound finals
    ('ㄳ', "rt"),
    ('ㄵ', "sw"),
    ('ㄶ', "sg"),
    ('ㄺ', "fr"),
    ('ㄻ', "fa"),
    ('ㄼ', "fq"),
    ('ㄽ', "ft"),
    ('ㄾ', "fx"),
    ('ㄿ', "fv"),
    ('ㅀ', "fg"),
    ('ㅄ', "qt"),
];

fn key_to_jamo(key: char) -> Option<char> {
    KEY_TO_JAMO
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, j)| *j)
}

fn jamo_to_keys(jamo: char) -> Option<&'static str> {
    JAMO_TO_KEYS
        .iter()
        .find(|(j, _)| *j == jamo)
        .map(|(_, k)| *k)
}

// =============================================================================
// CONVERSION
// =============================================================================

/// Reinterpret Latin input as dubeolsik keystrokes and assemble syllables.
///
/// `vmfhsxmdpsem` → 프론트엔드. Shifted letters without a tense meaning
/// fall back to their unshifted jamo; characters off the layout entirely
/// pass through unchanged (flushing the pending syllable first).
pub fn qwerty_to_hangul(input: &str) -> String {
    let mut asm = Assembler::new();
    for c in input.chars() {
        let jamo = key_to_jamo(c)
            .or_else(|| key_to_jamo(c.to_ascii_lowercase()));
        match jamo {
            Some(j) => asm.push(j),
            None => asm.push(c),
        }
    }
    asm.finish()
}

/// Write each jamo of the input to its Latin key.
///
/// Syllables decompose with compounds kept whole (a compound still writes
/// the two keys that would have typed it). Tokens with no key — punctuation,
/// Latin text, anything non-jamo — are preserved as-is.
pub fn hangul_to_qwerty(input: &str) -> String {
    let mut out = String::with_capacity(input.len() * 2);
    for token in disassemble(input) {
        match jamo_to_keys(token) {
            Some(keys) => out.push_str(keys),
            None => out.push(token),
        }
    }
    out
}

// =============================================================================
// KEY GEOMETRY
// =============================================================================

/// Physical key rows with their horizontal stagger offsets.
const ROWS: [(&str, f64); 4] = [
    ("1234567890", 0.0),
    ("qwertyuiop", 0.2),
    ("asdfghjkl", 0.6),
    ("zxcvbnm", 1.1),
];

/// (x, y) of a key on the staggered grid, or `None` if it isn't on it.
pub fn key_position(key: char) -> Option<(f64, f64)> {
    let key = key.to_ascii_lowercase();
    for (y, (row, offset)) in ROWS.iter().enumerate() {
        if let Some(x) = row.chars().position(|c| c == key) {
            return Some((x as f64 + offset, y as f64));
        }
    }
    None
}

/// Substitution cost between two keys for the keyboard-weighted edit
/// distance: 0 for the same key, 0.35 within Manhattan distance 1, 0.65
/// within 2, and the full unit cost beyond that or off the grid.
pub fn substitution_cost(a: char, b: char) -> f64 {
    if a == b {
        return 0.0;
    }
    match (key_position(a), key_position(b)) {
        (Some((ax, ay)), Some((bx, by))) => {
            let d = (ax - bx).abs() + (ay - by).abs();
            if d <= 1.0 {
                0.35
            } else if d <= 2.0 {
                0.65
            } else {
                1.0
            }
        }
        _ => 1.0,
    }
}

/// Is this character a key the geometry knows about?
pub fn on_keyboard(key: char) -> bool {
    key_position(key).is_some()
}
