// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Jamo tables and the Hangul syllable codec.
//!
//! Everything above this module — choseong projection, layout conversion,
//! jamo edit distance — reduces to the same primitive: mapping a precomposed
//! syllable in `[U+AC00, U+D7A3]` to its (initial, medial, final) index
//! triple and back. The mapping is pure arithmetic:
//!
//! ```text
//! S = 0xAC00 + (L · 21 · 28) + (V · 28) + T
//! ```
//!
//! with `L ∈ [0, 19)`, `V ∈ [0, 21)`, `T ∈ [0, 28)` (T = 0 means no final).
//! No lookup table is involved in the codec itself; the tables in this module
//! only translate indices to their compatibility-jamo characters and record
//! which jamo are compounds of two simpler ones (ㅘ = ㅗ + ㅏ, ㄳ = ㄱ + ㅅ).
//!
//! # Invariants
//!
//! - `decompose`/`compose` are total and bijective on the modern syllable
//!   block. `compose(decompose(s)) == s` for every syllable, and
//!   `decompose(compose(l, v, t)) == (l, v, t)` for every in-range triple.
//! - Compound decomposition/composition is a bijection on the declared pairs.

/// First code point of the modern Hangul syllable block (가).
pub const SYLLABLE_BASE: u32 = 0xAC00;

/// Last code point of the modern Hangul syllable block (힣).
pub const SYLLABLE_LAST: u32 = 0xD7A3;

const JUNGSEONG_COUNT: u32 = 21;
const JONGSEONG_COUNT: u32 = 28;

/// The 19 initial consonants (choseong), in L-index order.
pub const CHOSEONG: [char; 19] = [
    'ㄱ', 'ㄲ', 'ㄴ', 'ㄷ', 'ㄸ', 'ㄹ', 'ㅁ', 'ㅂ', 'ㅃ', 'ㅅ', 'ㅆ', 'ㅇ', 'ㅈ', 'ㅉ', 'ㅊ',
    'ㅋ', 'ㅌ', 'ㅍ', 'ㅎ',
];

/// The 21 medial vowels (jungseong), in V-index order.
pub const JUNGSEONG: [char; 21] = [
    'ㅏ', 'ㅐ', 'ㅑ', 'ㅒ', 'ㅓ', 'ㅔ', 'ㅕ', 'ㅖ', 'ㅗ', 'ㅘ', 'ㅙ', 'ㅚ', 'ㅛ', 'ㅜ', 'ㅝ',
    'ㅞ', 'ㅟ', 'ㅠ', 'ㅡ', 'ㅢ', 'ㅣ',
];

/// The 27 final consonants (jongseong), in T-index order starting at 1.
/// T = 0 is the absent final and has no character.
pub const JONGSEONG: [char; 27] = [
    'ㄱ', 'ㄲ', 'ㄳ', 'ㄴ', 'ㄵ', 'ㄶ', 'ㄷ', 'ㄹ', 'ㄺ', 'ㄻ', 'ㄼ', 'ㄽ', 'ㄾ', 'ㄿ', 'ㅀ',
    'ㅁ', 'ㅂ', 'ㅄ', 'ㅅ', 'ㅆ', 'ㅇ', 'ㅈ', 'ㅊ', 'ㅋ', 'ㅌ', 'ㅍ', 'ㅎ',
];

/// Compound vowels and their component pairs.
pub const COMPOUND_VOWELS: [(char, (char, char)); 7] = [
    ('ㅘ', ('ㅗ', 'ㅏ')),
    ('ㅙ', ('ㅗ', 'ㅐ')),
    ('ㅚ', ('ㅗ', 'ㅣ')),
    ('ㅝ', ('ㅜ', 'ㅓ')),
    ('ㅞ', ('ㅜ', 'ㅔ')),
    ('ㅟ', ('ㅜ', 'ㅣ')),
    ('ㅢ', ('ㅡ', 'ㅣ')),
];

/// Compound finals and their component pairs.
pub const COMPOUND_FINALS: [(char, (char, char)); 11] = [
    ('ㄳ', ('ㄱ', 'ㅅ')),
    ('ㄵ', ('ㄴ', 'ㅈ')),
    ('ㄶ', ('ㄴ', 'ㅎ')),
    ('ㄺ', ('ㄹ', 'ㄱ')),
    ('ㄻ', ('ㄹ', 'ㅁ')),
    ('ㄼ', ('ㄹ', 'ㅂ')),
    ('ㄽ', ('ㄹ', 'ㅅ')),
    ('ㄾ', ('ㄹ', 'ㅌ')),
    ('ㄿ', ('ㄹ', 'ㅍ')),
    ('ㅀ', ('ㄹ', 'ㅎ')),
    ('ㅄ', ('ㅂ', 'ㅅ')),
];

// =============================================================================
// CODEC
// =============================================================================

/// Is this a precomposed syllable in the modern Hangul block?
#[inline]
pub fn is_syllable(c: char) -> bool {
    (SYLLABLE_BASE..=SYLLABLE_LAST).contains(&(c as u32))
}

/// Is this a compatibility-jamo consonant (ㄱ–ㅎ, including compounds)?
#[inline]
pub fn is_compat_consonant(c: char) -> bool {
    ('\u{3131}'..='\u{314E}').contains(&c)
}

/// Is this a compatibility-jamo vowel (ㅏ–ㅣ)?
#[inline]
pub fn is_compat_vowel(c: char) -> bool {
    ('\u{314F}'..='\u{3163}').contains(&c)
}

/// Decompose a syllable into its (L, V, T) index triple.
///
/// Returns `None` for anything outside `[U+AC00, U+D7A3]`.
#[inline]
pub fn decompose(c: char) -> Option<(usize, usize, usize)> {
    let cp = c as u32;
    if !(SYLLABLE_BASE..=SYLLABLE_LAST).contains(&cp) {
        return None;
    }
    let idx = cp - SYLLABLE_BASE;
    let l = idx / (JUNGSEONG_COUNT * JONGSEONG_COUNT);
    let v = (idx % (JUNGSEONG_COUNT * JONGSEONG_COUNT)) / JONGSEONG_COUNT;
    let t = idx % JONGSEONG_COUNT;
    Some((l as usize, v as usize, t as usize))
}

/// Compose an (L, V, T) index triple into a syllable.
///
/// Returns `None` when any index is outside its declared range.
#[inline]
pub fn compose(l: usize, v: usize, t: usize) -> Option<char> {
    if l >= CHOSEONG.len() || v >= JUNGSEONG.len() || t >= JONGSEONG_COUNT as usize {
        return None;
    }
    let cp = SYLLABLE_BASE
        + (l as u32) * JUNGSEONG_COUNT * JONGSEONG_COUNT
        + (v as u32) * JONGSEONG_COUNT
        + t as u32;
    char::from_u32(cp)
}

// =============================================================================
// INDEX LOOKUPS
// =============================================================================

/// L-index of a compatibility consonant, if it can begin a syllable.
///
/// Compound finals like ㄳ cannot; they return `None`.
pub fn choseong_index(c: char) -> Option<usize> {
    CHOSEONG.iter().position(|&j| j == c)
}

/// V-index of a compatibility vowel.
pub fn jungseong_index(c: char) -> Option<usize> {
    JUNGSEONG.iter().position(|&j| j == c)
}

/// T-index (1..=27) of a compatibility consonant, if it can end a syllable.
///
/// ㄸ, ㅃ, ㅉ cannot; they return `None`.
pub fn jongseong_index(c: char) -> Option<usize> {
    JONGSEONG.iter().position(|&j| j == c).map(|i| i + 1)
}

/// The compatibility character for a T-index, or `None` for T = 0.
pub fn jongseong_char(t: usize) -> Option<char> {
    if t == 0 {
        None
    } else {
        JONGSEONG.get(t - 1).copied()
    }
}

// =============================================================================
// COMPOUNDS
// =============================================================================

/// Split a compound vowel into its two components.
pub fn split_vowel(c: char) -> Option<(char, char)> {
    COMPOUND_VOWELS
        .iter()
        .find(|(compound, _)| *compound == c)
        .map(|(_, parts)| *parts)
}

/// Merge two vowels into their compound, if one exists.
pub fn merge_vowels(a: char, b: char) -> Option<char> {
    COMPOUND_VOWELS
        .iter()
        .find(|(_, parts)| *parts == (a, b))
        .map(|(compound, _)| *compound)
}

/// Split a compound final into its two components.
pub fn split_final(c: char) -> Option<(char, char)> {
    COMPOUND_FINALS
        .iter()
        .find(|(compound, _)| *compound == c)
        .map(|(_, parts)| *parts)
}

/// Merge two consonants into their compound final, if one exists.
pub fn merge_finals(a: char, b: char) -> Option<char> {
    COMPOUND_FINALS
        .iter()
        .find(|(_, parts)| *parts == (a, b))
        .map(|(compound, _)| *compound)
}

// =============================================================================
// STREAM DECOMPOSITION
// =============================================================================

/// Decompose a string into a flat jamo token stream.
///
/// Syllables expand to their L, V, and (when present) T compatibility
/// characters. Compound vowels and finals are kept whole — ㅘ stays ㅘ —
/// which is what the QWERTY writer wants, since a compound maps to the key
/// sequence of its components anyway. Non-Hangul code points pass through
/// unchanged.
pub fn disassemble(s: &str) -> Vec<char> {
    let mut out = Vec::with_capacity(s.len());
    for c in s.chars() {
        match decompose(c) {
            Some((l, v, t)) => {
                out.push(CHOSEONG[l]);
                out.push(JUNGSEONG[v]);
                if let Some(tc) = jongseong_char(t) {
                    out.push(tc);
                }
            }
            None => out.push(c),
        }
    }
    out
}

/// Decompose a string into fully atomic jamo, discarding non-Hangul.
///
/// Compound vowels and finals split into their components (ㅘ → ㅗ, ㅏ), and
/// standalone compatibility jamo are kept (split when compound). This is the
/// alphabet the jamo edit distance operates on; anything that is not Hangul
/// contributes nothing there.
pub fn disassemble_atomic(s: &str) -> Vec<char> {
    let mut out = Vec::with_capacity(s.len());
    let mut push = |c: char| {
        if let Some((a, b)) = split_vowel(c).or_else(|| split_final(c)) {
            out.push(a);
            out.push(b);
        } else {
            out.push(c);
        }
    };
    for c in s.chars() {
        match decompose(c) {
            Some((l, v, t)) => {
                push(CHOSEONG[l]);
                push(JUNGSEONG[v]);
                if let Some(tc) = jongseong_char(t) {
                    push(tc);
                }
            }
            None if is_compat_consonant(c) || is_compat_vowel(c) => push(c),
            None => {}
        }
    }
    out
}
