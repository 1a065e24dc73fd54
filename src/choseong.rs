// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Choseong projection and query normalization.
//!
//! The projection maps a string onto its leading consonants: 프론트엔드
//! becomes ㅍㄹㅌㅇㄷ. That five-character string is what the index stores
//! and what substring/prefix/exact matching runs against, which is the whole
//! trick behind search-as-you-type for Korean — a user who has typed ㅍㄹ is
//! two keystrokes into 프론트엔드 and already matches it.
//!
//! Non-Hangul handling is policy, not hard-coding: mixed collections (Korean
//! product names next to Latin ones) want `preserve_non_hangul = true` so a
//! Latin key projects to itself; pure-Korean collections can drop the noise.
//! Whitespace gets its own three-way policy because keys frequently carry
//! meaningful spaces ("서울 특별시") that `Contains` matching may or may not
//! care about.

use crate::jamo::{decompose, is_compat_consonant, CHOSEONG};

#[cfg(feature = "unicode-normalization")]
use unicode_normalization::UnicodeNormalization;

/// What to do with whitespace during projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhitespacePolicy {
    /// Preserve whitespace runs as-is (subject to `preserve_non_hangul`).
    Keep,
    /// Collapse runs to a single space; never emit a leading space.
    #[default]
    Normalize,
    /// Drop all whitespace.
    Remove,
}

/// Options controlling the choseong projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoseongOptions {
    /// Pass non-Hangul code points through instead of dropping them.
    pub preserve_non_hangul: bool,
    /// Whitespace handling policy.
    pub whitespace: WhitespacePolicy,
}

impl Default for ChoseongOptions {
    fn default() -> Self {
        Self {
            preserve_non_hangul: true,
            whitespace: WhitespacePolicy::Normalize,
        }
    }
}

/// Project a string onto its leading consonants.
///
/// Per code point, in order: a modern syllable contributes its initial jamo,
/// a compatibility consonant passes through, whitespace follows the policy,
/// and everything else is kept or dropped per `preserve_non_hangul`.
pub fn choseong(input: &str, options: &ChoseongOptions) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_was_whitespace = false;

    for c in input.chars() {
        if let Some((l, _, _)) = decompose(c) {
            out.push(CHOSEONG[l]);
            prev_was_whitespace = false;
        } else if is_compat_consonant(c) {
            out.push(c);
            prev_was_whitespace = false;
        } else if c.is_whitespace() {
            match options.whitespace {
                WhitespacePolicy::Keep => {
                    if options.preserve_non_hangul {
                        out.push(c);
                    }
                    prev_was_whitespace = true;
                }
                WhitespacePolicy::Normalize => {
                    if !out.is_empty() && !prev_was_whitespace {
                        out.push(' ');
                        prev_was_whitespace = true;
                    }
                }
                WhitespacePolicy::Remove => {}
            }
        } else if options.preserve_non_hangul {
            out.push(c);
            prev_was_whitespace = false;
        }
    }

    out
}

/// Canonical form used for all matching: NFC composition plus lowercase.
///
/// Decomposed Hangul (the macOS filename kind) composes back to precomposed
/// syllables here, so 한글 typed either way compares equal.
#[cfg(feature = "unicode-normalization")]
pub fn normalized_search_token(s: &str) -> String {
    s.nfc().collect::<String>().to_lowercase()
}

/// Lowercase-only fallback when the `unicode-normalization` feature is off.
/// Callers must feed pre-composed Hangul.
#[cfg(not(feature = "unicode-normalization"))]
pub fn normalized_search_token(s: &str) -> String {
    s.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(preserve: bool, ws: WhitespacePolicy) -> ChoseongOptions {
        ChoseongOptions {
            preserve_non_hangul: preserve,
            whitespace: ws,
        }
    }

    #[test]
    fn projects_syllables_to_initials() {
        assert_eq!(choseong("프론트엔드", &ChoseongOptions::default()), "ㅍㄹㅌㅇㄷ");
        assert_eq!(choseong("검색", &ChoseongOptions::default()), "ㄱㅅ");
    }

    #[test]
    fn compat_consonants_pass_through() {
        assert_eq!(choseong("ㅍㄹㅌ", &ChoseongOptions::default()), "ㅍㄹㅌ");
    }

    #[test]
    fn non_hangul_follows_preserve_flag() {
        assert_eq!(choseong("a검b", &opts(true, WhitespacePolicy::Keep)), "aㄱb");
        assert_eq!(choseong("a검b", &opts(false, WhitespacePolicy::Keep)), "ㄱ");
    }

    #[test]
    fn keep_preserves_whitespace_runs() {
        assert_eq!(
            choseong("서울  시", &opts(true, WhitespacePolicy::Keep)),
            "ㅅㅇ  ㅅ"
        );
        // keep + drop-non-hangul also drops the spaces
        assert_eq!(choseong("서울  시", &opts(false, WhitespacePolicy::Keep)), "ㅅㅇㅅ");
    }

    #[test]
    fn normalize_collapses_and_never_leads() {
        assert_eq!(
            choseong("  서울   시", &opts(true, WhitespacePolicy::Normalize)),
            "ㅅㅇ ㅅ"
        );
    }

    #[test]
    fn remove_strips_all_whitespace() {
        assert_eq!(
            choseong(" 서울 시 ", &opts(true, WhitespacePolicy::Remove)),
            "ㅅㅇㅅ"
        );
    }

    #[test]
    fn empty_input_is_empty() {
        assert_eq!(choseong("", &ChoseongOptions::default()), "");
    }

    #[cfg(feature = "unicode-normalization")]
    #[test]
    fn normalization_composes_decomposed_hangul() {
        // 한 typed as conjoining jamo (U+1112 U+1161 U+11AB)
        let decomposed = "\u{1112}\u{1161}\u{11AB}";
        assert_eq!(normalized_search_token(decomposed), "한");
    }

    #[test]
    fn normalization_lowercases() {
        assert_eq!(normalized_search_token("Search검색"), "search검색");
    }
}
