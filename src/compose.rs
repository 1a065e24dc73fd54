// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The streaming syllable assembler.
//!
//! Takes a flat jamo token stream and folds it back into precomposed
//! syllables the way a dubeolsik keyboard driver would: a consonant opens a
//! syllable, a vowel fills it, a trailing consonant tentatively becomes the
//! final — and gets stolen back as the next syllable's initial if another
//! vowel arrives. Compound vowels (ㅗ + ㅏ → ㅘ) and compound finals
//! (ㄱ + ㅅ → ㄳ) merge as they stream in.
//!
//! The stolen-final rule is the subtle one. After ㄱㅏㄴ the pending syllable
//! is 간; if ㅣ arrives next, ㄴ moves over and the output becomes 가 + 니.
//! With a compound final the pair splits: 갅 + ㅣ keeps ㄴ and moves ㅈ.
//! Every second component of a compound final is a legal initial, so the
//! split can't fail.
//!
//! `assemble` inverts [`crate::jamo::disassemble`] exactly: tokens that came
//! from real syllables recompose to the same syllables, and non-Hangul
//! tokens pass straight through.

use crate::jamo::{
    choseong_index, is_compat_consonant, is_compat_vowel, jongseong_index, jungseong_index,
    merge_finals, merge_vowels, split_final,
};
use std::fmt;

/// Error from the strict assembly path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyllableError {
    /// A token was neither a known jamo nor composable into a syllable.
    InvalidComponents { token: char },
}

impl fmt::Display for SyllableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyllableError::InvalidComponents { token } => {
                write!(f, "unrecognized jamo token {token:?}")
            }
        }
    }
}

impl std::error::Error for SyllableError {}

/// Incremental jamo-to-syllable composer.
///
/// Push tokens one at a time; call [`Assembler::finish`] to flush the
/// pending syllable and take the output.
#[derive(Debug, Default)]
pub struct Assembler {
    lead: Option<char>,
    vowel: Option<char>,
    tail: Option<char>,
    out: String,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flush the pending syllable (or bare jamo) into the output.
    fn flush(&mut self) {
        match (self.lead.take(), self.vowel.take(), self.tail.take()) {
            (Some(l), Some(v), t) => {
                let li = choseong_index(l);
                let vi = jungseong_index(v);
                let ti = t.and_then(jongseong_index).unwrap_or(0);
                match li.zip(vi).and_then(|(li, vi)| crate::jamo::compose(li, vi, ti)) {
                    Some(s) => self.out.push(s),
                    None => {
                        // Composition cannot actually fail for jamo that got
                        // this far, but degrade to the raw tokens rather than
                        // dropping input.
                        self.out.push(l);
                        self.out.push(v);
                        if let Some(t) = t {
                            self.out.push(t);
                        }
                    }
                }
            }
            (Some(l), None, _) => self.out.push(l),
            (None, Some(v), _) => self.out.push(v),
            (None, None, _) => {}
        }
    }

    fn push_consonant(&mut self, c: char) {
        match (self.lead, self.vowel, self.tail) {
            // Open syllable gets a tentative final.
            (Some(_), Some(_), None) if jongseong_index(c).is_some() => self.tail = Some(c),
            // Existing final may merge into a compound final.
            (Some(_), Some(_), Some(t)) if merge_finals(t, c).is_some() => {
                self.tail = merge_finals(t, c);
            }
            _ => {
                self.flush();
                if choseong_index(c).is_some() {
                    self.lead = Some(c);
                } else {
                    // A consonant that cannot begin a syllable (e.g. ㄳ typed
                    // directly) stands alone.
                    self.out.push(c);
                }
            }
        }
    }

    fn push_vowel(&mut self, c: char) {
        match (self.lead, self.vowel, self.tail) {
            // Steal the final back as the next syllable's initial.
            (Some(_), Some(_), Some(t)) => {
                let new_lead = match split_final(t) {
                    Some((keep, steal)) => {
                        self.tail = Some(keep);
                        steal
                    }
                    None => {
                        self.tail = None;
                        t
                    }
                };
                self.flush();
                self.lead = Some(new_lead);
                self.vowel = Some(c);
            }
            // Existing vowel may merge into a compound vowel.
            (Some(_), Some(v), None) => match merge_vowels(v, c) {
                Some(merged) => self.vowel = Some(merged),
                None => {
                    self.flush();
                    self.out.push(c);
                }
            },
            (Some(_), None, _) => self.vowel = Some(c),
            // A vowel with nothing to attach to stands alone.
            (None, _, _) => {
                self.flush();
                self.out.push(c);
            }
        }
    }

    /// Feed one token into the automaton.
    pub fn push(&mut self, c: char) {
        if is_compat_consonant(c) {
            self.push_consonant(c);
        } else if is_compat_vowel(c) {
            self.push_vowel(c);
        } else {
            self.flush();
            self.out.push(c);
        }
    }

    /// Flush and return everything assembled so far.
    pub fn finish(mut self) -> String {
        self.flush();
        self.out
    }
}

/// Assemble a jamo token stream into a string, passing unknown tokens through.
pub fn assemble(tokens: &[char]) -> String {
    let mut asm = Assembler::new();
    for &c in tokens {
        asm.push(c);
    }
    asm.finish()
}

/// Assemble, rejecting any token that is not a compatibility jamo.
pub fn assemble_strict(tokens: &[char]) -> Result<String, SyllableError> {
    if let Some(&bad) = tokens
        .iter()
        .find(|&&c| !is_compat_consonant(c) && !is_compat_vowel(c))
    {
        return Err(SyllableError::InvalidComponents { token: bad });
    }
    Ok(assemble(tokens))
}
