//! Choseong extractor laws under every whitespace policy.

use geomsaek::{choseong, decompose, ChoseongOptions, WhitespacePolicy};
use proptest::prelude::*;

fn syllable() -> impl Strategy<Value = char> {
    (0xAC00u32..=0xD7A3).prop_map(|cp| char::from_u32(cp).unwrap())
}

fn hangul_word() -> impl Strategy<Value = String> {
    prop::collection::vec(syllable(), 1..8).prop_map(|cs| cs.into_iter().collect())
}

const CHOSEONG_TABLE: [char; 19] = [
    'ㄱ', 'ㄲ', 'ㄴ', 'ㄷ', 'ㄸ', 'ㄹ', 'ㅁ', 'ㅂ', 'ㅃ', 'ㅅ', 'ㅆ', 'ㅇ', 'ㅈ', 'ㅉ', 'ㅊ',
    'ㅋ', 'ㅌ', 'ㅍ', 'ㅎ',
];

proptest! {
    #[test]
    fn single_syllable_projects_to_its_initial(c in syllable()) {
        let projected = choseong(&c.to_string(), &ChoseongOptions::default());
        let (l, _, _) = decompose(c).unwrap();
        prop_assert_eq!(projected, CHOSEONG_TABLE[l].to_string());
    }

    #[test]
    fn projection_length_matches_syllable_count(word in hangul_word()) {
        let projected = choseong(&word, &ChoseongOptions::default());
        prop_assert_eq!(projected.chars().count(), word.chars().count());
        // Every projected character is an initial consonant.
        for c in projected.chars() {
            prop_assert!(CHOSEONG_TABLE.contains(&c));
        }
    }

    #[test]
    fn keep_preserves_whitespace_runs(a in hangul_word(), b in hangul_word(), spaces in 1usize..4) {
        let input = format!("{a}{}{b}", " ".repeat(spaces));
        let opts = ChoseongOptions { whitespace: WhitespacePolicy::Keep, ..Default::default() };
        let projected = choseong(&input, &opts);
        let run: String = " ".repeat(spaces);
        prop_assert!(projected.contains(&run));
    }

    #[test]
    fn normalize_collapses_and_never_leads(a in hangul_word(), b in hangul_word(), spaces in 1usize..4) {
        let input = format!("  {a}{}{b}", " ".repeat(spaces));
        let opts = ChoseongOptions { whitespace: WhitespacePolicy::Normalize, ..Default::default() };
        let projected = choseong(&input, &opts);
        prop_assert!(!projected.starts_with(' '));
        prop_assert!(!projected.contains("  "));
        prop_assert_eq!(projected.chars().filter(|&c| c == ' ').count(), 1);
    }

    #[test]
    fn remove_strips_all_whitespace(a in hangul_word(), b in hangul_word(), spaces in 0usize..4) {
        let input = format!(" {a}{}{b} ", " ".repeat(spaces));
        let opts = ChoseongOptions { whitespace: WhitespacePolicy::Remove, ..Default::default() };
        let projected = choseong(&input, &opts);
        prop_assert!(!projected.contains(' '));
    }

    #[test]
    fn drop_non_hangul_leaves_only_jamo(word in hangul_word(), noise in "[a-z0-9!?.]{0,6}") {
        let input = format!("{noise}{word}{noise}");
        let opts = ChoseongOptions { preserve_non_hangul: false, ..Default::default() };
        let projected = choseong(&input, &opts);
        for c in projected.chars() {
            prop_assert!(CHOSEONG_TABLE.contains(&c));
        }
    }
}
