//! Codec laws: the syllable codec and the assembler invert each other.

use geomsaek::{assemble, compose, decompose, disassemble};
use proptest::prelude::*;

/// An arbitrary modern Hangul syllable.
fn syllable() -> impl Strategy<Value = char> {
    (0xAC00u32..=0xD7A3).prop_map(|cp| char::from_u32(cp).unwrap())
}

/// Strings mixing syllables with arbitrary non-jamo code points.
fn mixed_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            4 => syllable(),
            1 => prop_oneof![
                prop::char::range('a', 'z'),
                prop::char::range('0', '9'),
                Just(' '),
                Just('!'),
            ],
        ],
        0..24,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

proptest! {
    #[test]
    fn compose_inverts_decompose(c in syllable()) {
        let (l, v, t) = decompose(c).unwrap();
        prop_assert_eq!(compose(l, v, t), Some(c));
    }

    #[test]
    fn decompose_inverts_compose(l in 0usize..19, v in 0usize..21, t in 0usize..28) {
        let c = compose(l, v, t).unwrap();
        prop_assert_eq!(decompose(c), Some((l, v, t)));
    }

    #[test]
    fn decompose_indices_stay_in_range(c in syllable()) {
        let (l, v, t) = decompose(c).unwrap();
        prop_assert!(l < 19 && v < 21 && t < 28);
    }

    #[test]
    fn assemble_inverts_disassemble(s in mixed_text()) {
        prop_assert_eq!(assemble(&disassemble(&s)), s);
    }

    #[test]
    fn compose_rejects_out_of_range(l in 19usize..64, v in 21usize..64, t in 28usize..64) {
        prop_assert_eq!(compose(l, 0, 0), None);
        prop_assert_eq!(compose(0, v, 0), None);
        prop_assert_eq!(compose(0, 0, t), None);
    }
}
