// Built-in phonologies. Pronunciations are broad IPA; length marks and
// optional segments are left in and removed by normalisation.

use crate::phonology::PhonologyTable;

/// Letters of the Finnish alphabet, loan letters included.
pub const FINNISH_ALPHABET: &[&str] = &[
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r",
    "s", "t", "u", "v", "w", "x", "y", "z", "å", "ä", "ö",
];

const FINNISH_VOWELS: &[(&str, &[&str])] = &[
    ("a", &["ɑ"]),
    ("ä", &["æ"]),
    ("e", &["e"]),
    ("i", &["i"]),
    ("o", &["o"]),
    ("ö", &["ø"]),
    ("u", &["u"]),
    ("y", &["y"]),
    ("å", &["o"]),
];

// Loan letters get their native approximations as well.
const FINNISH_CONSONANTS: &[(&str, &[&str])] = &[
    ("b", &["b", "p"]),
    ("c", &["k"]),
    ("d", &["d"]),
    ("f", &["f", "v"]),
    ("g", &["k", "ɡ"]),
    ("h", &["ç", "h", "ɦ", "x"]),
    ("j", &["j"]),
    ("k", &["k"]),
    ("l", &["l"]),
    ("m", &["m"]),
    ("n", &["n", "m"]),
    ("p", &["p"]),
    ("r", &["r"]),
    ("s", &["s"]),
    ("t", &["t"]),
    ("v", &["ʋ"]),
    ("w", &["w", "v"]),
    ("x", &["ks", "k", "x"]),
    ("ng", &["ŋ"]),
];

const ENGLISH_VOWELS: &[(&str, &[&str])] = &[
    ("a", &["æ", "ɑː", "eɪ", "ə"]),
    ("o", &["ɒ", "ɔː"]),
    ("i", &["ɪ", "aɪ"]),
    ("ee", &["iː"]),
    ("e", &["e", "ɛ"]),
    ("u", &["ʌ"]),
    ("oo", &["ʊ", "uː"]),
    ("oi", &["ɔɪ"]),
    ("oa", &["əʊ", "oʊ"]),
    ("ou", &["aʊ"]),
    ("ur", &["ɜː", "ɜːr"]),
    ("ar", &["ɑː", "ɑːr"]),
    ("or", &["ɔː", "ɔːr", "oʊr"]),
    ("ear", &["ɪə(r)", "ɪr"]),
    ("are", &["eə(r)", "ɛr"]),
    ("ure", &["ʊə(r)", "ʊr"]),
    ("er", &["ə(r)", "ər"]),
    ("y", &["i"]),
    ("igh", &["aɪ"]),
];

/// English consonant letters pronounced as themselves.
const ENGLISH_IDENTITY_CONSONANTS: &[&str] =
    &["b", "d", "k", "p", "t", "v", "z", "m", "n", "w", "r", "l"];

const ENGLISH_CONSONANTS: &[(&str, &[&str])] = &[
    ("c", &["k"]),
    ("ch", &["ʧ", "c", "x"]),
    ("f", &["f"]),
    ("th", &["θ", "ð"]),
    ("g", &["ɡ", "dʒ"]),
    ("j", &["dʒ"]),
    ("y", &["j"]),
    ("gh", &["x"]),
    ("s", &["s"]),
    ("ti", &["ʃ"]),
    ("h", &["h"]),
    ("si", &["ʒ"]),
    ("ng", &["ŋ"]),
];

fn table(entries: &[(&str, &[&str])]) -> PhonologyTable {
    PhonologyTable::from_pairs(entries.iter().copied())
}

/// Finnish spelling to pronunciation.
pub fn finnish() -> PhonologyTable {
    table(FINNISH_CONSONANTS).merge(&table(FINNISH_VOWELS))
}

/// English spelling to pronunciation, covering the common vowel spellings
/// and single or digraph consonants.
pub fn english() -> PhonologyTable {
    let mut consonants = table(ENGLISH_CONSONANTS);
    for &c in ENGLISH_IDENTITY_CONSONANTS {
        consonants.insert(c, crate::Pronunciation::new(c));
    }
    consonants.merge(&table(ENGLISH_VOWELS))
}
