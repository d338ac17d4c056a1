// Feature-based substitution distances between symbols.

use hashbrown::HashMap;

/// Substitution distance between two symbols, by name.
///
/// `None` means the pair is unrelated and gets no substitution transition.
/// `Some(d)` must be finite and non-negative; distinct symbols must not be at
/// distance 0.
pub trait SymbolDistance: Sync {
    fn distance(&self, a: &str, b: &str) -> Option<f64>;
}

impl<F> SymbolDistance for F
where
    F: Fn(&str, &str) -> Option<f64> + Sync,
{
    fn distance(&self, a: &str, b: &str) -> Option<f64> {
        self(a, b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backness {
    Front,
    Central,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Place {
    Bilabial,
    Labiodental,
    Dental,
    Alveolar,
    Postalveolar,
    Palatal,
    Labiovelar,
    Velar,
    Glottal,
}

impl Place {
    /// Position on the front-to-back scale. Neighbouring places share a
    /// position.
    fn position(self) -> f64 {
        match self {
            Place::Bilabial | Place::Labiodental => 1.0,
            Place::Dental | Place::Alveolar => 2.0,
            Place::Postalveolar | Place::Palatal => 3.0,
            Place::Labiovelar | Place::Velar => 4.0,
            Place::Glottal => 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Manner {
    Nasal,
    Stop,
    Fricative,
    Sibilant,
    Affricate,
    Approximant,
    Lateral,
    Trill,
}

/// Distinctive features of one symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Features {
    /// `height` runs from 1 (close) to 3 (open).
    Vowel {
        height: f64,
        backness: Backness,
        rounded: bool,
    },
    Consonant {
        place: Place,
        voiced: bool,
        manner: Manner,
    },
}

fn differs<T: PartialEq>(a: T, b: T) -> f64 {
    if a == b { 0.0 } else { 1.0 }
}

impl Features {
    /// Sum of per-feature distances. Vowels and consonants are unrelated.
    ///
    /// Height and place compare on their numeric scales; every other feature
    /// contributes 0 or 1.
    pub fn distance(&self, other: &Features) -> Option<f64> {
        match (*self, *other) {
            (
                Features::Vowel {
                    height: h1,
                    backness: b1,
                    rounded: r1,
                },
                Features::Vowel {
                    height: h2,
                    backness: b2,
                    rounded: r2,
                },
            ) => Some((h1 - h2).abs() + differs(b1, b2) + differs(r1, r2)),
            (
                Features::Consonant {
                    place: p1,
                    voiced: v1,
                    manner: m1,
                },
                Features::Consonant {
                    place: p2,
                    voiced: v2,
                    manner: m2,
                },
            ) => Some((p1.position() - p2.position()).abs() + differs(v1, v2) + differs(m1, m2)),
            _ => None,
        }
    }
}

/// Symbol name to features. Unknown symbols have no distance to anything.
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    entries: HashMap<String, Features>,
}

impl FeatureTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, features: Features) {
        self.entries.insert(name.to_string(), features);
    }

    pub fn get(&self, name: &str) -> Option<&Features> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pronunciation features for the IPA segments used by the built-in
    /// phonologies. Every symbol has a distinct feature triple.
    pub fn ipa() -> Self {
        use Backness::*;
        use Manner::*;
        use Place::*;

        const VOWELS: &[(&str, f64, Backness, bool)] = &[
            ("i", 1.0, Front, false),
            ("y", 1.0, Front, true),
            ("u", 1.0, Back, true),
            ("ɪ", 1.5, Front, false),
            ("ʊ", 1.5, Back, true),
            ("e", 2.0, Front, false),
            ("ø", 2.0, Front, true),
            ("o", 2.0, Back, true),
            ("ə", 2.25, Central, false),
            ("ɜ", 2.5, Central, false),
            ("ɛ", 2.5, Front, false),
            ("ʌ", 2.5, Back, false),
            ("ɔ", 2.5, Back, true),
            ("æ", 2.75, Front, false),
            ("a", 3.0, Front, false),
            ("ɑ", 3.0, Back, false),
            ("ɒ", 3.0, Back, true),
        ];
        const CONSONANTS: &[(&str, Place, bool, Manner)] = &[
            ("m", Bilabial, true, Nasal),
            ("p", Bilabial, false, Stop),
            ("b", Bilabial, true, Stop),
            ("f", Labiodental, false, Fricative),
            ("v", Labiodental, true, Fricative),
            ("ʋ", Labiodental, true, Approximant),
            ("w", Labiovelar, true, Approximant),
            ("θ", Dental, false, Fricative),
            ("ð", Dental, true, Fricative),
            ("n", Alveolar, true, Nasal),
            ("t", Alveolar, false, Stop),
            ("d", Alveolar, true, Stop),
            ("s", Alveolar, false, Sibilant),
            ("z", Alveolar, true, Sibilant),
            ("l", Alveolar, true, Lateral),
            ("r", Alveolar, true, Trill),
            ("ʃ", Postalveolar, false, Sibilant),
            ("ʒ", Postalveolar, true, Sibilant),
            ("ʧ", Postalveolar, false, Affricate),
            ("ç", Palatal, false, Fricative),
            ("c", Palatal, false, Stop),
            ("j", Palatal, true, Approximant),
            ("k", Velar, false, Stop),
            ("ɡ", Velar, true, Stop),
            ("x", Velar, false, Fricative),
            ("ŋ", Velar, true, Nasal),
            ("h", Glottal, false, Fricative),
            ("ɦ", Glottal, true, Fricative),
        ];
        Self::from_lists(VOWELS, CONSONANTS)
    }

    /// Letter features for Latin-script orthography, treating each letter as
    /// its most typical sound.
    pub fn latin() -> Self {
        use Backness::*;
        use Manner::*;
        use Place::*;

        const VOWELS: &[(&str, f64, Backness, bool)] = &[
            ("i", 1.0, Front, false),
            ("y", 1.0, Front, true),
            ("u", 1.0, Back, true),
            ("e", 2.0, Front, false),
            ("ö", 2.0, Front, true),
            ("o", 2.0, Back, true),
            ("õ", 2.0, Back, false),
            ("ä", 3.0, Front, false),
            ("a", 3.0, Back, false),
        ];
        const CONSONANTS: &[(&str, Place, bool, Manner)] = &[
            ("m", Bilabial, true, Nasal),
            ("p", Bilabial, false, Stop),
            ("b", Bilabial, true, Stop),
            ("v", Labiodental, true, Fricative),
            ("f", Labiodental, false, Fricative),
            ("w", Labiovelar, true, Approximant),
            ("n", Alveolar, true, Nasal),
            ("t", Alveolar, false, Stop),
            ("d", Alveolar, true, Stop),
            ("s", Alveolar, false, Sibilant),
            ("z", Alveolar, true, Sibilant),
            ("l", Alveolar, true, Lateral),
            ("r", Alveolar, true, Trill),
            ("j", Palatal, true, Approximant),
            ("k", Velar, false, Stop),
            ("g", Velar, true, Stop),
            ("x", Velar, false, Fricative),
            ("c", Velar, false, Affricate),
            ("h", Glottal, false, Fricative),
        ];
        Self::from_lists(VOWELS, CONSONANTS)
    }

    fn from_lists(
        vowels: &[(&str, f64, Backness, bool)],
        consonants: &[(&str, Place, bool, Manner)],
    ) -> Self {
        let mut table = Self::new();
        for &(name, height, backness, rounded) in vowels {
            table.insert(
                name,
                Features::Vowel {
                    height,
                    backness,
                    rounded,
                },
            );
        }
        for &(name, place, voiced, manner) in consonants {
            table.insert(
                name,
                Features::Consonant {
                    place,
                    voiced,
                    manner,
                },
            );
        }
        table
    }
}

impl SymbolDistance for FeatureTable {
    fn distance(&self, a: &str, b: &str) -> Option<f64> {
        self.get(a)?.distance(self.get(b)?)
    }
}
