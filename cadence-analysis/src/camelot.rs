//! Musical keys and Camelot wheel notation
//!
//! The Camelot wheel arranges the 24 keys so that harmonically compatible
//! keys sit next to each other: slots follow the circle of fifths, minor
//! keys take the letter A, major keys the letter B, and relative
//! major/minor pairs share a slot number.

use std::fmt;

/// Note names indexed by pitch class (0 = C)
const NOTE_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// One of the 24 musical keys: a tonic pitch class plus a mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MusicalKey {
    tonic: u8,
    minor: bool,
}

impl MusicalKey {
    /// Major key rooted at the given pitch class (0 = C)
    pub fn major(tonic: u8) -> Self {
        Self {
            tonic: tonic % 12,
            minor: false,
        }
    }

    /// Minor key rooted at the given pitch class (0 = C)
    pub fn minor(tonic: u8) -> Self {
        Self {
            tonic: tonic % 12,
            minor: true,
        }
    }

    /// Pitch class of the tonic (0-11)
    pub fn tonic(&self) -> u8 {
        self.tonic
    }

    /// Whether this is a minor key
    pub fn is_minor(&self) -> bool {
        self.minor
    }
}

impl fmt::Display for MusicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            NOTE_NAMES[self.tonic as usize],
            if self.minor { "m" } else { "" }
        )
    }
}

/// A slot on the Camelot wheel (1A-12B)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CamelotKey {
    /// Position on the wheel (1-12)
    pub number: u8,
    /// true = B (major), false = A (minor)
    pub is_major: bool,
}

impl CamelotKey {
    /// Create a wheel slot, rejecting numbers outside 1-12
    pub fn new(number: u8, is_major: bool) -> Option<Self> {
        if (1..=12).contains(&number) {
            Some(Self { number, is_major })
        } else {
            None
        }
    }

    /// Wheel slot for a musical key
    ///
    /// Each clockwise step on the wheel raises the tonic by a fifth, and a
    /// minor key shares the slot of its relative major (tonic three
    /// semitones up), so the slot number is circle-of-fifths arithmetic:
    /// B major anchors slot 1, and 7 is the multiplicative inverse of a
    /// fifth step mod 12.
    pub fn from_musical_key(key: MusicalKey) -> Self {
        let major_tonic = if key.is_minor() {
            (key.tonic() + 3) % 12
        } else {
            key.tonic()
        };
        Self {
            number: (major_tonic + 1) * 7 % 12 + 1,
            is_major: !key.is_minor(),
        }
    }

    /// Display string such as "8B" or "12A"
    pub fn display(&self) -> String {
        format!("{}{}", self.number, if self.is_major { 'B' } else { 'A' })
    }

    /// Whether two slots mix harmonically
    ///
    /// Compatible: the same slot, the relative major/minor (same number,
    /// other letter), or an adjacent number with the same letter. The
    /// wheel wraps, so 12 and 1 are adjacent.
    pub fn is_compatible(&self, other: &CamelotKey) -> bool {
        if self.number == other.number {
            return true;
        }
        if self.is_major == other.is_major {
            let diff = (i16::from(self.number) - i16::from(other.number)).abs();
            return diff == 1 || diff == 11;
        }
        false
    }
}

impl fmt::Display for CamelotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}
