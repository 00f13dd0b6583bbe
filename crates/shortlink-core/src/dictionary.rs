use crate::settings::LinkSettings;
use std::collections::HashSet;

/// The digit set of the alias numeral system.
///
/// Holds the ordered alphabet used as digits and a membership set of every
/// symbol that may legally appear in an alias body (the alphabet plus the
/// filler).
#[derive(Debug, Clone)]
pub struct Dictionary {
    digits: Vec<char>,
    filler: char,
    legal: HashSet<char>,
}

impl Dictionary {
    pub fn new(alphabet: &str, filler: char) -> Self {
        let digits: Vec<char> = alphabet.chars().collect();
        let mut legal: HashSet<char> = digits.iter().copied().collect();
        legal.insert(filler);

        Self {
            digits,
            filler,
            legal,
        }
    }

    pub fn from_settings(settings: &LinkSettings) -> Self {
        Self::new(&settings.alphabet, settings.filler)
    }

    /// Returns the ordered digit symbols.
    pub fn digits(&self) -> &[char] {
        &self.digits
    }

    pub fn filler(&self) -> char {
        self.filler
    }

    /// Number of digit symbols, i.e. the numeral base.
    pub fn base(&self) -> usize {
        self.digits.len()
    }

    /// Returns the value of `symbol` as a digit. The first match wins.
    pub fn digit_value(&self, symbol: char) -> Option<usize> {
        digit_value(&self.digits, symbol)
    }

    /// Whether `symbol` may appear in an alias body.
    pub fn is_legal(&self, symbol: char) -> bool {
        self.legal.contains(&symbol)
    }

    /// Number of distinct ids that fit in `width` digits, if it fits in `u64`.
    pub fn capacity(&self, width: usize) -> Option<u64> {
        let width = u32::try_from(width).ok()?;
        (self.base() as u64).checked_pow(width)
    }
}

pub(crate) fn digit_value(digits: &[char], symbol: char) -> Option<usize> {
    digits.iter().position(|d| *d == symbol)
}
