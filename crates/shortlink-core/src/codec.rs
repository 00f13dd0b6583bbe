//! Conversion between sequential ids and padded aliases.
//!
//! An alias is `domain` followed by the base-N representation of an id over
//! an ordered alphabet, left padded with a filler symbol to a fixed width.
//! Ids that need more than `width` digits are emitted unpadded and are never
//! truncated.

use crate::dictionary::digit_value;

/// Encodes `id` as a domain-prefixed alias.
///
/// `width` should be at least 1.
///
/// # Panics
///
/// Panics if `alphabet` has fewer than two symbols.
///
/// ```
/// use shortlink_core::codec::encode;
///
/// let alphabet: Vec<char> = shortlink_core::settings::DEFAULT_ALPHABET.chars().collect();
/// assert_eq!(encode(0, '_', 5, "te.st/", &alphabet), "te.st/____a");
/// assert_eq!(encode(1, '_', 5, "te.st/", &alphabet), "te.st/____b");
/// ```
pub fn encode(id: u64, filler: char, width: usize, domain: &str, alphabet: &[char]) -> String {
    assert!(alphabet.len() >= 2, "alphabet needs at least two symbols");

    // Zero has no positional digits; it is the lowest symbol, right aligned.
    let digits = if id == 0 {
        vec![alphabet[0]]
    } else {
        to_digits(id, alphabet)
    };

    let padding = width.saturating_sub(digits.len());
    let mut alias = String::with_capacity(domain.len() + padding + digits.len());
    alias.push_str(domain);
    alias.extend(std::iter::repeat(filler).take(padding));
    alias.extend(digits);
    alias
}

/// Decodes an alias back into its id.
///
/// The alias is not validated: the first occurrence of `domain` and every
/// `filler` are removed, symbols outside `alphabet` are skipped, and the rest
/// is read most significant digit first. Returns `None` if the value does not
/// fit in a `u64`.
pub fn decode(alias: &str, filler: char, domain: &str, alphabet: &[char]) -> Option<u64> {
    let base = alphabet.len() as u64;
    let body = alias.replacen(domain, "", 1);

    body.chars()
        .filter(|c| *c != filler)
        .filter_map(|c| digit_value(alphabet, c))
        .try_fold(0u64, |acc, value| {
            acc.checked_mul(base)?.checked_add(value as u64)
        })
}

fn to_digits(mut id: u64, alphabet: &[char]) -> Vec<char> {
    let base = alphabet.len() as u64;
    let mut digits = Vec::new();

    while id > 0 {
        digits.push(alphabet[(id % base) as usize]);
        id /= base;
    }

    digits.reverse();
    digits
}
