use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use typed_builder::TypedBuilder;

/// The 62 alphanumeric digits, lowest value first.
pub const DEFAULT_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const DEFAULT_FILLER: char = '_';
pub const DEFAULT_SHORT_LEN: usize = 10;

/// Read-only configuration consumed by the link service.
///
/// Built once at startup and handed to the service by value; nothing mutates
/// it afterwards.
///
/// ```
/// use shortlink_core::LinkSettings;
///
/// let settings = LinkSettings::builder()
///     .domain("te.st/")
///     .short_len(5)
///     .build();
/// assert!(settings.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct LinkSettings {
    /// Prefix placed in front of every alias, e.g. `"https://sho.rt/"`.
    #[builder(setter(into))]
    pub domain: String,
    /// Width of the alias field after the domain prefix.
    #[builder(default = DEFAULT_SHORT_LEN)]
    pub short_len: usize,
    /// Symbol used only for left padding.
    #[builder(default = DEFAULT_FILLER)]
    pub filler: char,
    /// Ordered digit symbols of the numeral system.
    #[builder(default = DEFAULT_ALPHABET.to_string(), setter(into))]
    pub alphabet: String,
    /// Require originals and aliases to parse as request URIs.
    #[builder(default = false)]
    pub check_urls: bool,
}

impl LinkSettings {
    /// Checks that the settings describe a usable numeral system.
    pub fn validate(&self) -> Result<()> {
        if self.alphabet.chars().nth(1).is_none() {
            return Err(CoreError::InvalidSettings(
                "alphabet needs at least two symbols".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = self.alphabet.chars().find(|c| !seen.insert(*c)) {
            return Err(CoreError::InvalidSettings(format!(
                "alphabet contains duplicate symbol '{}'",
                dup
            )));
        }

        if seen.contains(&self.filler) {
            return Err(CoreError::InvalidSettings(format!(
                "filler '{}' must not be an alphabet symbol",
                self.filler
            )));
        }

        if self.short_len == 0 {
            return Err(CoreError::InvalidSettings(
                "short_len must be at least 1".to_string(),
            ));
        }

        let width = u32::try_from(self.short_len).unwrap_or(u32::MAX);
        if (seen.len() as u64).checked_pow(width).is_none() {
            return Err(CoreError::InvalidSettings(format!(
                "short_len {} overflows the id space of a {}-symbol alphabet",
                self.short_len,
                seen.len()
            )));
        }

        Ok(())
    }
}
