use crate::dictionary::Dictionary;
use crate::settings::LinkSettings;
use url::Url;

/// Structural check of a candidate alias.
///
/// An alias is valid when it has exactly the configured length, parses as a
/// request URI (only when `check_urls` is on), uses only dictionary symbols
/// after the domain prefix, and carries filler symbols only as a left pad in
/// front of at least one digit.
pub fn is_valid_alias(alias: &str, settings: &LinkSettings, dictionary: &Dictionary) -> bool {
    let expected_len = settings.domain.chars().count() + settings.short_len;
    if alias.chars().count() != expected_len {
        return false;
    }

    if settings.check_urls && !is_request_uri(alias) {
        return false;
    }

    let body = alias.replacen(&settings.domain, "", 1);
    if !body.chars().all(|c| dictionary.is_legal(c)) {
        return false;
    }

    let filler = dictionary.filler();
    let digits = body.trim_start_matches(filler);
    !digits.is_empty() && !digits.contains(filler)
}

/// Whether `input` is an absolute URL or an absolute path.
///
/// Fragments are not special-cased; the input is taken as it would arrive
/// in a request line.
pub fn is_request_uri(input: &str) -> bool {
    if input.is_empty() {
        return false;
    }

    if input.starts_with('/') {
        return !input.chars().any(|c| c.is_control() || c == ' ');
    }

    Url::parse(input).is_ok()
}
