//! URL Utility Functions
//!
//! Turns the raw `href` of a listing link into an absolute, navigable URL.
//! An empty string means "no usable link"; it is a normal result, not an
//! error.

use std::borrow::Cow;
use std::fmt::Write;

use url::Url;

use crate::patterns::NON_NAVIGABLE_PREFIXES;

/// ASCII characters kept as-is when re-encoding a decoded href, besides
/// letters and digits: RFC 3986 unreserved and reserved characters, plus
/// `%`. Keeping `@` and `[]` leaves userinfo and IPv6 authorities intact.
const SAFE_CHARS: &[u8] = b"-._~:/?#[]@!$&'()*+,;=%";

/// Normalize a raw href against the page it was found on.
///
/// Steps:
/// 1. trim, percent-decode, reject `javascript:`, `mailto:` and fragment-only links
/// 2. re-encode non-ASCII and unsafe characters, keeping URL delimiters
///    such as `:/?&=#@` and `%`
/// 3. resolve relative paths against `base_url`; prefix `http://` for bare
///    `www.` hosts
/// 4. keep the result only if it has both a scheme and a host
///
/// # Returns
/// * The absolute URL, or an empty string when the link is unusable
///
/// # Examples
/// ```
/// use feedsift::url_utils::normalize;
///
/// assert_eq!(normalize("/a/b", "http://x.com/p/q"), "http://x.com/a/b");
/// assert_eq!(normalize("../c", "http://x.com/p/q/"), "http://x.com/p/c");
/// assert_eq!(normalize("javascript:void(0)", "http://x.com/"), "");
/// ```
#[must_use]
pub fn normalize(raw: &str, base_url: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    let decoded = percent_decode(raw);
    let decoded = decoded.trim();
    if is_non_navigable(decoded) {
        return String::new();
    }

    let encoded = encode_unsafe(decoded);
    let resolved = if is_relative_path(&encoded) {
        resolve(&encoded, base_url)
    } else if has_scheme(&encoded) {
        Url::parse(&encoded).ok()
    } else if encoded.starts_with("www.") {
        Url::parse(&format!("http://{encoded}")).ok()
    } else {
        resolve(&encoded, base_url)
    };

    match resolved {
        Some(url) if url.host_str().is_some_and(|h| !h.is_empty()) => url.to_string(),
        _ => String::new(),
    }
}

/// Whether a decoded href can never lead to a page.
#[must_use]
pub fn is_non_navigable(href: &str) -> bool {
    let lower = href.trim_start().to_ascii_lowercase();
    NON_NAVIGABLE_PREFIXES
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

/// Percent-decode, keeping the input when the escapes do not form UTF-8.
fn percent_decode(raw: &str) -> Cow<'_, str> {
    urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
}

/// Percent-encode every byte that is neither alphanumeric nor in
/// [`SAFE_CHARS`].
fn encode_unsafe(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        if byte.is_ascii_alphanumeric() || SAFE_CHARS.contains(&byte) {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}

fn is_relative_path(s: &str) -> bool {
    s.starts_with('/') || s.starts_with("./") || s.starts_with("../")
}

/// RFC 3986 scheme followed by `:`. A bare `host:port` has no `//` and is
/// not treated as a scheme.
fn has_scheme(s: &str) -> bool {
    let Some((scheme, rest)) = s.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    let valid_scheme = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid_scheme && (rest.starts_with("//") || !rest.starts_with(|c: char| c.is_ascii_digit()))
}

fn resolve(relative: &str, base_url: &str) -> Option<Url> {
    let base = Url::parse(base_url.trim()).ok()?;
    base.join(relative).ok()
}
