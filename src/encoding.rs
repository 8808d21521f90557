//! Character encoding detection and transcoding of fetched pages.
//!
//! Listing pages are still frequently served as GBK, Big5 or Shift_JIS.
//! The charset is taken from the response `Content-Type` when present,
//! otherwise from the page's own `<meta>` declarations, and defaults to
//! UTF-8.

use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;

/// Match `<meta charset="...">`, also inside an http-equiv `content` value
#[allow(clippy::expect_used)]
static CHARSET_META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([^"'\s/>;]+)"#).expect("valid regex")
});

/// Match `charset=...` in a Content-Type header value
#[allow(clippy::expect_used)]
static HEADER_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).expect("valid regex")
});

/// Only this much of the page is searched for a meta declaration.
const META_SNIFF_LEN: usize = 2048;

/// Detect the encoding of a page.
///
/// Order: `Content-Type` header charset, `<meta>` charset in the first
/// [`META_SNIFF_LEN`] bytes, UTF-8. Unknown labels are ignored.
#[must_use]
pub fn detect_encoding(body: &[u8], content_type: Option<&str>) -> &'static Encoding {
    let from_header = content_type
        .and_then(|ct| capture(&HEADER_CHARSET_RE, ct))
        .and_then(|label| Encoding::for_label(label.as_bytes()));
    if let Some(encoding) = from_header {
        return encoding;
    }

    let head = String::from_utf8_lossy(&body[..body.len().min(META_SNIFF_LEN)]);
    capture(&CHARSET_META_RE, &head)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8)
}

fn capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Decode a page body to UTF-8.
///
/// Undecodable bytes become U+FFFD rather than errors. A byte-order mark
/// overrides any declared charset.
///
/// # Examples
///
/// ```
/// use feedsift::encoding::decode_page;
///
/// let body = b"<html><head><meta charset=\"gbk\"></head><body>\xD0\xC2\xCE\xC5</body></html>";
/// assert!(decode_page(body, None).contains("新闻"));
/// ```
#[must_use]
pub fn decode_page(body: &[u8], content_type: Option<&str>) -> String {
    let encoding = detect_encoding(body, content_type);
    let (decoded, _encoding_used, _had_errors) = encoding.decode(body);
    decoded.into_owned()
}
