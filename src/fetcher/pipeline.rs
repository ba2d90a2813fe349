use std::sync::LazyLock;

use encoding_rs::Encoding;
use regex::Regex;

use crate::fetcher::errors::FetchError;

static CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static META_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>]+)"#).unwrap());

static XML_DECL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<\?xml\s+[^>]*?encoding\s*=\s*["']([^"']+)["']"#).unwrap());

static TITLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());

/// Decode a response body to UTF-8.
///
/// Order: `Content-Type` charset, then an in-document declaration (`<meta
/// charset>` or the XML prolog) in the first 4KB, then a heuristic guess.
pub fn decode_body(content_type: &str, body: &[u8]) -> Result<String, FetchError> {
    let encoding = detect_encoding(content_type, body);
    let (decoded, _encoding, had_errors) = encoding.decode(body);

    if had_errors {
        return Err(FetchError::Charset(format!(
            "failed to decode content with encoding: {}",
            encoding.name()
        )));
    }

    Ok(decoded.into_owned())
}

fn detect_encoding(content_type: &str, body: &[u8]) -> &'static Encoding {
    if let Some(encoding) = label_from(&CHARSET_REGEX, content_type) {
        return encoding;
    }

    let head = &body[..body.len().min(4096)];
    let head_str = String::from_utf8_lossy(head);

    if let Some(encoding) = label_from(&XML_DECL_REGEX, &head_str)
        .or_else(|| label_from(&META_CHARSET_REGEX, &head_str))
    {
        return encoding;
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(head, false);
    detector.guess(None, true)
}

fn label_from(regex: &Regex, haystack: &str) -> Option<&'static Encoding> {
    let label = regex.captures(haystack)?.get(1)?.as_str().to_lowercase();
    Encoding::for_label(label.as_bytes())
}

/// True when an HTML page is the origin's "not found" page rather than a
/// profile page. The origin serves these with a 200 on some paths.
pub fn is_not_found_page(html: &str) -> bool {
    TITLE_REGEX
        .captures(html)
        .and_then(|c| c.get(1))
        .is_some_and(|title| title.as_str().to_lowercase().contains("not found"))
}
