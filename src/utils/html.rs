//! HTML serialization helpers for emitted markup.
//!
//! - `escape()`, `escape_attr()` - entity escaping for text and attributes
//! - `is_void_element()`, `is_raw_text_element()` - element classification
//! - `guard_raw_text()` - keep inlined script/style bodies from closing early

use std::borrow::Cow;

// =============================================================================
// Escaping
// =============================================================================

/// Characters with a meaning in markup.
const SPECIAL: [char; 5] = ['<', '>', '&', '"', '\''];

#[inline]
fn entity(c: char) -> Option<&'static str> {
    Some(match c {
        '<' => "&lt;",
        '>' => "&gt;",
        '&' => "&amp;",
        '"' => "&quot;",
        '\'' => "&#39;",
        _ => return None,
    })
}

/// Escape text content. Borrows when nothing needs escaping.
pub fn escape(s: &str) -> Cow<'_, str> {
    let Some(first) = s.find(SPECIAL) else {
        return Cow::Borrowed(s);
    };

    let (clean, rest) = s.split_at(first);
    let mut out = String::with_capacity(s.len() + 16);
    out.push_str(clean);
    rest.chars().for_each(|c| match entity(c) {
        Some(e) => out.push_str(e),
        None => out.push(c),
    });
    Cow::Owned(out)
}

/// Escape an attribute value. Values are always double-quoted, so the text
/// rules apply unchanged.
pub fn escape_attr(s: &str) -> Cow<'_, str> {
    escape(s)
}

/// Neutralize `</tag` sequences inside a raw text body.
///
/// End tags match case-insensitively, so `</SCRIPT` closes a script just as
/// `</script` does. Script bodies get `<\/tag`, which is equivalent inside
/// JS strings and comments. Style bodies get the CSS escape `<\2f tag`.
pub fn guard_raw_text<'a>(tag: &str, body: &'a str) -> Cow<'a, str> {
    let needle = format!("</{}", tag.to_ascii_lowercase());
    // ASCII lowercasing keeps byte offsets aligned with `body`
    let folded = body.to_ascii_lowercase();
    let mut hits = folded.match_indices(&needle).map(|(i, _)| i).peekable();
    if hits.peek().is_none() {
        return Cow::Borrowed(body);
    }

    let slash = if tag.eq_ignore_ascii_case("style") { "\\2f " } else { "\\/" };
    let mut out = String::with_capacity(body.len() + 8);
    let mut last = 0;
    for at in hits {
        // keep `<`, swap the `/`, keep the tag name as written
        out.push_str(&body[last..=at]);
        out.push_str(slash);
        last = at + 2;
    }
    out.push_str(&body[last..]);
    Cow::Owned(out)
}

// =============================================================================
// Element Classification
// =============================================================================

/// Void elements have no closing tag.
pub fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta"
    )
}

/// Raw text elements: content is not HTML-escaped.
pub fn is_raw_text_element(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_borrows() {
        assert!(matches!(escape("/assets/5eb63bbb.min.js"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escape_keeps_clean_prefix() {
        assert_eq!(escape("a < b"), "a &lt; b");
        assert_eq!(escape("Tom & Jerry's"), "Tom &amp; Jerry&#39;s");
        assert_eq!(escape("<>"), "&lt;&gt;");
    }

    #[test]
    fn test_attr_query_string() {
        assert_eq!(escape_attr("/a.js?v=1&x=\"2\""), "/a.js?v=1&amp;x=&quot;2&quot;");
    }

    #[test]
    fn test_guard_raw_text() {
        assert_eq!(guard_raw_text("script", "var a = 1;"), "var a = 1;");
        assert_eq!(
            guard_raw_text("script", "document.write('</script>')"),
            "document.write('<\\/script>')"
        );
        assert_eq!(guard_raw_text("style", "a{}</style>"), "a{}<\\2f style>");
    }

    #[test]
    fn test_guard_raw_text_any_case() {
        assert_eq!(
            guard_raw_text("script", "a('</SCRIPT>'); b('</Script>')"),
            "a('<\\/SCRIPT>'); b('<\\/Script>')"
        );
        assert_eq!(
            guard_raw_text("style", "a::after{content:\"</Style>\"}"),
            "a::after{content:\"<\\2f Style>\"}"
        );
        assert_eq!(guard_raw_text("script", "x </scrip"), "x </scrip");
    }

    #[test]
    fn test_emitted_tags_classified() {
        assert!(is_void_element("link"));
        assert!(!is_void_element("script"));
        assert!(!is_void_element("style"));
        assert!(is_raw_text_element("script"));
        assert!(is_raw_text_element("style"));
        assert!(!is_raw_text_element("link"));
    }
}
