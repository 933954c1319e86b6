use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;

// Character data only needs the markup-significant characters replaced.
static TEXT_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">"])
        .expect("Failed to build XML text escaper")
});

static ATTR_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\""])
        .expect("Failed to build XML attribute escaper")
});

/// Escape a string for use as element character data.
///
/// # Examples
///
/// ```
/// use deckweave::common::xml::escape_text;
/// assert_eq!(escape_text("a & b"), "a &amp; b");
/// assert_eq!(escape_text("say \"hi\""), "say \"hi\"");
/// ```
#[inline]
pub fn escape_text(s: &str) -> String {
    TEXT_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;"])
}

/// Escape a string for use inside a double-quoted attribute value.
///
/// # Examples
///
/// ```
/// use deckweave::common::xml::escape_attr;
/// assert_eq!(escape_attr("<\"x\">"), "&lt;&quot;x&quot;&gt;");
/// ```
#[inline]
pub fn escape_attr(s: &str) -> String {
    ATTR_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;", "&quot;"])
}

/// Resolve the predefined entities and numeric character references in `s`.
///
/// Unknown or malformed references are copied through unchanged.
///
/// # Examples
///
/// ```
/// use deckweave::common::xml::unescape_xml;
/// assert_eq!(unescape_xml("&lt;a &amp; b&gt;"), "<a & b>");
/// assert_eq!(unescape_xml("&#x2022; &#65;"), "\u{2022} A");
/// assert_eq!(unescape_xml("&amp;lt;"), "&lt;");
/// assert_eq!(unescape_xml("&invalid;"), "&invalid;");
/// ```
pub fn unescape_xml(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let resolved = tail
            .find(';')
            .and_then(|semi| resolve_reference(&tail[1..semi]).map(|c| (c, semi)));
        match resolved {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            },
            None => {
                out.push('&');
                rest = &tail[1..];
            },
        }
    }
    out.push_str(rest);
    out
}

fn resolve_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_attr_escaping() {
        let raw = r#"Tom & "Jerry" <3"#;
        assert_eq!(unescape_xml(&escape_attr(raw)), raw);
    }

    #[test]
    fn test_unescape_leaves_incomplete_reference() {
        assert_eq!(unescape_xml("&amp"), "&amp");
        assert_eq!(unescape_xml("a & b"), "a & b");
        assert_eq!(unescape_xml("&#xZZ;"), "&#xZZ;");
    }
}
