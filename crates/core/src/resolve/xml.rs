//! Minimal XML fragment helpers for the structured-config resolve options.
//!
//! Diff hunks of XML files are fragments, not documents, so a full parser
//! would reject most of them. These helpers only understand flat element
//! sequences and report anything else as a parse error.

use crate::errors::ResolveError;

/// Text content of the first `<tag>` element in `xml`, trimmed and
/// unescaped.
pub(crate) fn extract_tag_content(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);
    let mut search_from = 0;
    while let Some(rel_pos) = xml[search_from..].find(&open) {
        let start_pos = search_from + rel_pos;
        let after_open = &xml[start_pos + open.len()..];
        // <nameList> must not match <name>
        match after_open.chars().next() {
            Some(ch) if ch == '>' || ch.is_ascii_whitespace() => {}
            _ => {
                search_from = start_pos + open.len();
                continue;
            }
        }
        let content_start = after_open.find('>')? + 1;
        let content = &after_open[content_start..];
        let end_pos = content.find(&close)?;
        return Some(xml_unescape(content[..end_pos].trim()));
    }
    None
}

/// Unescape the five predefined XML entities.
pub(crate) fn xml_unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Value of `attr` inside a start tag, single- or double-quoted.
pub(crate) fn extract_attribute(start_tag: &str, attr: &str) -> Option<String> {
    for quote in ['"', '\''] {
        let pattern = format!(" {}={}", attr, quote);
        if let Some(pos) = start_tag.find(&pattern) {
            let after = &start_tag[pos + pattern.len()..];
            let end = after.find(quote)?;
            return Some(xml_unescape(&after[..end]));
        }
    }
    None
}

/// Split `fragment` into consecutive `<tag>...</tag>` elements.
///
/// Only whitespace may appear between elements.
pub(crate) fn split_elements<'a>(
    fragment: &'a str,
    tag: &str,
    format: &'static str,
) -> Result<Vec<&'a str>, ResolveError> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let mut elements = Vec::new();
    let mut rest = fragment;
    loop {
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            return Ok(elements);
        }
        if !trimmed.starts_with(&open) {
            return Err(ResolveError::StructuralParse {
                format,
                detail: format!("expected <{}> but found '{}'", tag, first_line(trimmed)),
            });
        }
        let end = trimmed.find(&close).ok_or_else(|| ResolveError::StructuralParse {
            format,
            detail: format!("unterminated <{}> element", tag),
        })? + close.len();
        elements.push(&trimmed[..end]);
        rest = &trimmed[end..];
    }
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_tag_content_no_prefix_match() {
        let xml = "<nameList>x</nameList><name> key &amp; co </name>";
        assert_eq!(extract_tag_content(xml, "name").as_deref(), Some("key & co"));
        assert_eq!(extract_tag_content(xml, "value"), None);
    }

    #[test]
    fn test_extract_attribute_quotes() {
        assert_eq!(
            extract_attribute("<include file=\"a.xml\"/>", "file").as_deref(),
            Some("a.xml")
        );
        assert_eq!(
            extract_attribute("<include relative='true' file='b.xml' />", "file").as_deref(),
            Some("b.xml")
        );
        assert_eq!(extract_attribute("<include path=\"c\"/>", "file"), None);
    }

    #[test]
    fn test_split_elements() {
        let fragment = "  <e><n>a</n></e>\n  <e><n>b</n></e>\n";
        let elements = split_elements(fragment, "e", "test").unwrap();
        assert_eq!(elements, vec!["<e><n>a</n></e>", "<e><n>b</n></e>"]);
    }

    #[test]
    fn test_split_elements_rejects_stray_text() {
        assert!(split_elements("<e></e> junk", "e", "test").is_err());
        assert!(split_elements("<e><n>a</n>", "e", "test").is_err());
    }
}
