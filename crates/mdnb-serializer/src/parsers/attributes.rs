//! Fence attribute grammar
//!
//! ```text
//! info       = language? attributes?
//! attributes = "{" pairs "}" | pairs
//! pairs      = (pair (ws pair)*)?
//! pair       = key ("=" value)?
//! value      = bare | '"' (escaped | [^"\\])* '"'
//! ```
//!
//! A key without a value reads as `"true"`. Braces are optional on read and
//! always written.

use mdnb_document::Metadata;

/// Attribute syntax error at a byte position of the attribute text
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AttributeError {
    pub(crate) position: usize,
    pub(crate) reason: &'static str,
}

impl AttributeError {
    fn at(position: usize, reason: &'static str) -> Self {
        Self { position, reason }
    }
}

/// Split an info string into language and attribute text
///
/// Returns the language (possibly empty) and the byte position where the
/// attribute text starts.
pub(crate) fn split_info(info: &str) -> (&str, usize) {
    let trimmed_start = info.len() - info.trim_start().len();
    let rest = &info[trimmed_start..];
    if rest.starts_with('{') {
        return ("", trimmed_start);
    }
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '{')
        .unwrap_or(rest.len());
    let first = &rest[..end];
    if first.contains('=') {
        ("", trimmed_start)
    } else {
        (first, trimmed_start + end)
    }
}

/// Parse attribute text into metadata
pub(crate) fn parse_attributes(input: &str) -> Result<Metadata, AttributeError> {
    let lead = input.len() - input.trim_start().len();
    let body = input.trim();

    if body.is_empty() {
        return Ok(Metadata::new());
    }

    let (pairs, base) = if body.starts_with('{') {
        let close = find_closing_brace(body)
            .ok_or_else(|| AttributeError::at(lead, "unclosed '{'"))?;
        let trailing = &body[close + 1..];
        if !trailing.trim().is_empty() {
            let offset = trailing.len() - trailing.trim_start().len();
            return Err(AttributeError::at(
                lead + close + 1 + offset,
                "trailing text after '}'",
            ));
        }
        (&body[1..close], lead + 1)
    } else {
        (body, lead)
    };

    parse_pairs(pairs, base)
}

fn find_closing_brace(body: &str) -> Option<usize> {
    let mut in_quote = false;
    let mut escaped = false;
    for (i, c) in body.char_indices().skip(1) {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quote => escaped = true,
            '"' => in_quote = !in_quote,
            '}' if !in_quote => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_pairs(text: &str, base: usize) -> Result<Metadata, AttributeError> {
    let mut metadata = Metadata::new();
    let mut chars = text.char_indices().peekable();

    loop {
        while chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
        let Some(&(key_start, _)) = chars.peek() else {
            break;
        };

        let mut key = String::new();
        while let Some((i, c)) = chars.next_if(|(_, c)| !c.is_whitespace() && *c != '=') {
            if matches!(c, '"' | '{' | '}') {
                return Err(AttributeError::at(base + i, "invalid character in key"));
            }
            key.push(c);
        }
        if key.is_empty() {
            return Err(AttributeError::at(base + key_start, "empty key"));
        }

        let value = if chars.next_if(|(_, c)| *c == '=').is_some() {
            match chars.peek() {
                Some(&(quote_at, '"')) => {
                    chars.next();
                    let mut value = String::new();
                    let mut closed = false;
                    while let Some((_, c)) = chars.next() {
                        match c {
                            '\\' => match chars.next() {
                                Some((_, escaped @ ('"' | '\\'))) => value.push(escaped),
                                Some((_, other)) => {
                                    value.push('\\');
                                    value.push(other);
                                }
                                None => break,
                            },
                            '"' => {
                                closed = true;
                                break;
                            }
                            other => value.push(other),
                        }
                    }
                    if !closed {
                        return Err(AttributeError::at(base + quote_at, "unterminated quote"));
                    }
                    value
                }
                _ => {
                    let mut value = String::new();
                    while let Some((_, c)) = chars.next_if(|(_, c)| !c.is_whitespace()) {
                        value.push(c);
                    }
                    value
                }
            }
        } else {
            "true".to_string()
        };

        metadata.insert(key, value);
    }

    Ok(metadata)
}

/// Whether `key` can be written as an attribute key
pub(crate) fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '=' | '"' | '{' | '}'))
}

fn is_bare(value: &str) -> bool {
    !value.is_empty()
        && value.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '/' | ':' | '@' | '+' | '-')
        })
}

/// Render one value, quoting when needed
pub(crate) fn render_value(value: &str) -> String {
    if is_bare(value) {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Render ordered pairs as `{ key=value ... }`
pub(crate) fn render_attributes<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let rendered: Vec<String> = pairs
        .into_iter()
        .map(|(key, value)| format!("{key}={}", render_value(value)))
        .collect();
    if rendered.is_empty() {
        String::new()
    } else {
        format!("{{ {} }}", rendered.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Metadata {
        parse_attributes(input).unwrap()
    }

    #[test]
    fn braced_pairs() {
        let m = parse("{ name=foo id=01HEXJ9KWG7BYSFYCNKSRE4JZR }");
        assert_eq!(m.get("name").map(String::as_str), Some("foo"));
        assert_eq!(m.get("id").map(String::as_str), Some("01HEXJ9KWG7BYSFYCNKSRE4JZR"));
    }

    #[test]
    fn braceless_and_flags() {
        let m = parse("name=foo background");
        assert_eq!(m.get("background").map(String::as_str), Some("true"));
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn quoted_values() {
        let m = parse(r#"{ cwd="/my dir" title="say \"hi\" \\o/" }"#);
        assert_eq!(m.get("cwd").map(String::as_str), Some("/my dir"));
        assert_eq!(m.get("title").map(String::as_str), Some(r#"say "hi" \o/"#));
    }

    #[test]
    fn brace_inside_quotes() {
        let m = parse(r#"{ cmd="a}b" }"#);
        assert_eq!(m.get("cmd").map(String::as_str), Some("a}b"));
    }

    #[test]
    fn empty_value() {
        let m = parse("{ name= other=1 }");
        assert_eq!(m.get("name").map(String::as_str), Some(""));
    }

    #[test]
    fn whitespace_only() {
        assert!(parse(" ").is_empty());
        assert!(parse("\t \r").is_empty());
        assert!(parse("").is_empty());
    }

    #[test]
    fn errors() {
        assert_eq!(parse_attributes("{ name=foo").unwrap_err().reason, "unclosed '{'");
        assert_eq!(
            parse_attributes("{ name=foo } extra").unwrap_err(),
            AttributeError::at(13, "trailing text after '}'")
        );
        assert_eq!(
            parse_attributes(r#"{ name="foo }"#).unwrap_err().reason,
            "unclosed '{'"
        );
        assert_eq!(parse_attributes(r#"name="foo"#).unwrap_err().reason, "unterminated quote");
        assert_eq!(parse_attributes("{ =foo }").unwrap_err(), AttributeError::at(2, "empty key"));
    }

    #[test]
    fn info_split() {
        assert_eq!(split_info("sh { name=a }"), ("sh", 2));
        assert_eq!(split_info("sh{name=a}"), ("sh", 2));
        assert_eq!(split_info("{ name=a }"), ("", 0));
        assert_eq!(split_info("name=a"), ("", 0));
        assert_eq!(split_info("  js"), ("js", 4));
        assert_eq!(split_info(""), ("", 0));
    }

    #[test]
    fn rendering() {
        assert_eq!(render_value("foo-bar_1.2"), "foo-bar_1.2");
        assert_eq!(render_value(""), "\"\"");
        assert_eq!(render_value("a b"), "\"a b\"");
        assert_eq!(render_value(r#"q"\"#), r#""q\"\\""#);
        assert_eq!(
            render_attributes([("name", "foo"), ("cwd", "/a b")]),
            r#"{ name=foo cwd="/a b" }"#
        );
        assert_eq!(render_attributes(std::iter::empty()), "");
    }

    #[test]
    fn render_then_parse() {
        let pairs = [("name", "x"), ("title", r#"he said "hi" \ bye"#)];
        let parsed = parse(&render_attributes(pairs));
        assert_eq!(parsed.get("title").map(String::as_str), Some(pairs[1].1));
    }
}
