//! Frontmatter extraction
//!
//! A document has frontmatter when its first line is `---` and a later line
//! is `---`. The lines between are a YAML mapping. Without a closing line
//! the leading `---` is ordinary markdown (a thematic break).

use crate::error::ParseError;
use mdnb_document::Frontmatter;

/// Fence line opening and closing a frontmatter block
pub(crate) const DELIMITER: &str = "---";

/// Split frontmatter off the source
///
/// Returns the frontmatter (default when absent) and the byte offset where
/// the markdown body starts.
pub(crate) fn split_frontmatter(source: &str) -> Result<(Frontmatter, usize), ParseError> {
    let mut lines = line_spans(source);
    let Some((_, first)) = lines.next() else {
        return Ok((Frontmatter::default(), 0));
    };
    if !is_delimiter(first) {
        return Ok((Frontmatter::default(), 0));
    }

    let yaml_start = first.len();
    for (start, line) in lines {
        if is_delimiter(line) {
            let frontmatter = parse_yaml(&source[yaml_start..start], yaml_start)?;
            return Ok((frontmatter, start + line.len()));
        }
    }

    Ok((Frontmatter::default(), 0))
}

fn parse_yaml(yaml: &str, offset: usize) -> Result<Frontmatter, ParseError> {
    if yaml.trim().is_empty() {
        return Ok(Frontmatter::default());
    }
    serde_yaml::from_str(yaml).map_err(|e| {
        let at = e.location().map_or(offset, |l| offset + l.index());
        ParseError::frontmatter(at, e.to_string())
    })
}

/// Render frontmatter as a delimited block without trailing newline
pub(crate) fn render_frontmatter(frontmatter: &Frontmatter) -> Result<String, serde_yaml::Error> {
    let yaml = serde_yaml::to_string(frontmatter)?;
    Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}"))
}

fn is_delimiter(line: &str) -> bool {
    strip_eol(line).trim_end() == DELIMITER
}

/// Lines with their start offsets, line terminators included
pub(crate) fn line_spans(source: &str) -> impl Iterator<Item = (usize, &str)> {
    source.split_inclusive('\n').scan(0usize, |offset, line| {
        let start = *offset;
        *offset += line.len();
        Some((start, line))
    })
}

/// Drop a trailing `\n` or `\r\n`
pub(crate) fn strip_eol(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_frontmatter() {
        let (fm, body) = split_frontmatter("# Title\n").unwrap();
        assert!(fm.is_empty());
        assert_eq!(body, 0);
    }

    #[test]
    fn frontmatter_with_identity() {
        let src = "---\nshell: bash\nrunme:\n  id: 01HEXJ9KWG7BYSFYCNKSRE4JZR\n  version: v2.1\n\
                   ---\n\n# Hi\n";
        let (fm, body) = split_frontmatter(src).unwrap();
        assert_eq!(fm.shell.as_deref(), Some("bash"));
        assert_eq!(fm.document_id(), Some("01HEXJ9KWG7BYSFYCNKSRE4JZR"));
        assert_eq!(&src[body..], "\n# Hi\n");
    }

    #[test]
    fn unclosed_block_is_markdown() {
        let (fm, body) = split_frontmatter("---\nnot: closed\n").unwrap();
        assert!(fm.is_empty());
        assert_eq!(body, 0);
    }

    #[test]
    fn empty_block() {
        let (fm, body) = split_frontmatter("---\n---\ntext").unwrap();
        assert!(fm.is_empty());
        assert_eq!(body, 8);
    }

    #[test]
    fn closing_line_at_eof() {
        let (fm, body) = split_frontmatter("---\ncwd: /tmp\n---").unwrap();
        assert_eq!(fm.cwd.as_deref(), Some("/tmp"));
        assert_eq!(body, 17);
    }

    #[test]
    fn invalid_yaml_reports_offset() {
        let err = split_frontmatter("---\n- a\n- b\n---\n").unwrap_err();
        assert!(matches!(err, ParseError::Frontmatter { .. }));
        assert!(err.offset() >= 4);
    }

    #[test]
    fn mistyped_values_do_not_fail() {
        let src = "---\nskipPrompts: \"true\"\nterminalRows: wide\n---\n\n# Hi\n";
        let (fm, body) = split_frontmatter(src).unwrap();
        assert!(fm.skip_prompts);
        assert_eq!(fm.terminal_rows, None);
        assert!(fm.extra.contains_key("terminalRows"));
        assert_eq!(&src[body..], "\n# Hi\n");
    }

    #[test]
    fn malformed_yaml_still_fails() {
        let err = split_frontmatter("---\nshell: [bash\n---\n").unwrap_err();
        assert!(matches!(err, ParseError::Frontmatter { .. }));
    }

    #[test]
    fn crlf_delimiters() {
        let (fm, _) = split_frontmatter("---\r\ncategory: ops\r\n---\r\nbody").unwrap();
        assert_eq!(fm.category.as_deref(), Some("ops"));
    }

    #[test]
    fn unknown_keys_are_kept() {
        let (fm, _) = split_frontmatter("---\nowner: ops\n---\n").unwrap();
        let rendered = render_frontmatter(&fm).unwrap();
        assert_eq!(rendered, "---\nowner: ops\n---");
    }
}
