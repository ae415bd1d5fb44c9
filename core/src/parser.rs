//! Section scanner for the partial text format.
//!
//! A partial is a sequence of header lines (`WORD: description`) each
//! followed by a body that runs up to the next header or the end of input.
//! The scanner makes one buffered pass over the source and records, for each
//! section, the byte range of its body. Bodies are not retained; they are
//! re-read on demand through [`Section::open`](crate::Section::open).

use std::collections::BTreeSet;
use std::io::{BufRead, BufReader, Read};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::SectionKind;
use crate::error::{Result, SyntaxError};

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]+) *:(.*)$").expect("static regex must compile"));

/// A section found by [`scan_sections`], body addressed as `[start, end)`
/// byte offsets into the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScannedSection {
    pub kind: SectionKind,
    pub description: String,
    pub start: u64,
    pub end: u64,
}

struct OpenSection {
    kind: SectionKind,
    description: String,
    start: u64,
}

impl OpenSection {
    fn close(self, end: u64) -> ScannedSection {
        ScannedSection {
            kind: self.kind,
            description: self.description,
            start: self.start,
            end,
        }
    }
}

/// Scans `input` for section headers.
///
/// Text before the first header belongs to no section. Only lines ending
/// with `\n` are candidates for headers; a trailing `\r` is ignored.
pub(crate) fn scan_sections(input: impl Read) -> Result<Vec<ScannedSection>> {
    let mut reader = BufReader::new(input);
    let mut line = String::new();
    let mut offset = 0u64;
    let mut seen = BTreeSet::new();
    let mut current: Option<OpenSection> = None;
    let mut sections = Vec::new();

    loop {
        line.clear();
        let read = reader.read_line(&mut line)?;
        if read == 0 {
            break;
        }
        let line_start = offset;
        offset += read as u64;

        let Some(text) = line.strip_suffix('\n') else {
            continue;
        };
        let text = text.strip_suffix('\r').unwrap_or(text);
        let Some(caps) = HEADER_RE.captures(text) else {
            continue;
        };

        if let Some(open) = current.take() {
            sections.push(open.close(line_start));
        }

        let word = &caps[1];
        let kind: SectionKind = word
            .parse()
            .map_err(|_| SyntaxError::InvalidSectionName(word.to_string()))?;
        if !seen.insert(kind) {
            return Err(SyntaxError::DuplicateSection(kind).into());
        }

        debug!(section = %kind, offset = line_start, "Found section header");
        current = Some(OpenSection {
            kind,
            description: caps[2].trim().to_string(),
            start: offset,
        });
    }

    if let Some(open) = current.take() {
        sections.push(open.close(offset));
    }

    if !seen.contains(&SectionKind::Partial) {
        return Err(SyntaxError::MissingPartialSection.into());
    }

    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PartialError;

    fn scan(text: &str) -> Result<Vec<ScannedSection>> {
        scan_sections(text.as_bytes())
    }

    fn body<'a>(text: &'a str, section: &ScannedSection) -> &'a str {
        &text[section.start as usize..section.end as usize]
    }

    #[test]
    fn test_scan_records_body_ranges() {
        let text = "ignored preamble\nPARTIAL: the partial\nbody one\nQUERY:\nq1\nq2\n";
        let sections = scan(text).unwrap();
        assert_eq!(sections.len(), 2);

        assert_eq!(sections[0].kind, SectionKind::Partial);
        assert_eq!(sections[0].description, "the partial");
        assert_eq!(body(text, &sections[0]), "body one\n");

        assert_eq!(sections[1].kind, SectionKind::Query);
        assert_eq!(sections[1].description, "");
        assert_eq!(body(text, &sections[1]), "q1\nq2\n");
    }

    #[test]
    fn test_spaces_before_colon_are_allowed() {
        let sections = scan("PARTIAL   :  spaced  \n").unwrap();
        assert_eq!(sections[0].description, "spaced");
    }

    #[test]
    fn test_unterminated_last_line_is_body() {
        let text = "PARTIAL: p\nQUERY: not a header";
        let sections = scan(text).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(body(text, &sections[0]), "QUERY: not a header");
    }

    #[test]
    fn test_crlf_headers() {
        let text = "PARTIAL: p\r\nQUERY:\r\nq\r\n";
        let sections = scan(text).unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].description, "p");
        assert_eq!(body(text, &sections[1]), "q\r\n");
    }

    #[test]
    fn test_lowercase_or_indented_words_are_body_text() {
        let text = "PARTIAL: p\nquery: nope\n  QUERY: nope\n";
        let sections = scan(text).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(body(text, &sections[0]), "query: nope\n  QUERY: nope\n");
    }

    #[test]
    fn test_missing_partial_section() {
        let err = scan("").unwrap_err();
        assert!(matches!(
            err.as_syntax(),
            Some(SyntaxError::MissingPartialSection)
        ));

        let err = scan("QUERY: q\n").unwrap_err();
        assert_eq!(err.to_string(), "syntax error: missing required PARTIAL section");
    }

    #[test]
    fn test_invalid_section_name() {
        let err = scan("PARTIAL:test\nREQUIRE:something\n").unwrap_err();
        assert!(err.to_string().contains("invalid section name 'REQUIRE'"));
    }

    #[test]
    fn test_duplicate_section() {
        let err = scan("PARTIAL: p\nQUERY:\na\nQUERY:\nb\n").unwrap_err();
        assert!(matches!(
            err,
            PartialError::Syntax(SyntaxError::DuplicateSection(SectionKind::Query))
        ));
        assert!(err.to_string().contains("duplicate section 'QUERY'"));
    }

    #[test]
    fn test_invalid_utf8_is_io_error() {
        let err = scan_sections(&b"PARTIAL: p\n\xff\xfe\n"[..]).unwrap_err();
        assert!(matches!(err, PartialError::Io(_)));
    }
}
