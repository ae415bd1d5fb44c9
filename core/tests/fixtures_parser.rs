use std::path::PathBuf;
use std::sync::Arc;

use partial_schema_core::{
    Document, FileSource, Identity, MemorySource, PartialError, SectionKind, SyntaxError, Version,
};
use regex::Regex;

#[test]
fn test_parse_example_fixture() {
    let doc = parse_fixture("example.partial.txt").expect("fixture should parse");
    assert_eq!(doc.identity(), &Identity::new("example.partial", None));
    assert_eq!(doc.sections().count(), 6);

    assert_section(
        &doc,
        SectionKind::Partial,
        Some("Example GraphQL schema partial"),
        r"The contents.*PARTIAL.*PARTIAL.*PARTIAL.*equired section\.",
    );
    assert_section(
        &doc,
        SectionKind::Requires,
        Some("base.scalars, base.schema"),
        "",
    );
    assert_section(
        &doc,
        SectionKind::Prologue,
        Some(""),
        r"The prologue content.*the aggregated schema.*other sections\.",
    );
    assert_section(
        &doc,
        SectionKind::Query,
        Some(""),
        r"The optional query sections of all partials are aggregated in a query \{\} section in the output\.",
    );
    assert_section(
        &doc,
        SectionKind::Mutation,
        Some(""),
        r"The optional mutation sections of all partials are aggregated in a mutation \{\} section in the output\.",
    );
    assert_section(
        &doc,
        SectionKind::Types,
        Some(""),
        r"The types sections.*mutation\s+sections\.",
    );

    let requires: Vec<String> = doc.requires().iter().map(ToString::to_string).collect();
    assert_eq!(requires, ["base.scalars", "base.schema"]);
}

#[test]
fn test_parse_accented_characters() {
    let doc = parse_fixture("utf8.partial.txt").expect("fixture should parse");
    assert_section(
        &doc,
        SectionKind::Partial,
        Some("Example GraphQL schema partial with caract\u{e8}res accentu\u{e9}s"),
        "L'\u{e9}t\u{e9} nous \u{e9}vitons l'\u{e2}tre et pr\u{e9}f\u{e9}rons Chateaun\u{f6}f et les \u{e4}kr\u{e0}s\\.",
    );
    assert_section(&doc, SectionKind::Query, Some("\u{2713}"), "\u{e9}t\u{e9}: String");
}

#[test]
fn test_duplicate_section_fixture() {
    let err = parse_fixture("duplicate.section.partial.txt").unwrap_err();
    assert!(matches!(
        err,
        PartialError::Syntax(SyntaxError::DuplicateSection(SectionKind::Query))
    ));
    assert!(err.to_string().contains("duplicate section 'QUERY'"));
}

#[test]
fn test_missing_partial_section_from_empty_source() {
    let err =
        Document::parse(Identity::EMPTY, Arc::new(MemorySource::new("empty", ""))).unwrap_err();
    assert!(
        err.to_string().contains("missing required PARTIAL section"),
        "unexpected error: {err}"
    );
}

#[test]
fn test_invalid_section_name() {
    let source = MemorySource::new("inline", "PARTIAL:test\nREQUIRE:something\n");
    let err = Document::parse(Identity::EMPTY, Arc::new(source)).unwrap_err();
    assert!(err.to_string().contains("invalid section name 'REQUIRE'"));
}

#[test]
fn test_requires_fixture() {
    let doc = parse_fixture("c.sdl.txt").expect("fixture should parse");
    assert!(doc.section(SectionKind::Requires).is_some());
    let requires: Vec<String> = doc.requires().iter().map(ToString::to_string).collect();
    assert_eq!(requires, ["a.sdl", "b.sdl"]);
}

#[test]
fn test_versioned_fixture_digest() {
    let doc = parse_fixture("versioned-1.0.0.txt").expect("fixture should parse");
    assert_eq!(
        doc.identity(),
        &Identity::new("versioned", Some(Version::new(1, 0, 0)))
    );
    assert_eq!(
        doc.digest(),
        "SHA-256: e0d96e6a2148c86a19f15b294c2fa25aad7161365d933576347269c0538974b8"
    );
    assert!(
        doc.requires()
            .contains(&Identity::new("required", Some(Version::new(1, 0, 0))))
    );
}

#[test]
fn test_missing_file_is_io_error() {
    let err = Document::parse(
        Identity::EMPTY,
        Arc::new(FileSource::new(fixture_path("does-not-exist.txt"))),
    )
    .unwrap_err();
    assert!(matches!(err, PartialError::Io(_)));
}

#[test]
fn test_documents_read_concurrently() {
    let doc = Arc::new(parse_fixture("example.partial.txt").expect("fixture should parse"));
    let expected = doc
        .section(SectionKind::Types)
        .unwrap()
        .read_to_string()
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let doc = Arc::clone(&doc);
            std::thread::spawn(move || {
                (0..10)
                    .map(|_| {
                        doc.section(SectionKind::Types)
                            .unwrap()
                            .read_to_string()
                            .unwrap()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        for content in handle.join().unwrap() {
            assert_eq!(content, expected);
        }
    }
}

fn assert_section(doc: &Document, kind: SectionKind, description: Option<&str>, content_re: &str) {
    let section = doc
        .section(kind)
        .unwrap_or_else(|| panic!("expecting section {kind}"));
    if let Some(description) = description {
        assert_eq!(section.description(), description, "for section {kind}");
    }
    let content = section.read_to_string().unwrap();
    let actual = content.trim();
    let re = Regex::new(&format!(r"(?s)^{content_re}$")).unwrap();
    assert!(
        re.is_match(actual),
        "expecting section {kind} to match {content_re} but was [{actual}]"
    );
}

fn parse_fixture(name: &str) -> partial_schema_core::Result<Document> {
    let path = fixture_path(name);
    Document::parse(Identity::from_path(&path), Arc::new(FileSource::new(path)))
}

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}
