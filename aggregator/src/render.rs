//! Output layout.

use std::io::{self, Write};

use partial_schema_core::SectionKind;

use crate::select::Selection;

/// How a section region is wrapped in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockMode {
    /// Contributions are written back to back.
    None,
    /// Always wrapped in a `type X { … }` block, even with no contributions.
    Always,
    /// Wrapped in a block only when at least one document contributes.
    IfNotEmpty,
}

const REGIONS: [(SectionKind, BlockMode); 4] = [
    (SectionKind::Prologue, BlockMode::None),
    (SectionKind::Query, BlockMode::Always),
    (SectionKind::Mutation, BlockMode::IfNotEmpty),
    (SectionKind::Types, BlockMode::None),
];

/// Writes the aggregated schema for `selection` to `out`.
pub(crate) fn render(
    tool_name: &str,
    selection: &Selection<'_>,
    out: &mut impl Write,
) -> io::Result<()> {
    writeln!(out, "# Schema aggregated by {tool_name}")?;

    for (kind, mode) in REGIONS {
        copy_region(tool_name, selection, kind, mode, out)?;
    }

    let identities: Vec<String> = selection.identities().map(ToString::to_string).collect();
    write!(
        out,
        "\n# End of Schema aggregated from {{{}}} by {tool_name}",
        identities.join(",")
    )
}

fn copy_region(
    tool_name: &str,
    selection: &Selection<'_>,
    kind: SectionKind,
    mode: BlockMode,
    out: &mut impl Write,
) -> io::Result<()> {
    let contributions: Vec<_> = selection
        .documents()
        .iter()
        .filter_map(|doc| doc.section(kind).map(|section| (doc.identity(), section)))
        .collect();

    let block = match mode {
        BlockMode::None => false,
        BlockMode::Always => true,
        BlockMode::IfNotEmpty => !contributions.is_empty(),
    };

    if block {
        writeln!(out, "\ntype {} {{", kind.type_name())?;
    }
    for (identity, section) in contributions {
        writeln!(out, "\n# {tool_name}.source={identity}")?;
        io::copy(&mut section.open()?, out)?;
    }
    if block {
        out.write_all(b"\n}\n")?;
    }
    Ok(())
}
