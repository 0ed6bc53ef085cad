//! Byte offset to line number conversion.

/// Returns the one-based line containing `offset` in `source`.
///
/// Offsets past the end of the document resolve to the last line.
#[must_use]
pub(crate) fn line_at(source: &str, offset: usize) -> u32 {
    let newlines = source
        .bytes()
        .take(offset)
        .filter(|byte| *byte == b'\n')
        .count();
    // Migration files will realistically never exceed u32::MAX lines.
    u32::try_from(newlines.saturating_add(1)).unwrap_or(u32::MAX)
}
