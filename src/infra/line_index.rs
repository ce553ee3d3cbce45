//! Newline index with LF/CRLF-robust offset → position mapping.
//!
//! Goals
//! - Single pass over bytes to record '\n' positions.
//! - 0-based line/column for `Position` values handed to editors.
//! - Binary search for byte→line mapping.
//! - Whitespace-run helpers used by the edit planner.
//!
//! Notes
//! - A '\r' before '\n' belongs to the line it ends; columns count bytes.
//! - Offsets at '\n' belong to the line the '\n' terminates.

use crate::core::model::Position;

#[derive(Debug, Clone)]
pub struct NewlineIndex
{
    /// Byte positions of every '\n' in the buffer.
    nl_positions: Vec<usize>,
    /// Total byte length of the buffer.
    len: usize,
}

impl NewlineIndex
{
    /// Build an index recording positions of '\n'.
    pub fn build(bytes: &[u8]) -> Self
    {
        let nl_positions = memchr::memchr_iter(b'\n', bytes).collect();
        Self { nl_positions, len: bytes.len() }
    }

    /// Total byte length of the indexed buffer.
    pub fn len(&self) -> usize
    {
        self.len
    }

    pub fn is_empty(&self) -> bool
    {
        self.len == 0
    }

    /// 0-based line containing `offset` (clamped to the buffer).
    pub fn line_of(
        &self,
        offset: usize,
    ) -> usize
    {
        // Number of '\n' strictly before `offset`.
        match self
            .nl_positions
            .binary_search(&offset.min(self.len))
        {
            Ok(pos) | Err(pos) => pos,
        }
    }

    /// Start byte of a 0-based line.
    pub fn line_start(
        &self,
        line: usize,
    ) -> usize
    {
        if line == 0
        {
            return 0;
        }
        self.nl_positions
            .get(line - 1)
            .map_or(self.len, |&nl| nl + 1)
    }

    /// Full position for a byte offset.
    pub fn position(
        &self,
        offset: usize,
    ) -> Position
    {
        let offset = offset.min(self.len);
        let line = self.line_of(offset);
        Position { line, column: offset - self.line_start(line), offset }
    }

    /// Count '\n' in `[from, to)`.
    pub fn newlines_between(
        &self,
        from: usize,
        to: usize,
    ) -> usize
    {
        if to <= from
        {
            return 0;
        }
        self.line_of(to) - self.line_of(from)
    }
}

/// ASCII whitespace as seen between declarations.
pub fn is_blank(b: u8) -> bool
{
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x0b' | b'\x0c')
}

/// Start of the whitespace run that ends at `offset`.
pub fn run_start(
    bytes: &[u8],
    offset: usize,
) -> usize
{
    let mut i = offset.min(bytes.len());
    while i > 0 && is_blank(bytes[i - 1])
    {
        i -= 1;
    }
    i
}

/// End of the whitespace run that starts at `offset`.
pub fn run_end(
    bytes: &[u8],
    offset: usize,
) -> usize
{
    let mut i = offset.min(bytes.len());
    while i < bytes.len() && is_blank(bytes[i])
    {
        i += 1;
    }
    i
}
