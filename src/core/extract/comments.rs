//! Comment scanning between top-level declarations.
//!
//! The gap between two declarations only ever holds whitespace and
//! comments, so a tiny hand scanner is enough here. Anything else found
//! in a gap acts as a barrier: comments before it never attach.

/// Comment flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind
{
    Line,
    Block,
    /// `#!` on the first line
    Shebang,
}

/// A comment found in a gap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawComment
{
    pub start: usize,
    pub end: usize,
    pub kind: CommentKind,
    /// Newlines between the previous item (or gap start) and this comment
    pub newlines_before: usize,
}

impl RawComment
{
    pub fn text<'a>(
        &self,
        src: &'a str,
    ) -> &'a str
    {
        &src[self.start..self.end]
    }

    /// Triple-slash directives and shebangs never attach to a statement.
    pub fn is_directive(
        &self,
        src: &str,
    ) -> bool
    {
        match self.kind
        {
            CommentKind::Shebang => true,
            CommentKind::Line => self
                .text(src)
                .strip_prefix("///")
                .is_some_and(|rest| {
                    rest.trim_start()
                        .starts_with('<')
                }),
            CommentKind::Block => false,
        }
    }
}

/// Comments in one gap plus the newline count after the last one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Gap
{
    pub comments: Vec<RawComment>,
    /// Newlines between the last comment (or gap start) and gap end
    pub newlines_after: usize,
}

impl Gap
{
    /// Newlines between comment `idx` and the next item.
    fn newlines_after_comment(
        &self,
        idx: usize,
    ) -> usize
    {
        self.comments
            .get(idx + 1)
            .map_or(self.newlines_after, |next| next.newlines_before)
    }
}

/// Scan `[from, to)` of `src` for comments.
pub fn scan_gap(
    src: &str,
    from: usize,
    to: usize,
) -> Gap
{
    let bytes = src.as_bytes();
    let mut gap = Gap::default();
    let mut newlines = 0usize;
    let mut i = from;

    while i < to
    {
        let b = bytes[i];
        if b == b'\n'
        {
            newlines += 1;
            i += 1;
            continue;
        }
        if b.is_ascii_whitespace()
        {
            i += 1;
            continue;
        }

        let rest = &bytes[i..to];
        let (kind, end) = if rest.starts_with(b"//")
        {
            (CommentKind::Line, line_end(bytes, i, to))
        }
        else if rest.starts_with(b"/*")
        {
            let close = memchr::memmem::find(&rest[2..], b"*/").map_or(to, |p| i + 2 + p + 2);
            (CommentKind::Block, close)
        }
        else if i == 0 && rest.starts_with(b"#!")
        {
            (CommentKind::Shebang, line_end(bytes, i, to))
        }
        else
        {
            // Stray code: forget everything before it.
            gap.comments
                .clear();
            newlines = 0;
            i = line_end(bytes, i, to);
            continue;
        };

        gap.comments
            .push(RawComment { start: i, end, kind, newlines_before: newlines });
        newlines = 0;
        i = end;
    }

    gap.newlines_after = newlines;
    gap
}

/// End of the current line, excluding "\r\n" / "\n".
fn line_end(
    bytes: &[u8],
    from: usize,
    limit: usize,
) -> usize
{
    let nl = memchr::memchr(b'\n', &bytes[from..limit]).map_or(limit, |p| from + p);
    if nl > from && bytes[nl - 1] == b'\r' { nl - 1 } else { nl }
}

/// Index of the first comment that attaches to the declaration after `gap`.
///
/// Walk backward from the declaration while the distance to the next
/// item is at most one newline; stop at a blank line or a directive.
pub fn attach_point(
    src: &str,
    gap: &Gap,
) -> usize
{
    let mut first = gap
        .comments
        .len();
    for idx in (0..gap
        .comments
        .len())
        .rev()
    {
        let comment = &gap.comments[idx];
        if gap.newlines_after_comment(idx) > 1 || comment.is_directive(src)
        {
            break;
        }
        first = idx;
    }
    first
}

/// Split of the comments in front of the first declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSplit
{
    /// `comments[..attached]` stay global (file banner, directives)
    pub attached: usize,
}

/// Decide which leading comments of the file form its global header.
///
/// A leading block that is followed by a blank line, or that ends at a
/// directive, stays put; only the block directly touching the first
/// declaration moves with it.
pub fn split_file_header(
    src: &str,
    gap: &Gap,
) -> HeaderSplit
{
    HeaderSplit { attached: attach_point(src, gap) }
}

/// Raw trailing comment text after a declaration ending at `end`.
///
/// Only taken when the rest of the line holds nothing but comments that
/// also end on this line.
pub fn trailing_comment(
    src: &str,
    end: usize,
) -> Option<&str>
{
    let bytes = src.as_bytes();
    let eol = line_end(bytes, end, bytes.len());
    let rest = &src[end..eol];
    if rest
        .trim()
        .is_empty()
    {
        return None;
    }

    // Every non-blank byte must belong to a comment closed before `eol`.
    let gap = scan_gap(src, end, eol);
    let covered = gap
        .comments
        .last()
        .is_some_and(|last| last.end <= eol && src[last.end..eol].trim().is_empty());
    let first_ok = gap
        .comments
        .first()
        .is_some_and(|first| src[end..first.start].trim().is_empty());
    let all_closed = gap
        .comments
        .iter()
        .all(|c| c.kind != CommentKind::Block || src[c.start..c.end].ends_with("*/"));

    if covered && first_ok && all_closed && no_code_between(src, &gap)
    {
        Some(rest.trim_end())
    }
    else
    {
        None
    }
}

/// Comments in `gap` are separated by whitespace only.
fn no_code_between(
    src: &str,
    gap: &Gap,
) -> bool
{
    gap.comments
        .windows(2)
        .all(|w| {
            src[w[0].end..w[1].start]
                .trim()
                .is_empty()
        })
}

/// Whether any of `texts` contains the disable marker.
pub fn mentions_marker<'a>(
    mut texts: impl Iterator<Item = &'a str>,
    marker: &str,
) -> bool
{
    !marker.is_empty() && texts.any(|t| t.contains(marker))
}
