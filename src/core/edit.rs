//! Edit planning: original ranges + rendered text → minimal text edits.
//!
//! Every handled statement becomes a `Piece`: the import block (rendered
//! groups, placed at the first handled import), a rewritten export, or a
//! deletion. Pieces whose surrounding whitespace runs touch form one block,
//! and each block becomes at most one edit.
//!
//! Blank lines
//! - Between surviving pieces: `max(prev.trailing, next.leading)`, at
//!   least one newline. Counts taken from the source are capped at 2.
//! - Import block: 2..=3 newlines before it (none at file start) and
//!   exactly `empty_lines_after_all_imports + 1` after it.
//! - Pure deletions: nothing at file start, the final-newline policy at
//!   EOF, otherwise the larger neighbor run clamped to 1..=3.
//! - A piece that starts its own line is emitted at column 0, so a
//!   multi-line rendering never mixes indented and flush lines.
//! - The planner never reorders anything; it only rewrites blocks.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::model::{Edit, RangeWithBlankLines};
use crate::infra::line_index::{NewlineIndex, run_end, run_start};

/// Line terminator for emitted text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Eol
{
    #[default]
    Lf,
    Crlf,
}

impl Eol
{
    pub fn as_str(self) -> &'static str
    {
        match self
        {
            Eol::Lf => "\n",
            Eol::Crlf => "\r\n",
        }
    }
}

/// Line terminator used by `text`: the style of its first line break.
pub fn detect_eol(text: &str) -> Eol
{
    match memchr::memchr(b'\n', text.as_bytes())
    {
        Some(i) if i > 0 && text.as_bytes()[i - 1] == b'\r' => Eol::Crlf,
        _ => Eol::Lf,
    }
}

/// What a piece stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind
{
    /// The rendered import block
    Imports,
    /// Any other handled statement
    Statement,
}

/// One original range and what replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece
{
    pub range: RangeWithBlankLines,
    /// `None` deletes the range
    pub text: Option<String>,
    pub kind: PieceKind,
}

impl Piece
{
    pub fn imports(
        range: RangeWithBlankLines,
        text: Option<String>,
    ) -> Self
    {
        Self { range, text, kind: PieceKind::Imports }
    }

    pub fn statement(
        range: RangeWithBlankLines,
        text: Option<String>,
    ) -> Self
    {
        Self { range, text, kind: PieceKind::Statement }
    }

    fn is_imports(&self) -> bool
    {
        self.kind == PieceKind::Imports
    }

    fn start(&self) -> usize
    {
        self.range
            .full_start
            .offset
    }

    fn end(&self) -> usize
    {
        self.range
            .full_end
            .offset
    }
}

/// Blank-line settings that come from config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlankLinePolicy
{
    /// Newlines after the import block (`empty_lines_after_all_imports + 1`)
    pub after_imports: usize,
    /// `Some(true)`: end with one newline, `Some(false)`: none, `None`: preserve
    pub final_newline: Option<bool>,
    pub eol: Eol,
}

impl Default for BlankLinePolicy
{
    fn default() -> Self
    {
        Self { after_imports: 2, final_newline: None, eol: Eol::Lf }
    }
}

/// Pieces whose whitespace runs touch.
#[derive(Debug)]
struct Block
{
    lo: usize,
    hi: usize,
    pieces: Vec<Piece>,
}

/// Turns pieces into edits for one source buffer.
pub struct EditPlanner<'a>
{
    src: &'a str,
    index: &'a NewlineIndex,
    policy: BlankLinePolicy,
}

impl<'a> EditPlanner<'a>
{
    pub fn new(
        src: &'a str,
        index: &'a NewlineIndex,
        policy: BlankLinePolicy,
    ) -> Self
    {
        Self { src, index, policy }
    }

    /// Plan edits in ascending order; no-op edits are dropped.
    pub fn plan(
        &self,
        mut pieces: Vec<Piece>,
    ) -> Vec<Edit>
    {
        let bytes = self
            .src
            .as_bytes();
        // An insertion point can share its offset with a statement: imports go first
        pieces.sort_by_key(|p| (p.start(), !p.is_imports()));

        let mut blocks: Vec<Block> = Vec::new();
        for p in pieces
        {
            let lo = run_start(bytes, p.start());
            let hi = run_end(bytes, p.end());
            match blocks.last_mut()
            {
                Some(b) if lo <= b.hi =>
                {
                    b.hi = b
                        .hi
                        .max(hi);
                    b.pieces
                        .push(p);
                }
                _ => blocks.push(Block { lo, hi, pieces: vec![p] }),
            }
        }

        blocks
            .iter()
            .filter_map(|b| self.render_block(b))
            .collect()
    }

    fn render_block(
        &self,
        b: &Block,
    ) -> Option<Edit>
    {
        let (first, last) = match (
            b.pieces
                .first(),
            b.pieces
                .last(),
        )
        {
            (Some(f), Some(l)) => (f, l),
            _ => return None,
        };
        let src = self.src;
        let lead_run = &src[b.lo..first.start()];
        let trail_run = &src[last.end()..b.hi];
        let at_start = b.lo == 0;
        let at_eof = b.hi == src.len();
        let lead_nl = newlines(lead_run);
        let trail_nl = newlines(trail_run);

        // Indentation after the last newline stays outside the block.
        let end = match trail_run.rfind('\n')
        {
            Some(i) if !at_eof => last.end() + i + 1,
            _ => b.hi,
        };

        let survivors: Vec<(&Piece, &str)> = b
            .pieces
            .iter()
            .filter_map(|p| {
                p.text
                    .as_deref()
                    .map(|t| (p, t))
            })
            .collect();

        let mut out = String::new();
        match (survivors.first(), survivors.last())
        {
            (Some(&(head, _)), Some(&(tail, _))) =>
            {
                // Leading part
                if !at_start
                {
                    if head.is_imports()
                    {
                        push_newlines(&mut out, lead_nl.clamp(2, 3));
                    }
                    else if lead_nl == 0
                    {
                        out.push_str(lead_run);
                    }
                    else
                    {
                        push_newlines(&mut out, lead_nl.clamp(1, 3));
                    }
                }

                // Body
                for (i, &(p, text)) in survivors
                    .iter()
                    .enumerate()
                {
                    if i > 0
                    {
                        let (prev, _) = survivors[i - 1];
                        let n = self
                            .trailing_requirement(prev)
                            .max(leading_requirement(p))
                            .max(1);
                        push_newlines(&mut out, n);
                    }
                    out.push_str(text);
                }

                // Trailing part
                if at_eof
                {
                    push_newlines(&mut out, self.final_newlines(trail_nl));
                }
                else if tail.is_imports()
                {
                    push_newlines(&mut out, self.policy.after_imports);
                }
                else if trail_nl == 0
                {
                    out.push_str(trail_run);
                }
                else
                {
                    push_newlines(&mut out, trail_nl.clamp(1, 3));
                }
            }
            _ =>
            {
                // Pure deletion: only the separator survives
                if at_start
                {
                    // nothing before the next statement
                }
                else if at_eof
                {
                    push_newlines(&mut out, self.final_newlines(trail_nl));
                }
                else if lead_nl == 0 && trail_nl == 0
                {
                    out.push_str(lead_run);
                }
                else
                {
                    push_newlines(&mut out, lead_nl.max(trail_nl).clamp(1, 3));
                }
            }
        }

        let out = self.with_eol(&out);
        let original = &src[b.lo..end];
        if out == original
        {
            trace!(start = b.lo, end, "block already formatted");
            return None;
        }
        Some(Edit::new(
            self.index
                .position(b.lo),
            self.index
                .position(end),
            out,
        ))
    }

    fn trailing_requirement(
        &self,
        p: &Piece,
    ) -> usize
    {
        if p.is_imports()
        {
            self.policy
                .after_imports
        }
        else
        {
            p.range
                .trailing_new_lines
                .min(2)
        }
    }

    fn final_newlines(
        &self,
        original: usize,
    ) -> usize
    {
        match self
            .policy
            .final_newline
        {
            Some(true) => 1,
            Some(false) => 0,
            None => original.min(1),
        }
    }

    /// Normalize to "\n", then emit the configured terminator.
    fn with_eol(
        &self,
        text: &str,
    ) -> String
    {
        let lf = text.replace("\r\n", "\n");
        match self.policy.eol
        {
            Eol::Lf => lf,
            Eol::Crlf => lf.replace('\n', "\r\n"),
        }
    }
}

fn leading_requirement(p: &Piece) -> usize
{
    if p.is_imports()
    {
        2
    }
    else
    {
        p.range
            .leading_new_lines
            .min(2)
    }
}

fn newlines(s: &str) -> usize
{
    memchr::memchr_iter(b'\n', s.as_bytes()).count()
}

fn push_newlines(
    out: &mut String,
    n: usize,
)
{
    out.extend(std::iter::repeat_n('\n', n));
}

/// Apply non-overlapping edits to `text`.
pub fn apply_edits(
    text: &str,
    edits: &[Edit],
) -> String
{
    let mut sorted: Vec<&Edit> = edits
        .iter()
        .collect();
    sorted.sort_by_key(|e| {
        std::cmp::Reverse(
            e.range
                .start
                .offset,
        )
    });

    let mut out = text.to_owned();
    for e in sorted
    {
        let start = e
            .range
            .start
            .offset;
        let end = e
            .range
            .end
            .offset;
        out.replace_range(
            start..end,
            e.new_text
                .as_deref()
                .unwrap_or(""),
        );
    }
    out
}
