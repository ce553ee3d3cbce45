//! Segment comparator for module paths and binding names.
//!
//! A rule is an ordered list of segment tokens. Each token claims one or
//! both letter cases, or the six symbols between `Z` and `a`, and the
//! token's position decides the rank of every character it claims.
//! Characters outside `A..=z` keep code-point order on either side of
//! the remapped block.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// Sort rule as written in config: `"none"` or a token list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortRuleConfig {
    Keyword(String),
    Segments(Vec<String>),
}

impl Default for SortRuleConfig {
    fn default() -> Self {
        SortRuleConfig::Segments(vec!["_".into(), "aA".into()])
    }
}

/// One segment token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    /// `az`
    Lower,
    /// `AZ`
    Upper,
    /// `aA`: both cases, lowercase wins ties
    LowerFirst,
    /// `Aa`: both cases, uppercase wins ties
    UpperFirst,
    /// `_`: the six symbols between `Z` and `a`
    Symbols,
}

impl Token {
    fn parse(s: &str) -> Result<Self, FormatError> {
        match s {
            "az" => Ok(Token::Lower),
            "AZ" => Ok(Token::Upper),
            "aA" => Ok(Token::LowerFirst),
            "Aa" => Ok(Token::UpperFirst),
            "_" => Ok(Token::Symbols),
            other => Err(FormatError::InvalidSortRule(other.to_owned())),
        }
    }
}

/// Rank and tie-break mode assigned to one character class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    rank: u32,
    /// Case-folded comparison; `Some(true)` when lowercase wins ties
    folded: Option<bool>,
}

/// Compiled segment rule. Build once per run and share by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparator {
    /// `None` disables the key entirely
    slots: Option<[Slot; 3]>,
}

const LOWER: usize = 0;
const UPPER: usize = 1;
const SYMBOLS: usize = 2;

impl Default for Comparator {
    fn default() -> Self {
        // Default token list is always valid
        Self::from_tokens(&[Token::Symbols, Token::LowerFirst])
    }
}

impl Comparator {
    /// Comparator that leaves everything `Equal`.
    pub fn disabled() -> Self {
        Self { slots: None }
    }

    /// Compile a config rule.
    pub fn from_config(rule: &SortRuleConfig) -> Result<Self, FormatError> {
        match rule {
            SortRuleConfig::Keyword(k) if k == "none" => Ok(Self::disabled()),
            SortRuleConfig::Keyword(k) => Self::from_strs(&[k.as_str()]),
            SortRuleConfig::Segments(list) => {
                let refs: Vec<&str> = list.iter().map(String::as_str).collect();
                Self::from_strs(&refs)
            }
        }
    }

    /// Compile a token list; empty means disabled.
    pub fn from_strs(tokens: &[&str]) -> Result<Self, FormatError> {
        if tokens.is_empty() {
            return Ok(Self::disabled());
        }
        let parsed = tokens
            .iter()
            .map(|t| Token::parse(t))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_tokens(&parsed))
    }

    fn from_tokens(tokens: &[Token]) -> Self {
        let mut slots: [Option<Slot>; 3] = [None; 3];
        let mut rank = 0u32;

        let mut claim = |token: Token, slots: &mut [Option<Slot>; 3]| {
            let (classes, folded): (&[usize], Option<bool>) = match token {
                Token::Lower => (&[LOWER], None),
                Token::Upper => (&[UPPER], None),
                Token::LowerFirst => (&[LOWER, UPPER], Some(true)),
                Token::UpperFirst => (&[LOWER, UPPER], Some(false)),
                Token::Symbols => (&[SYMBOLS], None),
            };
            let open: Vec<usize> = classes.iter().copied().filter(|&c| slots[c].is_none()).collect();
            // Folding only means something when both cases share the rank
            let folded = if open.len() == 2 { folded } else { None };
            for &class in &open {
                slots[class] = Some(Slot { rank, folded });
            }
            if !open.is_empty() {
                rank += 1;
            }
        };

        for &t in tokens {
            claim(t, &mut slots);
        }

        // Complete the rule: symbols first, then missing letters.
        if slots[SYMBOLS].is_none() {
            claim(Token::Symbols, &mut slots);
        }
        match (slots[LOWER].is_some(), slots[UPPER].is_some()) {
            (false, false) => claim(Token::LowerFirst, &mut slots),
            (true, false) => claim(Token::Upper, &mut slots),
            (false, true) => claim(Token::Lower, &mut slots),
            (true, true) => {}
        }

        let fallback = Slot { rank: u32::MAX, folded: None };
        Self {
            slots: Some([
                slots[LOWER].unwrap_or(fallback),
                slots[UPPER].unwrap_or(fallback),
                slots[SYMBOLS].unwrap_or(fallback),
            ]),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.slots.is_some()
    }

    /// Order two strings under this rule.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let Some(slots) = &self.slots else {
            return Ordering::Equal;
        };
        for (x, y) in a.chars().zip(b.chars()) {
            let ord = char_key(slots, x).cmp(&char_key(slots, y));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.chars().count().cmp(&b.chars().count())
    }
}

/// Sort key of one character: (band, rank, folded code, case tie-break).
fn char_key(slots: &[Slot; 3], c: char) -> (u8, u32, u32, u8) {
    let code = c as u32;
    if c < 'A' {
        return (0, 0, code, 0);
    }
    if c > 'z' {
        return (2, 0, code, 0);
    }

    let class = if c.is_ascii_lowercase() {
        LOWER
    } else if c.is_ascii_uppercase() {
        UPPER
    } else {
        SYMBOLS
    };
    let slot = slots[class];

    match slot.folded {
        Some(lower_wins) if class != SYMBOLS => {
            let fold = c.to_ascii_lowercase() as u32;
            let is_lower = class == LOWER;
            let tie = u8::from(is_lower != lower_wins);
            (1, slot.rank, fold, tie)
        }
        _ => (1, slot.rank, code, 0),
    }
}
