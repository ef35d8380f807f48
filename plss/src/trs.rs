// Copyright 2024 Oxide Computer Company

//! Township / Range / Section identifiers (`spec.md` §3, "TRS").

use std::fmt;

/// North/south direction of a township row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ns {
    North,
    South,
}

impl Ns {
    pub fn letter(self) -> char {
        match self {
            Ns::North => 'n',
            Ns::South => 's',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'n' => Some(Ns::North),
            's' => Some(Ns::South),
            _ => None,
        }
    }
}

/// East/west direction of a range column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ew {
    East,
    West,
}

impl Ew {
    pub fn letter(self) -> char {
        match self {
            Ew::East => 'e',
            Ew::West => 'w',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'e' => Some(Ew::East),
            'w' => Some(Ew::West),
            _ => None,
        }
    }
}

/// A township component: well-formed, undefined (`___z`), or error (`XXXz`).
///
/// Exactly one of these three shapes holds at a time -- `spec.md` §3's
/// component invariant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Twp {
    Known { number: u16, ns: Ns },
    Undefined,
    Error,
}

impl Twp {
    pub fn composed(&self) -> String {
        match self {
            Twp::Known { number, ns } => format!("{}{}", number, ns.letter()),
            Twp::Undefined => "___z".to_string(),
            Twp::Error => "XXXz".to_string(),
        }
    }
}

impl fmt::Display for Twp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.composed())
    }
}

/// A range component: well-formed, undefined (`___z`), or error (`XXXz`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Rge {
    Known { number: u16, ew: Ew },
    Undefined,
    Error,
}

impl Rge {
    pub fn composed(&self) -> String {
        match self {
            Rge::Known { number, ew } => format!("{}{}", number, ew.letter()),
            Rge::Undefined => "___z".to_string(),
            Rge::Error => "XXXz".to_string(),
        }
    }
}

impl fmt::Display for Rge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.composed())
    }
}

/// A section component: a zero-padded two digit number, undefined (`__`),
/// or error (`XX`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sec {
    Known(u8),
    Undefined,
    Error,
}

impl Sec {
    pub fn composed(&self) -> String {
        match self {
            Sec::Known(n) => format!("{:02}", n),
            Sec::Undefined => "__".to_string(),
            Sec::Error => "XX".to_string(),
        }
    }
}

impl fmt::Display for Sec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.composed())
    }
}

/// The normalized township/range/section identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Trs {
    pub twp: Twp,
    pub rge: Rge,
    pub sec: Sec,
}

impl Trs {
    pub fn new(twp: Twp, rge: Rge, sec: Sec) -> Self {
        Trs { twp, rge, sec }
    }

    /// The totally-fatal sentinel tract identifier: `XXXzXXXzXX`.
    pub fn error() -> Self {
        Trs { twp: Twp::Error, rge: Rge::Error, sec: Sec::Error }
    }

    /// Concatenated composed form, e.g. `154n97w14`.
    pub fn composed(&self) -> String {
        format!("{}{}{}", self.twp.composed(), self.rge.composed(), self.sec.composed())
    }
}

impl fmt::Display for Trs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.composed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composes_well_formed_trs() {
        let trs = Trs::new(
            Twp::Known { number: 154, ns: Ns::North },
            Rge::Known { number: 97, ew: Ew::West },
            Sec::Known(14),
        );
        assert_eq!(trs.composed(), "154n97w14");
    }

    #[test]
    fn error_sentinel_is_all_x() {
        assert_eq!(Trs::error().composed(), "XXXzXXXzXX");
    }

    #[test]
    fn section_zero_pads() {
        assert_eq!(Sec::Known(3).composed(), "03");
    }
}
