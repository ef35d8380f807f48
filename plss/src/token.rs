// Copyright 2024 Oxide Computer Company

//! Token Library (component A).
//!
//! Precompiled matchers for Twp/Rge, Section (including multi-section
//! enumerations and ranges), aliquot/lot text, and assorted noise words.
//! Matchers only ever read the input and return byte ranges plus a
//! canonical tag -- they never mutate the text they scan.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use crate::trs::{Ew, Ns};

/// The closed set of lexical categories the library recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    TwpRge,
    Section,
    MultiSection,
    AliquotQuarter,
    AliquotHalf,
    AliquotAll,
    Lot,
    Noise,
}

/// A Twp/Rge match: the parsed numbers, directions (`None` when the text
/// omitted a direction letter -- the Preprocessor fills that in later),
/// and the byte span consumed in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwpRgeMatch {
    pub twp_number: u16,
    pub twp_ns: Option<Ns>,
    pub rge_number: u16,
    pub rge_ew: Option<Ew>,
    pub range: Range<usize>,
}

/// A single-section match, distinguishing whether a trailing colon was
/// present -- the Extractor uses that signal directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMatch {
    pub number: u8,
    pub has_colon: bool,
    pub range: Range<usize>,
}

/// A multi-section enumeration ("Sections 14, 15 and 16") or range
/// ("Sections 14 - 17").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiSectionMatch {
    pub numbers: Vec<u8>,
    pub is_range: bool,
    pub has_colon: bool,
    pub range: Range<usize>,
}

/// An aliquot quarter match: `NE`, `NE/4`, `NE4`, `NE¼`, "Northeast
/// Quarter", etc. `explicit` is false for a bare two-letter token, which
/// only counts as a quarter when `clean_qq` admits it (§4.F.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuarterMatch {
    pub quarter: Quarter,
    pub explicit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quarter {
    Ne,
    Nw,
    Se,
    Sw,
}

impl Quarter {
    pub fn label(self) -> &'static str {
        match self {
            Quarter::Ne => "NE",
            Quarter::Nw => "NW",
            Quarter::Se => "SE",
            Quarter::Sw => "SW",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Half {
    N,
    S,
    E,
    W,
}

impl Half {
    pub fn label(self) -> &'static str {
        match self {
            Half::N => "N2",
            Half::S => "S2",
            Half::E => "E2",
            Half::W => "W2",
        }
    }
}

/// A lot reference, possibly a range ("Lots 1 - 3"), with optional
/// parenthetical acreage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotMatch {
    pub numbers: Vec<u16>,
    pub acres: Option<f64>,
    pub range: Range<usize>,
}

pub struct TokenLibrary {
    twp_rge: Regex,
    section: Regex,
    multi_section: Regex,
    quarter: Regex,
    half: Regex,
    all: Regex,
    lot: Regex,
    noise: Regex,
    standalone_rge: Regex,
    standalone_twp: Regex,
}

static LIBRARY: OnceLock<TokenLibrary> = OnceLock::new();

impl TokenLibrary {
    /// Construct the library once per process and hand out a shared
    /// read-only reference on every subsequent call -- matcher
    /// construction is never on the hot path (`spec.md` §9).
    pub fn global() -> &'static TokenLibrary {
        LIBRARY.get_or_init(TokenLibrary::build)
    }

    fn build() -> Self {
        TokenLibrary {
            twp_rge: Regex::new(
                r"(?i)T(?:ownship)?\.?\s*-?\s*(?P<twpnum>\d{1,3})\s*-?\s*(?P<twpdir>N(?:orth)?|S(?:outh)?)?\.?\s*[-,]?\s*R(?:ange)?\.?\s*-?\s*(?P<rgenum>\d{1,3})\s*-?\s*(?P<rgedir>E(?:ast)?|W(?:est)?)?\.?",
            )
            .unwrap(),
            section: Regex::new(
                r"(?i)(?:Sections?|Secs?\.?|§)\s*(?P<secnum>\d{1,2})\s*(?P<colon>:)?",
            )
            .unwrap(),
            multi_section: Regex::new(
                r"(?i)Sections?\s*(?P<list>[\d,\sand&–—-]*\d{1,2})\s*(?P<colon>:)?",
            )
            .unwrap(),
            quarter: Regex::new(
                r"(?i)\b(?P<q>NE|NW|SE|SW)(?:\s*/\s*4|\s*4|\s*¼)?\b|\b(?P<word>North\s*east|North\s*west|South\s*east|South\s*west)\s*Quarter\b",
            )
            .unwrap(),
            half: Regex::new(
                r"(?i)\b(?P<h>[NSEW])\s*/\s*2\b|\b(?P<hw>North|South|East|West)\s*Half\b",
            )
            .unwrap(),
            all: Regex::new(r"(?i)\bALL\b").unwrap(),
            lot: Regex::new(
                r"(?i)\bLots?\.?\s*(?P<list>[\d,\sand-]*\d{1,3})\s*(?:\(\s*(?P<acres>[\d.]+)\s*\))?",
            )
            .unwrap(),
            noise: Regex::new(r"(?i)\b(except|insofar\s+as|including)\b").unwrap(),
            standalone_rge: Regex::new(
                r"(?i)R(?:ange)?\.?\s*-?\s*(?P<num>\d{1,3})\s*-?\s*(?P<dir>E(?:ast)?|W(?:est)?)?\b",
            )
            .unwrap(),
            standalone_twp: Regex::new(
                r"(?i)T(?:ownship)?\.?\s*-?\s*(?P<num>\d{1,3})\s*-?\s*(?P<dir>N(?:orth)?|S(?:outh)?)?\b",
            )
            .unwrap(),
        }
    }

    pub fn find_twp_rge(&self, text: &str) -> Option<TwpRgeMatch> {
        let caps = self.twp_rge.captures(text)?;
        let m = caps.get(0)?;
        let twp_number = caps.name("twpnum")?.as_str().parse().ok()?;
        let rge_number = caps.name("rgenum")?.as_str().parse().ok()?;
        let twp_ns = caps.name("twpdir").and_then(|d| Ns::from_letter(d.as_str().chars().next()?));
        let rge_ew = caps.name("rgedir").and_then(|d| Ew::from_letter(d.as_str().chars().next()?));
        Some(TwpRgeMatch { twp_number, twp_ns, rge_number, rge_ew, range: m.start()..m.end() })
    }

    /// All non-overlapping Twp/Rge matches in the text, in source order.
    pub fn find_all_twp_rge(&self, text: &str) -> Vec<TwpRgeMatch> {
        self.twp_rge
            .captures_iter(text)
            .filter_map(|caps| {
                let m = caps.get(0)?;
                let twp_number = caps.name("twpnum")?.as_str().parse().ok()?;
                let rge_number = caps.name("rgenum")?.as_str().parse().ok()?;
                let twp_ns = caps
                    .name("twpdir")
                    .and_then(|d| Ns::from_letter(d.as_str().chars().next()?));
                let rge_ew = caps
                    .name("rgedir")
                    .and_then(|d| Ew::from_letter(d.as_str().chars().next()?));
                Some(TwpRgeMatch { twp_number, twp_ns, rge_number, rge_ew, range: m.start()..m.end() })
            })
            .collect()
    }

    /// A standalone Range match with no preceding Twp, e.g. `-R97W`. Used
    /// only for partial recovery of a fatally malformed description
    /// (`spec.md` §7's `XXXz97w14`-style sentinel).
    pub fn find_standalone_rge(&self, text: &str) -> Option<(u16, Option<Ew>, Range<usize>)> {
        let caps = self.standalone_rge.captures(text)?;
        let m = caps.get(0)?;
        let number = caps.name("num")?.as_str().parse().ok()?;
        let ew = caps.name("dir").and_then(|d| Ew::from_letter(d.as_str().chars().next()?));
        Some((number, ew, m.start()..m.end()))
    }

    /// Standalone Township match with no following Range, for the same
    /// partial-recovery purpose.
    pub fn find_standalone_twp(&self, text: &str) -> Option<(u16, Option<Ns>, Range<usize>)> {
        let caps = self.standalone_twp.captures(text)?;
        let m = caps.get(0)?;
        let number = caps.name("num")?.as_str().parse().ok()?;
        let ns = caps.name("dir").and_then(|d| Ns::from_letter(d.as_str().chars().next()?));
        Some((number, ns, m.start()..m.end()))
    }

    /// A single `Section N[:]` match, not counting enumerations or ranges
    /// (those are recognized by `find_multi_section` instead).
    pub fn find_section(&self, text: &str) -> Option<SectionMatch> {
        for caps in self.section.captures_iter(text) {
            let m = caps.get(0)?;
            let digits = caps.name("secnum")?.as_str();
            let number: u8 = digits.parse().ok()?;
            if number == 0 || number > 36 {
                continue;
            }
            let has_colon = caps.name("colon").is_some();
            return Some(SectionMatch { number, has_colon, range: m.start()..m.end() });
        }
        None
    }

    /// A multi-section enumeration or range, e.g. "Sections 14, 15 and 16"
    /// or "Sections 9 - 3". Returns `None` if the match degenerates to a
    /// single section (in which case `find_section` applies instead).
    pub fn find_multi_section(&self, text: &str) -> Option<MultiSectionMatch> {
        let caps = self.multi_section.captures(text)?;
        let m = caps.get(0)?;
        let list_text = caps.name("list")?.as_str();
        let has_colon = caps.name("colon").is_some();

        let is_range = list_text.contains('-') || list_text.contains('–') || list_text.contains('—');
        let numbers: Vec<u8> = if is_range {
            let parts: Vec<&str> = list_text
                .split(|c: char| c == '-' || c == '–' || c == '—')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            if parts.len() != 2 {
                return None;
            }
            let from: u8 = parts[0].parse().ok()?;
            let to: u8 = parts[1].parse().ok()?;
            section_range_inclusive(from, to)
        } else {
            list_text
                .replace("and", ",")
                .replace('&', ",")
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|s| s.parse().ok())
                .collect()
        };

        if numbers.len() < 2 {
            return None;
        }

        Some(MultiSectionMatch { numbers, is_range, has_colon, range: m.start()..m.end() })
    }

    pub fn find_quarter(&self, text: &str) -> Option<(QuarterMatch, Range<usize>)> {
        let caps = self.quarter.captures(text)?;
        let m = caps.get(0)?;
        if let Some(q) = caps.name("q") {
            let quarter = parse_quarter_letters(q.as_str())?;
            let explicit = m.as_str().len() > q.as_str().len();
            return Some((QuarterMatch { quarter, explicit }, m.start()..m.end()));
        }
        if let Some(w) = caps.name("word") {
            let quarter = parse_quarter_word(w.as_str())?;
            return Some((QuarterMatch { quarter, explicit: true }, m.start()..m.end()));
        }
        None
    }

    pub fn find_half(&self, text: &str) -> Option<(Half, Range<usize>)> {
        let caps = self.half.captures(text)?;
        let m = caps.get(0)?;
        if let Some(h) = caps.name("h") {
            let half = parse_half_letter(h.as_str().chars().next()?)?;
            return Some((half, m.start()..m.end()));
        }
        if let Some(hw) = caps.name("hw") {
            let half = parse_half_word(hw.as_str())?;
            return Some((half, m.start()..m.end()));
        }
        None
    }

    pub fn find_all(&self, text: &str) -> Option<Range<usize>> {
        self.all.find(text).map(|m| m.start()..m.end())
    }

    pub fn find_lot(&self, text: &str) -> Option<LotMatch> {
        let caps = self.lot.captures(text)?;
        let m = caps.get(0)?;
        let list_text = caps.name("list")?.as_str();
        let acres = caps.name("acres").and_then(|a| a.as_str().parse().ok());

        let numbers: Vec<u16> = if list_text.contains('-') {
            let parts: Vec<&str> = list_text.split('-').map(str::trim).collect();
            if parts.len() != 2 {
                return None;
            }
            let from: u16 = parts[0].parse().ok()?;
            let to: u16 = parts[1].parse().ok()?;
            if from <= to { (from..=to).collect() } else { (to..=from).rev().collect() }
        } else {
            list_text
                .replace("and", ",")
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|s| s.parse().ok())
                .collect()
        };

        if numbers.is_empty() {
            return None;
        }

        Some(LotMatch { numbers, acres, range: m.start()..m.end() })
    }

    pub fn find_noise(&self, text: &str) -> Vec<(String, Range<usize>)> {
        self.noise
            .find_iter(text)
            .map(|m| (m.as_str().to_lowercase(), m.start()..m.end()))
            .collect()
    }
}

fn section_range_inclusive(from: u8, to: u8) -> Vec<u8> {
    if from <= to {
        (from..=to).collect()
    } else {
        (to..=from).rev().collect()
    }
}

fn parse_quarter_letters(s: &str) -> Option<Quarter> {
    match s.to_uppercase().as_str() {
        "NE" => Some(Quarter::Ne),
        "NW" => Some(Quarter::Nw),
        "SE" => Some(Quarter::Se),
        "SW" => Some(Quarter::Sw),
        _ => None,
    }
}

fn parse_quarter_word(s: &str) -> Option<Quarter> {
    let normalized: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    match normalized.to_lowercase().as_str() {
        "northeast" => Some(Quarter::Ne),
        "northwest" => Some(Quarter::Nw),
        "southeast" => Some(Quarter::Se),
        "southwest" => Some(Quarter::Sw),
        _ => None,
    }
}

fn parse_half_letter(c: char) -> Option<Half> {
    match c.to_ascii_uppercase() {
        'N' => Some(Half::N),
        'S' => Some(Half::S),
        'E' => Some(Half::E),
        'W' => Some(Half::W),
        _ => None,
    }
}

fn parse_half_word(s: &str) -> Option<Half> {
    match s.to_lowercase().as_str() {
        "north" => Some(Half::N),
        "south" => Some(Half::S),
        "east" => Some(Half::E),
        "west" => Some(Half::W),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_compact_twp_rge() {
        let lib = TokenLibrary::global();
        let m = lib.find_twp_rge("T154N-R97W Sec 14").unwrap();
        assert_eq!(m.twp_number, 154);
        assert_eq!(m.twp_ns, Some(Ns::North));
        assert_eq!(m.rge_number, 97);
        assert_eq!(m.rge_ew, Some(Ew::West));
    }

    #[test]
    fn matches_verbose_twp_rge() {
        let lib = TokenLibrary::global();
        let m = lib.find_twp_rge("Township 154 North, Range 97 West").unwrap();
        assert_eq!(m.twp_number, 154);
        assert_eq!(m.rge_number, 97);
    }

    #[test]
    fn missing_direction_is_none() {
        let lib = TokenLibrary::global();
        let m = lib.find_twp_rge("-R97W Sec 14").unwrap();
        assert_eq!(m.twp_ns, None);
        assert_eq!(m.rge_ew, Some(Ew::West));
    }

    #[test]
    fn section_with_colon() {
        let lib = TokenLibrary::global();
        let m = lib.find_section("Sec 14: NE/4").unwrap();
        assert_eq!(m.number, 14);
        assert!(m.has_colon);
    }

    #[test]
    fn multi_section_range_honors_direction() {
        let lib = TokenLibrary::global();
        let m = lib.find_multi_section("Sections 9 - 3: X").unwrap();
        assert_eq!(m.numbers, vec![9, 8, 7, 6, 5, 4, 3]);
        assert!(m.is_range);
    }

    #[test]
    fn multi_section_enumeration() {
        let lib = TokenLibrary::global();
        let m = lib.find_multi_section("Sections 14, 15 and 16").unwrap();
        assert_eq!(m.numbers, vec![14, 15, 16]);
        assert!(!m.is_range);
    }

    #[test]
    fn quarter_bare_is_inexplicit() {
        let lib = TokenLibrary::global();
        let (m, _) = lib.find_quarter("NE of Section 14").unwrap();
        assert_eq!(m.quarter, Quarter::Ne);
        assert!(!m.explicit);
    }

    #[test]
    fn quarter_with_slash_is_explicit() {
        let lib = TokenLibrary::global();
        let (m, _) = lib.find_quarter("NE/4 of Section 14").unwrap();
        assert!(m.explicit);
    }

    #[test]
    fn lot_range_expands() {
        let lib = TokenLibrary::global();
        let m = lib.find_lot("Lots 1 - 3").unwrap();
        assert_eq!(m.numbers, vec![1, 2, 3]);
    }

    #[test]
    fn lot_acreage_is_parsed() {
        let lib = TokenLibrary::global();
        let m = lib.find_lot("Lot 1(38.29)").unwrap();
        assert_eq!(m.numbers, vec![1]);
        assert_eq!(m.acres, Some(38.29));
    }

    #[test]
    fn standalone_rge_recovers_from_missing_twp() {
        let lib = TokenLibrary::global();
        let (num, ew, _) = lib.find_standalone_rge("-R97W Sec 14: NE/4").unwrap();
        assert_eq!(num, 97);
        assert_eq!(ew, Some(Ew::West));
    }

    #[test]
    fn finds_noise_words() {
        let lib = TokenLibrary::global();
        let noise = lib.find_noise("NE/4, except the north 10 acres");
        assert_eq!(noise[0].0, "except");
    }
}
