// Copyright 2024 Oxide Computer Company

//! Layout Detector (component C).
//!
//! Classifies the textual ordering of Twp/Rge, Section, and description
//! prose into one of five tags by comparing the byte positions of the
//! first match of each. Detection has no side effects: it never mutates
//! the input and never records flags of its own (the Extractor is the
//! stage that reacts to the layout it's given).

use std::fmt;
use std::str::FromStr;

use crate::token::TokenLibrary;

/// The closed set of layouts `spec.md` §4.C recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Twp/Rge, then Section, then description.
    TrsDesc,
    /// Description, then Section, then Twp/Rge.
    DescStr,
    /// Section, then description, then Twp/Rge.
    SDescTr,
    /// Twp/Rge, then description, then Section.
    TrDescS,
    /// Stopgap: required components missing, or no ordering identifiable.
    CopyAll,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Layout::TrsDesc => "TRS_desc",
            Layout::DescStr => "desc_STR",
            Layout::SDescTr => "S_desc_TR",
            Layout::TrDescS => "TR_desc_S",
            Layout::CopyAll => "copy_all",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Layout {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TRS_desc" => Ok(Layout::TrsDesc),
            "desc_STR" => Ok(Layout::DescStr),
            "S_desc_TR" => Ok(Layout::SDescTr),
            "TR_desc_S" => Ok(Layout::TrDescS),
            "copy_all" => Ok(Layout::CopyAll),
            _ => Err(()),
        }
    }
}

/// The start-of-description boundary is taken to be the first aliquot,
/// lot, or section-adjacent punctuation after the section match; if
/// neither Twp/Rge nor Section is found at all, detection falls back to
/// `CopyAll` directly.
pub fn detect(text: &str) -> Layout {
    let lib = TokenLibrary::global();

    let tr_pos = lib.find_twp_rge(text).map(|m| m.range.start);
    let sec_pos = lib
        .find_section(text)
        .map(|m| m.range.start)
        .or_else(|| lib.find_multi_section(text).map(|m| m.range.start));

    let (tr_pos, sec_pos) = match (tr_pos, sec_pos) {
        (Some(tr), Some(sec)) => (tr, sec),
        _ => return Layout::CopyAll,
    };

    if tr_pos < sec_pos {
        Layout::TrsDesc
    } else {
        // Section comes first in the text; disambiguate desc_STR vs
        // S_desc_TR by whether the description block (the text right
        // after the section match) runs up to the Twp/Rge match or past
        // it. Since tr_pos > sec_pos here by construction, Section always
        // precedes Twp/Rge; the remaining question is whether a
        // description run sits between them (S_desc_TR) or wraps around
        // on both sides (desc_STR, where an earlier desc run preceded the
        // section too).
        let preamble = &text[..sec_pos];
        if preamble.trim().is_empty() {
            Layout::SDescTr
        } else {
            Layout::DescStr
        }
    }
}

/// `spec.md` §4.C also recognizes `TR_desc_S`: Twp/Rge, then description,
/// then Section. This refines `detect`'s two-point ordering with a look at
/// whether prose intervenes between the Twp/Rge match and the section that
/// follows it -- a trailing colon on the section is a signal the Extractor
/// uses to decide what the description block contains, not a layout
/// classification feature, so it plays no part in this decision.
pub fn detect_refined(text: &str) -> Layout {
    let lib = TokenLibrary::global();
    let tr = lib.find_twp_rge(text);
    let sec_pos = lib.find_section(text).map(|m| m.range.start);

    match (tr, sec_pos) {
        (Some(tr), Some(sec_pos)) if tr.range.start < sec_pos => {
            let between = text[tr.range.end..sec_pos].trim();
            if !between.is_empty() {
                Layout::TrDescS
            } else {
                Layout::TrsDesc
            }
        }
        _ => detect(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trs_desc_is_detected() {
        assert_eq!(detect_refined("T154N-R97W Sec 14: NE/4"), Layout::TrsDesc);
    }

    #[test]
    fn s_desc_tr_is_detected() {
        assert_eq!(detect_refined("Sec 14: NE/4, T154N-R97W"), Layout::SDescTr);
    }

    #[test]
    fn missing_components_fall_back_to_copy_all() {
        assert_eq!(detect_refined("the quick brown fox"), Layout::CopyAll);
    }

    #[test]
    fn tr_desc_s_is_detected_even_with_a_trailing_colon_on_the_section() {
        assert_eq!(detect_refined("T154N-R97W NE/4 Sec 14:"), Layout::TrDescS);
    }

    #[test]
    fn layout_round_trips_through_display_and_from_str() {
        for l in [Layout::TrsDesc, Layout::DescStr, Layout::SDescTr, Layout::TrDescS, Layout::CopyAll] {
            let s = l.to_string();
            assert_eq!(s.parse::<Layout>().unwrap(), l);
        }
    }
}
