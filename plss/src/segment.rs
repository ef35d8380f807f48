// Copyright 2024 Oxide Computer Company

//! Segmenter (component D, optional).
//!
//! Splits a preprocessed description at every second and subsequent
//! Twp/Rge occurrence so that a description whose layout changes between
//! distinct Twp/Rge blocks can be parsed piecewise, each segment
//! reclassified independently by the Layout Detector.

use crate::flag::FlagStore;
use crate::layout::{self, Layout};
use crate::token::TokenLibrary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub layout: Layout,
}

/// Split `text` into layout-homogeneous segments. A single Twp/Rge region
/// is never split internally: if its own layout changes mid-region (the
/// documented known limitation), the offending tail is dropped and
/// `layout_change_in_segment` is raised on `flags` rather than guessed at
/// (`SPEC_FULL.md` §9, Open Question 2).
pub fn split(text: &str, flags: &mut FlagStore) -> Vec<Segment> {
    let lib = TokenLibrary::global();
    let tr_matches = lib.find_all_twp_rge(text);

    if tr_matches.len() <= 1 {
        return vec![Segment { text: text.to_string(), layout: layout::detect_refined(text) }];
    }

    // Split at every *second and subsequent* Twp/Rge occurrence (`spec.md`
    // §4.D): the first occurrence stays bundled with whatever precedes it,
    // since a trailing-TR layout (e.g. `S_desc_TR`) has its own Twp/Rge
    // match at the end of its governed span, not the start.
    let mut boundaries: Vec<usize> = vec![0];
    boundaries.extend(tr_matches[1..].iter().map(|m| m.range.start));
    boundaries.push(text.len());

    let mut segments = Vec::new();
    for window in boundaries.windows(2) {
        let (start, end) = (window[0], window[1]);
        let chunk = text[start..end].trim();
        if chunk.is_empty() {
            continue;
        }

        if has_internal_layout_change(chunk) {
            flags.error(
                "layout_change_in_segment",
                format!("layout changes within a single Twp/Rge region: {:?}", chunk),
            );
            // keep only the leading, unambiguous part of the region.
            let truncated = leading_consistent_prefix(chunk);
            segments.push(Segment { text: truncated.to_string(), layout: layout::detect_refined(truncated) });
            continue;
        }

        segments.push(Segment { text: chunk.to_string(), layout: layout::detect_refined(chunk) });
    }

    segments
}

/// A region has an internal layout change when it contains more than one
/// `Section` match and the colon-adjacency of those matches disagrees
/// (one is immediately followed by descriptive prose, another is not),
/// which is the symptom `spec.md` §4.D names explicitly.
fn has_internal_layout_change(chunk: &str) -> bool {
    let lib = TokenLibrary::global();
    let mut offset = 0;
    let mut colon_seen: Option<bool> = None;

    while let Some(m) = lib.find_section(&chunk[offset..]) {
        match colon_seen {
            None => colon_seen = Some(m.has_colon),
            Some(prev) if prev != m.has_colon => return true,
            _ => {}
        }
        offset += m.range.end;
        if offset >= chunk.len() {
            break;
        }
    }

    false
}

fn leading_consistent_prefix(chunk: &str) -> &str {
    let lib = TokenLibrary::global();
    match lib.find_section(chunk) {
        Some(first) => {
            // Keep through the end of the first section's introducer;
            // the rest is the ambiguous, dropped tail.
            let search_from = first.range.end;
            match lib.find_section(&chunk[search_from..]) {
                Some(second) => &chunk[..search_from + second.range.start],
                None => chunk,
            }
        }
        None => chunk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_twp_rge_region_is_not_split() {
        let mut flags = FlagStore::new();
        let segments = split("T154N-R97W Sec 14: NE/4", &mut flags);
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn two_regions_are_split() {
        let mut flags = FlagStore::new();
        let text = "Sec 14: NE/4, T154N-R97W\nSec 22: ALL, T155N-R97W";
        let segments = split(text, &mut flags);
        assert_eq!(segments.len(), 2);
        assert!(segments[0].text.contains("Sec 14"));
        assert!(segments[1].text.contains("Sec 22"));
    }
}
