// Copyright 2024 Oxide Computer Company

//! Tract Extractor (component E).
//!
//! One state machine per layout (`AWAIT_TR, HAVE_TR, AWAIT_SEC, HAVE_SEC,
//! COLLECT_DESC, EMIT`), sharing a common skeleton: locate the Twp/Rge
//! anchoring a region, locate the Section(s) within it, and pair each
//! section with its description block according to which side of the
//! section the description prose falls on for that layout.

use std::ops::Range;

use crate::config::Config;
use crate::flag::FlagStore;
use crate::layout::Layout;
use crate::token::TokenLibrary;
use crate::trs::{Rge, Sec, Trs, Twp};

/// A state machine state (`spec.md` §4.E). Kept as an explicit enum even
/// though the control flow below is expressed as ordinary function calls,
/// so each phase can be named and logged the way the teacher's recursive
/// descent parser names its productions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitTr,
    HaveTr,
    AwaitSec,
    HaveSec,
    CollectDesc,
    Emit,
}

/// Hard cap on state transitions, proportional to input length, so a
/// pathological input cannot spin the state machine forever (`spec.md`
/// §4.E, "state-machine termination").
const ITERATIONS_PER_BYTE: usize = 8;

/// One `(TRS, description-block)` pair before aliquot/lot parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTract {
    pub trs: Trs,
    pub desc: String,
    pub orig_index: usize,
}

/// Which side of a Section match its description prose falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DescSide {
    Before,
    After,
}

fn desc_side(layout: Layout) -> DescSide {
    match layout {
        Layout::TrsDesc | Layout::SDescTr => DescSide::After,
        Layout::DescStr | Layout::TrDescS => DescSide::Before,
        Layout::CopyAll => DescSide::After,
    }
}

/// Whether this layout's Twp/Rge match trails the span it governs
/// (`DescStr`, `SDescTr`) rather than leading it (`TrsDesc`, `TrDescS`).
fn tr_trails(layout: Layout) -> bool {
    matches!(layout, Layout::DescStr | Layout::SDescTr)
}

/// Extract every tract from `text`, which has already been preprocessed
/// and classified as `layout`. `orig_index` is assigned densely in
/// left-to-right order of first-committed section across the whole call
/// (`spec.md` §5's ordering guarantee); `next_index` lets callers chain
/// multiple segments while keeping indices dense across all of them.
pub fn extract(
    text: &str,
    layout: Layout,
    cfg: &Config,
    flags: &mut FlagStore,
    next_index: &mut usize,
) -> Vec<RawTract> {
    let mut state = State::AwaitTr;
    let cap = text.len().saturating_mul(ITERATIONS_PER_BYTE).max(64);
    let mut iterations = 0;

    let tracts = loop {
        iterations += 1;
        if iterations > cap {
            flags.error("extractor_iteration_cap", "hard iteration cap reached; input likely pathological");
            break Vec::new();
        }

        state = match state {
            State::AwaitTr if layout == Layout::CopyAll => {
                break fatal_fallback(text, cfg, flags, next_index);
            }
            State::AwaitTr => State::HaveTr,
            State::HaveTr => State::AwaitSec,
            State::AwaitSec => State::HaveSec,
            State::HaveSec => State::CollectDesc,
            State::CollectDesc => State::Emit,
            State::Emit => {
                break extract_regions(text, layout, cfg, flags, next_index);
            }
        };
    };

    if tracts.is_empty() && layout != Layout::CopyAll {
        return fatal_fallback(text, cfg, flags, next_index);
    }

    tracts
}

/// The normal-path extraction: locate each Twp/Rge-governed region, then
/// each Section within it, and pair sections with description text.
fn extract_regions(
    text: &str,
    layout: Layout,
    cfg: &Config,
    flags: &mut FlagStore,
    next_index: &mut usize,
) -> Vec<RawTract> {
    let lib = TokenLibrary::global();
    let tr_matches = lib.find_all_twp_rge(text);

    if tr_matches.is_empty() {
        return Vec::new();
    }

    let trailing = tr_trails(layout);
    let side = desc_side(layout);
    let mut tracts = Vec::new();

    for (i, tr) in tr_matches.iter().enumerate() {
        let region_start = if trailing {
            if i == 0 { 0 } else { tr_matches[i - 1].range.end }
        } else {
            tr.range.start
        };
        let region_end = if trailing {
            tr.range.end
        } else if i + 1 < tr_matches.len() {
            tr_matches[i + 1].range.start
        } else {
            text.len()
        };

        let content_start = if trailing { region_start } else { tr.range.end };
        let content_end = if trailing { tr.range.start } else { region_end };
        if content_start > content_end {
            continue;
        }
        let content = &text[content_start..content_end];

        let twp = match tr.twp_ns {
            Some(ns) => Twp::Known { number: tr.twp_number, ns },
            None => Twp::Known { number: tr.twp_number, ns: cfg.default_ns },
        };
        let rge = match tr.rge_ew {
            Some(ew) => Rge::Known { number: tr.rge_number, ew },
            None => Rge::Known { number: tr.rge_number, ew: cfg.default_ew },
        };

        extract_sections(content, &twp, &rge, layout, side, cfg, flags, &mut tracts, next_index);
    }

    tracts
}

/// A raw, not-yet-paired Section or MultiSection occurrence inside a
/// region, with enough information to run the two-pass colon policy.
struct SectionCandidate {
    numbers: Vec<u8>,
    range: Range<usize>,
    has_colon: bool,
    is_multi: bool,
}

fn collect_section_candidates(content: &str) -> Vec<SectionCandidate> {
    let lib = TokenLibrary::global();
    let mut candidates = Vec::new();
    let mut offset = 0;

    while offset < content.len() {
        let remaining = &content[offset..];
        let multi = lib.find_multi_section(remaining);
        let single = lib.find_section(remaining);

        let (numbers, range, has_colon, is_multi) = match (multi, single) {
            (Some(m), Some(s)) if m.range.start <= s.range.start => {
                (m.numbers, m.range, m.has_colon, true)
            }
            (_, Some(s)) => (vec![s.number], s.range, s.has_colon, false),
            (Some(m), None) => (m.numbers, m.range, m.has_colon, true),
            (None, None) => break,
        };

        let abs_range = (offset + range.start)..(offset + range.end);
        offset = abs_range.end;
        candidates.push(SectionCandidate { numbers, range: abs_range, has_colon, is_multi });
    }

    candidates
}

#[allow(clippy::too_many_arguments)]
fn extract_sections(
    content: &str,
    twp: &Twp,
    rge: &Rge,
    layout: Layout,
    side: DescSide,
    cfg: &Config,
    flags: &mut FlagStore,
    tracts: &mut Vec<RawTract>,
    next_index: &mut usize,
) {
    let gate_colon = matches!(layout, Layout::TrsDesc | Layout::SDescTr) && cfg.require_colon;
    let candidates = collect_section_candidates(content);

    if candidates.is_empty() {
        flags.error("no_section", format!("no section found for {}{}", twp, rge));
        return;
    }

    // First pass: accept candidates meeting the colon gate (or all of them
    // if the gate doesn't apply).
    let mut accepted: Vec<bool> = candidates.iter().map(|c| !gate_colon || c.has_colon).collect();

    // Second pass: relax the gate for anything left over, flagging the
    // relaxation (`spec.md` §4.E colon policy).
    for (i, c) in candidates.iter().enumerate() {
        if !accepted[i] {
            accepted[i] = true;
            flags.warn("pulled_sec_without_colon", content[c.range.clone()].to_string());
        }
    }

    let accepted_indices: Vec<usize> = (0..candidates.len()).filter(|&i| accepted[i]).collect();
    if accepted_indices.is_empty() {
        flags.error("no_section", format!("no section accepted for {}{}", twp, rge));
        return;
    }

    for (pos, &idx) in accepted_indices.iter().enumerate() {
        let cand = &candidates[idx];

        let desc_range = match side {
            DescSide::After => {
                let end = accepted_indices
                    .get(pos + 1)
                    .map(|&next_idx| candidates[next_idx].range.start)
                    .unwrap_or(content.len());
                cand.range.end..end
            }
            DescSide::Before => {
                let start = if pos == 0 {
                    0
                } else {
                    let prev_idx = accepted_indices[pos - 1];
                    candidates[prev_idx].range.end
                };
                start..cand.range.start
            }
        };

        let desc = clean_desc(&content[desc_range.start.min(content.len())..desc_range.end.min(content.len())]);

        if cand.is_multi {
            flags.warn(
                "multiSec_found",
                format!("{:?}", cand.numbers.iter().map(|n| format!("{:02}", n)).collect::<Vec<_>>()),
            );
            let ascending_consecutive = cand.numbers.windows(2).all(|w| w[1] == w[0] + 1);
            if !ascending_consecutive {
                flags.warn("nonSequen_sec", format!("{:?}", cand.numbers));
            }
        }

        for &num in &cand.numbers {
            tracts.push(RawTract {
                trs: Trs::new(twp.clone(), rge.clone(), Sec::Known(num)),
                desc: desc.clone(),
                orig_index: *next_index,
            });
            *next_index += 1;
        }
    }

    // anything before the first accepted candidate (side=After) or after
    // the last one (side=Before) was never claimed as desc by any tract.
    let unclaimed = match side {
        DescSide::After => &content[..candidates[accepted_indices[0]].range.start],
        DescSide::Before => {
            let last_idx = *accepted_indices.last().unwrap();
            &content[candidates[last_idx].range.end..]
        }
    };
    if !unclaimed.trim().is_empty() {
        flags.warn("unused_desc", unclaimed.trim().to_string());
    }
}

fn clean_desc(raw: &str) -> String {
    raw.trim().trim_start_matches(':').trim().trim_end_matches([',', ';']).trim().to_string()
}

/// Best-effort recovery for the structural-fatal cases of `spec.md` §7:
/// no Twp/Rge anywhere, or extraction otherwise produced nothing. Salvages
/// whatever Township, Range, and Section fragments can be found standalone
/// and falls back to the entire input as the description only when even
/// a Section could not be located.
fn fatal_fallback(text: &str, cfg: &Config, flags: &mut FlagStore, next_index: &mut usize) -> Vec<RawTract> {
    let lib = TokenLibrary::global();

    let twp = match lib.find_standalone_twp(text) {
        Some((number, ns, _)) => Twp::Known { number, ns: ns.unwrap_or(cfg.default_ns) },
        None => {
            flags.error("no_tr", "no township found");
            Twp::Error
        }
    };
    let rge = match lib.find_standalone_rge(text) {
        Some((number, ew, _)) => Rge::Known { number, ew: ew.unwrap_or(cfg.default_ew) },
        None => {
            if twp != Twp::Error {
                flags.error("no_tr", "no range found");
            }
            Rge::Error
        }
    };

    let section = lib.find_section(text);
    let sec = match &section {
        Some(s) => Sec::Known(s.number),
        None => {
            flags.error("no_section", "no section found");
            Sec::Error
        }
    };

    let desc = match &section {
        Some(s) if s.range.end <= text.len() => {
            let d = clean_desc(&text[s.range.end..]);
            if d.is_empty() { text.to_string() } else { d }
        }
        _ => text.to_string(),
    };

    let tract = RawTract { trs: Trs::new(twp, rge, sec), desc, orig_index: *next_index };
    *next_index += 1;
    vec![tract]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::detect_refined;

    fn run(text: &str, cfg: &Config) -> (Vec<RawTract>, FlagStore) {
        let layout = detect_refined(text);
        let mut flags = FlagStore::new();
        let mut next_index = 0;
        let tracts = extract(text, layout, cfg, &mut flags, &mut next_index);
        (tracts, flags)
    }

    #[test]
    fn trs_desc_two_sections() {
        let cfg = Config::default();
        let (tracts, _) = run("T154N-R97W Sec 14: NE/4, Sec 15: W/2", &cfg);
        assert_eq!(tracts.len(), 2);
        assert_eq!(tracts[0].trs.composed(), "154n97w14");
        assert_eq!(tracts[0].desc, "NE/4");
        assert_eq!(tracts[1].trs.composed(), "154n97w15");
        assert_eq!(tracts[1].desc, "W/2");
        assert_eq!(tracts[0].orig_index, 0);
        assert_eq!(tracts[1].orig_index, 1);
    }

    #[test]
    fn multi_section_range_expands_to_four_tracts() {
        let cfg = Config::default();
        let (tracts, flags) = run("T154N-R97W Sections 14 - 17: X", &cfg);
        assert_eq!(tracts.len(), 4);
        let secs: Vec<&str> = tracts.iter().map(|t| t.trs.sec.composed()).collect();
        assert_eq!(secs, vec!["14", "15", "16", "17"]);
        assert!(tracts.iter().all(|t| t.desc == "X"));
        assert!(flags.warnings().iter().any(|f| f.kind == "multiSec_found"));
    }

    #[test]
    fn nonsequential_range_is_honored_and_flagged() {
        let cfg = Config::default();
        let (tracts, flags) = run("T154N-R97W Sections 9 - 3: X", &cfg);
        let secs: Vec<u8> = tracts.iter().map(|t| if let Sec::Known(n) = t.trs.sec { n } else { 0 }).collect();
        assert_eq!(secs, vec![9, 8, 7, 6, 5, 4, 3]);
        assert!(flags.warnings().iter().any(|f| f.kind == "nonSequen_sec"));
    }

    #[test]
    fn missing_colon_is_pulled_on_second_pass() {
        let cfg = Config::default();
        let (tracts, flags) = run("T154N-R97W Sec 14 NE/4", &cfg);
        assert_eq!(tracts.len(), 1);
        assert!(flags.warnings().iter().any(|f| f.kind == "pulled_sec_without_colon"));
    }

    #[test]
    fn missing_twp_rge_produces_partial_sentinel() {
        let cfg = Config::default();
        let (tracts, flags) = run("-R97W Sec 14: NE/4", &cfg);
        assert_eq!(tracts.len(), 1);
        assert_eq!(tracts[0].trs.composed(), "XXXz97w14");
        assert!(flags.is_flawed());
        assert!(flags.errors().iter().any(|f| f.kind == "no_tr"));
    }
}
