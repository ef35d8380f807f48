// Copyright 2024 Oxide Computer Company

//! Aliquot Tokenizer (component F).
//!
//! Converts a tract's description block into a canonical token stream:
//! aliquot phrases (ordered outermost-parent-first, ready for the Tree
//! Expander), lot references (with optional acreage and optional
//! quarter/half division), and the `ALL` marker. Limiting language
//! ("except", "insofar as", "including") is flagged but never halts
//! tokenization -- `spec.md` §4.F.4.

use std::ops::Range;

use crate::config::Config;
use crate::flag::FlagStore;
use crate::token::{Half, Quarter, TokenLibrary};

/// One step of an aliquot path: a quarter (a full quartering step) or a
/// half (a half step unless later broken by `break_halves`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece {
    Quarter(Quarter),
    Half(Half),
}

/// A lot reference, with its optional acreage and its optional leading
/// quarter/half division ("N/2 of Lot 1" -> `division = Some(Half(N))`).
#[derive(Debug, Clone, PartialEq)]
pub struct LotItem {
    pub numbers: Vec<u16>,
    pub acres: Option<f64>,
    pub division: Option<Piece>,
}

/// One element of the canonical aliquot token stream.
#[derive(Debug, Clone, PartialEq)]
pub enum AliquotItem {
    /// An aliquot phrase, outermost piece first (e.g. `NE` then `W2` for
    /// "W/2 of the NE/4" -- the parent comes first in the list).
    Aliquot(Vec<Piece>),
    /// The whole-section marker.
    All,
    Lot(LotItem),
}

enum Candidate {
    Quarter(crate::token::QuarterMatch, Range<usize>),
    Half(Half, Range<usize>),
    All(Range<usize>),
    Lot(crate::token::LotMatch),
}

/// Tokenize a description block into the canonical stream described above.
pub fn tokenize(desc: &str, cfg: &Config, flags: &mut FlagStore) -> Vec<AliquotItem> {
    let lib = TokenLibrary::global();

    for (word, _) in lib.find_noise(desc) {
        flags.warn(word, "limiting language present, parsing continues");
    }

    let mut items: Vec<AliquotItem> = Vec::new();
    let mut chain: Vec<Piece> = Vec::new();
    let mut seen_lots: Vec<u16> = Vec::new();
    let mut cursor = 0usize;

    while cursor < desc.len() {
        let rest = &desc[cursor..];

        let mut candidates: Vec<(usize, Candidate)> = Vec::new();
        if let Some(m) = lib.find_lot(rest) {
            candidates.push((m.range.start, Candidate::Lot(m)));
        }
        if let Some(r) = lib.find_all(rest) {
            candidates.push((r.start, Candidate::All(r)));
        }
        if let Some((h, r)) = lib.find_half(rest) {
            candidates.push((r.start, Candidate::Half(h, r)));
        }
        if let Some((qm, r)) = lib.find_quarter(rest) {
            candidates.push((r.start, Candidate::Quarter(qm, r)));
        }

        let Some((_, winner)) = candidates.into_iter().min_by_key(|(pos, _)| *pos) else {
            break;
        };

        match winner {
            Candidate::Quarter(qm, r) => {
                let abs = (cursor + r.start)..(cursor + r.end);
                let admitted = qm.explicit
                    || (cfg.clean_qq && is_boundary_before(desc, abs.start) && is_boundary_after(desc, abs.end));
                if admitted {
                    chain.push(Piece::Quarter(qm.quarter));
                }
                cursor = abs.end;
            }
            Candidate::Half(h, r) => {
                let abs = (cursor + r.start)..(cursor + r.end);
                chain.push(Piece::Half(h));
                cursor = abs.end;
            }
            Candidate::All(r) => {
                let abs = (cursor + r.start)..(cursor + r.end);
                flush_chain(&mut chain, &mut items);
                items.push(AliquotItem::All);
                cursor = abs.end;
            }
            Candidate::Lot(lm) => {
                let abs_end = cursor + lm.range.end;

                let division = if cfg.include_lot_divisions && chain.len() == 1 {
                    chain.pop()
                } else {
                    None
                };
                flush_chain(&mut chain, &mut items);

                for &n in &lm.numbers {
                    if seen_lots.contains(&n) {
                        flags.warn("dup_lot", format!("L{}", n));
                    } else {
                        seen_lots.push(n);
                    }
                }
                let ascending = lm.numbers.windows(2).all(|w| w[1] == w[0] + 1);
                if lm.numbers.len() > 1 && !ascending {
                    flags.warn("nonSequen_lots", format!("{:?}", lm.numbers));
                }

                items.push(AliquotItem::Lot(LotItem { numbers: lm.numbers, acres: lm.acres, division }));
                cursor = abs_end;
            }
        }
    }

    flush_chain(&mut chain, &mut items);
    items
}

fn flush_chain(chain: &mut Vec<Piece>, items: &mut Vec<AliquotItem>) {
    if chain.is_empty() {
        return;
    }
    let mut pieces: Vec<Piece> = chain.drain(..).collect();
    // source order is innermost-first ("W/2 of NE/4" reads W then NE); a
    // path is outermost-first, so reverse before handing it to the tree
    // expander.
    pieces.reverse();
    items.push(AliquotItem::Aliquot(pieces));
}

/// True if `pos` sits at a clause boundary looking backward: start of
/// text, or immediately after `,`, `;`, `:`, or `&`.
fn is_boundary_before(text: &str, pos: usize) -> bool {
    let before = text[..pos].trim_end();
    before.is_empty() || before.ends_with([',', ';', ':', '&'])
}

/// True if `pos` sits at a clause boundary looking forward: end of text,
/// or immediately before `,`, `;`, or `.`.
fn is_boundary_after(text: &str, pos: usize) -> bool {
    let after = text[pos..].trim_start();
    after.is_empty() || after.starts_with([',', ';', '.'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Quarter as Q;

    #[test]
    fn bare_quarter_rejected_without_clean_qq() {
        let cfg = Config::default();
        let mut flags = FlagStore::new();
        let items = tokenize("NE", &cfg, &mut flags);
        assert!(items.is_empty());
    }

    #[test]
    fn bare_quarter_admitted_with_clean_qq_at_boundary() {
        let mut cfg = Config::default();
        cfg.clean_qq = true;
        let mut flags = FlagStore::new();
        let items = tokenize("NE", &cfg, &mut flags);
        assert_eq!(items, vec![AliquotItem::Aliquot(vec![Piece::Quarter(Q::Ne)])]);
    }

    #[test]
    fn explicit_quarter_chain_orders_outermost_first() {
        let cfg = Config::default();
        let mut flags = FlagStore::new();
        let items = tokenize("SE/4NW/4", &cfg, &mut flags);
        assert_eq!(
            items,
            vec![AliquotItem::Aliquot(vec![Piece::Quarter(Q::Nw), Piece::Quarter(Q::Se)])]
        );
    }

    #[test]
    fn half_beneath_quarter_chains_with_of() {
        let cfg = Config::default();
        let mut flags = FlagStore::new();
        let items = tokenize("E/2 NE/4 NW/4", &cfg, &mut flags);
        assert_eq!(
            items,
            vec![AliquotItem::Aliquot(vec![
                Piece::Quarter(Q::Nw),
                Piece::Quarter(Q::Ne),
                Piece::Half(Half::E),
            ])]
        );
    }

    #[test]
    fn lot_range_and_duplicate_are_flagged() {
        let cfg = Config::default();
        let mut flags = FlagStore::new();
        let items = tokenize("Lots 1 - 3, SE/4NE/4, Lot 2", &cfg, &mut flags);
        assert_eq!(items.len(), 3);
        assert!(matches!(&items[0], AliquotItem::Lot(l) if l.numbers == vec![1, 2, 3]));
        assert!(matches!(&items[1], AliquotItem::Aliquot(_)));
        assert!(matches!(&items[2], AliquotItem::Lot(l) if l.numbers == vec![2]));
        assert!(flags.warnings().iter().any(|f| f.kind == "dup_lot"));
    }

    #[test]
    fn lot_division_is_captured_when_enabled() {
        let cfg = Config::default();
        let mut flags = FlagStore::new();
        let items = tokenize("N/2 of Lot 1", &cfg, &mut flags);
        assert_eq!(items.len(), 1);
        match &items[0] {
            AliquotItem::Lot(l) => {
                assert_eq!(l.numbers, vec![1]);
                assert_eq!(l.division, Some(Piece::Half(Half::N)));
            }
            other => panic!("expected a lot item, got {:?}", other),
        }
    }

    #[test]
    fn noise_words_are_flagged_but_do_not_block_tokenization() {
        let cfg = Config::default();
        let mut flags = FlagStore::new();
        let items = tokenize("NE/4, except the north 10 acres", &cfg, &mut flags);
        assert_eq!(items.len(), 1);
        assert!(flags.warnings().iter().any(|f| f.kind == "except"));
    }

    #[test]
    fn all_marker_is_recognized() {
        let cfg = Config::default();
        let mut flags = FlagStore::new();
        let items = tokenize("ALL", &cfg, &mut flags);
        assert_eq!(items, vec![AliquotItem::All]);
    }
}
