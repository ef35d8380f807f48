// Copyright 2024 Oxide Computer Company

//! Aliquot Tree Expander (component G).
//!
//! Expands the canonical aliquot token stream produced by the Tokenizer
//! into concrete quarter-quarter (or coarser/finer) leaf labels, honoring
//! `qq_depth_min`, `qq_depth_max`, and `break_halves`. Depth is tracked as
//! a step count: a quarter is one full step, a half is half a step unless
//! `break_halves` forces it into its two constituent quarters.

use crate::aliquot::{AliquotItem, Piece};
use crate::config::Config;
use crate::flag::FlagStore;
use crate::token::{Half, Quarter};

const CANONICAL_QUARTERS: [Quarter; 4] = [Quarter::Ne, Quarter::Nw, Quarter::Se, Quarter::Sw];

/// The two quarters a half decomposes into, in canonical order.
fn half_components(half: Half) -> [Quarter; 2] {
    match half {
        Half::N => [Quarter::Ne, Quarter::Nw],
        Half::S => [Quarter::Se, Quarter::Sw],
        Half::E => [Quarter::Ne, Quarter::Se],
        Half::W => [Quarter::Nw, Quarter::Sw],
    }
}

fn piece_cost(piece: Piece) -> f32 {
    match piece {
        Piece::Quarter(_) => 1.0,
        Piece::Half(_) => 0.5,
    }
}

/// Expand every `Aliquot` item in `items` into leaf labels, and return
/// `ALL`-marked items as the canonical depth-`min` expansion of the whole
/// section. Lot items are not touched here -- they pass through
/// `description.rs` unchanged.
pub fn expand(items: &[AliquotItem], cfg: &Config, flags: &mut FlagStore) -> Vec<String> {
    let (min, max) = cfg.resolve_depth(flags);
    let mut out = Vec::new();

    for item in items {
        match item {
            AliquotItem::Aliquot(path) => {
                let mut leaves = Vec::new();
                expand_path(path, Vec::new(), 0.0, min, max, cfg.break_halves, &mut leaves);
                out.extend(leaves.into_iter().map(label));
            }
            AliquotItem::All => {
                let mut leaves = Vec::new();
                expand_path(&[], Vec::new(), 0.0, min, max, cfg.break_halves, &mut leaves);
                out.extend(leaves.into_iter().map(label));
            }
            AliquotItem::Lot(_) => {}
        }
    }

    out
}

/// Consume the explicitly-given pieces of `given` (outermost first) onto
/// `prefix`, tracking depth as we go; a piece that would push depth past
/// `max` is dropped (truncation, `spec.md` §4.G.3) rather than consumed.
/// Once `given` is exhausted, hand off to `finish` to fill to `min`.
fn expand_path(
    given: &[Piece],
    prefix: Vec<Piece>,
    depth: f32,
    min: u8,
    max: u8,
    break_halves: bool,
    out: &mut Vec<Vec<Piece>>,
) {
    let Some((&next, rest)) = given.split_first() else {
        finish(prefix, depth, min, max, break_halves, out);
        return;
    };

    let next_depth = depth + piece_cost(next);
    if next_depth > max as f32 {
        finish(prefix, depth, min, max, break_halves, out);
        return;
    }

    let mut new_prefix = prefix;
    new_prefix.push(next);
    expand_path(rest, new_prefix, next_depth, min, max, break_halves, out);
}

fn finish(prefix: Vec<Piece>, depth: f32, min: u8, max: u8, break_halves: bool, out: &mut Vec<Vec<Piece>>) {
    if depth < min as f32 {
        match prefix.last().copied() {
            Some(Piece::Half(h)) => {
                let base: Vec<Piece> = prefix[..prefix.len() - 1].to_vec();
                let base_depth = depth - 0.5;
                for q in half_components(h) {
                    let mut p = base.clone();
                    p.push(Piece::Quarter(q));
                    finish(p, base_depth + 1.0, min, max, break_halves, out);
                }
            }
            _ => {
                for q in CANONICAL_QUARTERS {
                    let mut p = prefix.clone();
                    p.push(Piece::Quarter(q));
                    finish(p, depth + 1.0, min, max, break_halves, out);
                }
            }
        }
        return;
    }

    if break_halves {
        if let Some(Piece::Half(h)) = prefix.last().copied() {
            let base: Vec<Piece> = prefix[..prefix.len() - 1].to_vec();
            let base_depth = depth - 0.5;
            for q in half_components(h) {
                let mut p = base.clone();
                p.push(Piece::Quarter(q));
                let d = base_depth + 1.0;
                if d > max as f32 {
                    out.push(base.clone());
                } else {
                    finish(p, d, min, max, break_halves, out);
                }
            }
            return;
        }
    }

    out.push(prefix);
}

/// Deepest-piece-first label: the last (deepest) piece in the outermost-
/// first path is printed first (`spec.md` §4.G.5, `SWNE` not `NESW`).
fn label(path: Vec<Piece>) -> String {
    path.iter()
        .rev()
        .map(|p| match p {
            Piece::Quarter(q) => q.label(),
            Piece::Half(h) => h.label(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aliquot::Piece as P;
    use crate::token::Quarter as Q;

    fn cfg_depth(min: u8, max: Option<u8>) -> Config {
        let mut cfg = Config::default();
        cfg.qq_depth_min = min;
        cfg.qq_depth_max = max;
        cfg
    }

    #[test]
    fn quarter_expands_to_four_qq_in_canonical_order() {
        let cfg = cfg_depth(2, None);
        let mut flags = FlagStore::new();
        let items = vec![AliquotItem::Aliquot(vec![P::Quarter(Q::Ne)])];
        let qqs = expand(&items, &cfg, &mut flags);
        assert_eq!(qqs, vec!["NENE", "NWNE", "SENE", "SWNE"]);
    }

    #[test]
    fn half_expands_to_eight_qq() {
        let cfg = cfg_depth(2, None);
        let mut flags = FlagStore::new();
        let items = vec![AliquotItem::Aliquot(vec![P::Half(Half::W)])];
        let qqs = expand(&items, &cfg, &mut flags);
        assert_eq!(qqs, vec!["NENW", "NWNW", "SENW", "SWNW", "NESW", "NWSW", "SESW", "SWSW"]);
    }

    #[test]
    fn all_expands_to_canonical_sixteen() {
        let cfg = cfg_depth(2, None);
        let mut flags = FlagStore::new();
        let items = vec![AliquotItem::All];
        let qqs = expand(&items, &cfg, &mut flags);
        assert_eq!(qqs.len(), 16);
        assert_eq!(&qqs[0..4], &["NENE", "NWNE", "SENE", "SWNE"]);
    }

    #[test]
    fn depth_two_truncates_trailing_half() {
        let cfg = cfg_depth(2, Some(2));
        let mut flags = FlagStore::new();
        let items = vec![
            AliquotItem::Aliquot(vec![P::Quarter(Q::Nw), P::Quarter(Q::Se)]),
            AliquotItem::Aliquot(vec![P::Quarter(Q::Nw), P::Quarter(Q::Ne), P::Half(Half::E)]),
        ];
        let qqs = expand(&items, &cfg, &mut flags);
        assert_eq!(qqs, vec!["SENW", "NENW"]);
    }

    #[test]
    fn depth_min_three_breaks_through_trailing_half() {
        let cfg = cfg_depth(3, None);
        let mut flags = FlagStore::new();
        let items = vec![
            AliquotItem::Aliquot(vec![P::Quarter(Q::Nw), P::Quarter(Q::Se)]),
            AliquotItem::Aliquot(vec![P::Quarter(Q::Nw), P::Quarter(Q::Ne), P::Half(Half::E)]),
        ];
        let qqs = expand(&items, &cfg, &mut flags);
        assert_eq!(
            qqs,
            vec!["NESENW", "NWSENW", "SESENW", "SWSENW", "NENENW", "SENENW"]
        );
    }
}
