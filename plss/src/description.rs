// Copyright 2024 Oxide Computer Company

//! The `Description`/`Tract` data model (`spec.md` §3) and the top-level
//! `Description::parse` entry point that threads raw text through every
//! component in order: Preprocessor -> Layout Detector -> (optionally)
//! Segmenter -> Tract Extractor -> per-tract Aliquot Tokenizer -> Aliquot
//! Tree Expander.

use std::collections::HashMap;

use slog::{debug, o, Logger};

use crate::aliquot::{self, AliquotItem, Piece};
use crate::config::Config;
use crate::extract::{self, RawTract};
use crate::flag::FlagStore;
use crate::layout::{self, Layout};
use crate::preprocess;
use crate::qq;
use crate::segment;
use crate::trs::Trs;

/// The atom of the output: one `(TRS, description-block)` pair plus its
/// derived lots/qqs. `orig_desc` and `source` are value copies of the
/// parent `Description`'s own fields, taken at emission time -- there is
/// no back-pointer (`spec.md` §9's redesign of child-to-parent references).
#[derive(Debug, Clone, PartialEq)]
pub struct Tract {
    pub trs: Trs,
    pub desc: String,
    pub pp_desc: String,
    pub orig_desc: String,
    pub orig_index: usize,
    pub source: Option<String>,
    pub lots: Vec<String>,
    pub qqs: Vec<String>,
    pub lot_acres: HashMap<String, f64>,
    pub flags: FlagStore,
    pub desc_is_flawed: bool,
}

impl Tract {
    /// `lots` then `qqs`, concatenated (`spec.md` §3's invariant).
    pub fn lots_qqs(&self) -> Vec<String> {
        self.lots.iter().chain(self.qqs.iter()).cloned().collect()
    }
}

/// The original raw input of a full PLSS description, plus its derived
/// tracts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Description {
    pub orig_desc: String,
    pub pp_desc: String,
    pub source: Option<String>,
    pub layout: Option<Layout>,
    pub tracts: Vec<Tract>,
    pub flags: FlagStore,
    pub desc_is_flawed: bool,
}

impl Description {
    /// Build an unparsed `Description` (`wait_to_parse`): no tracts yet.
    pub fn new(raw: &str) -> Self {
        Description { orig_desc: raw.to_string(), ..Default::default() }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Run the full pipeline and return a populated `Description`. Never
    /// fails outright (`spec.md` §7): a totally fatal input still yields a
    /// `Description` with one `XXXzXXXzXX` tract covering the whole text.
    pub fn parse(raw: &str, cfg: &Config) -> Self {
        Self::parse_with_logger(raw, cfg, &Logger::root(slog::Discard, o!()))
    }

    pub fn parse_with_logger(raw: &str, cfg: &Config, log: &Logger) -> Self {
        let mut desc = Description::new(raw);
        if cfg.wait_to_parse {
            return desc;
        }
        desc.run(cfg, log);
        desc
    }

    /// Execute the pipeline on an already-constructed (possibly
    /// `wait_to_parse`) `Description`, populating `tracts` and `flags`.
    pub fn run(&mut self, cfg: &Config, log: &Logger) {
        let mut flags = FlagStore::new();

        let pre = match preprocess::run(&self.orig_desc, cfg) {
            Ok(result) => result,
            Err(err) => {
                flags.error("no_text", err.to_string());
                self.pp_desc = String::new();
                self.flags = flags;
                self.desc_is_flawed = true;
                self.tracts = vec![fatal_placeholder_tract(&self.orig_desc, &self.source, &self.flags, 0)];
                return;
            }
        };
        flags.extend(&pre.flags);
        self.pp_desc = pre.text.clone();
        debug!(log, "preprocessed"; "flags" => pre.flags.len());

        let mut next_index = 0usize;
        let raw_tracts: Vec<RawTract> = if cfg.segment {
            let segments = segment::split(&pre.text, &mut flags);
            let mut all = Vec::new();
            for seg in segments {
                debug!(log, "segment"; "layout" => %seg.layout);
                all.extend(extract::extract(&seg.text, seg.layout, cfg, &mut flags, &mut next_index));
            }
            all
        } else {
            let layout = cfg.layout.unwrap_or_else(|| layout::detect_refined(&pre.text));
            self.layout = Some(layout);
            debug!(log, "layout detected"; "layout" => %layout);
            extract::extract(&pre.text, layout, cfg, &mut flags, &mut next_index)
        };

        let base_flags = flags;
        self.desc_is_flawed = base_flags.is_flawed();

        self.tracts = raw_tracts
            .into_iter()
            .map(|raw| build_tract(raw, cfg, &self.source, &self.orig_desc, &base_flags, self.desc_is_flawed, log))
            .collect();
        self.flags = base_flags;
    }
}

fn build_tract(
    raw: RawTract,
    cfg: &Config,
    source: &Option<String>,
    orig_desc: &str,
    base_flags: &FlagStore,
    desc_is_flawed: bool,
    log: &Logger,
) -> Tract {
    let mut tract_flags = base_flags.clone();

    let pp_desc = if raw.desc.trim().is_empty() {
        raw.desc.clone()
    } else {
        preprocess::run(&raw.desc, cfg).map(|r| r.text).unwrap_or_else(|_| raw.desc.clone())
    };

    let mut lots = Vec::new();
    let mut qqs = Vec::new();
    let mut lot_acres = HashMap::new();

    if cfg.parse_qq {
        let items = aliquot::tokenize(&pp_desc, cfg, &mut tract_flags);

        let mut seen = Vec::new();
        for item in &items {
            if let AliquotItem::Lot(lot) = item {
                for &n in &lot.numbers {
                    let base = format!("L{}", n);
                    if !seen.contains(&n) {
                        seen.push(n);
                        let label = match lot.division {
                            Some(piece) => format!("{}{}", piece_label(piece), base),
                            None => base.clone(),
                        };
                        lots.push(label);
                    }
                    if let Some(acres) = lot.acres {
                        lot_acres.insert(base, acres);
                    }
                }
            }
        }

        qqs = qq::expand(&items, cfg, &mut tract_flags);
        debug!(log, "tract parsed"; "trs" => %raw.trs, "lots" => lots.len(), "qqs" => qqs.len());
    }

    Tract {
        trs: raw.trs,
        desc: raw.desc,
        pp_desc,
        orig_desc: orig_desc.to_string(),
        orig_index: raw.orig_index,
        source: source.clone(),
        lots,
        qqs,
        lot_acres,
        flags: tract_flags,
        desc_is_flawed,
    }
}

fn piece_label(piece: Piece) -> &'static str {
    match piece {
        Piece::Quarter(q) => q.label(),
        Piece::Half(h) => h.label(),
    }
}

fn fatal_placeholder_tract(
    raw: &str,
    source: &Option<String>,
    flags: &FlagStore,
    orig_index: usize,
) -> Tract {
    Tract {
        trs: Trs::error(),
        desc: raw.to_string(),
        pp_desc: raw.to_string(),
        orig_desc: raw.to_string(),
        orig_index,
        source: source.clone(),
        lots: Vec::new(),
        qqs: Vec::new(),
        lot_acres: HashMap::new(),
        flags: flags.clone(),
        desc_is_flawed: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_fatal_placeholder() {
        let cfg = Config::default();
        let desc = Description::parse("   ", &cfg);
        assert!(desc.desc_is_flawed);
        assert_eq!(desc.tracts.len(), 1);
        assert_eq!(desc.tracts[0].trs.composed(), "XXXzXXXzXX");
    }

    #[test]
    fn two_tracts_with_parse_qq() {
        let mut cfg = Config::default();
        cfg.parse_qq = true;
        let desc = Description::parse("T154N-R97W Sec 14: NE/4, Sec 15: W/2", &cfg);
        assert_eq!(desc.tracts.len(), 2);
        assert_eq!(desc.tracts[0].trs.composed(), "154n97w14");
        assert_eq!(desc.tracts[0].qqs, vec!["NENE", "NWNE", "SENE", "SWNE"]);
        assert_eq!(
            desc.tracts[1].qqs,
            vec!["NENW", "NWNW", "SENW", "SWNW", "NESW", "NWSW", "SESW", "SWSW"]
        );
    }

    #[test]
    fn tracts_inherit_full_original_text_and_source() {
        let cfg = Config::default();
        let desc = Description::new("T154N-R97W Sec 14: NE/4").with_source("doc-7");
        let mut desc = desc;
        desc.run(&cfg, &Logger::root(slog::Discard, o!()));
        for t in &desc.tracts {
            assert_eq!(t.orig_desc, desc.orig_desc);
            assert_eq!(t.source, desc.source);
        }
    }

    #[test]
    fn orig_index_is_dense() {
        let cfg = Config::default();
        let desc = Description::parse("T154N-R97W Sections 14 - 17: X", &cfg);
        let indices: Vec<usize> = desc.tracts.iter().map(|t| t.orig_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn lots_qqs_is_concatenation() {
        let mut cfg = Config::default();
        cfg.parse_qq = true;
        let desc = Description::parse("T154N-R97W Sec 14: Lots 1 - 3, SE/4NE/4, Lot 2", &cfg);
        let t = &desc.tracts[0];
        assert_eq!(t.lots_qqs(), t.lots.iter().chain(t.qqs.iter()).cloned().collect::<Vec<_>>());
        assert_eq!(t.lots, vec!["L1", "L2", "L3"]);
        assert_eq!(t.qqs, vec!["SENE"]);
        assert!(t.flags.warnings().iter().any(|f| f.kind == "dup_lot"));
    }

    #[test]
    fn wait_to_parse_defers_extraction() {
        let mut cfg = Config::default();
        cfg.wait_to_parse = true;
        let desc = Description::parse("T154N-R97W Sec 14: NE/4", &cfg);
        assert!(desc.tracts.is_empty());
    }
}
