// Copyright 2024 Oxide Computer Company

//! Configuration surface (`spec.md` §6, redesigned per §9 into a
//! structured record with one field per option).

use crate::layout::Layout;
use crate::trs::{Ew, Ns};

/// All per-parse configuration. Every field has the default `spec.md` §6
/// documents; invalid combinations are never rejected outright (§7:
/// "configuration problems produce warnings, never errors") -- callers
/// that want a hard failure on a malformed *string* surface (e.g. a CLI
/// flag) should go through `Config::from_str_opt`, which does return
/// `ConfigError`.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub default_ns: Ns,
    pub default_ew: Ew,
    pub layout: Option<Layout>,
    pub wait_to_parse: bool,
    pub parse_qq: bool,
    pub clean_qq: bool,
    pub require_colon: bool,
    pub include_lot_divisions: bool,
    pub ocr_scrub: bool,
    pub segment: bool,
    pub qq_depth_min: u8,
    pub qq_depth_max: Option<u8>,
    pub break_halves: bool,
    pub sec_within: bool,
    pub qq_depth_hard_cap: u8,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_ns: Ns::North,
            default_ew: Ew::West,
            layout: None,
            wait_to_parse: false,
            parse_qq: false,
            clean_qq: false,
            require_colon: true,
            include_lot_divisions: true,
            ocr_scrub: false,
            segment: false,
            qq_depth_min: 2,
            qq_depth_max: None,
            break_halves: false,
            sec_within: false,
            qq_depth_hard_cap: 6,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Config::default()
    }

    /// Apply the `qq_depth` override: when set, both min and max collapse
    /// to the same value (§6).
    pub fn with_qq_depth(mut self, depth: u8) -> Self {
        self.qq_depth_min = depth;
        self.qq_depth_max = Some(depth);
        self
    }

    /// Resolve the effective `(min, max)` depth pair, clamping `max < min`
    /// up to `min` and flagging the adjustment (§4.G.4). Also clamps `max`
    /// to the hard safety cap (§4.G safety rail) regardless of what the
    /// caller configured, since unbounded depth growth is 4^depth.
    pub fn resolve_depth(&self, flags: &mut crate::flag::FlagStore) -> (u8, u8) {
        let min = self.qq_depth_min;
        let mut max = self.qq_depth_max.unwrap_or(self.qq_depth_hard_cap);

        if max < min {
            flags.warn(
                "qq_depth_conflict",
                format!("qq_depth_max ({}) < qq_depth_min ({}); using max = min", max, min),
            );
            max = min;
        }

        if max > self.qq_depth_hard_cap {
            flags.warn(
                "qq_depth_capped",
                format!("qq_depth_max ({}) exceeds hard cap ({}); truncating", max, self.qq_depth_hard_cap),
            );
            max = self.qq_depth_hard_cap;
        }

        (min, max)
    }
}
