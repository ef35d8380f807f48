use anyhow::{anyhow, Result};
use clap::Parser;
use slog::Logger;
use std::fs;
use std::io;

use plss::config::Config;
use plss::description::Description;
use plss::export::{self, Attribute, Mode};
use plss::layout::Layout;
use plss::trs::{Ew, Ns};

#[derive(Parser)]
#[clap(version = "0.1")]
pub struct Opts {
    /// File to parse. Reads stdin when omitted.
    pub filename: Option<String>,

    /// Default N/S filled in for a township missing its direction letter.
    #[clap(long, default_value = "n")]
    pub default_ns: String,

    /// Default E/W filled in for a range missing its direction letter.
    #[clap(long, default_value = "w")]
    pub default_ew: String,

    /// Force a specific layout instead of auto-detecting.
    #[clap(long)]
    pub layout: Option<String>,

    /// Parse each tract's description into lots and quarter-quarters.
    #[clap(long)]
    pub parse_qq: bool,

    /// Admit bare quarter tokens ("NE") without `/4` context.
    #[clap(long)]
    pub clean_qq: bool,

    /// Apply narrow OCR normalizations before parsing.
    #[clap(long)]
    pub ocr_scrub: bool,

    /// Split the input at layout-change boundaries before extracting.
    #[clap(long)]
    pub segment: bool,

    /// Override both qq_depth_min and qq_depth_max to the same value.
    #[clap(long)]
    pub qq_depth: Option<u8>,

    /// Comma-separated attribute list for the tabular export.
    #[clap(long, default_value = "trs,desc,lots,qqs")]
    pub attributes: String,
}

/// Build a [`Config`] from the untyped CLI flags. An unrecognized value
/// is reported here, before a `Config` exists at all -- `spec.md` §7's
/// one config-related case that is a hard boundary error rather than an
/// in-parse warning.
pub fn build_config(opts: &Opts) -> Result<Config> {
    let mut cfg = Config::new();

    cfg.default_ns = match opts.default_ns.chars().next().and_then(Ns::from_letter) {
        Some(ns) => ns,
        None => return Err(anyhow!("unrecognized value {:?} for --default-ns", opts.default_ns)),
    };
    cfg.default_ew = match opts.default_ew.chars().next().and_then(Ew::from_letter) {
        Some(ew) => ew,
        None => return Err(anyhow!("unrecognized value {:?} for --default-ew", opts.default_ew)),
    };
    if let Some(l) = &opts.layout {
        cfg.layout = Some(l.parse::<Layout>().map_err(|_| anyhow!("unrecognized layout {:?}", l))?);
    }
    cfg.parse_qq = opts.parse_qq;
    cfg.clean_qq = opts.clean_qq;
    cfg.ocr_scrub = opts.ocr_scrub;
    cfg.segment = opts.segment;
    if let Some(depth) = opts.qq_depth {
        cfg = cfg.with_qq_depth(depth);
    }

    Ok(cfg)
}

fn parse_attributes(list: &str) -> Result<Vec<Attribute>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Attribute>().map_err(|e| anyhow!("{}", e)))
        .collect()
}

/// Read `opts.filename` (or stdin), parse it, and write the tabular
/// export to `out`.
pub fn run(opts: &Opts, log: &Logger, out: &mut impl io::Write) -> Result<()> {
    let cfg = build_config(opts)?;
    let attributes = parse_attributes(&opts.attributes)?;

    let contents = match &opts.filename {
        Some(path) => fs::read_to_string(path).map_err(|e| anyhow!("read input {:?}: {}", path, e))?,
        None => io::read_to_string(io::stdin()).map_err(|e| anyhow!("read stdin: {}", e))?,
    };

    let mut description = Description::new(&contents);
    if let Some(path) = &opts.filename {
        description = description.with_source(path.clone());
    }
    description.run(&cfg, log);

    if description.desc_is_flawed {
        slog::warn!(log, "description has flawed tracts"; "flag_count" => description.flags.len());
    }

    export::write_tracts(&description.tracts, &attributes, out, Mode::Overwrite, None)?;
    Ok(())
}
