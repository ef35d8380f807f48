//! Parsing engine for United States Public Land Survey System (PLSS) land
//! descriptions: free-form survey text in, normalized `Description`/`Tract`
//! records out.
//!
//! Pipeline: [`preprocess`] -> [`layout`] -> (optionally) [`segment`] ->
//! [`extract`] -> per-tract [`aliquot`] -> [`qq`]. [`flag`] is threaded
//! through every stage. [`description::Description::parse`] is the single
//! entry point most callers need.

pub mod aliquot;
pub mod config;
pub mod description;
pub mod export;
pub mod extract;
pub mod flag;
pub mod layout;
pub mod preprocess;
pub mod qq;
pub mod segment;
pub mod token;
pub mod trs;

pub use config::Config;
pub use description::{Description, Tract};
pub use flag::{Flag, FlagStore};
pub use layout::Layout;
pub use trs::Trs;
