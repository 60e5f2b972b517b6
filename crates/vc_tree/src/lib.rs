#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Alloc paths

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod config;
mod decoder;
mod encoder;
mod error;
mod format;
mod value;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use config::{Layout, TreeConfig};
pub use error::TreeError;
pub use format::TreeFormat;
pub use value::Value;
