//! Image filters as they travel through URLs.
//!
//! The module is split into:
//! - **Value**: [`FilterValue`] and the ordered [`FilterSet`]
//! - **Codec**: [`FilterCodec`], `FilterSet` ⇄ `{filters}` placeholder text
//! - **Registry**: [`FilterLookup`] trait + [`FilterManager`] for aliases
//!
//! Applying filters to pixels is the transformation engine's job and lives
//! outside this crate. Handler-backed filters are only named here.

mod codec;
mod registry;
mod value;

pub use codec::{FilterCodec, ParseError};
pub use registry::{FilterDefinition, FilterLookup, FilterManager};
pub use value::{FilterSet, FilterValue, HEIGHT, WIDTH};
