//! Schema definitions for ninjadep output formats.
//!
//! This crate contains the data structures persisted between the two halves
//! of the ninjadep pipeline: the dependency mapping written by `parse` and
//! read back by `select`/`audit`/`optimize`, and the test selection written
//! by `select`.
//!
//! All collections are ordered (`BTreeMap`/`BTreeSet`) so that serializing
//! the same mapping twice yields byte-identical JSON.

mod dependency_mapping;
mod selection;
#[cfg(test)]
mod testutil;

#[doc(inline)]
pub use dependency_mapping::*;
#[doc(inline)]
pub use selection::*;
