//! Blockfall (workspace facade crate).
//!
//! Re-exports every workspace crate under one name so binaries, integration tests and
//! benches can use `blockfall::{core, engine, adapter, input, term, types}`.

pub use blockfall_adapter as adapter;
pub use blockfall_core as core;
pub use blockfall_engine as engine;
pub use blockfall_input as input;
pub use blockfall_term as term;
pub use blockfall_types as types;
