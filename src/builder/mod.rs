//! Probe build steps.
//!
//! This module compiles, archives and links the small programs probes are
//! made of, inside a scratch directory owned by the prober.

pub mod probe;
pub mod scratch;

pub use probe::{expand_link_template, BuildOutput, BuildProbe};
pub use scratch::ScratchDir;
