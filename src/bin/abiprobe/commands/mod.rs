//! Command implementations

pub mod classify;
pub mod decorate;
pub mod link_flags;
pub mod probe;
