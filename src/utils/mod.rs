//! Shared helpers for task actions.

pub(crate) mod fs;
