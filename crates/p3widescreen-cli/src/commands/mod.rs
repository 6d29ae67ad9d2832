//! CLI command implementations.
//!
//! This module contains the implementation of each CLI command.

pub mod check;
pub mod dump;
pub mod extract;
pub mod list;
pub mod patch;
