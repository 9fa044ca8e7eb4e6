//! mtrack: construction milestone tracker
//!
//! A command-line client for the milestone grid of a project-management
//! backend. Checkpoint edits update progress immediately and are kept in a
//! local override cache until the backend confirms them.

pub mod cli;
pub mod core;
pub mod entities;
