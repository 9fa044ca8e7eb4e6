//! CLI command implementations

pub mod add;
pub mod columns;
pub mod completions;
pub mod config;
pub mod delete;
pub mod edit;
pub mod export;
pub mod init;
pub mod load;
pub mod overrides;
pub mod show;
pub mod summary;
