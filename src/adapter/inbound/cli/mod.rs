//! CLI module graph.

pub mod command;
pub mod run;
pub mod show;
