#![allow(unused_assignments)] // thiserror/miette proc macros trigger false positives

pub mod backend;
pub mod backing;
pub mod cli;
pub mod commands;
pub mod config;
pub mod device;
pub mod disk;
pub mod error;
pub mod inventory;
pub mod logging;
pub mod paths;
pub mod reconfig;
pub mod util;
