//! Launch profiles: named, ordered lists of programs started one after
//! another with per-entry delays and window start modes.
//!
//! `backend` owns persistence and the launch engine, `model` the plain data
//! passed between them and a front end. The `app-launcher` binary is a thin
//! command-line front end over this crate.

pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
