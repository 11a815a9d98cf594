//! Tracker-style sample scopes: cursor tracking decoupled from mixing and display.

pub mod mixer;
pub mod scope;
pub mod settings;
pub mod video;
