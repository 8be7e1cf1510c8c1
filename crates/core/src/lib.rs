//! Core state model and twiss visualization pipeline for beambench.
//!
//! The UI crate dispatches user intents into these types and renders their
//! snapshots; nothing here talks to the network or the screen.

pub mod model;
pub mod parsers;
pub mod validate;
pub mod views;
