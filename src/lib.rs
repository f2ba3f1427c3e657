//! Pokedex TUI - paginated PokeAPI browser
//!
//! This library exposes the app's modules for testing.

pub mod action;
pub mod api;
pub mod components;
pub mod effect;
pub mod error;
pub mod logging;
pub mod reducer;
pub mod state;
pub mod ui;
