// UI module - presentation of the overlay state
//
// This module contains:
// - Frame: text projection of AppState (overlay card and health panel)
// - Presenter: subscribes to state changes and renders a frame per change

pub mod presenter;

pub use presenter::{Frame, Presenter, shortcut_hint};
