//! Overlay lifecycle: the idle/loading/result state machine, the auto-hide timer and
//! copy acknowledgement.
//!
//! # Transitions
//!
//! | Trigger | From | To | Side effects |
//! |---|---|---|---|
//! | `loading-started` | any | `Loading` | cancel auto-hide, drop result, `show()` |
//! | `translation-ready` | any | `Result` | cancel auto-hide, reset copy feedback, `show()`, arm auto-hide |
//! | auto-hide / close / `escape` | any | `Idle` | drop result, `hide()` |
//! | copy | `Result` | `Result` | `write_text()`, feedback on for 2 s or a notice |
//!
//! At most one auto-hide timer is armed at any time. The clipboard write runs in its
//! own task; its acknowledgement is dropped if the displayed result changed meanwhile.

pub mod controller;

pub use controller::{AUTO_HIDE_DELAY, COPY_FEEDBACK_DURATION, OverlayController, OverlayHandle};
