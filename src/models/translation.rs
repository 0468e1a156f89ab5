use serde::{Deserialize, Serialize};

/// A finished translation as delivered by the backend.
///
/// Immutable once received; the overlay keeps it only while it is on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationResult {
    pub original: String,
    pub translated: String,
    pub source_lang: String,
    pub target_lang: String,
}

impl TranslationResult {
    pub fn new(
        original: impl Into<String>,
        translated: impl Into<String>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Self {
        Self {
            original: original.into(),
            translated: translated.into(),
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
        }
    }

    /// Badge labels for the language direction header.
    ///
    /// The backend only translates between Japanese and English, so anything that
    /// is not Japanese is shown as English.
    pub fn direction_labels(&self) -> (&'static str, &'static str) {
        if self.source_lang == "ja" {
            ("JA", "EN")
        } else {
            ("EN", "JA")
        }
    }
}

/// Visual state of the overlay window.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OverlayState {
    #[default]
    Idle,
    Loading,
    Result(TranslationResult),
}

impl OverlayState {
    pub fn mascot(&self) -> MascotState {
        match self {
            OverlayState::Idle => MascotState::Idle,
            OverlayState::Loading => MascotState::Loading,
            OverlayState::Result(_) => MascotState::Success,
        }
    }

    pub fn result(&self) -> Option<&TranslationResult> {
        match self {
            OverlayState::Result(result) => Some(result),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, OverlayState::Idle)
    }
}

/// Rendering hint for the mascot. Carries no control logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MascotState {
    Idle,
    Loading,
    Success,
}

impl MascotState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MascotState::Idle => "idle",
            MascotState::Loading => "loading",
            MascotState::Success => "success",
        }
    }
}
