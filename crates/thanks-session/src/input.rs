//! Composition-aware text field controller.
//!
//! While an IME composition is open the field shows whatever the user is
//! typing but nothing is searched; the committed text is normalized and
//! searched exactly once when the composition ends.

use tracing::debug;

use thanks_core::draft::DraftError;
use thanks_core::unicode::normalize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    CompositionStart,
    /// Intermediate composition text (whole field value).
    CompositionUpdate(String),
    /// Composition committed; carries the whole field value.
    CompositionEnd(String),
    /// Plain input outside composition; carries the whole field value.
    Text(String),
    /// Enter pressed.
    Commit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputState {
    Idle,
    Composing,
}

/// What the caller should do after an input event.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InputOutcome {
    /// Normalized text to search for. `None` means no search this event.
    pub query: Option<String>,
    pub error: Option<DraftError>,
}

impl InputOutcome {
    fn search(text: &str) -> Self {
        Self {
            query: Some(normalize(text)),
            error: None,
        }
    }

    fn rejected(error: DraftError) -> Self {
        Self {
            query: None,
            error: Some(error),
        }
    }
}

pub struct CompositionInput {
    state: InputState,
    text: String,
}

impl Default for CompositionInput {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositionInput {
    pub fn new() -> Self {
        Self {
            state: InputState::Idle,
            text: String::new(),
        }
    }

    pub fn state(&self) -> InputState {
        self.state
    }

    pub fn is_composing(&self) -> bool {
        self.state == InputState::Composing
    }

    /// Visible field value.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the field holds text that was never turned into a selection.
    pub fn has_uncommitted_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.state = InputState::Idle;
        self.text.clear();
    }

    pub fn handle(&mut self, event: InputEvent) -> InputOutcome {
        match (self.state, event) {
            (_, InputEvent::CompositionStart) => {
                self.state = InputState::Composing;
                InputOutcome::default()
            }
            // An update without a start still means the IME owns the text.
            (_, InputEvent::CompositionUpdate(text)) => {
                self.state = InputState::Composing;
                self.text = text;
                InputOutcome::default()
            }
            (_, InputEvent::CompositionEnd(text)) => {
                self.state = InputState::Idle;
                self.text = text;
                InputOutcome::search(&self.text)
            }
            (InputState::Composing, InputEvent::Text(text)) => {
                // Browsers fire input events mid-composition too.
                self.text = text;
                InputOutcome::default()
            }
            (InputState::Idle, InputEvent::Text(text)) => {
                self.text = text;
                InputOutcome::search(&self.text)
            }
            (InputState::Composing, InputEvent::Commit) => {
                debug!("enter consumed by composition");
                InputOutcome::default()
            }
            (InputState::Idle, InputEvent::Commit) => {
                if self.has_uncommitted_text() {
                    InputOutcome::rejected(DraftError::UncommittedMention)
                } else {
                    InputOutcome::default()
                }
            }
        }
    }
}
