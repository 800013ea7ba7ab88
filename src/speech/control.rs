//! Visual playback feedback on the control that issued a request
//!
//! The scheduler only ever holds a weak reference to a control. Controls are
//! owned by the UI and may disappear at any time (a card is re-rendered, a
//! modal is closed), in which case feedback is silently skipped.

use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};

/// Glyph shown on an audio button
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Glyph {
    /// Ready to play
    Ready,

    /// Last playback failed
    Error,
}

impl Glyph {
    pub fn as_str(self) -> &'static str {
        match self {
            Glyph::Ready => "🔊",
            Glyph::Error => "❌",
        }
    }
}

impl fmt::Display for Glyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual-state callbacks delivered to a control
///
/// Callbacks are pure side effects on the control and carry nothing back
/// into the scheduler.
pub trait PlaybackControl: Send + Sync {
    /// The request was activated: flash the control and show the ready glyph
    fn on_start(&self);

    /// The host engine reported that audio actually began
    fn on_speaking(&self) {}

    /// The activation flash is over
    fn on_flash_end(&self) {}

    /// Playback completed, back to idle
    fn on_end(&self);

    /// Playback failed, show the error glyph
    fn on_error(&self);

    /// The error glyph timed out, back to the ready glyph
    fn on_ready(&self) {}
}

/// Optional, non-owning reference to a [`PlaybackControl`]
#[derive(Clone, Default)]
pub struct ControlHandle(Option<Weak<dyn PlaybackControl>>);

impl ControlHandle {
    /// A handle that refers to nothing
    pub fn none() -> Self {
        Self(None)
    }

    /// Downgrade a control into a handle
    pub fn new<C: PlaybackControl + 'static>(control: &Arc<C>) -> Self {
        let control: Arc<dyn PlaybackControl> = control.clone();
        Self(Some(Arc::downgrade(&control)))
    }

    /// Whether the handle still points at a live control
    pub fn is_live(&self) -> bool {
        self.0.as_ref().is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Run `f` against the control if it is still alive
    pub fn with<F: FnOnce(&dyn PlaybackControl)>(&self, f: F) {
        if let Some(control) = self.0.as_ref().and_then(Weak::upgrade) {
            f(control.as_ref());
        }
    }
}

impl fmt::Debug for ControlHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            None => f.write_str("ControlHandle(none)"),
            Some(_) if self.is_live() => f.write_str("ControlHandle(live)"),
            Some(_) => f.write_str("ControlHandle(dropped)"),
        }
    }
}

/// Snapshot of an [`AudioButton`]'s visual state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ButtonState {
    pub glyph: Glyph,

    /// Short highlight right after activation
    pub playing: bool,

    /// Audio is coming out of the speakers
    pub speaking: bool,

    /// A pronunciation guide is open for this button
    pub guide_open: bool,
}

impl Default for ButtonState {
    fn default() -> Self {
        Self {
            glyph: Glyph::Ready,
            playing: false,
            speaking: false,
            guide_open: false,
        }
    }
}

/// The speaker button shown on word cards and next to example sentences
#[derive(Debug, Default)]
pub struct AudioButton {
    state: Mutex<ButtonState>,
}

impl AudioButton {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn state(&self) -> ButtonState {
        *self.state.lock()
    }

    pub(crate) fn set_guide_open(&self, open: bool) {
        self.state.lock().guide_open = open;
    }
}

impl PlaybackControl for AudioButton {
    fn on_start(&self) {
        let mut state = self.state.lock();
        state.playing = true;
        state.glyph = Glyph::Ready;
    }

    fn on_speaking(&self) {
        self.state.lock().speaking = true;
    }

    fn on_flash_end(&self) {
        self.state.lock().playing = false;
    }

    fn on_end(&self) {
        let mut state = self.state.lock();
        state.playing = false;
        state.speaking = false;
        state.glyph = Glyph::Ready;
    }

    fn on_error(&self) {
        let mut state = self.state.lock();
        state.playing = false;
        state.speaking = false;
        state.glyph = Glyph::Error;
    }

    fn on_ready(&self) {
        self.state.lock().glyph = Glyph::Ready;
    }
}
