//! Output contracts from the engine.
//!
//! Outputs carry the joint poses written this update, keyed by joint name, and a
//! separate list of playback events. Hosts apply the changes and transport events.

use serde::{Deserialize, Serialize};

use crate::data::JointPose;

/// One joint's pose after this update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub joint: String,
    pub pose: JointPose,
}

/// Discrete playback signals emitted during `Engine::update` and control calls.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum EngineEvent {
    PlaybackStarted { clip: String },
    PlaybackPaused,
    PlaybackResumed,
    PlaybackStopped,
    ClipLooped { clip: String },
    PlaybackEnded { time: f32 },
    /// More fixed ticks were due than `max_substeps` allows; the surplus was dropped.
    SubstepsClamped { requested: u32, performed: u32 },
}

/// Outputs returned by `Engine::update()`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(default)]
    pub events: Vec<EngineEvent>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.changes.clear();
        self.events.clear();
    }

    #[inline]
    pub fn push_change(&mut self, change: Change) {
        self.changes.push(change);
    }

    #[inline]
    pub fn push_event(&mut self, event: EngineEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.events.is_empty()
    }
}
