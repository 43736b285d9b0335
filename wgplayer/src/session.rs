//! Per-track playback session state

use wgproxy::Track;

/// Coarse playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Loading,
    Playing,
}

/// Observable state of the active playback session
///
/// All playback control flows through a single session; a new `begin`
/// resets the timers and the retry counter for the incoming track.
#[derive(Debug, Clone, Default)]
pub struct PlaybackSession {
    pub state: PlaybackState,
    pub track: Option<Track>,
    /// Elapsed seconds, updated on every time-update tick
    pub position: f64,
    /// Total seconds, zero until metadata is known
    pub duration: f64,
    /// Attempts consumed for the current track
    pub retry_count: u32,
    /// Transient "retrying" status line, empty when idle
    pub status: String,
    /// User-visible error, empty when none
    pub error: String,
}

impl PlaybackSession {
    /// Reset the session for a new track
    pub fn begin(&mut self, track: Track) {
        self.state = PlaybackState::Loading;
        self.track = Some(track);
        self.position = 0.0;
        self.duration = 0.0;
        self.retry_count = 0;
        self.status.clear();
        self.error.clear();
    }

    /// Progress ratio in `0.0..=1.0`, recomputed from position and duration
    pub fn progress(&self) -> f64 {
        if self.duration > 0.0 {
            (self.position / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Identifier of the current track, if one is loaded
    pub fn track_id(&self) -> Option<&str> {
        self.track.as_ref().map(|t| t.id.as_str())
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_loading(&self) -> bool {
        self.state == PlaybackState::Loading
    }
}
