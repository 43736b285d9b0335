//! Track queue with wrap-around auto-advance

use wgproxy::Track;

/// The active track list and the position of the playing track within it
///
/// `advance` implements end-of-track auto-advance: the next index is
/// `(current + 1) mod len`, wrapping from the last track back to the first.
/// When the playing track was started outside the queue (no known
/// position), advance falls back to the first entry of the most recently
/// loaded default list.
#[derive(Debug, Clone, Default)]
pub struct TrackQueue {
    tracks: Vec<Track>,
    index: Option<usize>,
    default_list: Vec<Track>,
}

impl TrackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active list and resolve the playing track's position
    ///
    /// Tracks without an identifier are dropped; a `current_id` not found
    /// in the list leaves the queue without a position.
    pub fn load(&mut self, tracks: Vec<Track>, current_id: Option<&str>) {
        self.tracks = tracks.into_iter().filter(|t| !t.id.is_empty()).collect();
        self.index = current_id.and_then(|id| self.tracks.iter().position(|t| t.id == id));
    }

    /// Remember the default list used when no queue position is known
    pub fn set_default_list(&mut self, tracks: Vec<Track>) {
        self.default_list = tracks.into_iter().filter(|t| !t.id.is_empty()).collect();
    }

    pub fn position(&self) -> Option<usize> {
        self.index
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Move to the next track, wrapping at the end
    ///
    /// Without a known position the queue switches to the default list at
    /// index 0. With no tracks anywhere this is a no-op returning `None`.
    pub fn advance(&mut self) -> Option<Track> {
        match self.index {
            Some(current) if !self.tracks.is_empty() => {
                let next = (current + 1) % self.tracks.len();
                self.index = Some(next);
                Some(self.tracks[next].clone())
            }
            _ => {
                if self.default_list.is_empty() {
                    return None;
                }
                self.tracks = self.default_list.clone();
                self.index = Some(0);
                Some(self.tracks[0].clone())
            }
        }
    }
}
