//! Playback controller
//!
//! Owns the single active playback session: all play/pause/next/volume
//! operations flow through here, and a new track is only started after the
//! previous one is fully stopped, so two plays can never race on the same
//! sink. Start failures hand off to the retry scheduler; retries that come
//! due arrive back through [`PlayerController::handle_retry`].

use crate::client::StreamApi;
use crate::error::{Error, Result};
use crate::queue::TrackQueue;
use crate::retry::{RetryFired, RetryPolicy, RetryScheduler};
use crate::session::{PlaybackSession, PlaybackState};
use crate::sink::{AudioSink, SinkEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use wgcatalog::{pick_audio_url, CatalogProvider};
use wgproxy::Track;

/// Grace delay between assigning a source and starting playback, letting
/// buffering begin
pub const START_GRACE_MS: u64 = 500;

/// Volume step for the up/down controls
pub const VOLUME_STEP: u8 = 5;

/// Drives an [`AudioSink`] through the playback lifecycle
pub struct PlayerController {
    sink: Arc<dyn AudioSink>,
    api: Arc<dyn StreamApi>,
    policy: RetryPolicy,
    scheduler: RetryScheduler,
    session: PlaybackSession,
    queue: TrackQueue,
    related: Arc<RwLock<Vec<Track>>>,
    start_grace: Duration,
    volume: u8,
    muted: bool,
}

impl PlayerController {
    /// Create a controller and the receiver its scheduled retries fire on
    ///
    /// The caller owns the receive loop: forward each [`RetryFired`] to
    /// [`handle_retry`](Self::handle_retry).
    pub fn new(
        sink: Arc<dyn AudioSink>,
        api: Arc<dyn StreamApi>,
        policy: RetryPolicy,
    ) -> (Self, UnboundedReceiver<RetryFired>) {
        let (scheduler, retry_rx) = RetryScheduler::new();
        let controller = PlayerController {
            sink,
            api,
            policy,
            scheduler,
            session: PlaybackSession::default(),
            queue: TrackQueue::new(),
            related: Arc::new(RwLock::new(Vec::new())),
            start_grace: Duration::from_millis(START_GRACE_MS),
            volume: 100,
            muted: false,
        };
        (controller, retry_rx)
    }

    /// Observable session state
    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    /// The active track queue
    pub fn queue(&self) -> &TrackQueue {
        &self.queue
    }

    /// Remember the list auto-advance falls back to when the playing track
    /// has no queue position
    pub fn set_default_list(&mut self, tracks: Vec<Track>) {
        self.queue.set_default_list(tracks);
    }

    /// Other tracks by the current artist, populated best-effort after play
    pub fn related_tracks(&self) -> Arc<RwLock<Vec<Track>>> {
        Arc::clone(&self.related)
    }

    /// Start playing a track, optionally within a queue
    ///
    /// A track without an identifier is rejected with a user-visible error
    /// and nothing else happens. Otherwise the current audio is fully
    /// stopped, the track's queue position is resolved, the retry counter
    /// and any pending retry are reset, and playback starts after a short
    /// grace delay. A start failure hands off to the retry scheduler
    /// rather than surfacing here.
    pub async fn play(&mut self, track: Track, queue: Option<Vec<Track>>) -> Result<()> {
        if track.id.is_empty() {
            self.session.error = Error::MissingTrackId.to_string();
            return Err(Error::MissingTrackId);
        }

        self.sink.stop().await?;
        self.scheduler.cancel_pending();

        if let Some(list) = queue {
            self.queue.load(list, Some(&track.id));
        }

        self.spawn_related_fetch(&track.user.id);
        self.session.begin(track);
        self.start_current().await
    }

    /// Pause playback and cancel any pending retry
    pub async fn pause(&mut self) -> Result<()> {
        self.scheduler.cancel_pending();
        self.session.retry_count = 0;
        self.session.status.clear();
        self.session.state = PlaybackState::Stopped;
        self.sink.pause().await
    }

    /// Resume the paused track; a failure hands off to the retry scheduler
    pub async fn resume(&mut self) -> Result<()> {
        if self.session.track.is_none() {
            return Ok(());
        }
        match self.sink.play().await {
            Ok(()) => {
                self.session.state = PlaybackState::Playing;
                self.session.error.clear();
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Resume failed, scheduling retry");
                self.begin_retry();
                Ok(())
            }
        }
    }

    /// Skip to the next queue entry (wrapping at the end)
    pub async fn next(&mut self) -> Result<()> {
        match self.queue.advance() {
            Some(track) => self.play(track, None).await,
            None => Ok(()),
        }
    }

    /// React to a sink event
    ///
    /// Natural end of media auto-advances the queue; a sink error consumes
    /// retry budget like a failed start.
    pub async fn handle_event(&mut self, event: SinkEvent) -> Result<()> {
        match event {
            SinkEvent::TimeUpdate { position } => {
                self.session.position = position;
                Ok(())
            }
            SinkEvent::LoadedMetadata { duration } => {
                self.session.duration = duration;
                Ok(())
            }
            SinkEvent::Started => {
                self.session.state = PlaybackState::Playing;
                self.session.retry_count = 0;
                self.session.status.clear();
                self.session.error.clear();
                Ok(())
            }
            SinkEvent::Ended => {
                debug!("Track ended, advancing queue");
                self.next().await
            }
            SinkEvent::Error(message) => {
                warn!(error = %message, "Sink reported a playback error");
                self.begin_retry();
                Ok(())
            }
        }
    }

    /// Re-attempt playback for a retry that came due
    ///
    /// Fired retries for a superseded track are dropped; cancellation plus
    /// this check means stale retries never touch the current track.
    pub async fn handle_retry(&mut self, fired: RetryFired) -> Result<()> {
        if self.session.track_id() != Some(fired.track_id.as_str()) {
            debug!(track_id = %fired.track_id, "Dropping stale retry");
            return Ok(());
        }
        debug!(track_id = %fired.track_id, attempt = fired.attempt, "Retry firing");
        self.start_current().await
    }

    /// Set the volume, clamped to `0..=100`
    pub async fn set_volume(&mut self, volume: u8) -> Result<()> {
        self.volume = volume.min(100);
        self.apply_volume().await
    }

    /// Raise the volume one step; also unmutes
    pub async fn volume_up(&mut self) -> Result<()> {
        self.muted = false;
        self.set_volume(self.volume.saturating_add(VOLUME_STEP)).await
    }

    /// Lower the volume one step; also unmutes
    pub async fn volume_down(&mut self) -> Result<()> {
        self.muted = false;
        self.set_volume(self.volume.saturating_sub(VOLUME_STEP)).await
    }

    pub async fn mute(&mut self) -> Result<()> {
        self.muted = true;
        self.apply_volume().await
    }

    pub async fn unmute(&mut self) -> Result<()> {
        self.muted = false;
        self.apply_volume().await
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Push the effective volume to the sink
    async fn apply_volume(&self) -> Result<()> {
        self.sink.set_volume(self.effective_volume()).await
    }

    /// Sink-facing volume: zero while muted
    pub fn effective_volume(&self) -> f64 {
        if self.muted {
            0.0
        } else {
            f64::from(self.volume) / 100.0
        }
    }

    /// Load a random catalog URL for a category and assign it as the source
    ///
    /// On failure the error (which names the category) becomes the
    /// user-visible session error and no source is assigned.
    pub async fn load_category(
        &mut self,
        provider: &dyn CatalogProvider,
        category: Option<&str>,
    ) -> Result<String> {
        match pick_audio_url(provider, category).await {
            Ok(url) => {
                self.sink.set_source(&url).await?;
                self.session.error.clear();
                Ok(url)
            }
            Err(err) => {
                self.session.error = err.to_string();
                Err(err.into())
            }
        }
    }

    /// Assign the stream source and attempt to start after the grace delay
    async fn start_current(&mut self) -> Result<()> {
        let Some(track_id) = self.session.track_id().map(str::to_string) else {
            return Ok(());
        };

        let url = self.api.stream_url(&track_id);
        let started = async {
            self.sink.set_source(&url).await?;
            self.sink.set_volume(self.effective_volume()).await?;
            tokio::time::sleep(self.start_grace).await;
            self.sink.play().await
        }
        .await;

        match started {
            Ok(()) => {
                self.session.state = PlaybackState::Playing;
                self.session.retry_count = 0;
                self.session.status.clear();
                self.session.error.clear();
                Ok(())
            }
            Err(err) => {
                warn!(track_id = %track_id, error = %err, "Playback start failed");
                self.begin_retry();
                Ok(())
            }
        }
    }

    /// Consume one retry attempt, or give up when the budget is spent
    fn begin_retry(&mut self) {
        let Some(track_id) = self.session.track_id().map(str::to_string) else {
            return;
        };

        if self.session.retry_count >= self.policy.max_attempts {
            self.session.error = Error::RetriesExhausted {
                attempts: self.policy.max_attempts,
            }
            .to_string();
            self.session.status.clear();
            self.session.state = PlaybackState::Stopped;
            warn!(track_id = %track_id, "Retry budget exhausted");
            return;
        }

        // Counter increments before the wait is scheduled
        let delay = self.policy.delay_for(self.session.retry_count);
        self.session.retry_count += 1;
        self.session.status = format!(
            "Retrying... ({}/{})",
            self.session.retry_count, self.policy.max_attempts
        );
        self.session.state = PlaybackState::Loading;
        self.scheduler
            .schedule(&track_id, self.session.retry_count, delay);
    }

    /// Best-effort fetch of the artist's other tracks; failures are logged,
    /// never surfaced as a playback error
    fn spawn_related_fetch(&self, user_id: &str) {
        let api = Arc::clone(&self.api);
        let related = Arc::clone(&self.related);
        let user_id = user_id.to_string();
        tokio::spawn(async move {
            match api.artist_tracks(&user_id).await {
                Ok(tracks) => *related.write().await = tracks,
                Err(err) => debug!(user_id = %user_id, error = %err, "Related-tracks fetch failed"),
            }
        });
    }
}
