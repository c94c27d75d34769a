//! Playback controller: transport state over a single media element
//!
//! The controller is the only writer to the media element. The element reports
//! back through [`MediaEvent`]s (time updates while playing, end of track).
//! Volume, mute, the last song id and the playback position are persisted to
//! their own settings slots, independently of the library store.

use async_trait::async_trait;
use thiserror::Error;

use super::settings::{MUTED_KEY, POSITION_KEY, SONG_ID_KEY, SettingsSlots, VOLUME_KEY};
use super::types::Song;

pub const DEFAULT_VOLUME: f64 = 1.0;
pub const VOLUME_STEP: f64 = 0.05;
pub const SEEK_STEP_SECS: f64 = 5.0;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("Playback rejected: {0}")]
    Rejected(String),
    #[error("No song loaded")]
    NothingLoaded,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Idle,
    LoadedPaused,
    Playing,
    Paused,
}

/// Events emitted by the media element
#[derive(Clone, Debug, PartialEq)]
pub enum MediaEvent {
    TimeUpdate { position: f64, duration: f64 },
    Ended,
}

/// The platform audio element the controller drives
#[async_trait]
pub trait MediaElement: Send + Sync {
    fn set_source(&mut self, locator: Option<&str>);

    /// Start or resume playback. May be refused by the platform.
    async fn play(&mut self) -> Result<(), PlaybackError>;

    fn pause(&mut self);

    fn set_current_time(&mut self, seconds: f64);

    fn set_volume(&mut self, level: f64);

    fn set_muted(&mut self, muted: bool);
}

pub type AdvanceCallback = Box<dyn FnMut() + Send + Sync>;

/// Snapshot of the player for rendering
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackInfo {
    pub song: Option<Song>,
    pub state: TransportState,
    pub position: f64,
    pub duration: f64,
    pub volume: f64,
    pub muted: bool,
}

impl PlaybackInfo {
    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }
}

impl Default for PlaybackInfo {
    fn default() -> Self {
        Self {
            song: None,
            state: TransportState::Idle,
            position: 0.0,
            duration: 0.0,
            volume: DEFAULT_VOLUME,
            muted: false,
        }
    }
}

pub struct PlaybackController {
    element: Box<dyn MediaElement>,
    slots: SettingsSlots,
    state: TransportState,
    song: Option<Song>,
    position: f64,
    duration: f64,
    volume: f64,
    muted: bool,
    last_song_id: Option<String>,
    on_ended: Option<AdvanceCallback>,
}

impl PlaybackController {
    /// Build a controller and restore volume and mute from their slots
    pub async fn new(mut element: Box<dyn MediaElement>, slots: SettingsSlots) -> Self {
        let volume = slots
            .get_f64(VOLUME_KEY)
            .await
            .filter(|v| v.is_finite())
            .map(|v| v.clamp(0.0, 1.0))
            .unwrap_or(DEFAULT_VOLUME);
        let muted = slots.get_bool(MUTED_KEY).await.unwrap_or(false);
        let last_song_id = slots.get(SONG_ID_KEY).await;

        element.set_volume(volume);
        element.set_muted(muted);
        tracing::debug!(volume, muted, last_song_id = ?last_song_id, "Playback state restored");

        Self {
            element,
            slots,
            state: TransportState::Idle,
            song: None,
            position: 0.0,
            duration: 0.0,
            volume,
            muted,
            last_song_id,
            on_ended: None,
        }
    }

    /// Callback run when a track plays to its end
    pub fn set_on_ended(&mut self, callback: AdvanceCallback) {
        self.on_ended = Some(callback);
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn song(&self) -> Option<&Song> {
        self.song.as_ref()
    }

    /// Song id saved by the previous session
    pub fn last_song_id(&self) -> Option<&str> {
        self.last_song_id.as_deref()
    }

    /// Position saved by the previous session. Not applied on load.
    pub async fn saved_position(&self) -> Option<f64> {
        self.slots.get_f64(POSITION_KEY).await
    }

    pub fn info(&self) -> PlaybackInfo {
        PlaybackInfo {
            song: self.song.clone(),
            state: self.state,
            position: self.position,
            duration: self.duration,
            volume: self.volume,
            muted: self.muted,
        }
    }

    /// Load a new song (or unload with `None`). The new song starts paused at 0.
    pub async fn set_song(&mut self, song: Option<Song>) {
        match song {
            Some(song) => {
                tracing::info!(song_id = %song.id, title = %song.title, "Loading song");
                self.element.set_source(Some(&song.url));
                self.element.set_current_time(0.0);
                self.element.set_volume(self.volume);
                self.element.set_muted(self.muted);
                self.position = 0.0;
                self.duration = 0.0;
                self.state = TransportState::LoadedPaused;

                let song_id = song.id.to_string();
                if let Err(e) = self.slots.set(SONG_ID_KEY, &song_id).await {
                    tracing::warn!(error = %e, "Could not persist last song id");
                }
                self.last_song_id = Some(song_id);
                self.song = Some(song);
            }
            None => {
                self.element.pause();
                self.element.set_source(None);
                self.position = 0.0;
                self.duration = 0.0;
                self.state = TransportState::Idle;
                self.song = None;
            }
        }
    }

    pub async fn toggle_play(&mut self) -> Result<TransportState, PlaybackError> {
        match self.state {
            TransportState::Playing => {
                self.element.pause();
                self.state = TransportState::Paused;
            }
            TransportState::Idle if self.song.is_none() => {
                return Err(PlaybackError::NothingLoaded);
            }
            TransportState::Idle | TransportState::LoadedPaused | TransportState::Paused => {
                if let Err(e) = self.element.play().await {
                    tracing::warn!(error = %e, "Playback start rejected");
                    if self.state == TransportState::Idle {
                        self.state = TransportState::LoadedPaused;
                    }
                    return Err(e);
                }
                self.state = TransportState::Playing;
            }
        }
        tracing::debug!(state = ?self.state, "Transport toggled");
        Ok(self.state)
    }

    pub fn on_media_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::TimeUpdate { position, duration } => {
                if self.state != TransportState::Playing {
                    return;
                }
                self.position = position.max(0.0);
                if duration.is_finite() && duration > 0.0 {
                    self.duration = duration;
                }
            }
            MediaEvent::Ended => {
                tracing::debug!(song_id = ?self.song.as_ref().map(|s| s.id.to_string()), "Track ended");
                self.state = TransportState::Idle;
                self.position = 0.0;
                if let Some(callback) = self.on_ended.as_mut() {
                    callback();
                }
            }
        }
    }

    pub fn seek(&mut self, seconds: f64) {
        if self.song.is_none() || !seconds.is_finite() {
            return;
        }
        let upper = if self.duration > 0.0 { self.duration } else { f64::MAX };
        let target = seconds.clamp(0.0, upper);
        self.position = target;
        self.element.set_current_time(target);
    }

    pub fn seek_by(&mut self, delta: f64) {
        self.seek(self.position + delta);
    }

    pub async fn set_volume(&mut self, level: f64) {
        if !level.is_finite() {
            return;
        }
        self.volume = level.clamp(0.0, 1.0);
        self.element.set_volume(self.volume);
        if let Err(e) = self.slots.set(VOLUME_KEY, self.volume).await {
            tracing::warn!(error = %e, "Could not persist volume");
        }
    }

    pub async fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        self.element.set_muted(self.muted);
        if let Err(e) = self.slots.set(MUTED_KEY, self.muted).await {
            tracing::warn!(error = %e, "Could not persist mute flag");
        }
    }

    /// Save the current position while playing. Returns whether it wrote.
    pub async fn persist_position(&self) -> bool {
        if self.state != TransportState::Playing || self.song.is_none() {
            return false;
        }
        match self.slots.set(POSITION_KEY, self.position).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Could not persist playback position");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::ItemId;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default, Debug)]
    struct ElementLog {
        source: Option<String>,
        playing: bool,
        current_time: f64,
        volume: f64,
        muted: bool,
        reject_play: bool,
    }

    struct FakeElement(Arc<Mutex<ElementLog>>);

    #[async_trait]
    impl MediaElement for FakeElement {
        fn set_source(&mut self, locator: Option<&str>) {
            self.0.lock().unwrap().source = locator.map(str::to_string);
        }

        async fn play(&mut self) -> Result<(), PlaybackError> {
            let mut log = self.0.lock().unwrap();
            if log.reject_play {
                return Err(PlaybackError::Rejected("autoplay blocked".into()));
            }
            log.playing = true;
            Ok(())
        }

        fn pause(&mut self) {
            self.0.lock().unwrap().playing = false;
        }

        fn set_current_time(&mut self, seconds: f64) {
            self.0.lock().unwrap().current_time = seconds;
        }

        fn set_volume(&mut self, level: f64) {
            self.0.lock().unwrap().volume = level;
        }

        fn set_muted(&mut self, muted: bool) {
            self.0.lock().unwrap().muted = muted;
        }
    }

    fn song(id: &str) -> Song {
        Song {
            id: ItemId::from(id),
            title: id.to_uppercase(),
            artist: "Artist".into(),
            url: format!("file:///music/{}.mp3", id),
            cover_url: None,
        }
    }

    async fn controller(slots: SettingsSlots) -> (PlaybackController, Arc<Mutex<ElementLog>>) {
        let log = Arc::new(Mutex::new(ElementLog::default()));
        let player = PlaybackController::new(Box::new(FakeElement(log.clone())), slots).await;
        (player, log)
    }

    #[tokio::test]
    async fn new_song_loads_paused_at_zero() {
        let (mut player, log) = controller(SettingsSlots::in_memory()).await;
        assert_eq!(player.state(), TransportState::Idle);

        player.set_song(Some(song("a"))).await;
        player.toggle_play().await.unwrap();
        player.on_media_event(MediaEvent::TimeUpdate { position: 30.0, duration: 200.0 });

        player.set_song(Some(song("b"))).await;
        let info = player.info();
        assert_eq!(info.state, TransportState::LoadedPaused);
        assert_eq!(info.position, 0.0);
        assert_eq!(log.lock().unwrap().source.as_deref(), Some("file:///music/b.mp3"));
        assert_eq!(log.lock().unwrap().current_time, 0.0);
    }

    #[tokio::test]
    async fn toggle_moves_between_playing_and_paused() {
        let (mut player, log) = controller(SettingsSlots::in_memory()).await;
        assert_eq!(player.toggle_play().await, Err(PlaybackError::NothingLoaded));

        player.set_song(Some(song("a"))).await;
        assert_eq!(player.toggle_play().await, Ok(TransportState::Playing));
        assert!(log.lock().unwrap().playing);
        assert_eq!(player.toggle_play().await, Ok(TransportState::Paused));
        assert!(!log.lock().unwrap().playing);
        assert_eq!(player.toggle_play().await, Ok(TransportState::Playing));
    }

    #[tokio::test]
    async fn rejected_play_stays_paused() {
        let (mut player, log) = controller(SettingsSlots::in_memory()).await;
        player.set_song(Some(song("a"))).await;
        log.lock().unwrap().reject_play = true;

        assert!(matches!(player.toggle_play().await, Err(PlaybackError::Rejected(_))));
        assert_eq!(player.state(), TransportState::LoadedPaused);
    }

    #[tokio::test]
    async fn time_updates_only_apply_while_playing() {
        let (mut player, _) = controller(SettingsSlots::in_memory()).await;
        player.set_song(Some(song("a"))).await;
        player.on_media_event(MediaEvent::TimeUpdate { position: 12.0, duration: 100.0 });
        assert_eq!(player.info().position, 0.0);

        player.toggle_play().await.unwrap();
        player.on_media_event(MediaEvent::TimeUpdate { position: 12.0, duration: 100.0 });
        assert_eq!(player.info().position, 12.0);
        assert_eq!(player.info().duration, 100.0);
    }

    #[tokio::test]
    async fn ended_resets_and_requests_advance() {
        let (mut player, _) = controller(SettingsSlots::in_memory()).await;
        let advanced = Arc::new(AtomicUsize::new(0));
        let counter = advanced.clone();
        player.set_on_ended(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        player.set_song(Some(song("a"))).await;
        player.toggle_play().await.unwrap();
        player.on_media_event(MediaEvent::TimeUpdate { position: 99.0, duration: 100.0 });
        player.on_media_event(MediaEvent::Ended);

        assert_eq!(player.state(), TransportState::Idle);
        assert_eq!(player.info().position, 0.0);
        assert_eq!(advanced.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn seek_is_optimistic_and_clamped() {
        let (mut player, log) = controller(SettingsSlots::in_memory()).await;
        player.seek(10.0);
        assert_eq!(player.info().position, 0.0);

        player.set_song(Some(song("a"))).await;
        player.toggle_play().await.unwrap();
        player.on_media_event(MediaEvent::TimeUpdate { position: 1.0, duration: 60.0 });

        player.seek(42.0);
        assert_eq!(player.info().position, 42.0);
        assert_eq!(log.lock().unwrap().current_time, 42.0);

        player.seek(500.0);
        assert_eq!(player.info().position, 60.0);
        player.seek_by(-100.0);
        assert_eq!(player.info().position, 0.0);
    }

    #[tokio::test]
    async fn volume_and_mute_persist_across_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        {
            let slots = SettingsSlots::load(&path).await.unwrap();
            let (mut player, log) = controller(slots).await;
            player.set_volume(0.4).await;
            player.toggle_mute().await;
            player.set_song(Some(song("42"))).await;
            assert!(log.lock().unwrap().muted);
        }

        let slots = SettingsSlots::load(&path).await.unwrap();
        let (player, log) = controller(slots).await;
        let info = player.info();
        assert_eq!(info.volume, 0.4);
        assert!(info.muted);
        assert_eq!(player.last_song_id(), Some("42"));
        assert_eq!(log.lock().unwrap().volume, 0.4);
        assert_eq!(info.position, 0.0);
    }

    #[tokio::test]
    async fn volume_is_clamped() {
        let (mut player, _) = controller(SettingsSlots::in_memory()).await;
        player.set_volume(1.7).await;
        assert_eq!(player.info().volume, 1.0);
        player.set_volume(-0.3).await;
        assert_eq!(player.info().volume, 0.0);
    }

    #[tokio::test]
    async fn position_is_saved_only_while_playing() {
        let slots = SettingsSlots::in_memory();
        let (mut player, _) = controller(slots.clone()).await;
        player.set_song(Some(song("a"))).await;
        assert!(!player.persist_position().await);

        player.toggle_play().await.unwrap();
        player.on_media_event(MediaEvent::TimeUpdate { position: 17.5, duration: 100.0 });
        assert!(player.persist_position().await);
        assert_eq!(player.saved_position().await, Some(17.5));

        player.toggle_play().await.unwrap();
        player.on_media_event(MediaEvent::TimeUpdate { position: 18.0, duration: 100.0 });
        assert!(!player.persist_position().await);
        assert_eq!(slots.get_f64(POSITION_KEY).await, Some(17.5));
    }
}
