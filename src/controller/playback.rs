//! Playback control methods

use crate::model::playback::{SEEK_STEP_SECS, VOLUME_STEP};
use crate::model::{ContentView, ItemId, PlaybackError, Song, TransportState};

use super::{AppController, PlayContext};

impl AppController {
    pub async fn toggle_playback(&self) {
        let mut player = self.player.lock().await;
        let result = player.toggle_play().await;
        drop(player);

        match result {
            Ok(state) => {
                tracing::info!(
                    action = if state == TransportState::Playing { "resumed" } else { "paused" },
                    "Playback toggled"
                );
            }
            Err(PlaybackError::NothingLoaded) => {
                let model = self.model.lock().await;
                model.notify("Select a song to play").await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Toggle playback failed");
                let model = self.model.lock().await;
                model.notify_error(e.to_string()).await;
            }
        }
    }

    /// Make `song` current, load it, and start it when `autoplay` is set
    pub(crate) async fn play_song(&self, song: Song, context: PlayContext, autoplay: bool) {
        tracing::debug!(song_id = %song.id, ?context, autoplay, "Playing song");
        {
            let model = self.model.lock().await;
            model.library.lock().await.select_song(song.clone());
        }
        self.set_play_context(context).await;

        let mut player = self.player.lock().await;
        player.set_song(Some(song)).await;
        if !autoplay {
            return;
        }
        let result = player.toggle_play().await;
        drop(player);

        if let Err(e) = result {
            let model = self.model.lock().await;
            model.notify_error(e.to_string()).await;
        }
    }

    /// Load the saved current song, paused. A song missing from the library
    /// was started from the catalog, so stepping from it walks the browse list.
    pub async fn restore_last_song(&self) {
        let (song, in_library) = {
            let model = self.model.lock().await;
            let library = model.library.lock().await;
            let song = library.current_song().cloned();
            let in_library = song.as_ref().is_some_and(|s| library.contains_song(&s.id));
            (song, in_library)
        };
        let Some(song) = song else {
            return;
        };

        let context = if in_library {
            PlayContext::Library
        } else {
            PlayContext::Browse
        };
        tracing::info!(song_id = %song.id, ?context, "Restoring last song");
        self.set_play_context(context).await;
        self.player.lock().await.set_song(Some(song)).await;
    }

    pub async fn next_track(&self) {
        self.step_track(1, true).await;
    }

    pub async fn previous_track(&self) {
        self.step_track(-1, true).await;
    }

    /// Called when a track plays to its end; the next song loads paused
    pub(crate) async fn advance_after_end(&self) {
        self.step_track(1, false).await;
    }

    /// Move through the list the current song was started from. When
    /// `keep_playing` is set, playback continues if it was running.
    async fn step_track(&self, delta: isize, keep_playing: bool) {
        let (current_id, was_playing) = {
            let player = self.player.lock().await;
            (
                player.song().map(|s| s.id.clone()),
                player.state() == TransportState::Playing,
            )
        };
        let context = self.play_context().await;

        let next = match context {
            PlayContext::Library => {
                let model = self.model.lock().await;
                let mut library = model.library.lock().await;
                if delta > 0 {
                    library.next_song()
                } else {
                    library.previous_song()
                }
            }
            PlayContext::Browse => match current_id {
                Some(id) => {
                    let model = self.model.lock().await;
                    let content = model.content_state.lock().await;
                    content.browse.neighbour(&id, delta).map(|t| t.to_song())
                }
                None => None,
            },
        };

        let Some(song) = next else {
            tracing::debug!(?context, "No track to step to");
            return;
        };
        tracing::info!(song_id = %song.id, title = %song.title, delta, "Stepping track");

        match context {
            PlayContext::Library => {
                let mut player = self.player.lock().await;
                player.set_song(Some(song)).await;
                if keep_playing && was_playing {
                    if let Err(e) = player.toggle_play().await {
                        drop(player);
                        self.model.lock().await.notify_error(e.to_string()).await;
                    }
                }
            }
            PlayContext::Browse => {
                self.play_song(song, PlayContext::Browse, keep_playing && was_playing)
                    .await;
            }
        }
    }

    pub async fn seek_forward(&self) {
        self.player.lock().await.seek_by(SEEK_STEP_SECS);
    }

    pub async fn seek_backward(&self) {
        self.player.lock().await.seek_by(-SEEK_STEP_SECS);
    }

    pub async fn volume_up(&self) {
        let mut player = self.player.lock().await;
        let volume = player.info().volume;
        player.set_volume(volume + VOLUME_STEP).await;
    }

    pub async fn volume_down(&self) {
        let mut player = self.player.lock().await;
        let volume = player.info().volume;
        player.set_volume(volume - VOLUME_STEP).await;
    }

    pub async fn toggle_mute(&self) {
        let mut player = self.player.lock().await;
        player.toggle_mute().await;
        tracing::debug!(muted = player.info().muted, "Mute toggled");
    }

    /// Shuffle the open (or highlighted) album and start its new first song
    pub async fn shuffle_album(&self) {
        let model = self.model.lock().await;
        let album_id: Option<ItemId> = match &model.content_state.lock().await.view {
            ContentView::AlbumTracks { album_id, .. } => Some(album_id.clone()),
            _ => None,
        };
        let album_id = match album_id {
            Some(id) => Some(id),
            None => model.selected_album_id().await,
        };
        let Some(album_id) = album_id else {
            return;
        };

        let result = model.library.lock().await.shuffle_album(&album_id);
        match result {
            Ok(Some(first)) => {
                model.notify("Album shuffled").await;
                drop(model);
                self.play_song(first, PlayContext::Library, true).await;
            }
            Ok(None) => {
                model.notify("This album has no songs").await;
            }
            Err(e) => {
                model.notify_error(e.to_string()).await;
            }
        }
    }
}
