//! Controller module - Application logic and event handling
//!
//! Handles user input and coordinates between the model, the playback
//! controller and the catalog client. Organized by responsibility:
//!
//! - `input`: Key event handling
//! - `playback`: Transport, volume and track stepping
//! - `navigation`: Albums, catalog browsing, dialogs and import
//! - `player_events`: Media event and app event listeners

mod input;
mod playback;
mod navigation;
mod player_events;

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::model::{
    AppModel, CatalogClient, CatalogError, LibraryError, PlaybackController, SettingsSlots,
};

/// Events raised outside the input loop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppEvent {
    TrackEnded,
}

/// List that "next" and "previous" walk for the loaded song
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum PlayContext {
    #[default]
    Library,
    Browse,
}

#[derive(Clone)]
pub struct AppController {
    pub(crate) model: Arc<Mutex<AppModel>>,
    pub(crate) player: Arc<Mutex<PlaybackController>>,
    pub(crate) catalog: CatalogClient,
    pub(crate) slots: SettingsSlots,
    play_context: Arc<Mutex<PlayContext>>,
}

impl AppController {
    pub fn new(
        model: Arc<Mutex<AppModel>>,
        player: Arc<Mutex<PlaybackController>>,
        catalog: CatalogClient,
        slots: SettingsSlots,
    ) -> Self {
        Self {
            model,
            player,
            catalog,
            slots,
            play_context: Arc::new(Mutex::new(PlayContext::default())),
        }
    }

    pub(crate) async fn play_context(&self) -> PlayContext {
        *self.play_context.lock().await
    }

    /// Run a player action on its own task. Loading a source can mean a full
    /// download, and the input loop must keep drawing meanwhile.
    pub(crate) fn spawn_player_action<F, Fut>(&self, action: F)
    where
        F: FnOnce(AppController) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(action(self.clone()));
    }

    pub(crate) async fn set_play_context(&self, context: PlayContext) {
        *self.play_context.lock().await = context;
    }

    pub(crate) fn format_error(error: &anyhow::Error) -> String {
        if let Some(catalog) = error.downcast_ref::<CatalogError>() {
            return match catalog {
                CatalogError::Status(status) if status.as_u16() == 401 || status.as_u16() == 403 => {
                    "The music catalog rejected the client id.".to_string()
                }
                CatalogError::Status(status) if status.as_u16() == 429 => {
                    "Rate limited by the music catalog. Please wait a moment.".to_string()
                }
                CatalogError::Transport(_) => "Could not reach the music catalog.".to_string(),
                other => format!("Catalog error: {}", other),
            };
        }
        if let Some(library) = error.downcast_ref::<LibraryError>() {
            return library.to_string();
        }
        format!("Error: {}", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use tokio::sync::Notify;

    use crate::model::{
        ActiveSection, ItemId, LibraryManager, MediaElement, MemoryStore, PlaybackError, Song,
        StoreWriter, TransportState, DEFAULT_API_BASE,
    };

    /// Media element whose `play` waits until the gate opens
    struct GatedElement(Option<Arc<Notify>>);

    #[async_trait]
    impl MediaElement for GatedElement {
        fn set_source(&mut self, _locator: Option<&str>) {}

        async fn play(&mut self) -> Result<(), PlaybackError> {
            if let Some(gate) = &self.0 {
                gate.notified().await;
            }
            Ok(())
        }

        fn pause(&mut self) {}

        fn set_current_time(&mut self, _seconds: f64) {}

        fn set_volume(&mut self, _level: f64) {}

        fn set_muted(&mut self, _muted: bool) {}
    }

    fn song(id: &str) -> Song {
        Song {
            id: ItemId::from(id),
            title: id.to_uppercase(),
            artist: "Artist".into(),
            url: format!("https://cdn.example/{}.mp3", id),
            cover_url: None,
        }
    }

    async fn app(gate: Option<Arc<Notify>>) -> AppController {
        let writer = StoreWriter::spawn(Arc::new(MemoryStore::new()), None);
        let model = AppModel::new(LibraryManager::new(writer), 271);
        let slots = SettingsSlots::in_memory();
        let player = PlaybackController::new(Box::new(GatedElement(gate)), slots.clone()).await;
        AppController::new(
            Arc::new(Mutex::new(model)),
            Arc::new(Mutex::new(player)),
            CatalogClient::new(DEFAULT_API_BASE, "test").unwrap(),
            slots,
        )
    }

    #[tokio::test]
    async fn enter_returns_while_the_source_is_still_loading() {
        let gate = Arc::new(Notify::new());
        let controller = app(Some(gate.clone())).await;
        {
            let model = controller.model.lock().await;
            let album = model
                .library
                .lock()
                .await
                .create_album("Mix", None, None, vec![song("a")])
                .unwrap();
            model.show_album(album).await;
            model.set_active_section(ActiveSection::MainContent).await;
        }

        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        tokio::time::timeout(Duration::from_millis(500), controller.handle_key_event(enter))
            .await
            .expect("key handling waited on the source")
            .unwrap();

        let volume = KeyEvent::new(KeyCode::Char('+'), KeyModifiers::NONE);
        tokio::time::timeout(Duration::from_millis(500), controller.handle_key_event(volume))
            .await
            .expect("key handling waited on the player")
            .unwrap();

        gate.notify_one();
        let mut state = TransportState::Idle;
        for _ in 0..100 {
            state = controller.player.lock().await.state();
            if state == TransportState::Playing {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(state, TransportState::Playing);
    }

    #[tokio::test]
    async fn restored_catalog_song_steps_through_the_catalog() {
        let controller = app(None).await;
        {
            let model = controller.model.lock().await;
            let mut library = model.library.lock().await;
            library
                .create_album("Mix", None, None, vec![song("a"), song("b")])
                .unwrap();
            library.select_song(song("a"));
            library.select_song(song("900"));
        }

        controller.restore_last_song().await;
        assert_eq!(controller.play_context().await, PlayContext::Browse);

        controller.next_track().await;
        let player = controller.player.lock().await;
        assert_eq!(player.song().map(|s| s.id.clone()), Some(ItemId::from("900")));
        assert_eq!(player.state(), TransportState::LoadedPaused);
    }

    #[tokio::test]
    async fn restored_library_song_keeps_library_context() {
        let controller = app(None).await;
        {
            let model = controller.model.lock().await;
            let mut library = model.library.lock().await;
            library
                .create_album("Mix", None, None, vec![song("a"), song("b")])
                .unwrap();
            library.select_song(song("a"));
        }

        controller.restore_last_song().await;
        assert_eq!(controller.play_context().await, PlayContext::Library);

        controller.next_track().await;
        let player = controller.player.lock().await;
        assert_eq!(player.song().map(|s| s.id.clone()), Some(ItemId::from("b")));
    }

    #[test]
    fn catalog_status_errors_get_friendly_messages() {
        let limited = anyhow::Error::new(CatalogError::Status(reqwest::StatusCode::TOO_MANY_REQUESTS));
        assert!(AppController::format_error(&limited).contains("Rate limited"));

        let denied = anyhow::Error::new(CatalogError::Status(reqwest::StatusCode::UNAUTHORIZED));
        assert!(AppController::format_error(&denied).contains("client id"));
    }

    #[test]
    fn library_errors_pass_through() {
        let err = anyhow::Error::new(LibraryError::EmptyTitle);
        assert_eq!(AppController::format_error(&err), "Album title cannot be empty");
    }

    #[test]
    fn other_errors_are_prefixed() {
        let err = anyhow::anyhow!("disk on fire");
        assert_eq!(AppController::format_error(&err), "Error: disk on fire");
    }
}
