//! Main application model with state management

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use super::content::{ContentState, ContentView, PageRequest};
use super::library::LibraryManager;
use super::types::{
    ActiveSection, Album, AlbumFormField, Dialog, ItemId, NavItem, Notification,
    NotificationKind, Song, UiState,
};

const NOTIFICATION_TTL_SECS: u64 = 5;

/// Read-only copy of the library for rendering
#[derive(Clone, Debug, Default)]
pub struct LibrarySnapshot {
    pub albums: Vec<Album>,
    pub current_song_id: Option<ItemId>,
    pub current_album_id: Option<ItemId>,
}

/// What the selected row of the main content area refers to
#[derive(Clone, Debug, PartialEq)]
pub enum SelectedItem {
    AlbumSong { album_id: ItemId, song: Song },
    CatalogTrack { index: usize },
}

/// Main application model containing all state
pub struct AppModel {
    pub library: Arc<Mutex<LibraryManager>>,
    pub ui_state: Arc<Mutex<UiState>>,
    pub content_state: Arc<Mutex<ContentState>>,
    pub should_quit: Arc<Mutex<bool>>,
}

impl AppModel {
    pub fn new(library: LibraryManager, accent_hue: u16) -> Self {
        let ui_state = UiState {
            accent_hue,
            ..UiState::default()
        };
        Self {
            library: Arc::new(Mutex::new(library)),
            ui_state: Arc::new(Mutex::new(ui_state)),
            content_state: Arc::new(Mutex::new(ContentState::default())),
            should_quit: Arc::new(Mutex::new(false)),
        }
    }

    pub async fn should_quit(&self) -> bool {
        *self.should_quit.lock().await
    }

    pub async fn set_should_quit(&self, quit: bool) {
        *self.should_quit.lock().await = quit;
    }

    pub async fn library_snapshot(&self) -> LibrarySnapshot {
        let library = self.library.lock().await;
        LibrarySnapshot {
            albums: library.albums().to_vec(),
            current_song_id: library.current_song().map(|s| s.id.clone()),
            current_album_id: library.current_album().map(|a| a.id.clone()),
        }
    }

    // ========================================================================
    // Sections & selection
    // ========================================================================

    pub async fn get_ui_state(&self) -> UiState {
        self.ui_state.lock().await.clone()
    }

    pub async fn cycle_section_forward(&self) {
        let mut state = self.ui_state.lock().await;
        state.active_section = state.active_section.next();
    }

    pub async fn cycle_section_backward(&self) {
        let mut state = self.ui_state.lock().await;
        state.active_section = state.active_section.prev();
    }

    pub async fn set_active_section(&self, section: ActiveSection) {
        let mut state = self.ui_state.lock().await;
        state.active_section = section;
    }

    pub async fn move_selection_up(&self) {
        let mut state = self.ui_state.lock().await;
        match state.active_section {
            ActiveSection::Navigation => {
                state.nav_selected = state.nav_selected.saturating_sub(1);
            }
            ActiveSection::Albums => {
                state.album_selected = state.album_selected.saturating_sub(1);
            }
            _ => {}
        }
    }

    pub async fn move_selection_down(&self) {
        let album_count = self.library.lock().await.albums().len();
        let mut state = self.ui_state.lock().await;
        match state.active_section {
            ActiveSection::Navigation => {
                if state.nav_selected < NavItem::ALL.len() - 1 {
                    state.nav_selected += 1;
                }
            }
            ActiveSection::Albums => {
                if state.album_selected < album_count.saturating_sub(1) {
                    state.album_selected += 1;
                }
            }
            _ => {}
        }
    }

    pub async fn selected_nav_item(&self) -> NavItem {
        let state = self.ui_state.lock().await;
        NavItem::ALL
            .get(state.nav_selected)
            .copied()
            .unwrap_or(NavItem::MyMusic)
    }

    /// Album highlighted in the sidebar
    pub async fn selected_album_id(&self) -> Option<ItemId> {
        let index = self.ui_state.lock().await.album_selected;
        let library = self.library.lock().await;
        library.albums().get(index).map(|a| a.id.clone())
    }

    /// Keep selections inside the current album and song counts
    pub async fn clamp_selections(&self) {
        let mut guard = self.content_state.lock().await;
        let content = &mut *guard;
        let library = self.library.lock().await;
        let album_count = library.albums().len();

        if let ContentView::AlbumTracks {
            album_id,
            selected_index,
        } = &mut content.view
        {
            match library.album(album_id) {
                Some(album) => {
                    *selected_index = (*selected_index).min(album.songs.len().saturating_sub(1));
                }
                None => content.view = ContentView::Empty,
            }
        }
        drop(library);
        drop(guard);

        let mut state = self.ui_state.lock().await;
        state.album_selected = state.album_selected.min(album_count.saturating_sub(1));
    }

    pub async fn append_to_search(&self, c: char) {
        let mut state = self.ui_state.lock().await;
        state.search_query.push(c);
    }

    pub async fn backspace_search(&self) {
        let mut state = self.ui_state.lock().await;
        state.search_query.pop();
    }

    pub async fn clear_search(&self) {
        self.ui_state.lock().await.search_query.clear();
    }

    pub async fn search_query(&self) -> String {
        self.ui_state.lock().await.search_query.clone()
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    pub async fn notify(&self, message: impl Into<String>) {
        self.push_notification(message.into(), NotificationKind::Info).await;
    }

    pub async fn notify_error(&self, message: impl Into<String>) {
        self.push_notification(message.into(), NotificationKind::Error).await;
    }

    async fn push_notification(&self, message: String, kind: NotificationKind) {
        let mut state = self.ui_state.lock().await;
        state.notification = Some(Notification {
            message,
            kind,
            created_at: Instant::now(),
        });
    }

    pub async fn clear_notification(&self) {
        self.ui_state.lock().await.notification = None;
    }

    pub async fn auto_clear_old_notifications(&self) {
        let mut state = self.ui_state.lock().await;
        if state
            .notification
            .as_ref()
            .is_some_and(|n| n.created_at.elapsed().as_secs() >= NOTIFICATION_TTL_SECS)
        {
            state.notification = None;
        }
    }

    // ========================================================================
    // Popups & dialogs
    // ========================================================================

    pub async fn show_help_popup(&self) {
        self.ui_state.lock().await.show_help_popup = true;
    }

    pub async fn hide_help_popup(&self) {
        self.ui_state.lock().await.show_help_popup = false;
    }

    pub async fn is_help_popup_open(&self) -> bool {
        self.ui_state.lock().await.show_help_popup
    }

    pub async fn open_dialog(&self, dialog: Dialog) {
        self.ui_state.lock().await.dialog = Some(dialog);
    }

    pub async fn close_dialog(&self) {
        self.ui_state.lock().await.dialog = None;
    }

    pub async fn get_dialog(&self) -> Option<Dialog> {
        self.ui_state.lock().await.dialog.clone()
    }

    /// Type into the focused text field of the open dialog
    pub async fn dialog_input(&self, c: char) {
        let mut state = self.ui_state.lock().await;
        match &mut state.dialog {
            Some(Dialog::CreateAlbum { title, theme, field }) => match field {
                AlbumFormField::Title => title.push(c),
                AlbumFormField::Theme => theme.push(c),
            },
            Some(Dialog::ImportFolder { path }) => path.push(c),
            _ => {}
        }
    }

    pub async fn dialog_backspace(&self) {
        let mut state = self.ui_state.lock().await;
        match &mut state.dialog {
            Some(Dialog::CreateAlbum { title, theme, field }) => {
                match field {
                    AlbumFormField::Title => title.pop(),
                    AlbumFormField::Theme => theme.pop(),
                };
            }
            Some(Dialog::ImportFolder { path }) => {
                path.pop();
            }
            _ => {}
        }
    }

    pub async fn dialog_next_field(&self) {
        let mut state = self.ui_state.lock().await;
        if let Some(Dialog::CreateAlbum { field, .. }) = &mut state.dialog {
            *field = match field {
                AlbumFormField::Title => AlbumFormField::Theme,
                AlbumFormField::Theme => AlbumFormField::Title,
            };
        }
    }

    pub async fn set_accent_hue(&self, hue: u16) {
        self.ui_state.lock().await.accent_hue = hue;
    }

    pub async fn accent_hue(&self) -> u16 {
        self.ui_state.lock().await.accent_hue
    }

    // ========================================================================
    // Content area
    // ========================================================================

    pub async fn get_content_state(&self) -> ContentState {
        self.content_state.lock().await.clone()
    }

    pub async fn show_album(&self, album_id: ItemId) {
        let mut state = self.content_state.lock().await;
        state.view = ContentView::AlbumTracks {
            album_id,
            selected_index: 0,
        };
    }

    /// Switch to the catalog listing and start a fetch for `query`
    pub async fn start_browse(&self, query: &str) -> PageRequest {
        let mut state = self.content_state.lock().await;
        state.view = ContentView::Browse;
        state.browse.start(query)
    }

    pub async fn content_move_up(&self) {
        let mut guard = self.content_state.lock().await;
        let state = &mut *guard;
        match &mut state.view {
            ContentView::AlbumTracks { selected_index, .. } => {
                *selected_index = selected_index.saturating_sub(1);
            }
            ContentView::Browse => {
                state.browse.selected_index = state.browse.selected_index.saturating_sub(1);
            }
            ContentView::Empty => {}
        }
    }

    /// Move down; returns a page request when the catalog selection hits the end
    pub async fn content_move_down(&self) -> Option<PageRequest> {
        let song_count = match &self.content_state.lock().await.view {
            ContentView::AlbumTracks { album_id, .. } => {
                let album_id = album_id.clone();
                Some(
                    self.library
                        .lock()
                        .await
                        .album(&album_id)
                        .map(|a| a.songs.len())
                        .unwrap_or(0),
                )
            }
            _ => None,
        };

        let mut guard = self.content_state.lock().await;
        let state = &mut *guard;
        match &mut state.view {
            ContentView::AlbumTracks { selected_index, .. } => {
                if *selected_index < song_count.unwrap_or(0).saturating_sub(1) {
                    *selected_index += 1;
                }
                None
            }
            ContentView::Browse => {
                let browse = &mut state.browse;
                if browse.selected_index < browse.tracks.len().saturating_sub(1) {
                    browse.selected_index += 1;
                }
                if browse.at_end() {
                    browse.next_page()
                } else {
                    None
                }
            }
            ContentView::Empty => None,
        }
    }

    pub async fn get_selected_content_item(&self) -> Option<SelectedItem> {
        let state = self.content_state.lock().await;
        match &state.view {
            ContentView::AlbumTracks {
                album_id,
                selected_index,
            } => {
                let library = self.library.lock().await;
                library
                    .album(album_id)
                    .and_then(|a| a.songs.get(*selected_index))
                    .map(|song| SelectedItem::AlbumSong {
                        album_id: album_id.clone(),
                        song: song.clone(),
                    })
            }
            ContentView::Browse => state
                .browse
                .selected_track()
                .map(|_| SelectedItem::CatalogTrack {
                    index: state.browse.selected_index,
                }),
            ContentView::Empty => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::store::MemoryStore;
    use crate::model::write_behind::StoreWriter;

    fn song(id: i64) -> Song {
        Song {
            id: ItemId::Number(id),
            title: format!("Song {}", id),
            artist: "Artist".into(),
            url: format!("file:///music/{}.mp3", id),
            cover_url: None,
        }
    }

    fn model() -> AppModel {
        let writer = StoreWriter::spawn(Arc::new(MemoryStore::new()), None);
        AppModel::new(LibraryManager::new(writer), 200)
    }

    #[tokio::test]
    async fn accent_hue_seeds_ui_state() {
        let model = model();
        assert_eq!(model.accent_hue().await, 200);
        model.set_accent_hue(10).await;
        assert_eq!(model.get_ui_state().await.accent_hue, 10);
    }

    #[tokio::test]
    async fn album_selection_stays_in_bounds() {
        let model = model();
        model.set_active_section(ActiveSection::Albums).await;
        model.move_selection_down().await;
        assert_eq!(model.get_ui_state().await.album_selected, 0);

        model
            .library
            .lock()
            .await
            .create_album("Road Trip", None, None, vec![song(1)])
            .unwrap();
        model.move_selection_down().await;
        model.move_selection_down().await;
        assert_eq!(model.get_ui_state().await.album_selected, 1);
        assert_eq!(
            model.selected_album_id().await.map(|id| id.to_string()),
            model.library.lock().await.albums().get(1).map(|a| a.id.to_string())
        );
    }

    #[tokio::test]
    async fn deleting_the_open_album_empties_the_view() {
        let model = model();
        let id = model
            .library
            .lock()
            .await
            .create_album("Temp", None, None, vec![song(1), song(2)])
            .unwrap();
        model.show_album(id.clone()).await;
        model.content_move_down().await;
        assert_eq!(
            model.get_selected_content_item().await,
            Some(SelectedItem::AlbumSong {
                album_id: id.clone(),
                song: song(2)
            })
        );

        model.library.lock().await.delete_album(&id).unwrap();
        model.clamp_selections().await;
        assert_eq!(model.get_content_state().await.view, ContentView::Empty);
    }

    #[tokio::test]
    async fn dialog_input_targets_focused_field() {
        let model = model();
        model
            .open_dialog(Dialog::CreateAlbum {
                title: String::new(),
                theme: String::new(),
                field: AlbumFormField::Title,
            })
            .await;
        model.dialog_input('A').await;
        model.dialog_next_field().await;
        model.dialog_input('x').await;
        model.dialog_input('y').await;
        model.dialog_backspace().await;

        assert_eq!(
            model.get_dialog().await,
            Some(Dialog::CreateAlbum {
                title: "A".into(),
                theme: "x".into(),
                field: AlbumFormField::Theme,
            })
        );
    }

    #[tokio::test]
    async fn fresh_notification_is_kept() {
        let model = model();
        model.notify_error("boom").await;
        model.auto_clear_old_notifications().await;
        let note = model.get_ui_state().await.notification.unwrap();
        assert_eq!(note.message, "boom");
        assert_eq!(note.kind, NotificationKind::Error);
    }
}
