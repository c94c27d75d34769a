//! Navigation-related controller methods (albums, catalog browsing, dialogs)

use std::path::PathBuf;

use crate::model::theme::{HUE_STEP, adjust_hue, save_accent_hue};
use crate::model::{
    ActiveSection, AlbumFormField, ContentView, Dialog, NavItem, PageRequest, SelectedItem,
    scan_folder,
};

use super::{AppController, PlayContext};

impl AppController {
    /// Run the typed search, or recommendations for an empty query
    pub async fn perform_search(&self) {
        let model = self.model.lock().await;
        let query = model.search_query().await;
        tracing::debug!(query = %query, "Performing catalog search");
        let request = model.start_browse(&query).await;
        model.set_active_section(ActiveSection::MainContent).await;
        drop(model);

        self.spawn_page_fetch(query, request);
    }

    pub async fn show_browse(&self) {
        let model = self.model.lock().await;
        let needs_fetch = {
            let mut content = model.content_state.lock().await;
            content.view = ContentView::Browse;
            content.browse.tracks.is_empty() && !content.browse.loading
        };
        if !needs_fetch {
            return;
        }
        let request = model.start_browse("").await;
        drop(model);

        self.spawn_page_fetch(String::new(), request);
    }

    /// Fetch the next catalog page for the current query
    pub(crate) async fn load_more(&self, request: PageRequest) {
        let query = {
            let model = self.model.lock().await;
            let content = model.content_state.lock().await;
            content.browse.query.clone()
        };
        tracing::debug!(offset = request.offset, "Loading more catalog tracks");
        self.spawn_page_fetch(query, request);
    }

    fn spawn_page_fetch(&self, query: String, request: PageRequest) {
        let controller = self.clone();
        tokio::spawn(async move {
            controller.fetch_page(&query, request).await;
        });
    }

    async fn fetch_page(&self, query: &str, request: PageRequest) {
        let result = self.catalog.tracks(query, request.offset).await;

        let model = self.model.lock().await;
        let mut content = model.content_state.lock().await;
        match result {
            Ok(page) => {
                let count = page.tracks.len();
                if content.browse.apply_page(request, page) {
                    tracing::info!(
                        query,
                        offset = request.offset,
                        count,
                        total = ?content.browse.total,
                        "Catalog page loaded"
                    );
                }
            }
            Err(e) => {
                if content.browse.fail(request) {
                    drop(content);
                    let message = Self::format_error(&anyhow::Error::new(e));
                    model.notify_error(message).await;
                }
            }
        }
    }

    pub async fn open_nav_item(&self) {
        let item = self.model.lock().await.selected_nav_item().await;
        match item {
            NavItem::MyMusic => self.open_selected_album().await,
            NavItem::Browse => {
                self.show_browse().await;
                self.model
                    .lock()
                    .await
                    .set_active_section(ActiveSection::MainContent)
                    .await;
            }
        }
    }

    pub async fn open_selected_album(&self) {
        let model = self.model.lock().await;
        if let Some(album_id) = model.selected_album_id().await {
            tracing::debug!(album_id = %album_id, "Opening album");
            model.show_album(album_id).await;
            model.set_active_section(ActiveSection::MainContent).await;
        }
    }

    /// Enter on a content row: play it
    pub async fn activate_selection(&self) {
        let selected = self.model.lock().await.get_selected_content_item().await;
        match selected {
            Some(SelectedItem::AlbumSong { song, .. }) => {
                self.play_song(song, PlayContext::Library, true).await;
            }
            Some(SelectedItem::CatalogTrack { index }) => {
                let song = {
                    let model = self.model.lock().await;
                    let content = model.content_state.lock().await;
                    content.browse.tracks.get(index).map(|t| t.to_song())
                };
                if let Some(song) = song {
                    self.play_song(song, PlayContext::Browse, true).await;
                }
            }
            None => {}
        }
    }

    /// Add the highlighted catalog track to "Added Songs"
    pub async fn add_selected_to_library(&self) {
        let model = self.model.lock().await;
        let song = {
            let content = model.content_state.lock().await;
            if content.view != ContentView::Browse {
                return;
            }
            content.browse.selected_track().map(|t| t.to_song())
        };
        let Some(song) = song else {
            return;
        };

        let title = song.title.clone();
        let result = model.library.lock().await.add_to_default_album(song);
        match result {
            Ok(()) => model.notify(format!("Added \"{}\" to your music", title)).await,
            Err(e) => model.notify_error(e.to_string()).await,
        }
    }

    pub async fn open_create_album_dialog(&self) {
        self.model
            .lock()
            .await
            .open_dialog(Dialog::CreateAlbum {
                title: String::new(),
                theme: String::new(),
                field: AlbumFormField::Title,
            })
            .await;
    }

    pub async fn open_import_dialog(&self) {
        self.model
            .lock()
            .await
            .open_dialog(Dialog::ImportFolder { path: String::new() })
            .await;
    }

    pub async fn open_settings_dialog(&self) {
        self.model.lock().await.open_dialog(Dialog::Settings).await;
    }

    /// Submit the open dialog
    pub async fn submit_dialog(&self) {
        let dialog = self.model.lock().await.get_dialog().await;
        match dialog {
            Some(Dialog::CreateAlbum { title, theme, .. }) => {
                self.create_album(&title, &theme).await;
            }
            Some(Dialog::ImportFolder { path }) => {
                self.import_folder(path).await;
            }
            Some(Dialog::Settings) | None => {
                self.model.lock().await.close_dialog().await;
            }
        }
    }

    async fn create_album(&self, title: &str, theme: &str) {
        let model = self.model.lock().await;
        let theme = Some(theme.to_string()).filter(|t| !t.trim().is_empty());
        let result = model
            .library
            .lock()
            .await
            .create_album(title, theme, None, Vec::new());
        match result {
            Ok(_) => {
                model.close_dialog().await;
                model.notify(format!("Album \"{}\" created", title.trim())).await;
            }
            // The form stays open so the title can be fixed
            Err(e) => model.notify_error(e.to_string()).await,
        }
    }

    async fn import_folder(&self, path: String) {
        let path = path.trim().to_string();
        let model = self.model.lock().await;
        if path.is_empty() {
            model.notify_error("Enter a folder path to import").await;
            return;
        }
        model.close_dialog().await;
        model.notify(format!("Importing {}...", path)).await;
        drop(model);

        let controller = self.clone();
        tokio::spawn(async move {
            let dir = expand_home(&path);
            let scanned = scan_folder(&dir).await;

            let model = controller.model.lock().await;
            match scanned {
                Ok(imported) => {
                    let title = imported.title.clone();
                    let count = imported.tracks.len();
                    let result = model.library.lock().await.import_album(imported);
                    match result {
                        Ok(_) => {
                            model
                                .notify(format!("Imported \"{}\" ({} tracks)", title, count))
                                .await
                        }
                        Err(e) => model.notify_error(e.to_string()).await,
                    }
                }
                Err(e) => {
                    tracing::warn!(folder = %path, error = %e, "Import failed");
                    model.notify_error(e.to_string()).await;
                }
            }
        });
    }

    /// Delete the highlighted song (content area) or album (sidebar)
    pub async fn delete_selected(&self) {
        let model = self.model.lock().await;
        let section = model.get_ui_state().await.active_section;

        let (result, cleared_current) = match section {
            ActiveSection::MainContent => {
                let Some(SelectedItem::AlbumSong { album_id, song }) =
                    model.get_selected_content_item().await
                else {
                    return;
                };
                let mut library = model.library.lock().await;
                let had_current = library.current_song().is_some();
                let result = library
                    .delete_song(&album_id, &song.id)
                    .map(|s| format!("Removed \"{}\"", s.title));
                (result, had_current && library.current_song().is_none())
            }
            ActiveSection::Albums => {
                let Some(album_id) = model.selected_album_id().await else {
                    return;
                };
                let mut library = model.library.lock().await;
                let had_current = library.current_song().is_some();
                let result = library
                    .delete_album(&album_id)
                    .map(|a| format!("Deleted album \"{}\"", a.title));
                (result, had_current && library.current_song().is_none())
            }
            _ => return,
        };

        match result {
            Ok(message) => {
                model.clamp_selections().await;
                model.notify(message).await;
                drop(model);
                if cleared_current && self.play_context().await == PlayContext::Library {
                    self.player.lock().await.set_song(None).await;
                }
            }
            Err(e) => model.notify_error(e.to_string()).await,
        }
    }

    pub async fn adjust_accent_hue(&self, up: bool) {
        let model = self.model.lock().await;
        let delta = if up { HUE_STEP } else { -HUE_STEP };
        let hue = adjust_hue(model.accent_hue().await, delta);
        model.set_accent_hue(hue).await;
        drop(model);
        save_accent_hue(&self.slots, hue).await;
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_prefix_is_expanded() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/Music/x"), home.join("Music/x"));
        }
        assert_eq!(expand_home("/srv/music"), PathBuf::from("/srv/music"));
    }
}
