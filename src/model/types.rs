//! Core type definitions for the application

use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Identifier of the album that always exists and receives catalog tracks
pub const DEFAULT_ALBUM_ID: &str = "default-album";
pub const DEFAULT_ALBUM_TITLE: &str = "Added Songs";
pub const DEFAULT_ALBUM_THEME: &str = "default";

/// Song or album identifier.
///
/// Stored records carry either numeric ids (time-derived, from imports and
/// album creation) or string ids (catalog tracks, the default album). Two ids
/// are equal when their textual forms are equal, so `42` and `"42"` name the
/// same item.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Number(i64),
    Text(String),
}

impl ItemId {
    pub fn default_album() -> Self {
        ItemId::Text(DEFAULT_ALBUM_ID.to_string())
    }

    pub fn is_default_album(&self) -> bool {
        self.to_string() == DEFAULT_ALBUM_ID
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Number(n) => write!(f, "{}", n),
            ItemId::Text(s) => f.write_str(s),
        }
    }
}

impl PartialEq for ItemId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ItemId::Number(a), ItemId::Number(b)) => a == b,
            (ItemId::Text(a), ItemId::Text(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl Eq for ItemId {}

impl Hash for ItemId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl From<i64> for ItemId {
    fn from(value: i64) -> Self {
        ItemId::Number(value)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        ItemId::Text(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        ItemId::Text(value)
    }
}

/// A single playable track in the library
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: ItemId,
    pub title: String,
    pub artist: String,
    /// Playable-resource locator: `file://` URL, `data:` URI or http(s) URL
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

/// An ordered collection of songs
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: ItemId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub songs: Vec<Song>,
}

impl Album {
    /// The reserved "Added Songs" album with no songs
    pub fn default_album() -> Self {
        Self {
            id: ItemId::default_album(),
            title: DEFAULT_ALBUM_TITLE.to_string(),
            theme: Some(DEFAULT_ALBUM_THEME.to_string()),
            cover_url: None,
            songs: Vec::new(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.id.is_default_album()
    }

    pub fn contains(&self, song_id: &ItemId) -> bool {
        self.songs.iter().any(|s| &s.id == song_id)
    }

    pub fn position_of(&self, song_id: &ItemId) -> Option<usize> {
        self.songs.iter().position(|s| &s.id == song_id)
    }

    /// Cover shown for the album: its own, else the first song's
    pub fn display_cover(&self) -> Option<&str> {
        self.cover_url
            .as_deref()
            .or_else(|| self.songs.first().and_then(|s| s.cover_url.as_deref()))
    }
}

/// Which section of the UI is currently active/focused
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveSection {
    Search,
    Navigation,
    Albums,
    MainContent,
}

impl ActiveSection {
    pub fn next(self) -> Self {
        match self {
            ActiveSection::Search => ActiveSection::Navigation,
            ActiveSection::Navigation => ActiveSection::Albums,
            ActiveSection::Albums => ActiveSection::MainContent,
            ActiveSection::MainContent => ActiveSection::Search,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            ActiveSection::Search => ActiveSection::MainContent,
            ActiveSection::Navigation => ActiveSection::Search,
            ActiveSection::Albums => ActiveSection::Navigation,
            ActiveSection::MainContent => ActiveSection::Albums,
        }
    }
}

/// Top-level pages reachable from the navigation list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavItem {
    MyMusic,
    Browse,
}

impl NavItem {
    pub const ALL: [NavItem; 2] = [NavItem::MyMusic, NavItem::Browse];

    pub fn label(self) -> &'static str {
        match self {
            NavItem::MyMusic => "My Music",
            NavItem::Browse => "Browse",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Error,
}

/// Transient message shown over the UI
#[derive(Clone, Debug)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    pub created_at: Instant,
}

/// Field focused in the create-album form
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AlbumFormField {
    #[default]
    Title,
    Theme,
}

/// Modal dialogs
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dialog {
    CreateAlbum {
        title: String,
        theme: String,
        field: AlbumFormField,
    },
    ImportFolder {
        path: String,
    },
    Settings,
}

/// UI state for the application
#[derive(Clone, Debug)]
pub struct UiState {
    pub active_section: ActiveSection,
    pub search_query: String,
    pub nav_selected: usize,
    pub album_selected: usize,
    pub notification: Option<Notification>,
    pub dialog: Option<Dialog>,
    pub show_help_popup: bool,
    pub accent_hue: u16,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            active_section: ActiveSection::Navigation,
            search_query: String::new(),
            nav_selected: 0,
            album_selected: 0,
            notification: None,
            dialog: None,
            show_help_popup: false,
            accent_hue: super::theme::DEFAULT_ACCENT_HUE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_text_ids_compare_by_text() {
        assert_eq!(ItemId::Number(42), ItemId::from("42"));
        assert_ne!(ItemId::Number(42), ItemId::from("43"));
        assert!(ItemId::from("default-album").is_default_album());
    }

    #[test]
    fn album_json_uses_camel_case_and_untagged_ids() {
        let json = r#"{
            "id": 1700000000000,
            "title": "Rock",
            "theme": "guitar",
            "songs": [{"id": "42", "title": "T", "artist": "A", "url": "https://x/a.mp3", "coverUrl": "https://x/c.jpg"}]
        }"#;
        let album: Album = serde_json::from_str(json).unwrap();
        assert_eq!(album.id, ItemId::Number(1_700_000_000_000));
        assert_eq!(album.songs[0].cover_url.as_deref(), Some("https://x/c.jpg"));
        assert_eq!(album.display_cover(), Some("https://x/c.jpg"));

        let value = serde_json::to_value(&album).unwrap();
        assert_eq!(value["songs"][0]["coverUrl"], "https://x/c.jpg");
        assert!(value.get("coverUrl").is_none());
    }

    #[test]
    fn section_cycle_is_closed() {
        let mut section = ActiveSection::Search;
        for _ in 0..4 {
            section = section.next();
        }
        assert_eq!(section, ActiveSection::Search);
        assert_eq!(ActiveSection::Search.prev().next(), ActiveSection::Search);
    }
}
