//! Model module - Application state and data types
//!
//! Organized into submodules by responsibility:
//!
//! - `types`: Core data (ids, songs, albums) and UI state
//! - `store`: Persistent key-value store with versioned collections
//! - `write_behind`: Ordered write queue in front of the store
//! - `settings`: Small string slots (volume, mute, position, accent hue)
//! - `library`: Library manager, the single writer of album data
//! - `import`: Folder scanning for album import
//! - `playback`: Playback controller over a media element
//! - `catalog_client`: Jamendo catalog client
//! - `content`: Content view state and catalog paging
//! - `theme`: Accent hue persistence and colour mapping
//! - `app_model`: Main application model with state management methods

mod types;
pub mod store;
mod write_behind;
pub mod settings;
mod library;
mod import;
pub mod playback;
mod catalog_client;
mod content;
pub mod theme;
mod app_model;

pub use types::{
    ActiveSection, Album, AlbumFormField, Dialog, ItemId, NavItem, Notification,
    NotificationKind, Song, UiState,
};

pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use write_behind::StoreWriter;
pub use settings::SettingsSlots;
pub use library::{LibraryError, LibraryManager};
pub use import::{ImportError, ImportedAlbum, scan_folder};
pub use playback::{
    MediaElement, MediaEvent, PlaybackController, PlaybackError, PlaybackInfo, TransportState,
};
pub use catalog_client::{
    CatalogClient, CatalogError, CatalogPage, CatalogTrack, DEFAULT_API_BASE, DEFAULT_CLIENT_ID, PAGE_SIZE,
};
pub use content::{BrowseState, ContentState, ContentView, PageRequest};
pub use app_model::{AppModel, LibrarySnapshot, SelectedItem};
