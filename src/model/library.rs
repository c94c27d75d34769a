//! Library manager: albums, songs and the current selection
//!
//! The manager is the only writer of album data. Every mutation updates the
//! in-memory collection first and then enqueues a rewrite of the whole album
//! collection through the [`StoreWriter`]; selection changes rewrite the
//! `currentSong`/`currentAlbum` records the same way.

use std::sync::Arc;

use chrono::Utc;
use rand::seq::SliceRandom;
use serde_json::Value;
use thiserror::Error;

use super::import::ImportedAlbum;
use super::store::{Collection, KeyValueStore, MemoryStore, StoreError};
use super::types::{Album, ItemId, Song};
use super::write_behind::StoreWriter;

pub const IMPORTED_ALBUM_THEME: &str = "Imported";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Rejected library operations. The library is unchanged when one is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LibraryError {
    #[error("The \"Added Songs\" album cannot be deleted")]
    ReservedAlbum,
    #[error("This track is already in your music")]
    DuplicateSong(ItemId),
    #[error("Album title cannot be empty")]
    EmptyTitle,
    #[error("Album {0} not found")]
    AlbumNotFound(ItemId),
    #[error("Song {0} not found")]
    SongNotFound(ItemId),
}

pub struct LibraryManager {
    albums: Vec<Album>,
    current_song: Option<Song>,
    current_album: Option<ItemId>,
    writer: StoreWriter,
    last_issued_id: i64,
}

impl LibraryManager {
    /// Empty library holding only the default album
    pub fn new(writer: StoreWriter) -> Self {
        let mut manager = Self {
            albums: Vec::new(),
            current_song: None,
            current_album: None,
            writer,
            last_issued_id: 0,
        };
        manager.ensure_default_album();
        manager
    }

    /// Build a manager from the saved records in `store`.
    ///
    /// When a record cannot be read the returned manager writes to memory
    /// only, so the unreadable records stay untouched on disk for this
    /// session. The load error is returned alongside for the caller to report.
    pub async fn open(
        store: &dyn KeyValueStore,
        writer: StoreWriter,
    ) -> (Self, Option<StoreError>) {
        let mut manager = Self::new(writer);
        match manager.load(store).await {
            Ok(()) => (manager, None),
            Err(e) => {
                tracing::error!(error = %e, "Library records unreadable, continuing in memory");
                let detached = StoreWriter::spawn(Arc::new(MemoryStore::new()), None);
                (Self::new(detached), Some(e))
            }
        }
    }

    /// Read albums and the saved selection from the store.
    ///
    /// A missing default album is appended to the working set but not written
    /// back until the next mutation. Nothing is applied unless all three
    /// records parse.
    pub async fn load(&mut self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        let albums = match store
            .get(Collection::Albums, Collection::Albums.record_key())
            .await?
        {
            Some(Value::Null) | None => Vec::new(),
            Some(value) => serde_json::from_value::<Vec<Album>>(value)?,
        };

        let current_song = match store
            .get(Collection::CurrentSong, Collection::CurrentSong.record_key())
            .await?
        {
            Some(Value::Null) | None => None,
            Some(value) => Some(serde_json::from_value::<Song>(value)?),
        };

        let saved_album = match store
            .get(Collection::CurrentAlbum, Collection::CurrentAlbum.record_key())
            .await?
        {
            Some(Value::Null) | None => None,
            Some(value) => Some(serde_json::from_value::<Album>(value)?),
        };

        self.albums = albums;
        self.ensure_default_album();
        self.seed_id_counter();
        if current_song.is_some() {
            self.current_song = current_song;
        }
        if let Some(saved) = saved_album {
            if self.album(&saved.id).is_some() {
                self.current_album = Some(saved.id);
            } else {
                tracing::debug!(album_id = %saved.id, "Saved current album no longer exists");
            }
        }

        tracing::info!(
            albums = self.albums.len(),
            songs = self.song_count(),
            current_song = ?self.current_song.as_ref().map(|s| s.id.to_string()),
            "Library loaded"
        );
        Ok(())
    }

    pub fn albums(&self) -> &[Album] {
        &self.albums
    }

    pub fn album(&self, id: &ItemId) -> Option<&Album> {
        self.albums.iter().find(|a| &a.id == id)
    }

    pub fn default_album(&self) -> Option<&Album> {
        self.albums.iter().find(|a| a.is_default())
    }

    pub fn current_song(&self) -> Option<&Song> {
        self.current_song.as_ref()
    }

    pub fn current_album(&self) -> Option<&Album> {
        self.current_album.as_ref().and_then(|id| self.album(id))
    }

    pub fn song_count(&self) -> usize {
        self.albums.iter().map(|a| a.songs.len()).sum()
    }

    pub fn contains_song(&self, song_id: &ItemId) -> bool {
        self.albums.iter().any(|a| a.contains(song_id))
    }

    pub fn create_album(
        &mut self,
        title: &str,
        theme: Option<String>,
        cover_url: Option<String>,
        songs: Vec<Song>,
    ) -> Result<ItemId, LibraryError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(LibraryError::EmptyTitle);
        }
        for (i, song) in songs.iter().enumerate() {
            if self.contains_song(&song.id) || songs[..i].iter().any(|s| s.id == song.id) {
                return Err(LibraryError::DuplicateSong(song.id.clone()));
            }
        }

        let id = ItemId::Number(self.allocate_id());
        let theme = theme.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        tracing::info!(album_id = %id, title, songs = songs.len(), "Album created");

        self.albums.push(Album {
            id: id.clone(),
            title: title.to_string(),
            theme,
            cover_url,
            songs,
        });
        self.persist_albums();
        Ok(id)
    }

    /// Create one album from a scanned folder with a single store write
    pub fn import_album(&mut self, imported: ImportedAlbum) -> Result<ItemId, LibraryError> {
        let songs: Vec<Song> = imported
            .tracks
            .into_iter()
            .map(|track| Song {
                id: ItemId::Number(self.allocate_id()),
                title: track.title,
                artist: UNKNOWN_ARTIST.to_string(),
                url: track.url,
                cover_url: imported.cover_url.clone(),
            })
            .collect();

        self.create_album(
            &imported.title,
            Some(IMPORTED_ALBUM_THEME.to_string()),
            imported.cover_url,
            songs,
        )
    }

    pub fn delete_album(&mut self, album_id: &ItemId) -> Result<Album, LibraryError> {
        if album_id.is_default_album() {
            return Err(LibraryError::ReservedAlbum);
        }
        let index = self
            .albums
            .iter()
            .position(|a| &a.id == album_id)
            .ok_or_else(|| LibraryError::AlbumNotFound(album_id.clone()))?;

        let removed = self.albums.remove(index);
        tracing::info!(album_id = %removed.id, title = %removed.title, "Album deleted");

        if self.current_album.as_ref() == Some(album_id) {
            self.current_album = None;
            self.current_song = None;
            self.persist_selection();
        }
        self.persist_albums();
        Ok(removed)
    }

    pub fn add_song(&mut self, album_id: &ItemId, song: Song) -> Result<(), LibraryError> {
        if self.contains_song(&song.id) {
            tracing::debug!(song_id = %song.id, "Rejected duplicate song");
            return Err(LibraryError::DuplicateSong(song.id));
        }
        let album = self
            .albums
            .iter_mut()
            .find(|a| &a.id == album_id)
            .ok_or_else(|| LibraryError::AlbumNotFound(album_id.clone()))?;

        tracing::info!(album_id = %album.id, song_id = %song.id, title = %song.title, "Song added");
        album.songs.push(song);
        self.persist_albums();
        Ok(())
    }

    /// Add a catalog track to the "Added Songs" album
    pub fn add_to_default_album(&mut self, song: Song) -> Result<(), LibraryError> {
        self.ensure_default_album();
        self.add_song(&ItemId::default_album(), song)
    }

    pub fn delete_song(&mut self, album_id: &ItemId, song_id: &ItemId) -> Result<Song, LibraryError> {
        let album = self
            .albums
            .iter_mut()
            .find(|a| &a.id == album_id)
            .ok_or_else(|| LibraryError::AlbumNotFound(album_id.clone()))?;
        let index = album
            .position_of(song_id)
            .ok_or_else(|| LibraryError::SongNotFound(song_id.clone()))?;

        let removed = album.songs.remove(index);
        tracing::info!(album_id = %album_id, song_id = %song_id, "Song deleted");

        if self.current_song.as_ref().is_some_and(|s| &s.id == song_id) {
            self.current_song = None;
            self.persist_selection();
        }
        self.persist_albums();
        Ok(removed)
    }

    /// Make `song` current and resolve its album by containment
    pub fn select_song(&mut self, song: Song) {
        if let Some(album) = self.albums.iter().find(|a| a.contains(&song.id)) {
            self.current_album = Some(album.id.clone());
        }
        tracing::debug!(song_id = %song.id, album_id = ?self.current_album.as_ref().map(|a| a.to_string()), "Song selected");
        self.current_song = Some(song);
        self.persist_selection();
    }

    pub fn next_song(&mut self) -> Option<Song> {
        self.step(1)
    }

    pub fn previous_song(&mut self) -> Option<Song> {
        self.step(-1)
    }

    fn step(&mut self, delta: isize) -> Option<Song> {
        let album = self.current_album()?;
        let current = self.current_song.as_ref()?;
        let len = album.songs.len() as isize;
        if len == 0 {
            return None;
        }

        let next_index = match album.position_of(&current.id) {
            Some(index) => (index as isize + delta + len) % len,
            None if delta > 0 => 0,
            None => len - 1,
        };
        let song = album.songs[next_index as usize].clone();

        self.current_song = Some(song.clone());
        self.persist_selection();
        Some(song)
    }

    /// Randomly reorder an album and select its new first song
    pub fn shuffle_album(&mut self, album_id: &ItemId) -> Result<Option<Song>, LibraryError> {
        let album = self
            .albums
            .iter_mut()
            .find(|a| &a.id == album_id)
            .ok_or_else(|| LibraryError::AlbumNotFound(album_id.clone()))?;
        if album.songs.is_empty() {
            return Ok(None);
        }

        album.songs.shuffle(&mut rand::thread_rng());
        let first = album.songs[0].clone();
        self.persist_albums();
        self.select_song(first.clone());
        Ok(Some(first))
    }

    fn ensure_default_album(&mut self) {
        if !self.albums.iter().any(|a| a.is_default()) {
            self.albums.push(Album::default_album());
        }
    }

    fn seed_id_counter(&mut self) {
        let max_existing = self
            .albums
            .iter()
            .flat_map(|a| std::iter::once(&a.id).chain(a.songs.iter().map(|s| &s.id)))
            .filter_map(|id| match id {
                ItemId::Number(n) => Some(*n),
                ItemId::Text(_) => None,
            })
            .max()
            .unwrap_or(0);
        self.last_issued_id = self.last_issued_id.max(max_existing);
    }

    /// Time-derived id, strictly greater than every id issued before
    fn allocate_id(&mut self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let id = now.max(self.last_issued_id + 1);
        self.last_issued_id = id;
        id
    }

    fn persist_albums(&self) {
        self.writer
            .put_json(Collection::Albums, Collection::Albums.record_key(), &self.albums);
    }

    fn persist_selection(&self) {
        self.writer.put_json(
            Collection::CurrentSong,
            Collection::CurrentSong.record_key(),
            &self.current_song,
        );
        self.writer.put_json(
            Collection::CurrentAlbum,
            Collection::CurrentAlbum.record_key(),
            &self.current_album(),
        );
    }
}
