//! Content view state: the open album and the catalog browse list
//!
//! Catalog pages are requested with a generation number. Starting a new query
//! bumps the generation, so a page that arrives for an older query is dropped
//! instead of being mixed into the new results.

use super::catalog_client::{CatalogPage, CatalogTrack, PAGE_SIZE};
use super::types::ItemId;

/// A page fetch issued for a given query generation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub generation: u64,
    pub offset: usize,
}

/// Accumulated catalog listing for the current query
#[derive(Clone, Debug, Default)]
pub struct BrowseState {
    /// Empty query means recommendations
    pub query: String,
    pub tracks: Vec<CatalogTrack>,
    pub total: Option<usize>,
    pub pages_loaded: usize,
    pub generation: u64,
    pub loading: bool,
    pub failed: bool,
    pub selected_index: usize,
}

impl BrowseState {
    /// Reset for a new query and return the request for its first page
    pub fn start(&mut self, query: &str) -> PageRequest {
        self.generation += 1;
        self.query = query.trim().to_string();
        self.tracks.clear();
        self.total = None;
        self.pages_loaded = 0;
        self.loading = true;
        self.failed = false;
        self.selected_index = 0;
        PageRequest {
            generation: self.generation,
            offset: 0,
        }
    }

    pub fn has_more(&self) -> bool {
        match self.total {
            Some(total) => self.pages_loaded * PAGE_SIZE < total,
            None => false,
        }
    }

    /// Request for the following page, if any remain and none is in flight
    pub fn next_page(&mut self) -> Option<PageRequest> {
        if self.loading || self.failed || !self.has_more() {
            return None;
        }
        self.loading = true;
        Some(PageRequest {
            generation: self.generation,
            offset: self.pages_loaded * PAGE_SIZE,
        })
    }

    /// Append a fetched page. Returns false (and changes nothing) when stale.
    pub fn apply_page(&mut self, request: PageRequest, page: CatalogPage) -> bool {
        if request.generation != self.generation {
            tracing::debug!(
                stale = request.generation,
                current = self.generation,
                "Dropping stale catalog page"
            );
            return false;
        }
        self.tracks.extend(page.tracks);
        self.total = Some(page.total);
        self.pages_loaded += 1;
        self.loading = false;
        true
    }

    /// Record a failed fetch. Returns false when stale.
    pub fn fail(&mut self, request: PageRequest) -> bool {
        if request.generation != self.generation {
            return false;
        }
        self.loading = false;
        self.failed = true;
        true
    }

    pub fn selected_track(&self) -> Option<&CatalogTrack> {
        self.tracks.get(self.selected_index)
    }

    pub fn position_of(&self, id: &ItemId) -> Option<usize> {
        self.tracks.iter().position(|t| &t.id == id)
    }

    /// Track after (or before) `id`, wrapping around the loaded list
    pub fn neighbour(&self, id: &ItemId, delta: isize) -> Option<&CatalogTrack> {
        let len = self.tracks.len() as isize;
        if len == 0 {
            return None;
        }
        let index = match self.position_of(id) {
            Some(i) => (i as isize + delta + len) % len,
            None => 0,
        };
        self.tracks.get(index as usize)
    }

    /// True when the selection sits on the last loaded track
    pub fn at_end(&self) -> bool {
        !self.tracks.is_empty() && self.selected_index + 1 >= self.tracks.len()
    }
}

/// Which listing the main content area shows
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ContentView {
    #[default]
    Empty,
    AlbumTracks {
        album_id: ItemId,
        selected_index: usize,
    },
    Browse,
}

#[derive(Clone, Debug, Default)]
pub struct ContentState {
    pub view: ContentView,
    pub browse: BrowseState,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(ids: std::ops::Range<usize>, total: usize) -> CatalogPage {
        CatalogPage {
            tracks: ids
                .map(|i| CatalogTrack {
                    id: ItemId::Number(i as i64),
                    title: format!("t{}", i),
                    artist: "a".into(),
                    cover_url: None,
                    url: format!("https://audio/{}.mp3", i),
                })
                .collect(),
            total,
        }
    }

    #[test]
    fn pages_accumulate_until_total() {
        let mut browse = BrowseState::default();
        let first = browse.start("");
        assert_eq!(first.offset, 0);
        assert!(browse.next_page().is_none(), "first page still in flight");

        assert!(browse.apply_page(first, page(0..20, 45)));
        let second = browse.next_page().unwrap();
        assert_eq!(second.offset, 20);
        assert!(browse.apply_page(second, page(20..40, 45)));

        let third = browse.next_page().unwrap();
        assert_eq!(third.offset, 40);
        assert!(browse.apply_page(third, page(40..45, 45)));

        assert_eq!(browse.tracks.len(), 45);
        assert!(!browse.has_more());
        assert!(browse.next_page().is_none());
    }

    #[test]
    fn stale_pages_are_dropped() {
        let mut browse = BrowseState::default();
        let old = browse.start("jazz");
        let new = browse.start("rock");

        assert!(!browse.apply_page(old, page(0..20, 100)));
        assert!(browse.tracks.is_empty());
        assert!(!browse.fail(old));
        assert!(browse.loading);

        assert!(browse.apply_page(new, page(100..120, 100)));
        assert_eq!(browse.tracks[0].id, ItemId::Number(100));
        assert_eq!(browse.query, "rock");
    }

    #[test]
    fn failure_stops_paging() {
        let mut browse = BrowseState::default();
        let first = browse.start("x");
        assert!(browse.fail(first));
        assert!(browse.failed);
        assert!(!browse.loading);
        assert!(browse.next_page().is_none());
    }

    #[test]
    fn neighbour_wraps_around() {
        let mut browse = BrowseState::default();
        let first = browse.start("");
        browse.apply_page(first, page(0..3, 3));

        let last = ItemId::Number(2);
        assert_eq!(browse.neighbour(&last, 1).unwrap().id, ItemId::Number(0));
        assert_eq!(browse.neighbour(&ItemId::Number(0), -1).unwrap().id, last);
    }
}
