//! Scalar settings slots persisted to a single JSON file
//!
//! Each slot is an independent string value, read back at startup. The player
//! keeps its volume, mute flag, last song and position here and the theme keeps
//! its accent hue; none of them depend on the library store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use super::store::StoreError;

pub const POSITION_KEY: &str = "player-position";
pub const SONG_ID_KEY: &str = "player-song-id";
pub const VOLUME_KEY: &str = "player-volume";
pub const MUTED_KEY: &str = "player-muted";
pub const ACCENT_HUE_KEY: &str = "theme-accent-hue";

#[derive(Clone, Default)]
pub struct SettingsSlots {
    path: Option<PathBuf>,
    values: Arc<RwLock<BTreeMap<String, String>>>,
    /// Held from insert through rename so file writes land in order
    write_gate: Arc<Mutex<()>>,
}

impl SettingsSlots {
    /// Slots that live only for this session
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load slots from `path`. A missing file starts empty; an unreadable one
    /// is logged and also starts empty.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut values = BTreeMap::new();

        if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            match serde_json::from_str::<BTreeMap<String, String>>(&content) {
                Ok(loaded) => values = loaded,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Settings file is corrupt, starting empty");
                }
            }
        } else if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        Ok(Self {
            path: Some(path),
            values: Arc::new(RwLock::new(values)),
            write_gate: Arc::new(Mutex::new(())),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.values.read().await.get(key).cloned()
    }

    pub async fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).await.and_then(|v| v.parse::<f64>().ok())
    }

    pub async fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).await.map(|v| v == "true")
    }

    /// Set a slot and write the file through
    pub async fn set(&self, key: &str, value: impl ToString) -> Result<(), StoreError> {
        let _gate = self.write_gate.lock().await;
        {
            let mut values = self.values.write().await;
            values.insert(key.to_string(), value.to_string());
        }
        self.save_to_disk().await
    }

    async fn save_to_disk(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let content = {
            let values = self.values.read().await;
            serde_json::to_string_pretty(&*values)?
        };
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slots_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let slots = SettingsSlots::load(&path).await.unwrap();
        slots.set(VOLUME_KEY, 0.25).await.unwrap();
        slots.set(MUTED_KEY, true).await.unwrap();
        slots.set(SONG_ID_KEY, "42").await.unwrap();

        let reloaded = SettingsSlots::load(&path).await.unwrap();
        assert_eq!(reloaded.get_f64(VOLUME_KEY).await, Some(0.25));
        assert_eq!(reloaded.get_bool(MUTED_KEY).await, Some(true));
        assert_eq!(reloaded.get(SONG_ID_KEY).await.as_deref(), Some("42"));
        assert_eq!(reloaded.get(POSITION_KEY).await, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writers_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let slots = SettingsSlots::load(&path).await.unwrap();

        let writers: Vec<_> = (0..40)
            .map(|i| {
                let slots = slots.clone();
                tokio::spawn(async move { slots.set(&format!("k{}", i), i).await })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let reloaded = SettingsSlots::load(&path).await.unwrap();
        for i in 0..40 {
            assert_eq!(reloaded.get_f64(&format!("k{}", i)).await, Some(i as f64));
        }
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let slots = SettingsSlots::load(&path).await.unwrap();
        assert_eq!(slots.get(VOLUME_KEY).await, None);
    }

    #[tokio::test]
    async fn in_memory_slots_do_not_touch_disk() {
        let slots = SettingsSlots::in_memory();
        slots.set(ACCENT_HUE_KEY, 120).await.unwrap();
        assert_eq!(slots.get_f64(ACCENT_HUE_KEY).await, Some(120.0));
        assert!(slots.path().is_none());
    }
}
