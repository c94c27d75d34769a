//! Folder import: turn a directory of audio files into an album
//!
//! Files are partitioned by extension into audio and images. Each audio file
//! becomes a track with a `file://` locator; the first image (in path order)
//! becomes the shared cover, embedded as a `data:` URI so it survives the
//! folder being moved.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::future::try_join_all;
use thiserror::Error;
use url::Url;

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "oga", "flac", "m4a", "aac", "opus"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("{0} is not a folder")]
    NotAFolder(PathBuf),
    #[error("No files selected for import")]
    Empty,
    #[error("Could not determine album name for {0}")]
    NoAlbumName(PathBuf),
    #[error("No music files found in the folder")]
    NoAudio,
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Image,
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportedTrack {
    pub title: String,
    pub url: String,
}

/// Result of scanning a folder, before ids are assigned by the library
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportedAlbum {
    pub title: String,
    pub cover_url: Option<String>,
    pub tracks: Vec<ImportedTrack>,
}

pub fn classify(path: &Path) -> MediaKind {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        MediaKind::Audio
    } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        MediaKind::Image
    } else {
        MediaKind::Other
    }
}

/// File name without its final extension ("01 - Intro.mp3" -> "01 - Intro")
pub fn title_from_file_name(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}

fn image_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "image/jpeg",
    }
}

pub async fn scan_folder(dir: &Path) -> Result<ImportedAlbum, ImportError> {
    let metadata = tokio::fs::metadata(dir).await.map_err(|source| ImportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(ImportError::NotAFolder(dir.to_path_buf()));
    }

    let title = dir
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ImportError::NoAlbumName(dir.to_path_buf()))?;

    let files = collect_files(dir).await?;
    if files.is_empty() {
        return Err(ImportError::Empty);
    }

    let audio_files: Vec<&PathBuf> = files
        .iter()
        .filter(|p| classify(p) == MediaKind::Audio)
        .collect();
    if audio_files.is_empty() {
        return Err(ImportError::NoAudio);
    }

    let cover_url = match files.iter().find(|p| classify(p) == MediaKind::Image) {
        Some(image) => Some(encode_cover(image).await?),
        None => None,
    };

    let tracks = try_join_all(audio_files.into_iter().map(|path| async move {
        let absolute = tokio::fs::canonicalize(path)
            .await
            .map_err(|source| ImportError::Io {
                path: path.clone(),
                source,
            })?;
        let url = Url::from_file_path(&absolute)
            .map(String::from)
            .unwrap_or_else(|_| absolute.display().to_string());
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        Ok::<_, ImportError>(ImportedTrack {
            title: title_from_file_name(name),
            url,
        })
    }))
    .await?;

    tracing::info!(
        folder = %dir.display(),
        tracks = tracks.len(),
        has_cover = cover_url.is_some(),
        "Folder scanned for import"
    );

    Ok(ImportedAlbum {
        title,
        cover_url,
        tracks,
    })
}

/// All regular files under `dir`, sorted by path
async fn collect_files(dir: &Path) -> Result<Vec<PathBuf>, ImportError> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&current)
            .await
            .map_err(|source| ImportError::Io {
                path: current.clone(),
                source,
            })?;
        while let Some(entry) = entries.next_entry().await.map_err(|source| ImportError::Io {
            path: current.clone(),
            source,
        })? {
            let path = entry.path();
            match entry.file_type().await {
                Ok(ft) if ft.is_dir() => pending.push(path),
                Ok(ft) if ft.is_file() => files.push(path),
                _ => {}
            }
        }
    }

    files.sort();
    Ok(files)
}

async fn encode_cover(path: &Path) -> Result<String, ImportError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(format!("data:{};base64,{}", image_mime(path), STANDARD.encode(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_strip_only_the_last_extension() {
        assert_eq!(title_from_file_name("01 - Intro.mp3"), "01 - Intro");
        assert_eq!(title_from_file_name("a.b.flac"), "a.b");
        assert_eq!(title_from_file_name("noext"), "noext");
        assert_eq!(title_from_file_name(".hidden"), ".hidden");
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(classify(Path::new("x/SONG.MP3")), MediaKind::Audio);
        assert_eq!(classify(Path::new("cover.JPG")), MediaKind::Image);
        assert_eq!(classify(Path::new("notes.txt")), MediaKind::Other);
    }

    #[tokio::test]
    async fn folder_with_three_tracks_and_a_cover() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("Road Trip");
        std::fs::create_dir(&dir).unwrap();
        for name in ["b.mp3", "a.ogg", "c.flac"] {
            std::fs::write(dir.join(name), b"audio").unwrap();
        }
        std::fs::write(dir.join("cover.png"), [0x89, b'P', b'N', b'G']).unwrap();
        std::fs::write(dir.join("readme.txt"), b"ignored").unwrap();

        let album = scan_folder(&dir).await.unwrap();
        assert_eq!(album.title, "Road Trip");
        let titles: Vec<_> = album.tracks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["a", "b", "c"]);
        assert!(album.tracks.iter().all(|t| t.url.starts_with("file://")));
        let cover = album.cover_url.unwrap();
        assert!(cover.starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn folder_without_audio_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("cover.jpg"), b"img").unwrap();
        assert!(matches!(scan_folder(root.path()).await, Err(ImportError::NoAudio)));
    }

    #[tokio::test]
    async fn empty_folder_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        assert!(matches!(scan_folder(root.path()).await, Err(ImportError::Empty)));
    }

    #[tokio::test]
    async fn file_path_is_not_a_folder() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("song.mp3");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(scan_folder(&file).await, Err(ImportError::NotAFolder(_))));
    }
}
