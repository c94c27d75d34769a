//! Audio output backed by rodio
//!
//! The output stream is not `Send`, so it lives on a dedicated thread that
//! owns the sink. [`AudioBackend`] is the media element handed to the
//! playback controller: it resolves a song locator to bytes, ships commands to
//! the audio thread, and the thread reports time updates and end-of-track back
//! over a tokio channel.

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rodio::{Decoder, OutputStream, Sink, Source};
use tokio::sync::{mpsc, oneshot};
use url::Url;

use crate::model::{MediaElement, MediaEvent, PlaybackError};

const TICK: Duration = Duration::from_millis(50);
const TIME_UPDATE_INTERVAL: Duration = Duration::from_millis(250);

enum AudioCommand {
    Clear,
    Play {
        bytes: Option<Vec<u8>>,
        start_at: f64,
        reply: oneshot::Sender<Result<(), PlaybackError>>,
    },
    Pause,
    Seek(f64),
    Volume(f64),
    Muted(bool),
}

/// Media element driving the rodio thread
pub struct AudioBackend {
    commands: std_mpsc::Sender<AudioCommand>,
    http: reqwest::Client,
    locator: Option<String>,
    loaded: bool,
    pending_seek: f64,
}

impl AudioBackend {
    /// Open the default output device. Fails when no device is available.
    pub fn start() -> Result<(Self, mpsc::UnboundedReceiver<MediaEvent>)> {
        let (commands, command_rx) = std_mpsc::channel::<AudioCommand>();
        let (events_tx, events_rx) = mpsc::unbounded_channel::<MediaEvent>();
        let (ready_tx, ready_rx) = std_mpsc::sync_channel::<Result<(), String>>(1);

        thread::Builder::new()
            .name("audio-output".into())
            .spawn(move || {
                let (_stream, handle) = match OutputStream::try_default() {
                    Ok(output) => output,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                let sink = match Sink::try_new(&handle) {
                    Ok(sink) => sink,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));
                AudioThread::new(sink, events_tx).run(command_rx);
            })?;

        ready_rx
            .recv()
            .map_err(|_| anyhow!("Audio thread exited during startup"))?
            .map_err(|e| anyhow!("No audio output: {}", e))?;

        tracing::info!("Audio output opened");
        Ok((
            Self {
                commands,
                http: reqwest::Client::new(),
                locator: None,
                loaded: false,
                pending_seek: 0.0,
            },
            events_rx,
        ))
    }

    async fn send_play(&mut self, bytes: Option<Vec<u8>>) -> Result<(), PlaybackError> {
        let (reply, done) = oneshot::channel();
        self.send(AudioCommand::Play {
            bytes,
            start_at: self.pending_seek,
            reply,
        });
        done.await
            .map_err(|_| PlaybackError::Rejected("audio output stopped".into()))??;
        self.loaded = true;
        self.pending_seek = 0.0;
        Ok(())
    }

    fn send(&self, command: AudioCommand) {
        if self.commands.send(command).is_err() {
            tracing::error!("Audio thread is gone; command dropped");
        }
    }
}

#[async_trait]
impl MediaElement for AudioBackend {
    fn set_source(&mut self, locator: Option<&str>) {
        self.locator = locator.map(str::to_string);
        self.loaded = false;
        self.pending_seek = 0.0;
        self.send(AudioCommand::Clear);
    }

    async fn play(&mut self) -> Result<(), PlaybackError> {
        if self.loaded {
            // The thread drops a track once it plays out; reload it from the locator
            match self.send_play(None).await {
                Err(PlaybackError::NothingLoaded) => {
                    tracing::debug!("Track drained, reloading source");
                    self.loaded = false;
                }
                other => return other,
            }
        }

        let locator = self.locator.as_deref().ok_or(PlaybackError::NothingLoaded)?;
        let bytes = resolve_locator(&self.http, locator).await?;
        self.send_play(Some(bytes)).await
    }

    fn pause(&mut self) {
        self.send(AudioCommand::Pause);
    }

    fn set_current_time(&mut self, seconds: f64) {
        if self.loaded {
            self.send(AudioCommand::Seek(seconds));
        } else {
            self.pending_seek = seconds;
        }
    }

    fn set_volume(&mut self, level: f64) {
        self.send(AudioCommand::Volume(level));
    }

    fn set_muted(&mut self, muted: bool) {
        self.send(AudioCommand::Muted(muted));
    }
}

struct AudioThread {
    sink: Sink,
    events: mpsc::UnboundedSender<MediaEvent>,
    has_track: bool,
    playing: bool,
    duration: f64,
    volume: f64,
    muted: bool,
    last_update: Instant,
}

impl AudioThread {
    fn new(sink: Sink, events: mpsc::UnboundedSender<MediaEvent>) -> Self {
        sink.pause();
        Self {
            sink,
            events,
            has_track: false,
            playing: false,
            duration: 0.0,
            volume: 1.0,
            muted: false,
            last_update: Instant::now(),
        }
    }

    fn run(mut self, commands: std_mpsc::Receiver<AudioCommand>) {
        loop {
            match commands.recv_timeout(TICK) {
                Ok(command) => self.handle(command),
                Err(std_mpsc::RecvTimeoutError::Timeout) => {}
                Err(std_mpsc::RecvTimeoutError::Disconnected) => break,
            }
            self.tick();
        }
        self.sink.stop();
        tracing::debug!("Audio thread stopped");
    }

    fn handle(&mut self, command: AudioCommand) {
        match command {
            AudioCommand::Clear => {
                self.sink.clear();
                self.has_track = false;
                self.playing = false;
                self.duration = 0.0;
            }
            AudioCommand::Play {
                bytes,
                start_at,
                reply,
            } => {
                let result = self.play(bytes, start_at);
                if let Err(e) = &result {
                    tracing::warn!(error = %e, "Audio playback failed");
                }
                let _ = reply.send(result);
            }
            AudioCommand::Pause => {
                self.sink.pause();
                self.playing = false;
            }
            AudioCommand::Seek(seconds) => {
                if self.has_track {
                    if let Err(e) = self.sink.try_seek(Duration::from_secs_f64(seconds.max(0.0))) {
                        tracing::debug!(error = %e, "Seek not supported by source");
                    }
                }
            }
            AudioCommand::Volume(level) => {
                self.volume = level;
                self.apply_volume();
            }
            AudioCommand::Muted(muted) => {
                self.muted = muted;
                self.apply_volume();
            }
        }
    }

    fn play(&mut self, bytes: Option<Vec<u8>>, start_at: f64) -> Result<(), PlaybackError> {
        if let Some(bytes) = bytes {
            let source = Decoder::new(Cursor::new(bytes))
                .map_err(|e| PlaybackError::Rejected(format!("unsupported audio: {}", e)))?;
            self.duration = source
                .total_duration()
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0);
            self.sink.clear();
            self.sink.append(source);
            self.has_track = true;
            if start_at > 0.0 {
                let _ = self.sink.try_seek(Duration::from_secs_f64(start_at));
            }
        }
        if !self.has_track {
            return Err(PlaybackError::NothingLoaded);
        }
        self.apply_volume();
        self.sink.play();
        self.playing = true;
        self.last_update = Instant::now();
        Ok(())
    }

    fn apply_volume(&self) {
        let level = if self.muted { 0.0 } else { self.volume.clamp(0.0, 1.0) };
        self.sink.set_volume(level as f32);
    }

    fn tick(&mut self) {
        if !self.playing || !self.has_track {
            return;
        }
        if self.sink.empty() {
            self.playing = false;
            self.has_track = false;
            let _ = self.events.send(MediaEvent::Ended);
            return;
        }
        if self.last_update.elapsed() >= TIME_UPDATE_INTERVAL {
            self.last_update = Instant::now();
            let _ = self.events.send(MediaEvent::TimeUpdate {
                position: self.sink.get_pos().as_secs_f64(),
                duration: self.duration,
            });
        }
    }
}

/// Media element used when no output device could be opened
pub struct NullElement;

#[async_trait]
impl MediaElement for NullElement {
    fn set_source(&mut self, _locator: Option<&str>) {}

    async fn play(&mut self) -> Result<(), PlaybackError> {
        Err(PlaybackError::Rejected("no audio output device".into()))
    }

    fn pause(&mut self) {}

    fn set_current_time(&mut self, _seconds: f64) {}

    fn set_volume(&mut self, _level: f64) {}

    fn set_muted(&mut self, _muted: bool) {}
}

/// Where the bytes behind a song locator come from
#[derive(Debug, PartialEq, Eq)]
enum Locator {
    Inline(Vec<u8>),
    File(PathBuf),
    Remote(Url),
}

fn parse_locator(locator: &str) -> Result<Locator, PlaybackError> {
    if let Some(rest) = locator.strip_prefix("data:") {
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| PlaybackError::Rejected("malformed data URI".into()))?;
        let bytes = if header.ends_with(";base64") {
            STANDARD
                .decode(payload)
                .map_err(|e| PlaybackError::Rejected(format!("malformed data URI: {}", e)))?
        } else {
            payload.as_bytes().to_vec()
        };
        return Ok(Locator::Inline(bytes));
    }

    match Url::parse(locator) {
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .map(Locator::File)
            .map_err(|_| PlaybackError::Rejected(format!("invalid file URL {}", locator))),
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Locator::Remote(url)),
        _ => Ok(Locator::File(PathBuf::from(locator))),
    }
}

async fn resolve_locator(http: &reqwest::Client, locator: &str) -> Result<Vec<u8>, PlaybackError> {
    match parse_locator(locator)? {
        Locator::Inline(bytes) => Ok(bytes),
        Locator::File(path) => tokio::fs::read(&path)
            .await
            .map_err(|e| PlaybackError::Rejected(format!("{}: {}", path.display(), e))),
        Locator::Remote(url) => {
            tracing::debug!(url = %url, "Fetching remote audio");
            let response = http
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| PlaybackError::Rejected(e.to_string()))?;
            let bytes = response
                .bytes()
                .await
                .map_err(|e| PlaybackError::Rejected(e.to_string()))?;
            Ok(bytes.to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_is_decoded_inline() {
        let locator = format!("data:audio/mpeg;base64,{}", STANDARD.encode(b"ID3"));
        assert_eq!(parse_locator(&locator), Ok(Locator::Inline(b"ID3".to_vec())));
        assert!(parse_locator("data:audio/mpeg;base64").is_err());
    }

    #[test]
    fn file_urls_and_plain_paths_map_to_files() {
        assert_eq!(
            parse_locator("file:///music/a%20b.mp3"),
            Ok(Locator::File(PathBuf::from("/music/a b.mp3")))
        );
        assert_eq!(
            parse_locator("/music/c.mp3"),
            Ok(Locator::File(PathBuf::from("/music/c.mp3")))
        );
    }

    #[test]
    fn http_urls_are_remote() {
        match parse_locator("https://cdn.example.com/track.mp3") {
            Ok(Locator::Remote(url)) => assert_eq!(url.host_str(), Some("cdn.example.com")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn local_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.mp3");
        std::fs::write(&path, b"bytes").unwrap();
        let url = Url::from_file_path(&path).unwrap();

        let bytes = resolve_locator(&reqwest::Client::new(), url.as_str()).await.unwrap();
        assert_eq!(bytes, b"bytes");
    }

    #[tokio::test]
    async fn missing_file_is_rejected() {
        let result = resolve_locator(&reqwest::Client::new(), "/definitely/not/here.mp3").await;
        assert!(matches!(result, Err(PlaybackError::Rejected(_))));
    }

    #[tokio::test]
    async fn drained_track_is_reloaded_on_play() {
        let (commands, command_rx) = std_mpsc::channel::<AudioCommand>();
        let (sent_tx, mut sent_rx) = mpsc::unbounded_channel::<bool>();
        thread::spawn(move || {
            // Stand-in for the audio thread after a track has ended
            let mut has_track = false;
            while let Ok(command) = command_rx.recv() {
                if let AudioCommand::Play { bytes, reply, .. } = command {
                    let _ = sent_tx.send(bytes.is_some());
                    if bytes.is_some() {
                        has_track = true;
                    }
                    let result = if has_track { Ok(()) } else { Err(PlaybackError::NothingLoaded) };
                    let _ = reply.send(result);
                }
            }
        });

        let mut backend = AudioBackend {
            commands,
            http: reqwest::Client::new(),
            locator: Some(format!("data:audio/mpeg;base64,{}", STANDARD.encode(b"ID3"))),
            loaded: true,
            pending_seek: 0.0,
        };

        assert_eq!(backend.play().await, Ok(()));
        assert_eq!(sent_rx.recv().await, Some(false));
        assert_eq!(sent_rx.recv().await, Some(true));
        assert!(backend.loaded);
    }

    #[tokio::test]
    async fn null_element_refuses_to_play() {
        let mut element = NullElement;
        element.set_source(Some("file:///a.mp3"));
        assert!(matches!(element.play().await, Err(PlaybackError::Rejected(_))));
    }
}
