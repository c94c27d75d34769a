//! Background listeners: media events, app events, position saving and
//! store write failures

use std::time::Duration;
use tokio::sync::mpsc;

use crate::model::{MediaEvent, StoreError};
use super::{AppController, AppEvent};

const POSITION_SAVE_INTERVAL: Duration = Duration::from_secs(1);

impl AppController {
    /// Forward media element events to the playback controller
    pub fn start_media_event_listener(&self, mut events: mpsc::UnboundedReceiver<MediaEvent>) {
        let player = self.player.clone();
        tracing::info!("Starting media event listener");

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match &event {
                    MediaEvent::TimeUpdate { position, .. } => {
                        tracing::trace!(position, "MediaEvent::TimeUpdate");
                    }
                    MediaEvent::Ended => tracing::debug!("MediaEvent::Ended"),
                }
                player.lock().await.on_media_event(event);
            }
            tracing::debug!("Media event listener stopped");
        });
    }

    pub fn start_app_event_listener(&self, mut events: mpsc::UnboundedReceiver<AppEvent>) {
        let controller = self.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if controller.model.lock().await.should_quit().await {
                    break;
                }
                match event {
                    AppEvent::TrackEnded => controller.advance_after_end().await,
                }
            }
            tracing::debug!("App event listener stopped");
        });
    }

    /// Save the playback position once per second while playing
    pub fn start_position_saver(&self) {
        let controller = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(POSITION_SAVE_INTERVAL);
            loop {
                interval.tick().await;
                if controller.model.lock().await.should_quit().await {
                    break;
                }
                controller.player.lock().await.persist_position().await;
            }
        });
    }

    /// Surface failed background store writes as notifications
    pub fn start_store_failure_listener(&self, mut failures: mpsc::UnboundedReceiver<StoreError>) {
        let model = self.model.clone();
        tokio::spawn(async move {
            while let Some(error) = failures.recv().await {
                tracing::error!(error = %error, "Library write failed");
                let model = model.lock().await;
                model
                    .notify_error(format!("Could not save your library: {}", error))
                    .await;
            }
        });
    }
}
