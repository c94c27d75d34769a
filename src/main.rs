mod audio;
mod config;
mod controller;
mod logging;
mod model;
mod view;

use std::io;
use std::sync::Arc;
use anyhow::Result;
use std::time::Duration;
use clap::Parser;
use tokio::sync::{mpsc, Mutex};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use view::AppView;
use audio::{AudioBackend, NullElement};
use config::Config;
use controller::{AppController, AppEvent};
use model::{
    AppModel, CatalogClient, FileStore, KeyValueStore, LibraryManager, MediaElement, MemoryStore,
    PlaybackController, PlaybackInfo, SettingsSlots, StoreWriter, DEFAULT_API_BASE,
};

/// Messages raised before the model exists, shown once the UI is up
enum StartupNotice {
    Info(String),
    Error(String),
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    if let Err(e) = logging::init_logging(&config.log_dir) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== musicbox starting ===");

    let mut notices = Vec::new();

    // Step 1: Open the store, falling back to memory so the session still works
    let store_dir = config.store_dir();
    let store: Arc<dyn KeyValueStore> = match FileStore::open(&store_dir).await {
        Ok(store) => {
            tracing::info!(path = %store_dir.display(), "Store opened");
            Arc::new(store)
        }
        Err(e) => {
            tracing::error!(path = %store_dir.display(), error = %e, "Store unavailable, using memory");
            notices.push(StartupNotice::Error(format!(
                "Library storage unavailable ({}). Changes will not be saved.",
                e
            )));
            Arc::new(MemoryStore::new())
        }
    };

    let (failure_tx, failure_rx) = mpsc::unbounded_channel();
    let writer = StoreWriter::spawn(store.clone(), Some(failure_tx));

    // Step 2: Settings slots
    let slots = match SettingsSlots::load(config.settings_path()).await {
        Ok(slots) => slots,
        Err(e) => {
            tracing::warn!(error = %e, "Settings unavailable, using defaults");
            SettingsSlots::in_memory()
        }
    };

    // Step 3: Library
    let (library, load_error) = LibraryManager::open(&*store, writer.clone()).await;
    if let Some(e) = load_error {
        notices.push(StartupNotice::Error(format!(
            "Could not load library ({}). Changes will not be saved this session.",
            e
        )));
    }

    // Step 4: Catalog client
    let catalog = match CatalogClient::new(&config.catalog_base_url, &config.catalog_client_id) {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(base_url = %config.catalog_base_url, error = %e, "Invalid catalog URL, using default");
            CatalogClient::new(DEFAULT_API_BASE, &config.catalog_client_id)?
        }
    };

    // Step 5: Audio output
    let (element, media_events): (Box<dyn MediaElement>, _) = match AudioBackend::start() {
        Ok((backend, events)) => (Box::new(backend), Some(events)),
        Err(e) => {
            tracing::error!(error = %e, "Audio output unavailable");
            notices.push(StartupNotice::Info(
                "No audio device found. Playback is disabled.".to_string(),
            ));
            (Box::new(NullElement), None)
        }
    };

    let mut player = PlaybackController::new(element, slots.clone()).await;
    let (app_event_tx, app_event_rx) = mpsc::unbounded_channel();
    player.set_on_ended(Box::new(move || {
        let _ = app_event_tx.send(AppEvent::TrackEnded);
    }));

    let accent_hue = model::theme::load_accent_hue(&slots).await;
    let app_model = AppModel::new(library, accent_hue);
    for notice in notices {
        match notice {
            StartupNotice::Info(message) => app_model.notify(message).await,
            StartupNotice::Error(message) => app_model.notify_error(message).await,
        }
    }

    let model = Arc::new(Mutex::new(app_model));
    let player = Arc::new(Mutex::new(player));

    let controller = AppController::new(model.clone(), player.clone(), catalog, slots);
    controller.restore_last_song().await;
    if let Some(events) = media_events {
        controller.start_media_event_listener(events);
    }
    controller.start_app_event_listener(app_event_rx);
    controller.start_position_saver();
    controller.start_store_failure_listener(failure_rx);

    tracing::info!("Starting TUI...");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, model.clone(), player.clone(), controller).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "Application error");
    }

    player.lock().await.persist_position().await;
    writer.flush().await;

    tracing::info!("musicbox shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    model: Arc<Mutex<AppModel>>,
    player: Arc<Mutex<PlaybackController>>,
    controller: AppController,
) -> io::Result<()> {
    // Last known playback state, reused while a play() holds the player lock
    let mut playback = PlaybackInfo::default();

    loop {
        let (ui_state, content_state, library, should_quit) = {
            let model_guard = model.lock().await;

            // Auto-clear old notifications (after 5 seconds)
            model_guard.auto_clear_old_notifications().await;

            (
                model_guard.get_ui_state().await,
                model_guard.get_content_state().await,
                model_guard.library_snapshot().await,
                model_guard.should_quit().await,
            )
        };

        if let Ok(player) = player.try_lock() {
            playback = player.info();
        }

        terminal.draw(|f| {
            AppView::render(f, &playback, &ui_state, &content_state, &library);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                // Errors surface as notifications inside the controller
                let _ = controller.handle_key_event(key).await;
            }
        }

        if should_quit {
            break;
        }
    }

    Ok(())
}
