//! View module - UI rendering
//!
//! This module handles all UI rendering for the application using ratatui.
//! It is organized into submodules by component type:
//!
//! - `utils`: Shared utility functions (formatting, scrollable lists)
//! - `layout`: Main layout structure (top bar, sidebar)
//! - `content`: Main content area rendering
//! - `progress`: Progress bar rendering
//! - `overlays`: Modal overlays (notification, dialogs, help)

mod utils;
mod layout;
mod content;
mod progress;
mod overlays;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::model::theme::accent_color;
use crate::model::{ContentState, LibrarySnapshot, PlaybackInfo, UiState};

pub struct AppView;

impl AppView {
    pub fn render(
        frame: &mut Frame,
        playback: &PlaybackInfo,
        ui_state: &UiState,
        content_state: &ContentState,
        library: &LibrarySnapshot,
    ) {
        let accent = accent_color(ui_state.accent_hue);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Search bar + library summary
                Constraint::Min(0),    // Main content (sidebar + content)
                Constraint::Length(3), // Progress bar with playback info
            ])
            .split(frame.area());

        layout::render_top_bar(frame, chunks[0], ui_state, library, accent);

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(30), // Sidebar (Music + Albums)
                Constraint::Percentage(70), // Main content
            ])
            .split(chunks[1]);

        layout::render_sidebar(frame, main_chunks[0], ui_state, library, accent);

        let playing_id = playback.song.as_ref().map(|s| &s.id);
        content::render_main_content(
            frame,
            main_chunks[1],
            ui_state,
            content_state,
            library,
            playing_id,
            accent,
        );

        progress::render_progress_bar(frame, chunks[2], playback, accent);

        if let Some(dialog) = &ui_state.dialog {
            overlays::render_dialog(frame, dialog, ui_state, accent);
        }

        if ui_state.notification.is_some() {
            overlays::render_notification(frame, ui_state, accent);
        }

        if ui_state.show_help_popup {
            overlays::render_help_popup(frame, accent);
        }
    }
}
