//! Key event handling

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::model::{ActiveSection, Dialog};
use super::AppController;

impl AppController {
    pub async fn handle_key_event(&self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        let model = self.model.lock().await;

        // Help popup swallows everything until closed
        if model.is_help_popup_open().await {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('H')) {
                model.hide_help_popup().await;
            }
            return Ok(());
        }

        // Dialogs own the keyboard while open
        if let Some(dialog) = model.get_dialog().await {
            match dialog {
                Dialog::Settings => match key.code {
                    KeyCode::Left | KeyCode::Char('-') => {
                        drop(model);
                        self.adjust_accent_hue(false).await;
                    }
                    KeyCode::Right | KeyCode::Char('+') | KeyCode::Char('=') => {
                        drop(model);
                        self.adjust_accent_hue(true).await;
                    }
                    KeyCode::Esc | KeyCode::Enter | KeyCode::Char('s') | KeyCode::Char('S') => {
                        model.close_dialog().await;
                    }
                    _ => {}
                },
                Dialog::CreateAlbum { .. } | Dialog::ImportFolder { .. } => match key.code {
                    KeyCode::Esc => model.close_dialog().await,
                    KeyCode::Enter => {
                        drop(model);
                        self.submit_dialog().await;
                    }
                    KeyCode::Tab | KeyCode::BackTab => model.dialog_next_field().await,
                    KeyCode::Backspace => model.dialog_backspace().await,
                    KeyCode::Char(c) => model.dialog_input(c).await,
                    _ => {}
                },
            }
            return Ok(());
        }

        let ui_state = model.get_ui_state().await;

        if key.code == KeyCode::Esc && ui_state.notification.is_some() {
            model.clear_notification().await;
            return Ok(());
        }

        // Search input
        if ui_state.active_section == ActiveSection::Search {
            match key.code {
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        model.cycle_section_backward().await;
                    } else {
                        model.cycle_section_forward().await;
                    }
                    return Ok(());
                }
                KeyCode::BackTab => {
                    model.cycle_section_backward().await;
                    return Ok(());
                }
                KeyCode::Enter => {
                    drop(model);
                    self.perform_search().await;
                    return Ok(());
                }
                KeyCode::Esc => {
                    model.clear_search().await;
                    return Ok(());
                }
                KeyCode::Backspace => {
                    model.backspace_search().await;
                    return Ok(());
                }
                KeyCode::Char(c) => {
                    // Ctrl+Q still quits while typing
                    if (c == 'q' || c == 'Q') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        model.set_should_quit(true).await;
                        return Ok(());
                    }
                    model.append_to_search(c).await;
                    return Ok(());
                }
                _ => {}
            }
        }

        // Main content list
        if ui_state.active_section == ActiveSection::MainContent {
            match key.code {
                KeyCode::Up => {
                    model.content_move_up().await;
                    return Ok(());
                }
                KeyCode::Down => {
                    let more = model.content_move_down().await;
                    drop(model);
                    if let Some(request) = more {
                        self.load_more(request).await;
                    }
                    return Ok(());
                }
                KeyCode::Enter => {
                    drop(model);
                    self.spawn_player_action(|c| async move { c.activate_selection().await });
                    return Ok(());
                }
                KeyCode::Char('a') | KeyCode::Char('A') => {
                    drop(model);
                    self.add_selected_to_library().await;
                    return Ok(());
                }
                KeyCode::Delete => {
                    drop(model);
                    self.delete_selected().await;
                    return Ok(());
                }
                _ => {}
            }
        }

        // Global keybindings
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                model.set_should_quit(true).await;
            }
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    model.cycle_section_backward().await;
                } else {
                    model.cycle_section_forward().await;
                }
            }
            KeyCode::BackTab => {
                model.cycle_section_backward().await;
            }
            KeyCode::Up => {
                model.move_selection_up().await;
            }
            KeyCode::Down => {
                model.move_selection_down().await;
            }
            KeyCode::Enter => match ui_state.active_section {
                ActiveSection::Navigation => {
                    drop(model);
                    self.open_nav_item().await;
                }
                ActiveSection::Albums => {
                    drop(model);
                    self.open_selected_album().await;
                }
                _ => {}
            },
            KeyCode::Delete if ui_state.active_section == ActiveSection::Albums => {
                drop(model);
                self.delete_selected().await;
            }
            // Play/Pause toggle
            KeyCode::Char(' ') => {
                drop(model);
                self.spawn_player_action(|c| async move { c.toggle_playback().await });
            }
            KeyCode::Char('n') | KeyCode::Char('N') => {
                drop(model);
                self.spawn_player_action(|c| async move { c.next_track().await });
            }
            KeyCode::Char('p') | KeyCode::Char('P') => {
                drop(model);
                self.spawn_player_action(|c| async move { c.previous_track().await });
            }
            KeyCode::Left => {
                drop(model);
                self.spawn_player_action(|c| async move { c.seek_backward().await });
            }
            KeyCode::Right => {
                drop(model);
                self.spawn_player_action(|c| async move { c.seek_forward().await });
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                drop(model);
                self.spawn_player_action(|c| async move { c.volume_up().await });
            }
            KeyCode::Char('-') => {
                drop(model);
                self.spawn_player_action(|c| async move { c.volume_down().await });
            }
            KeyCode::Char('m') | KeyCode::Char('M') => {
                drop(model);
                self.spawn_player_action(|c| async move { c.toggle_mute().await });
            }
            KeyCode::Char('x') | KeyCode::Char('X') => {
                drop(model);
                self.spawn_player_action(|c| async move { c.shuffle_album().await });
            }
            KeyCode::Char('c') | KeyCode::Char('C') => {
                drop(model);
                self.open_create_album_dialog().await;
            }
            KeyCode::Char('i') | KeyCode::Char('I') => {
                drop(model);
                self.open_import_dialog().await;
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                drop(model);
                self.open_settings_dialog().await;
            }
            // Focus search
            KeyCode::Char('/') | KeyCode::Char('g') | KeyCode::Char('G') => {
                model.set_active_section(ActiveSection::Search).await;
            }
            KeyCode::Char('h') | KeyCode::Char('H') => {
                model.show_help_popup().await;
            }
            _ => {}
        }
        Ok(())
    }
}
