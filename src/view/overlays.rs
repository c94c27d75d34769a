//! Overlay rendering (notification, dialogs, help popup)

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::model::theme::{MAX_ACCENT_HUE, accent_color};
use crate::model::{AlbumFormField, Dialog, NotificationKind, UiState};

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    Rect {
        x: area.width.saturating_sub(width) / 2,
        y: area.height.saturating_sub(height) / 2,
        width,
        height,
    }
}

fn popup_block(title: &str, color: Color) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title.to_string())
        .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .style(Style::default().bg(Color::Black))
}

pub fn render_notification(frame: &mut Frame, ui_state: &UiState, accent: Color) {
    let Some(notification) = &ui_state.notification else {
        return;
    };
    let area = frame.area();

    let popup_width = 52.min(area.width.saturating_sub(4));
    let inner_width = popup_width.saturating_sub(4).max(1) as usize;
    let line_count = notification.message.chars().count().div_ceil(inner_width) as u16;
    let popup_area = centered(area, popup_width, 2 + line_count.max(1));

    let (color, title) = match notification.kind {
        NotificationKind::Error => (Color::Red, " Error (Esc to dismiss) "),
        NotificationKind::Info => (accent, " Info "),
    };

    frame.render_widget(Clear, popup_area);
    let widget = Paragraph::new(notification.message.clone())
        .style(Style::default().fg(color))
        .wrap(Wrap { trim: false })
        .block(popup_block(title, color));
    frame.render_widget(widget, popup_area);
}

pub fn render_dialog(frame: &mut Frame, dialog: &Dialog, ui_state: &UiState, accent: Color) {
    match dialog {
        Dialog::CreateAlbum {
            title,
            theme,
            field,
        } => render_create_album(frame, title, theme, *field, accent),
        Dialog::ImportFolder { path } => render_import_folder(frame, path, accent),
        Dialog::Settings => render_settings(frame, ui_state.accent_hue),
    }
}

fn input_line(label: &str, value: &str, focused: bool, accent: Color) -> Line<'static> {
    let cursor = if focused { "▏" } else { "" };
    let value_style = if focused {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    Line::from(vec![
        Span::styled(
            format!("{:>8}: ", label),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("{}{}", value, cursor), value_style),
    ])
}

fn render_create_album(
    frame: &mut Frame,
    title: &str,
    theme: &str,
    field: AlbumFormField,
    accent: Color,
) {
    let popup_area = centered(frame.area(), 56, 8);
    frame.render_widget(Clear, popup_area);

    let lines = vec![
        input_line("Title", title, field == AlbumFormField::Title, accent),
        input_line("Theme", theme, field == AlbumFormField::Theme, accent),
        Line::from(""),
        Line::from(Span::styled(
            "Tab switch field · Enter create · Esc cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let form = Paragraph::new(lines).block(popup_block(" Create Album ", accent));
    frame.render_widget(form, popup_area);
}

fn render_import_folder(frame: &mut Frame, path: &str, accent: Color) {
    let popup_area = centered(frame.area(), 64, 7);
    frame.render_widget(Clear, popup_area);

    let lines = vec![
        input_line("Folder", path, true, accent),
        Line::from(""),
        Line::from(Span::styled(
            "Audio files become tracks; the first image is the cover.",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(
            "Enter import · Esc cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let form = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(popup_block(" Import Album ", accent));
    frame.render_widget(form, popup_area);
}

fn render_settings(frame: &mut Frame, hue: u16) {
    let accent = accent_color(hue);
    let popup_area = centered(frame.area(), 48, 8);
    frame.render_widget(Clear, popup_area);

    let slider_width = 30usize;
    let filled = (hue as usize * slider_width) / MAX_ACCENT_HUE as usize;
    let slider = format!(
        "{}{}",
        "█".repeat(filled),
        "░".repeat(slider_width.saturating_sub(filled))
    );

    let lines = vec![
        Line::from(vec![
            Span::styled("Accent hue: ", Style::default().fg(Color::White)),
            Span::styled(
                format!("{}°", hue),
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(slider, Style::default().fg(accent))),
        Line::from(""),
        Line::from(Span::styled(
            "← / → adjust · Esc close",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let settings = Paragraph::new(lines).block(popup_block(" Theme ", accent));
    frame.render_widget(settings, popup_area);
}

pub fn render_help_popup(frame: &mut Frame, accent: Color) {
    let keybindings = [
        ("", "── Navigation ──"),
        ("Tab / Shift+Tab", "Cycle sections"),
        ("↑ / ↓", "Move selection"),
        ("Enter", "Open / Play"),
        ("/ or G", "Focus search"),
        ("", ""),
        ("", "── Playback ──"),
        ("Space", "Play / Pause"),
        ("N / P", "Next / previous track"),
        ("← / →", "Seek 5 seconds"),
        ("+ / -", "Volume up / down"),
        ("M", "Mute"),
        ("X", "Shuffle album and play"),
        ("", ""),
        ("", "── Library ──"),
        ("A", "Add catalog track to Added Songs"),
        ("C", "Create album"),
        ("I", "Import album from folder"),
        ("Delete", "Remove song / album"),
        ("S", "Theme settings"),
        ("", ""),
        ("", "── General ──"),
        ("H", "Toggle this help"),
        ("Q", "Quit"),
    ];

    let popup_area = centered(frame.area(), 62, keybindings.len() as u16 + 2);
    frame.render_widget(Clear, popup_area);

    let lines: Vec<Line> = keybindings
        .iter()
        .map(|(key, desc)| {
            if key.is_empty() {
                Line::from(Span::styled(
                    format!("{:^38}", desc),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(vec![
                    Span::styled(
                        format!("{:>18}", key),
                        Style::default().fg(accent).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                    Span::styled(desc.to_string(), Style::default().fg(Color::White)),
                ])
            }
        })
        .collect();

    let help_text = Paragraph::new(lines)
        .block(popup_block(" Help (H or Esc to close) ", Color::Cyan))
        .style(Style::default().bg(Color::Black));

    frame.render_widget(help_text, popup_area);
}
