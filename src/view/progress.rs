//! Progress bar rendering

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Gauge},
    Frame,
};

use crate::model::{PlaybackInfo, TransportState};
use super::utils::format_duration;

pub fn render_progress_bar(frame: &mut Frame, area: Rect, playback: &PlaybackInfo, accent: Color) {
    let status_text = match &playback.song {
        None => " No track playing".to_string(),
        Some(song) => {
            let icon = match playback.state {
                TransportState::Playing => "▶",
                _ => "⏸ ",
            };
            format!(" {} {} | {}", icon, song.title, song.artist)
        }
    };

    let volume_text = if playback.muted {
        "Muted".to_string()
    } else {
        format!("Vol: {}%", (playback.volume * 100.0).round() as u32)
    };

    let time_str = format!(
        "{} / {}",
        format_duration(playback.position),
        format_duration(playback.duration)
    );

    let progress_ratio = if playback.duration > 0.0 {
        (playback.position / playback.duration).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} ", status_text))
                .title_bottom(Line::from(format!(" {} ", volume_text)).right_aligned()),
        )
        .gauge_style(Style::default().fg(accent))
        .ratio(progress_ratio)
        .label(time_str);

    frame.render_widget(gauge, area);
}
