//! Main content area rendering (album tracks, catalog listing)

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use ratatui::widgets::Padding;

use crate::model::{
    ActiveSection, BrowseState, ContentState, ContentView, ItemId, LibrarySnapshot, UiState,
};
use super::utils::{border_style, calculate_num_width, truncate_string};

/// One row of a track table
struct TrackRow<'a> {
    id: &'a ItemId,
    title: &'a str,
    artist: &'a str,
}

pub fn render_main_content(
    frame: &mut Frame,
    area: Rect,
    ui_state: &UiState,
    content_state: &ContentState,
    library: &LibrarySnapshot,
    playing_id: Option<&ItemId>,
    accent: Color,
) {
    let is_focused = ui_state.active_section == ActiveSection::MainContent;

    match &content_state.view {
        ContentView::Empty => {
            let content = Paragraph::new(
                "Open an album from the sidebar, or pick Browse to explore the catalog\n\n\
                 Use Tab to navigate between sections\n\
                 Use ↑/↓ to select items\n\
                 Press Enter to open or play\n\
                 Press H for all keys",
            )
            .style(Style::default().fg(Color::DarkGray))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .padding(Padding::horizontal(1))
                    .border_style(border_style(is_focused, accent)),
            );
            frame.render_widget(content, area);
        }
        ContentView::AlbumTracks {
            album_id,
            selected_index,
        } => {
            let Some(album) = library.albums.iter().find(|a| &a.id == album_id) else {
                return;
            };
            let title = match &album.theme {
                Some(theme) => format!(" {} · {} ", album.title, theme),
                None => format!(" {} ", album.title),
            };
            if album.songs.is_empty() {
                let hint = if album.is_default() {
                    "No songs yet. Browse the catalog and press A to add tracks here."
                } else {
                    "This album is empty."
                };
                render_message(frame, area, &title, hint, is_focused, accent);
                return;
            }
            let rows: Vec<TrackRow> = album
                .songs
                .iter()
                .map(|s| TrackRow {
                    id: &s.id,
                    title: &s.title,
                    artist: &s.artist,
                })
                .collect();
            render_track_table(
                frame,
                area,
                &title,
                &rows,
                *selected_index,
                is_focused,
                playing_id,
                accent,
                None,
            );
        }
        ContentView::Browse => {
            render_browse(frame, area, &content_state.browse, is_focused, playing_id, accent);
        }
    }
}

fn render_browse(
    frame: &mut Frame,
    area: Rect,
    browse: &BrowseState,
    is_focused: bool,
    playing_id: Option<&ItemId>,
    accent: Color,
) {
    let title = if browse.query.is_empty() {
        " Recommended ".to_string()
    } else {
        format!(" Results for \"{}\" ", browse.query)
    };

    if browse.tracks.is_empty() {
        let message = if browse.loading {
            "Loading..."
        } else if browse.failed {
            "Could not load tracks. Press Enter in the search bar to retry."
        } else {
            "No tracks found."
        };
        render_message(frame, area, &title, message, is_focused, accent);
        return;
    }

    let footer = if browse.loading {
        Some("Loading more...")
    } else if browse.has_more() {
        Some("↓ for more")
    } else {
        None
    };

    let rows: Vec<TrackRow> = browse
        .tracks
        .iter()
        .map(|t| TrackRow {
            id: &t.id,
            title: &t.title,
            artist: &t.artist,
        })
        .collect();
    render_track_table(
        frame,
        area,
        &title,
        &rows,
        browse.selected_index,
        is_focused,
        playing_id,
        accent,
        footer,
    );
}

fn render_message(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    message: &str,
    is_focused: bool,
    accent: Color,
) {
    let paragraph = Paragraph::new(message.to_string())
        .style(Style::default().fg(Color::DarkGray))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title.to_string())
                .padding(Padding::horizontal(1))
                .border_style(border_style(is_focused, accent)),
        );
    frame.render_widget(paragraph, area);
}

#[allow(clippy::too_many_arguments)]
fn render_track_table(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    rows: &[TrackRow],
    selected_index: usize,
    is_focused: bool,
    playing_id: Option<&ItemId>,
    accent: Color,
    footer: Option<&str>,
) {
    let content_width = area.width.saturating_sub(4) as usize;
    let num_width = calculate_num_width(rows.len());
    let fixed_width = 1 + num_width + 3 + 3;
    let remaining_width = content_width.saturating_sub(fixed_width);
    let title_width = (remaining_width * 60) / 100;
    let artist_width = remaining_width.saturating_sub(title_width);

    let mut items: Vec<ListItem> = vec![
        ListItem::new(format!(
            " {:<num_width$}   {:<title_width$}   {:<artist_width$}",
            "#",
            "Title",
            "Artist",
            num_width = num_width,
            title_width = title_width,
            artist_width = artist_width
        ))
        .style(Style::default().fg(accent).add_modifier(Modifier::BOLD)),
    ];

    items.extend(rows.iter().enumerate().map(|(i, row)| {
        let is_playing = playing_id == Some(row.id);
        let style = if i == selected_index && is_focused {
            Style::default().fg(accent).add_modifier(Modifier::BOLD)
        } else if is_playing {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else if i == selected_index {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        let playing_indicator = if is_playing { "▶" } else { " " };
        ListItem::new(format!(
            "{}{:<num_width$}   {}   {}",
            playing_indicator,
            i + 1,
            truncate_string(row.title, title_width),
            truncate_string(row.artist, artist_width),
            num_width = num_width
        ))
        .style(style)
    }));

    if let Some(footer) = footer {
        items.push(ListItem::new(format!(" {}", footer)).style(Style::default().fg(Color::DarkGray)));
    }

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title.to_string())
                .padding(Padding::horizontal(1))
                .border_style(border_style(is_focused, accent)),
        )
        .highlight_style(Style::default());

    let mut list_state = ListState::default();
    list_state.select(Some(selected_index + 1)); // +1 for header

    frame.render_stateful_widget(list, area, &mut list_state);
}
