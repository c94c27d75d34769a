//! Layout rendering (top bar, sidebar)

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};
use ratatui::widgets::Padding;

use crate::model::{ActiveSection, LibrarySnapshot, NavItem, UiState};
use super::utils::{border_style, render_scrollable_list};

pub fn render_top_bar(
    frame: &mut Frame,
    area: Rect,
    ui_state: &UiState,
    library: &LibrarySnapshot,
    accent: Color,
) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),     // Search input
            Constraint::Length(25), // Library summary
        ])
        .split(area);

    let focused = ui_state.active_section == ActiveSection::Search;
    let search_style = if focused {
        Style::default().fg(accent)
    } else {
        Style::default().fg(Color::White)
    };

    let search_text = if ui_state.search_query.is_empty() {
        "Search the catalog..."
    } else {
        &ui_state.search_query
    };

    let search = Paragraph::new(search_text).style(search_style).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Search ")
            .padding(Padding::horizontal(1))
            .border_style(border_style(focused, accent)),
    );
    frame.render_widget(search, chunks[0]);

    let song_count: usize = library.albums.iter().map(|a| a.songs.len()).sum();
    let summary = Paragraph::new(format!(
        "🎵 {} albums · {} songs",
        library.albums.len(),
        song_count
    ))
    .style(Style::default().fg(accent))
    .block(Block::default().borders(Borders::ALL).title(" Library "));
    frame.render_widget(summary, chunks[1]);
}

pub fn render_sidebar(
    frame: &mut Frame,
    area: Rect,
    ui_state: &UiState,
    library: &LibrarySnapshot,
    accent: Color,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(NavItem::ALL.len() as u16 + 2),
            Constraint::Min(0),
        ])
        .split(area);

    let nav_focused = ui_state.active_section == ActiveSection::Navigation;
    let nav_items: Vec<ListItem> = NavItem::ALL
        .iter()
        .enumerate()
        .map(|(i, item)| {
            ListItem::new(item.label()).style(row_style(i == ui_state.nav_selected, nav_focused, accent))
        })
        .collect();

    let nav = List::new(nav_items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Music ")
            .padding(Padding::horizontal(1))
            .border_style(border_style(nav_focused, accent)),
    );
    frame.render_widget(nav, chunks[0]);

    let albums_focused = ui_state.active_section == ActiveSection::Albums;
    let album_items: Vec<ListItem> = library
        .albums
        .iter()
        .enumerate()
        .map(|(i, album)| {
            let is_current = library.current_album_id.as_ref() == Some(&album.id);
            let marker = if is_current { "▶ " } else { "  " };
            let theme = album
                .theme
                .as_deref()
                .map(|t| format!(" [{}]", t))
                .unwrap_or_default();
            let style = row_style(i == ui_state.album_selected, albums_focused, accent);
            ListItem::new(format!(
                "{}{} ({}){}",
                marker,
                album.title,
                album.songs.len(),
                theme
            ))
            .style(style)
        })
        .collect();

    render_scrollable_list(
        frame,
        chunks[1],
        album_items,
        ui_state.album_selected,
        Block::default()
            .borders(Borders::ALL)
            .title(" Albums ")
            .padding(Padding::horizontal(1))
            .border_style(border_style(albums_focused, accent)),
    );
}

fn row_style(selected: bool, focused: bool, accent: Color) -> Style {
    if selected && focused {
        Style::default().fg(accent).add_modifier(Modifier::BOLD)
    } else if selected {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    }
}
