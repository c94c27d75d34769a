//! Accent colour derived from a persisted hue

use ratatui::style::Color;

use super::settings::{ACCENT_HUE_KEY, SettingsSlots};

pub const DEFAULT_ACCENT_HUE: u16 = 271;
pub const MAX_ACCENT_HUE: u16 = 360;
pub const HUE_STEP: i32 = 5;

const ACCENT_SATURATION: f64 = 0.81;
const ACCENT_LIGHTNESS: f64 = 0.56;

pub async fn load_accent_hue(slots: &SettingsSlots) -> u16 {
    slots
        .get_f64(ACCENT_HUE_KEY)
        .await
        .filter(|h| h.is_finite())
        .map(|h| h.clamp(0.0, MAX_ACCENT_HUE as f64).round() as u16)
        .unwrap_or(DEFAULT_ACCENT_HUE)
}

pub async fn save_accent_hue(slots: &SettingsSlots, hue: u16) {
    if let Err(e) = slots.set(ACCENT_HUE_KEY, hue.min(MAX_ACCENT_HUE)).await {
        tracing::warn!(error = %e, "Could not persist accent hue");
    }
}

/// Move the hue by `delta` degrees, clamped to 0..=360 like the slider it replaces
pub fn adjust_hue(hue: u16, delta: i32) -> u16 {
    (hue as i32 + delta).clamp(0, MAX_ACCENT_HUE as i32) as u16
}

pub fn accent_color(hue: u16) -> Color {
    let (r, g, b) = hsl_to_rgb(hue as f64, ACCENT_SATURATION, ACCENT_LIGHTNESS);
    Color::Rgb(r, g, b)
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let h = (h % 360.0) / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let to_byte = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_byte(r), to_byte(g), to_byte(b))
}
