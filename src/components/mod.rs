pub mod card_grid;
pub mod detail_view;
pub mod notice_overlay;

// Re-export core Component trait
pub use tui_dispatch::Component;

pub use card_grid::{CardGrid, CardGridProps};
pub use detail_view::{DetailView, DetailViewProps};
pub use notice_overlay::{NoticeOverlay, NoticeOverlayProps};

use ratatui::style::Color;

/// Accent color for a creature type.
pub fn type_color(type_name: &str) -> Color {
    match type_name {
        "fire" => Color::Rgb(240, 128, 48),
        "water" => Color::Rgb(104, 144, 240),
        "grass" => Color::Rgb(120, 200, 80),
        "electric" => Color::Rgb(248, 208, 48),
        "ice" => Color::Rgb(152, 216, 216),
        "fighting" => Color::Rgb(192, 48, 40),
        "poison" => Color::Rgb(160, 64, 160),
        "ground" => Color::Rgb(224, 192, 104),
        "flying" => Color::Rgb(168, 144, 240),
        "psychic" => Color::Rgb(248, 88, 136),
        "bug" => Color::Rgb(168, 184, 32),
        "rock" => Color::Rgb(184, 160, 56),
        "ghost" => Color::Rgb(112, 88, 152),
        "dragon" => Color::Rgb(112, 56, 248),
        "dark" => Color::Rgb(112, 88, 72),
        "steel" => Color::Rgb(184, 184, 208),
        "fairy" => Color::Rgb(238, 153, 172),
        _ => Color::Rgb(168, 168, 120),
    }
}
