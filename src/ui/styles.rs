use ratatui::style::{Color, Modifier, Style};

// Color palette - portal green with muted support colors
pub const PRIMARY: Color = Color::Rgb(122, 196, 76);
pub const ACCENT: Color = Color::Rgb(96, 176, 208);
pub const SUCCESS: Color = Color::Rgb(112, 176, 96);
pub const ERROR: Color = Color::Rgb(200, 80, 80);
pub const MUTED: Color = Color::Rgb(128, 128, 128);
pub const HIGHLIGHT: Color = Color::Rgb(48, 56, 48);

pub fn title_style() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default().bg(HIGHLIGHT).add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn highlight_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn success_style() -> Style {
    Style::default().fg(SUCCESS)
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR)
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(PRIMARY)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn search_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn status_bar_style() -> Style {
    Style::default().bg(Color::Rgb(32, 40, 32)).fg(Color::White)
}

pub fn help_key_style() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    Style::default().fg(Color::White)
}

/// Style for a character's life status field
pub fn status_style(status: &str) -> Style {
    match status.to_ascii_lowercase().as_str() {
        "alive" => success_style(),
        "dead" => error_style(),
        _ => muted_style(),
    }
}
