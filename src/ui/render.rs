use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::{App, AppState, FilterField, Focus};
use crate::models::Character;
use crate::utils::{format_date, truncate};

use super::styles;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_main_content(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    // Render overlays
    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }

    if matches!(app.state, AppState::Filtering) {
        render_filter_overlay(frame, app);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  Mortydex";
    let help_hint = "[?] Help";

    let mode = app.mode_label();
    let left_width = title.len() + 3 + mode.len();

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" - "),
        Span::styled(mode, styles::highlight_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(left_width + help_hint.len() + 4),
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_character_table(frame, app, chunks[0]);
    render_character_detail(frame, app, chunks[1]);
}

fn render_character_table(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::List);

    let header = Row::new([
        Cell::from(" "),
        Cell::from("Name"),
        Cell::from("Species"),
        Cell::from("Last known location"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = app
        .characters
        .iter()
        .map(|character| {
            Row::new(vec![
                Cell::from(Span::styled(
                    character.status_glyph(),
                    styles::status_style(&character.status),
                )),
                Cell::from(character.name.clone()),
                Cell::from(character.species.clone()),
                Cell::from(truncate(&character.location.name, 28)),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Length(1),
        Constraint::Percentage(38),
        Constraint::Fill(1),
        Constraint::Fill(2),
    ];

    // The block title doubles as the search input line while typing
    let title = if matches!(app.state, AppState::Searching) {
        format!(" Search: {}▌ ", app.search_input)
    } else if app.is_loading {
        format!(" Characters ({}) - loading... ", app.characters.len())
    } else if app.is_refreshing {
        format!(" Characters ({}) - refreshing... ", app.characters.len())
    } else {
        format!(" Characters ({}) ", app.characters.len())
    };
    let title_style = if matches!(app.state, AppState::Searching) {
        styles::search_style()
    } else {
        styles::muted_style()
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(title_style)
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !app.characters.is_empty() {
        state.select(Some(app.selection));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_character_detail(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::Detail);

    // The fetched detail record wins over the row summary
    let character = app
        .detail
        .as_ref()
        .or_else(|| app.characters.get(app.selection));

    let content = match character {
        Some(character) => detail_lines(character, app.detail.is_some()),
        None => vec![Line::from(Span::styled(
            "No character selected",
            styles::muted_style(),
        ))],
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    frame.render_widget(Paragraph::new(content).block(block), area);
}

fn detail_lines(character: &Character, full: bool) -> Vec<Line<'static>> {
    let placeholder = "-";
    let mut lines = vec![];

    lines.push(Line::from(Span::styled(
        character.name.clone(),
        styles::title_style(),
    )));
    lines.push(Line::from(vec![
        Span::styled(
            format!("{} {}", character.status_glyph(), character.status),
            styles::status_style(&character.status),
        ),
        Span::styled(format!("  #{}", character.id), styles::muted_style()),
    ]));
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled("Profile", styles::highlight_style())));
    lines.push(Line::from(vec![
        Span::styled("Species:  ", styles::muted_style()),
        Span::raw(character.species_display()),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Gender:   ", styles::muted_style()),
        Span::raw(character.gender.clone()),
    ]));
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled("Worlds", styles::highlight_style())));
    lines.push(Line::from(vec![
        Span::styled("Origin:   ", styles::muted_style()),
        Span::raw(character.origin.name.clone()),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Location: ", styles::muted_style()),
        Span::raw(character.location.name.clone()),
    ]));
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(
        "Appearances",
        styles::highlight_style(),
    )));
    lines.push(Line::from(vec![
        Span::styled("Episodes: ", styles::muted_style()),
        Span::raw(character.episode_count().to_string()),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Added:    ", styles::muted_style()),
        Span::raw(format_date(&character.created)),
    ]));

    // The full record (opened with Enter) also shows the reference URLs
    if full {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Links", styles::highlight_style())));

        let origin_url = if character.origin.is_known() {
            character.origin.url.clone()
        } else {
            placeholder.to_string()
        };
        lines.push(Line::from(vec![
            Span::styled("Origin:   ", styles::muted_style()),
            Span::styled(truncate(&origin_url, 40), styles::muted_style()),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Portrait: ", styles::muted_style()),
            Span::styled(truncate(&character.image, 40), styles::muted_style()),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Record:   ", styles::muted_style()),
            Span::styled(truncate(&character.url, 40), styles::muted_style()),
        ]));
    }

    lines
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[/] search | [f]ilter | [u]pdate | [c]lear | [q]uit";

    let (left_text, left_style) = if let Some(ref error) = app.error {
        (format!(" {} ", error), styles::error_style())
    } else if let Some(ref msg) = app.status_message {
        (format!(" {} ", msg), styles::muted_style())
    } else {
        let end = if app.is_last_page() { " (end)" } else { "" };
        (
            format!(" Page {}{} ", app.current_page(), end),
            styles::muted_style(),
        )
    };

    let right_text = format!(" {} ", shortcuts);
    let padding = (area.width as usize)
        .saturating_sub(left_text.len())
        .saturating_sub(right_text.len());

    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding)),
        Span::styled(right_text, styles::muted_style()),
    ]);

    frame.render_widget(
        Paragraph::new(status_line).style(styles::status_bar_style()),
        area,
    );
}

fn render_filter_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(46, 13, frame.area());
    frame.render_widget(Clear, area);

    let form = &app.filter_form;

    let text_field = |label: &str, value: &str, focused: bool| {
        let style = if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        let cursor = if focused { "▌" } else { "" };
        Line::from(vec![
            Span::raw("   "),
            Span::styled(format!("{:<9}", label), styles::muted_style()),
            Span::styled("[", styles::muted_style()),
            Span::styled(format!("{:<22}", format!("{}{}", value, cursor)), style),
            Span::styled("]", styles::muted_style()),
        ])
    };

    let cycle_field = |label: &str, value: &str, focused: bool| {
        let style = if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        let display = if value.is_empty() { "any" } else { value };
        Line::from(vec![
            Span::raw("   "),
            Span::styled(format!("{:<9}", label), styles::muted_style()),
            Span::styled("< ", styles::muted_style()),
            Span::styled(format!("{:<20}", display), style),
            Span::styled(" >", styles::muted_style()),
        ])
    };

    let lines = vec![
        Line::from(Span::styled("   Filter characters", styles::title_style())),
        Line::from(""),
        text_field("Name:", &form.name, form.focus == FilterField::Name),
        Line::from(""),
        cycle_field("Status:", form.status(), form.focus == FilterField::Status),
        Line::from(""),
        text_field("Species:", &form.species, form.focus == FilterField::Species),
        Line::from(""),
        cycle_field("Gender:", form.gender(), form.focus == FilterField::Gender),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Tab", styles::help_key_style()),
            Span::styled(" next  ", styles::muted_style()),
            Span::styled("←/→", styles::help_key_style()),
            Span::styled(" cycle  ", styles::muted_style()),
            Span::styled("Enter", styles::help_key_style()),
            Span::styled(" apply  ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 20, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let key = |k: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", k), styles::help_key_style()),
            Span::styled(desc, styles::help_desc_style()),
        ])
    };

    let help_text = vec![
        Line::from(Span::styled("   M O R T Y D E X", styles::title_style())),
        Line::from(Span::styled(
            format!("   version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        key("↑/↓ j/k", "Move selection"),
        key("PgUp/PgDn", "Scroll a screenful"),
        key("g/G", "Jump to first/last"),
        key("Enter", "Open character record"),
        key("Tab", "Switch focus (list ↔ detail)"),
        key("Esc", "Close record / go back"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        key("/", "Search by name"),
        key("f", "Filter (status, species, gender)"),
        key("c", "Clear search and filters"),
        key("u", "Update from the API"),
        key("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled("   M O R T Y D E X", styles::title_style())),
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
