//! Keyboard input handling for the TUI.
//!
//! This module translates keyboard events into application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{App, AppState, FilterField, Focus, MAX_SEARCH_LENGTH, PAGE_SCROLL_SIZE};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    // Handle search mode
    if matches!(app.state, AppState::Searching) {
        return handle_search_input(app, key);
    }

    // Handle filter form
    if matches!(app.state, AppState::Filtering) {
        return handle_filter_input(app, key);
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Char('/') => {
            app.begin_search();
        }
        KeyCode::Char('f') => {
            app.begin_filter();
        }
        KeyCode::Char('u') => {
            app.status_message = None;
            app.refresh();
        }
        KeyCode::Char('c') => {
            app.status_message = None;
            app.clear_filters();
        }
        KeyCode::Tab => {
            app.focus = match app.focus {
                Focus::List => Focus::Detail,
                Focus::Detail => Focus::List,
            };
        }
        KeyCode::Enter => {
            app.open_detail().await;
        }
        KeyCode::Esc => {
            if matches!(app.focus, Focus::Detail) {
                app.close_detail();
            }
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.move_selection(-1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.move_selection(1);
        }
        KeyCode::PageUp => {
            app.move_selection(-(PAGE_SCROLL_SIZE as isize));
        }
        KeyCode::PageDown => {
            app.move_selection(PAGE_SCROLL_SIZE as isize);
        }
        KeyCode::Home | KeyCode::Char('g') => {
            app.select_first();
        }
        KeyCode::End | KeyCode::Char('G') => {
            app.select_last();
        }
        _ => {}
    }

    Ok(false)
}

fn handle_search_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Abandon the edit, keep whatever search was already active
            app.state = AppState::Normal;
        }
        KeyCode::Enter => {
            app.state = AppState::Normal;
            let query = app.search_input.trim().to_string();
            app.search(query);
        }
        KeyCode::Backspace => {
            app.search_input.pop();
        }
        KeyCode::Char(c) => {
            if app.search_input.len() < MAX_SEARCH_LENGTH {
                app.search_input.push(c);
            }
        }
        _ => {}
    }
    Ok(false)
}

fn handle_filter_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
        }
        KeyCode::Enter => {
            app.state = AppState::Normal;
            let filter = app.filter_form.to_filter();
            app.apply_filter(filter);
        }
        KeyCode::Tab | KeyCode::Down => {
            app.filter_form.next_field();
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.filter_form.prev_field();
        }
        KeyCode::Left => {
            app.filter_form.cycle(false);
        }
        KeyCode::Right => {
            app.filter_form.cycle(true);
        }
        KeyCode::Backspace => match app.filter_form.focus {
            FilterField::Name => {
                app.filter_form.name.pop();
            }
            FilterField::Species => {
                app.filter_form.species.pop();
            }
            _ => {}
        },
        KeyCode::Char(' ') => {
            // Space cycles the option fields, types into the text fields
            match app.filter_form.focus {
                FilterField::Status | FilterField::Gender => app.filter_form.cycle(true),
                FilterField::Name => push_limited(&mut app.filter_form.name, ' '),
                FilterField::Species => push_limited(&mut app.filter_form.species, ' '),
            }
        }
        KeyCode::Char(c) => match app.filter_form.focus {
            FilterField::Name => push_limited(&mut app.filter_form.name, c),
            FilterField::Species => push_limited(&mut app.filter_form.species, c),
            _ => {}
        },
        _ => {}
    }
    Ok(false)
}

fn push_limited(field: &mut String, c: char) {
    if field.len() < MAX_SEARCH_LENGTH {
        field.push(c);
    }
}
