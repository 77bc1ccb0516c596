//! Application state management for Mortydex.
//!
//! This module contains the `App` struct that holds all per-screen state:
//! the character list with its pagination counters, the active
//! search/filter criteria, the in-flight fetch handle, and the TUI state
//! (overlays, focus, selection).
//!
//! One fetch runs at a time. Starting a new one replaces the previous
//! `FetchStream`, which aborts its producer task - a superseded response
//! is never applied to the list.

use std::path::PathBuf;

use anyhow::Result;
use tracing::warn;

use crate::api::ApiClient;
use crate::cache::CharacterStore;
use crate::config::Config;
use crate::models::{Character, CharacterFilter};
use crate::repo::{CharacterRepository, FetchPoll, FetchStream, Resource, PAGE_SIZE};

// ============================================================================
// Constants
// ============================================================================

/// Number of rows to scroll on page up/down
pub const PAGE_SCROLL_SIZE: usize = 10;

/// Start fetching the next page when the selection gets this close to the end
const LOAD_MORE_THRESHOLD: usize = 5;

/// Maximum length for the search input
pub const MAX_SEARCH_LENGTH: usize = 50;

/// Shown when a search matches nothing
pub const MSG_NOT_FOUND: &str = "No characters found";

/// Shown when a filter matches nothing
pub const MSG_NO_FILTER_MATCHES: &str = "No characters match the current filters";

/// Cycling options for the filter form's exact-match fields
pub const STATUS_OPTIONS: [&str; 4] = ["", "alive", "dead", "unknown"];
pub const GENDER_OPTIONS: [&str; 5] = ["", "female", "male", "genderless", "unknown"];

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    Filtering,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Current UI focus area (list panel or detail panel)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Detail,
}

/// Filter form field focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Name,
    Status,
    Species,
    Gender,
}

/// State of the filter form overlay. Name and species are typed,
/// status and gender cycle through the fixed option lists.
#[derive(Debug, Clone)]
pub struct FilterForm {
    pub name: String,
    pub species: String,
    pub status_index: usize,
    pub gender_index: usize,
    pub focus: FilterField,
}

impl Default for FilterForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            species: String::new(),
            status_index: 0,
            gender_index: 0,
            focus: FilterField::Name,
        }
    }
}

impl FilterForm {
    pub fn from_filter(filter: &CharacterFilter) -> Self {
        let index_of = |options: &[&str], value: &Option<String>| {
            value
                .as_deref()
                .and_then(|v| options.iter().position(|o| *o == v))
                .unwrap_or(0)
        };

        Self {
            name: filter.name.clone().unwrap_or_default(),
            species: filter.species.clone().unwrap_or_default(),
            status_index: index_of(&STATUS_OPTIONS, &filter.status),
            gender_index: index_of(&GENDER_OPTIONS, &filter.gender),
            focus: FilterField::Name,
        }
    }

    pub fn to_filter(&self) -> CharacterFilter {
        let non_empty = |s: &str| {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };

        CharacterFilter {
            name: non_empty(&self.name),
            status: non_empty(self.status()),
            species: non_empty(&self.species),
            gender: non_empty(self.gender()),
        }
    }

    pub fn status(&self) -> &'static str {
        STATUS_OPTIONS[self.status_index]
    }

    pub fn gender(&self) -> &'static str {
        GENDER_OPTIONS[self.gender_index]
    }

    pub fn next_field(&mut self) {
        self.focus = match self.focus {
            FilterField::Name => FilterField::Status,
            FilterField::Status => FilterField::Species,
            FilterField::Species => FilterField::Gender,
            FilterField::Gender => FilterField::Name,
        };
    }

    pub fn prev_field(&mut self) {
        self.focus = match self.focus {
            FilterField::Name => FilterField::Gender,
            FilterField::Status => FilterField::Name,
            FilterField::Species => FilterField::Status,
            FilterField::Gender => FilterField::Species,
        };
    }

    /// Advance the focused cycling field; no-op for typed fields
    pub fn cycle(&mut self, forward: bool) {
        let step = |index: usize, len: usize| {
            if forward {
                (index + 1) % len
            } else {
                (index + len - 1) % len
            }
        };
        match self.focus {
            FilterField::Status => self.status_index = step(self.status_index, STATUS_OPTIONS.len()),
            FilterField::Gender => self.gender_index = step(self.gender_index, GENDER_OPTIONS.len()),
            FilterField::Name | FilterField::Species => {}
        }
    }
}

// ============================================================================
// Fetch Routing
// ============================================================================

/// Which loader an in-flight fetch went through. Search wins over filter
/// when both criteria are set; plain is the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchMode {
    Plain,
    Search,
    Filter,
}

/// The one in-flight fetch for this screen
struct ActiveFetch {
    stream: FetchStream,
    mode: FetchMode,
    page: u32,
    /// First-page fetches replace the list; pagination appends
    replace: bool,
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    repo: CharacterRepository,

    // TUI state
    pub state: AppState,
    pub focus: Focus,
    pub selection: usize,
    pub detail: Option<Character>,
    pub search_input: String,
    pub filter_form: FilterForm,
    pub status_message: Option<String>,

    // Observable list state
    pub characters: Vec<Character>,
    pub is_loading: bool,
    pub is_refreshing: bool,
    pub error: Option<String>,

    // Pagination bookkeeping
    current_page: u32,
    is_last_page: bool,
    is_loading_more: bool,

    // Active criteria
    current_search: Option<String>,
    current_filter: Option<CharacterFilter>,

    current_fetch: Option<ActiveFetch>,
}

impl App {
    /// Create the application: load config, open the cache, wire the repository
    pub async fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let cache_dir = config
            .cache_dir()
            .unwrap_or_else(|_| PathBuf::from("./cache"));
        let store = CharacterStore::open(&cache_dir).await?;

        let api = match config.api_base_url {
            Some(ref url) => ApiClient::with_base_url(url)?,
            None => ApiClient::new()?,
        };

        let repo = CharacterRepository::new(api, store);
        Ok(Self::from_parts(repo))
    }

    pub(crate) fn from_parts(repo: CharacterRepository) -> Self {
        Self {
            repo,

            state: AppState::Normal,
            focus: Focus::List,
            selection: 0,
            detail: None,
            search_input: String::new(),
            filter_form: FilterForm::default(),
            status_message: None,

            characters: Vec::new(),
            is_loading: false,
            is_refreshing: false,
            error: None,

            current_page: 1,
            is_last_page: false,
            is_loading_more: false,

            current_search: None,
            current_filter: None,

            current_fetch: None,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn is_last_page(&self) -> bool {
        self.is_last_page
    }

    pub fn search_active(&self) -> bool {
        self.current_search.as_deref().is_some_and(|q| !q.is_empty())
    }

    pub fn filter_active(&self) -> bool {
        self.current_filter.is_some()
    }

    /// Status bar label for the active browsing mode
    pub fn mode_label(&self) -> String {
        if let Some(ref query) = self.current_search {
            if !query.is_empty() {
                return format!("Search \"{}\"", query);
            }
        }
        if let Some(ref filter) = self.current_filter {
            return format!("Filter {}", filter.summary());
        }
        "All characters".to_string()
    }

    // =========================================================================
    // Fetch Lifecycle
    // =========================================================================

    /// Load the current plain page (first load, refresh, plain pagination)
    pub fn load_characters(&mut self, force_refresh: bool) {
        if force_refresh {
            self.current_page = 1;
            self.is_last_page = false;
        }
        let page = self.current_page;
        self.start_fetch(FetchMode::Plain, page, page == 1, force_refresh);
    }

    /// Load the next page in whichever mode is active.
    /// No-op while a pagination fetch is running or after the last page.
    pub fn load_next_page(&mut self) {
        if self.is_loading_more || self.is_last_page || self.characters.is_empty() {
            return;
        }

        self.is_loading_more = true;
        self.current_page += 1;
        let page = self.current_page;

        if self.search_active() {
            self.start_fetch(FetchMode::Search, page, false, false);
        } else if self.filter_active() {
            self.start_fetch(FetchMode::Filter, page, false, false);
        } else {
            self.start_fetch(FetchMode::Plain, page, false, false);
        }
    }

    /// Re-issue the active mode from page 1, preserving its criteria
    pub fn refresh(&mut self) {
        self.is_refreshing = true;
        self.current_page = 1;
        self.is_last_page = false;

        if let Some(query) = self.current_search.clone().filter(|q| !q.is_empty()) {
            self.search(query);
        } else if let Some(filter) = self.current_filter.clone() {
            self.apply_filter(filter);
        } else {
            self.load_characters(true);
        }
    }

    /// Server-side name search. An empty query drops back to plain browsing.
    pub fn search(&mut self, query: String) {
        self.current_page = 1;
        self.is_last_page = false;

        if query.is_empty() {
            self.current_search = None;
            self.load_characters(true);
            return;
        }

        self.current_search = Some(query);
        self.start_fetch(FetchMode::Search, 1, true, false);
    }

    /// Apply filter criteria, replacing the list wholesale.
    /// An empty filter clears instead.
    pub fn apply_filter(&mut self, filter: CharacterFilter) {
        if filter.is_empty() {
            self.clear_filters();
            return;
        }

        self.current_filter = Some(filter);
        self.current_page = 1;
        self.is_last_page = false;
        self.start_fetch(FetchMode::Filter, 1, true, false);
    }

    /// Drop filter and search criteria and reload plain page 1
    pub fn clear_filters(&mut self) {
        self.current_filter = None;
        self.current_search = None;
        self.load_characters(true);
    }

    fn start_fetch(&mut self, mode: FetchMode, page: u32, replace: bool, force_refresh: bool) {
        let stream = match mode {
            FetchMode::Plain => self.repo.fetch_page(page, force_refresh),
            FetchMode::Search => {
                let query = self.current_search.clone().unwrap_or_default();
                self.repo.filter_page(CharacterFilter::by_name(query), page)
            }
            FetchMode::Filter => {
                let filter = self.current_filter.clone().unwrap_or_default();
                self.repo.filter_page(filter, page)
            }
        };

        // Replacing the previous fetch aborts its producer: latest wins
        self.current_fetch = Some(ActiveFetch {
            stream,
            mode,
            page,
            replace,
        });
    }

    /// Drain any emissions from the in-flight fetch. Called from the
    /// event loop between input polls.
    pub fn poll_fetch(&mut self) {
        loop {
            let poll = match self.current_fetch.as_mut() {
                Some(active) => active.stream.poll(),
                None => return,
            };
            match poll {
                FetchPoll::Item(resource) => self.apply_emission(resource),
                FetchPoll::Pending => return,
                FetchPoll::Closed => {
                    self.current_fetch = None;
                    return;
                }
            }
        }
    }

    fn apply_emission(&mut self, resource: Resource<Vec<Character>>) {
        let Some(active) = self.current_fetch.as_ref() else {
            return;
        };
        let (mode, page, replace) = (active.mode, active.page, active.replace);

        match resource {
            Resource::Loading => {
                if replace {
                    self.is_loading = true;
                }
                self.error = None;
            }
            Resource::Success(list) => {
                self.is_loading = false;
                self.is_refreshing = false;
                self.is_loading_more = false;

                let fetched = list.len();
                if replace {
                    self.characters = list;
                    self.selection = 0;
                } else {
                    // A cached emission followed by the network result would
                    // append the same page twice; drop ids already present
                    let existing: std::collections::HashSet<i64> =
                        self.characters.iter().map(|c| c.id).collect();
                    self.characters
                        .extend(list.into_iter().filter(|c| !existing.contains(&c.id)));
                }

                if replace && fetched == 0 && mode != FetchMode::Plain {
                    self.error = Some(
                        match mode {
                            FetchMode::Search => MSG_NOT_FOUND,
                            _ => MSG_NO_FILTER_MATCHES,
                        }
                        .to_string(),
                    );
                } else {
                    self.error = None;
                }

                if fetched == 0 || fetched < PAGE_SIZE {
                    self.is_last_page = true;
                }

                self.clamp_selection();
            }
            Resource::Error(message) => {
                self.is_loading = false;
                self.is_refreshing = false;
                self.is_loading_more = false;
                self.error = Some(message);

                // Roll the counter back so a retry repeats the same page
                if !replace {
                    self.current_page = page.saturating_sub(1).max(1);
                }
            }
        }
    }

    // =========================================================================
    // Overlay Entry Points
    // =========================================================================

    /// Enter search mode, seeding the input with the active query
    pub fn begin_search(&mut self) {
        self.search_input = self.current_search.clone().unwrap_or_default();
        self.state = AppState::Searching;
    }

    /// Enter the filter form, seeded from the active criteria
    pub fn begin_filter(&mut self) {
        self.filter_form = self
            .current_filter
            .as_ref()
            .map(FilterForm::from_filter)
            .unwrap_or_default();
        self.state = AppState::Filtering;
    }

    // =========================================================================
    // Detail View
    // =========================================================================

    /// Open the detail panel for the selected character (cache-first lookup)
    pub async fn open_detail(&mut self) {
        let Some(id) = self.characters.get(self.selection).map(|c| c.id) else {
            return;
        };

        match self.repo.fetch_by_id(id).await {
            Some(character) => {
                self.detail = Some(character);
                self.focus = Focus::Detail;
            }
            None => {
                self.status_message = Some("Character unavailable".to_string());
            }
        }
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
        self.focus = Focus::List;
    }

    // =========================================================================
    // List Navigation
    // =========================================================================

    pub fn move_selection(&mut self, delta: isize) {
        if self.characters.is_empty() {
            self.selection = 0;
            return;
        }

        let max = (self.characters.len() - 1) as isize;
        self.selection = (self.selection as isize + delta).clamp(0, max) as usize;

        if self.detail.is_some() {
            self.close_detail();
        }
        self.maybe_load_next_page();
    }

    pub fn select_first(&mut self) {
        self.selection = 0;
        if self.detail.is_some() {
            self.close_detail();
        }
    }

    pub fn select_last(&mut self) {
        self.selection = self.characters.len().saturating_sub(1);
        if self.detail.is_some() {
            self.close_detail();
        }
        self.maybe_load_next_page();
    }

    fn maybe_load_next_page(&mut self) {
        if self.selection + LOAD_MORE_THRESHOLD >= self.characters.len() {
            self.load_next_page();
        }
    }

    fn clamp_selection(&mut self) {
        if self.characters.is_empty() {
            self.selection = 0;
        } else if self.selection >= self.characters.len() {
            self.selection = self.characters.len() - 1;
        }
    }

    // =========================================================================
    // Test Support
    // =========================================================================

    /// Apply emissions from the in-flight fetch until it completes
    #[cfg(test)]
    pub(crate) async fn settle(&mut self) {
        loop {
            let next = match self.current_fetch.as_mut() {
                Some(active) => active.stream.next().await,
                None => return,
            };
            match next {
                Some(resource) => self.apply_emission(resource),
                None => {
                    self.current_fetch = None;
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LocationRef;

    async fn offline_app() -> App {
        let api = ApiClient::with_base_url("http://127.0.0.1:9").unwrap();
        let store = CharacterStore::open_in_memory().await.unwrap();
        App::from_parts(CharacterRepository::new(api, store))
    }

    fn character(id: i64, name: &str) -> Character {
        Character {
            id,
            name: name.to_string(),
            status: "Alive".to_string(),
            species: "Human".to_string(),
            kind: String::new(),
            gender: "Male".to_string(),
            origin: LocationRef::unknown(),
            location: LocationRef::unknown(),
            image: String::new(),
            episode: Vec::new(),
            url: String::new(),
            created: "2017-11-04T18:48:46.250Z".to_string(),
        }
    }

    fn page_of(count: usize, start_id: i64) -> Vec<Character> {
        (0..count as i64)
            .map(|i| character(start_id + i, &format!("Character {}", start_id + i)))
            .collect()
    }

    async fn seed(app: &App, rows: &[Character], page: u32) {
        app.repo.store().upsert_page(rows, page).await.unwrap();
    }

    #[tokio::test]
    async fn test_offline_with_empty_cache_surfaces_error() {
        let mut app = offline_app().await;
        app.load_characters(false);
        app.settle().await;

        assert!(app.characters.is_empty());
        assert_eq!(app.error.as_deref(), Some(crate::repo::MSG_NO_CONNECTION));
        assert!(!app.is_loading);
    }

    #[tokio::test]
    async fn test_offline_with_cached_page_shows_cache() {
        let mut app = offline_app().await;
        seed(&app, &page_of(20, 1), 1).await;

        app.load_characters(false);
        app.settle().await;

        assert_eq!(app.characters.len(), 20);
        assert_eq!(app.error, None);
        assert!(!app.is_last_page());
        assert_eq!(app.current_page(), 1);
    }

    #[tokio::test]
    async fn test_short_page_sets_last_page_flag() {
        let mut app = offline_app().await;
        seed(&app, &page_of(12, 1), 1).await;

        app.load_characters(false);
        app.settle().await;

        assert_eq!(app.characters.len(), 12);
        assert!(app.is_last_page());

        // Further pagination is a no-op
        app.load_next_page();
        assert_eq!(app.current_page(), 1);
        assert!(app.current_fetch.is_none());
    }

    #[tokio::test]
    async fn test_failed_next_page_rolls_the_counter_back() {
        let mut app = offline_app().await;
        seed(&app, &page_of(20, 1), 1).await;

        app.load_characters(false);
        app.settle().await;

        app.load_next_page();
        assert_eq!(app.current_page(), 2);
        app.settle().await;

        // Nothing cached for page 2 and the network is down
        assert_eq!(app.current_page(), 1);
        assert!(app.error.is_some());
        assert_eq!(app.characters.len(), 20);
        assert!(!app.is_loading_more);
    }

    #[tokio::test]
    async fn test_next_page_appends_cached_rows() {
        let mut app = offline_app().await;
        seed(&app, &page_of(20, 1), 1).await;
        seed(&app, &page_of(7, 21), 2).await;

        app.load_characters(false);
        app.settle().await;
        app.load_next_page();
        app.settle().await;

        assert_eq!(app.characters.len(), 27);
        assert_eq!(app.current_page(), 2);
        assert!(app.is_last_page());
        assert_eq!(app.error, None);
    }

    #[tokio::test]
    async fn test_search_falls_back_to_cache() {
        let mut app = offline_app().await;
        let mut rows = page_of(5, 1);
        rows[2].name = "Summer Smith".to_string();
        seed(&app, &rows, 1).await;

        app.search("summer".to_string());
        app.settle().await;

        assert!(app.search_active());
        assert_eq!(app.characters.len(), 1);
        assert_eq!(app.characters[0].name, "Summer Smith");
        assert_eq!(app.error, None);
    }

    #[tokio::test]
    async fn test_search_with_no_matches_reports_not_found() {
        let mut app = offline_app().await;
        seed(&app, &page_of(5, 1), 1).await;

        app.search("birdperson".to_string());
        app.settle().await;

        assert!(app.characters.is_empty());
        assert_eq!(app.error.as_deref(), Some(MSG_NOT_FOUND));
        assert!(app.is_last_page());
    }

    #[tokio::test]
    async fn test_empty_search_clears_back_to_plain_browsing() {
        let mut app = offline_app().await;
        seed(&app, &page_of(5, 1), 1).await;

        app.search("summer".to_string());
        app.settle().await;
        app.search(String::new());
        app.settle().await;

        assert!(!app.search_active());
        assert_eq!(app.characters.len(), 5);
    }

    #[tokio::test]
    async fn test_filter_replaces_list_and_matches_cache() {
        let mut app = offline_app().await;
        let mut rows = page_of(6, 1);
        rows[0].gender = "Female".to_string();
        rows[4].gender = "Female".to_string();
        seed(&app, &rows, 1).await;

        app.apply_filter(CharacterFilter {
            gender: Some("Female".to_string()),
            ..Default::default()
        });
        app.settle().await;

        assert!(app.filter_active());
        assert_eq!(app.characters.len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_preserves_active_filter() {
        let mut app = offline_app().await;
        let mut rows = page_of(6, 1);
        rows[1].status = "Dead".to_string();
        seed(&app, &rows, 1).await;

        app.apply_filter(CharacterFilter {
            status: Some("Dead".to_string()),
            ..Default::default()
        });
        app.settle().await;
        assert_eq!(app.characters.len(), 1);

        app.refresh();
        assert!(app.is_refreshing);
        app.settle().await;

        assert!(app.filter_active());
        assert_eq!(app.characters.len(), 1);
        assert_eq!(app.current_page(), 1);
        assert!(!app.is_refreshing);
    }

    #[tokio::test]
    async fn test_new_fetch_supersedes_previous_one() {
        let mut app = offline_app().await;
        let mut rows = page_of(20, 1);
        rows[0].name = "Summer Smith".to_string();
        seed(&app, &rows, 1).await;

        // The plain fetch is replaced before its emissions are drained
        app.load_characters(false);
        app.search("summer".to_string());
        app.settle().await;

        assert_eq!(app.characters.len(), 1);
        assert_eq!(app.characters[0].name, "Summer Smith");
    }

    #[tokio::test]
    async fn test_clear_filters_drops_both_criteria() {
        let mut app = offline_app().await;
        seed(&app, &page_of(5, 1), 1).await;

        app.search("character".to_string());
        app.settle().await;
        app.apply_filter(CharacterFilter {
            status: Some("Alive".to_string()),
            ..Default::default()
        });
        app.settle().await;

        app.clear_filters();
        app.settle().await;

        assert!(!app.search_active());
        assert!(!app.filter_active());
        assert_eq!(app.mode_label(), "All characters");
        assert_eq!(app.characters.len(), 5);
    }

    #[tokio::test]
    async fn test_open_detail_uses_cache_when_offline() {
        let mut app = offline_app().await;
        seed(&app, &page_of(5, 1), 1).await;

        app.load_characters(false);
        app.settle().await;
        app.move_selection(2);
        app.open_detail().await;

        assert_eq!(app.focus, Focus::Detail);
        assert_eq!(app.detail.as_ref().unwrap().id, 3);

        app.close_detail();
        assert_eq!(app.focus, Focus::List);
        assert!(app.detail.is_none());
    }

    #[test]
    fn test_filter_form_round_trip() {
        let filter = CharacterFilter {
            name: Some("rick".to_string()),
            status: Some("alive".to_string()),
            species: None,
            gender: Some("male".to_string()),
        };

        let form = FilterForm::from_filter(&filter);
        assert_eq!(form.status(), "alive");
        assert_eq!(form.gender(), "male");
        assert_eq!(form.to_filter(), filter);
    }

    #[test]
    fn test_filter_form_cycle_wraps() {
        let mut form = FilterForm::default();
        form.focus = FilterField::Status;
        for _ in 0..STATUS_OPTIONS.len() {
            form.cycle(true);
        }
        assert_eq!(form.status(), "");

        form.cycle(false);
        assert_eq!(form.status(), "unknown");

        // Typed fields are unaffected by cycling
        form.focus = FilterField::Name;
        form.name = "rick".to_string();
        form.cycle(true);
        assert_eq!(form.name, "rick");
    }
}
