//! Screens, the back history, footer tabs and the pending-entry slot.
//!
//! This module owns navigation/UI state only. Deriving what a screen shows
//! (search hits, category members, the selected location) happens in
//! [`crate::model::Model`], which holds the catalog.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{InvalidLocationId, LocationId};
use crate::HISTORY_LIMIT;

/// One navigation entry point together with its arguments. Doubles as a
/// history entry: going back re-enters the stored screen verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    Home,
    SearchResults { query: String },
    SearchResultsMap { query: String },
    LocationDetail { id: LocationId },
    LocationMap { id: LocationId },
    Categories,
    Category { name: String },
    CategoryMap { name: String },
}

impl Screen {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::SearchResults { .. } => "search_results",
            Self::SearchResultsMap { .. } => "search_results_map",
            Self::LocationDetail { .. } => "location_detail",
            Self::LocationMap { .. } => "location_map",
            Self::Categories => "categories",
            Self::Category { .. } => "category",
            Self::CategoryMap { .. } => "category_map",
        }
    }

    /// Every screen but `Home` waits for the catalog before it is shown.
    #[must_use]
    pub const fn requires_catalog(&self) -> bool {
        !matches!(self, Self::Home)
    }

    #[must_use]
    pub const fn group(&self) -> ScreenGroup {
        match self {
            Self::Home
            | Self::SearchResultsMap { .. }
            | Self::LocationMap { .. }
            | Self::CategoryMap { .. } => ScreenGroup::SearchFormMap,
            Self::SearchResults { .. } => ScreenGroup::SearchFormResults,
            Self::LocationDetail { .. } => ScreenGroup::LocationDetail,
            Self::Categories => ScreenGroup::Categories,
            Self::Category { .. } => ScreenGroup::CategoryDetail,
        }
    }

    #[must_use]
    pub const fn shows_map(&self) -> bool {
        matches!(self.group(), ScreenGroup::SearchFormMap)
    }

    /// Footer tab highlighted while this screen is up. `None` leaves the
    /// previous highlight in place.
    #[must_use]
    pub const fn active_tab(&self) -> Option<FooterTab> {
        match self {
            Self::Home | Self::SearchResults { .. } => Some(FooterTab::Search),
            Self::SearchResultsMap { .. } | Self::LocationMap { .. } | Self::CategoryMap { .. } => {
                Some(FooterTab::Map)
            }
            Self::Categories | Self::Category { .. } => Some(FooterTab::Browse),
            Self::LocationDetail { .. } => None,
        }
    }

    /// Search queries lose surrounding whitespace, whichever way they came
    /// in.
    #[must_use]
    pub fn normalized(self) -> Self {
        match self {
            Self::SearchResults { query } => Self::SearchResults {
                query: query.trim().to_string(),
            },
            Self::SearchResultsMap { query } => Self::SearchResultsMap {
                query: query.trim().to_string(),
            },
            other => other,
        }
    }

    /// Parse a location id handed over by the shell (a link's data
    /// attribute, say) into a detail screen.
    pub fn location_detail(raw_id: &str) -> Result<Self, NavigationError> {
        let id = raw_id.parse::<LocationId>()?;
        Ok(Self::LocationDetail { id })
    }
}

/// Panels shown together. Exactly one group is visible at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenGroup {
    SearchFormMap,
    SearchFormResults,
    LocationDetail,
    Categories,
    CategoryDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error(transparent)]
    InvalidLocationId(#[from] InvalidLocationId),
    #[error("{action} is only available from {expected}")]
    WrongScreen {
        action: &'static str,
        expected: &'static str,
    },
}

// --- Footer ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FooterTab {
    Back,
    Search,
    Browse,
    Map,
}

impl FooterTab {
    pub const ALL: [Self; 4] = [Self::Back, Self::Search, Self::Browse, Self::Map];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FooterAction {
    Back,
    Navigate(Screen),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footer {
    active: Option<FooterTab>,
    back_enabled: bool,
    map_enabled: bool,
    search_target: Screen,
    map_target: Screen,
}

impl Default for Footer {
    fn default() -> Self {
        Self {
            active: None,
            back_enabled: false,
            map_enabled: true,
            search_target: Screen::Home,
            map_target: Screen::Home,
        }
    }
}

impl Footer {
    #[must_use]
    pub const fn active(&self) -> Option<FooterTab> {
        self.active
    }

    #[must_use]
    pub const fn is_enabled(&self, tab: FooterTab) -> bool {
        match tab {
            FooterTab::Back => self.back_enabled,
            FooterTab::Search | FooterTab::Browse => true,
            FooterTab::Map => self.map_enabled,
        }
    }

    /// What a tap on `tab` does, or `None` when the tab is disabled.
    #[must_use]
    pub fn action(&self, tab: FooterTab) -> Option<FooterAction> {
        if !self.is_enabled(tab) {
            return None;
        }
        Some(match tab {
            FooterTab::Back => FooterAction::Back,
            FooterTab::Search => FooterAction::Navigate(self.search_target.clone()),
            FooterTab::Browse => FooterAction::Navigate(Screen::Categories),
            FooterTab::Map => FooterAction::Navigate(self.map_target.clone()),
        })
    }

    /// Rebind the tabs for `screen`. `has_mappable` says whether the
    /// screen's selection has at least one location with coordinates.
    fn bind(&mut self, screen: &Screen, has_mappable: bool) {
        if let Some(tab) = screen.active_tab() {
            self.active = Some(tab);
        }
        self.search_target = Screen::Home;

        let (map_enabled, map_target) = match screen {
            Screen::Home => (true, Screen::Home),
            Screen::SearchResults { query } | Screen::SearchResultsMap { query } => (
                has_mappable,
                Screen::SearchResultsMap {
                    query: query.clone(),
                },
            ),
            Screen::LocationDetail { id } | Screen::LocationMap { id } => {
                (has_mappable, Screen::LocationMap { id: *id })
            }
            Screen::Categories => (false, Screen::Home),
            Screen::Category { name } | Screen::CategoryMap { name } => (
                has_mappable,
                Screen::CategoryMap { name: name.clone() },
            ),
        };
        self.map_enabled = map_enabled;
        self.map_target = map_target;

        if let Screen::SearchResultsMap { query } = screen {
            self.search_target = Screen::SearchResults {
                query: query.clone(),
            };
        }
    }
}

// --- History ---

/// Most recent entry first, capped at [`HISTORY_LIMIT`].
///
/// This is not an undo stack: `back` re-enters the entry one step behind the
/// current one and drops the two newest entries, so the re-entered screen
/// lands back on top when it is shown again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    entries: Vec<Screen>,
}

impl History {
    pub fn push(&mut self, screen: Screen) {
        self.entries.insert(0, screen);
        self.entries.truncate(HISTORY_LIMIT);
    }

    /// The screen to re-enter, or `None` when there is nowhere to go.
    pub fn back(&mut self) -> Option<Screen> {
        let target = self.entries.get(1)?.clone();
        self.entries.drain(..2);
        Some(target)
    }

    #[must_use]
    pub fn can_go_back(&self) -> bool {
        self.entries.len() > 1
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[Screen] {
        &self.entries
    }
}

// --- Search form ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchForm {
    pub title: String,
    pub query: String,
    pub show_title: bool,
    pub show_search: bool,
}

// --- Navigator ---

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Navigator {
    current: Option<Screen>,
    history: History,
    pending: Option<Screen>,
    footer: Footer,
    form: SearchForm,
}

impl Navigator {
    #[must_use]
    pub const fn current(&self) -> Option<&Screen> {
        self.current.as_ref()
    }

    #[must_use]
    pub const fn pending(&self) -> Option<&Screen> {
        self.pending.as_ref()
    }

    #[must_use]
    pub const fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub const fn footer(&self) -> &Footer {
        &self.footer
    }

    #[must_use]
    pub const fn form(&self) -> &SearchForm {
        &self.form
    }

    /// The footer appears with the first shown screen and stays.
    #[must_use]
    pub const fn footer_visible(&self) -> bool {
        self.current.is_some()
    }

    /// Park `screen` until the catalog is ready. The slot holds one entry;
    /// a newer request replaces an older one.
    pub fn defer(&mut self, screen: Screen) -> Option<Screen> {
        self.pending.replace(screen)
    }

    pub fn take_pending(&mut self) -> Option<Screen> {
        self.pending.take()
    }

    pub fn clear_pending(&mut self) {
        self.pending = None;
    }

    /// Make `screen` current. `record` pushes it onto the history; a
    /// re-derive of the current screen after a reload does not.
    pub fn commit(&mut self, screen: Screen, has_mappable: bool, record: bool) {
        self.pending = None;
        if record {
            self.history.push(screen.clone());
        }
        self.footer.back_enabled = self.history.can_go_back();
        self.footer.bind(&screen, has_mappable);
        self.current = Some(screen);
    }

    pub fn back(&mut self) -> Option<Screen> {
        let target = self.history.back();
        self.footer.back_enabled = self.history.can_go_back();
        target
    }

    pub fn form_mut(&mut self) -> &mut SearchForm {
        &mut self.form
    }
}
