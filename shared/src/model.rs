//! Per-instance state and the navigation rules that act on it.
//!
//! [`Model`] is the one owning context of a widget instance: the catalog,
//! the match set, the search cache and the navigator all live here and are
//! passed around explicitly, so several instances can share a page and
//! tearing one down touches nothing else. The methods below are plain state
//! transitions; [`crate::app::App`] turns the returned [`Transition`] into
//! effects.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::catalog::{Catalog, CatalogResponse, Location, LocationId};
use crate::config::PortletConfig;
use crate::geo::Coordinates;
use crate::match_set::MatchSet;
use crate::navigation::{FooterAction, FooterTab, NavigationError, Navigator, Screen, SearchForm};
use crate::search::SearchCache;
use crate::{AppError, ErrorKind, InstanceId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    #[default]
    Active,
    Destroyed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadState {
    #[default]
    Idle,
    InFlight,
    Ready,
}

/// A validated [`PortletConfig`] together with its parsed data url.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveConfig {
    pub settings: PortletConfig,
    pub data_url: Url,
}

/// What the shell has to be told after a state change.
#[must_use]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transition {
    /// Start fetching the catalog from this url.
    pub fetch: Option<Url>,
    /// The visible map needs redrawing from the match set.
    pub redraw_map: bool,
    /// The requested screen is parked until the catalog arrives.
    pub deferred: bool,
}

impl Transition {
    fn none() -> Self {
        Self::default()
    }

    fn with_fetch(mut self, fetch: Option<Url>) -> Self {
        if fetch.is_some() {
            self.fetch = fetch;
        }
        self
    }
}

#[derive(Debug, Default)]
pub struct Model {
    pub instance_id: InstanceId,
    lifecycle: Lifecycle,
    config: Option<ActiveConfig>,
    load_state: LoadState,
    catalog: Option<Catalog>,
    match_set: MatchSet,
    search_cache: SearchCache,
    navigator: Navigator,
    active_error: Option<AppError>,
}

impl Model {
    // --- Accessors ---

    #[must_use]
    pub const fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Destroyed)
    }

    #[must_use]
    pub const fn config(&self) -> Option<&ActiveConfig> {
        self.config.as_ref()
    }

    #[must_use]
    pub const fn load_state(&self) -> LoadState {
        self.load_state
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self.load_state, LoadState::InFlight)
    }

    #[must_use]
    pub const fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_ref()
    }

    #[must_use]
    pub const fn match_set(&self) -> &MatchSet {
        &self.match_set
    }

    #[must_use]
    pub const fn search_cache(&self) -> &SearchCache {
        &self.search_cache
    }

    #[must_use]
    pub const fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    #[must_use]
    pub fn current_screen(&self) -> Option<&Screen> {
        self.navigator.current()
    }

    #[must_use]
    pub const fn active_error(&self) -> Option<&AppError> {
        self.active_error.as_ref()
    }

    pub fn set_error(&mut self, error: AppError) {
        self.active_error = Some(error);
    }

    pub fn dismiss_error(&mut self) {
        self.active_error = None;
    }

    /// The location a detail or single-location map screen is about.
    #[must_use]
    pub fn selected_location(&self) -> Option<&Location> {
        let id = match self.navigator.current()? {
            Screen::LocationDetail { id } | Screen::LocationMap { id } => *id,
            _ => return None,
        };
        self.catalog.as_ref()?.find_by_id(id)
    }

    // --- Lifecycle ---

    /// Accept the host configuration and show `Home`. A screen requested
    /// before this stays parked and is shown once the catalog arrives.
    pub fn configure(&mut self, settings: PortletConfig) -> Result<Transition, AppError> {
        let data_url = settings.validate()?;
        self.config = Some(ActiveConfig { settings, data_url });
        if self
            .active_error
            .as_ref()
            .is_some_and(|e| e.kind == ErrorKind::Configuration)
        {
            self.active_error = None;
        }

        let parked = self.navigator.take_pending();
        let mut transition = self.enter(Screen::Home);
        if let Some(screen) = parked {
            self.navigator.defer(screen);
            transition.deferred = true;
        }
        Ok(transition)
    }

    /// Mark the instance destroyed. Every later event is ignored, a fetch
    /// completion included.
    pub fn teardown(&mut self) {
        self.lifecycle = Lifecycle::Destroyed;
        self.navigator.clear_pending();
    }

    // --- Navigation ---

    /// Navigate to `screen`.
    ///
    /// `Home` is shown right away and drops any parked request. Every other
    /// screen needs the catalog: when it is not there yet the request is
    /// parked (replacing an earlier one) and the fetch is started unless one
    /// is already running.
    pub fn enter(&mut self, screen: Screen) -> Transition {
        let screen = screen.normalized();
        if !screen.requires_catalog() {
            self.navigator.clear_pending();
            let fetch = self.ensure_loading();
            return self.show(screen, true).with_fetch(fetch);
        }

        if self.catalog.is_none() {
            self.navigator.defer(screen);
            let fetch = self.ensure_loading();
            return Transition {
                fetch,
                deferred: true,
                ..Transition::none()
            };
        }

        self.show(screen, true)
    }

    /// Go back one visible step. A no-op when there is nothing to go back to.
    pub fn back(&mut self) -> Transition {
        match self.navigator.back() {
            Some(target) => self.enter(target),
            None => Transition::none(),
        }
    }

    /// Act on a footer tap. Disabled tabs yield `None`.
    pub fn footer_tapped(&mut self, tab: FooterTab) -> Option<Transition> {
        let transition = match self.navigator.footer().action(tab)? {
            FooterAction::Back => self.back(),
            FooterAction::Navigate(screen) => self.enter(screen),
        };
        Some(transition)
    }

    pub fn search_submitted(&mut self, query: &str) -> Transition {
        self.enter(Screen::SearchResults {
            query: query.to_string(),
        })
    }

    /// A location picked from a list or a map popup. The id arrives as text
    /// from the shell and is rejected when it is not a number.
    pub fn location_selected(&mut self, raw_id: &str) -> Result<Transition, NavigationError> {
        let screen = Screen::location_detail(raw_id)?;
        Ok(self.enter(screen))
    }

    /// Open the detail screen's location on the map.
    pub fn view_in_map(&mut self) -> Result<Transition, NavigationError> {
        match self.navigator.current() {
            Some(Screen::LocationDetail { id }) => {
                let id = *id;
                Ok(self.enter(Screen::LocationMap { id }))
            }
            _ => Err(NavigationError::WrongScreen {
                action: "view in map",
                expected: "location detail",
            }),
        }
    }

    pub fn category_selected(&mut self, name: &str) -> Transition {
        self.enter(Screen::Category {
            name: name.to_string(),
        })
    }

    /// Override the anchor (`None` returns to the catalog default).
    pub fn move_anchor(&mut self, anchor: Option<Coordinates>) -> Transition {
        self.match_set.set_anchor(self.catalog.as_ref(), anchor);
        Transition {
            redraw_map: self.catalog.is_some()
                && self.navigator.current().is_some_and(Screen::shows_map),
            ..Transition::none()
        }
    }

    // --- Catalog loading ---

    /// Fetch again, replacing the catalog on success.
    pub fn reload(&mut self) -> Result<Transition, AppError> {
        if self.is_loading() {
            return Ok(Transition::none());
        }
        let url = self.config.as_ref().map(|c| c.data_url.clone()).ok_or_else(not_started)?;
        self.load_state = LoadState::InFlight;
        Ok(Transition {
            fetch: Some(url),
            ..Transition::none()
        })
    }

    /// A fetch finished with a payload. The new catalog replaces the old
    /// one wholesale; then the parked screen is shown, or else the current
    /// one is re-derived without a history entry.
    pub fn catalog_loaded(&mut self, response: CatalogResponse) -> Result<Transition, AppError> {
        let catalog = match Catalog::parse(response) {
            Ok(catalog) => catalog,
            Err(e) => {
                let error = AppError::from(e);
                self.catalog_failed(error.clone());
                return Err(error);
            }
        };

        self.catalog = Some(catalog);
        self.load_state = LoadState::Ready;
        self.search_cache.clear();
        if self
            .active_error
            .as_ref()
            .is_some_and(|e| e.kind == ErrorKind::DataLoad)
        {
            self.active_error = None;
        }

        if let Some(screen) = self.navigator.take_pending() {
            return Ok(self.show(screen, true));
        }
        match self.navigator.current().cloned() {
            Some(screen) => Ok(self.show(screen, false)),
            None => Ok(Transition::none()),
        }
    }

    /// A fetch failed. The previous catalog, if any, stays in place and a
    /// parked screen stays parked. Nothing is retried automatically.
    pub fn catalog_failed(&mut self, error: AppError) {
        self.load_state = if self.catalog.is_some() {
            LoadState::Ready
        } else {
            LoadState::Idle
        };
        self.active_error = Some(error);
    }

    fn ensure_loading(&mut self) -> Option<Url> {
        if self.catalog.is_some() || self.is_loading() {
            return None;
        }
        match &self.config {
            Some(config) => {
                self.load_state = LoadState::InFlight;
                Some(config.data_url.clone())
            }
            None => {
                self.active_error = Some(not_started());
                None
            }
        }
    }

    // --- Screen derivation ---

    /// Derive `screen` from the catalog and make it current. `record` is
    /// false when the current screen is only re-derived after a load.
    fn show(&mut self, screen: Screen, record: bool) -> Transition {
        // Entering Home measures from the catalog's default location again.
        if record && matches!(screen, Screen::Home) {
            self.match_set.set_anchor(self.catalog.as_ref(), None);
        }
        // A missing location only concerns the screen that asked for it.
        if self
            .active_error
            .as_ref()
            .is_some_and(|e| e.kind == ErrorKind::NotFound)
        {
            self.active_error = None;
        }

        if let Some(catalog) = self.catalog.as_ref() {
            // The category list leaves the previous selection in place.
            let members: Option<Vec<LocationId>> = match &screen {
                Screen::Home => Some(Vec::new()),
                Screen::SearchResults { query } | Screen::SearchResultsMap { query } => {
                    if query.is_empty() {
                        Some(Vec::new())
                    } else {
                        Some(self.search_cache.search(catalog, query))
                    }
                }
                Screen::LocationDetail { id } | Screen::LocationMap { id } => {
                    let found = catalog.find_by_id(*id).map(Location::id);
                    if found.is_none() {
                        self.active_error = Some(
                            AppError::new(ErrorKind::NotFound, format!("no location with id {id}"))
                                .with_context("id", id.to_string()),
                        );
                    }
                    Some(found.into_iter().collect())
                }
                Screen::Categories => None,
                Screen::Category { name } | Screen::CategoryMap { name } => {
                    Some(catalog.categories().members(name).to_vec())
                }
            };
            if let Some(members) = members {
                self.match_set.reset(catalog, members, None);
            }
        }

        let form = self.search_form(&screen);
        *self.navigator.form_mut() = form;

        let has_mappable = self.match_set.has_mappable();
        let redraw_map = screen.shows_map() && self.catalog.is_some();
        self.navigator.commit(screen, has_mappable, record);

        Transition {
            redraw_map,
            ..Transition::none()
        }
    }

    fn search_form(&self, screen: &Screen) -> SearchForm {
        match screen {
            Screen::Home => SearchForm {
                show_search: true,
                ..SearchForm::default()
            },
            Screen::SearchResults { query } | Screen::SearchResultsMap { query } => SearchForm {
                title: query.clone(),
                query: query.clone(),
                show_title: true,
                show_search: true,
            },
            Screen::LocationMap { id } => SearchForm {
                title: self
                    .catalog
                    .as_ref()
                    .and_then(|c| c.find_by_id(*id))
                    .map(|l| l.name().to_string())
                    .unwrap_or_default(),
                show_title: true,
                ..SearchForm::default()
            },
            Screen::CategoryMap { name } => SearchForm {
                title: name.clone(),
                show_title: true,
                ..SearchForm::default()
            },
            Screen::LocationDetail { .. } | Screen::Categories | Screen::Category { .. } => {
                self.navigator.form().clone()
            }
        }
    }
}

fn not_started() -> AppError {
    AppError::new(
        ErrorKind::Configuration,
        "The location map has not been configured yet.",
    )
}
