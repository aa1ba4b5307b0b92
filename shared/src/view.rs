//! What the shell renders. Everything here is derived from [`Model`] on
//! demand and never stored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Location, LocationId};
use crate::geo::format_distance;
use crate::model::Model;
use crate::navigation::{FooterTab, Screen, ScreenGroup, SearchForm};
use crate::AppError;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UserFacingError {
    pub message: String,
    pub is_transient: bool,
    pub is_retryable: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            is_transient: matches!(e.severity, crate::ErrorSeverity::Transient),
            is_retryable: e.is_retryable(),
            error_code: e.code().to_string(),
        }
    }
}

/// One row of a result or category member list.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LocationSummary {
    pub id: LocationId,
    pub name: String,
    pub abbreviation: String,
    /// `None` for locations without coordinates.
    pub distance_km: Option<f64>,
    pub distance_text: Option<String>,
}

impl LocationSummary {
    fn new(location: &Location, distance: f64) -> Self {
        Self {
            id: location.id(),
            name: location.name().to_string(),
            abbreviation: location.abbreviation().to_string(),
            distance_km: (distance >= 0.0).then_some(distance),
            distance_text: format_distance(distance),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LocationDetailView {
    pub id: LocationId,
    pub name: String,
    pub abbreviation: String,
    pub categories: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub distance_text: Option<String>,
    /// Source fields beyond the known ones (address, phone...).
    pub details: BTreeMap<String, serde_json::Value>,
    pub can_view_in_map: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CategorySummary {
    pub name: String,
    pub count: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScreenView {
    /// Nothing has been shown yet.
    Blank,
    /// Search form over the map. The map itself is drawn through the map
    /// renderer.
    SearchMap {
        form: SearchForm,
        marker_count: usize,
    },
    SearchResults {
        form: SearchForm,
        query: String,
        results: Vec<LocationSummary>,
    },
    LocationDetail {
        location: Option<LocationDetailView>,
    },
    Categories {
        categories: Vec<CategorySummary>,
    },
    CategoryDetail {
        name: String,
        locations: Vec<LocationSummary>,
    },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FooterTabView {
    pub tab: FooterTab,
    pub enabled: bool,
    pub active: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ViewModel {
    pub screen: ScreenView,
    pub group: Option<ScreenGroup>,
    /// `None` until the first screen has been shown.
    pub footer: Option<Vec<FooterTabView>>,
    pub is_loading: bool,
    /// A screen is waiting for the catalog.
    pub is_pending: bool,
    pub error: Option<UserFacingError>,
}

impl ViewModel {
    #[must_use]
    pub fn from_model(model: &Model) -> Self {
        let navigator = model.navigator();
        let footer = navigator.footer_visible().then(|| {
            FooterTab::ALL
                .iter()
                .map(|&tab| FooterTabView {
                    tab,
                    enabled: navigator.footer().is_enabled(tab),
                    active: navigator.footer().active() == Some(tab),
                })
                .collect()
        });

        Self {
            screen: screen_view(model),
            group: navigator.current().map(Screen::group),
            footer,
            is_loading: model.is_loading(),
            is_pending: navigator.pending().is_some(),
            error: model.active_error().map(UserFacingError::from),
        }
    }
}

fn summaries(model: &Model) -> Vec<LocationSummary> {
    let Some(catalog) = model.catalog() else {
        return Vec::new();
    };
    model
        .match_set()
        .locations(catalog)
        .map(|(location, distance)| LocationSummary::new(location, distance))
        .collect()
}

fn screen_view(model: &Model) -> ScreenView {
    let Some(screen) = model.current_screen() else {
        return ScreenView::Blank;
    };
    let form = model.navigator().form().clone();

    match screen {
        Screen::Home
        | Screen::SearchResultsMap { .. }
        | Screen::LocationMap { .. }
        | Screen::CategoryMap { .. } => ScreenView::SearchMap {
            form,
            marker_count: model
                .match_set()
                .members()
                .iter()
                .filter(|m| m.is_mappable())
                .count(),
        },
        Screen::SearchResults { query } => ScreenView::SearchResults {
            form,
            query: query.clone(),
            results: summaries(model),
        },
        Screen::LocationDetail { .. } => ScreenView::LocationDetail {
            location: model.selected_location().map(|location| {
                let distance = model
                    .match_set()
                    .members()
                    .iter()
                    .find(|m| m.id == location.id())
                    .map_or(crate::UNMAPPABLE_DISTANCE, |m| m.distance);
                LocationDetailView {
                    id: location.id(),
                    name: location.name().to_string(),
                    abbreviation: location.abbreviation().to_string(),
                    categories: location.categories().to_vec(),
                    latitude: location.coordinates().map(|c| c.latitude()),
                    longitude: location.coordinates().map(|c| c.longitude()),
                    distance_text: format_distance(distance),
                    details: location.extra().clone(),
                    can_view_in_map: location.coordinates().is_some(),
                }
            }),
        },
        Screen::Categories => ScreenView::Categories {
            categories: model
                .catalog()
                .map(|catalog| {
                    catalog
                        .categories()
                        .counts()
                        .map(|(name, count)| CategorySummary {
                            name: name.to_string(),
                            count,
                        })
                        .collect()
                })
                .unwrap_or_default(),
        },
        Screen::Category { name } => ScreenView::CategoryDetail {
            name: name.clone(),
            locations: summaries(model),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::OFFICES;
    use crate::config::PortletConfig;
    use crate::ErrorKind;

    fn loaded() -> Model {
        let mut model = Model::default();
        let _ = model
            .configure(PortletConfig::new("https://example.com/map.json"))
            .unwrap();
        let _ = model
            .catalog_loaded(serde_json::from_str(OFFICES).unwrap())
            .unwrap();
        model
    }

    #[test]
    fn blank_before_start() {
        let view = ViewModel::from_model(&Model::default());
        assert_eq!(view.screen, ScreenView::Blank);
        assert!(view.footer.is_none());
        assert!(view.group.is_none());
    }

    #[test]
    fn category_list_in_index_order() {
        let mut model = loaded();
        let _ = model.enter(Screen::Categories);
        let view = ViewModel::from_model(&model);
        let ScreenView::Categories { categories } = view.screen else {
            panic!("expected categories");
        };
        let counts: Vec<(&str, usize)> = categories
            .iter()
            .map(|c| (c.name.as_str(), c.count))
            .collect();
        assert_eq!(
            counts,
            vec![("Office", 1), ("Retail", 3), ("Support", 1), ("Warehouse", 1)]
        );
        assert_eq!(view.group, Some(ScreenGroup::Categories));
    }

    #[test]
    fn unmappable_rows_have_no_distance() {
        let mut model = loaded();
        let _ = model.search_submitted("support");
        let view = ViewModel::from_model(&model);
        let ScreenView::SearchResults { results, .. } = view.screen else {
            panic!("expected results");
        };
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Call Center");
        assert_eq!(results[0].distance_km, None);
        assert_eq!(results[0].distance_text, None);
    }

    #[test]
    fn detail_exposes_extra_fields() {
        let mut model = loaded();
        let _ = model.location_selected("0").unwrap();
        let view = ViewModel::from_model(&model);
        let ScreenView::LocationDetail {
            location: Some(detail),
        } = view.screen
        else {
            panic!("expected detail");
        };
        assert_eq!(detail.name, "Main Office");
        assert_eq!(detail.distance_text.as_deref(), Some("0 m"));
        assert_eq!(
            detail.details.get("address"),
            Some(&serde_json::json!("100 Church St"))
        );
        assert!(detail.can_view_in_map);
    }

    #[test]
    fn footer_marks_active_and_disabled_tabs() {
        let mut model = loaded();
        let _ = model.enter(Screen::Categories);
        let footer = ViewModel::from_model(&model).footer.unwrap();
        let map = footer.iter().find(|t| t.tab == FooterTab::Map).unwrap();
        let browse = footer.iter().find(|t| t.tab == FooterTab::Browse).unwrap();
        assert!(!map.enabled);
        assert!(browse.active && browse.enabled);
    }

    #[test]
    fn error_is_user_facing() {
        let mut model = loaded();
        model.set_error(AppError::new(ErrorKind::DataLoad, "socket closed"));
        let error = ViewModel::from_model(&model).error.unwrap();
        assert_eq!(error.error_code, "DATA_LOAD_ERROR");
        assert!(error.is_retryable && error.is_transient);
        assert!(!error.message.contains("socket"));
    }
}
