use serde::{Deserialize, Serialize};

use crate::catalog::CatalogResponse;
use crate::config::PortletConfig;
use crate::navigation::{FooterTab, Screen};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum Event {
    /// The host instantiated the widget.
    Start(PortletConfig),
    Teardown,

    Navigate(Screen),
    Back,
    FooterTapped(FooterTab),

    SearchSubmitted {
        query: String,
    },
    /// Raw id from a list row or a map popup.
    LocationSelected {
        id: String,
    },
    ViewInMap,
    CategorySelected {
        name: String,
    },

    AnchorMoved {
        latitude: f64,
        longitude: f64,
    },
    AnchorReset,

    ReloadCatalog,
    DismissError,

    #[serde(skip)]
    CatalogLoaded(crux_http::Result<crux_http::Response<CatalogResponse>>),
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start(_) => "start",
            Self::Teardown => "teardown",
            Self::Navigate(_) => "navigate",
            Self::Back => "back",
            Self::FooterTapped(_) => "footer_tapped",
            Self::SearchSubmitted { .. } => "search_submitted",
            Self::LocationSelected { .. } => "location_selected",
            Self::ViewInMap => "view_in_map",
            Self::CategorySelected { .. } => "category_selected",
            Self::AnchorMoved { .. } => "anchor_moved",
            Self::AnchorReset => "anchor_reset",
            Self::ReloadCatalog => "reload_catalog",
            Self::DismissError => "dismiss_error",
            Self::CatalogLoaded(_) => "catalog_loaded",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        !matches!(
            self,
            Self::Start(_) | Self::Teardown | Self::AnchorMoved { .. } | Self::CatalogLoaded(_)
        )
    }
}
