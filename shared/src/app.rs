use tracing::{debug, error, info, instrument, warn};

use crate::capabilities::{Capabilities, DrawRequest, MapMarker};
use crate::catalog::{Catalog, CatalogResponse};
use crate::event::Event;
use crate::geo::Coordinates;
use crate::model::{Model, Transition};
use crate::view::ViewModel;
use crate::{AppError, ErrorKind};

#[derive(Default)]
pub struct App;

impl App {
    /// Turn a state change into effects: start the fetch, redraw the map,
    /// then render.
    fn apply(transition: Transition, model: &Model, caps: &Capabilities) {
        if let Some(url) = transition.fetch {
            info!(%url, "fetching catalog");
            caps.http
                .get(url)
                .expect_json::<CatalogResponse>()
                .send(Event::CatalogLoaded);
        }
        if transition.deferred {
            debug!(
                pending = model.navigator().pending().map(|s| s.name()),
                "screen waiting for catalog"
            );
        }
        if transition.redraw_map {
            Self::draw_map(model, caps);
        }
        caps.render.render();
    }

    /// Clear, draw every mappable member, then open the nearest one's popup.
    fn draw_map(model: &Model, caps: &Capabilities) {
        let Some(catalog) = model.catalog() else {
            return;
        };
        let match_set = model.match_set();
        let markers: Vec<MapMarker> = match_set
            .locations(catalog)
            .filter_map(|(location, distance)| MapMarker::for_location(location, distance))
            .collect();
        let nearest = markers.first().cloned();
        let options = model
            .config()
            .map(|c| c.settings.map_options)
            .unwrap_or_default();

        debug!(markers = markers.len(), "drawing map");
        caps.map_renderer.clear_markers();
        caps.map_renderer.draw(DrawRequest {
            anchor: match_set.anchor(catalog),
            markers,
            options,
        });
        if let Some(marker) = nearest {
            caps.map_renderer.open_popup(marker);
        }
    }

    fn catalog_loaded(
        result: crux_http::Result<crux_http::Response<CatalogResponse>>,
        model: &mut Model,
    ) -> Transition {
        let body = match result {
            Ok(mut response) if response.status().is_success() => response.take_body(),
            Ok(response) => {
                let status = response.status();
                return Self::load_failed(
                    model,
                    AppError::new(ErrorKind::DataLoad, "Location data could not be fetched")
                        .with_context("http_status", u16::from(status).to_string()),
                );
            }
            Err(e) => {
                return Self::load_failed(
                    model,
                    AppError::new(ErrorKind::DataLoad, "Location data could not be fetched")
                        .with_internal(e.to_string()),
                );
            }
        };

        let Some(body) = body else {
            return Self::load_failed(
                model,
                AppError::new(ErrorKind::DataLoad, "Location data response was empty"),
            );
        };

        match model.catalog_loaded(body) {
            Ok(transition) => {
                info!(
                    locations = model.catalog().map_or(0, Catalog::len),
                    categories = model.catalog().map_or(0, |c| c.categories().len()),
                    "catalog loaded"
                );
                transition
            }
            Err(e) => {
                error!(error = %e, "catalog rejected");
                Transition::default()
            }
        }
    }

    fn load_failed(model: &mut Model, error: AppError) -> Transition {
        error!(error = %error, "catalog load failed");
        model.catalog_failed(error);
        Transition::default()
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    #[instrument(
        skip_all,
        fields(
            instance = %model.instance_id,
            event = event.name(),
            user = event.is_user_initiated(),
        )
    )]
    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        if model.is_destroyed() {
            debug!("ignoring event after teardown");
            return;
        }

        let transition = match event {
            Event::Start(config) => match model.configure(config) {
                Ok(transition) => {
                    info!("started");
                    transition
                }
                Err(e) => {
                    error!(error = %e, "rejected configuration");
                    model.set_error(e);
                    Transition::default()
                }
            },

            Event::Teardown => {
                model.teardown();
                info!("torn down");
                return;
            }

            Event::Navigate(screen) => model.enter(screen),

            Event::Back => model.back(),

            Event::FooterTapped(tab) => match model.footer_tapped(tab) {
                Some(transition) => transition,
                None => {
                    warn!(?tab, "tap on disabled footer tab ignored");
                    return;
                }
            },

            Event::SearchSubmitted { query } => model.search_submitted(&query),

            Event::LocationSelected { id } => match model.location_selected(&id) {
                Ok(transition) => transition,
                Err(e) => {
                    warn!(error = %e, "rejected location selection");
                    return;
                }
            },

            Event::ViewInMap => match model.view_in_map() {
                Ok(transition) => transition,
                Err(e) => {
                    warn!(error = %e, "rejected view in map");
                    return;
                }
            },

            Event::CategorySelected { name } => model.category_selected(&name),

            Event::AnchorMoved {
                latitude,
                longitude,
            } => match Coordinates::new(latitude, longitude) {
                Ok(anchor) => model.move_anchor(Some(anchor)),
                Err(e) => {
                    warn!(error = %e, "rejected anchor");
                    return;
                }
            },

            Event::AnchorReset => model.move_anchor(None),

            Event::ReloadCatalog => match model.reload() {
                Ok(transition) => transition,
                Err(e) => {
                    warn!(error = %e, "reload before start");
                    model.set_error(e);
                    Transition::default()
                }
            },

            Event::DismissError => {
                model.dismiss_error();
                Transition::default()
            }

            Event::CatalogLoaded(result) => Self::catalog_loaded(result, model),
        };

        if let Some(screen) = model.current_screen() {
            debug!(screen = screen.name(), "showing");
        }
        Self::apply(transition, model, caps);
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel::from_model(model)
    }
}
