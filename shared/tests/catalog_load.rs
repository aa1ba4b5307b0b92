use assert_matches::assert_matches;
use crux_core::testing::AppTester;
use crux_core::Request;
use crux_http::protocol::{HttpRequest, HttpResponse, HttpResult};
use map_portlet::model::LoadState;
use map_portlet::view::ScreenView;
use map_portlet::{App, Effect, ErrorKind, Event, Model, PortletConfig, Screen};

const DATA_URL: &str = "https://example.com/portal/map-data.json";

const BRANCHES: &str = r#"{
    "mapData": {
        "defaultLocation": { "latitude": 44.9740, "longitude": -93.2277 },
        "locations": [
            { "name": "Main Office", "abbreviation": "MO", "categories": ["Office", "Retail"],
              "latitude": 44.9740, "longitude": -93.2277 },
            { "name": "North Branch", "abbreviation": "NB", "categories": ["Retail"],
              "latitude": 45.0500, "longitude": -93.2277 },
            { "name": "Call Center", "abbreviation": "CC", "categories": ["Support"] }
        ]
    }
}"#;

fn http_requests(effects: Vec<Effect>) -> Vec<Request<HttpRequest>> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .collect()
}

fn start(app: &AppTester<App, Effect>, model: &mut Model) -> Request<HttpRequest> {
    let update = app.update(Event::Start(PortletConfig::new(DATA_URL)), model);
    let mut requests = http_requests(update.effects);
    assert_eq!(requests.len(), 1, "start fetches the catalog once");
    requests.remove(0)
}

fn respond(
    app: &AppTester<App, Effect>,
    model: &mut Model,
    request: &mut Request<HttpRequest>,
    response: HttpResponse,
) -> Vec<Effect> {
    let update = app
        .resolve(request, HttpResult::Ok(response))
        .expect("http request resolves");
    let mut effects = Vec::new();
    for event in update.events {
        effects.extend(app.update(event, model).effects);
    }
    effects
}

#[test]
fn start_requests_configured_url() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let request = start(&app, &mut model);
    assert_eq!(request.operation.url, DATA_URL);
    assert_eq!(request.operation.method, "GET");
    assert_eq!(model.load_state(), LoadState::InFlight);
    assert_eq!(model.current_screen(), Some(&Screen::Home));
}

#[test]
fn entries_during_fetch_share_one_request_and_last_wins() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    let mut request = start(&app, &mut model);

    let update = app.update(
        Event::Navigate(Screen::Category {
            name: "Retail".into(),
        }),
        &mut model,
    );
    assert!(http_requests(update.effects).is_empty());
    let update = app.update(Event::Navigate(Screen::Categories), &mut model);
    assert!(http_requests(update.effects).is_empty());
    assert!(app.view(&model).is_pending);

    respond(&app, &mut model, &mut request, HttpResponse::ok().body(BRANCHES).build());

    assert_eq!(model.current_screen(), Some(&Screen::Categories));
    let view = app.view(&model);
    assert!(!view.is_pending);
    assert!(!view.is_loading);
    assert_matches!(view.screen, ScreenView::Categories { ref categories } if categories.len() == 3);
}

#[test]
fn malformed_payload_keeps_screen_pending() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    let mut request = start(&app, &mut model);

    let _ = app.update(Event::Navigate(Screen::Categories), &mut model);
    respond(
        &app,
        &mut model,
        &mut request,
        HttpResponse::ok().body("{ not json").build(),
    );

    assert!(model.catalog().is_none());
    assert_eq!(model.load_state(), LoadState::Idle);
    assert_eq!(model.current_screen(), Some(&Screen::Home));
    assert_eq!(model.navigator().pending(), Some(&Screen::Categories));

    let view = app.view(&model);
    assert!(view.is_pending);
    let error = view.error.expect("load failure is reported");
    assert_eq!(error.error_code, "DATA_LOAD_ERROR");
    assert!(error.is_retryable);
}

#[test]
fn server_error_is_a_load_failure() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    let mut request = start(&app, &mut model);

    respond(&app, &mut model, &mut request, HttpResponse::status(500).build());

    assert!(model.catalog().is_none());
    assert_eq!(model.active_error().map(|e| e.kind), Some(ErrorKind::DataLoad));
}

#[test]
fn reload_after_failure_shows_parked_screen() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    let mut request = start(&app, &mut model);

    let _ = app.update(
        Event::Navigate(Screen::Category {
            name: "Support".into(),
        }),
        &mut model,
    );
    respond(&app, &mut model, &mut request, HttpResponse::status(503).build());

    let update = app.update(Event::ReloadCatalog, &mut model);
    let mut requests = http_requests(update.effects);
    assert_eq!(requests.len(), 1);
    respond(
        &app,
        &mut model,
        &mut requests[0],
        HttpResponse::ok().body(BRANCHES).build(),
    );

    assert_eq!(
        model.current_screen(),
        Some(&Screen::Category {
            name: "Support".into()
        })
    );
    assert!(app.view(&model).error.is_none());
}

#[test]
fn completion_after_teardown_is_ignored() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    let mut request = start(&app, &mut model);

    let _ = app.update(Event::Navigate(Screen::Categories), &mut model);
    let update = app.update(Event::Teardown, &mut model);
    assert!(update.effects.is_empty());

    let effects = respond(&app, &mut model, &mut request, HttpResponse::ok().body(BRANCHES).build());
    assert!(effects.is_empty());
    assert!(model.catalog().is_none());
    assert_eq!(model.current_screen(), Some(&Screen::Home));
}

#[test]
fn reload_replaces_catalog_without_history_entry() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    let mut request = start(&app, &mut model);
    respond(&app, &mut model, &mut request, HttpResponse::ok().body(BRANCHES).build());

    let _ = app.update(
        Event::Navigate(Screen::Category {
            name: "Retail".into(),
        }),
        &mut model,
    );
    let history = model.navigator().history().len();

    let update = app.update(Event::ReloadCatalog, &mut model);
    let mut requests = http_requests(update.effects);
    assert_eq!(requests.len(), 1);

    // A second reload while the first is running does nothing.
    let update = app.update(Event::ReloadCatalog, &mut model);
    assert!(http_requests(update.effects).is_empty());

    let smaller = r#"{
        "defaultLocation": { "latitude": 44.9740, "longitude": -93.2277 },
        "locations": [
            { "name": "North Branch", "abbreviation": "NB", "categories": ["Retail"],
              "latitude": 45.0500, "longitude": -93.2277 }
        ]
    }"#;
    respond(
        &app,
        &mut model,
        &mut requests[0],
        HttpResponse::ok().body(smaller).build(),
    );

    assert_eq!(model.catalog().map(|c| c.len()), Some(1));
    assert_eq!(model.navigator().history().len(), history);
    let view = app.view(&model);
    assert_matches!(
        view.screen,
        ScreenView::CategoryDetail { ref locations, .. } if locations.len() == 1
    );
}

#[test]
fn anchor_moved_during_fetch_orders_later_screens() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    let mut request = start(&app, &mut model);

    let update = app.update(
        Event::AnchorMoved {
            latitude: 45.05,
            longitude: -93.2277,
        },
        &mut model,
    );
    assert!(http_requests(update.effects).is_empty());
    respond(&app, &mut model, &mut request, HttpResponse::ok().body(BRANCHES).build());

    let _ = app.update(
        Event::Navigate(Screen::Category {
            name: "Retail".into(),
        }),
        &mut model,
    );
    let view = app.view(&model);
    assert_matches!(view.screen, ScreenView::CategoryDetail { ref locations, .. } => {
        let names: Vec<&str> = locations.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["North Branch", "Main Office"]);
    });
}
