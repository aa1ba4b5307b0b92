mod map_renderer;

pub use self::map_renderer::{DrawRequest, MapMarker, MapOperation, MapRenderer};

pub use crux_core::render::Render;
pub use crux_http::Http;

// The Effect derive refers to the app by name.
#[allow(unused_imports)]
use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
    pub map_renderer: MapRenderer<Event>,
}
