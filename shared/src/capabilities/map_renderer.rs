//! The map surface is owned by the shell. The core only tells it what to
//! show; none of these operations report anything back.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

use crate::catalog::{Location, LocationId};
use crate::config::MapOptions;
use crate::geo::Coordinates;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    pub id: LocationId,
    /// Popup text, `"Name (ABBR)"`.
    pub label: String,
    pub position: Coordinates,
    pub distance_km: f64,
}

impl MapMarker {
    /// `None` for a location that cannot be placed on the map.
    #[must_use]
    pub fn for_location(location: &Location, distance_km: f64) -> Option<Self> {
        if distance_km < 0.0 {
            return None;
        }
        Some(Self {
            id: location.id(),
            label: location.label(),
            position: location.coordinates()?,
            distance_km,
        })
    }
}

/// One marker per mappable member. The shell fits the viewport to the
/// markers, or centres on the only one at `options.single_marker_zoom`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawRequest {
    pub anchor: Coordinates,
    pub markers: Vec<MapMarker>,
    pub options: MapOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapOperation {
    Draw(DrawRequest),
    ClearMarkers,
    OpenPopup(MapMarker),
}

impl Operation for MapOperation {
    type Output = ();
}

pub struct MapRenderer<Ev> {
    context: CapabilityContext<MapOperation, Ev>,
}

impl<Ev> Capability<Ev> for MapRenderer<Ev> {
    type Operation = MapOperation;
    type MappedSelf<MappedEv> = MapRenderer<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        MapRenderer::new(self.context.map_event(f))
    }
}

impl<Ev> MapRenderer<Ev>
where
    Ev: 'static,
{
    #[must_use]
    pub fn new(context: CapabilityContext<MapOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn draw(&self, request: DrawRequest) {
        self.notify(MapOperation::Draw(request));
    }

    pub fn clear_markers(&self) {
        self.notify(MapOperation::ClearMarkers);
    }

    pub fn open_popup(&self, marker: MapMarker) {
        self.notify(MapOperation::OpenPopup(marker));
    }

    fn notify(&self, operation: MapOperation) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(operation).await;
        });
    }
}
