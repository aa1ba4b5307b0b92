//! The working set of locations currently in view.
//!
//! Members are ids into the [`Catalog`]; the set never owns location data.
//! Every membership change goes through [`MatchSet::reset`], which
//! recomputes distances from the anchor and re-sorts. The sort is silent: it
//! does not count as a change and never recomputes distances.

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Location, LocationId};
use crate::geo::{distance_km, Coordinates};
use crate::UNMAPPABLE_DISTANCE;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: LocationId,
    /// Kilometres from the anchor, or [`UNMAPPABLE_DISTANCE`].
    pub distance: f64,
}

impl Match {
    #[must_use]
    pub fn is_mappable(&self) -> bool {
        self.distance >= 0.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchSet {
    members: Vec<Match>,
    anchor_override: Option<Coordinates>,
    revision: u64,
}

impl MatchSet {
    /// Replace the membership. `anchor`, when given, becomes the new anchor
    /// override; otherwise the current anchor is kept. Ids unknown to the
    /// catalog are dropped.
    pub fn reset(
        &mut self,
        catalog: &Catalog,
        members: impl IntoIterator<Item = LocationId>,
        anchor: Option<Coordinates>,
    ) {
        if anchor.is_some() {
            self.anchor_override = anchor;
        }
        self.members = members
            .into_iter()
            .filter(|id| catalog.find_by_id(*id).is_some())
            .map(|id| Match {
                id,
                distance: UNMAPPABLE_DISTANCE,
            })
            .collect();
        self.revision += 1;
        self.recompute_distances(catalog);
    }

    /// Change the anchor in place (`None` returns to the catalog default)
    /// and recompute. Membership is untouched. Without a catalog the
    /// override is only recorded; the set is empty until one arrives.
    pub fn set_anchor(&mut self, catalog: Option<&Catalog>, anchor: Option<Coordinates>) {
        self.anchor_override = anchor;
        if let Some(catalog) = catalog {
            self.recompute_distances(catalog);
        }
    }

    pub fn recompute_distances(&mut self, catalog: &Catalog) {
        let anchor = self.anchor(catalog);
        for member in &mut self.members {
            member.distance = catalog
                .find_by_id(member.id)
                .and_then(Location::coordinates)
                .map_or(UNMAPPABLE_DISTANCE, |coords| distance_km(anchor, coords));
        }
        self.sort_silently();
    }

    // Ascending by distance, so the -1 sentinel sorts ahead of every
    // mappable member. Stable: equal distances keep insertion order.
    fn sort_silently(&mut self) {
        self.members
            .sort_by(|a, b| a.distance.total_cmp(&b.distance));
    }

    #[must_use]
    pub fn anchor(&self, catalog: &Catalog) -> Coordinates {
        self.anchor_override
            .unwrap_or_else(|| catalog.default_location())
    }

    #[must_use]
    pub const fn anchor_override(&self) -> Option<Coordinates> {
        self.anchor_override
    }

    /// Bumped once per [`MatchSet::reset`].
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn members(&self) -> &[Match] {
        &self.members
    }

    #[must_use]
    pub fn ids(&self) -> Vec<LocationId> {
        self.members.iter().map(|m| m.id).collect()
    }

    /// Members resolved against `catalog`, in distance order.
    pub fn locations<'a>(
        &'a self,
        catalog: &'a Catalog,
    ) -> impl Iterator<Item = (&'a Location, f64)> + 'a {
        self.members
            .iter()
            .filter_map(move |m| catalog.find_by_id(m.id).map(|l| (l, m.distance)))
    }

    #[must_use]
    pub fn has_mappable(&self) -> bool {
        self.members.iter().any(Match::is_mappable)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
