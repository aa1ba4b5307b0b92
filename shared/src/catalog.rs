//! The location catalog: wire format, parsing, and the category index.
//!
//! A [`Catalog`] is built in a single pass over the fetched payload. That
//! pass assigns sequential ids in source order, validates coordinates and
//! tallies categories, so the catalog is immutable once constructed. A
//! re-fetch builds a new catalog and replaces the old one wholesale.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::{CoordinateError, Coordinates};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub u32);

impl LocationId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid location id: {0:?}")]
pub struct InvalidLocationId(pub String);

impl FromStr for LocationId {
    type Err = InvalidLocationId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|_| InvalidLocationId(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("malformed catalog payload: {0}")]
    Malformed(String),
    #[error("default location is invalid: {0}")]
    InvalidDefaultLocation(#[source] CoordinateError),
    #[error("location {index} ({name}) has invalid coordinates: {source}")]
    InvalidCoordinates {
        index: usize,
        name: String,
        #[source]
        source: CoordinateError,
    },
    #[error("catalog holds more locations than can be addressed")]
    TooManyLocations,
}

// --- Wire format ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// One location record as the data source sends it. Ids are not part of the
/// record; they are assigned while parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    pub name: String,
    #[serde(default)]
    pub abbreviation: String,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub search_text: Option<String>,
    /// Anything else the source provides (address, phone, url...), passed
    /// through to the detail screen untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapData {
    pub default_location: RawPoint,
    pub locations: Vec<LocationRecord>,
}

/// The fetched document. Portal data feeds wrap the payload in `mapData`;
/// bare documents are accepted as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogResponse {
    Wrapped {
        #[serde(rename = "mapData")]
        map_data: MapData,
    },
    Bare(MapData),
}

impl CatalogResponse {
    #[must_use]
    pub fn into_map_data(self) -> MapData {
        match self {
            Self::Wrapped { map_data } | Self::Bare(map_data) => map_data,
        }
    }
}

impl From<MapData> for CatalogResponse {
    fn from(data: MapData) -> Self {
        Self::Bare(data)
    }
}

// --- Domain ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    id: LocationId,
    name: String,
    abbreviation: String,
    categories: Vec<String>,
    coordinates: Option<Coordinates>,
    search_text: Option<String>,
    extra: BTreeMap<String, serde_json::Value>,
}

impl Location {
    #[must_use]
    pub const fn id(&self) -> LocationId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn abbreviation(&self) -> &str {
        &self.abbreviation
    }

    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    #[must_use]
    pub fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c == name)
    }

    /// `None` means the location cannot be placed on a map.
    #[must_use]
    pub const fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    #[must_use]
    pub fn search_text(&self) -> Option<&str> {
        self.search_text.as_deref()
    }

    #[must_use]
    pub fn extra(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.extra
    }

    /// Label used for map popups and links, e.g. `"Main Office (MO)"`.
    #[must_use]
    pub fn label(&self) -> String {
        if self.abbreviation.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.abbreviation)
        }
    }

    fn from_record(
        id: LocationId,
        index: usize,
        record: LocationRecord,
    ) -> Result<Self, CatalogError> {
        let coordinates = match (record.latitude, record.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon).map_err(|source| {
                CatalogError::InvalidCoordinates {
                    index,
                    name: record.name.clone(),
                    source,
                }
            })?),
            _ => None,
        };

        let mut categories: Vec<String> = Vec::new();
        for category in record.categories.unwrap_or_default() {
            if !categories.contains(&category) {
                categories.push(category);
            }
        }

        Ok(Self {
            id,
            name: record.name,
            abbreviation: record.abbreviation,
            categories,
            coordinates,
            search_text: record.search_text,
            extra: record.extra,
        })
    }
}

/// Category label -> member ids, in catalog order. A label only exists once
/// some location carries it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryIndex {
    members: BTreeMap<String, Vec<LocationId>>,
}

impl CategoryIndex {
    fn record(&mut self, category: &str, id: LocationId) {
        self.members.entry(category.to_string()).or_default().push(id);
    }

    #[must_use]
    pub fn count(&self, category: &str) -> usize {
        self.members.get(category).map_or(0, Vec::len)
    }

    #[must_use]
    pub fn members(&self, category: &str) -> &[LocationId] {
        self.members.get(category).map(Vec::as_slice).unwrap_or_default()
    }

    /// Categories with their counts, alphabetically.
    pub fn counts(&self) -> impl Iterator<Item = (&str, usize)> {
        self.members
            .iter()
            .map(|(name, ids)| (name.as_str(), ids.len()))
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

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    default_location: Coordinates,
    locations: Vec<Location>,
    categories: CategoryIndex,
}

impl Catalog {
    pub fn parse(response: CatalogResponse) -> Result<Self, CatalogError> {
        let data = response.into_map_data();

        let default_location =
            Coordinates::new(data.default_location.latitude, data.default_location.longitude)
                .map_err(CatalogError::InvalidDefaultLocation)?;

        let mut locations = Vec::with_capacity(data.locations.len());
        let mut categories = CategoryIndex::default();

        for (index, record) in data.locations.into_iter().enumerate() {
            let id = u32::try_from(index)
                .map(LocationId)
                .map_err(|_| CatalogError::TooManyLocations)?;
            let location = Location::from_record(id, index, record)?;
            for category in &location.categories {
                categories.record(category, id);
            }
            locations.push(location);
        }

        Ok(Self {
            default_location,
            locations,
            categories,
        })
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, CatalogError> {
        let response: CatalogResponse = serde_json::from_slice(bytes)
            .map_err(|e| CatalogError::Malformed(e.to_string()))?;
        Self::parse(response)
    }

    #[must_use]
    pub const fn default_location(&self) -> Coordinates {
        self.default_location
    }

    #[must_use]
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    #[must_use]
    pub fn categories(&self) -> &CategoryIndex {
        &self.categories
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Exact id lookup. Absence is an ordinary outcome for callers.
    #[must_use]
    pub fn find_by_id(&self, id: LocationId) -> Option<&Location> {
        self.locations.get(id.index()).filter(|l| l.id == id)
    }

    /// Members of `category`, in catalog order.
    #[must_use]
    pub fn find_by_category(&self, category: &str) -> Vec<&Location> {
        self.categories
            .members(category)
            .iter()
            .filter_map(|id| self.find_by_id(*id))
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    mod parse_tests {
        use super::*;

        #[test]
        fn ids_follow_source_order() {
            let catalog = offices();
            let ids: Vec<u32> = catalog.locations().iter().map(|l| l.id().0).collect();
            assert_eq!(ids, vec![0, 1, 2, 3]);
            assert_eq!(catalog.locations()[2].name(), "Call Center");
        }

        #[test]
        fn accepts_bare_payload() {
            let catalog = two_points();
            assert_eq!(catalog.len(), 2);
            assert_eq!(catalog.default_location(), Coordinates::new(0.0, 0.0).unwrap());
        }

        #[test]
        fn missing_categories_are_empty() {
            let catalog = Catalog::from_json(
                br#"{"defaultLocation":{"latitude":1,"longitude":2},
                     "locations":[{"name":"Lone"}]}"#,
            )
            .unwrap();
            let lone = &catalog.locations()[0];
            assert!(lone.categories().is_empty());
            assert_eq!(lone.abbreviation(), "");
            assert_eq!(lone.coordinates(), None);
            assert!(catalog.categories().is_empty());
        }

        #[test]
        fn half_a_coordinate_is_unmappable() {
            let catalog = Catalog::from_json(
                br#"{"defaultLocation":{"latitude":1,"longitude":2},
                     "locations":[{"name":"Half","latitude":10}]}"#,
            )
            .unwrap();
            assert_eq!(catalog.locations()[0].coordinates(), None);
        }

        #[test]
        fn out_of_range_coordinates_are_malformed() {
            let err = Catalog::from_json(
                br#"{"defaultLocation":{"latitude":1,"longitude":2},
                     "locations":[{"name":"Ok"},{"name":"Bad","latitude":123,"longitude":0}]}"#,
            )
            .unwrap_err();
            assert!(matches!(
                err,
                CatalogError::InvalidCoordinates { index: 1, .. }
            ));
        }

        #[test]
        fn garbage_is_malformed() {
            assert!(matches!(
                Catalog::from_json(b"{\"locations\": 3}"),
                Err(CatalogError::Malformed(_))
            ));
        }

        #[test]
        fn extra_fields_are_kept() {
            let catalog = offices();
            let main = &catalog.locations()[0];
            assert_eq!(
                main.extra().get("address"),
                Some(&serde_json::Value::from("100 Church St"))
            );
            assert!(!main.extra().contains_key("name"));
        }
    }

    mod index_tests {
        use super::*;

        #[test]
        fn counts_match_membership() {
            let catalog = offices();
            for (name, count) in catalog.categories().counts() {
                let members = catalog
                    .locations()
                    .iter()
                    .filter(|l| l.has_category(name))
                    .count();
                assert_eq!(count, members, "category {name}");
            }
            assert_eq!(catalog.categories().count("Retail"), 3);
            assert_eq!(catalog.categories().count("Nope"), 0);
        }

        #[test]
        fn duplicate_category_counts_once() {
            let catalog = Catalog::from_json(
                br#"{"defaultLocation":{"latitude":1,"longitude":2},
                     "locations":[{"name":"Twice","categories":["a","a"]}]}"#,
            )
            .unwrap();
            assert_eq!(catalog.categories().count("a"), 1);
        }

        #[test]
        fn find_by_category_preserves_order() {
            let catalog = offices();
            let names: Vec<&str> = catalog
                .find_by_category("Retail")
                .into_iter()
                .map(Location::name)
                .collect();
            assert_eq!(names, vec!["Main Office", "North Branch", "South Depot"]);
            assert!(catalog.find_by_category("retail").is_empty());
        }

        #[test]
        fn find_by_id_reports_absence() {
            let catalog = offices();
            assert_eq!(
                catalog.find_by_id(LocationId(3)).map(Location::name),
                Some("South Depot")
            );
            assert!(catalog.find_by_id(LocationId(4)).is_none());
        }
    }

    #[test]
    fn location_id_parsing() {
        assert_eq!("12".parse::<LocationId>(), Ok(LocationId(12)));
        assert_eq!(" 7 ".parse::<LocationId>(), Ok(LocationId(7)));
        assert!("12abc".parse::<LocationId>().is_err());
        assert!("-1".parse::<LocationId>().is_err());
    }

    #[test]
    fn label_includes_abbreviation() {
        let catalog = offices();
        assert_eq!(catalog.locations()[1].label(), "North Branch (NB)");
    }
}
