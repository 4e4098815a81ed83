use std::{error::Error, fmt};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::geo;

use crate::ExampleData;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    pub name: String,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
}

impl Waypoint {
    pub fn new<S: Into<String>>(name: S, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }
}

/// A status message that shows up once the progress has moved past
/// `after_percent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub after_percent: u8,
    pub message: String,
}

impl Milestone {
    pub fn new<S: Into<String>>(after_percent: u8, message: S) -> Self {
        Self {
            after_percent: after_percent.min(100),
            message: message.into(),
        }
    }

    pub fn is_reached(&self, percent: u8) -> bool {
        percent > self.after_percent
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    TooShort { waypoints: usize },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { waypoints } => write!(
                f,
                "a route needs at least two waypoints, got {}",
                waypoints
            ),
        }
    }
}

impl Error for RouteError {}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct RouteDto {
    waypoints: Vec<Waypoint>,
    #[serde(default)]
    milestones: Vec<Milestone>,
}

impl TryFrom<RouteDto> for Route {
    type Error = RouteError;

    fn try_from(value: RouteDto) -> Result<Self, Self::Error> {
        Route::new(value.waypoints, value.milestones)
    }
}

/// An ordered, fixed list of waypoints. Once created, a route never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", try_from = "RouteDto")]
pub struct Route {
    waypoints: Vec<Waypoint>,
    milestones: Vec<Milestone>,
}

impl Route {
    pub fn new(
        waypoints: Vec<Waypoint>,
        milestones: Vec<Milestone>,
    ) -> Result<Self, RouteError> {
        if waypoints.len() < 2 {
            return Err(RouteError::TooShort {
                waypoints: waypoints.len(),
            });
        }
        Ok(Self {
            waypoints,
            milestones,
        })
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Routes always hold at least two waypoints.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn origin(&self) -> &Waypoint {
        &self.waypoints[0]
    }

    pub fn destination(&self) -> &Waypoint {
        &self.waypoints[self.waypoints.len() - 1]
    }

    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    pub fn reached_milestones(&self, percent: u8) -> Vec<Milestone> {
        self.milestones
            .iter()
            .filter(|milestone| milestone.is_reached(percent))
            .cloned()
            .collect()
    }

    /// Great circle distance left from the waypoint at `index` to the
    /// destination, summed leg by leg.
    pub fn remaining_distance_km(&self, index: usize) -> f64 {
        geo::path_length(
            self.waypoints
                .iter()
                .skip(index)
                .map(|waypoint| (waypoint.latitude, waypoint.longitude)),
        )
    }
}

impl ExampleData for Route {
    fn example_data() -> Self {
        Self {
            waypoints: vec![
                Waypoint::new("Guwahati", 26.1445, 91.7362),
                Waypoint::new("Kolkata", 22.5726, 88.3639),
                Waypoint::new("Patna", 25.5941, 85.1376),
                Waypoint::new("Lucknow", 26.8467, 80.9462),
                Waypoint::new("Delhi", 28.6139, 77.2090),
            ],
            milestones: vec![
                Milestone::new(20, "Package picked up from Guwahati warehouse"),
                Milestone::new(40, "Crossed Kolkata checkpoint"),
                Milestone::new(60, "Reached Patna distribution center"),
                Milestone::new(80, "Currently in Lucknow"),
            ],
        }
    }
}
