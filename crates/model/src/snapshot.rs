use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    call::CallState,
    route::{Milestone, Route, Waypoint},
    subject::{Driver, Subject, SubjectKind},
    ExampleData,
};
use utility::id::Id;

/// Everything a view needs to render a tracked subject. Snapshots are plain
/// values; taking one never changes the tracking state.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSnapshot {
    pub subject: Option<Subject>,
    pub is_open: bool,
    pub percent: u8,
    pub progress_running: bool,
    pub waypoint_index: Option<usize>,
    pub current_waypoint: Option<Waypoint>,
    pub next_waypoint: Option<Waypoint>,
    pub distance_remaining_km: Option<f64>,
    pub reached_milestones: Vec<Milestone>,
    pub call_state: CallState,
    pub elapsed_seconds: u32,
    pub elapsed: String,
    pub recording: bool,
    pub quota_remaining: Option<u32>,
}

impl ExampleData for TrackingSnapshot {
    fn example_data() -> Self {
        let route = Route::example_data();
        Self {
            subject: Some(Subject {
                id: Id::new("ORD-1024".to_owned()),
                kind: SubjectKind::Order,
                driver: Driver {
                    name: "Rajesh Kumar".to_owned(),
                    phone: "+91 98765 43210".to_owned(),
                    vehicle_number: "DL 01 AB 1234".to_owned(),
                },
                expected_delivery: None,
            }),
            is_open: true,
            percent: 40,
            progress_running: true,
            waypoint_index: Some(1),
            current_waypoint: route.get(1).cloned(),
            next_waypoint: route.get(2).cloned(),
            distance_remaining_km: Some(route.remaining_distance_km(1)),
            reached_milestones: route.reached_milestones(40),
            call_state: CallState::Active,
            elapsed_seconds: 12,
            elapsed: "0:12".to_owned(),
            recording: false,
            quota_remaining: Some(2),
        }
    }
}
