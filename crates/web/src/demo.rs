//! Subjects the server knows about out of the box: one customer order on the
//! long haul from Guwahati to Delhi and the refrigerated fleet.

use chrono::{Duration, Local};
use indexmap::IndexMap;
use model::{
    route::{Milestone, Route, RouteError, Waypoint},
    subject::{Driver, Subject, SubjectKind},
    ExampleData,
};
use utility::id::Id;

#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub subject: Subject,
    pub route: Route,
}

pub type Catalog = IndexMap<Id<Subject>, CatalogEntry>;

fn driver(name: &str, phone: &str, vehicle_number: &str) -> Driver {
    Driver {
        name: name.to_owned(),
        phone: phone.to_owned(),
        vehicle_number: vehicle_number.to_owned(),
    }
}

fn vehicle(id: &str, driver: Driver, waypoints: Vec<Waypoint>) -> Result<CatalogEntry, RouteError> {
    let milestones = vec![
        Milestone::new(0, "Left the depot"),
        Milestone::new(50, "Halfway there"),
        Milestone::new(90, "Approaching destination"),
    ];
    Ok(CatalogEntry {
        subject: Subject {
            id: Id::new(id.to_owned()),
            kind: SubjectKind::Vehicle,
            driver,
            expected_delivery: None,
        },
        route: Route::new(waypoints, milestones)?,
    })
}

pub fn catalog() -> Result<Catalog, RouteError> {
    let order = CatalogEntry {
        subject: Subject {
            id: Id::new("ORD-1024".to_owned()),
            kind: SubjectKind::Order,
            driver: driver("Rajesh Kumar", "+91 98765 43210", "DL 01 AB 1234"),
            expected_delivery: Some(Local::now() + Duration::days(2)),
        },
        route: Route::example_data(),
    };

    let fleet = [
        vehicle(
            "TRK001",
            driver("John Doe", "+91 98100 00001", "DL 03 CK 4410"),
            vec![
                Waypoint::new("Delhi NCR", 28.6139, 77.2090),
                Waypoint::new("Neemrana", 27.9881, 76.3866),
                Waypoint::new("Jaipur", 26.9124, 75.7873),
            ],
        )?,
        vehicle(
            "TRK002",
            driver("Jane Smith", "+91 98100 00002", "MH 01 AZ 2298"),
            vec![
                Waypoint::new("Mumbai", 19.0760, 72.8777),
                Waypoint::new("Lonavala", 18.7546, 73.4062),
                Waypoint::new("Pune", 18.5204, 73.8567),
            ],
        )?,
        vehicle(
            "TRK003",
            driver("Mike Johnson", "+91 98100 00003", "KA 05 MN 7781"),
            vec![
                Waypoint::new("Bangalore", 12.9716, 77.5946),
                Waypoint::new("Vellore", 12.9165, 79.1325),
                Waypoint::new("Chennai", 13.0827, 80.2707),
            ],
        )?,
        vehicle(
            "TRK004",
            driver("Sarah Wilson", "+91 98100 00004", "TN 09 BX 3050"),
            vec![
                Waypoint::new("Chennai", 13.0827, 80.2707),
                Waypoint::new("Vellore", 12.9165, 79.1325),
                Waypoint::new("Bangalore", 12.9716, 77.5946),
            ],
        )?,
    ];

    Ok(std::iter::once(order)
        .chain(fleet)
        .map(|entry| (entry.subject.id.clone(), entry))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_comes_first() {
        let catalog = catalog().unwrap();
        assert_eq!(catalog.len(), 5);
        let (id, order) = catalog.first().unwrap();
        assert_eq!(id.to_string(), "ORD-1024");
        assert_eq!(order.subject.kind, SubjectKind::Order);
        assert_eq!(order.route.len(), 5);
        assert!(catalog
            .values()
            .skip(1)
            .all(|entry| entry.subject.kind == SubjectKind::Vehicle));
    }

    #[test]
    fn vehicle_on_a_single_stop_is_rejected() {
        let result = vehicle(
            "TRK999",
            driver("Jane Roe", "+91 98100 00009", "DL 03 CK 0000"),
            vec![Waypoint::new("Delhi", 28.6139, 77.2090)],
        );
        assert!(matches!(result, Err(RouteError::TooShort { waypoints: 1 })));
    }
}
