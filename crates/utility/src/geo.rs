use itertools::Itertools;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

fn to_radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

pub fn haversine_distance(
    latitude_1: f64,
    longitude_1: f64,
    latitude_2: f64,
    longitude_2: f64,
) -> f64 {
    let lat1_rad = to_radians(latitude_1);
    let lon1_rad = to_radians(longitude_1);
    let lat2_rad = to_radians(latitude_2);
    let lon2_rad = to_radians(longitude_2);

    let dlat = lat2_rad - lat1_rad;
    let dlon = lon2_rad - lon1_rad;

    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Sums the great circle distances between consecutive `(latitude, longitude)`
/// points. This is the length of the straight legs, not of any road geometry.
pub fn path_length<I>(points: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    points
        .into_iter()
        .tuple_windows()
        .map(|((lat_1, lon_1), (lat_2, lon_2))| {
            haversine_distance(lat_1, lon_1, lat_2, lon_2)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point_has_no_distance() {
        assert_eq!(haversine_distance(26.1445, 91.7362, 26.1445, 91.7362), 0.0);
    }

    #[test]
    fn kolkata_to_delhi_is_roughly_thirteen_hundred_km() {
        let distance = haversine_distance(22.5726, 88.3639, 28.6139, 77.2090);
        assert!((1290.0..1320.0).contains(&distance), "{}", distance);
    }

    #[test]
    fn path_length_adds_up_legs() {
        let a = (26.1445, 91.7362);
        let b = (22.5726, 88.3639);
        let c = (25.5941, 85.1376);
        let expected =
            haversine_distance(a.0, a.1, b.0, b.1) + haversine_distance(b.0, b.1, c.0, c.1);
        assert!((path_length([a, b, c]) - expected).abs() < 1e-9);
    }

    #[test]
    fn path_length_of_single_point_is_zero() {
        assert_eq!(path_length([(28.6139, 77.2090)]), 0.0);
        assert_eq!(path_length(Vec::<(f64, f64)>::new()), 0.0);
    }
}
