// src/jobs/services/geo.rs
//! Great-circle distance on a spherical Earth

/// Equatorial radius in metres
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Haversine distance in metres between two `[longitude, latitude]` points
pub fn haversine_distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    let [lng1, lat1] = a;
    let [lng2, lat2] = b;

    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Latitude/longitude box that contains every point within `radius_m` of `center`.
/// Used to narrow the SQL scan before the exact distance check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub fn around(center: [f64; 2], radius_m: f64) -> Self {
        let [lng, lat] = center;
        let lat_delta = (radius_m / EARTH_RADIUS_M).to_degrees();

        let min_lat = (lat - lat_delta).max(-90.0);
        let max_lat = (lat + lat_delta).min(90.0);

        // Widest longitude reach of the circle, which lies poleward of the centre.
        // Once the circle covers a pole every longitude qualifies.
        let angular = radius_m / EARTH_RADIUS_M;
        let cos_lat = lat.to_radians().cos();
        let lng_delta = if min_lat <= -90.0 || max_lat >= 90.0 || angular.sin() >= cos_lat {
            180.0
        } else {
            (angular.sin() / cos_lat).asin().to_degrees()
        };

        let (min_lng, max_lng) = if lng_delta >= 180.0 || lng - lng_delta < -180.0 || lng + lng_delta > 180.0 {
            (-180.0, 180.0)
        } else {
            (lng - lng_delta, lng + lng_delta)
        };

        Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance() {
        assert_eq!(haversine_distance([151.2093, -33.8688], [151.2093, -33.8688]), 0.0);
    }

    #[test]
    fn test_sydney_to_melbourne() {
        // Roughly 714 km apart
        let d = haversine_distance([151.2093, -33.8688], [144.9631, -37.8136]);
        assert!((700_000.0..730_000.0).contains(&d), "got {}", d);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let d = haversine_distance([0.0, 0.0], [0.0, 1.0]);
        assert!((d - 111_319.49).abs() < 1.0, "got {}", d);
    }

    #[test]
    fn test_bounding_box_contains_radius() {
        let center = [151.2093, -33.8688];
        let bbox = BoundingBox::around(center, 10_000.0);
        assert!(bbox.min_lat < -33.8688 && bbox.max_lat > -33.8688);
        // A point 9km north sits inside the box
        let north = [151.2093, -33.8688 + 9_000.0 / 111_319.49];
        assert!(north[1] < bbox.max_lat);
    }

    #[test]
    fn test_bounding_box_keeps_poleward_points_at_high_latitude() {
        // At 60N the circle bulges east-west beyond radius / cos(lat)
        let center = [0.0, 60.0];
        let job = [18.1, 61.26];
        let radius = 1_000_000.0;
        assert!(haversine_distance(center, job) <= radius);

        let bbox = BoundingBox::around(center, radius);
        assert!(job[0] <= bbox.max_lng, "max_lng {}", bbox.max_lng);
        assert!(job[1] <= bbox.max_lat);
    }

    #[test]
    fn test_bounding_box_covers_sampled_circle_edge() {
        for center in [[0.0, 0.0], [25.0, 45.0], [-70.0, -55.0], [10.0, 75.0]] {
            let radius = 800_000.0;
            let bbox = BoundingBox::around(center, radius);
            for lng_step in -400..=400 {
                let lng = center[0] + lng_step as f64 * 0.1;
                for lat_step in -120..=120 {
                    let lat = center[1] + lat_step as f64 * 0.1;
                    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                        continue;
                    }
                    if haversine_distance(center, [lng, lat]) <= radius {
                        assert!(
                            lng >= bbox.min_lng && lng <= bbox.max_lng && lat >= bbox.min_lat && lat <= bbox.max_lat,
                            "{:?} escapes box {:?} around {:?}",
                            [lng, lat],
                            bbox,
                            center
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_bounding_box_full_longitude_when_circle_covers_pole() {
        let bbox = BoundingBox::around([0.0, 85.0], 700_000.0);
        assert_eq!((bbox.min_lng, bbox.max_lng), (-180.0, 180.0));
        assert_eq!(bbox.max_lat, 90.0);
    }

    #[test]
    fn test_bounding_box_wraps_to_full_longitude_near_antimeridian() {
        let bbox = BoundingBox::around([179.9, 0.0], 50_000.0);
        assert_eq!((bbox.min_lng, bbox.max_lng), (-180.0, 180.0));
    }
}
