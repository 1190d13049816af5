use floodwatch_shared::{Coordinate, MapError};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers (haversine).
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1.0 for antipodal points.
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Arithmetic mean of latitudes and longitudes. No spherical correction, so
/// only meaningful at city scale and away from the antimeridian.
pub fn centroid(points: &[Coordinate]) -> Result<Coordinate, MapError> {
    if points.is_empty() {
        return Err(MapError::InvalidInput("centroid of an empty point set".into()));
    }
    let n = points.len() as f64;
    let (sum_lat, sum_lng) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat, lng + p.lng));
    Ok(Coordinate {
        lat: sum_lat / n,
        lng: sum_lng / n,
    })
}

/// Euclidean distance in degree space. A cheap proximity test for clustering,
/// not a distance metric.
#[inline]
pub fn planar_delta(a: Coordinate, b: Coordinate) -> f64 {
    let dlat = a.lat - b.lat;
    let dlng = a.lng - b.lng;
    (dlat * dlat + dlng * dlng).sqrt()
}

/// South-west and north-east corners of the points, or `None` if empty.
pub fn bounds(points: &[Coordinate]) -> Option<(Coordinate, Coordinate)> {
    let first = points.first()?;
    let mut sw = *first;
    let mut ne = *first;
    for p in points.iter().skip(1) {
        sw.lat = sw.lat.min(p.lat);
        sw.lng = sw.lng.min(p.lng);
        ne.lat = ne.lat.max(p.lat);
        ne.lng = ne.lng.max(p.lng);
    }
    Some((sw, ne))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn distance_is_zero_for_same_point() {
        let p = c(28.6139, 77.2090);
        assert_eq!(distance(p, p), 0.0);
    }

    #[test]
    fn distance_matches_known_city_pairs() {
        // Berlin to Paris, ~878 km.
        assert_close(distance(c(52.5200, 13.4050), c(48.8566, 2.3522)), 878.0, 5.0);
        // One degree of latitude, ~111.2 km.
        assert_close(distance(c(0.0, 0.0), c(1.0, 0.0)), 111.19, 0.01);
    }

    #[test]
    fn distance_handles_antipodes() {
        let d = distance(c(0.0, 0.0), c(0.0, 180.0));
        assert_close(d, std::f64::consts::PI * EARTH_RADIUS_KM, 1e-6);
    }

    #[test]
    fn delhi_shelter_is_about_100m_away() {
        let d = distance(c(28.6140, 77.2095), c(28.6139, 77.2090));
        assert!(d > 0.03 && d < 0.1, "got {d}");
    }

    #[test]
    fn centroid_is_mean() {
        let got = centroid(&[c(0.0, 0.0), c(2.0, 4.0), c(4.0, 2.0)]).unwrap();
        assert_close(got.lat, 2.0, 1e-12);
        assert_close(got.lng, 2.0, 1e-12);
    }

    #[test]
    fn centroid_of_nothing_is_rejected() {
        assert!(matches!(centroid(&[]), Err(MapError::InvalidInput(_))));
    }

    #[test]
    fn planar_delta_is_degree_space() {
        assert_close(planar_delta(c(0.0, 0.0), c(3.0, 4.0)), 5.0, 1e-12);
    }

    #[test]
    fn bounds_cover_all_points() {
        let (sw, ne) = bounds(&[c(1.0, 5.0), c(-2.0, 7.0), c(3.0, -1.0)]).unwrap();
        assert_eq!((sw.lat, sw.lng), (-2.0, -1.0));
        assert_eq!((ne.lat, ne.lng), (3.0, 7.0));
        assert!(bounds(&[]).is_none());
    }
}
