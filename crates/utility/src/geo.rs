pub const EARTH_RADIUS_KM: f64 = 6371.0;

fn to_radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

/// Smallest axis aligned box containing all given `(latitude, longitude)`
/// points, as `((min_lat, min_lon), (max_lat, max_lon))`.
/// Returns `None` for an empty input.
pub fn bounding_box<I>(points: I) -> Option<((f64, f64), (f64, f64))>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    points.into_iter().fold(None, |acc, (lat, lon)| match acc {
        None => Some(((lat, lon), (lat, lon))),
        Some(((min_lat, min_lon), (max_lat, max_lon))) => Some((
            (min_lat.min(lat), min_lon.min(lon)),
            (max_lat.max(lat), max_lon.max(lon)),
        )),
    })
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
