//! Great-circle helpers on a spherical earth

/// Mean earth radius used for degree/kilometer conversion
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in degrees between two points given in degrees
pub fn locations_to_degrees(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lat2) = (lat1.to_radians(), lat2.to_radians());
    let dlon = (lon2 - lon1).to_radians();
    let (sin_lat1, cos_lat1) = lat1.sin_cos();
    let (sin_lat2, cos_lat2) = lat2.sin_cos();
    let (sin_dlon, cos_dlon) = dlon.sin_cos();

    // Vincenty's formula for the sphere, stable for small and antipodal distances
    let a = cos_lat2 * sin_dlon;
    let b = cos_lat1 * sin_lat2 - sin_lat1 * cos_lat2 * cos_dlon;
    let c = sin_lat1 * sin_lat2 + cos_lat1 * cos_lat2 * cos_dlon;
    a.hypot(b).atan2(c).to_degrees()
}

pub fn degrees_to_km(degrees: f64) -> f64 {
    degrees.to_radians() * EARTH_RADIUS_KM
}
