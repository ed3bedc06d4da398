use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

// Widens the prefilter box so float rounding never drops a boundary spot.
const BOX_EPSILON_DEG: f64 = 1e-6;

// Slack on the radius comparison; haversine rounding puts a point exactly on the
// circle a few ulps outside it.
const RADIUS_TOLERANCE_KM: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Result<Self, AppError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(AppError::InvalidInput(format!(
                "Latitude must be between -90 and 90, got {lat}"
            )));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(AppError::InvalidInput(format!(
                "Longitude must be between -180 and 180, got {lng}"
            )));
        }

        Ok(Self { lat, lng })
    }

    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        haversine_km(self.lat, self.lng, other.lat, other.lng)
    }
}

/// Great-circle distance in kilometres between two points given in degrees.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lng2 - lng1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// A validated search circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusFilter {
    pub center: Coordinates,
    pub radius_km: f64,
}

impl RadiusFilter {
    pub fn new(lat: f64, lng: f64, radius_km: f64) -> Result<Self, AppError> {
        let center = Coordinates::new(lat, lng)?;
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(AppError::InvalidInput(format!(
                "Radius must be a positive number of kilometres, got {radius_km}"
            )));
        }

        Ok(Self { center, radius_km })
    }

    /// Inclusive: a point exactly `radius_km` away is inside.
    pub fn contains(&self, point: &Coordinates) -> bool {
        self.includes_distance(self.center.distance_km(point))
    }

    pub fn includes_distance(&self, distance_km: f64) -> bool {
        distance_km <= self.max_distance_km()
    }

    /// The largest computed distance still counted as inside the circle.
    pub fn max_distance_km(&self) -> f64 {
        self.radius_km + RADIUS_TOLERANCE_KM
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::around(self.center, self.radius_km)
    }
}

/// Latitude/longitude rectangle that fully contains a search circle, used to
/// narrow candidates before the exact distance check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub fn around(center: Coordinates, radius_km: f64) -> Self {
        let angular = radius_km / EARTH_RADIUS_KM;
        let delta_lat = angular.to_degrees();

        let min_lat = center.lat - delta_lat - BOX_EPSILON_DEG;
        let max_lat = center.lat + delta_lat + BOX_EPSILON_DEG;

        // Circle touches a pole or crosses the antimeridian: keep every longitude.
        if min_lat <= -90.0 || max_lat >= 90.0 || angular >= std::f64::consts::FRAC_PI_2 {
            return Self {
                min_lat: min_lat.max(-90.0),
                max_lat: max_lat.min(90.0),
                min_lng: -180.0,
                max_lng: 180.0,
            };
        }

        let delta_lng = (angular.sin() / center.lat.to_radians().cos())
            .clamp(-1.0, 1.0)
            .asin()
            .to_degrees();
        let min_lng = center.lng - delta_lng - BOX_EPSILON_DEG;
        let max_lng = center.lng + delta_lng + BOX_EPSILON_DEG;

        if min_lng < -180.0 || max_lng > 180.0 {
            return Self {
                min_lat,
                max_lat,
                min_lng: -180.0,
                max_lng: 180.0,
            };
        }

        Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        }
    }

    pub fn contains(&self, point: &Coordinates) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lng..=self.max_lng).contains(&point.lng)
    }
}
