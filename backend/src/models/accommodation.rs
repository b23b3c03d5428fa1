use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{CategoryId, ImageId, LocationId, UserId};
use crate::services::geo::GeoPoint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccommodationCategory {
    pub id: CategoryId,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub description: String,
}

/// Postal address and coordinates of an accommodation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccommodationLocation {
    pub id: LocationId,
    pub city: String,
    pub country: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl AccommodationLocation {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLocation {
    pub city: String,
    pub country: String,
    #[serde(default)]
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl NewLocation {
    pub fn into_location(self, id: LocationId) -> AccommodationLocation {
        AccommodationLocation {
            id,
            city: self.city,
            country: self.country,
            address: self.address,
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccommodationImage {
    pub id: ImageId,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewImage {
    pub url: String,
}

/// A listed accommodation, keyed by its official register number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accommodation {
    pub register_number: String,
    pub host_id: UserId,
    pub num_of_beds: i32,
    pub num_of_bathrooms: i32,
    pub num_of_bedrooms: i32,
    pub price_per_night: f64,
    pub num_of_guests: i32,
    pub area: f64,
    pub category: Option<AccommodationCategory>,
    pub location: AccommodationLocation,
    #[serde(default)]
    pub images: Vec<AccommodationImage>,
    pub created_at: DateTime<Utc>,
}

/// Mutable attributes of an accommodation, shared by creation and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccommodationDetails {
    pub host_id: UserId,
    pub num_of_beds: i32,
    pub num_of_bathrooms: i32,
    pub num_of_bedrooms: i32,
    pub price_per_night: f64,
    pub num_of_guests: i32,
    #[serde(default)]
    pub area: f64,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    pub location: NewLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAccommodation {
    pub register_number: String,
    #[serde(flatten)]
    pub details: AccommodationDetails,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accommodation_flattened_json() {
        let json = r#"{
            "register_number": "VUT-01",
            "host_id": 2,
            "num_of_beds": 3,
            "num_of_bathrooms": 1,
            "num_of_bedrooms": 2,
            "price_per_night": 80.5,
            "num_of_guests": 4,
            "location": {"city": "Oviedo", "country": "Spain", "latitude": 43.36, "longitude": -5.84}
        }"#;
        let acc: NewAccommodation = serde_json::from_str(json).unwrap();
        assert_eq!(acc.register_number, "VUT-01");
        assert_eq!(acc.details.host_id, UserId(2));
        assert_eq!(acc.details.area, 0.0);
        assert!(acc.details.category_id.is_none());
        assert_eq!(acc.details.location.address, "");
    }

    #[test]
    fn test_location_point() {
        let location = NewLocation {
            city: "Gijón".into(),
            country: "Spain".into(),
            address: String::new(),
            latitude: 43.53,
            longitude: -5.66,
        }
        .into_location(LocationId(5));
        let point = location.point();
        assert_eq!(point.latitude, 43.53);
        assert_eq!(point.longitude, -5.66);
        assert_eq!(location.id, LocationId(5));
    }
}
