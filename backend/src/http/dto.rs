//! Request and response bodies that exist only at the HTTP boundary.
//!
//! Domain records (`User`, `Accommodation`, `Booking`, ...) already derive
//! Serialize/Deserialize and are used directly as bodies.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::AppError;
use crate::api::{SearchCriteria, SortOrder};
use crate::services::search::{Proximity, DEFAULT_PAGE_SIZE};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

/// `GET /bookings/between?from=YYYY-MM-DD&to=YYYY-MM-DD`
#[derive(Debug, Clone, Deserialize)]
pub struct DateRangeQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Flat query-string form of [`SearchCriteria`].
///
/// `latitude`, `longitude` and `radius_km` must be given together.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_beds: Option<i32>,
    pub min_bathrooms: Option<i32>,
    pub min_bedrooms: Option<i32>,
    pub guests: Option<i32>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_km: Option<f64>,
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<String>,
}

impl TryFrom<SearchQuery> for SearchCriteria {
    type Error = AppError;

    fn try_from(query: SearchQuery) -> Result<Self, Self::Error> {
        let near = match (query.latitude, query.longitude, query.radius_km) {
            (None, None, None) => None,
            (Some(latitude), Some(longitude), Some(radius_km)) => Some(Proximity {
                latitude,
                longitude,
                radius_km,
            }),
            _ => {
                return Err(AppError::BadRequest(
                    "latitude, longitude and radius_km must be given together".to_string(),
                ))
            }
        };
        let sort = match query.sort.as_deref() {
            Some(raw) => raw.parse::<SortOrder>().map_err(AppError::BadRequest)?,
            None => SortOrder::default(),
        };

        Ok(SearchCriteria {
            min_price: query.min_price,
            max_price: query.max_price,
            min_beds: query.min_beds,
            min_bathrooms: query.min_bathrooms,
            min_bedrooms: query.min_bedrooms,
            guests: query.guests,
            city: query.city,
            category: query.category,
            near,
            page: query.page.unwrap_or(0),
            size: query.size.unwrap_or(DEFAULT_PAGE_SIZE),
            sort,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_proximity_is_rejected() {
        let query = SearchQuery {
            latitude: Some(40.4),
            longitude: Some(-3.7),
            ..Default::default()
        };
        assert!(SearchCriteria::try_from(query).is_err());
    }

    #[test]
    fn test_query_maps_to_criteria() {
        let query = SearchQuery {
            city: Some("Madrid".into()),
            latitude: Some(40.4),
            longitude: Some(-3.7),
            radius_km: Some(5.0),
            sort: Some("distance".into()),
            ..Default::default()
        };
        let criteria = SearchCriteria::try_from(query).unwrap();
        assert_eq!(criteria.sort, SortOrder::Distance);
        assert_eq!(criteria.size, DEFAULT_PAGE_SIZE);
        assert_eq!(criteria.near.map(|n| n.radius_km), Some(5.0));
    }
}
