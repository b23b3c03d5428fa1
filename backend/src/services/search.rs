//! Multi-criteria accommodation search.
//!
//! A [`SearchCriteria`] is a conjunction of optional predicates: only the
//! criteria that are present restrict the result set. Proximity filtering
//! uses the Haversine distance from [`crate::services::geo`].
//!
//! Repositories either evaluate everything in memory through
//! [`search_in_memory`], or push the scalar predicates (and a bounding box) to
//! SQL and finish the proximity filter here.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::api::Accommodation;
use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult};
use crate::services::geo::{haversine_km, BoundingBox, GeoPoint};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Result ordering. Ties are always broken by register number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Most recently listed first
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    /// Closest first; requires a proximity filter
    Distance,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::PriceAsc => "price_asc",
            SortOrder::PriceDesc => "price_desc",
            SortOrder::Distance => "distance",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "newest" | "" => Ok(Self::Newest),
            "price_asc" | "price" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            "distance" => Ok(Self::Distance),
            other => Err(format!("Unknown sort order: {}", other)),
        }
    }
}

/// Circle around a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Proximity {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
}

impl Proximity {
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::around(self.center(), self.radius_km)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_beds: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_bathrooms: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_bedrooms: Option<i32>,
    /// Number of travellers the accommodation must host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guests: Option<i32>,
    /// Case-insensitive substring of the city
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Case-insensitive category description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub near: Option<Proximity>,
    /// Zero-based page index
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub size: u32,
    #[serde(default)]
    pub sort: SortOrder,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            min_price: None,
            max_price: None,
            min_beds: None,
            min_bathrooms: None,
            min_bedrooms: None,
            guests: None,
            city: None,
            category: None,
            near: None,
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: SortOrder::default(),
        }
    }
}

fn invalid(field: &str, message: impl Into<String>) -> RepositoryError {
    RepositoryError::validation_with_context(
        message,
        ErrorContext::new("search_accommodations").with_details(format!("field={}", field)),
    )
}

impl SearchCriteria {
    /// Trim text filters and drop the ones left empty.
    pub fn normalized(mut self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }
        self.city = clean(self.city);
        self.category = clean(self.category);
        self
    }

    pub fn validate(&self) -> RepositoryResult<()> {
        for (field, price) in [("min_price", self.min_price), ("max_price", self.max_price)] {
            if let Some(price) = price {
                if !price.is_finite() || price < 0.0 {
                    return Err(invalid(field, format!("{} must not be negative", field)));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(invalid(
                    "min_price",
                    format!("min_price ({}) is greater than max_price ({})", min, max),
                ));
            }
        }
        for (field, count) in [
            ("min_beds", self.min_beds),
            ("min_bathrooms", self.min_bathrooms),
            ("min_bedrooms", self.min_bedrooms),
        ] {
            if count.is_some_and(|c| c < 0) {
                return Err(invalid(field, format!("{} must not be negative", field)));
            }
        }
        if self.guests.is_some_and(|g| g < 1) {
            return Err(invalid("guests", "guests must be at least 1"));
        }
        if let Some(near) = &self.near {
            if !near.center().is_valid() {
                return Err(invalid(
                    "near",
                    format!(
                        "coordinates ({}, {}) are out of range",
                        near.latitude, near.longitude
                    ),
                ));
            }
            if !near.radius_km.is_finite() || near.radius_km <= 0.0 {
                return Err(invalid("radius_km", "radius_km must be positive"));
            }
        }
        if self.size == 0 || self.size > MAX_PAGE_SIZE {
            return Err(invalid(
                "size",
                format!("size must be between 1 and {}", MAX_PAGE_SIZE),
            ));
        }
        if self.sort == SortOrder::Distance && self.near.is_none() {
            return Err(invalid(
                "sort",
                "sorting by distance requires latitude, longitude and radius_km",
            ));
        }
        Ok(())
    }

    /// Evaluate every predicate except proximity.
    pub fn matches_attributes(&self, accommodation: &Accommodation) -> bool {
        let at_least = |min: Option<i32>, value: i32| min.map_or(true, |m| value >= m);

        self.min_price
            .map_or(true, |min| accommodation.price_per_night >= min)
            && self
                .max_price
                .map_or(true, |max| accommodation.price_per_night <= max)
            && at_least(self.min_beds, accommodation.num_of_beds)
            && at_least(self.min_bathrooms, accommodation.num_of_bathrooms)
            && at_least(self.min_bedrooms, accommodation.num_of_bedrooms)
            && at_least(self.guests, accommodation.num_of_guests)
            && self.city.as_deref().map_or(true, |city| {
                accommodation
                    .location
                    .city
                    .to_lowercase()
                    .contains(&city.to_lowercase())
            })
            && self.category.as_deref().map_or(true, |category| {
                accommodation
                    .category
                    .as_ref()
                    .is_some_and(|c| c.description.to_lowercase() == category.to_lowercase())
            })
    }

    /// Distance from the search centre, if a proximity filter is set.
    pub fn distance_to(&self, accommodation: &Accommodation) -> Option<f64> {
        self.near
            .map(|near| haversine_km(near.center(), accommodation.location.point()))
    }

    pub fn offset(&self) -> usize {
        self.page as usize * self.size as usize
    }
}

/// An accommodation matched by a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub accommodation: Accommodation,
    /// Kilometres from the search centre when searching by proximity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

/// One page of results plus totals for the whole result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u32, size: u32, total_elements: u64) -> Self {
        let total_pages = if size == 0 {
            0
        } else {
            total_elements.div_ceil(size as u64)
        };
        Self {
            items,
            page,
            size,
            total_elements,
            total_pages,
        }
    }

    pub fn is_last(&self) -> bool {
        self.page as u64 + 1 >= self.total_pages
    }
}

/// Filter, sort and paginate an in-memory candidate set.
pub fn search_in_memory<I>(candidates: I, criteria: &SearchCriteria) -> Page<SearchHit>
where
    I: IntoIterator<Item = Accommodation>,
{
    let mut hits: Vec<SearchHit> = candidates
        .into_iter()
        .filter(|acc| criteria.matches_attributes(acc))
        .filter_map(|accommodation| match criteria.near {
            Some(near) => {
                let distance = haversine_km(near.center(), accommodation.location.point());
                (distance <= near.radius_km).then_some(SearchHit {
                    accommodation,
                    distance_km: Some(distance),
                })
            }
            None => Some(SearchHit {
                accommodation,
                distance_km: None,
            }),
        })
        .collect();

    sort_hits(&mut hits, criteria.sort);
    paginate(hits, criteria)
}

pub fn sort_hits(hits: &mut [SearchHit], order: SortOrder) {
    hits.sort_by(|a, b| {
        let (x, y) = (&a.accommodation, &b.accommodation);
        let primary = match order {
            SortOrder::Newest => y.created_at.cmp(&x.created_at),
            SortOrder::PriceAsc => x.price_per_night.total_cmp(&y.price_per_night),
            SortOrder::PriceDesc => y.price_per_night.total_cmp(&x.price_per_night),
            SortOrder::Distance => match (a.distance_km, b.distance_km) {
                (Some(da), Some(db)) => da.total_cmp(&db),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };
        primary.then_with(|| x.register_number.cmp(&y.register_number))
    });
}

/// Cut the requested page out of an already sorted result set.
pub fn paginate(hits: Vec<SearchHit>, criteria: &SearchCriteria) -> Page<SearchHit> {
    let total = hits.len() as u64;
    let items = hits
        .into_iter()
        .skip(criteria.offset())
        .take(criteria.size as usize)
        .collect();
    Page::new(items, criteria.page, criteria.size, total)
}

/// Escape `%`, `_` and `\` so user text matches literally inside a LIKE pattern.
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AccommodationCategory, AccommodationLocation, CategoryId, LocationId, UserId};
    use chrono::{Duration, TimeZone, Utc};

    fn accommodation(reg: &str, city: &str, price: f64, lat: f64, lon: f64, age_days: i64) -> Accommodation {
        Accommodation {
            register_number: reg.to_string(),
            host_id: UserId(1),
            num_of_beds: 2,
            num_of_bathrooms: 1,
            num_of_bedrooms: 1,
            price_per_night: price,
            num_of_guests: 3,
            area: 40.0,
            category: Some(AccommodationCategory {
                id: CategoryId(1),
                description: "Apartment".to_string(),
            }),
            location: AccommodationLocation {
                id: LocationId(1),
                city: city.to_string(),
                country: "Spain".to_string(),
                address: String::new(),
                latitude: lat,
                longitude: lon,
            },
            images: vec![],
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                - Duration::days(age_days),
        }
    }

    #[test]
    fn test_sort_order_parsing() {
        assert_eq!("price_desc".parse::<SortOrder>().unwrap(), SortOrder::PriceDesc);
        assert_eq!("".parse::<SortOrder>().unwrap(), SortOrder::Newest);
        assert!("cheapest".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_validate_price_range() {
        let criteria = SearchCriteria {
            min_price: Some(100.0),
            max_price: Some(50.0),
            ..Default::default()
        };
        assert!(criteria.validate().is_err());
    }

    #[test]
    fn test_validate_distance_sort_requires_center() {
        let criteria = SearchCriteria {
            sort: SortOrder::Distance,
            ..Default::default()
        };
        assert!(criteria.validate().is_err());
    }

    #[test]
    fn test_validate_page_size() {
        let mut criteria = SearchCriteria::default();
        criteria.size = 0;
        assert!(criteria.validate().is_err());
        criteria.size = MAX_PAGE_SIZE + 1;
        assert!(criteria.validate().is_err());
        criteria.size = MAX_PAGE_SIZE;
        assert!(criteria.validate().is_ok());
    }

    #[test]
    fn test_normalized_drops_blank_text() {
        let criteria = SearchCriteria {
            city: Some("  ".into()),
            category: Some(" Loft ".into()),
            ..Default::default()
        }
        .normalized();
        assert!(criteria.city.is_none());
        assert_eq!(criteria.category.as_deref(), Some("Loft"));
    }

    #[test]
    fn test_city_substring_is_case_insensitive() {
        let acc = accommodation("A", "San Sebastián", 80.0, 43.3, -1.98, 0);
        let criteria = SearchCriteria {
            city: Some("sebas".into()),
            ..Default::default()
        };
        assert!(criteria.matches_attributes(&acc));
    }

    #[test]
    fn test_category_requires_a_category() {
        let mut acc = accommodation("A", "Oviedo", 80.0, 43.36, -5.84, 0);
        let criteria = SearchCriteria {
            category: Some("apartment".into()),
            ..Default::default()
        };
        assert!(criteria.matches_attributes(&acc));
        acc.category = None;
        assert!(!criteria.matches_attributes(&acc));
    }

    #[test]
    fn test_price_and_capacity_filters() {
        let acc = accommodation("A", "Oviedo", 80.0, 43.36, -5.84, 0);
        let within = SearchCriteria {
            min_price: Some(80.0),
            max_price: Some(80.0),
            guests: Some(3),
            ..Default::default()
        };
        assert!(within.matches_attributes(&acc));
        let too_many = SearchCriteria {
            guests: Some(4),
            ..Default::default()
        };
        assert!(!too_many.matches_attributes(&acc));
    }

    #[test]
    fn test_proximity_search_sorted_by_distance() {
        let candidates = vec![
            accommodation("FAR", "Barcelona", 90.0, 41.3874, 2.1686, 0),
            accommodation("NEAR", "Getafe", 60.0, 40.3083, -3.7327, 0),
            accommodation("CENTER", "Madrid", 120.0, 40.4168, -3.7038, 0),
        ];
        let criteria = SearchCriteria {
            near: Some(Proximity {
                latitude: 40.4168,
                longitude: -3.7038,
                radius_km: 50.0,
            }),
            sort: SortOrder::Distance,
            ..Default::default()
        };
        let page = search_in_memory(candidates, &criteria);
        let regs: Vec<_> = page
            .items
            .iter()
            .map(|h| h.accommodation.register_number.as_str())
            .collect();
        assert_eq!(regs, vec!["CENTER", "NEAR"]);
        assert_eq!(page.total_elements, 2);
        assert_eq!(page.items[0].distance_km, Some(0.0));
    }

    #[test]
    fn test_newest_first_with_tie_break() {
        let candidates = vec![
            accommodation("B", "Oviedo", 50.0, 43.36, -5.84, 1),
            accommodation("C", "Oviedo", 50.0, 43.36, -5.84, 0),
            accommodation("A", "Oviedo", 50.0, 43.36, -5.84, 1),
        ];
        let page = search_in_memory(candidates, &SearchCriteria::default());
        let regs: Vec<_> = page
            .items
            .iter()
            .map(|h| h.accommodation.register_number.as_str())
            .collect();
        assert_eq!(regs, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_pagination_totals() {
        let candidates: Vec<_> = (0..5)
            .map(|i| accommodation(&format!("R{}", i), "Oviedo", 10.0 * (i + 1) as f64, 43.36, -5.84, 0))
            .collect();
        let criteria = SearchCriteria {
            page: 2,
            size: 2,
            sort: SortOrder::PriceAsc,
            ..Default::default()
        };
        let page = search_in_memory(candidates.clone(), &criteria);
        assert_eq!(page.total_elements, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].accommodation.register_number, "R4");
        assert!(page.is_last());

        let past_end = SearchCriteria {
            page: 7,
            ..criteria
        };
        assert!(search_in_memory(candidates, &past_end).items.is_empty());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("Gijón"), "Gijón");
    }
}
