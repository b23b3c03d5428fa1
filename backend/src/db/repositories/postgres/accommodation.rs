use async_trait::async_trait;
use diesel::dsl::{exists, sql};
use diesel::prelude::*;
use diesel::sql_types::Bool;

use super::models::*;
use super::schema::*;
use super::{
    ensure_accommodation, ensure_user, load_accommodation, load_accommodations, map_diesel_error,
    or_missing, PostgresRepository,
};
use crate::api::{
    Accommodation, AccommodationCategory, AccommodationDetails, AccommodationImage, ImageId,
    NewAccommodation, NewCategory, NewImage, Page, SearchCriteria, SearchHit, SortOrder,
};
use crate::db::repository::{AccommodationRepository, RepositoryError, RepositoryResult};
use crate::services::search::{escape_like, search_in_memory};

/// Accommodations joined with their location and category, filtered by every
/// scalar criterion plus the proximity bounding box.
macro_rules! filtered_accommodations {
    ($criteria:expr) => {{
        let criteria: &SearchCriteria = $criteria;
        let mut query = accommodations::table
            .inner_join(accommodation_locations::table)
            .left_join(accommodation_categories::table)
            .into_boxed();

        if let Some(min) = criteria.min_price {
            query = query.filter(accommodations::price_per_night.ge(min));
        }
        if let Some(max) = criteria.max_price {
            query = query.filter(accommodations::price_per_night.le(max));
        }
        if let Some(beds) = criteria.min_beds {
            query = query.filter(accommodations::num_of_beds.ge(beds));
        }
        if let Some(baths) = criteria.min_bathrooms {
            query = query.filter(accommodations::num_of_bathrooms.ge(baths));
        }
        if let Some(bedrooms) = criteria.min_bedrooms {
            query = query.filter(accommodations::num_of_bedrooms.ge(bedrooms));
        }
        if let Some(guests) = criteria.guests {
            query = query.filter(accommodations::num_of_guests.ge(guests));
        }
        if let Some(city) = &criteria.city {
            query = query.filter(
                accommodation_locations::city.ilike(format!("%{}%", escape_like(city))),
            );
        }
        if let Some(category) = &criteria.category {
            query = query.filter(accommodation_categories::description.ilike(escape_like(category)));
        }
        if let Some(near) = &criteria.near {
            let bbox = near.bounding_box();
            query = query
                .filter(
                    accommodation_locations::latitude
                        .between(bbox.min_latitude, bbox.max_latitude),
                )
                .filter(
                    accommodation_locations::longitude
                        .between(bbox.min_longitude, bbox.max_longitude),
                );
        }
        query
    }};
}

fn search(conn: &mut PgConnection, criteria: &SearchCriteria) -> RepositoryResult<Page<SearchHit>> {
    if criteria.near.is_some() {
        // Exact distances are computed in Rust; SQL only narrows to the box.
        let rows = filtered_accommodations!(criteria)
            .select(AccommodationRow::as_select())
            .load::<AccommodationRow>(conn)
            .map_err(map_diesel_error)?;
        log::debug!("Proximity search: {} candidates inside bounding box", rows.len());
        let candidates = load_accommodations(conn, rows)?;
        return Ok(search_in_memory(candidates, criteria));
    }

    let total: i64 = filtered_accommodations!(criteria)
        .count()
        .get_result(conn)
        .map_err(map_diesel_error)?;

    let query = filtered_accommodations!(criteria);
    let query = match criteria.sort {
        SortOrder::PriceAsc => query.order((
            accommodations::price_per_night.asc(),
            accommodations::register_number.asc(),
        )),
        SortOrder::PriceDesc => query.order((
            accommodations::price_per_night.desc(),
            accommodations::register_number.asc(),
        )),
        SortOrder::Newest | SortOrder::Distance => query.order((
            accommodations::created_at.desc(),
            accommodations::register_number.asc(),
        )),
    };
    let rows = query
        .select(AccommodationRow::as_select())
        .limit(criteria.size as i64)
        .offset(criteria.offset() as i64)
        .load::<AccommodationRow>(conn)
        .map_err(map_diesel_error)?;

    let items = load_accommodations(conn, rows)?
        .into_iter()
        .map(|accommodation| SearchHit {
            accommodation,
            distance_km: None,
        })
        .collect();
    Ok(Page::new(items, criteria.page, criteria.size, total.max(0) as u64))
}

fn ensure_category(
    conn: &mut PgConnection,
    op: &'static str,
    category_id: Option<i64>,
) -> RepositoryResult<()> {
    if let Some(id) = category_id {
        let found: bool = diesel::select(exists(
            accommodation_categories::table.filter(accommodation_categories::category_id.eq(id)),
        ))
        .get_result(conn)
        .map_err(map_diesel_error)?;
        if !found {
            return Err(RepositoryError::missing(op, "category", id));
        }
    }
    Ok(())
}

fn location_row(details: &AccommodationDetails) -> NewLocationRow {
    NewLocationRow {
        city: details.location.city.clone(),
        country: details.location.country.clone(),
        address: details.location.address.clone(),
        latitude: details.location.latitude,
        longitude: details.location.longitude,
    }
}

#[async_trait]
impl AccommodationRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            diesel::select(sql::<Bool>("TRUE"))
                .get_result::<bool>(conn)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn create_accommodation(
        &self,
        accommodation: NewAccommodation,
    ) -> RepositoryResult<Accommodation> {
        const OP: &str = "create_accommodation";
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let NewAccommodation {
                    register_number,
                    details,
                } = accommodation;

                let taken: bool = diesel::select(exists(
                    accommodations::table.filter(accommodations::register_number.eq(&register_number)),
                ))
                .get_result(tx)
                .map_err(map_diesel_error)?;
                if taken {
                    return Err(RepositoryError::conflict_on(
                        OP,
                        "accommodation",
                        &register_number,
                        format!("Register number {} already exists", register_number),
                    ));
                }
                ensure_user(tx, OP, details.host_id)?;
                let category_id = details.category_id.map(|id| id.0);
                ensure_category(tx, OP, category_id)?;

                let location_id: i64 = diesel::insert_into(accommodation_locations::table)
                    .values(&location_row(&details))
                    .returning(accommodation_locations::location_id)
                    .get_result(tx)
                    .map_err(map_diesel_error)?;

                diesel::insert_into(accommodations::table)
                    .values(&NewAccommodationRow {
                        register_number: register_number.clone(),
                        host_id: details.host_id.0,
                        num_of_beds: details.num_of_beds,
                        num_of_bathrooms: details.num_of_bathrooms,
                        num_of_bedrooms: details.num_of_bedrooms,
                        price_per_night: details.price_per_night,
                        num_of_guests: details.num_of_guests,
                        area: details.area,
                        category_id,
                        location_id,
                    })
                    .execute(tx)
                    .map_err(|e| map_diesel_error(e).with_operation(OP))?;

                load_accommodation(tx, OP, &register_number)
            })
        })
        .await
    }

    async fn get_accommodation(&self, register_number: &str) -> RepositoryResult<Accommodation> {
        let register_number = register_number.to_string();
        self.with_conn(move |conn| load_accommodation(conn, "get_accommodation", &register_number))
            .await
    }

    async fn list_accommodations(&self) -> RepositoryResult<Vec<Accommodation>> {
        self.with_conn(|conn| {
            let rows = accommodations::table
                .order(accommodations::register_number.asc())
                .select(AccommodationRow::as_select())
                .load::<AccommodationRow>(conn)
                .map_err(map_diesel_error)?;
            load_accommodations(conn, rows)
        })
        .await
    }

    async fn list_accommodations_by_city(&self, city: &str) -> RepositoryResult<Vec<Accommodation>> {
        let pattern = escape_like(city.trim());
        self.with_conn(move |conn| {
            let rows = accommodations::table
                .inner_join(accommodation_locations::table)
                .filter(accommodation_locations::city.ilike(&pattern))
                .order(accommodations::register_number.asc())
                .select(AccommodationRow::as_select())
                .load::<AccommodationRow>(conn)
                .map_err(map_diesel_error)?;
            load_accommodations(conn, rows)
        })
        .await
    }

    async fn update_accommodation(
        &self,
        register_number: &str,
        details: AccommodationDetails,
    ) -> RepositoryResult<Accommodation> {
        const OP: &str = "update_accommodation";
        let register_number = register_number.to_string();
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let location_id: i64 = accommodations::table
                    .find(&register_number)
                    .select(accommodations::location_id)
                    .first(tx)
                    .map_err(or_missing(OP, "accommodation", &register_number))?;
                ensure_user(tx, OP, details.host_id)?;
                let category_id = details.category_id.map(|id| id.0);
                ensure_category(tx, OP, category_id)?;

                diesel::update(accommodation_locations::table.find(location_id))
                    .set(&location_row(&details))
                    .execute(tx)
                    .map_err(map_diesel_error)?;

                diesel::update(accommodations::table.find(&register_number))
                    .set(&AccommodationChangeset {
                        host_id: details.host_id.0,
                        num_of_beds: details.num_of_beds,
                        num_of_bathrooms: details.num_of_bathrooms,
                        num_of_bedrooms: details.num_of_bedrooms,
                        price_per_night: details.price_per_night,
                        num_of_guests: details.num_of_guests,
                        area: details.area,
                        category_id,
                    })
                    .execute(tx)
                    .map_err(map_diesel_error)?;

                load_accommodation(tx, OP, &register_number)
            })
        })
        .await
    }

    async fn delete_accommodation(&self, register_number: &str) -> RepositoryResult<()> {
        const OP: &str = "delete_accommodation";
        let register_number = register_number.to_string();
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let location_id: i64 = accommodations::table
                    .find(&register_number)
                    .select(accommodations::location_id)
                    .for_update()
                    .first(tx)
                    .map_err(or_missing(OP, "accommodation", &register_number))?;

                let booked: bool = diesel::select(exists(
                    bookings::table.filter(bookings::register_number.eq(&register_number)),
                ))
                .get_result(tx)
                .map_err(map_diesel_error)?;
                if booked {
                    return Err(RepositoryError::conflict_on(
                        OP,
                        "accommodation",
                        &register_number,
                        format!("Accommodation {} still has bookings", register_number),
                    ));
                }

                let image_ids: Vec<i64> = diesel::delete(
                    accommodation_image_links::table
                        .filter(accommodation_image_links::register_number.eq(&register_number)),
                )
                .returning(accommodation_image_links::image_id)
                .get_results(tx)
                .map_err(map_diesel_error)?;
                if !image_ids.is_empty() {
                    diesel::delete(
                        accommodation_images::table
                            .filter(accommodation_images::image_id.eq_any(image_ids)),
                    )
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                }

                diesel::delete(
                    accommodation_reviews::table
                        .filter(accommodation_reviews::register_number.eq(&register_number)),
                )
                .execute(tx)
                .map_err(map_diesel_error)?;

                diesel::delete(accommodations::table.find(&register_number))
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                diesel::delete(accommodation_locations::table.find(location_id))
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                Ok(())
            })
        })
        .await
    }

    async fn search_accommodations(
        &self,
        criteria: &SearchCriteria,
    ) -> RepositoryResult<Page<SearchHit>> {
        let criteria = criteria.clone();
        self.with_conn(move |conn| search(conn, &criteria)).await
    }

    async fn attach_image(
        &self,
        register_number: &str,
        image: NewImage,
    ) -> RepositoryResult<AccommodationImage> {
        const OP: &str = "attach_image";
        let register_number = register_number.to_string();
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                ensure_accommodation(tx, OP, &register_number)?;

                let inserted: ImageRow = diesel::insert_into(accommodation_images::table)
                    .values(accommodation_images::url.eq(&image.url))
                    .returning(ImageRow::as_returning())
                    .get_result(tx)
                    .map_err(map_diesel_error)?;

                diesel::insert_into(accommodation_image_links::table)
                    .values((
                        accommodation_image_links::register_number.eq(&register_number),
                        accommodation_image_links::image_id.eq(inserted.image_id),
                    ))
                    .execute(tx)
                    .map_err(map_diesel_error)?;

                Ok(inserted.into())
            })
        })
        .await
    }

    async fn list_images(&self, register_number: &str) -> RepositoryResult<Vec<AccommodationImage>> {
        let register_number = register_number.to_string();
        self.with_conn(move |conn| {
            ensure_accommodation(conn, "list_images", &register_number)?;
            let rows = accommodation_image_links::table
                .inner_join(accommodation_images::table)
                .filter(accommodation_image_links::register_number.eq(&register_number))
                .order(accommodation_images::image_id.asc())
                .select(ImageRow::as_select())
                .load::<ImageRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await
    }

    async fn remove_image(&self, register_number: &str, image_id: ImageId) -> RepositoryResult<()> {
        const OP: &str = "remove_image";
        let register_number = register_number.to_string();
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                ensure_accommodation(tx, OP, &register_number)?;

                let unlinked = diesel::delete(
                    accommodation_image_links::table
                        .filter(accommodation_image_links::register_number.eq(&register_number))
                        .filter(accommodation_image_links::image_id.eq(image_id.0)),
                )
                .execute(tx)
                .map_err(map_diesel_error)?;
                if unlinked == 0 {
                    return Err(RepositoryError::missing(OP, "image", image_id));
                }

                diesel::delete(accommodation_images::table.find(image_id.0))
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                Ok(())
            })
        })
        .await
    }

    async fn list_categories(&self) -> RepositoryResult<Vec<AccommodationCategory>> {
        self.with_conn(|conn| {
            let rows = accommodation_categories::table
                .order(accommodation_categories::category_id.asc())
                .select(CategoryRow::as_select())
                .load::<CategoryRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await
    }

    async fn create_category(
        &self,
        category: NewCategory,
    ) -> RepositoryResult<AccommodationCategory> {
        let description = category.description.trim().to_string();
        self.with_conn(move |conn| {
            diesel::insert_into(accommodation_categories::table)
                .values(accommodation_categories::description.eq(&description))
                .returning(CategoryRow::as_returning())
                .get_result::<CategoryRow>(conn)
                .map(Into::into)
                .map_err(|e| match map_diesel_error(e) {
                    RepositoryError::Conflict { .. } => RepositoryError::conflict_on(
                        "create_category",
                        "category",
                        &description,
                        format!("Category {} already exists", description),
                    ),
                    other => other,
                })
        })
        .await
    }
}
