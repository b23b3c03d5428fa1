use async_trait::async_trait;
use diesel::prelude::*;

use super::models::*;
use super::schema::*;
use super::{ensure_accommodation, ensure_user, map_diesel_error, or_missing, PostgresRepository};
use crate::api::{
    AccommodationReview, HostReview, HostReviewId, NewAccommodationReview, NewHostReview,
    ReviewId, ReviewUpdate, UserId,
};
use crate::db::repository::{RepositoryError, RepositoryResult, ReviewRepository};

#[async_trait]
impl ReviewRepository for PostgresRepository {
    async fn create_accommodation_review(
        &self,
        review: NewAccommodationReview,
    ) -> RepositoryResult<AccommodationReview> {
        const OP: &str = "create_accommodation_review";
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                ensure_accommodation(tx, OP, &review.register_number)?;
                ensure_user(tx, OP, review.user_id)?;
                diesel::insert_into(accommodation_reviews::table)
                    .values(&NewAccommodationReviewRow {
                        register_number: review.register_number,
                        user_id: review.user_id.0,
                        content: review.content,
                        stars: review.stars,
                    })
                    .returning(AccommodationReviewRow::as_returning())
                    .get_result::<AccommodationReviewRow>(tx)
                    .map(Into::into)
                    .map_err(map_diesel_error)
            })
        })
        .await
    }

    async fn get_accommodation_review(&self, id: ReviewId) -> RepositoryResult<AccommodationReview> {
        self.with_conn(move |conn| {
            accommodation_reviews::table
                .find(id.0)
                .select(AccommodationReviewRow::as_select())
                .first::<AccommodationReviewRow>(conn)
                .map(Into::into)
                .map_err(or_missing("get_accommodation_review", "review", id))
        })
        .await
    }

    async fn update_accommodation_review(
        &self,
        id: ReviewId,
        update: ReviewUpdate,
    ) -> RepositoryResult<AccommodationReview> {
        const OP: &str = "update_accommodation_review";
        self.with_conn(move |conn| {
            let target = accommodation_reviews::table.find(id.0);
            let row = if update.content.is_none() && update.stars.is_none() {
                target
                    .select(AccommodationReviewRow::as_select())
                    .first::<AccommodationReviewRow>(conn)
            } else {
                diesel::update(target)
                    .set(&ReviewChangeset {
                        content: update.content,
                        stars: update.stars,
                    })
                    .returning(AccommodationReviewRow::as_returning())
                    .get_result::<AccommodationReviewRow>(conn)
            };
            row.map(Into::into).map_err(or_missing(OP, "review", id))
        })
        .await
    }

    async fn delete_accommodation_review(&self, id: ReviewId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(accommodation_reviews::table.find(id.0))
                .execute(conn)
                .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(RepositoryError::missing(
                    "delete_accommodation_review",
                    "review",
                    id,
                ));
            }
            Ok(())
        })
        .await
    }

    async fn list_accommodation_reviews(
        &self,
        register_number: &str,
    ) -> RepositoryResult<Vec<AccommodationReview>> {
        let register_number = register_number.to_string();
        self.with_conn(move |conn| {
            ensure_accommodation(conn, "list_accommodation_reviews", &register_number)?;
            accommodation_reviews::table
                .filter(accommodation_reviews::register_number.eq(&register_number))
                .order(accommodation_reviews::review_id.asc())
                .select(AccommodationReviewRow::as_select())
                .load::<AccommodationReviewRow>(conn)
                .map(|rows| rows.into_iter().map(Into::into).collect())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn create_host_review(&self, review: NewHostReview) -> RepositoryResult<HostReview> {
        const OP: &str = "create_host_review";
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                ensure_user(tx, OP, review.host_id)?;
                ensure_user(tx, OP, review.reviewer_id)?;
                diesel::insert_into(host_reviews::table)
                    .values(&NewHostReviewRow {
                        host_id: review.host_id.0,
                        reviewer_id: review.reviewer_id.0,
                        content: review.content,
                        stars: review.stars,
                    })
                    .returning(HostReviewRow::as_returning())
                    .get_result::<HostReviewRow>(tx)
                    .map(Into::into)
                    .map_err(map_diesel_error)
            })
        })
        .await
    }

    async fn get_host_review(&self, id: HostReviewId) -> RepositoryResult<HostReview> {
        self.with_conn(move |conn| {
            host_reviews::table
                .find(id.0)
                .select(HostReviewRow::as_select())
                .first::<HostReviewRow>(conn)
                .map(Into::into)
                .map_err(or_missing("get_host_review", "host_review", id))
        })
        .await
    }

    async fn list_host_reviews(&self, host_id: UserId) -> RepositoryResult<Vec<HostReview>> {
        self.with_conn(move |conn| {
            ensure_user(conn, "list_host_reviews", host_id)?;
            host_reviews::table
                .filter(host_reviews::host_id.eq(host_id.0))
                .order(host_reviews::host_review_id.asc())
                .select(HostReviewRow::as_select())
                .load::<HostReviewRow>(conn)
                .map(|rows| rows.into_iter().map(Into::into).collect())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn delete_host_review(&self, id: HostReviewId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(host_reviews::table.find(id.0))
                .execute(conn)
                .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(RepositoryError::missing(
                    "delete_host_review",
                    "host_review",
                    id,
                ));
            }
            Ok(())
        })
        .await
    }
}
