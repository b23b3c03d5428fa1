use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;

use super::models::*;
use super::schema::*;
use super::{ensure_user, map_diesel_error, or_missing, PostgresRepository};
use crate::api::{
    NewUserConfiguration, SearchCriteria, SearchId, SearchRecord, User, UserChanges,
    UserConfiguration, UserConfigurationId, UserConfigurationUpdate, UserDraft, UserId,
};
use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult, UserRepository};
use crate::services::search::escape_like;

fn email_conflict(op: &'static str, email: &str) -> impl FnOnce(RepositoryError) -> RepositoryError {
    let email = email.to_string();
    move |err| match err {
        RepositoryError::Conflict { .. } => RepositoryError::conflict_on(
            op,
            "user",
            &email,
            format!("Email {} is already registered", email),
        ),
        other => other,
    }
}

fn load_user(conn: &mut PgConnection, op: &'static str, id: UserId) -> RepositoryResult<User> {
    app_users::table
        .find(id.0)
        .select(UserRow::as_select())
        .first::<UserRow>(conn)
        .map_err(or_missing(op, "user", id))?
        .into_user()
}

fn ensure_currency(
    conn: &mut PgConnection,
    op: &'static str,
    currency_id: Option<i64>,
) -> RepositoryResult<()> {
    if let Some(id) = currency_id {
        let found: bool = diesel::select(exists(
            app_currencies::table.filter(app_currencies::currency_id.eq(id)),
        ))
        .get_result(conn)
        .map_err(map_diesel_error)?;
        if !found {
            return Err(RepositoryError::missing(op, "currency", id));
        }
    }
    Ok(())
}

fn decode_search(user_id: UserId, row: SearchRow) -> RepositoryResult<SearchRecord> {
    let criteria: SearchCriteria = serde_json::from_value(row.criteria_json).map_err(|e| {
        RepositoryError::internal_with_context(
            format!("Failed to parse stored search criteria: {}", e),
            ErrorContext::new("list_searches")
                .with_entity("search")
                .with_entity_id(row.search_id),
        )
    })?;
    Ok(SearchRecord {
        id: SearchId(row.search_id),
        user_id,
        criteria,
        created_at: row.created_at,
    })
}

#[async_trait]
impl UserRepository for PostgresRepository {
    async fn create_user(&self, user: UserDraft) -> RepositoryResult<User> {
        let on_conflict = email_conflict("create_user", &user.email);
        self.with_conn(move |conn| {
            diesel::insert_into(app_users::table)
                .values(&NewUserRow {
                    name: user.name,
                    surname: user.surname,
                    email: user.email,
                    phone: user.phone,
                    password_hash: user.password_hash,
                    profile_image: user.profile_image,
                    role: user.role.as_str().to_string(),
                })
                .returning(UserRow::as_returning())
                .get_result::<UserRow>(conn)
                .map_err(map_diesel_error)?
                .into_user()
        })
        .await
        .map_err(on_conflict)
    }

    async fn get_user(&self, id: UserId) -> RepositoryResult<User> {
        self.with_conn(move |conn| load_user(conn, "get_user", id))
            .await
    }

    async fn get_user_by_email(&self, email: &str) -> RepositoryResult<User> {
        let email = email.trim().to_string();
        self.with_conn(move |conn| {
            app_users::table
                .filter(app_users::email.ilike(escape_like(&email)))
                .select(UserRow::as_select())
                .first::<UserRow>(conn)
                .map_err(or_missing("get_user_by_email", "user", &email))?
                .into_user()
        })
        .await
    }

    async fn find_credentials(&self, email: &str) -> RepositoryResult<Option<(User, String)>> {
        let email = email.trim().to_string();
        self.with_conn(move |conn| {
            let row = app_users::table
                .filter(app_users::email.ilike(escape_like(&email)))
                .select(UserRow::as_select())
                .first::<UserRow>(conn)
                .optional()
                .map_err(map_diesel_error)?;
            row.map(|row| {
                let hash = row.password_hash.clone();
                row.into_user().map(|user| (user, hash))
            })
            .transpose()
        })
        .await
    }

    async fn list_users(&self) -> RepositoryResult<Vec<User>> {
        self.with_conn(|conn| {
            app_users::table
                .order(app_users::user_id.asc())
                .select(UserRow::as_select())
                .load::<UserRow>(conn)
                .map_err(map_diesel_error)?
                .into_iter()
                .map(UserRow::into_user)
                .collect()
        })
        .await
    }

    async fn list_started_users(&self) -> RepositoryResult<Vec<User>> {
        self.with_conn(|conn| {
            app_users::table
                .inner_join(user_configurations::table)
                .order(app_users::user_id.asc())
                .select(UserRow::as_select())
                .load::<UserRow>(conn)
                .map_err(map_diesel_error)?
                .into_iter()
                .map(UserRow::into_user)
                .collect()
        })
        .await
    }

    async fn update_user(&self, id: UserId, changes: UserChanges) -> RepositoryResult<User> {
        const OP: &str = "update_user";
        let on_conflict = email_conflict(OP, changes.email.as_deref().unwrap_or_default());
        self.with_conn(move |conn| {
            let changeset = UserChangeset {
                name: changes.name,
                surname: changes.surname,
                email: changes.email,
                phone: changes.phone,
                password_hash: changes.password_hash,
                profile_image: changes.profile_image,
                role: changes.role.map(|r| r.as_str().to_string()),
            };
            if changeset.is_empty() {
                return load_user(conn, OP, id);
            }
            diesel::update(app_users::table.find(id.0))
                .set(&changeset)
                .returning(UserRow::as_returning())
                .get_result::<UserRow>(conn)
                .map_err(or_missing(OP, "user", id))?
                .into_user()
        })
        .await
        .map_err(on_conflict)
    }

    async fn delete_user(&self, id: UserId) -> RepositoryResult<()> {
        const OP: &str = "delete_user";
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                ensure_user(tx, OP, id)?;

                let hosts: bool = diesel::select(exists(
                    accommodations::table.filter(accommodations::host_id.eq(id.0)),
                ))
                .get_result(tx)
                .map_err(map_diesel_error)?;
                if hosts {
                    return Err(RepositoryError::conflict_on(
                        OP,
                        "user",
                        id,
                        format!("User {} still hosts accommodations", id),
                    ));
                }
                let books: bool =
                    diesel::select(exists(bookings::table.filter(bookings::user_id.eq(id.0))))
                        .get_result(tx)
                        .map_err(map_diesel_error)?;
                if books {
                    return Err(RepositoryError::conflict_on(
                        OP,
                        "user",
                        id,
                        format!("User {} still has bookings", id),
                    ));
                }

                diesel::delete(user_configurations::table.filter(user_configurations::user_id.eq(id.0)))
                    .execute(tx)
                    .map_err(map_diesel_error)?;

                let search_ids: Vec<i64> = diesel::delete(
                    user_search_history::table.filter(user_search_history::user_id.eq(id.0)),
                )
                .returning(user_search_history::search_id)
                .get_results(tx)
                .map_err(map_diesel_error)?;
                if !search_ids.is_empty() {
                    diesel::delete(searches::table.filter(searches::search_id.eq_any(search_ids)))
                        .execute(tx)
                        .map_err(map_diesel_error)?;
                }

                diesel::delete(
                    accommodation_reviews::table.filter(accommodation_reviews::user_id.eq(id.0)),
                )
                .execute(tx)
                .map_err(map_diesel_error)?;
                diesel::delete(
                    host_reviews::table.filter(
                        host_reviews::host_id
                            .eq(id.0)
                            .or(host_reviews::reviewer_id.eq(id.0)),
                    ),
                )
                .execute(tx)
                .map_err(map_diesel_error)?;

                diesel::delete(app_users::table.find(id.0))
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                Ok(())
            })
        })
        .await
    }

    async fn create_user_configuration(
        &self,
        config: NewUserConfiguration,
    ) -> RepositoryResult<UserConfiguration> {
        const OP: &str = "create_user_configuration";
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let user_id = config.user_id;
                ensure_user(tx, OP, user_id)?;
                let currency_id = config.currency_id.map(|id| id.0);
                ensure_currency(tx, OP, currency_id)?;

                diesel::insert_into(user_configurations::table)
                    .values(&NewUserConfigurationRow {
                        user_id: user_id.0,
                        currency_id,
                        language: config.language,
                        notifications_enabled: config.notifications_enabled,
                    })
                    .returning(UserConfigurationRow::as_returning())
                    .get_result::<UserConfigurationRow>(tx)
                    .map(Into::into)
                    .map_err(|e| match map_diesel_error(e) {
                        RepositoryError::Conflict { .. } => RepositoryError::conflict_on(
                            OP,
                            "user_configuration",
                            user_id,
                            format!("User {} already has a configuration", user_id),
                        ),
                        other => other,
                    })
            })
        })
        .await
    }

    async fn get_user_configuration(&self, user_id: UserId) -> RepositoryResult<UserConfiguration> {
        self.with_conn(move |conn| {
            user_configurations::table
                .filter(user_configurations::user_id.eq(user_id.0))
                .select(UserConfigurationRow::as_select())
                .first::<UserConfigurationRow>(conn)
                .map(Into::into)
                .map_err(or_missing("get_user_configuration", "user_configuration", user_id))
        })
        .await
    }

    async fn update_user_configuration(
        &self,
        user_id: UserId,
        update: UserConfigurationUpdate,
    ) -> RepositoryResult<UserConfiguration> {
        const OP: &str = "update_user_configuration";
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let currency_id = update.currency_id.map(|id| id.0);
                ensure_currency(tx, OP, currency_id)?;
                let target =
                    user_configurations::table.filter(user_configurations::user_id.eq(user_id.0));
                let changeset = UserConfigurationChangeset {
                    currency_id,
                    language: update.language,
                    notifications_enabled: update.notifications_enabled,
                };
                let row = if changeset.currency_id.is_none()
                    && changeset.language.is_none()
                    && changeset.notifications_enabled.is_none()
                {
                    target
                        .select(UserConfigurationRow::as_select())
                        .first::<UserConfigurationRow>(tx)
                } else {
                    diesel::update(target)
                        .set(&changeset)
                        .returning(UserConfigurationRow::as_returning())
                        .get_result::<UserConfigurationRow>(tx)
                };
                row.map(Into::into)
                    .map_err(or_missing(OP, "user_configuration", user_id))
            })
        })
        .await
    }

    async fn delete_user_configuration(&self, id: UserConfigurationId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(user_configurations::table.find(id.0))
                .execute(conn)
                .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(RepositoryError::missing(
                    "delete_user_configuration",
                    "user_configuration",
                    id,
                ));
            }
            Ok(())
        })
        .await
    }

    async fn delete_user_configuration_by_user(&self, user_id: UserId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(
                user_configurations::table.filter(user_configurations::user_id.eq(user_id.0)),
            )
            .execute(conn)
            .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(RepositoryError::missing(
                    "delete_user_configuration_by_user",
                    "user_configuration",
                    user_id,
                ));
            }
            Ok(())
        })
        .await
    }

    async fn record_search(
        &self,
        user_id: UserId,
        criteria: &SearchCriteria,
    ) -> RepositoryResult<SearchRecord> {
        const OP: &str = "record_search";
        let criteria_json = serde_json::to_value(criteria).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Failed to serialize search criteria: {}", e),
                ErrorContext::new(OP),
            )
        })?;
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                ensure_user(tx, OP, user_id)?;
                let row: SearchRow = diesel::insert_into(searches::table)
                    .values(searches::criteria_json.eq(&criteria_json))
                    .returning(SearchRow::as_returning())
                    .get_result(tx)
                    .map_err(map_diesel_error)?;
                diesel::insert_into(user_search_history::table)
                    .values((
                        user_search_history::user_id.eq(user_id.0),
                        user_search_history::search_id.eq(row.search_id),
                    ))
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                decode_search(user_id, row)
            })
        })
        .await
    }

    async fn list_searches(&self, user_id: UserId) -> RepositoryResult<Vec<SearchRecord>> {
        self.with_conn(move |conn| {
            ensure_user(conn, "list_searches", user_id)?;
            searches::table
                .inner_join(user_search_history::table)
                .filter(user_search_history::user_id.eq(user_id.0))
                .order((searches::created_at.desc(), searches::search_id.desc()))
                .select(SearchRow::as_select())
                .load::<SearchRow>(conn)
                .map_err(map_diesel_error)?
                .into_iter()
                .map(|row| decode_search(user_id, row))
                .collect()
        })
        .await
    }
}
