//! User repository trait: accounts, per-user configuration and search history.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{
    NewUserConfiguration, SearchCriteria, SearchRecord, User, UserChanges, UserConfiguration,
    UserConfigurationId, UserConfigurationUpdate, UserDraft, UserId,
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Store a user whose password has already been hashed.
    ///
    /// # Returns
    /// * `Err(RepositoryError::Conflict)` - If the email is already registered
    async fn create_user(&self, user: UserDraft) -> RepositoryResult<User>;

    async fn get_user(&self, id: UserId) -> RepositoryResult<User>;

    /// Look up a user by email, ignoring case.
    async fn get_user_by_email(&self, email: &str) -> RepositoryResult<User>;

    /// The user and stored password hash for an email, if registered.
    async fn find_credentials(&self, email: &str) -> RepositoryResult<Option<(User, String)>>;

    async fn list_users(&self) -> RepositoryResult<Vec<User>>;

    /// Users that have stored a configuration.
    async fn list_started_users(&self) -> RepositoryResult<Vec<User>>;

    async fn update_user(&self, id: UserId, changes: UserChanges) -> RepositoryResult<User>;

    /// Delete a user with their configuration, reviews and search history.
    ///
    /// # Returns
    /// * `Err(RepositoryError::Conflict)` - If the user hosts accommodations or holds bookings
    async fn delete_user(&self, id: UserId) -> RepositoryResult<()>;

    // ==================== Configuration ====================

    /// # Returns
    /// * `Err(RepositoryError::Conflict)` - If the user already has a configuration
    /// * `Err(RepositoryError::NotFound)` - If the user or currency does not exist
    async fn create_user_configuration(
        &self,
        config: NewUserConfiguration,
    ) -> RepositoryResult<UserConfiguration>;

    async fn get_user_configuration(&self, user_id: UserId) -> RepositoryResult<UserConfiguration>;

    async fn update_user_configuration(
        &self,
        user_id: UserId,
        update: UserConfigurationUpdate,
    ) -> RepositoryResult<UserConfiguration>;

    async fn delete_user_configuration(&self, id: UserConfigurationId) -> RepositoryResult<()>;

    async fn delete_user_configuration_by_user(&self, user_id: UserId) -> RepositoryResult<()>;

    // ==================== Search history ====================

    async fn record_search(
        &self,
        user_id: UserId,
        criteria: &SearchCriteria,
    ) -> RepositoryResult<SearchRecord>;

    /// Searches recorded for a user, newest first.
    async fn list_searches(&self, user_id: UserId) -> RepositoryResult<Vec<SearchRecord>>;
}
