use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{CurrencyId, UserConfigurationId, UserId};

/// Authorization role attached to every account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Base,
    Host,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Base => "base",
            UserRole::Host => "host",
            UserRole::Admin => "admin",
        }
    }

    /// Whether the account may publish accommodations and receive host reviews.
    pub fn can_host(&self) -> bool {
        matches!(self, UserRole::Host | UserRole::Admin)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "base" | "base_user" | "role_base_user" => Ok(Self::Base),
            "host" | "host_user" | "role_host_user" => Ok(Self::Host),
            "admin" | "admin_user" | "role_admin_user" => Ok(Self::Admin),
            other => Err(format!("Unknown user role: {}", other)),
        }
    }
}

/// A registered account. The password hash never leaves the repository layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: Option<String>,
    pub profile_image: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// Registration payload.
#[derive(Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub surname: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub password: String,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub role: UserRole,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("surname", &self.surname)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("profile_image", &self.profile_image)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Partial update of an account; absent fields are left untouched.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
}

impl fmt::Debug for UserUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserUpdate")
            .field("name", &self.name)
            .field("surname", &self.surname)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("profile_image", &self.profile_image)
            .field("role", &self.role)
            .finish()
    }
}

/// Account data as handed to a repository: the password is already hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDraft {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: Option<String>,
    pub profile_image: Option<String>,
    pub role: UserRole,
    pub password_hash: String,
}

/// Changes applied by a repository update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub profile_image: Option<String>,
    pub role: Option<UserRole>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    /// Apply the changes to an in-memory record.
    pub fn apply(&self, user: &mut User, password_hash: &mut String) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(surname) = &self.surname {
            user.surname = surname.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(phone) = &self.phone {
            user.phone = Some(phone.clone());
        }
        if let Some(image) = &self.profile_image {
            user.profile_image = Some(image.clone());
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(hash) = &self.password_hash {
            *password_hash = hash.clone();
        }
    }
}

/// Per-user application preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfiguration {
    pub id: UserConfigurationId,
    pub user_id: UserId,
    pub currency_id: Option<CurrencyId>,
    pub language: String,
    pub notifications_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUserConfiguration {
    pub user_id: UserId,
    #[serde(default)]
    pub currency_id: Option<CurrencyId>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfigurationUpdate {
    #[serde(default)]
    pub currency_id: Option<CurrencyId>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub notifications_enabled: Option<bool>,
}

impl UserConfigurationUpdate {
    pub fn apply(&self, config: &mut UserConfiguration) {
        if let Some(currency_id) = self.currency_id {
            config.currency_id = Some(currency_id);
        }
        if let Some(language) = &self.language {
            config.language = language.clone();
        }
        if let Some(enabled) = self.notifications_enabled {
            config.notifications_enabled = enabled;
        }
    }
}

fn default_language() -> String {
    "es".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_accepts_legacy_names() {
        assert_eq!("ROLE_ADMIN_USER".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("host".parse::<UserRole>().unwrap(), UserRole::Host);
        assert_eq!("Base_User".parse::<UserRole>().unwrap(), UserRole::Base);
        assert!("guest".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_capabilities() {
        assert!(!UserRole::Base.can_host());
        assert!(UserRole::Host.can_host());
        assert!(UserRole::Admin.can_host());
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::Host.is_admin());
    }

    #[test]
    fn test_new_user_debug_hides_password() {
        let user: NewUser = serde_json::from_str(
            r#"{"name":"Ana","surname":"Diaz","email":"ana@example.com","password":"hunter22"}"#,
        )
        .unwrap();
        assert_eq!(user.role, UserRole::Base);
        let debug = format!("{:?}", user);
        assert!(!debug.contains("hunter22"));
    }

    #[test]
    fn test_configuration_defaults() {
        let config: NewUserConfiguration = serde_json::from_str(r#"{"user_id": 4}"#).unwrap();
        assert_eq!(config.user_id, UserId(4));
        assert_eq!(config.language, "es");
        assert!(config.notifications_enabled);
        assert!(config.currency_id.is_none());
    }

    #[test]
    fn test_user_changes_apply() {
        let mut user = User {
            id: UserId(1),
            name: "Ana".into(),
            surname: "Diaz".into(),
            email: "ana@example.com".into(),
            phone: None,
            profile_image: None,
            role: UserRole::Base,
            created_at: Utc::now(),
        };
        let mut hash = "old".to_string();
        let changes = UserChanges {
            phone: Some("600000000".into()),
            role: Some(UserRole::Host),
            password_hash: Some("new".into()),
            ..Default::default()
        };
        changes.apply(&mut user, &mut hash);
        assert_eq!(user.phone.as_deref(), Some("600000000"));
        assert_eq!(user.role, UserRole::Host);
        assert_eq!(user.name, "Ana");
        assert_eq!(hash, "new");
    }
}
