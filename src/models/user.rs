use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::TIMESTAMP_FORMAT;

/// Registered account as stored in the `users` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub date_joined: DateTime<Utc>,
}

/// Public identity of a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserOut {
    pub id: i32,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl From<&User> for UserOut {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(
        min = 1,
        max = 150,
        message = "Username must be between 1 and 150 characters"
    ))]
    pub username: String,
    pub password: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

/// Public profile page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_picture: String,
    pub date_joined: String,
    pub bio: String,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            profile_picture: user.profile_picture.unwrap_or_default(),
            date_joined: user.date_joined.format(TIMESTAMP_FORMAT).to_string(),
            bio: user.bio.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct EditProfileRequest {
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    #[serde(default)]
    pub current_password: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
    #[serde(default)]
    pub new_password_repeat: Option<String>,
    #[serde(default)]
    #[validate(length(max = 500, message = "Bio must be at most 500 characters"))]
    pub bio: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_user() -> User {
        User {
            id: 4,
            username: "cinephile".to_string(),
            email: "cinephile@example.com".to_string(),
            password_hash: "hash".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            profile_picture: None,
            bio: None,
            date_joined: Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap(),
        }
    }

    #[test]
    fn test_profile_from_user_fills_blanks() {
        let profile = Profile::from(sample_user());
        assert_eq!(profile.date_joined, "2024-03-09 14:05:00");
        assert_eq!(profile.profile_picture, "");
        assert_eq!(profile.bio, "");
    }

    #[test]
    fn test_user_out_omits_missing_email() {
        let out = UserOut::from(&sample_user());
        let json = serde_json::to_string(&out).unwrap();
        assert_eq!(json, r#"{"id":4,"username":"cinephile"}"#);
    }

    #[test]
    fn test_register_request_rejects_bad_email() {
        let request = RegisterRequest {
            username: "cinephile".to_string(),
            password: "irrelevant".to_string(),
            email: "not-an-email".to_string(),
        };
        assert!(request.validate().is_err());
    }
}
