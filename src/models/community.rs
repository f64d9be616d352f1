use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{Genre, UserOut};

// ============================================================================
// Comments
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentView {
    pub id: i32,
    pub user_id: i32,
    pub username: String,
    pub comment: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(
        min = 2,
        max = 1000,
        message = "Comment length must be between 2 and 1000 characters"
    ))]
    pub comment: String,
}

// ============================================================================
// Ratings
// ============================================================================

/// A user's rating of a movie; `rating` is 0 and `id` absent when unrated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RatingView {
    pub id: Option<i32>,
    pub rating: i32,
    pub user_id: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RatingRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
}

// ============================================================================
// Movie lists
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieListView {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListedMovie {
    pub id: i32,
    pub title: String,
    pub release_year: i32,
    pub runtime: Option<i32>,
    pub genres: Vec<Genre>,
    pub overview: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieListDetail {
    pub id: i32,
    pub user: UserOut,
    pub name: String,
    pub description: Option<String>,
    pub movies: Vec<ListedMovie>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateListRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "List name must be between 1 and 100 characters"
    ))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateListRequest {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 100,
        message = "List name must be between 1 and 100 characters"
    ))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_length_bounds() {
        let too_short = CommentRequest {
            comment: "a".to_string(),
        };
        let ok = CommentRequest {
            comment: "Great pacing".to_string(),
        };
        let too_long = CommentRequest {
            comment: "x".repeat(1001),
        };
        assert!(too_short.validate().is_err());
        assert!(ok.validate().is_ok());
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn test_rating_range() {
        assert!(RatingRequest { rating: 0 }.validate().is_err());
        assert!(RatingRequest { rating: 1 }.validate().is_ok());
        assert!(RatingRequest { rating: 5 }.validate().is_ok());
        assert!(RatingRequest { rating: 6 }.validate().is_err());
    }

    #[test]
    fn test_update_list_request_allows_partial_update() {
        let request: UpdateListRequest =
            serde_json::from_str(r#"{"description": "Rainy day picks"}"#).unwrap();
        assert!(request.name.is_none());
        assert!(request.validate().is_ok());
    }
}
