use serde::{Deserialize, Serialize};

pub mod community;
pub mod movie;
pub mod person;
pub mod recommendation;
pub mod user;

pub use community::*;
pub use movie::*;
pub use person::*;
pub use recommendation::*;
pub use user::*;

/// Number of movies per page on list and search endpoints
pub const PAGE_SIZE: i64 = 8;

/// Display format used for every timestamp returned to the client
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Query string for paginated endpoints (1-based)
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<i64>,
}

impl PageQuery {
    /// Row offset for the requested page; pages below 1 clamp to the first
    /// page and pages past the end saturate at `i64::MAX`
    pub fn offset(&self) -> i64 {
        (self.page.unwrap_or(1).max(1) - 1).saturating_mul(PAGE_SIZE)
    }
}

/// One page of results together with the total number of matches
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub count: i64,
}

/// Plain success acknowledgement, `{"success": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuccessMessage {
    pub success: String,
}

impl SuccessMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offset() {
        assert_eq!(PageQuery { page: None }.offset(), 0);
        assert_eq!(PageQuery { page: Some(1) }.offset(), 0);
        assert_eq!(PageQuery { page: Some(3) }.offset(), 16);
    }

    #[test]
    fn test_page_offset_clamps_non_positive_pages() {
        assert_eq!(PageQuery { page: Some(0) }.offset(), 0);
        assert_eq!(PageQuery { page: Some(-4) }.offset(), 0);
    }

    #[test]
    fn test_page_offset_saturates_for_huge_pages() {
        let query: PageQuery = serde_json::from_str(r#"{"page": 9223372036854775807}"#).unwrap();
        assert_eq!(query.offset(), i64::MAX);
        assert_eq!(PageQuery { page: Some(i64::MAX / PAGE_SIZE + 2) }.offset(), i64::MAX);
    }

    #[test]
    fn test_success_message_serde() {
        let message = SuccessMessage::new("Rating submitted successfully");
        let json = serde_json::to_string(&message).unwrap();
        assert_eq!(json, r#"{"success":"Rating submitted successfully"}"#);
    }
}
