//! The JSON envelope every endpoint answers with:
//! `{ "success": bool, "data"?, "message"?, "pagination"? }`.

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub pages: u64,
    pub total: u64,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            pagination: None,
        }
    }

    pub fn with_message(data: T, message: &str) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.to_string()),
            pagination: None,
        }
    }

    pub fn paginated(data: T, pagination: Pagination) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            pagination: Some(pagination),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: &str) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.to_string()),
            pagination: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_only_envelope_omits_data_and_pagination() {
        let body = serde_json::to_value(ApiResponse::message("Invoice deleted successfully"))
            .unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Invoice deleted successfully");
        assert!(body.get("data").is_none());
        assert!(body.get("pagination").is_none());
    }

    #[test]
    fn paginated_envelope_carries_page_counts() {
        let body = serde_json::to_value(ApiResponse::paginated(
            vec![1, 2, 3],
            Pagination {
                page: 2,
                pages: 5,
                total: 42,
            },
        ))
        .unwrap();
        assert_eq!(body["pagination"]["pages"], 5);
        assert_eq!(body["data"].as_array().unwrap().len(), 3);
    }
}
