//! Shared DTO types used across multiple endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Pagination query parameters for list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page (max 500). Defaults to 100.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginationMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items.
    pub total: u32,
    /// Total number of pages.
    pub total_pages: u32,
}

/// Acknowledgement for fire-and-forget pushes.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AcceptedResponse {
    /// Always `"accepted"`: the message was handed to the hub, not
    /// necessarily delivered.
    pub status: String,
    /// `"user"` or `"broadcast"`.
    pub target: String,
}

impl AcceptedResponse {
    /// Acknowledges a push addressed to one user (`true`) or everyone.
    #[must_use]
    pub fn new(targeted: bool) -> Self {
        let target = if targeted { "user" } else { "broadcast" };
        Self {
            status: "accepted".to_string(),
            target: target.to_string(),
        }
    }
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    100
}

impl PaginationParams {
    /// Clamps `page` to at least 1 and `per_page` to `1..=500`.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, 500),
        }
    }

    /// Returns the requested page of `items` and its metadata.
    #[must_use]
    pub fn paginate<T>(&self, items: Vec<T>) -> (Vec<T>, PaginationMeta) {
        let params = self.clamped();
        let total = u32::try_from(items.len()).unwrap_or(u32::MAX);
        let total_pages = if total == 0 {
            0
        } else {
            total.div_ceil(params.per_page)
        };
        let start =
            (params.page.saturating_sub(1) as usize).saturating_mul(params.per_page as usize);
        let data = items
            .into_iter()
            .skip(start)
            .take(params.per_page as usize)
            .collect();
        (
            data,
            PaginationMeta {
                page: params.page,
                per_page: params.per_page,
                total,
                total_pages,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_second_page() {
        let params = PaginationParams {
            page: 2,
            per_page: 2,
        };
        let (data, meta) = params.paginate(vec![1, 2, 3, 4, 5]);
        assert_eq!(data, vec![3, 4]);
        assert_eq!(meta.total, 5);
        assert_eq!(meta.total_pages, 3);
    }

    #[test]
    fn paginate_clamps_inputs() {
        let params = PaginationParams {
            page: 0,
            per_page: 0,
        };
        let (data, meta) = params.paginate(vec!["a", "b"]);
        assert_eq!(data, vec!["a"]);
        assert_eq!(meta.page, 1);
        assert_eq!(meta.per_page, 1);
    }

    #[test]
    fn empty_list_has_no_pages() {
        let params = PaginationParams {
            page: 3,
            per_page: 10,
        };
        let (data, meta) = params.paginate(Vec::<u8>::new());
        assert!(data.is_empty());
        assert_eq!(meta.total_pages, 0);
    }
}
