use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Raw paging values as submitted; anything out of range is clamped by [`PageRequest::resolve`].
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PaginationInput {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Zero or missing values fall back to the defaults, then `page >= 1`
    /// and `1 <= limit <= MAX_LIMIT`.
    pub fn resolve(input: PaginationInput) -> Self {
        let page = match input.page {
            Some(p) if p != 0 => p,
            _ => DEFAULT_PAGE as i64,
        };
        let limit = match input.limit {
            Some(l) if l != 0 => l,
            _ => DEFAULT_LIMIT as i64,
        };

        PageRequest {
            page: page.clamp(1, u32::MAX as i64) as u32,
            limit: limit.clamp(1, MAX_LIMIT as i64) as u32,
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationOutput {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PaginationOutput {
    pub fn new(request: PageRequest, total: u64) -> Self {
        let total_pages = total.div_ceil(request.limit as u64);

        PaginationOutput {
            page: request.page,
            limit: request.limit,
            total,
            total_pages,
            has_next_page: (request.page as u64) < total_pages,
            has_prev_page: request.page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(page: Option<i64>, limit: Option<i64>) -> PaginationInput {
        PaginationInput { page, limit }
    }

    #[test]
    fn test_resolve_defaults() {
        assert_eq!(
            PageRequest::resolve(input(None, None)),
            PageRequest { page: 1, limit: 10 }
        );
    }

    #[test]
    fn test_resolve_clamps_out_of_range() {
        assert_eq!(PageRequest::resolve(input(Some(0), None)).page, 1);
        assert_eq!(PageRequest::resolve(input(Some(-4), None)).page, 1);
        assert_eq!(PageRequest::resolve(input(None, Some(101))).limit, MAX_LIMIT);
        assert_eq!(PageRequest::resolve(input(None, Some(-1))).limit, 1);
        assert_eq!(PageRequest::resolve(input(None, Some(0))).limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest::resolve(input(Some(1), Some(2))).offset(), 0);
        assert_eq!(PageRequest::resolve(input(Some(3), Some(25))).offset(), 50);
    }

    #[test]
    fn test_output_middle_page() {
        let output = PaginationOutput::new(PageRequest { page: 2, limit: 2 }, 5);
        assert_eq!(
            output,
            PaginationOutput {
                page: 2,
                limit: 2,
                total: 5,
                total_pages: 3,
                has_next_page: true,
                has_prev_page: true,
            }
        );
    }

    #[test]
    fn test_output_invariants() {
        for total in 0..30u64 {
            for limit in 1..8u32 {
                for page in 1..6u32 {
                    let output = PaginationOutput::new(PageRequest { page, limit }, total);
                    let expected_pages = (total + limit as u64 - 1) / limit as u64;
                    assert_eq!(output.total_pages, expected_pages);
                    assert_eq!(output.has_next_page, (page as u64) < expected_pages);
                    assert_eq!(output.has_prev_page, page > 1);
                }
            }
        }
    }

    #[test]
    fn test_output_empty() {
        let output = PaginationOutput::new(PageRequest::default(), 0);
        assert_eq!(output.total_pages, 0);
        assert!(!output.has_next_page);
        assert!(!output.has_prev_page);
    }

    #[test]
    fn test_output_serializes_camel_case() {
        let output = PaginationOutput::new(PageRequest::default(), 11);
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["totalPages"], 2);
        assert_eq!(json["hasNextPage"], true);
        assert_eq!(json["hasPrevPage"], false);
    }
}
