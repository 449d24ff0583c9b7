use crate::models::PaginationParams;

/// Clamp client-supplied paging into `(page, page_size)` with `page >= 1` and `1..=100` items.
pub fn normalize_page(params: &PaginationParams) -> (u64, u64) {
    let page = params.page.unwrap_or(1).max(1) as u64;
    let page_size = params.page_size.unwrap_or(20).clamp(1, 100) as u64;
    (page, page_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_page_defaults() {
        let params = PaginationParams {
            page: None,
            page_size: None,
        };
        assert_eq!(normalize_page(&params), (1, 20));
    }

    #[test]
    fn test_normalize_page_clamps() {
        let params = PaginationParams {
            page: Some(0),
            page_size: Some(1000),
        };
        assert_eq!(normalize_page(&params), (1, 100));
    }
}
