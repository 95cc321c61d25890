//! Query parameter extractors for list endpoints.

use serde::Deserialize;

use captor_types::page::{MAX_PAGE_SIZE, PageRequest};

/// `?skip=&limit=` window for paginated lists.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    MAX_PAGE_SIZE
}

impl From<PageQuery> for PageRequest {
    fn from(query: PageQuery) -> Self {
        PageRequest::new(query.skip, query.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_defaults_and_clamps() {
        let query: PageQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(PageRequest::from(query), PageRequest::new(0, 100));

        let query = PageQuery { skip: -3, limit: 1000 };
        let page = PageRequest::from(query);
        assert_eq!(page.skip, 0);
        assert_eq!(page.limit, MAX_PAGE_SIZE);
    }
}
