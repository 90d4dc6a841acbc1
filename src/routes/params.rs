use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

const MAX_PER_PAGE: i64 = 100;
// Keeps `(page - 1) * per_page` inside i64.
const MAX_PAGE: i64 = i64::MAX / MAX_PER_PAGE;

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).clamp(1, MAX_PAGE);
        let per_page = self.per_page.unwrap_or(20).clamp(1, MAX_PER_PAGE);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FoodSortBy {
    CreatedAt,
    Price,
    Name,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct FoodQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Category filter, e.g. `burgers`.
    #[serde(rename = "type")]
    pub food_type: Option<String>,
    pub q: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub sort_by: Option<FoodSortBy>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
    pub sort_order: Option<SortOrder>,
}

// Query strings are flat, so list queries carry the paging keys themselves
// instead of flattening `Pagination` (serde_urlencoded cannot flatten numbers).
impl FoodQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

impl OrderListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        assert_eq!(Pagination::default().normalize(), (1, 20, 0));
        let p = Pagination {
            page: Some(3),
            per_page: Some(500),
        };
        assert_eq!(p.normalize(), (3, 100, 200));
        let p = Pagination {
            page: Some(-4),
            per_page: Some(0),
        };
        assert_eq!(p.normalize(), (1, 1, 0));
    }

    #[test]
    fn huge_page_numbers_are_capped() {
        let p = Pagination {
            page: Some(i64::MAX),
            per_page: Some(100),
        };
        let (page, per_page, offset) = p.normalize();
        assert_eq!(page, i64::MAX / 100);
        assert_eq!(per_page, 100);
        assert_eq!(offset, (page - 1) * 100);
        assert!(offset > 0);
    }
}
