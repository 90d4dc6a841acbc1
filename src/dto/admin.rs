use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub open_orders: i64,
    pub completed_orders: i64,
    pub total_foods: i64,
    pub total_revenue: i64,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct RecentOrder {
    pub id: Uuid,
    pub order_status: String,
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
    pub customer_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct DayRevenue {
    pub date: NaiveDate,
    pub total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub recent_orders: Vec<RecentOrder>,
    pub orders_by_day: Vec<DayCount>,
    pub revenue_by_day: Vec<DayRevenue>,
}
