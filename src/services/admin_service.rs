use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::{
        admin::{Dashboard, DashboardStats, DayCount, DayRevenue, RecentOrder},
        orders::{AdminOrder, AdminOrderList, OrderCustomer, UpdateOrderStatusRequest},
    },
    entity::{
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        users::{Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderStatus},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

/// Days covered by the dashboard charts, today included.
const CHART_DAYS: i32 = 7;
const RECENT_ORDERS: i64 = 5;

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<AdminOrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        let status: OrderStatus = status.parse()?;
        condition = condition.add(OrderCol::OrderStatus.eq(status.as_str()));
    }

    let mut finder = Orders::find().filter(condition);

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let rows = finder
        .find_also_related(Users)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    for (order, customer) in rows {
        items.push(AdminOrder {
            order: order.try_into()?,
            customer: customer.map(customer_of),
        });
    }

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", AdminOrderList { items }, Some(meta)))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<AdminOrder>> {
    ensure_admin(user)?;
    let row = Orders::find_by_id(id)
        .find_also_related(Users)
        .one(&state.orm)
        .await?;
    let (order, customer) = match row {
        Some(row) => row,
        None => return Err(AppError::NotFound),
    };

    let data = AdminOrder {
        order: order.try_into()?,
        customer: customer.map(customer_of),
    };
    Ok(ApiResponse::ok("Order found", data))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let next: OrderStatus = payload.order_status.trim().parse()?;

    let existing = Orders::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };
    let current: OrderStatus = existing.order_status.parse()?;
    let next = current.transition_to(next)?;

    let mut active: OrderActive = existing.into();
    active.order_status = Set(next.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    tracing::info!(
        order_id = %order.id,
        admin_id = %user.user_id,
        from = %current,
        to = %next,
        "order status updated"
    );

    Ok(ApiResponse::ok("Order updated", order.try_into()?))
}

/// Headline counters, the latest orders and a week of daily activity.
///
/// Aggregates are written in SQL against the pool underneath the ORM
/// connection.
pub async fn dashboard(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Dashboard>> {
    ensure_admin(user)?;
    let pool = state.orm.get_postgres_connection_pool();
    let delivered = OrderStatus::Delivered.as_str();
    let cancelled = OrderStatus::Cancelled.as_str();

    let (open_orders, completed_orders, total_revenue): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE order_status NOT IN ($1, $2)),
            COUNT(*) FILTER (WHERE order_status = $1),
            COALESCE(SUM(total_price) FILTER (WHERE order_status = $1), 0)::BIGINT
        FROM orders
        "#,
    )
    .bind(delivered)
    .bind(cancelled)
    .fetch_one(pool)
    .await?;

    let (total_foods,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM food_items")
        .fetch_one(pool)
        .await?;

    let recent_orders = sqlx::query_as::<_, RecentOrder>(
        r#"
        SELECT o.id, o.order_status, o.total_price, o.created_at, u.name AS customer_name
        FROM orders o
        LEFT JOIN users u ON u.id = o.user_id
        ORDER BY o.created_at DESC
        LIMIT $1
        "#,
    )
    .bind(RECENT_ORDERS)
    .fetch_all(pool)
    .await?;

    let orders_by_day = sqlx::query_as::<_, DayCount>(
        r#"
        SELECT DATE(created_at) AS date, COUNT(*) AS count
        FROM orders
        WHERE created_at >= CURRENT_DATE - ($1 - 1)
        GROUP BY DATE(created_at)
        ORDER BY date ASC
        "#,
    )
    .bind(CHART_DAYS)
    .fetch_all(pool)
    .await?;

    let revenue_by_day = sqlx::query_as::<_, DayRevenue>(
        r#"
        SELECT DATE(created_at) AS date, COALESCE(SUM(total_price), 0)::BIGINT AS total
        FROM orders
        WHERE order_status = $1 AND created_at >= CURRENT_DATE - ($2 - 1)
        GROUP BY DATE(created_at)
        ORDER BY date ASC
        "#,
    )
    .bind(delivered)
    .bind(CHART_DAYS)
    .fetch_all(pool)
    .await?;

    let data = Dashboard {
        stats: DashboardStats {
            open_orders,
            completed_orders,
            total_foods,
            total_revenue,
        },
        recent_orders,
        orders_by_day,
        revenue_by_day,
    };
    Ok(ApiResponse::ok("Dashboard", data))
}

fn customer_of(user: UserModel) -> OrderCustomer {
    OrderCustomer {
        id: user.id,
        name: user.name,
        email: user.email,
    }
}
