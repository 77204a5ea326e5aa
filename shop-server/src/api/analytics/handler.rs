//! Analytics handlers

use axum::extract::{Query, State};
use shared::models::{DailySales, DashboardStats, ReportQuery, TopCustomer, TopCustomersQuery};

use crate::api::{ApiResult, ok};
use crate::core::ServerState;
use crate::db::analytics;
use crate::utils::AppError;

/// GET /api/analytics/dashboard
pub async fn dashboard(State(state): State<ServerState>) -> ApiResult<DashboardStats> {
    ok(analytics::dashboard(&state.pool).await?)
}

/// GET /api/analytics/sales-report?from=&to=
pub async fn sales_report(
    State(state): State<ServerState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Vec<DailySales>> {
    if let (Some(from), Some(to)) = (query.from, query.to)
        && to < from
    {
        return Err(AppError::invalid_field("to", "to must not be before from"));
    }
    ok(analytics::sales_report(&state.pool, query.from, query.to).await?)
}

/// GET /api/analytics/top-customers?limit=
pub async fn top_customers(
    State(state): State<ServerState>,
    Query(query): Query<TopCustomersQuery>,
) -> ApiResult<Vec<TopCustomer>> {
    ok(analytics::top_customers(&state.pool, query.limit()).await?)
}
