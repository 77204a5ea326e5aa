//! Analytics Model (read-only aggregates)

use serde::{Deserialize, Serialize};

/// Admin dashboard summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Σ paid_amount of non-cancelled orders + Σ POS sale totals
    pub revenue: f64,
    pub order_revenue: f64,
    pub sales_revenue: f64,
    pub order_count: i64,
    pub pending_orders: i64,
    pub customer_count: i64,
    pub product_count: i64,
    pub low_stock_count: i64,
}

/// One day of the sales report (UTC calendar day)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DailySales {
    /// `YYYY-MM-DD`
    pub date: String,
    pub order_count: i64,
    pub revenue: f64,
}

/// Customer ranked by order spend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TopCustomer {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub order_count: i64,
    pub total_spent: f64,
}

/// `?from=&to=` window in Unix millis, both optional
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReportQuery {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

/// `?limit=`
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TopCustomersQuery {
    pub limit: Option<u32>,
}

impl TopCustomersQuery {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    pub fn limit(&self) -> i64 {
        i64::from(
            self.limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_customers_limit_clamped() {
        assert_eq!(TopCustomersQuery::default().limit(), 10);
        assert_eq!(TopCustomersQuery { limit: Some(0) }.limit(), 1);
        assert_eq!(TopCustomersQuery { limit: Some(1000) }.limit(), 100);
    }
}
