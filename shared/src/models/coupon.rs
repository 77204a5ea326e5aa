//! Coupon Model

use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorCode};

/// How a coupon's `value` is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponType {
    /// `value` percent of the subtotal
    Percentage,
    /// `value` currency units off
    Fixed,
}

impl CouponType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Fixed => "fixed",
        }
    }

    pub fn from_db(s: &str) -> Self {
        match s {
            "percentage" => Self::Percentage,
            _ => Self::Fixed,
        }
    }
}

/// Coupon entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub id: i64,
    /// Stored uppercase
    pub code: String,
    pub coupon_type: CouponType,
    pub value: f64,
    pub min_purchase: Option<f64>,
    pub expires_at: Option<i64>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Coupon {
    /// Check whether the coupon may be applied to `subtotal` at `now`
    pub fn check_applicable(&self, subtotal: f64, now: i64) -> Result<(), AppError> {
        if !self.is_active {
            return Err(AppError::new(ErrorCode::CouponInactive));
        }
        if let Some(expires_at) = self.expires_at
            && expires_at < now
        {
            return Err(AppError::new(ErrorCode::CouponExpired).with_detail("code", self.code.clone()));
        }
        if let Some(min) = self.min_purchase
            && subtotal < min
        {
            return Err(AppError::new(ErrorCode::CouponMinPurchase)
                .with_detail("min_purchase", min)
                .with_detail("subtotal", subtotal));
        }
        Ok(())
    }
}

/// Normalize a user-entered coupon code
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Create coupon payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponCreate {
    pub code: String,
    pub coupon_type: CouponType,
    pub value: f64,
    pub min_purchase: Option<f64>,
    pub expires_at: Option<i64>,
}

/// Update coupon payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CouponUpdate {
    pub code: Option<String>,
    pub coupon_type: Option<CouponType>,
    pub value: Option<f64>,
    pub min_purchase: Option<f64>,
    pub expires_at: Option<i64>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coupon() -> Coupon {
        Coupon {
            id: 1,
            code: "SAVE10".into(),
            coupon_type: CouponType::Percentage,
            value: 10.0,
            min_purchase: Some(50.0),
            expires_at: Some(10_000),
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_applicable() {
        assert!(coupon().check_applicable(50.0, 10_000).is_ok());
    }

    #[test]
    fn test_rejections() {
        let err = coupon().check_applicable(49.99, 0).unwrap_err();
        assert_eq!(err.code, ErrorCode::CouponMinPurchase);

        let err = coupon().check_applicable(100.0, 10_001).unwrap_err();
        assert_eq!(err.code, ErrorCode::CouponExpired);

        let mut c = coupon();
        c.is_active = false;
        assert_eq!(
            c.check_applicable(100.0, 0).unwrap_err().code,
            ErrorCode::CouponInactive
        );
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  save10 "), "SAVE10");
    }
}
