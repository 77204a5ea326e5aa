//! Role permission table
//!
//! One table keyed by normalised role name. `admin` carries the wildcard,
//! `customer` and unknown roles carry nothing.

pub const WILDCARD: &str = "*";

pub const MANAGE_PRODUCTS: &str = "manage_products";
pub const MANAGE_CATEGORIES: &str = "manage_categories";
pub const MANAGE_BRANDS: &str = "manage_brands";
pub const VIEW_ORDERS: &str = "view_orders";
pub const MANAGE_ORDERS: &str = "manage_orders";
pub const MANAGE_INVENTORY: &str = "manage_inventory";
pub const MANAGE_SUPPLIERS: &str = "manage_suppliers";
pub const MANAGE_PURCHASES: &str = "manage_purchases";
pub const MANAGE_SALES: &str = "manage_sales";
pub const MANAGE_REVIEWS: &str = "manage_reviews";
pub const MANAGE_COUPONS: &str = "manage_coupons";
pub const VIEW_ANALYTICS: &str = "view_analytics";
pub const MANAGE_SETTINGS: &str = "manage_settings";

/// Every grantable permission (excluding the wildcard)
pub const ALL_PERMISSIONS: &[&str] = &[
    MANAGE_PRODUCTS,
    MANAGE_CATEGORIES,
    MANAGE_BRANDS,
    VIEW_ORDERS,
    MANAGE_ORDERS,
    MANAGE_INVENTORY,
    MANAGE_SUPPLIERS,
    MANAGE_PURCHASES,
    MANAGE_SALES,
    MANAGE_REVIEWS,
    MANAGE_COUPONS,
    VIEW_ANALYTICS,
    MANAGE_SETTINGS,
];

pub const ADMIN_PERMISSIONS: &[&str] = &[WILDCARD];

/// 经理：除用户管理外的全部后台权限
pub const MANAGER_PERMISSIONS: &[&str] = ALL_PERMISSIONS;

pub const STAFF_PERMISSIONS: &[&str] = &[VIEW_ORDERS, MANAGE_ORDERS, MANAGE_SALES, MANAGE_INVENTORY];

pub const CASHIER_PERMISSIONS: &[&str] = &[MANAGE_SALES, VIEW_ORDERS];

/// Permissions granted to a role. Lookup trims and ignores case.
pub fn permissions_for(role: &str) -> &'static [&'static str] {
    match role.trim().to_ascii_lowercase().as_str() {
        "admin" => ADMIN_PERMISSIONS,
        "manager" => MANAGER_PERMISSIONS,
        "staff" => STAFF_PERMISSIONS,
        "cashier" => CASHIER_PERMISSIONS,
        _ => &[],
    }
}

/// True if the role's list contains the wildcard or `permission`
pub fn has_permission(role: &str, permission: &str) -> bool {
    permissions_for(role)
        .iter()
        .any(|p| *p == WILDCARD || *p == permission)
}

/// True if any of `permissions` passes [`has_permission`]
pub fn has_any_permission(role: &str, permissions: &[&str]) -> bool {
    permissions.iter().any(|p| has_permission(role, p))
}

/// Staff-side roles may use the back office at all
pub fn is_staff_role(role: &str) -> bool {
    !permissions_for(role).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_wildcard_grants_everything() {
        for p in ALL_PERMISSIONS {
            assert!(has_permission("admin", p));
        }
        assert!(has_permission("admin", "anything_else"));
    }

    #[test]
    fn test_role_lookup_is_case_insensitive() {
        assert!(has_permission("Manager", MANAGE_PRODUCTS));
        assert!(has_permission("  STAFF ", MANAGE_ORDERS));
        assert!(has_permission("ADMIN", VIEW_ANALYTICS));
    }

    #[test]
    fn test_limited_roles() {
        assert!(has_permission("cashier", MANAGE_SALES));
        assert!(has_permission("cashier", VIEW_ORDERS));
        assert!(!has_permission("cashier", MANAGE_ORDERS));
        assert!(!has_permission("staff", MANAGE_PRODUCTS));
        assert!(!has_permission("manager", WILDCARD));
    }

    #[test]
    fn test_customer_and_unknown_roles_have_nothing() {
        assert!(permissions_for("customer").is_empty());
        assert!(permissions_for("root").is_empty());
        assert!(!has_permission("customer", VIEW_ORDERS));
        assert!(!has_any_permission("ghost", ALL_PERMISSIONS));
        assert!(!is_staff_role("customer"));
        assert!(is_staff_role("cashier"));
    }

    #[test]
    fn test_any_permission() {
        assert!(has_any_permission("staff", &[MANAGE_PRODUCTS, MANAGE_SALES]));
        assert!(!has_any_permission("cashier", &[MANAGE_PRODUCTS, MANAGE_SETTINGS]));
        assert!(!has_any_permission("admin", &[]));
    }
}
