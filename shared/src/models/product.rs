//! Product Model

use serde::{Deserialize, Serialize};

/// Product entity
///
/// When `has_variations` is set, price and stock are read from the selected
/// [`ProductVariant`] rather than this row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: f64,
    /// Strike-through "was" price, display only
    pub compare_price: Option<f64>,
    pub sale_price: Option<f64>,
    pub cost_price: Option<f64>,
    pub stock: i32,
    pub low_stock_threshold: i32,
    pub category_id: Option<i64>,
    pub brand_id: Option<i64>,
    pub images: Vec<String>,
    pub is_featured: bool,
    pub is_active: bool,
    pub has_variations: bool,
    pub flash_sale_price: Option<f64>,
    pub flash_sale_start: Option<i64>,
    pub flash_sale_end: Option<i64>,
    /// Mean of approved review ratings, one decimal
    pub rating: f64,
    pub num_reviews: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Product {
    /// Whether the flash-sale window contains `now` (open bounds allowed)
    pub fn flash_sale_active(&self, now: i64) -> bool {
        self.flash_sale_price.is_some()
            && self.flash_sale_start.is_none_or(|start| start <= now)
            && self.flash_sale_end.is_none_or(|end| now <= end)
    }

    /// Sale price in effect at `now`: the flash price inside its window,
    /// otherwise the regular sale price
    pub fn active_sale_price(&self, now: i64) -> Option<f64> {
        if self.flash_sale_active(now) {
            self.flash_sale_price
        } else {
            self.sale_price
        }
    }

    /// Unit price a customer pays at `now`
    pub fn effective_price(&self, now: i64) -> f64 {
        self.active_sale_price(now).unwrap_or(self.price)
    }
}

/// Product with its variants, returned by the detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<ProductVariant>,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: f64,
    pub compare_price: Option<f64>,
    pub sale_price: Option<f64>,
    pub cost_price: Option<f64>,
    pub stock: Option<i32>,
    pub low_stock_threshold: Option<i32>,
    pub category_id: Option<i64>,
    pub brand_id: Option<i64>,
    pub images: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub has_variations: Option<bool>,
    pub flash_sale_price: Option<f64>,
    pub flash_sale_start: Option<i64>,
    pub flash_sale_end: Option<i64>,
    pub variants: Option<Vec<VariantCreate>>,
}

/// Update product payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: Option<f64>,
    pub compare_price: Option<f64>,
    pub sale_price: Option<f64>,
    /// Remove the regular sale price
    #[serde(default)]
    pub clear_sale_price: bool,
    pub cost_price: Option<f64>,
    pub stock: Option<i32>,
    pub low_stock_threshold: Option<i32>,
    pub category_id: Option<i64>,
    pub brand_id: Option<i64>,
    pub images: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub is_active: Option<bool>,
    pub has_variations: Option<bool>,
    pub flash_sale_price: Option<f64>,
    pub flash_sale_start: Option<i64>,
    pub flash_sale_end: Option<i64>,
    /// Remove the flash-sale window entirely
    #[serde(default)]
    pub clear_flash_sale: bool,
}

/// Catalog list filters (`GET /api/products`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductQuery {
    pub category: Option<i64>,
    pub brand: Option<i64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub featured: Option<bool>,
    pub sort: Option<ProductSort>,
    pub q: Option<String>,
}

/// Sort orders for product listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Rating,
    Name,
}

impl ProductSort {
    /// ORDER BY clause (constant SQL, never user text)
    pub fn order_by(&self) -> &'static str {
        match self {
            ProductSort::Newest => "created_at DESC",
            ProductSort::PriceAsc => "COALESCE(sale_price, price) ASC",
            ProductSort::PriceDesc => "COALESCE(sale_price, price) DESC",
            ProductSort::Rating => "rating DESC, num_reviews DESC",
            ProductSort::Name => "name ASC",
        }
    }
}

/// One `name = value` pair of a variant (e.g. Color = Red)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantOption {
    pub name: String,
    pub value: String,
}

/// Product variant entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: i64,
    pub product_id: i64,
    pub sku: String,
    pub price: f64,
    pub compare_price: Option<f64>,
    pub stock: i32,
    pub options: Vec<VariantOption>,
    pub image: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ProductVariant {
    /// "Color: Red / Size: L"
    pub fn label(&self) -> String {
        self.options
            .iter()
            .map(|o| format!("{}: {}", o.name, o.value))
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

/// Create variant payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantCreate {
    pub sku: String,
    pub price: f64,
    pub compare_price: Option<f64>,
    pub stock: Option<i32>,
    #[serde(default)]
    pub options: Vec<VariantOption>,
    pub image: Option<String>,
}

/// Update variant payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariantUpdate {
    pub sku: Option<String>,
    pub price: Option<f64>,
    pub compare_price: Option<f64>,
    pub stock: Option<i32>,
    pub options: Option<Vec<VariantOption>>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: f64, sale: Option<f64>) -> Product {
        Product {
            id: 1,
            name: "Linen Shirt".into(),
            slug: "linen-shirt".into(),
            description: None,
            sku: None,
            price,
            compare_price: None,
            sale_price: sale,
            cost_price: None,
            stock: 10,
            low_stock_threshold: 5,
            category_id: None,
            brand_id: None,
            images: vec![],
            is_featured: false,
            is_active: true,
            has_variations: false,
            flash_sale_price: None,
            flash_sale_start: None,
            flash_sale_end: None,
            rating: 0.0,
            num_reviews: 0,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_effective_price_without_sale() {
        let p = product(40.0, None);
        assert_eq!(p.active_sale_price(1_000), None);
        assert_eq!(p.effective_price(1_000), 40.0);
    }

    #[test]
    fn test_flash_sale_only_inside_window() {
        let mut p = product(40.0, Some(35.0));
        p.flash_sale_price = Some(20.0);
        p.flash_sale_start = Some(1_000);
        p.flash_sale_end = Some(2_000);

        assert_eq!(p.effective_price(999), 35.0);
        assert_eq!(p.effective_price(1_000), 20.0);
        assert_eq!(p.effective_price(2_000), 20.0);
        assert_eq!(p.effective_price(2_001), 35.0);
    }

    #[test]
    fn test_flash_sale_open_ended() {
        let mut p = product(40.0, None);
        p.flash_sale_price = Some(30.0);
        p.flash_sale_start = Some(500);
        assert!(!p.flash_sale_active(499));
        assert!(p.flash_sale_active(i64::MAX));
        assert_eq!(p.effective_price(600), 30.0);
    }

    #[test]
    fn test_variant_label() {
        let v = ProductVariant {
            id: 2,
            product_id: 1,
            sku: "LS-RED-L".into(),
            price: 42.0,
            compare_price: None,
            stock: 3,
            options: vec![
                VariantOption {
                    name: "Color".into(),
                    value: "Red".into(),
                },
                VariantOption {
                    name: "Size".into(),
                    value: "L".into(),
                },
            ],
            image: None,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        };
        assert_eq!(v.label(), "Color: Red / Size: L");
    }

    #[test]
    fn test_sort_deserialize() {
        let sort: ProductSort = serde_json::from_str("\"price_asc\"").unwrap();
        assert_eq!(sort, ProductSort::PriceAsc);
    }
}
