//! Dashboard and sales aggregation over plain rows.

use std::collections::{BTreeMap, HashMap};

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::order::{OrderStatus, OrderSummary};
use super::product::ProductSummary;

pub const RECENT_ORDERS: usize = 5;
pub const LOW_STOCK_LIMIT: i64 = 20;
pub const TOP_PRODUCTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_orders: i64,
    pub total_revenue: BigDecimal,
    pub total_customers: i64,
    pub total_products: i64,
    pub orders_by_status: BTreeMap<String, i64>,
    pub low_stock_products: Vec<ProductSummary>,
    pub recent_orders: Vec<OrderSummary>,
}

/// One non-cancelled order, as seen by the sales report.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRecord {
    pub created_at: DateTime<Utc>,
    pub total_amount: BigDecimal,
}

/// One order line sold in the reporting window.
#[derive(Debug, Clone, PartialEq)]
pub struct SoldItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub total_price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub order_count: i64,
    pub revenue: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopProduct {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity_sold: i64,
    pub revenue: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesReport {
    pub days: i64,
    pub total_orders: i64,
    pub total_revenue: BigDecimal,
    pub daily: Vec<DailySales>,
    pub top_products: Vec<TopProduct>,
}

pub fn orders_by_status(counts: &[(OrderStatus, i64)]) -> BTreeMap<String, i64> {
    let mut map: BTreeMap<String, i64> = OrderStatus::ALL
        .iter()
        .map(|s| (s.to_string(), 0))
        .collect();
    for (status, count) in counts {
        *map.entry(status.to_string()).or_insert(0) += count;
    }
    map
}

/// Buckets sales per UTC day over the `days` days ending at `today`, zero-filling gaps.
pub fn daily_sales(records: &[SaleRecord], days: i64, today: NaiveDate) -> Vec<DailySales> {
    let start = today - Duration::days(days - 1);
    let mut buckets: BTreeMap<NaiveDate, (i64, BigDecimal)> = (0..days)
        .map(|offset| (start + Duration::days(offset), (0, BigDecimal::zero())))
        .collect();
    for record in records {
        if let Some(bucket) = buckets.get_mut(&record.created_at.date_naive()) {
            bucket.0 += 1;
            bucket.1 += &record.total_amount;
        }
    }
    buckets
        .into_iter()
        .map(|(date, (order_count, revenue))| DailySales {
            date,
            order_count,
            revenue,
        })
        .collect()
}

pub fn top_products(items: &[SoldItem], limit: usize) -> Vec<TopProduct> {
    let mut by_product: HashMap<Uuid, TopProduct> = HashMap::new();
    for item in items {
        let entry = by_product.entry(item.product_id).or_insert_with(|| TopProduct {
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            quantity_sold: 0,
            revenue: BigDecimal::zero(),
        });
        entry.quantity_sold += i64::from(item.quantity);
        entry.revenue += &item.total_price;
    }
    let mut ranked: Vec<TopProduct> = by_product.into_values().collect();
    ranked.sort_by(|a, b| {
        b.quantity_sold
            .cmp(&a.quantity_sold)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    ranked.truncate(limit);
    ranked
}
