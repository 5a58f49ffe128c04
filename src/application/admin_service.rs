use std::sync::Arc;

use bigdecimal::{BigDecimal, Zero};
use chrono::{Duration, Utc};

use crate::domain::analytics::{
    daily_sales, orders_by_status, top_products, DashboardStats, SalesReport, LOW_STOCK_LIMIT,
    RECENT_ORDERS, TOP_PRODUCTS,
};
use crate::domain::errors::DomainError;
use crate::domain::order::{OrderFilter, OrderSummary};
use crate::domain::pagination::PageRequest;
use crate::domain::ports::{AnalyticsRepository, OrderRepository, ProductRepository};
use crate::domain::product::ProductSummary;
use crate::domain::user::Role;

pub const MAX_REPORT_DAYS: i64 = 365;

#[derive(Clone)]
pub struct AdminService {
    analytics: Arc<dyn AnalyticsRepository>,
    orders: Arc<dyn OrderRepository>,
    products: Arc<dyn ProductRepository>,
}

impl AdminService {
    pub fn new(
        analytics: Arc<dyn AnalyticsRepository>,
        orders: Arc<dyn OrderRepository>,
        products: Arc<dyn ProductRepository>,
    ) -> Self {
        Self {
            analytics,
            orders,
            products,
        }
    }

    pub fn dashboard(&self) -> Result<DashboardStats, DomainError> {
        let counts = self.analytics.status_counts()?;
        let (recent, _) = self.orders.list(
            &OrderFilter::default(),
            PageRequest::new(Some(1), Some(RECENT_ORDERS as i64)),
        )?;
        Ok(DashboardStats {
            total_orders: counts.iter().map(|(_, n)| n).sum(),
            total_revenue: self.analytics.revenue()?,
            total_customers: self.analytics.count_users(Role::Customer)?,
            total_products: self.products.count_active()?,
            orders_by_status: orders_by_status(&counts),
            low_stock_products: self
                .products
                .low_stock(LOW_STOCK_LIMIT)?
                .iter()
                .map(ProductSummary::from)
                .collect(),
            recent_orders: recent.iter().map(OrderSummary::from).collect(),
        })
    }

    /// Daily sales over the last `days` days, today included.
    pub fn sales_report(&self, days: i64) -> Result<SalesReport, DomainError> {
        if !(1..=MAX_REPORT_DAYS).contains(&days) {
            return Err(DomainError::validation(format!(
                "days must be between 1 and {MAX_REPORT_DAYS}"
            )));
        }
        let today = Utc::now().date_naive();
        let start = today - Duration::days(days - 1);
        let since = start.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();

        let records = self.analytics.sales_since(since)?;
        let sold = self.analytics.items_sold_since(since)?;
        let total_revenue = records
            .iter()
            .fold(BigDecimal::zero(), |acc, r| acc + &r.total_amount);

        Ok(SalesReport {
            days,
            total_orders: records.len() as i64,
            total_revenue,
            daily: daily_sales(&records, days, today),
            top_products: top_products(&sold, TOP_PRODUCTS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderStatus;
    use crate::testing::{new_product, MemoryStore};

    fn service(store: &MemoryStore) -> AdminService {
        AdminService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
        )
    }

    #[test]
    fn dashboard_excludes_cancelled_revenue() {
        let store = MemoryStore::new();
        let admin = service(&store);
        let customer = store.add_user("c@example.test", Role::Customer);
        store.add_user("a@example.test", Role::Admin);
        let whey = store.insert_product(new_product("Whey", "WH-1", 1000, 4));
        store.insert_product(new_product("Zinc", "ZN-1", 300, 50));

        store.seed_order(&customer, OrderStatus::Delivered, &[(&whey, 1)]);
        store.seed_order(&customer, OrderStatus::Cancelled, &[(&whey, 2)]);

        let stats = admin.dashboard().expect("dashboard");
        assert_eq!(stats.total_orders, 2);
        // 1000 + 400 standard shipping
        assert_eq!(stats.total_revenue, BigDecimal::from(1400));
        assert_eq!(stats.total_customers, 1);
        assert_eq!(stats.total_products, 2);
        assert_eq!(stats.orders_by_status["cancelled"], 1);
        assert_eq!(stats.orders_by_status["pending"], 0);
        assert_eq!(stats.low_stock_products.len(), 1);
        assert_eq!(stats.recent_orders.len(), 2);
    }

    #[test]
    fn sales_report_window_is_bounded() {
        let store = MemoryStore::new();
        let admin = service(&store);
        assert!(admin.sales_report(0).is_err());
        assert!(admin.sales_report(366).is_err());

        let customer = store.add_user("c@example.test", Role::Customer);
        let whey = store.insert_product(new_product("Whey", "WH-1", 1000, 40));
        store.seed_order(&customer, OrderStatus::Pending, &[(&whey, 3)]);

        let report = admin.sales_report(7).expect("report");
        assert_eq!(report.daily.len(), 7);
        assert_eq!(report.total_orders, 1);
        assert_eq!(report.daily[6].order_count, 1);
        assert_eq!(report.top_products[0].quantity_sold, 3);
    }
}
