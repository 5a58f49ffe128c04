use bigdecimal::BigDecimal;

use super::order::{OrderDetails, OrderStatus};

/// Order lifecycle messages queued for email delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    OrderConfirmation {
        to: String,
        customer_name: String,
        order: OrderDetails,
    },
    StatusUpdate {
        to: String,
        customer_name: String,
        order_number: String,
        previous: OrderStatus,
        current: OrderStatus,
        tracking_number: Option<String>,
    },
    Cancellation {
        to: String,
        customer_name: String,
        order_number: String,
        total_amount: BigDecimal,
    },
}

impl Notification {
    pub fn recipient(&self) -> &str {
        match self {
            Notification::OrderConfirmation { to, .. }
            | Notification::StatusUpdate { to, .. }
            | Notification::Cancellation { to, .. } => to,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}
