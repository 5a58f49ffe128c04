//! Order emails: rendering, SMTP delivery and the background worker that
//! drains the notification queue.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::domain::errors::DomainError;
use crate::domain::notification::{EmailMessage, Notification};
use crate::domain::ports::Mailer;

pub mod templates {
    use std::fmt::Write;

    use crate::domain::notification::{EmailMessage, Notification};
    use crate::domain::order::OrderStatus;

    fn escape(raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        for ch in raw.chars() {
            match ch {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#39;"),
                c => out.push(c),
            }
        }
        out
    }

    fn status_label(status: OrderStatus) -> &'static str {
        match status {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    fn wrap_html(title: &str, body: &str) -> String {
        format!(
            "<!DOCTYPE html><html><body style=\"font-family:Arial,sans-serif;color:#222\">\
             <h2>{}</h2>{body}<p style=\"color:#888;font-size:12px\">\
             This is an automated message, please do not reply.</p></body></html>",
            escape(title)
        )
    }

    pub fn render(notification: &Notification, currency: &str) -> EmailMessage {
        match notification {
            Notification::OrderConfirmation {
                to,
                customer_name,
                order,
            } => {
                let o = &order.order;
                let subject = format!("Order Confirmation - {}", o.order_number);

                let mut text = format!(
                    "Hi {customer_name},\n\nThank you for your order {}.\n\n",
                    o.order_number
                );
                let mut rows = String::new();
                for item in &order.items {
                    let _ = writeln!(
                        text,
                        "  {} x{} - {currency} {}",
                        item.product_name, item.quantity, item.total_price
                    );
                    let _ = write!(
                        rows,
                        "<tr><td>{}</td><td>{}</td><td>{currency} {}</td></tr>",
                        escape(&item.product_name),
                        item.quantity,
                        item.total_price
                    );
                }
                let _ = write!(
                    text,
                    "\nSubtotal: {currency} {}\nShipping: {currency} {}\nTotal: {currency} {}\n\n\
                     Payment method: {}\nShip to: {}, {}, {}\n",
                    o.subtotal,
                    o.shipping_amount,
                    o.total_amount,
                    o.payment_method,
                    o.shipping_address.full_name,
                    o.shipping_address.line1,
                    o.shipping_address.city
                );

                let body = format!(
                    "<p>Hi {},</p><p>Thank you for your order <strong>{}</strong>.</p>\
                     <table cellpadding=\"6\"><tr><th>Item</th><th>Qty</th><th>Total</th></tr>{rows}</table>\
                     <p>Subtotal: {currency} {}<br>Shipping: {currency} {}<br>\
                     <strong>Total: {currency} {}</strong></p>",
                    escape(customer_name),
                    escape(&o.order_number),
                    o.subtotal,
                    o.shipping_amount,
                    o.total_amount
                );
                EmailMessage {
                    to: to.clone(),
                    html: wrap_html(&subject, &body),
                    subject,
                    text,
                }
            }
            Notification::StatusUpdate {
                to,
                customer_name,
                order_number,
                previous,
                current,
                tracking_number,
            } => {
                let subject = format!(
                    "Order {order_number} is now {}",
                    status_label(*current)
                );
                let mut text = format!(
                    "Hi {customer_name},\n\nYour order {order_number} changed from {} to {}.\n",
                    status_label(*previous),
                    status_label(*current)
                );
                let mut body = format!(
                    "<p>Hi {},</p><p>Your order <strong>{}</strong> changed from {} to \
                     <strong>{}</strong>.</p>",
                    escape(customer_name),
                    escape(order_number),
                    status_label(*previous),
                    status_label(*current)
                );
                if let Some(tracking) = tracking_number {
                    let _ = writeln!(text, "Tracking number: {tracking}");
                    let _ = write!(body, "<p>Tracking number: {}</p>", escape(tracking));
                }
                EmailMessage {
                    to: to.clone(),
                    html: wrap_html(&subject, &body),
                    subject,
                    text,
                }
            }
            Notification::Cancellation {
                to,
                customer_name,
                order_number,
                total_amount,
            } => {
                let subject = format!("Order Cancelled - {order_number}");
                let text = format!(
                    "Hi {customer_name},\n\nYour order {order_number} for {currency} {total_amount} \
                     has been cancelled. Any payment made will be refunded.\n"
                );
                let body = format!(
                    "<p>Hi {},</p><p>Your order <strong>{}</strong> for {currency} {total_amount} \
                     has been cancelled. Any payment made will be refunded.</p>",
                    escape(customer_name),
                    escape(order_number)
                );
                EmailMessage {
                    to: to.clone(),
                    html: wrap_html(&subject, &body),
                    subject,
                    text,
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
    pub from_name: String,
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, DomainError> {
        let smtp_error = |e: lettre::transport::smtp::Error| {
            DomainError::Internal(format!("failed to create SMTP relay: {e}"))
        };
        // 465 speaks TLS from the first byte; anything else upgrades with STARTTLS.
        let mut builder = if settings.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host).map_err(smtp_error)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
                .map_err(smtp_error)?
        }
        .port(settings.port);
        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from = format!("{} <{}>", settings.from_name, settings.from_address)
            .parse()
            .map_err(|e| DomainError::Internal(format!("invalid from address: {e}")))?;
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    fn build_message(&self, email: &EmailMessage) -> Result<Message, DomainError> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| DomainError::Internal(format!("invalid recipient '{}': {e}", email.to)))?;
        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&email.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html.clone()),
                    ),
            )
            .map_err(|e| DomainError::Internal(format!("failed to build email: {e}")))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), DomainError> {
        let email = self.build_message(message)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| DomainError::Internal(format!("SMTP send failed: {e}")))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

/// Stand-in used when no SMTP server is configured: mail is only logged.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), DomainError> {
        log::info!("mail to {}: {}", message.to, message.subject);
        log::debug!("{}", message.text);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Renders and sends queued notifications until every sender is dropped.
/// Failures are logged and the notification is dropped.
pub fn spawn_worker(
    mailer: Arc<dyn Mailer>,
    mut rx: UnboundedReceiver<Notification>,
    currency: String,
) -> JoinHandle<()> {
    log::info!("mail worker started with the {} mailer", mailer.name());
    tokio::spawn(async move {
        while let Some(notification) = rx.recv().await {
            let message = templates::render(&notification, &currency);
            if let Err(e) = mailer.send(&message).await {
                log::error!("failed to send '{}' to {}: {e}", message.subject, message.to);
            }
        }
        log::info!("mail worker stopped");
    })
}
