use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::domain::notification::Notification;

/// Sending half of the email queue. Handing a notification over never blocks
/// the request and never fails it; delivery happens on the mail worker.
#[derive(Clone)]
pub struct Notifier {
    tx: UnboundedSender<Notification>,
}

impl Notifier {
    pub fn channel() -> (Self, UnboundedReceiver<Notification>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn notify(&self, notification: Notification) {
        if let Err(e) = self.tx.send(notification) {
            log::warn!("mail worker is gone, dropping mail to {}", e.0.recipient());
        }
    }
}
