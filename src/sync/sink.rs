use crate::objects::Notification;
use std::cell::RefCell;

/// The transient display surface notifications are routed to.
pub trait NotificationSink {
    fn notify(&self, notification: Notification);
}

impl NotificationSink for RefCell<Vec<Notification>> {
    fn notify(&self, notification: Notification) {
        self.borrow_mut().push(notification);
    }
}
