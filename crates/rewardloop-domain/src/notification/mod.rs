mod aggregate;
mod repository;
mod sender;

pub use aggregate::NotificationTarget;
pub use repository::NotificationTargetRepository;
pub use sender::{ContentType, PushMessage, PushSender};
