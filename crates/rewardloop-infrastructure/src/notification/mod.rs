mod push;

pub use push::{PushApiConfig, PushApiSender};
