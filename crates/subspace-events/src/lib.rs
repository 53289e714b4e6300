pub mod bus;
pub mod notification;

pub use bus::{EventBus, GameEvent};
pub use notification::{GameNotification, NotificationSystem, TextColor};
