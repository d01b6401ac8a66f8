//! Pulsemon notification core.
//!
//! Building blocks for the dashboard's notification subsystem:
//! - Capacity-bounded, newest-first record store
//! - Typed synchronous event bus for UI panels
//! - Best-effort persistence of the record list to a single JSON slot
//! - The delivery channel client feeding server alerts into the service
//!
//! [`NotificationService`] composes all of the above and is the only entry
//! point for mutations.

pub mod bus;
pub mod channel;
pub mod notification;
pub mod persist;
pub mod service;
pub mod store;

pub use bus::{EventKind, NotificationBus, NotificationEvent, SubscriptionId};
pub use channel::{
    ChannelConfig, ChannelError, ChannelResult, DeliveryChannel, IntoChannelReport, MetricsSample,
    PushFrame, ServerAlert,
};
pub use notification::{Notification, NotificationAction, NotificationKind, NotificationOptions};
pub use persist::{FileSlot, MemorySlot, NotificationSlot, PersistError, SLOT_FILE};
pub use service::{DEFAULT_ALERT_TITLE, NotificationService, ServerEvent, ServiceConfig};
pub use store::{DEFAULT_CAPACITY, NotificationStore};
