/// Cluster tabs: per-workspace cluster binding and context switching
pub mod events;
pub mod manager;
pub mod models;
pub mod notify;
pub mod switcher;

pub use events::{ClusterEvent, EventBus, EventPublisher};
pub use manager::{ClusterTabManager, SwitchState, TabManagerOptions};
pub use models::{ClusterTab, TabCache, TabCacheUpdate, TabId};
pub use notify::{LogNotifier, Notifier};
pub use switcher::{SwitchError, ContextSwitcher};
