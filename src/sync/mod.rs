//! External Collaborators
//!
//! Interfaces for the services outside the core: the roster mutation service
//! and the notification channel. Both are consumed after core transactions
//! commit; neither can invalidate a committed decision.

pub mod notifier;
pub mod whitelist;

pub use notifier::{LogNotifier, Notifier, NotifyEvent};
pub use whitelist::{DisabledWhitelistSync, HttpWhitelistSync, WhitelistSync};
