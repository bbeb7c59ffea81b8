//! Presence Module
//!
//! Online/offline tracking and push notification of presence changes.
//!
//! # Architecture
//!
//! - **`counter`** - `PresenceCounter`, app-level socket counts per user
//! - **`broadcaster`** - `PresenceBroadcaster`, subscriber set and fan-out
//! - **`aware`** - `PresenceAwareRouter`, registry decorator that announces
//!   0→1 and 1→0 transitions
//!
//! # Presence Protocol
//!
//! A client opening the presence socket receives a `presence_snapshot` frame
//! with every online user, then one `presence` frame per transition. The
//! snapshot plus the ordered events are enough to rebuild the online set at any
//! time, so clients never reconcile a partial stream.

pub mod counter;

pub mod broadcaster;

pub mod aware;

pub use aware::PresenceAwareRouter;
pub use broadcaster::{PresenceBroadcaster, SubscriberSet};
pub use counter::PresenceCounter;
