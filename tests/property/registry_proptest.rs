//! Property-based tests for presence accounting
//!
//! Random connect/disconnect sequences are checked against a plain model of
//! which connection slots each user holds.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use moehub::backend::hub::ConnectionRegistry;
use moehub::backend::presence::{PresenceAwareRouter, PresenceBroadcaster};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

use crate::common::RecordingConnection;

#[derive(Debug, Clone, Copy)]
enum Op {
    Connect { user: usize, slot: usize },
    Disconnect { user: usize, slot: usize },
}

fn op() -> impl Strategy<Value = Op> {
    (0..3usize, 0..3usize, any::<bool>()).prop_map(|(user, slot, connect)| {
        if connect {
            Op::Connect { user, slot }
        } else {
            Op::Disconnect { user, slot }
        }
    })
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn test_online_iff_some_connection_is_open(ops in prop::collection::vec(op(), 0..60)) {
        runtime().block_on(async move {
            let registry = Arc::new(ConnectionRegistry::new());
            let router = PresenceAwareRouter::new(registry.clone(), Arc::new(PresenceBroadcaster::new()));
            let mut watcher = RecordingConnection::new();
            router.subscribe("watcher", watcher.handle.clone()).await.unwrap();
            watcher.drain();

            let mut model: HashMap<usize, HashSet<usize>> = HashMap::new();
            let mut open: HashMap<(usize, usize), RecordingConnection> = HashMap::new();
            let mut expected_events: Vec<(String, bool)> = Vec::new();

            for op in ops {
                match op {
                    Op::Connect { user, slot } => {
                        if open.contains_key(&(user, slot)) {
                            continue;
                        }
                        let conn = RecordingConnection::new();
                        let slots = model.entry(user).or_default();
                        let was_empty = slots.is_empty();
                        slots.insert(slot);

                        let became_online = router.connect(&format!("u{user}"), conn.handle.clone()).await;
                        prop_assert_eq!(became_online, was_empty);
                        if became_online {
                            expected_events.push((format!("u{user}"), true));
                        }
                        open.insert((user, slot), conn);
                    }
                    Op::Disconnect { user, slot } => {
                        let conn_id = match open.remove(&(user, slot)) {
                            Some(conn) => conn.handle.id(),
                            None => RecordingConnection::new().handle.id(),
                        };
                        let slots = model.entry(user).or_default();
                        let had_slot = slots.remove(&slot);
                        let now_empty = had_slot && slots.is_empty();

                        let went_offline = router.disconnect(&format!("u{user}"), conn_id).await;
                        prop_assert_eq!(went_offline, now_empty);
                        if went_offline {
                            expected_events.push((format!("u{user}"), false));
                        }
                    }
                }

                for user in 0..3usize {
                    let expected = model.get(&user).is_some_and(|s| !s.is_empty());
                    let id = format!("u{user}");
                    prop_assert_eq!(registry.is_online(&id).await, expected);
                    let count = model.get(&user).map_or(0, HashSet::len);
                    prop_assert_eq!(registry.connection_count(&id).await, count);
                }
            }

            let expected_online: HashSet<String> = model
                .iter()
                .filter(|(_, slots)| !slots.is_empty())
                .map(|(user, _)| format!("u{user}"))
                .collect();
            prop_assert_eq!(registry.list_online().await, expected_online);

            let events: Vec<(String, bool)> = watcher
                .drain()
                .into_iter()
                .map(|f| (f["user_id"].as_str().unwrap_or_default().to_string(), f["online"] == true))
                .collect();
            prop_assert_eq!(events, expected_events);

            Ok::<(), TestCaseError>(())
        })?;
    }
}
