//! Host -> viewer replication.
//!
//! The host publishes the whole state after every mutation. A publish goes to
//! two places: an in-process broadcast channel for connected viewers, and a
//! last-write-wins snapshot slot that late joiners read once on startup.
//! There is exactly one writer, so the latest payload always wins and is
//! applied wholesale.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use crate::error::SnapshotError;
use crate::sanitize::truthy;
use crate::types::GameState;

/// Wire protocol version carried in every payload
pub const PROTOCOL_VERSION: u32 = 1;
/// Name of the live channel (used in logs)
pub const CHANNEL_NAME: &str = "trivia_night_sync_v1";
/// Key of the persisted snapshot slot
pub const STORAGE_KEY: &str = "trivia_night_state_v1";

const CHANNEL_CAPACITY: usize = 100;

/// `{ v, ts, state }` as sent to viewers and stored in the slot.
///
/// `state` is kept as raw JSON: receivers treat it as untrusted and run it
/// through the sanitizer before use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncPayload {
    pub v: u32,
    pub ts: i64,
    pub state: Value,
}

impl SyncPayload {
    pub fn from_state(state: &GameState) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            ts: chrono::Utc::now().timestamp_millis(),
            state: serde_json::to_value(state).unwrap_or_default(),
        }
    }
}

/// The state carried by an inbound payload, if it has a usable one
pub fn inbound_state(payload: &Value) -> Option<&Value> {
    payload.get("state").filter(|s| truthy(Some(s)))
}

/// A durable last-write-wins key/value slot
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn save(&self, key: &str, text: String) -> Result<(), SnapshotError>;
    async fn load(&self, key: &str) -> Result<Option<String>, SnapshotError>;
}

/// Stores each key as `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn save(&self, key: &str, text: String) -> Result<(), SnapshotError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, text).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<String>, SnapshotError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local slot
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    slots: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn save(&self, key: &str, text: String) -> Result<(), SnapshotError> {
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(key.to_string(), text);
        }
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<String>, SnapshotError> {
        Ok(self
            .slots
            .lock()
            .ok()
            .and_then(|slots| slots.get(key).cloned()))
    }
}

/// Publish/subscribe with a late-joiner snapshot
#[derive(Clone)]
pub struct Replicator {
    tx: broadcast::Sender<SyncPayload>,
    store: Arc<dyn SnapshotStore>,
    key: String,
}

impl Replicator {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            store,
            key: STORAGE_KEY.to_string(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySnapshotStore::default()))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncPayload> {
        self.tx.subscribe()
    }

    /// Send the state to live viewers and mirror it into the slot.
    ///
    /// Fire-and-forget: no receivers and slot failures are not errors.
    pub async fn publish(&self, state: &GameState) -> SyncPayload {
        let payload = SyncPayload::from_state(state);

        let receivers = self.tx.send(payload.clone()).unwrap_or(0);
        tracing::debug!(
            "Published state on {} to {} receiver(s)",
            CHANNEL_NAME,
            receivers
        );

        match serde_json::to_string(&payload) {
            Ok(text) => {
                if let Err(e) = self.store.save(&self.key, text).await {
                    tracing::debug!("Snapshot write ignored: {}", e);
                }
            }
            Err(e) => tracing::debug!("Snapshot encode ignored: {}", e),
        }

        payload
    }

    /// Read the last persisted payload. Unreadable slots yield `None`.
    pub async fn load_snapshot(&self) -> Option<SyncPayload> {
        let text = match self.store.load(&self.key).await {
            Ok(text) => text?,
            Err(e) => {
                tracing::debug!("Snapshot read ignored: {}", e);
                return None;
            }
        };
        let raw: Value = serde_json::from_str(&text).ok()?;
        let state = inbound_state(&raw)?.clone();
        Some(SyncPayload {
            v: raw
                .get("v")
                .and_then(Value::as_u64)
                .map(|v| v as u32)
                .unwrap_or(PROTOCOL_VERSION),
            ts: raw.get("ts").and_then(Value::as_i64).unwrap_or(0),
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::sanitize_state;
    use crate::state::score::tests::question;
    use crate::types::{Difficulty, Media};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    #[test]
    fn test_payload_shape() {
        let payload = SyncPayload::from_state(&GameState::default());
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["v"], 1);
        assert!(value["ts"].as_i64().unwrap() > 0);
        assert!(value["state"]["teams"].is_array());
    }

    #[test]
    fn test_inbound_state_requires_state_field() {
        assert!(inbound_state(&json!({"v": 1})).is_none());
        assert!(inbound_state(&json!({"state": null})).is_none());
        assert!(inbound_state(&json!("state")).is_none());
        assert!(inbound_state(&json!({"state": {}})).is_some());
    }

    /// A mid-game state touching every part of the model
    fn mid_game_state() -> GameState {
        let mut rng = StdRng::seed_from_u64(21);
        let mut state = GameState::default();
        state
            .confirm_teams(&["Elves".to_string(), "Reindeer".to_string()])
            .unwrap();

        let mut video = question("v", "Entertainment (Film)", Difficulty::Hard);
        video.media = Some(Media::Video {
            src: "clips/intro.mp4".to_string(),
            title: "Intro".to_string(),
            poster: "clips/intro.jpg".to_string(),
        });
        video.host_notes = "Play twice".to_string();
        let mut image = question("i", "History (Art)", Difficulty::VeryHard);
        image.media = Some(Media::Image {
            src: "img/painting.png".to_string(),
            title: String::new(),
        });
        let christmas = question("x", "Maths (Algebra)", Difficulty::ChristmasHard);

        state
            .start_session(vec![christmas, video, image], &mut rng)
            .unwrap();
        state.reveal_answer().unwrap();
        let elves = state.teams[0].id.clone();
        state.toggle_correct(&elves).unwrap();
        state.timer.set_duration(45);
        state.timer.start(1_700_000_000_000);
        state.projector_light = true;
        state
    }

    #[test]
    fn test_round_trip_through_json_text() {
        let state = mid_game_state();
        assert!(state.session.christmas_reward.is_some());
        assert_eq!(state.rewards.remaining.len(), 11);
        assert_eq!(state.teams[0].rewards.active_days().len(), 1);

        let payload = SyncPayload::from_state(&state);
        let text = serde_json::to_string(&payload).unwrap();
        let decoded: Value = serde_json::from_str(&text).unwrap();

        let received = sanitize_state(inbound_state(&decoded).unwrap());
        assert_eq!(received, state);
    }

    #[tokio::test]
    async fn test_publish_reaches_subscribers_and_slot() {
        let replicator = Replicator::in_memory();
        let mut rx = replicator.subscribe();

        let mut state = GameState::default();
        state.teams_locked = true;
        replicator.publish(&state).await;

        let received = rx.recv().await.unwrap();
        assert_eq!(received.state["teamsLocked"], true);

        let snapshot = replicator.load_snapshot().await.unwrap();
        assert_eq!(snapshot.state, received.state);
    }

    #[tokio::test]
    async fn test_publish_without_receivers() {
        let replicator = Replicator::in_memory();
        let payload = replicator.publish(&GameState::default()).await;
        assert_eq!(payload.v, PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn test_messages_arrive_in_send_order() {
        let replicator = Replicator::in_memory();
        let mut rx = replicator.subscribe();

        for light in [true, false, true] {
            let state = GameState {
                projector_light: light,
                ..GameState::default()
            };
            replicator.publish(&state).await;
        }

        for expected in [true, false, true] {
            let payload = rx.recv().await.unwrap();
            assert_eq!(payload.state["projectorLight"], expected);
        }
    }

    #[tokio::test]
    async fn test_file_store_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("snapshots"));

        assert!(store.load(STORAGE_KEY).await.unwrap().is_none());
        store.save(STORAGE_KEY, "first".to_string()).await.unwrap();
        store.save(STORAGE_KEY, "second".to_string()).await.unwrap();
        assert_eq!(
            store.load(STORAGE_KEY).await.unwrap().as_deref(),
            Some("second")
        );
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_ignored() {
        let store = Arc::new(MemorySnapshotStore::default());
        store
            .save(STORAGE_KEY, "{not json".to_string())
            .await
            .unwrap();
        let replicator = Replicator::new(store.clone());
        assert!(replicator.load_snapshot().await.is_none());

        store
            .save(STORAGE_KEY, r#"{"v": 1, "ts": 5}"#.to_string())
            .await
            .unwrap();
        assert!(replicator.load_snapshot().await.is_none());
    }

    struct FailingStore;

    #[async_trait]
    impl SnapshotStore for FailingStore {
        async fn save(&self, _key: &str, _text: String) -> Result<(), SnapshotError> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "quota").into())
        }

        async fn load(&self, _key: &str) -> Result<Option<String>, SnapshotError> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into())
        }
    }

    #[tokio::test]
    async fn test_store_failures_do_not_block_broadcast() {
        let replicator = Replicator::new(Arc::new(FailingStore));
        let mut rx = replicator.subscribe();

        replicator.publish(&GameState::default()).await;
        assert!(rx.recv().await.is_ok());
        assert!(replicator.load_snapshot().await.is_none());
    }
}
