pub mod game;
pub mod queue;
pub mod rewards;
pub mod score;
pub mod timer;

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::bank::{check_bank, load_bank, BankQuestion, CategoryConfig, Preset};
use crate::error::{BankError, FlowError};
use crate::protocol::ServerMessage;
use crate::replication::{inbound_state, Replicator, SyncPayload};
use crate::sanitize::sanitize_state;
use crate::types::*;

use self::rewards::RewardSummary;

/// Where bank files are looked up and how strictly they are checked
#[derive(Debug, Clone)]
pub struct BankSource {
    pub data_dir: PathBuf,
    pub strict: bool,
}

impl Default for BankSource {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            strict: false,
        }
    }
}

/// Shared application state.
///
/// Owns the authoritative `GameState` for one role. A host owner mutates and
/// publishes; a viewer owner only applies what it receives.
#[derive(Clone)]
pub struct AppState {
    role: Role,
    pub(crate) game: Arc<RwLock<GameState>>,
    /// Full bank projected onto queue questions
    pub(crate) bank: Arc<RwLock<Vec<Question>>>,
    pub(crate) category_config: Arc<RwLock<CategoryConfig>>,
    bank_status: Arc<RwLock<BankStatus>>,
    bank_source: BankSource,
    pub replicator: Replicator,
    /// Broadcast channel for viewer-only messages (timer ticks)
    pub viewer_broadcast: broadcast::Sender<ServerMessage>,
}

/// Currently loaded bank, as shown on the host panel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BankStatus {
    pub filename: String,
    pub questions: usize,
    pub errors: Vec<String>,
}

impl AppState {
    pub fn new(role: Role) -> Self {
        Self::with_replicator(role, Replicator::in_memory())
    }

    pub fn with_replicator(role: Role, replicator: Replicator) -> Self {
        let (tx, _rx) = broadcast::channel(100);
        Self {
            role,
            game: Arc::new(RwLock::new(GameState::default())),
            bank: Arc::new(RwLock::new(Vec::new())),
            category_config: Arc::new(RwLock::new(CategoryConfig::default())),
            bank_status: Arc::new(RwLock::new(BankStatus::default())),
            bank_source: BankSource::default(),
            replicator,
            viewer_broadcast: tx,
        }
    }

    pub fn with_bank_source(mut self, source: BankSource) -> Self {
        self.bank_source = source;
        self
    }

    pub fn is_host(&self) -> bool {
        self.role == Role::Host
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> GameState {
        self.game.read().await.clone()
    }

    pub async fn screen(&self) -> Screen {
        self.game.read().await.screen()
    }

    // =========================================================================
    // Bank
    // =========================================================================

    /// Replace the active bank and reset the category configuration
    pub async fn install_bank(
        &self,
        filename: &str,
        records: Vec<BankQuestion>,
        errors: Vec<String>,
    ) {
        let config = CategoryConfig::from_bank(&records);
        let questions: Vec<Question> = records.iter().map(BankQuestion::to_question).collect();

        tracing::info!(
            "Installed bank {} ({} questions, {} categories)",
            filename,
            questions.len(),
            config.entries.len()
        );

        *self.bank_status.write().await = BankStatus {
            filename: filename.to_string(),
            questions: questions.len(),
            errors,
        };
        *self.bank.write().await = questions;
        *self.category_config.write().await = config;
    }

    /// Load another bank file from the data directory by name.
    ///
    /// Returns the (non-fatal) validation messages on success.
    pub async fn select_bank(&self, filename: &str) -> Result<Vec<String>, BankError> {
        if !self.is_host() {
            return Ok(Vec::new());
        }
        let path = self.bank_path(filename)?;
        let records = load_bank(&path).await?;
        let errors = check_bank(&records, self.bank_source.strict)?;
        self.install_bank(filename, records, errors.clone()).await;
        Ok(errors)
    }

    fn bank_path(&self, filename: &str) -> Result<PathBuf, BankError> {
        let name = filename.trim();
        let plain = !name.is_empty()
            && name.ends_with(".json")
            && Path::new(name).file_name().is_some_and(|f| f == name);
        if !plain {
            return Err(BankError::InvalidName(filename.to_string()));
        }
        Ok(self.bank_source.data_dir.join(name))
    }

    pub async fn bank_status(&self) -> BankStatus {
        self.bank_status.read().await.clone()
    }

    pub async fn category_config(&self) -> CategoryConfig {
        self.category_config.read().await.clone()
    }

    pub async fn set_category_quantity(
        &self,
        category: &str,
        quantity: i64,
    ) -> Result<(), FlowError> {
        if !self.is_host() {
            return Ok(());
        }
        let mut config = self.category_config.write().await;
        if !config.set_quantity(category, quantity) {
            return Err(FlowError::UnknownCategory(category.to_string()));
        }
        tracing::debug!(
            "Category {} set to {} question(s)",
            category,
            config.quantity(category).unwrap_or(0)
        );
        Ok(())
    }

    pub async fn apply_preset(&self, preset: Preset) {
        if !self.is_host() {
            return;
        }
        let mut config = self.category_config.write().await;
        config.apply_preset(preset);
        tracing::info!("Applied {:?} preset ({} questions)", preset, config.total());
    }

    pub async fn reward_summary(&self) -> RewardSummary {
        self.game.read().await.reward_summary()
    }

    // =========================================================================
    // Replication (viewer side) and import
    // =========================================================================

    /// Apply an inbound payload. Returns true when the local state changed.
    ///
    /// The host never applies inbound state; payloads without a usable
    /// `state` are ignored.
    pub async fn apply_incoming(&self, payload: &Value) -> bool {
        if self.is_host() {
            return false;
        }
        let Some(raw) = inbound_state(payload) else {
            tracing::debug!("Ignoring payload without state");
            return false;
        };
        let state = sanitize_state(raw);
        *self.game.write().await = state;
        true
    }

    pub async fn apply_payload(&self, payload: &SyncPayload) -> bool {
        match serde_json::to_value(payload) {
            Ok(value) => self.apply_incoming(&value).await,
            Err(_) => false,
        }
    }

    /// Read the snapshot slot once (late-joiner bootstrap)
    pub async fn bootstrap_from_snapshot(&self) -> bool {
        match self.replicator.load_snapshot().await {
            Some(payload) => {
                let applied = self.apply_payload(&payload).await;
                if applied {
                    tracing::info!("Bootstrapped from snapshot (ts {})", payload.ts);
                }
                applied
            }
            None => false,
        }
    }

    /// Replace the state with an imported document (host save/load)
    pub async fn import_state(&self, raw: &Value) -> bool {
        if !self.is_host() {
            return false;
        }
        let imported = sanitize_state(raw);
        let mut game = self.game.write().await;
        *game = imported;
        tracing::info!(
            "Imported state: {} team(s), {} question(s)",
            game.teams.len(),
            game.session.queue.len()
        );
        self.replicator.publish(&game).await;
        true
    }
}
