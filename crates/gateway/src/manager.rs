//! Process-wide registry mapping room id to its running `ContinuousController`.
//!
//! Grounded on the teacher's `NodeRegistry`/`SessionStore`: a
//! `parking_lot::RwLock<HashMap<...>>` guarding a shared-map, with handles
//! cheap enough to clone out of the lock before doing any awaiting.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;

use conclave_backend::BackendRegistry;
use conclave_domain::config::EngineConfig;
use conclave_domain::{AgentSpec, DiscussionContext, Error, Phase, Result};
use conclave_engine::{ParallelSvrEngine, SvrComputer};
use conclave_store::{RoomManifest, RoomStore};

use crate::cancel::CancelToken;
use crate::controller::{ContinuousController, ControllerCommand};
use crate::hub::protocol::ControlCommand;
use crate::hub::ClientHub;

const COMMAND_CHANNEL_CAPACITY: usize = 64;

struct ControllerHandle {
    command_tx: mpsc::Sender<ControllerCommand>,
    phase: Arc<Mutex<Phase>>,
    cancel: CancelToken,
}

#[derive(Debug, Clone, Copy)]
pub struct RoomStatus {
    pub phase: Phase,
}

pub struct FrameworkManager {
    config: Arc<EngineConfig>,
    backends: Arc<BackendRegistry>,
    store: Arc<dyn RoomStore>,
    hub: Arc<ClientHub>,
    controllers: RwLock<HashMap<String, ControllerHandle>>,
}

impl FrameworkManager {
    pub fn new(
        config: Arc<EngineConfig>,
        backends: Arc<BackendRegistry>,
        store: Arc<dyn RoomStore>,
        hub: Arc<ClientHub>,
    ) -> Self {
        Self {
            config,
            backends,
            store,
            hub,
            controllers: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn RoomStore> {
        &self.store
    }

    /// Look up a registered agent backend by platform id, for the
    /// connectivity-probe endpoint.
    pub fn backend(&self, platform_id: &str) -> Option<Arc<dyn conclave_backend::AgentBackend>> {
        self.backends.get(platform_id)
    }

    /// Create a room's on-disk layout. Does not start its discussion.
    pub fn create_room(&self, room_name: &str, participants: Vec<AgentSpec>) -> Result<RoomManifest> {
        let room_id = uuid::Uuid::new_v4().to_string();
        let manifest = RoomManifest::new(room_id, room_name, participants);
        self.store.create_room(&manifest)?;
        Ok(manifest)
    }

    pub fn delete_room(&self, room_id: &str) -> Result<()> {
        if self.is_active(room_id) {
            return Err(Error::AlreadyActive(format!(
                "room '{room_id}' is still running; stop it before deleting"
            )));
        }
        self.store.delete_room(room_id)
    }

    fn is_active(&self, room_id: &str) -> bool {
        self.controllers
            .read()
            .get(room_id)
            .map(|h| !matches!(*h.phase.lock(), Phase::Stopped))
            .unwrap_or(false)
    }

    /// Start a room's `ContinuousController`, replaying any persisted turns.
    /// Fails with `AlreadyActive` if a non-`Stopped` controller already
    /// exists for this room.
    pub fn start(&self, room_id: &str) -> Result<()> {
        if self.is_active(room_id) {
            return Err(Error::AlreadyActive(room_id.to_string()));
        }

        let manifest = self.store.load_manifest(room_id)?;
        let turns = self.store.read_turns(room_id)?;
        let mut context = DiscussionContext::from_turns(room_id, manifest.participants, turns);
        context.set_phase(Phase::Running);

        let computer = Arc::new(SvrComputer::new(self.config.svr_weights.clone()));
        let engine = ParallelSvrEngine::new(computer);

        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let cancel = CancelToken::new();
        let phase = Arc::new(Mutex::new(Phase::Running));

        let controller = ContinuousController::new(
            context,
            engine,
            self.backends.clone(),
            self.store.clone(),
            self.hub.clone(),
            self.config.clone(),
            cancel.clone(),
            phase.clone(),
            rx,
            tx.clone(),
        );

        tokio::spawn(controller.run());

        self.controllers.write().insert(
            room_id.to_string(),
            ControllerHandle {
                command_tx: tx,
                phase,
                cancel,
            },
        );
        tracing::info!(room_id, "discussion controller started");
        Ok(())
    }

    /// Pause, resume, or stop a running room. `Stop` also signals the
    /// room's `CancelToken` so an in-flight `Think` call is not awaited any
    /// further by the tick loop.
    pub async fn control(&self, room_id: &str, command: ControlCommand) -> Result<()> {
        let tx = {
            let controllers = self.controllers.read();
            let handle = controllers.get(room_id).ok_or_else(|| Error::RoomNotFound(room_id.to_string()))?;
            if command == ControlCommand::Stop {
                handle.cancel.cancel();
            }
            handle.command_tx.clone()
        };
        tx.send(ControllerCommand::Control(command))
            .await
            .map_err(|_| Error::RoomNotFound(room_id.to_string()))
    }

    pub async fn send_user_message(&self, room_id: &str, content: String) -> Result<()> {
        let tx = {
            let controllers = self.controllers.read();
            controllers
                .get(room_id)
                .ok_or_else(|| Error::RoomNotFound(room_id.to_string()))?
                .command_tx
                .clone()
        };
        tx.send(ControllerCommand::UserMessage(content))
            .await
            .map_err(|_| Error::RoomNotFound(room_id.to_string()))
    }

    pub fn status(&self, room_id: &str) -> Option<RoomStatus> {
        self.controllers.read().get(room_id).map(|h| RoomStatus { phase: *h.phase.lock() })
    }

    pub fn all_status(&self) -> HashMap<String, RoomStatus> {
        self.controllers
            .read()
            .iter()
            .map(|(id, h)| (id.clone(), RoomStatus { phase: *h.phase.lock() }))
            .collect()
    }
}
