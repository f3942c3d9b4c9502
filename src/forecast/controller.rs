//! Forecast controller: local mutations plus backend synchronization.
//!
//! Every mutation is applied to the local set immediately, then the set is
//! posted to the backend on a spawned task. The backend reply is
//! authoritative and replaces the local set wholesale. While a reply is
//! outstanding the controller is pending and ignores further mutations.

use super::host::ForecastHost;
use super::node::{ForecastLine, MoveNode};
use super::set::ForecastSet;
use super::transport::{ForecastResponse, ForecastTransport, SaveLocation};
use super::turn::TurnContext;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Forecast state handed over by the game page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
#[serde(rename_all = "camelCase")]
pub struct ForecastConfig {
    /// Whether the local player moves next.
    #[serde(default)]
    pub on_my_turn: bool,
    /// Forecasts already stored for this game.
    #[serde(default)]
    pub steps: Option<Vec<ForecastLine>>,
}

/// Why a call left the forecasts untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Ignored {
    /// A save is still waiting for its reply.
    #[display("A forecast save is still pending")]
    Pending,

    /// The line is too short or already covered by a stored forecast.
    #[display("Line is not a forecast candidate")]
    NotCandidate,

    /// Only the player to move can play a move.
    #[display("It is not the local player's turn")]
    NotMyTurn,

    /// Forecasts are only saved while waiting for the opponent.
    #[display("Forecasts are not saved on the local player's turn")]
    OwnTurn,

    /// No forecast at this index.
    #[display("No forecast at index {}", _0)]
    NoSuchIndex(usize),

    /// The call would sync, but there is no Tokio runtime to sync on.
    #[display("No async runtime to sync forecasts on")]
    NoRuntime,
}

/// Result of a controller call.
#[derive(Debug)]
pub enum Outcome {
    /// Nothing changed.
    Ignored(Ignored),
    /// The local set changed; nothing was sent to the backend.
    Applied,
    /// A request is in flight; the handle completes once its reply is applied.
    Syncing(JoinHandle<()>),
}

impl Outcome {
    /// Why the call was ignored, if it was.
    pub fn ignored(&self) -> Option<Ignored> {
        match self {
            Outcome::Ignored(reason) => Some(*reason),
            _ => None,
        }
    }

    /// Returns true when a request was sent.
    pub fn is_syncing(&self) -> bool {
        matches!(self, Outcome::Syncing(_))
    }

    /// Waits for the backend reply, if a request was sent.
    pub async fn wait(self) {
        if let Outcome::Syncing(handle) = self
            && let Err(e) = handle.await
        {
            warn!(error = %e, "Forecast sync task did not complete");
        }
    }
}

/// Persistence request prepared under the set lock.
#[derive(Debug)]
struct Request {
    path: String,
    payload: Vec<ForecastLine>,
    runtime: Handle,
}

struct Inner {
    turn: TurnContext,
    location: SaveLocation,
    set: Mutex<ForecastSet>,
    loading: watch::Sender<bool>,
    transport: Arc<dyn ForecastTransport>,
    host: Arc<dyn ForecastHost>,
}

/// Manages the forecasts of one player in one game.
///
/// Cloning yields another handle to the same forecasts. Calls that sync spawn
/// onto the current Tokio runtime; outside of one they are ignored with
/// [`Ignored::NoRuntime`].
#[derive(Clone)]
pub struct ForecastController {
    inner: Arc<Inner>,
}

impl ForecastController {
    /// Creates a controller seeded from the page configuration.
    #[instrument(skip(config, transport, host), fields(on_my_turn = config.on_my_turn))]
    pub fn new(
        config: ForecastConfig,
        location: SaveLocation,
        transport: Arc<dyn ForecastTransport>,
        host: Arc<dyn ForecastHost>,
    ) -> Self {
        let turn = TurnContext::from_on_my_turn(config.on_my_turn);
        let set = ForecastSet::new(turn, config.steps.unwrap_or_default());
        info!(forecasts = set.len(), turn = %turn, "Forecast controller ready");
        let (loading, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                turn,
                location,
                set: Mutex::new(set),
                loading,
                transport,
                host,
            }),
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Read access
    // ─────────────────────────────────────────────────────────────

    /// Whether the local player moves next.
    pub fn on_my_turn(&self) -> bool {
        self.inner.turn.is_my_turn()
    }

    /// Turn context fixed at construction.
    pub fn turn(&self) -> TurnContext {
        self.inner.turn
    }

    /// Where forecasts are saved.
    pub fn location(&self) -> &SaveLocation {
        &self.inner.location
    }

    /// Snapshot of the current forecasts, in order.
    pub fn list(&self) -> Vec<ForecastLine> {
        self.lock_set().lines().to_vec()
    }

    /// Returns true while a backend reply is outstanding.
    pub fn is_loading(&self) -> bool {
        *self.inner.loading.borrow()
    }

    /// Subscribes to changes of the pending flag.
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.inner.loading.subscribe()
    }

    /// Cuts a line back to the form it would be stored in.
    pub fn truncate(&self, line: &ForecastLine) -> ForecastLine {
        self.lock_set().truncate(line)
    }

    /// Returns true when `line` would be stored by [`Self::add_nodes`].
    pub fn is_candidate(&self, line: &ForecastLine) -> bool {
        self.lock_set().is_candidate(line)
    }

    /// Every forecast opening with `node`.
    pub fn find_starting_with_node(&self, node: &MoveNode) -> Vec<ForecastLine> {
        self.lock_set().find_starting_with_node(node)
    }

    // ─────────────────────────────────────────────────────────────
    //  Mutation
    // ─────────────────────────────────────────────────────────────

    /// Adds a forecast line, then saves.
    #[instrument(skip(self, line), fields(line = %line))]
    pub fn add_nodes(&self, line: ForecastLine) -> Outcome {
        let request = {
            let mut set = self.lock_set();
            if self.is_loading() {
                warn!("Ignoring new forecast while a save is pending");
                return Outcome::Ignored(Ignored::Pending);
            }
            let runtime = match self.save_runtime() {
                Ok(runtime) => runtime,
                Err(reason) => return Outcome::Ignored(reason),
            };
            if !set.add(line) {
                debug!("Ignoring line that is not a candidate");
                return Outcome::Ignored(Ignored::NotCandidate);
            }
            info!(forecasts = set.len(), "Forecast added");
            self.prepare_save(&set, runtime)
        };
        self.dispatch(request)
    }

    /// Removes the forecast at `index`, then saves.
    #[instrument(skip(self))]
    pub fn remove_index(&self, index: usize) -> Outcome {
        let request = {
            let mut set = self.lock_set();
            if self.is_loading() {
                warn!("Ignoring removal while a save is pending");
                return Outcome::Ignored(Ignored::Pending);
            }
            let runtime = match self.save_runtime() {
                Ok(runtime) => runtime,
                Err(reason) => return Outcome::Ignored(reason),
            };
            match set.remove(index) {
                Some(removed) => info!(removed = %removed, "Forecast removed"),
                None => {
                    debug!(forecasts = set.len(), "No forecast at index");
                    return Outcome::Ignored(Ignored::NoSuchIndex(index));
                }
            }
            self.prepare_save(&set, runtime)
        };
        self.dispatch(request)
    }

    /// Sends the full forecast set to the backend.
    ///
    /// Only meaningful while waiting for the opponent.
    #[instrument(skip(self))]
    pub fn save(&self) -> Outcome {
        let request = {
            let set = self.lock_set();
            if self.inner.turn.is_my_turn() {
                debug!("Not saving forecasts on own turn");
                return Outcome::Ignored(Ignored::OwnTurn);
            }
            if self.is_loading() {
                return Outcome::Ignored(Ignored::Pending);
            }
            let runtime = match self.runtime() {
                Ok(runtime) => runtime,
                Err(reason) => return Outcome::Ignored(reason),
            };
            self.prepare_save(&set, Some(runtime))
        };
        self.dispatch(request)
    }

    /// Plays `node` and keeps the forecasts that continue from it.
    ///
    /// Every forecast opening with `node` is sent without its first ply; the
    /// backend answers with the forecasts now stored.
    #[instrument(skip(self, node), fields(node = %node))]
    pub fn play_and_save(&self, node: &MoveNode) -> Outcome {
        let request = {
            let set = self.lock_set();
            if !self.inner.turn.is_my_turn() {
                warn!("Ignoring move played off turn");
                return Outcome::Ignored(Ignored::NotMyTurn);
            }
            if self.is_loading() {
                warn!("Ignoring move while a save is pending");
                return Outcome::Ignored(Ignored::Pending);
            }
            let runtime = match self.runtime() {
                Ok(runtime) => runtime,
                Err(reason) => return Outcome::Ignored(reason),
            };
            let payload = set.continuations_after(node);
            info!(continuations = payload.len(), "Playing move with forecasts");
            self.inner.loading.send_replace(true);
            Request {
                path: self.inner.location.play_path(&node.uci),
                payload,
                runtime,
            }
        };
        Outcome::Syncing(self.spawn_round_trip(request))
    }

    /// Marks the forecasts stale and reloads the game at its last ply.
    #[instrument(skip(self))]
    pub fn reload_to_last_ply(&self) {
        info!("Reloading game at last ply");
        self.inner.loading.send_replace(true);
        self.inner.host.redraw();
        self.inner.host.mark_last_ply();
        self.inner.host.reload();
    }

    // ─────────────────────────────────────────────────────────────
    //  Synchronization
    // ─────────────────────────────────────────────────────────────

    fn lock_set(&self) -> MutexGuard<'_, ForecastSet> {
        self.inner.set.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runtime the next round trip is spawned on.
    fn runtime(&self) -> Result<Handle, Ignored> {
        Handle::try_current().map_err(|e| {
            warn!(error = %e, "No runtime to sync forecasts on");
            Ignored::NoRuntime
        })
    }

    /// Runtime a save after a local change is spawned on.
    ///
    /// `None` on the local player's turn, where changes are not saved.
    fn save_runtime(&self) -> Result<Option<Handle>, Ignored> {
        if self.inner.turn.is_my_turn() {
            Ok(None)
        } else {
            self.runtime().map(Some)
        }
    }

    /// Builds the save request for `set` and marks the controller pending.
    ///
    /// Returns `None` when there is nothing to sync on.
    fn prepare_save(&self, set: &ForecastSet, runtime: Option<Handle>) -> Option<Request> {
        let runtime = runtime?;
        self.inner.loading.send_replace(true);
        Some(Request {
            path: self.inner.location.save_path(),
            payload: set.lines().to_vec(),
            runtime,
        })
    }

    fn dispatch(&self, request: Option<Request>) -> Outcome {
        match request {
            Some(request) => Outcome::Syncing(self.spawn_round_trip(request)),
            None => Outcome::Applied,
        }
    }

    fn spawn_round_trip(&self, request: Request) -> JoinHandle<()> {
        self.inner.host.redraw();
        let controller = self.clone();
        let runtime = request.runtime.clone();
        runtime.spawn(controller.round_trip(request))
    }

    #[instrument(skip_all, fields(path = %request.path, lines = request.payload.len()))]
    async fn round_trip(self, request: Request) {
        match self
            .inner
            .transport
            .post(&request.path, &request.payload)
            .await
        {
            Ok(response) => self.apply_response(response),
            // The reply never arrives as far as the controller is concerned.
            Err(e) => warn!(error = %e, "Forecast save failed, staying pending"),
        }
    }

    fn apply_response(&self, response: ForecastResponse) {
        if response.reload {
            self.reload_to_last_ply();
        } else {
            let steps = response.steps.unwrap_or_default();
            info!(forecasts = steps.len(), "Forecasts replaced by backend");
            let mut set = self.lock_set();
            set.replace(steps);
            self.inner.loading.send_replace(false);
        }
        self.inner.host.redraw();
    }
}

impl std::fmt::Debug for ForecastController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForecastController")
            .field("turn", &self.inner.turn)
            .field("location", &self.inner.location)
            .field("forecasts", &self.lock_set().len())
            .field("loading", &self.is_loading())
            .finish()
    }
}
