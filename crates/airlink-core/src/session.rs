// ── Per-device session state ──
//
// One `DeviceSession` per registered device, exclusively owned by the
// engine. All mutable state is session-scoped; nothing is shared across
// devices, so one device's failures never affect another's.

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use airlink_gateway::DeviceAddress;

use crate::config::DeviceConfig;
use crate::model::{DeviceId, StatusSnapshot};

/// Circuit-breaker bookkeeping, guarded together so the error count and
/// the suspended flag can never disagree.
#[derive(Debug, Default)]
pub(crate) struct BreakerState {
    pub(crate) consecutive_errors: u32,
    pub(crate) suspended: bool,
}

/// The polling task currently attached to a session, if any.
///
/// `None` while the session is suspended. The token cancels the task;
/// the handle lets teardown wait for it to actually exit.
pub(crate) type PollTask = Option<(CancellationToken, JoinHandle<()>)>;

pub(crate) struct DeviceSession {
    pub(crate) id: DeviceId,
    pub(crate) config: DeviceConfig,
    pub(crate) address: DeviceAddress,

    /// Cancelled when the session is torn down. Poll tasks are spawned as
    /// children of this token, so a task respawned by a probe that was
    /// still in flight during deregistration exits immediately instead of
    /// polling a removed device.
    pub(crate) lifetime: CancellationToken,

    /// Exposed status view. Safe-default substituted after a failed
    /// refresh so consumers never observe a stale "on" state.
    pub(crate) status_tx: watch::Sender<Option<StatusSnapshot>>,

    /// Last successfully normalized snapshot -- the raw provenance the
    /// next sparse payload is merged against. Survives safe-default
    /// substitution so recovery restores live values immediately.
    pub(crate) last_good: Mutex<Option<StatusSnapshot>>,

    pub(crate) breaker: Mutex<BreakerState>,

    /// In-flight guard: a refresh holds this for its whole duration, and
    /// an overlapping caller that fails `try_lock` is served from cache.
    pub(crate) refresh_gate: Mutex<()>,

    pub(crate) poll_task: Mutex<PollTask>,
}

impl DeviceSession {
    pub(crate) fn new(id: DeviceId, config: DeviceConfig, lifetime: CancellationToken) -> Self {
        let address = DeviceAddress {
            id: id.to_string(),
            host: config.host.clone(),
            transport: config.transport,
        };
        let (status_tx, _) = watch::channel(None);

        Self {
            id,
            config,
            address,
            lifetime,
            status_tx,
            last_good: Mutex::new(None),
            breaker: Mutex::new(BreakerState::default()),
            refresh_gate: Mutex::new(()),
            poll_task: Mutex::new(None),
        }
    }

    /// Current exposed snapshot, or the safe default before the first
    /// refresh completes.
    pub(crate) fn exposed_or_default(&self) -> StatusSnapshot {
        self.status_tx
            .borrow()
            .clone()
            .unwrap_or_else(StatusSnapshot::safe_default)
    }
}
