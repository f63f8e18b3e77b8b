// ── Engine facade ──
//
// Full lifecycle management for a fleet of polled devices. Handles
// registration, the per-device polling timer, circuit breaking after
// repeated failures, recovery detection, and the command surface.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use airlink_gateway::{Fault, Gateway, RetryPolicy, with_retry};

use crate::config::{DeviceConfig, ERROR_THRESHOLD};
use crate::error::CoreError;
use crate::model::{DeviceId, OperatingMode, StatusSnapshot};
use crate::normalize::normalize;
use crate::session::DeviceSession;

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc`. One session per registered device; each
/// session owns its timer, snapshot cache, error counter, and breaker
/// state. Reads ([`get_snapshot`](Self::get_snapshot)) never fail past
/// the lookup; writes ([`set_power`](Self::set_power) and friends)
/// propagate their failure so the caller can report it.
pub struct Bridge<G: Gateway> {
    inner: Arc<BridgeInner<G>>,
}

impl<G: Gateway> Clone for Bridge<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct BridgeInner<G> {
    gateway: G,
    sessions: DashMap<DeviceId, Arc<DeviceSession>>,
    /// Root token -- cancelled on shutdown, parent of every poll task's
    /// token so one cancel reaches them all.
    cancel: CancellationToken,
}

impl<G: Gateway> Bridge<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                gateway,
                sessions: DashMap::new(),
                cancel: CancellationToken::new(),
            }),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Register a device and start polling it.
    ///
    /// Validates the configuration first -- invalid values fail
    /// registration rather than defaulting silently. The first poll fires
    /// immediately, then every `poll_interval`.
    pub async fn register_device(
        &self,
        id: DeviceId,
        config: DeviceConfig,
    ) -> Result<(), CoreError> {
        config.validate()?;

        let session = match self.inner.sessions.entry(id.clone()) {
            Entry::Occupied(_) => {
                return Err(CoreError::AlreadyRegistered { id: id.to_string() });
            }
            Entry::Vacant(vacant) => {
                let session = Arc::new(DeviceSession::new(
                    id.clone(),
                    config,
                    self.inner.cancel.child_token(),
                ));
                vacant.insert(Arc::clone(&session));
                session
            }
        };

        info!(device = %id, host = %session.config.host, "registered device");
        self.spawn_poll_task(&session, true).await;
        Ok(())
    }

    /// Deregister a device: cancel its timer, wait for the poll task to
    /// exit, and drop the session. No callbacks from a torn-down session
    /// can fire afterwards.
    pub async fn deregister_device(&self, id: &DeviceId) -> Result<(), CoreError> {
        let Some((_, session)) = self.inner.sessions.remove(id) else {
            return Err(CoreError::DeviceNotFound { id: id.to_string() });
        };

        // Cancelling the session lifetime also neuters any poll task a
        // still-in-flight probe might respawn after this point.
        session.lifetime.cancel();

        // Take the task out before awaiting it: a tripping breaker inside
        // the task needs this same mutex to stop its own timer.
        let task = session.poll_task.lock().await.take();
        if let Some((_, handle)) = task {
            let _ = handle.await;
        }

        info!(device = %id, "deregistered device");
        Ok(())
    }

    /// Cancel every poll task and wait for them to exit.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let sessions: Vec<Arc<DeviceSession>> = self
            .inner
            .sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        for session in sessions {
            let task = session.poll_task.lock().await.take();
            if let Some((_, handle)) = task {
                let _ = handle.await;
            }
        }
        debug!("bridge shut down");
    }

    /// Ids of all registered devices.
    pub fn devices(&self) -> Vec<DeviceId> {
        self.inner
            .sessions
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    // ── One-shot convenience ─────────────────────────────────────────

    /// One-shot: register a single device without periodic polling, run
    /// the closure, shut down.
    ///
    /// Optimized for CLI invocations that need a single request-response
    /// cycle; on-demand reads and commands still flow through the full
    /// retry pipeline and in-flight guard.
    pub async fn oneshot<F, Fut, T>(
        gateway: G,
        id: DeviceId,
        config: DeviceConfig,
        f: F,
    ) -> Result<T, CoreError>
    where
        F: FnOnce(Self) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        config.validate()?;

        let bridge = Self::new(gateway);
        let session = Arc::new(DeviceSession::new(
            id.clone(),
            config,
            bridge.inner.cancel.child_token(),
        ));
        bridge.inner.sessions.insert(id, session);

        let result = f(bridge.clone()).await;
        bridge.shutdown().await;
        result
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Current status snapshot.
    ///
    /// `force_refresh` fetches fresh state through the full retry
    /// pipeline; this is also the manual probe path that works while a
    /// session is suspended, which is how recovery is detected. Without
    /// it, the cached snapshot is returned when one exists.
    pub async fn get_snapshot(
        &self,
        id: &DeviceId,
        force_refresh: bool,
    ) -> Result<StatusSnapshot, CoreError> {
        let session = self.session(id)?;

        if !force_refresh {
            if let Some(snapshot) = session.status_tx.borrow().clone() {
                return Ok(snapshot);
            }
        }

        Ok(self.refresh_session(&session).await)
    }

    /// Subscribe to snapshot changes for one device.
    ///
    /// The receiver observes the exposed view: live values while the
    /// device answers, the safe default while it does not.
    pub fn subscribe(
        &self,
        id: &DeviceId,
    ) -> Result<watch::Receiver<Option<StatusSnapshot>>, CoreError> {
        Ok(self.session(id)?.status_tx.subscribe())
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Switch the device on or off.
    pub async fn set_power(&self, id: &DeviceId, on: bool) -> Result<(), CoreError> {
        self.send_command(id, "pwr", if on { "1" } else { "0" })
            .await
    }

    /// Select an operating mode.
    pub async fn set_mode(&self, id: &DeviceId, mode: OperatingMode) -> Result<(), CoreError> {
        let code = match mode {
            OperatingMode::Automatic => "A",
            OperatingMode::Manual => "M",
            OperatingMode::Sleep => "S",
            OperatingMode::Unknown => {
                return Err(CoreError::Validation {
                    field: "mode".into(),
                    reason: "cannot command the unknown mode".into(),
                });
            }
        };
        self.send_command(id, "mode", code).await
    }

    /// Set the fan speed as a 0-100 percentage.
    ///
    /// Zero is a power-off; anything else maps onto the device's native
    /// 1-3 level scale.
    pub async fn set_fan_percent(&self, id: &DeviceId, percent: u8) -> Result<(), CoreError> {
        if percent > 100 {
            return Err(CoreError::Validation {
                field: "fan_percent".into(),
                reason: format!("must be 0-100, got {percent}"),
            });
        }
        if percent == 0 {
            return self.set_power(id, false).await;
        }

        #[allow(clippy::as_conversions, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let level = ((f64::from(percent) / 100.0 * 3.0).round() as u8).clamp(1, 3);
        self.send_command(id, "om", &level.to_string()).await
    }

    // ── Refresh pipeline ─────────────────────────────────────────────

    /// Run one refresh for a session, or serve the cached view if one is
    /// already in flight. This is the only place gateway status calls
    /// originate, so the in-flight guard here is the overlap-prevention
    /// invariant: at most one outstanding refresh per device.
    async fn refresh_session(&self, session: &Arc<DeviceSession>) -> StatusSnapshot {
        let Ok(_gate) = session.refresh_gate.try_lock() else {
            debug!(device = %session.id, "refresh already in flight, serving cached snapshot");
            return session.exposed_or_default();
        };

        let policy = RetryPolicy::with_retries(session.config.max_retries);
        let timeout = session.config.call_timeout;
        let result = with_retry(&policy, Fault::is_transient, || {
            self.inner
                .gateway
                .fetch_status(&session.address, timeout)
        })
        .await;

        match result {
            Ok(raw) => {
                let snapshot = {
                    let mut last_good = session.last_good.lock().await;
                    let snapshot = normalize(&raw, last_good.as_ref(), Utc::now());
                    *last_good = Some(snapshot.clone());
                    snapshot
                };
                session.status_tx.send_replace(Some(snapshot.clone()));

                let resumed = {
                    let mut breaker = session.breaker.lock().await;
                    breaker.consecutive_errors = 0;
                    std::mem::take(&mut breaker.suspended)
                };
                if resumed {
                    info!(device = %session.id, "device answered again, resuming periodic polling");
                    self.spawn_poll_task(session, false).await;
                }

                snapshot
            }
            Err(fault) => {
                // Consumers must never see a stale "on" state for an
                // unreachable device; the last good snapshot is kept
                // separately for the next successful merge.
                let safe = StatusSnapshot::safe_default();
                session.status_tx.send_replace(Some(safe.clone()));

                let tripped = {
                    let mut breaker = session.breaker.lock().await;
                    breaker.consecutive_errors += 1;
                    warn!(
                        device = %session.id,
                        error = %fault,
                        consecutive_errors = breaker.consecutive_errors,
                        "status refresh failed"
                    );
                    let tripped = session.config.suspend_on_error
                        && !breaker.suspended
                        && breaker.consecutive_errors >= ERROR_THRESHOLD;
                    if tripped {
                        breaker.suspended = true;
                    }
                    tripped
                };

                if tripped {
                    warn!(
                        device = %session.id,
                        threshold = ERROR_THRESHOLD,
                        "suspending periodic polling until the device answers an on-demand probe"
                    );
                    self.stop_poll_task(session).await;
                }

                safe
            }
        }
    }

    /// Issue one write through the retry pipeline, then pull fresh state
    /// so observers see the effect. Write failures propagate.
    async fn send_command(&self, id: &DeviceId, field: &str, value: &str) -> Result<(), CoreError> {
        let session = self.session(id)?;
        debug!(device = %id, field, value, "sending device command");

        let policy = RetryPolicy::with_retries(session.config.max_retries);
        let timeout = session.config.call_timeout;
        {
            // Writes queue behind an in-flight refresh instead of racing
            // it -- one outstanding external call per session, always.
            let _gate = session.refresh_gate.lock().await;
            with_retry(&policy, Fault::is_transient, || {
                self.inner
                    .gateway
                    .set_field(&session.address, field, value, timeout)
            })
            .await?;
        }

        let _ = self.refresh_session(&session).await;
        Ok(())
    }

    // ── Poll task management ─────────────────────────────────────────

    /// Spawn the periodic polling task for a session. `immediate` fires
    /// the first refresh right away (registration); recovery respawns
    /// without it since the probe just succeeded.
    async fn spawn_poll_task(&self, session: &Arc<DeviceSession>, immediate: bool) {
        let token = session.lifetime.child_token();
        let bridge = self.clone();
        let task_session = Arc::clone(session);
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            poll_task(bridge, task_session, task_token, immediate).await;
        });

        *session.poll_task.lock().await = Some((token, handle));
    }

    /// Cancel a session's poll task without waiting for it.
    ///
    /// Called from inside the task itself when the breaker trips, so
    /// joining here would deadlock; the task exits at its next
    /// cancellation check.
    async fn stop_poll_task(&self, session: &Arc<DeviceSession>) {
        if let Some((token, _handle)) = session.poll_task.lock().await.take() {
            token.cancel();
        }
    }

    fn session(&self, id: &DeviceId) -> Result<Arc<DeviceSession>, CoreError> {
        self.inner
            .sessions
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| CoreError::DeviceNotFound { id: id.to_string() })
    }
}

/// Periodic refresh loop for one device.
async fn poll_task<G: Gateway>(
    bridge: Bridge<G>,
    session: Arc<DeviceSession>,
    cancel: CancellationToken,
    immediate: bool,
) {
    let mut interval = tokio::time::interval(session.config.poll_interval);
    if !immediate {
        interval.tick().await; // consume the immediate first tick
    }

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                // Failures are recorded on the session by the refresh
                // pipeline; nothing to do with the result here.
                let _ = bridge.refresh_session(&session).await;
            }
        }
    }

    debug!(device = %session.id, "poll task exited");
}
