use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::api::DynShopBackendAPI;
use crate::entities::Coordinates;
use crate::error::{invalid_input_error, invalid_state_error, permission_denied_error, Error};

pub type PositionUpdates = async_channel::Receiver<Result<Coordinates, Error>>;

/// A device position feed: the platform layer implements this over its GPS
/// stack, tests implement it over a channel they feed by hand.
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn request_permission(&self) -> bool;
    fn positions(&self) -> PositionUpdates;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackerState {
    Unresolved,
    PermissionRequested,
    Active,
    /// Terminal for the session; only manual coordinates work from here.
    Denied,
}

type Observer = Box<dyn Fn(Coordinates) + Send + Sync>;

struct Cell {
    state: TrackerState,
    watching: bool,
    current: Option<Coordinates>,
    observers: Vec<(Uuid, Observer)>,
}

type SharedCell = Arc<Mutex<Cell>>;

/// Deregistration handle for one observer. After `cancel` returns the
/// observer is never invoked again.
pub struct WatchHandle {
    id: Uuid,
    cell: SharedCell,
}

impl WatchHandle {
    pub fn cancel(self) {
        let mut cell = self.cell.lock().unwrap();
        cell.observers.retain(|(id, _)| *id != self.id);
    }
}

#[derive(Clone)]
struct BackendSync {
    backend: DynShopBackendAPI,
    customer_id: i64,
}

impl BackendSync {
    // Fire-and-forget: the upstream copy of the position is best-effort.
    fn push(&self, coordinates: Coordinates) {
        let backend = self.backend.clone();
        let customer_id = self.customer_id;

        tokio::spawn(async move {
            if let Err(err) = backend
                .update_customer_location(customer_id, coordinates)
                .await
            {
                tracing::debug!("failed to push location upstream: {}", err);
            }
        });
    }
}

/// Owns the single tracked coordinate. Position updates arrive either from
/// the watched [`PositionSource`] or from a manual override, and both paths
/// notify the same observers, so consumers cannot tell them apart.
///
/// Observer callbacks and the tracked cell share one lock, and watch
/// dispatch runs callbacks while holding it. That is what lets
/// [`LocationTracker::stop_watch`] promise that no watch-driven callback
/// fires after it returns. Callbacks must therefore be quick and must not
/// call back into the tracker.
///
/// When constructed with [`LocationTracker::with_backend_sync`], every
/// accepted update is also pushed upstream on a detached task (requires a
/// Tokio runtime); upstream failures are logged and ignored.
pub struct LocationTracker {
    source: Arc<dyn PositionSource>,
    sync: Option<BackendSync>,
    cell: SharedCell,
    watch_task: Mutex<Option<JoinHandle<()>>>,
}

impl LocationTracker {
    pub fn new(source: Arc<dyn PositionSource>) -> Self {
        Self {
            source,
            sync: None,
            cell: Arc::new(Mutex::new(Cell {
                state: TrackerState::Unresolved,
                watching: false,
                current: None,
                observers: Vec::new(),
            })),
            watch_task: Mutex::new(None),
        }
    }

    pub fn with_backend_sync(
        source: Arc<dyn PositionSource>,
        backend: DynShopBackendAPI,
        customer_id: i64,
    ) -> Self {
        let mut tracker = Self::new(source);
        tracker.sync = Some(BackendSync {
            backend,
            customer_id,
        });
        tracker
    }

    pub fn state(&self) -> TrackerState {
        self.cell.lock().unwrap().state
    }

    /// Snapshot of the tracked coordinate.
    pub fn current(&self) -> Option<Coordinates> {
        self.cell.lock().unwrap().current
    }

    pub fn observe(&self, observer: impl Fn(Coordinates) + Send + Sync + 'static) -> WatchHandle {
        let id = Uuid::new_v4();

        self.cell
            .lock()
            .unwrap()
            .observers
            .push((id, Box::new(observer)));

        WatchHandle {
            id,
            cell: self.cell.clone(),
        }
    }

    /// Asks the source for permission. Denial is a state, not an error, and
    /// is terminal for the session.
    #[tracing::instrument(skip(self))]
    pub async fn request_permission(&self) -> bool {
        {
            let mut cell = self.cell.lock().unwrap();
            match cell.state {
                TrackerState::Denied => return false,
                TrackerState::Active => return true,
                _ => cell.state = TrackerState::PermissionRequested,
            }
        }

        let granted = self.source.request_permission().await;

        if !granted {
            tracing::warn!("location permission denied");
            self.cell.lock().unwrap().state = TrackerState::Denied;
        }

        granted
    }

    /// Starts continuous position delivery. Position errors from the source
    /// are logged and skipped; the last known coordinate is retained.
    #[tracing::instrument(skip(self))]
    pub async fn start_watch(&self) -> Result<(), Error> {
        {
            let mut cell = self.cell.lock().unwrap();
            match cell.state {
                TrackerState::Active => return Ok(()),
                TrackerState::PermissionRequested => {}
                TrackerState::Denied => return Err(permission_denied_error()),
                TrackerState::Unresolved => return Err(invalid_state_error()),
            }

            cell.state = TrackerState::Active;
            cell.watching = true;
        }

        let updates = self.source.positions();
        let shared = self.cell.clone();
        let sync = self.sync.clone();

        let handle = tokio::spawn(async move {
            while let Ok(update) = updates.recv().await {
                let coordinates = match update {
                    Ok(coordinates) => coordinates,
                    Err(err) => {
                        tracing::warn!("position watch error: {}", err);
                        continue;
                    }
                };

                {
                    let mut cell = shared.lock().unwrap();
                    if !cell.watching {
                        break;
                    }

                    cell.current = Some(coordinates);
                    for (_, observer) in &cell.observers {
                        observer(coordinates);
                    }
                }

                if let Some(sync) = &sync {
                    sync.push(coordinates);
                }
            }

            tracing::debug!("position watch ended");
        });

        *self.watch_task.lock().unwrap() = Some(handle);

        Ok(())
    }

    /// Stops the watch. Idempotent and callable from any state. Once this
    /// returns, no watch-driven observer callback will fire; taking the
    /// dispatch lock here is what waits out an in-flight delivery.
    #[tracing::instrument(skip(self))]
    pub fn stop_watch(&self) {
        {
            let mut cell = self.cell.lock().unwrap();
            cell.watching = false;
            if cell.state == TrackerState::Active {
                cell.state = TrackerState::PermissionRequested;
            }
        }

        if let Some(handle) = self.watch_task.lock().unwrap().take() {
            handle.abort();
        }
    }

    /// Overrides the tracked coordinate immediately (pin drag, typed
    /// address, recenter). Works in every state, including `Denied`, and
    /// notifies the same observers as the watch path.
    #[tracing::instrument(skip(self))]
    pub fn set_manual_location(&self, coordinates: Coordinates) -> Result<(), Error> {
        if !coordinates.is_valid() {
            return Err(invalid_input_error());
        }

        {
            let mut cell = self.cell.lock().unwrap();
            cell.current = Some(coordinates);
            for (_, observer) in &cell.observers {
                observer(coordinates);
            }
        }

        if let Some(sync) = &self.sync {
            sync.push(coordinates);
        }

        Ok(())
    }
}

#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};
#[cfg(test)]
use std::time::Duration;
#[cfg(test)]
use tokio_test::block_on;

#[cfg(test)]
type PositionSender = async_channel::Sender<Result<Coordinates, Error>>;

#[cfg(test)]
struct FakeSource {
    granted: bool,
    updates: PositionUpdates,
}

#[cfg(test)]
impl FakeSource {
    fn new(granted: bool) -> (Arc<Self>, PositionSender) {
        let (tx, rx) = async_channel::unbounded();

        (
            Arc::new(Self {
                granted,
                updates: rx,
            }),
            tx,
        )
    }
}

#[cfg(test)]
#[async_trait]
impl PositionSource for FakeSource {
    async fn request_permission(&self) -> bool {
        self.granted
    }

    fn positions(&self) -> PositionUpdates {
        self.updates.clone()
    }
}

#[cfg(test)]
fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[cfg(test)]
fn counting_observer(tracker: &LocationTracker) -> (Arc<AtomicUsize>, WatchHandle) {
    let seen = Arc::new(AtomicUsize::new(0));
    let seen_in = seen.clone();
    let handle = tracker.observe(move |_| {
        seen_in.fetch_add(1, Ordering::SeqCst);
    });

    (seen, handle)
}

#[test]
fn watch_updates_reach_observers_and_the_cell() {
    init_tracing();

    block_on(async {
        let (source, positions) = FakeSource::new(true);
        let tracker = LocationTracker::new(source);
        let (seen, _handle) = counting_observer(&tracker);

        assert!(tracker.request_permission().await);
        tracker.start_watch().await.unwrap();
        assert_eq!(tracker.state(), TrackerState::Active);

        let here = Coordinates::new(17.385, 78.4867);
        positions.send(Ok(here)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.current(), Some(here));
    });
}

#[test]
fn nothing_fires_after_stop_watch_returns() {
    init_tracing();

    block_on(async {
        let (source, positions) = FakeSource::new(true);
        let tracker = LocationTracker::new(source);
        let (seen, _handle) = counting_observer(&tracker);

        assert!(tracker.request_permission().await);
        tracker.start_watch().await.unwrap();
        tracker.stop_watch();
        tracker.stop_watch(); // idempotent

        // The source fires after the stop; nobody may hear it.
        positions.send(Ok(Coordinates::new(17.385, 78.4867))).await.ok();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(seen.load(Ordering::SeqCst), 0);
        assert_eq!(tracker.current(), None);
        assert_eq!(tracker.state(), TrackerState::PermissionRequested);
    });
}

#[test]
fn position_errors_are_skipped_and_the_last_fix_retained() {
    block_on(async {
        let (source, positions) = FakeSource::new(true);
        let tracker = LocationTracker::new(source);
        let (seen, _handle) = counting_observer(&tracker);

        assert!(tracker.request_permission().await);
        tracker.start_watch().await.unwrap();

        let first = Coordinates::new(17.385, 78.4867);
        positions.send(Ok(first)).await.unwrap();
        positions
            .send(Err(crate::error::fetch_error("gps glitch")))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.current(), Some(first));
        assert_eq!(tracker.state(), TrackerState::Active);
    });
}

#[test]
fn denial_is_terminal_and_leaves_manual_mode_working() {
    block_on(async {
        let (source, _positions) = FakeSource::new(false);
        let tracker = LocationTracker::new(source);
        let (seen, _handle) = counting_observer(&tracker);

        assert!(!tracker.request_permission().await);
        assert_eq!(tracker.state(), TrackerState::Denied);
        assert!(!tracker.request_permission().await);

        let err = tracker.start_watch().await.unwrap_err();
        assert_eq!(err.kind, crate::error::Kind::PermissionDenied);

        let pinned = Coordinates::new(16.44, 80.99);
        tracker.set_manual_location(pinned).unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.current(), Some(pinned));
        assert_eq!(tracker.state(), TrackerState::Denied);
    });
}

#[test]
fn manual_overrides_are_indistinguishable_from_watch_updates() {
    block_on(async {
        let (source, positions) = FakeSource::new(true);
        let tracker = LocationTracker::new(source);

        let path = Arc::new(Mutex::new(Vec::new()));
        let path_in = path.clone();
        let _handle = tracker.observe(move |coordinates| {
            path_in.lock().unwrap().push(coordinates);
        });

        assert!(tracker.request_permission().await);
        tracker.start_watch().await.unwrap();

        let fix = Coordinates::new(17.385, 78.4867);
        let pin = Coordinates::new(17.39, 78.49);

        positions.send(Ok(fix)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        tracker.set_manual_location(pin).unwrap();

        assert_eq!(*path.lock().unwrap(), vec![fix, pin]);
        assert_eq!(tracker.current(), Some(pin));
    });
}

#[test]
fn cancelled_observers_hear_nothing_more() {
    block_on(async {
        let (source, _positions) = FakeSource::new(true);
        let tracker = LocationTracker::new(source);
        let (seen, handle) = counting_observer(&tracker);

        tracker
            .set_manual_location(Coordinates::new(17.385, 78.4867))
            .unwrap();
        handle.cancel();
        tracker
            .set_manual_location(Coordinates::new(17.39, 78.49))
            .unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    });
}

#[test]
fn manual_overrides_reject_invalid_coordinates() {
    let (source, _positions) = FakeSource::new(true);
    let tracker = LocationTracker::new(source);

    let err = tracker
        .set_manual_location(Coordinates::new(91.0, 0.0))
        .unwrap_err();

    assert_eq!(err.kind, crate::error::Kind::InvalidInput);
    assert_eq!(tracker.current(), None);
}

#[test]
fn accepted_updates_are_pushed_upstream() {
    use crate::engine::test_support::FakeBackend;

    block_on(async {
        let backend = Arc::new(FakeBackend::default());
        let (source, positions) = FakeSource::new(true);
        let tracker = LocationTracker::with_backend_sync(source, backend.clone(), 7);

        assert!(tracker.request_permission().await);
        tracker.start_watch().await.unwrap();

        let fix = Coordinates::new(17.385, 78.4867);
        positions.send(Ok(fix)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let pushed = backend.location_updates.lock().unwrap().clone();
        assert_eq!(pushed, vec![(7, fix)]);
    });
}
