//! Single-threaded apartment for hardware-affine operations.
//!
//! The driver layer behind [`HardwareBackend`] must never be entered
//! concurrently. The [`ApartmentDispatcher`] owns the backend on one
//! dedicated OS thread and runs submitted operations there one at a time,
//! in the order they were accepted.
//!
//! - Callers on any thread or task submit a closure and await its result.
//! - A failing or panicking operation only fails its own caller.
//! - An operation that was accepted always runs to completion, even when the
//!   caller stopped waiting; its result is then discarded.
//! - After [`ApartmentDispatcher::close`] or the death of the thread, every
//!   submission fails fast with [`DispatchError::Unavailable`].

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, error, info, warn};
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::backend::HardwareBackend;
use crate::error::{BackendError, DispatchError};

type Job = Box<dyn FnOnce(&mut dyn HardwareBackend) + Send>;

enum ApartmentCommand {
    Run { label: &'static str, job: Job },
}

/// Clears the liveness flag when the apartment thread exits, including by
/// unwinding.
struct AliveGuard(Arc<AtomicBool>);

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct ApartmentDispatcher {
    name: String,
    cmd_tx: Mutex<Option<mpsc::Sender<ApartmentCommand>>>,
    join_handle: Mutex<Option<JoinHandle<()>>>,
    alive: Arc<AtomicBool>,
    pending: Arc<AtomicUsize>,
}

impl ApartmentDispatcher {
    /// Spawn the apartment thread, moving `backend` onto it.
    pub fn start(name: &str, backend: Box<dyn HardwareBackend>) -> std::io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<ApartmentCommand>();
        let alive = Arc::new(AtomicBool::new(true));
        let pending = Arc::new(AtomicUsize::new(0));

        let thread_name = name.to_string();
        let thread_alive = Arc::clone(&alive);
        let thread_pending = Arc::clone(&pending);
        let join_handle = std::thread::Builder::new()
            .name(format!("{}-apartment", name))
            .spawn(move || {
                let _guard = AliveGuard(thread_alive);
                let mut backend = backend;
                info!("[Apartment] {} started", thread_name);

                // recv() keeps yielding queued commands after all senders are
                // gone, so accepted operations drain before the loop ends.
                while let Ok(cmd) = cmd_rx.recv() {
                    match cmd {
                        ApartmentCommand::Run { label, job } => {
                            debug!("[Apartment] running {}", label);
                            job(backend.as_mut());
                            thread_pending.fetch_sub(1, Ordering::SeqCst);
                            debug!("[Apartment] finished {}", label);
                        }
                    }
                }

                info!("[Apartment] {} stopped", thread_name);
            })?;

        Ok(Self {
            name: name.to_string(),
            cmd_tx: Mutex::new(Some(cmd_tx)),
            join_handle: Mutex::new(Some(join_handle)),
            alive,
            pending,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether new submissions are accepted.
    pub fn is_available(&self) -> bool {
        self.alive.load(Ordering::SeqCst) && self.cmd_tx.lock().is_some()
    }

    /// Number of accepted operations that have not finished yet.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Run `op` on the apartment thread and await its result.
    pub async fn submit<T, F>(&self, label: &'static str, op: F) -> Result<T, DispatchError>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn HardwareBackend) -> Result<T, BackendError> + Send + 'static,
    {
        let rx = self.enqueue(label, op)?;
        rx.await.map_err(|_| DispatchError::Unavailable)?
    }

    /// Blocking variant of [`submit`](Self::submit) for non-async callers.
    ///
    /// Must not be called from within an async context.
    pub fn submit_blocking<T, F>(&self, label: &'static str, op: F) -> Result<T, DispatchError>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn HardwareBackend) -> Result<T, BackendError> + Send + 'static,
    {
        let rx = self.enqueue(label, op)?;
        rx.blocking_recv().map_err(|_| DispatchError::Unavailable)?
    }

    fn enqueue<T, F>(
        &self,
        label: &'static str,
        op: F,
    ) -> Result<oneshot::Receiver<Result<T, DispatchError>>, DispatchError>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn HardwareBackend) -> Result<T, BackendError> + Send + 'static,
    {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(DispatchError::Unavailable);
        }

        let (result_tx, result_rx) = oneshot::channel();
        let job: Job = Box::new(move |backend: &mut dyn HardwareBackend| {
            let result = match catch_unwind(AssertUnwindSafe(|| op(backend))) {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => {
                    warn!("[Apartment] {} failed: {}", label, e);
                    Err(DispatchError::Backend(e))
                }
                Err(panic) => {
                    let msg = panic_message(panic.as_ref());
                    error!("[Apartment] PANIC in {}: {}", label, msg);
                    Err(DispatchError::Panicked(msg))
                }
            };
            if result_tx.send(result).is_err() {
                debug!("[Apartment] caller of {} went away, result discarded", label);
            }
        });

        let guard = self.cmd_tx.lock();
        let sender = guard.as_ref().ok_or(DispatchError::Unavailable)?;
        self.pending.fetch_add(1, Ordering::SeqCst);
        if sender.send(ApartmentCommand::Run { label, job }).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(DispatchError::Unavailable);
        }
        debug!("[Apartment] queued {} ({} pending)", label, self.pending());
        Ok(result_rx)
    }

    /// Stop accepting submissions. Already accepted operations still run.
    pub fn close(&self) {
        if self.cmd_tx.lock().take().is_some() {
            info!("[Apartment] {} closed to new submissions", self.name);
        }
    }

    /// Close, then wait up to `drain_timeout` for queued operations to finish
    /// and the thread to exit. Returns false if the drain timed out.
    pub async fn shutdown(&self, drain_timeout: Duration) -> bool {
        self.close();

        let Some(handle) = self.join_handle.lock().take() else {
            return true;
        };

        let pending = self.pending();
        if pending > 0 {
            info!("[Apartment] draining {} pending operation(s)", pending);
        }

        let join = tokio::task::spawn_blocking(move || handle.join());
        match tokio::time::timeout(drain_timeout, join).await {
            Ok(Ok(Ok(()))) => true,
            Ok(Ok(Err(_))) | Ok(Err(_)) => {
                error!("[Apartment] {} thread terminated abnormally", self.name);
                true
            }
            Err(_) => {
                warn!(
                    "[Apartment] drain timeout after {:?}, {} operation(s) still pending",
                    drain_timeout,
                    self.pending()
                );
                false
            }
        }
    }
}

impl Drop for ApartmentDispatcher {
    fn drop(&mut self) {
        self.cmd_tx.get_mut().take();
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SimulatedBackend;

    fn dispatcher() -> ApartmentDispatcher {
        let backend = SimulatedBackend::new(Vec::new(), vec!["A1B2C3D4E5F6".to_string()], "rtsp://test");
        ApartmentDispatcher::start("test", Box::new(backend)).unwrap()
    }

    async fn wait_pending(dispatcher: &ApartmentDispatcher, n: usize) {
        for _ in 0..1000 {
            if dispatcher.pending() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("pending never reached {}", n);
    }

    #[tokio::test]
    async fn test_submit_returns_result() {
        let dispatcher = dispatcher();
        let macs = dispatcher
            .submit("mac_addresses", |backend| backend.mac_addresses())
            .await
            .unwrap();
        assert_eq!(macs, vec!["A1B2C3D4E5F6".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_operations_never_overlap() {
        let dispatcher = Arc::new(dispatcher());
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..32 {
            let dispatcher = Arc::clone(&dispatcher);
            let in_flight = Arc::clone(&in_flight);
            let max_seen = Arc::clone(&max_seen);
            tasks.push(tokio::spawn(async move {
                dispatcher
                    .submit("overlap", move |_| {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(1));
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let dispatcher = Arc::new(dispatcher());
        let order = Arc::new(Mutex::new(Vec::new()));
        let (gate_tx, gate_rx) = mpsc::channel::<()>();

        // Hold the apartment so the following submissions queue up.
        let gate = {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move {
                dispatcher
                    .submit("gate", move |_| {
                        let _ = gate_rx.recv();
                        Ok(())
                    })
                    .await
            })
        };
        wait_pending(&dispatcher, 1).await;

        let mut tasks = Vec::new();
        for i in 0..5 {
            let dispatcher_for_task = Arc::clone(&dispatcher);
            let order = Arc::clone(&order);
            tasks.push(tokio::spawn(async move {
                dispatcher_for_task
                    .submit("push", move |_| {
                        order.lock().push(i);
                        Ok(())
                    })
                    .await
            }));
            wait_pending(&dispatcher, i + 2).await;
        }

        gate_tx.send(()).unwrap();
        gate.await.unwrap().unwrap();
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_failure_and_panic_do_not_stop_apartment() {
        let dispatcher = dispatcher();

        let err = dispatcher
            .submit("fails", |_| -> Result<(), BackendError> {
                Err(BackendError::Fault("driver error".to_string()))
            })
            .await;
        assert!(matches!(err, Err(DispatchError::Backend(BackendError::Fault(_)))));

        let panicked = dispatcher
            .submit("panics", |_| -> Result<(), BackendError> { panic!("boom") })
            .await;
        match panicked {
            Err(DispatchError::Panicked(msg)) => assert_eq!(msg, "boom"),
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }

        assert!(dispatcher.is_available());
        let ok = dispatcher.submit("after", |_| Ok(7)).await.unwrap();
        assert_eq!(ok, 7);
    }

    #[tokio::test]
    async fn test_abandoned_operation_still_runs() {
        let dispatcher = Arc::new(dispatcher());
        let ran = Arc::new(AtomicBool::new(false));
        let (gate_tx, gate_rx) = mpsc::channel::<()>();

        let gate = {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move {
                dispatcher
                    .submit("gate", move |_| {
                        let _ = gate_rx.recv();
                        Ok(())
                    })
                    .await
            })
        };
        wait_pending(&dispatcher, 1).await;

        let abandoned = {
            let dispatcher_for_task = Arc::clone(&dispatcher);
            let ran = Arc::clone(&ran);
            tokio::spawn(async move {
                dispatcher_for_task
                    .submit("abandoned", move |_| {
                        ran.store(true, Ordering::SeqCst);
                        Ok(())
                    })
                    .await
            })
        };
        wait_pending(&dispatcher, 2).await;
        abandoned.abort();

        gate_tx.send(()).unwrap();
        gate.await.unwrap().unwrap();
        dispatcher.submit("sync", |_| Ok(())).await.unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_shutdown_drains_then_refuses() {
        let dispatcher = Arc::new(dispatcher());
        let finished = Arc::new(AtomicBool::new(false));

        let slow = {
            let dispatcher = Arc::clone(&dispatcher);
            let finished = Arc::clone(&finished);
            tokio::spawn(async move {
                dispatcher
                    .submit("slow", move |_| {
                        std::thread::sleep(Duration::from_millis(50));
                        finished.store(true, Ordering::SeqCst);
                        Ok(())
                    })
                    .await
            })
        };
        wait_pending(&dispatcher, 1).await;

        assert!(dispatcher.shutdown(Duration::from_secs(5)).await);
        assert!(finished.load(Ordering::SeqCst));
        slow.await.unwrap().unwrap();

        assert!(!dispatcher.is_available());
        let refused = dispatcher.submit("late", |_| Ok(())).await;
        assert!(matches!(refused, Err(DispatchError::Unavailable)));
    }

    #[test]
    fn test_submit_blocking() {
        let dispatcher = dispatcher();
        let value = dispatcher.submit_blocking("blocking", |_| Ok(41 + 1)).unwrap();
        assert_eq!(value, 42);
    }
}
