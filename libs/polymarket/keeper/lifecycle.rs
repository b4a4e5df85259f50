//! C7: the lifecycle driver — initial delay, startup checks, signal
//! handling, the periodic sync timer, and graceful shutdown.
//!
//! The signal-handling and cooperative-flag idiom extends
//! `utils/shutdown.rs`'s `ShutdownManager` (SIGINT only) with a SIGTERM
//! handler sharing the same flag; the skip-if-running timer guard is
//! grounded on `infrastructure/active_order_manager.rs::start()`'s
//! poll-and-swallow-error loop, adapted to swap a per-timer busy flag
//! instead of always re-entering.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::keeper::engine::ReconciliationEngine;
use crate::keeper::strategies::StrategyManager;
use crate::utils::shutdown::ShutdownManager;

pub type InitialCheck = Pin<Box<dyn Future<Output = bool> + Send>>;

/// Run each startup check in order, bounded by `per_check_timeout`. Returns
/// `false` on the first failing or timed-out check (its name is logged).
pub async fn run_initial_checks(
    checks: Vec<(&'static str, InitialCheck)>,
    per_check_timeout: Duration,
) -> bool {
    for (name, check) in checks {
        match tokio::time::timeout(per_check_timeout, check).await {
            Ok(true) => continue,
            Ok(false) => {
                error!(name, "startup check failed");
                return false;
            }
            Err(_) => {
                error!(name, "startup check timed out");
                return false;
            }
        }
    }
    true
}

pub struct Lifecycle {
    shutdown: ShutdownManager,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            shutdown: ShutdownManager::new(),
        }
    }

    /// SIGINT via `ShutdownManager`, plus a SIGTERM handler sharing the same
    /// cooperative flag.
    fn install_signal_handlers(&self) {
        self.shutdown.spawn_signal_handler();

        let flag = self.shutdown.flag();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut term) => {
                    term.recv().await;
                    info!("received SIGTERM, shutting down gracefully");
                    flag.store(false, Ordering::Release);
                }
                Err(err) => warn!(%err, "failed to install SIGTERM handler"),
            }
        });
    }

    /// Runs until a termination signal lands, then drains the sync timer
    /// and cancels all resting orders before returning.
    pub async fn run(
        &self,
        engine: Arc<ReconciliationEngine>,
        manager: Arc<StrategyManager>,
        sync_interval: Duration,
        initial_delay: Duration,
    ) {
        sleep(initial_delay).await;

        engine.start();
        self.install_signal_handlers();

        let tick_busy = Arc::new(AtomicBool::new(false));
        let tick_handle = {
            let flag = self.shutdown.flag();
            let tick_busy = tick_busy.clone();
            tokio::spawn(async move {
                while flag.load(Ordering::Acquire) {
                    sleep(sync_interval).await;
                    if !flag.load(Ordering::Acquire) {
                        break;
                    }
                    if tick_busy.swap(true, Ordering::AcqRel) {
                        warn!("sync tick skipped: previous tick still running");
                        continue;
                    }
                    manager.synchronize().await;
                    tick_busy.store(false, Ordering::Release);
                }
            })
        };

        while self.shutdown.is_running() {
            sleep(Duration::from_secs(1)).await;
        }

        let _ = tick_handle.await;

        info!("cancelling all resting orders before exit");
        engine.cancel_all_orders().await;
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
