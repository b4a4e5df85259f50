//! A5: process-wide counters and the `/metrics` HTTP responder.
//!
//! Counters follow the plain `AtomicU64`-field idiom of
//! `application/strategy/risk.rs`'s `RiskManager`. There is no metrics crate
//! anywhere in this codebase's dependency tree, so the Prometheus text
//! exposition format is rendered by hand and served with `axum`, which the
//! tree already depends on for its own reasons elsewhere.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use tracing::info;

use crate::keeper::engine::ReconciliationEngine;

#[derive(Debug, Default)]
pub struct Metrics {
    refresh_success_total: AtomicU64,
    refresh_failure_total: AtomicU64,
    orders_placed_total: AtomicU64,
    orders_place_failed_total: AtomicU64,
    orders_cancelled_total: AtomicU64,
    orders_cancel_failed_total: AtomicU64,
    strategy_ticks_total: AtomicU64,
    strategy_ticks_skipped_total: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh_success(&self) {
        self.refresh_success_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn refresh_failure(&self) {
        self.refresh_failure_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn order_placed(&self) {
        self.orders_placed_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn order_place_failed(&self) {
        self.orders_place_failed_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn order_cancelled(&self) {
        self.orders_cancelled_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn order_cancel_failed(&self) {
        self.orders_cancel_failed_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn strategy_tick(&self) {
        self.strategy_ticks_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn strategy_tick_skipped(&self) {
        self.strategy_ticks_skipped_total.fetch_add(1, Ordering::Relaxed);
    }

    fn render(&self, engine: &ReconciliationEngine) -> String {
        let mut out = String::new();

        let counter = |name: &str, help: &str, value: u64, out: &mut String| {
            out.push_str(&format!("# HELP {name} {help}\n"));
            out.push_str(&format!("# TYPE {name} counter\n"));
            out.push_str(&format!("{name} {value}\n"));
        };
        let gauge = |name: &str, help: &str, value: i64, out: &mut String| {
            out.push_str(&format!("# HELP {name} {help}\n"));
            out.push_str(&format!("# TYPE {name} gauge\n"));
            out.push_str(&format!("{name} {value}\n"));
        };

        counter(
            "keeper_refresh_success_total",
            "Successful order-book refresh cycles",
            self.refresh_success_total.load(Ordering::Relaxed),
            &mut out,
        );
        counter(
            "keeper_refresh_failure_total",
            "Refresh cycles where at least one hook failed",
            self.refresh_failure_total.load(Ordering::Relaxed),
            &mut out,
        );
        counter(
            "keeper_orders_placed_total",
            "Orders successfully placed",
            self.orders_placed_total.load(Ordering::Relaxed),
            &mut out,
        );
        counter(
            "keeper_orders_place_failed_total",
            "Order placements that failed",
            self.orders_place_failed_total.load(Ordering::Relaxed),
            &mut out,
        );
        counter(
            "keeper_orders_cancelled_total",
            "Orders successfully cancelled",
            self.orders_cancelled_total.load(Ordering::Relaxed),
            &mut out,
        );
        counter(
            "keeper_orders_cancel_failed_total",
            "Order cancels that failed",
            self.orders_cancel_failed_total.load(Ordering::Relaxed),
            &mut out,
        );
        counter(
            "keeper_strategy_ticks_total",
            "Strategy manager ticks run",
            self.strategy_ticks_total.load(Ordering::Relaxed),
            &mut out,
        );
        counter(
            "keeper_strategy_ticks_skipped_total",
            "Strategy manager ticks skipped because the previous tick was still running",
            self.strategy_ticks_skipped_total.load(Ordering::Relaxed),
            &mut out,
        );

        if let Ok(book) = engine.try_order_book() {
            gauge(
                "keeper_orders_placing",
                "Orders currently being placed",
                book.orders_being_placed as i64,
                &mut out,
            );
            gauge(
                "keeper_orders_cancelling",
                "Orders currently being cancelled",
                book.orders_being_cancelled as i64,
                &mut out,
            );
        }

        out
    }
}

struct AppState {
    metrics: Arc<Metrics>,
    engine: Arc<ReconciliationEngine>,
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> String {
    state.metrics.render(&state.engine)
}

/// Serve `/metrics` on `port` until the process exits. Spawned as a
/// background task; a bind failure is logged and the task simply ends,
/// matching the rest of the keeper's "a non-critical subsystem failing
/// never brings down trading" posture (SPEC_FULL.md §7).
pub fn serve(metrics: Arc<Metrics>, engine: Arc<ReconciliationEngine>, port: u16) {
    let state = Arc::new(AppState { metrics, engine });
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(state);

    tokio::spawn(async move {
        let addr = format!("0.0.0.0:{port}");
        match tokio::net::TcpListener::bind(&addr).await {
            Ok(listener) => {
                info!(%addr, "metrics server listening");
                if let Err(err) = axum::serve(listener, app).await {
                    tracing::error!(%err, "metrics server exited");
                }
            }
            Err(err) => {
                tracing::error!(%err, %addr, "failed to bind metrics server, continuing without it");
            }
        }
    });
}
