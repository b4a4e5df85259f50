//! Common utilities for Polymarket binaries

pub mod shutdown;
pub mod heartbeat;
pub mod logging;

pub use shutdown::ShutdownManager;
pub use heartbeat::Heartbeat;
pub use logging::init_tracing;
