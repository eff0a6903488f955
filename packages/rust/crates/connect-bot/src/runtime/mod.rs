//! Serving runtime: webhook ingress, worker pool and per-session gate.

mod ingress;
mod server;
mod session_gate;
mod worker_pool;

pub use ingress::{HealthResponse, IngressApp, build_ingress_app};
pub use server::{build_session_cache, run_server};
pub use session_gate::{SessionGate, SessionGuard};
pub use worker_pool::{InFlightLimit, spawn_dispatcher};
