//! Logging and metrics ambient stack shared by every DGC service (spec §1.1,
//! §1.6), grounded in the teacher's `telemetry` crate (`init.rs`,
//! `prometheus.rs`, `http.rs`) and scaled down to a single counter/histogram
//! pair per service plus a `/metrics` + `/health` router fragment.

mod http;
mod init;
mod metrics;
mod server;

pub use http::observability_routes;
pub use init::init_tracing;
pub use metrics::ServiceMetrics;
pub use server::serve;
