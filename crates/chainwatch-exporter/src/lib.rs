//! chainwatch-exporter: the on-chain polling engine.
//!
//! One [`PollLoop`] per deployment walks the chain in bounded ranges, routes
//! the protocol logs it finds through a [`HandlerRegistry`], and updates the
//! [`ExporterMetrics`]. The [`Supervisor`] runs one [`DeploymentTask`] per
//! configured deployment and stops them all on cancellation.

pub mod classifier;
pub mod error;
pub mod handler;
pub mod handlers;
pub mod metrics;
pub mod poll_loop;
pub mod supervisor;
pub mod task;

pub use classifier::classify;
pub use error::ExporterError;
pub use handler::{EventHandler, HandlerContext, HandlerRegistry};
pub use handlers::{BatchConfirmedHandler, QuorumMembershipHandler};
pub use metrics::ExporterMetrics;
pub use poll_loop::{PollConfig, PollLoop, TickOutcome};
pub use supervisor::Supervisor;
pub use task::{DeploymentTask, EigenDaTask, Services};
