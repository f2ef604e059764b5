//! Long-term polarization monitoring sessions.
//!
//! An [`AcquisitionSession`] owns one polarimeter for the whole run and loops
//! through a fixed cycle:
//!
//! ```text
//! CONFIGURING → (SWEEP_START → POLLING → FETCHING → ANALYZING → LOGGING)* → CLOSED
//! ```
//!
//! Every sweep adds one row to the coarse log. A sweep whose maximum
//! deviation from its first sample exceeds the configured threshold is also
//! written out in full as a transient log. See [`logs`] for the file formats
//! and readers.

pub mod clock;
pub mod config;
pub mod error;
pub mod logs;
pub mod observer;
pub mod session;
pub mod state;

pub use clock::{Clock, SystemClock};
pub use config::{AcquisitionConfig, MAX_SAMPLES_PER_SWEEP};
pub use error::{ConfigError, LogReadError, LogWriteError, SessionError};
pub use observer::{SessionObserver, SweepReport, TracingObserver};
pub use session::{AcquisitionSession, SessionSummary};
pub use state::SessionState;
