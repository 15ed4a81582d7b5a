//! Stream ingestion subsystem
//!
//! socket frame → decoder → { metrics → `MetricsStore`; events → pending queue }
//! → `AdmissionThrottle` (paced drain) → `EventBuffer` → read-only consumers

pub mod backoff;
pub mod buffer;
pub mod link;
pub mod manager;
pub mod metrics_store;
pub mod throttle;
pub mod transport;

pub use backoff::BackoffSchedule;
pub use buffer::{Admission, EventBuffer, DEFAULT_CAPACITY};
pub use link::{ConnectionState, LinkState};
pub use manager::ConnectionManager;
pub use metrics_store::MetricsStore;
pub use throttle::{AdmissionCommand, AdmissionThrottle, AdmissionWorker, DEFAULT_CADENCE};
pub use transport::{Connector, Frame, FrameStream, TransportError};
