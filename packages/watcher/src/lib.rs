pub mod diff;
pub mod error;
pub mod notification;
pub mod service;
pub mod storage;
pub mod traits;
pub mod types;

// Re-exports for clean API
pub use diff::compare;
pub use error::SourceError;
pub use notification::{Notification, NotificationKind};
pub use service::{PassSummary, SourceOutcome, WatcherService};
pub use storage::MemoryRepository;
pub use traits::{JobRepository, JobScraper, Notifier, ScheduledJob, Scheduler};
pub use types::{ContentHash, DiffResult, Job, JobCollection};
