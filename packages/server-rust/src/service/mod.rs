//! Submission handling.
//!
//! 1. **Write locks** (`write_locks`): per (unit, locale) serialization
//! 2. **Selection** (`selector`): which merged files actually need a write
//! 3. **Coordination** (`coordinator`): merge, write, invalidate, trigger
//! 4. **Build trigger** (`build_trigger`): rebuild request after a save
//! 5. **Background workers** (`worker`): periodic tasks (stats sweeping)

pub mod build_trigger;
pub mod coordinator;
pub mod selector;
pub mod worker;
pub mod write_locks;

pub use build_trigger::{BuildTrigger, LoggingBuildTrigger};
pub use coordinator::{SubmissionCoordinator, SubmissionOutcome, SubmissionReport, SubmitError};
pub use selector::{needs_write, WriteSetSelector};
pub use worker::{BackgroundRunnable, BackgroundWorker, WorkerError};
pub use write_locks::{UnitWriteGuard, UnitWriteLocks};
