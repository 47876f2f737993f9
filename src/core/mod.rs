pub mod filter;
pub mod log_file;
pub mod log_store;
pub mod session;
pub mod session_worker;

pub use filter::{query, DateRange, Query};
pub use log_file::{LoadedFile, LogFileLoader};
pub use log_store::{LogStore, SourceInfo};
pub use session::{Session, Snapshot, Status};
pub use session_worker::{SessionHandle, SessionWorker};
