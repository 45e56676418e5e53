// file: src/models/mod.rs

pub mod calendar;
pub mod credentials;
pub mod event;
pub mod sync;
pub mod user;

pub use calendar::Calendar;
pub use credentials::Credentials;
pub use event::Event;
pub use sync::{SyncState, SyncSummary};
pub use user::User;
