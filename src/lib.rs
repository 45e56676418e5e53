// OnTime Library
// Mirrors remote calendars and their upcoming events into a local store

pub mod calendar;
pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod http_config;
pub mod models;
pub mod scheduler;
pub mod service;
pub mod sync;
pub mod utils;

// Re-export commonly used types
pub use calendar::{
    GatewayConnector, GoogleConnector, RemoteCalendar, RemoteCalendarGateway, RemoteEvent,
    TimeWindow,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use database::Database;
pub use error::{AppError, AppResult};
pub use models::{Calendar, Credentials, Event, SyncState, SyncSummary, User};
pub use scheduler::{run_sync_loop, PassReport};
pub use service::SyncService;
pub use sync::{reconcile_calendars, reconcile_events};
