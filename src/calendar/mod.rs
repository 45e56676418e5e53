// Remote calendar integration
// The reconcilers only see the `RemoteCalendarGateway` capability; the
// Google implementation lives in `google`.

use crate::error::{AppError, AppResult};
use crate::models::Credentials;
use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub mod google;

pub use google::{GoogleCalendarGateway, GoogleConnector};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCalendar {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEvent {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventOrder {
    #[default]
    StartTime,
}

impl EventOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventOrder::StartTime => "startTime",
        }
    }
}

/// Half-open `[start, end)` range of timezone-aware instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
}

impl TimeWindow {
    pub fn new<Tz: TimeZone>(start: DateTime<Tz>, end: DateTime<Tz>) -> AppResult<Self> {
        let start = start.fixed_offset();
        let end = end.fixed_offset();
        if end < start {
            return Err(AppError::invalid_argument(format!(
                "window end {} precedes start {}",
                end.to_rfc3339(),
                start.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    /// Parses RFC 3339 bounds. A timestamp without an offset is rejected
    /// rather than assumed to be UTC.
    pub fn parse(start: &str, end: &str) -> AppResult<Self> {
        Self::new(parse_aware(start)?, parse_aware(end)?)
    }

    /// The window every event refresh uses: one hour back, two days ahead.
    pub fn refresh_window(now: DateTime<Utc>) -> Self {
        Self {
            start: (now - Duration::hours(1)).fixed_offset(),
            end: (now + Duration::days(2)).fixed_offset(),
        }
    }

    pub fn start(&self) -> DateTime<FixedOffset> {
        self.start
    }

    pub fn end(&self) -> DateTime<FixedOffset> {
        self.end
    }
}

fn parse_aware(value: &str) -> AppResult<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value.trim()).map_err(|e| {
        let naive = chrono::NaiveDateTime::parse_from_str(value.trim(), "%Y-%m-%dT%H:%M:%S%.f").is_ok()
            || chrono::NaiveDateTime::parse_from_str(value.trim(), "%Y-%m-%d %H:%M:%S%.f").is_ok();
        if naive {
            AppError::invalid_argument(format!(
                "timestamp '{}' has no timezone information",
                value
            ))
        } else {
            AppError::invalid_argument(format!("invalid timestamp '{}': {}", value, e))
        }
    })
}

/// Source of truth for a user's calendars and events.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteCalendarGateway: Send + Sync {
    async fn list_calendars(&self) -> AppResult<Vec<RemoteCalendar>>;

    async fn list_events(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
        order_by: EventOrder,
    ) -> AppResult<Vec<RemoteEvent>>;
}

/// Builds an authenticated gateway for one user's credentials. Refreshing
/// an expired access token is the connector's job; refreshed tokens are
/// written back into `credentials`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GatewayConnector: Send + Sync {
    async fn connect(
        &self,
        credentials: &mut Credentials,
    ) -> AppResult<Box<dyn RemoteCalendarGateway>>;
}

/// Lists events between two textual bounds. The bounds are validated before
/// the gateway is touched.
pub async fn list_events_between(
    gateway: &dyn RemoteCalendarGateway,
    calendar_id: &str,
    start: &str,
    end: &str,
    order_by: EventOrder,
) -> AppResult<Vec<RemoteEvent>> {
    let window = TimeWindow::parse(start, end)?;
    gateway.list_events(calendar_id, &window, order_by).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_window_bounds() {
        let now = Utc.with_ymd_and_hms(2021, 10, 15, 10, 5, 0).unwrap();
        let window = TimeWindow::refresh_window(now);
        assert_eq!(window.start(), now - Duration::hours(1));
        assert_eq!(window.end(), now + Duration::days(2));
    }

    #[test]
    fn test_parse_keeps_offset() {
        let window = TimeWindow::parse("2021-10-15T10:05:00+02:00", "2021-10-15T12:00:00Z").unwrap();
        assert_eq!(window.start().offset().local_minus_utc(), 7200);
        assert_eq!(
            window.start(),
            Utc.with_ymd_and_hms(2021, 10, 15, 8, 5, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_naive_timestamp() {
        let err = TimeWindow::parse("2021-10-15T10:05:00", "2021-10-16T10:05:00Z").unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
        assert!(err.to_string().contains("no timezone"));

        let err = TimeWindow::parse("2021-10-15T10:05:00Z", "2021-10-16 10:05:00").unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = TimeWindow::parse("tomorrow", "2021-10-16T10:05:00Z").unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
        assert!(err.to_string().contains("invalid timestamp"));
    }

    #[test]
    fn test_new_rejects_inverted_window() {
        let start = Utc.with_ymd_and_hms(2021, 10, 15, 10, 0, 0).unwrap();
        let result = TimeWindow::new(start, start - Duration::minutes(1));
        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_naive_bound_never_reaches_gateway() {
        let mut gateway = MockRemoteCalendarGateway::new();
        gateway.expect_list_events().never();

        let result = list_events_between(
            &gateway,
            "cal1",
            "2021-10-15T10:05:00",
            "2021-10-17T10:05:00",
            EventOrder::StartTime,
        )
        .await;

        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_aware_bounds_are_forwarded() {
        let mut gateway = MockRemoteCalendarGateway::new();
        gateway
            .expect_list_events()
            .withf(|calendar_id, window, order_by| {
                calendar_id == "cal1"
                    && window.start() == Utc.with_ymd_and_hms(2021, 10, 15, 10, 5, 0).unwrap()
                    && *order_by == EventOrder::StartTime
            })
            .times(1)
            .returning(|_, _, _| Ok(Vec::new()));

        let events = list_events_between(
            &gateway,
            "cal1",
            "2021-10-15T10:05:00Z",
            "2021-10-17T10:05:00Z",
            EventOrder::StartTime,
        )
        .await
        .unwrap();

        assert!(events.is_empty());
    }
}
