// Google Calendar v3 gateway
// Read-only: lists calendars and events, refreshes OAuth access tokens.

use super::{EventOrder, GatewayConnector, RemoteCalendar, RemoteCalendarGateway, RemoteEvent, TimeWindow};
use crate::clock::Clock;
use crate::config::GoogleConfig;
use crate::error::{AppError, AppResult};
use crate::http_config::HttpConfig;
use crate::models::Credentials;
use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, SecondsFormat, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

const UNTITLED: &str = "(untitled)";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarListResponse {
    items: Option<Vec<CalendarListEntry>>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarListEntry {
    id: String,
    summary: Option<String>,
    summary_override: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    items: Option<Vec<GoogleEvent>>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleEvent {
    id: String,
    summary: Option<String>,
    status: Option<String>,
    start: Option<GoogleEventTime>,
    end: Option<GoogleEventTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEventTime {
    date_time: Option<DateTime<FixedOffset>>,
    date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
}

pub struct GoogleCalendarGateway {
    base_url: Url,
    access_token: String,
    client: Client,
}

impl GoogleCalendarGateway {
    pub fn new(client: Client, base_url: &str, access_token: String) -> AppResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::config(format!("Invalid Google API URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::config(format!("Google API URL '{}' cannot be a base", base_url)));
        }

        Ok(Self {
            base_url,
            access_token,
            client,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> AppResult<T> {
        log::debug!("GET {}", url.path());
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let response = check_status(response).await?;
        let body = response.json::<T>().await?;
        Ok(body)
    }
}

#[async_trait]
impl RemoteCalendarGateway for GoogleCalendarGateway {
    async fn list_calendars(&self) -> AppResult<Vec<RemoteCalendar>> {
        let mut calendars = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.endpoint(&["users", "me", "calendarList"]);
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }

            let page: CalendarListResponse = self.get_json(url).await?;
            calendars.extend(page.items.unwrap_or_default().into_iter().map(|entry| {
                let name = entry
                    .summary_override
                    .or(entry.summary)
                    .unwrap_or_else(|| UNTITLED.to_string());
                RemoteCalendar { id: entry.id, name }
            }));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        log::debug!("Google returned {} calendars", calendars.len());
        Ok(calendars)
    }

    async fn list_events(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
        order_by: EventOrder,
    ) -> AppResult<Vec<RemoteEvent>> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.endpoint(&["calendars", calendar_id, "events"]);
            {
                let mut query = url.query_pairs_mut();
                query
                    .append_pair("timeMin", &window.start().to_rfc3339_opts(SecondsFormat::Secs, true))
                    .append_pair("timeMax", &window.end().to_rfc3339_opts(SecondsFormat::Secs, true))
                    .append_pair("singleEvents", "true")
                    .append_pair("orderBy", order_by.as_str());
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let page: EventListResponse = self.get_json(url).await?;
            for item in page.items.unwrap_or_default() {
                if item.status.as_deref() == Some("cancelled") {
                    continue;
                }
                events.extend(convert_google_event(item));
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        log::debug!("Google returned {} events for calendar {}", events.len(), calendar_id);
        Ok(events)
    }
}

/// Connects to Google with a user's stored tokens.
pub struct GoogleConnector {
    config: GoogleConfig,
    client: Client,
    clock: Arc<dyn Clock>,
}

impl GoogleConnector {
    pub fn new(config: GoogleConfig, http: &HttpConfig, clock: Arc<dyn Clock>) -> AppResult<Self> {
        let client = http.build_client()?;
        Ok(Self {
            config,
            client,
            clock,
        })
    }

    async fn refresh_access_token(&self, credentials: &mut Credentials) -> AppResult<()> {
        let refresh_token = credentials
            .refresh_token
            .clone()
            .ok_or_else(|| AppError::auth("Access token expired and no refresh token is stored"))?;

        log::info!("Refreshing Google access token for user {}", credentials.user_id);

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(&self.config.token_uri)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(AppError::auth(format!("Token refresh failed ({}): {}", status, text)));
        }

        let token: TokenResponse = response.json().await?;
        credentials.access_token = token.access_token;
        credentials.expires_at = token
            .expires_in
            .map(|seconds| self.clock.now() + Duration::seconds(seconds));
        if let Some(rotated) = token.refresh_token {
            credentials.refresh_token = Some(rotated);
        }

        Ok(())
    }
}

#[async_trait]
impl GatewayConnector for GoogleConnector {
    async fn connect(
        &self,
        credentials: &mut Credentials,
    ) -> AppResult<Box<dyn RemoteCalendarGateway>> {
        if credentials.needs_refresh(self.clock.now()) {
            self.refresh_access_token(credentials).await?;
        }

        let gateway = GoogleCalendarGateway::new(
            self.client.clone(),
            &self.config.api_base_url,
            credentials.access_token.clone(),
        )?;
        Ok(Box::new(gateway))
    }
}

async fn check_status(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| value["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(body);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AppError::auth(format!(
            "Google rejected the credentials ({}): {}",
            status, message
        ))),
        _ => Err(AppError::retrieval(format!("HTTP {}: {}", status, message))),
    }
}

/// Returns `None` for an event without a usable start or end. Such an event
/// is left out of the snapshot rather than failing the whole listing.
fn convert_google_event(event: GoogleEvent) -> Option<RemoteEvent> {
    let start = event.start.as_ref().and_then(event_instant);
    let end = event.end.as_ref().and_then(event_instant);

    let (start, end) = match (start, end) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            log::warn!("Skipping Google event {} without a start or end time", event.id);
            return None;
        }
    };

    Some(RemoteEvent {
        id: event.id,
        title: event.summary.unwrap_or_else(|| UNTITLED.to_string()),
        start,
        end,
    })
}

// All-day events carry only a date; they are pinned to midnight UTC.
fn event_instant(time: &GoogleEventTime) -> Option<DateTime<Utc>> {
    match (time.date_time, time.date) {
        (Some(date_time), _) => Some(date_time.with_timezone(&Utc)),
        (None, Some(date)) => date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc()),
        (None, None) => None,
    }
}
