use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{
    CALENDAR_TOKEN, CalendarSettings, Credential, SecretStore, resolve_credential_from_env,
};
use crate::http_client::{self, ApiError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Creates whole-day events on a remote calendar. `start` and `end` are both
/// inclusive, so `start == end` is a single-day event.
#[async_trait]
pub trait CalendarWriter: Send + Sync {
    async fn create_event(
        &self,
        title: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<EventId, ApiError>;
}

pub struct GoogleCalendarClient {
    client: Client,
    token: Credential,
    base_url: String,
    calendar_id: String,
}

impl GoogleCalendarClient {
    pub fn new(token: Credential, settings: &CalendarSettings) -> Result<Self, ApiError> {
        Ok(Self {
            client: http_client::build_client(settings.timeout_secs)?,
            token,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            calendar_id: settings.calendar_id.clone(),
        })
    }

    /// `None` when the calendar is disabled or no token is available.
    pub fn from_settings(
        settings: &CalendarSettings,
        secrets: &SecretStore,
    ) -> Result<Option<Self>, ApiError> {
        if !settings.enabled {
            return Ok(None);
        }
        match resolve_credential_from_env(CALENDAR_TOKEN, secrets) {
            Some(token) => Self::new(token, settings).map(Some),
            None => {
                tracing::warn!("calendar enabled but {CALENDAR_TOKEN} is missing; events will not be created");
                Ok(None)
            }
        }
    }

    fn events_endpoint(&self) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| ApiError::InvalidRequest(format!("calendar base url: {err}")))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidRequest("calendar base url cannot have a path".into()))?
            .pop_if_empty()
            .extend(["calendars", self.calendar_id.as_str(), "events"]);
        Ok(url)
    }
}

#[derive(Debug, Serialize)]
struct EventRequest<'a> {
    summary: &'a str,
    start: EventDate,
    end: EventDate,
}

#[derive(Debug, Serialize)]
struct EventDate {
    date: String,
}

impl EventDate {
    fn from_date(date: NaiveDate) -> Self {
        Self {
            date: date.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EventResponse {
    id: String,
}

#[async_trait]
impl CalendarWriter for GoogleCalendarClient {
    async fn create_event(
        &self,
        title: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<EventId, ApiError> {
        tracing::debug!(calendar = %self.calendar_id, %title, %start, %end, "creating calendar event");
        // The remote end date is exclusive.
        let end_exclusive = end
            .succ_opt()
            .ok_or_else(|| ApiError::InvalidRequest(format!("no day after {end}")))?;
        let body = EventRequest {
            summary: title,
            start: EventDate::from_date(start),
            end: EventDate::from_date(end_exclusive),
        };
        let response = self
            .client
            .post(self.events_endpoint()?)
            .bearer_auth(self.token.expose())
            .json(&body)
            .send()
            .await?;
        let created: EventResponse = http_client::decode_json(response).await?;
        Ok(EventId(created.id))
    }
}
