//! Google Calendar adapter: today's events on the primary calendar.

use std::sync::Arc;
use std::time::Duration;

use assist_core::config::GoogleConfig;
use assist_core::types::ToolOutcome;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::credential::CredentialManager;
use crate::error::AuthError;
use crate::CALENDAR_READONLY;

pub const NO_EVENTS_TODAY: &str = "오늘 예정된 일정이 없습니다.";
const HEADER: &str = "오늘의 일정입니다:";
const ALL_DAY: &str = "하루 종일";
const MISSING_SUMMARY: &str = "(제목 없음)";

#[async_trait]
pub trait CalendarTool: Send + Sync {
    /// Summarize today's events, ordered by start time.
    async fn list_today_events(&self) -> ToolOutcome;
}

/// Text form of a calendar outcome, as fed to the summarizer prompt.
pub fn render(outcome: &ToolOutcome) -> String {
    match outcome {
        ToolOutcome::Ok(text) => text.clone(),
        ToolOutcome::NotFound => NO_EVENTS_TODAY.to_string(),
        ToolOutcome::AuthRequired => AuthError::AuthRequired.to_string(),
        ToolOutcome::ApiError(detail) => format!("Calendar API 호출 중 오류 발생: {}", detail),
    }
}

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<Event>,
}

#[derive(Debug, Deserialize)]
struct Event {
    #[serde(default)]
    summary: Option<String>,
    start: EventStart,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventStart {
    #[serde(default)]
    date_time: Option<String>,
}

/// Render events as the daily agenda. `None` when there are no events.
fn format_agenda(events: &[Event], offset: &FixedOffset) -> Option<String> {
    if events.is_empty() {
        return None;
    }
    let mut lines = Vec::with_capacity(events.len() + 1);
    lines.push(HEADER.to_string());
    for event in events {
        let start = event
            .start
            .date_time
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(offset).format("%H:%M").to_string())
            .unwrap_or_else(|| ALL_DAY.to_string());
        let summary = event.summary.as_deref().unwrap_or(MISSING_SUMMARY);
        lines.push(format!("- {}: {}", start, summary));
    }
    Some(lines.join("\n"))
}

/// First and last instant of `date` in `offset`, as RFC 3339 strings.
fn day_bounds(date: NaiveDate, offset: &FixedOffset) -> Option<(String, String)> {
    let end_time = NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999)?;
    let start = offset
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .single()?;
    let end = offset.from_local_datetime(&date.and_time(end_time)).single()?;
    Some((start.to_rfc3339(), end.to_rfc3339()))
}

/// Calendar REST client.
pub struct CalendarClient {
    http: reqwest::Client,
    api_base: String,
    offset: FixedOffset,
    credentials: Arc<CredentialManager>,
}

impl CalendarClient {
    pub fn new(
        config: &GoogleConfig,
        credentials: Arc<CredentialManager>,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let offset = FixedOffset::east_opt(config.utc_offset_hours * 3600).unwrap_or_else(|| {
            warn!(
                hours = config.utc_offset_hours,
                "Invalid UTC offset, using UTC"
            );
            Utc.fix()
        });
        Ok(Self {
            http,
            api_base: config.calendar_api_base.trim_end_matches('/').to_string(),
            offset,
            credentials,
        })
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }

    async fn events_on(&self, date: NaiveDate, token: &str) -> Result<Vec<Event>, String> {
        let (time_min, time_max) =
            day_bounds(date, &self.offset).ok_or_else(|| format!("invalid date {}", date))?;

        let response = self
            .http
            .get(format!("{}/calendars/primary/events", self.api_base))
            .bearer_auth(token)
            .query(&[
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
            ])
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("{} {}", status, body));
        }
        let list: EventList = response.json().await.map_err(|e| e.to_string())?;
        Ok(list.items)
    }
}

#[async_trait]
impl CalendarTool for CalendarClient {
    async fn list_today_events(&self) -> ToolOutcome {
        let credential = match self
            .credentials
            .get_valid_credential(&[CALENDAR_READONLY])
            .await
        {
            Ok(c) => c,
            Err(AuthError::AuthRequired) => return ToolOutcome::AuthRequired,
            Err(e) => {
                warn!(error = %e, "Calendar credential unavailable");
                return ToolOutcome::AuthRequired;
            }
        };

        let today = self.today();
        match self.events_on(today, &credential.access_token).await {
            Ok(events) => {
                debug!(%today, count = events.len(), "Calendar events fetched");
                match format_agenda(&events, &self.offset) {
                    Some(agenda) => ToolOutcome::Ok(agenda),
                    None => ToolOutcome::NotFound,
                }
            }
            Err(detail) => {
                warn!(%detail, "Calendar API call failed");
                ToolOutcome::ApiError(detail)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use axum::extract::{Query, State};
    use axum::routing::get;
    use axum::{Json, Router};
    use chrono::Duration as ChronoDuration;
    use serde_json::{json, Value};

    use crate::credential::{FileTokenStore, StoredToken, TokenStore};

    fn kst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn events(value: Value) -> Vec<Event> {
        serde_json::from_value::<EventList>(value).unwrap().items
    }

    #[test]
    fn test_agenda_format() {
        let list = events(json!({"items": [
            {"summary": "회의", "start": {"dateTime": "2026-10-16T10:00:00+09:00"}},
            {"summary": "휴가", "start": {"date": "2026-10-16"}},
            {"start": {"dateTime": "2026-10-16T05:30:00Z"}}
        ]}));
        let agenda = format_agenda(&list, &kst()).unwrap();
        assert_eq!(
            agenda,
            "오늘의 일정입니다:\n- 10:00: 회의\n- 하루 종일: 휴가\n- 14:30: (제목 없음)"
        );
    }

    #[test]
    fn test_empty_agenda_is_none() {
        assert!(format_agenda(&[], &kst()).is_none());
        assert_eq!(render(&ToolOutcome::NotFound), NO_EVENTS_TODAY);
    }

    #[test]
    fn test_day_bounds_in_offset() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let (min, max) = day_bounds(date, &kst()).unwrap();
        assert_eq!(min, "2026-10-16T00:00:00+09:00");
        assert_eq!(max, "2026-10-16T23:59:59.999999+09:00");
    }

    #[test]
    fn test_render_api_error() {
        assert_eq!(
            render(&ToolOutcome::ApiError("500".into())),
            "Calendar API 호출 중 오류 발생: 500"
        );
    }

    type Seen = std::sync::Arc<Mutex<Vec<HashMap<String, String>>>>;

    async fn spawn_calendar(items: Value) -> (String, Seen) {
        let seen: Seen = Default::default();
        let app = Router::new()
            .route(
                "/calendar/v3/calendars/primary/events",
                get(
                    move |State(seen): State<Seen>, Query(q): Query<HashMap<String, String>>| {
                        let items = items.clone();
                        async move {
                            seen.lock().unwrap().push(q);
                            Json(json!({"kind": "calendar#events", "items": items}))
                        }
                    },
                ),
            )
            .with_state(seen.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/calendar/v3", addr), seen)
    }

    fn client(base: String, dir: &tempfile::TempDir) -> CalendarClient {
        let store = FileTokenStore::new(dir.path().join("token.json"));
        store
            .save(&StoredToken {
                access_token: "cal-token".into(),
                refresh_token: Some("rt".into()),
                expires_at: Utc::now() + ChronoDuration::hours(1),
                scopes: vec![CALENDAR_READONLY.to_string()],
            })
            .unwrap();
        let config = GoogleConfig {
            calendar_api_base: base,
            ..GoogleConfig::default()
        };
        let manager = CredentialManager::new(Arc::new(store), None, None, &config);
        CalendarClient::new(&config, Arc::new(manager)).unwrap()
    }

    #[tokio::test]
    async fn test_zero_events_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (base, seen) = spawn_calendar(json!([])).await;
        let calendar = client(base, &dir);

        assert_eq!(calendar.list_today_events().await, ToolOutcome::NotFound);

        let seen = seen.lock().unwrap();
        let query = &seen[0];
        assert_eq!(query.get("singleEvents").map(String::as_str), Some("true"));
        assert_eq!(query.get("orderBy").map(String::as_str), Some("startTime"));
        assert!(query["timeMin"].ends_with("+09:00"));
    }

    #[tokio::test]
    async fn test_events_listed() {
        let dir = tempfile::tempdir().unwrap();
        let (base, _) = spawn_calendar(json!([
            {"summary": "점심", "start": {"dateTime": "2026-10-16T12:00:00+09:00"}}
        ]))
        .await;
        let calendar = client(base, &dir);
        assert_eq!(
            calendar.list_today_events().await,
            ToolOutcome::Ok("오늘의 일정입니다:\n- 12:00: 점심".into())
        );
    }

    #[tokio::test]
    async fn test_unreachable_api_is_api_error() {
        let dir = tempfile::tempdir().unwrap();
        let calendar = client("http://127.0.0.1:1/calendar/v3".into(), &dir);
        assert!(matches!(
            calendar.list_today_events().await,
            ToolOutcome::ApiError(_)
        ));
    }
}
