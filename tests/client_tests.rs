use chrono::NaiveDate;
use mockito::Matcher;
use serde_json::json;
use study_planner::config::{CalendarSettings, GenerationSettings};
use study_planner::planner::FALLBACK_PREFIX;
use study_planner::{
    ApiError, CalendarWriter, Credential, EventId, GeminiClient, GoogleCalendarClient,
    ScheduleParams, StudyPlanner, Task, TextGenerator, build_schedule,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn generation_settings(base_url: String) -> GenerationSettings {
    GenerationSettings {
        base_url,
        timeout_secs: 5,
        ..GenerationSettings::default()
    }
}

#[tokio::test]
async fn gemini_client_posts_prompt_and_reads_first_candidate() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/models/gemini-pro:generateContent")
        .match_header("x-goog-api-key", "test-key")
        .match_body(Matcher::PartialJson(json!({
            "contents": [{ "parts": [{ "text": "Plan day 1" }] }],
            "generationConfig": { "maxOutputTokens": 1024 }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "candidates": [{ "content": { "parts": [{ "text": "Goal: limits" }] } }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = GeminiClient::new(
        Credential::new("test-key"),
        &generation_settings(server.url()),
    )
    .unwrap();
    let text = client.generate("Plan day 1").await.unwrap();

    assert_eq!(text, "Goal: limits");
    mock.assert_async().await;
}

#[tokio::test]
async fn gemini_error_status_is_reported_with_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/models/gemini-pro:generateContent")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body("API key not valid")
        .create_async()
        .await;

    let client = GeminiClient::new(Credential::new("bad"), &generation_settings(server.url()))
        .unwrap();
    match client.generate("hello").await {
        Err(ApiError::Status { status, body }) => {
            assert_eq!(status, 403);
            assert!(body.contains("API key not valid"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn gemini_empty_candidates_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/models/gemini-pro:generateContent")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"candidates":[]}"#)
        .create_async()
        .await;

    let client = GeminiClient::new(Credential::new("k"), &generation_settings(server.url()))
        .unwrap();
    assert!(matches!(
        client.generate("hello").await,
        Err(ApiError::EmptyResponse)
    ));
}

#[tokio::test]
async fn calendar_client_creates_all_day_event() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/calendars/primary/events")
        .match_header("authorization", "Bearer cal-token")
        .match_body(Matcher::Json(json!({
            "summary": "Chemistry revision",
            "start": { "date": "2024-03-10" },
            "end": { "date": "2024-03-13" }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"abc123","status":"confirmed"}"#)
        .create_async()
        .await;

    let settings = CalendarSettings {
        enabled: true,
        base_url: server.url(),
        ..CalendarSettings::default()
    };
    let client = GoogleCalendarClient::new(Credential::new("cal-token"), &settings).unwrap();
    let id = client
        .create_event("Chemistry revision", d(2024, 3, 10), d(2024, 3, 12))
        .await
        .unwrap();

    assert_eq!(id, EventId("abc123".into()));
    mock.assert_async().await;
}

#[tokio::test]
async fn calendar_rejection_maps_to_status_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/calendars/primary/events")
        .with_status(401)
        .with_body(r#"{"error":{"code":401}}"#)
        .create_async()
        .await;

    let settings = CalendarSettings {
        base_url: server.url(),
        ..CalendarSettings::default()
    };
    let client = GoogleCalendarClient::new(Credential::new("expired"), &settings).unwrap();
    let err = client
        .create_event("Quiz", d(2024, 3, 10), d(2024, 3, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 401, .. }));
}

#[tokio::test]
async fn gemini_key_never_appears_in_query_string() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/models/gemini-pro:generateContent")
        .match_query(Matcher::Regex("key=".into()))
        .with_status(400)
        .expect(0)
        .create_async()
        .await;
    server
        .mock("POST", "/models/gemini-pro:generateContent")
        .match_header("x-goog-api-key", "hidden-key")
        .with_status(200)
        .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"ok"}]}}]}"#)
        .create_async()
        .await;

    let client = GeminiClient::new(
        Credential::new("hidden-key"),
        &generation_settings(server.url()),
    )
    .unwrap();
    assert_eq!(client.generate("hello").await.unwrap(), "ok");
    mock.assert_async().await;
}

#[tokio::test]
async fn transport_failure_does_not_reveal_the_key() {
    // Nothing listens on port 1.
    let client = GeminiClient::new(
        Credential::new("SUPERSECRET123"),
        &generation_settings("http://127.0.0.1:1".into()),
    )
    .unwrap();

    let err = client.generate("hello").await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert!(!err.to_string().contains("SUPERSECRET123"), "{err}");
    assert!(!format!("{err:?}").contains("SUPERSECRET123"));

    let params = ScheduleParams::starting(d(2024, 1, 1)).with_horizon(1);
    let schedule = build_schedule(&[Task::new("Math")], &params).unwrap();
    let plan = StudyPlanner::new(&client).plan(&schedule).await;
    assert!(plan.days[0].plan.starts_with(FALLBACK_PREFIX));
    assert!(!plan.days[0].plan.contains("SUPERSECRET123"));
}

#[tokio::test]
async fn single_day_event_ends_the_following_day() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/calendars/primary/events")
        .match_body(Matcher::Json(json!({
            "summary": "Meeting",
            "start": { "date": "2024-03-10" },
            "end": { "date": "2024-03-11" }
        })))
        .with_status(200)
        .with_body(r#"{"id":"one-day"}"#)
        .create_async()
        .await;

    let settings = CalendarSettings {
        base_url: server.url(),
        ..CalendarSettings::default()
    };
    let client = GoogleCalendarClient::new(Credential::new("cal-token"), &settings).unwrap();
    let id = client
        .create_event("Meeting", d(2024, 3, 10), d(2024, 3, 10))
        .await
        .unwrap();

    assert_eq!(id, EventId("one-day".into()));
    mock.assert_async().await;
}
