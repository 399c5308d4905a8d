use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use lodge_app::{bookings::clock::FixedClock, App};
use lodge_kernel::settings::{DatabaseSettings, Settings};
use serde_json::{json, Value};
use tower::ServiceExt;

/// 09:00 in Bermuda: today is 2030-06-15, the horizon is 2030-06-16..=2030-07-15.
const NOW: &str = "2030-06-15T12:00:00Z";

async fn app() -> Router {
    app_on("sqlite::memory:".to_string(), 1).await
}

async fn app_on(url: String, max_connections: u32) -> Router {
    let settings = Settings {
        database: DatabaseSettings {
            url,
            max_connections,
        },
        ..Settings::default()
    };
    let clock = Arc::new(FixedClock(NOW.parse().unwrap()));
    App::bootstrap(settings, clock).await.unwrap().router()
}

/// A database file with its own connection pool, removed when dropped.
struct FileDb(std::path::PathBuf);

impl FileDb {
    fn new() -> Self {
        let name = format!("lodge-api-{}.sqlite", uuid::Uuid::new_v4());
        Self(std::env::temp_dir().join(name))
    }

    fn url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.0.display())
    }
}

impl Drop for FileDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.0.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn create(app: &Router, check_in: &str, check_out: &str) -> (StatusCode, Value) {
    send(app, Method::POST, "/bookings", Some(stay(check_in, check_out))).await
}

fn stay(check_in: &str, check_out: &str) -> Value {
    json!({
        "email": "tester@testing.test",
        "fullName": "Tester",
        "checkIn": check_in,
        "checkOut": check_out
    })
}

fn status_of(availability: &Value, date: &str) -> String {
    availability["dates"]
        .as_array()
        .unwrap()
        .iter()
        .find(|entry| entry["date"] == date)
        .map(|entry| entry["status"].as_str().unwrap().to_string())
        .unwrap()
}

#[tokio::test]
async fn default_window_is_all_available() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/dates", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["from"], "2030-06-16");
    assert_eq!(body["to"], "2030-07-15");
    assert_eq!(body["count"], 29);
    let dates = body["dates"].as_array().unwrap();
    assert_eq!(dates.len(), 29);
    assert!(dates.iter().all(|entry| entry["status"] == "AVAILABLE"));
}

#[tokio::test]
async fn equal_bounds_return_one_day() {
    let app = app().await;
    let uri = "/dates?from=2030-06-20&to=2030-06-20";
    let (status, body) = send(&app, Method::GET, uri, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["to"], "2030-06-21");
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn out_of_horizon_queries_are_bad_requests() {
    let app = app().await;
    for uri in [
        "/dates?from=2030-06-15",
        "/dates?to=2030-07-16",
        "/dates?from=2030-06-20&to=2030-06-18",
        "/dates?from=not-a-date",
    ] {
        let (status, body) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["error"]["message"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn create_then_dates_are_unavailable() {
    let app = app().await;
    let (status, booking) = create(&app, "2030-06-17", "2030-06-19").await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(booking["id"].as_i64().unwrap() > 0);
    assert_eq!(booking["status"], "CONFIRMED");
    assert_eq!(booking["fullName"], "Tester");
    assert_eq!(booking["checkIn"], "2030-06-17");
    assert_eq!(booking["deletedTime"], 0);

    let (_, availability) = send(&app, Method::GET, "/dates", None).await;
    assert_eq!(status_of(&availability, "2030-06-16"), "AVAILABLE");
    assert_eq!(status_of(&availability, "2030-06-17"), "UNAVAILABLE");
    assert_eq!(status_of(&availability, "2030-06-18"), "UNAVAILABLE");
    assert_eq!(status_of(&availability, "2030-06-19"), "AVAILABLE");
}

#[tokio::test]
async fn invalid_stays_are_rejected() {
    let app = app().await;
    let mut no_name = stay("2030-06-17", "2030-06-18");
    no_name.as_object_mut().unwrap().remove("fullName");
    let mut blank_email = stay("2030-06-17", "2030-06-18");
    blank_email["email"] = json!(" ");

    for body in [
        stay("2030-06-17", "2030-06-17"),
        stay("2030-06-17", "2030-06-21"),
        stay("2030-06-18", "2030-06-17"),
        no_name,
        blank_email,
    ] {
        let (status, _) = send(&app, Method::POST, "/bookings", Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    }

    let (_, availability) = send(&app, Method::GET, "/dates", None).await;
    assert!(availability["dates"]
        .as_array()
        .unwrap()
        .iter()
        .all(|entry| entry["status"] == "AVAILABLE"));
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let app = app().await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/bookings")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn overlapping_booking_conflicts() {
    let app = app().await;
    let (status, _) = create(&app, "2030-06-17", "2030-06-19").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = create(&app, "2030-06-18", "2030-06-20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "date_conflict");

    let (_, availability) = send(&app, Method::GET, "/dates", None).await;
    assert_eq!(status_of(&availability, "2030-06-19"), "AVAILABLE");
}

async fn create_all(
    app: &Router,
    stays: &[(&'static str, &'static str)],
) -> Vec<(StatusCode, Value)> {
    let handles: Vec<_> = stays
        .iter()
        .map(|&(check_in, check_out)| {
            let app = app.clone();
            tokio::spawn(async move { create(&app, check_in, check_out).await })
        })
        .collect();

    let mut responses = Vec::new();
    for handle in handles {
        responses.push(handle.await.unwrap());
    }
    responses
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_overlapping_creates_have_one_winner() {
    let db = FileDb::new();
    let app = app_on(db.url(), 5).await;

    let responses = create_all(
        &app,
        &[
            ("2030-06-25", "2030-06-27"),
            ("2030-06-26", "2030-06-28"),
            ("2030-06-24", "2030-06-27"),
            ("2030-06-26", "2030-06-27"),
        ],
    )
    .await;

    let winners: Vec<&Value> = responses
        .iter()
        .filter(|(status, _)| *status == StatusCode::CREATED)
        .map(|(_, body)| body)
        .collect();
    assert_eq!(winners.len(), 1, "{responses:?}");
    for (status, body) in responses.iter().filter(|(s, _)| *s != StatusCode::CREATED) {
        assert_eq!(*status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "date_conflict");
    }

    let winner = winners[0];
    let (_, availability) =
        send(&app, Method::GET, "/dates?from=2030-06-24&to=2030-06-29", None).await;
    for entry in availability["dates"].as_array().unwrap() {
        let date = entry["date"].as_str().unwrap();
        let held = date >= winner["checkIn"].as_str().unwrap()
            && date < winner["checkOut"].as_str().unwrap();
        let expected = if held { "UNAVAILABLE" } else { "AVAILABLE" };
        assert_eq!(entry["status"], expected, "{date}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_disjoint_creates_all_succeed() {
    let db = FileDb::new();
    let app = app_on(db.url(), 5).await;

    let responses = create_all(
        &app,
        &[
            ("2030-06-16", "2030-06-17"),
            ("2030-06-18", "2030-06-19"),
            ("2030-06-20", "2030-06-21"),
            ("2030-06-22", "2030-06-23"),
            ("2030-06-24", "2030-06-25"),
        ],
    )
    .await;

    for (status, body) in &responses {
        assert_eq!(*status, StatusCode::CREATED, "{body}");
    }

    let (_, availability) = send(&app, Method::GET, "/dates", None).await;
    for date in ["2030-06-16", "2030-06-18", "2030-06-20", "2030-06-22", "2030-06-24"] {
        assert_eq!(status_of(&availability, date), "UNAVAILABLE");
    }
    assert_eq!(status_of(&availability, "2030-06-17"), "AVAILABLE");
}

#[tokio::test]
async fn update_moves_the_stay() {
    let app = app().await;
    let (_, booking) = create(&app, "2030-06-17", "2030-06-19").await;
    let id = booking["id"].as_i64().unwrap();

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/bookings/{id}"),
        Some(stay("2030-06-18", "2030-06-21")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], id);
    assert_eq!(updated["checkOut"], "2030-06-21");
    assert_eq!(updated["createdTime"], booking["createdTime"]);

    let (_, availability) = send(&app, Method::GET, "/dates", None).await;
    assert_eq!(status_of(&availability, "2030-06-17"), "AVAILABLE");
    assert_eq!(status_of(&availability, "2030-06-20"), "UNAVAILABLE");
}

#[tokio::test]
async fn update_with_other_identity_is_rejected() {
    let app = app().await;
    let (_, booking) = create(&app, "2030-06-17", "2030-06-19").await;
    let id = booking["id"].as_i64().unwrap();

    let mut other = stay("2030-06-22", "2030-06-23");
    other["email"] = json!("someone@else.test");
    let (status, body) = send(&app, Method::PUT, &format!("/bookings/{id}"), Some(other)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "not_allowed");

    let (_, availability) = send(&app, Method::GET, "/dates", None).await;
    assert_eq!(status_of(&availability, "2030-06-17"), "UNAVAILABLE");
    assert_eq!(status_of(&availability, "2030-06-22"), "AVAILABLE");
}

#[tokio::test]
async fn unknown_ids_are_bad_requests() {
    let app = app().await;

    let update = Some(stay("2030-06-17", "2030-06-18"));
    let (status, body) = send(&app, Method::PUT, "/bookings/123", update).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "not_found");

    let (status, _) = send(&app, Method::DELETE, "/bookings/123", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::DELETE, "/bookings/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_parameters");
}

#[tokio::test]
async fn delete_frees_the_dates() {
    let app = app().await;
    let (_, booking) = create(&app, "2030-06-17", "2030-06-19").await;
    let id = booking["id"].as_i64().unwrap();

    let (status, _) = send(&app, Method::DELETE, &format!("/bookings/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, availability) = send(&app, Method::GET, "/dates", None).await;
    assert_eq!(status_of(&availability, "2030-06-17"), "AVAILABLE");
    assert_eq!(status_of(&availability, "2030-06-18"), "AVAILABLE");

    let (status, deleted) = send(&app, Method::GET, &format!("/bookings/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["status"], "DELETED");

    let (status, _) = send(&app, Method::DELETE, &format!("/bookings/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn clearing_dates_reopens_the_calendar() {
    let app = app().await;
    create(&app, "2030-06-17", "2030-06-19").await;

    let (status, _) = send(&app, Method::DELETE, "/dates", None).await;
    assert_eq!(status, StatusCode::OK);

    let uri = "/dates?from=2030-06-17&to=2030-06-19";
    let (_, availability) = send(&app, Method::GET, uri, None).await;
    assert_eq!(status_of(&availability, "2030-06-17"), "AVAILABLE");
    assert_eq!(status_of(&availability, "2030-06-18"), "AVAILABLE");
}

#[tokio::test]
async fn health_and_docs_are_served() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, spec) = send(&app, Method::GET, "/docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(spec["paths"]["/bookings/{id}"]["put"].is_object());
    assert!(spec["components"]["schemas"]["Availability"].is_object());
}
