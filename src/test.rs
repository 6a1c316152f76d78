use crate::config::Config;
use crate::db::{init_db_pool, test_pool};
use crate::models::event::EventFields;
use crate::models::user::{Role, UserIdentity};
use crate::services::scheduler::sort_by_date;
use crate::state::AppState;

use chrono::{NaiveDate, NaiveTime};
use std::time::Duration;

// Helper function to build a config for in-process tests
fn test_config() -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "scenario-test-secret".to_string(),
        jwt_expiration_hours: 1,
        max_connections: 1,
        acquire_timeout: Duration::from_secs(3),
        busy_timeout: Duration::from_secs(3),
        min_password_length: 1,
    }
}

// Helper function to set up the full application state on a fresh database
async fn setup_state() -> AppState {
    AppState::new(test_pool().await, &test_config())
}

// Helper function to set up the state over a file database with a multi-connection pool
async fn setup_file_state(dir: &tempfile::TempDir) -> AppState {
    let mut config = test_config();
    config.database_url = format!("sqlite://{}", dir.path().join("events.db").display());
    config.max_connections = 8;
    config.busy_timeout = Duration::from_secs(10);
    config.acquire_timeout = Duration::from_secs(10);

    let pool = init_db_pool(&config)
        .await
        .expect("Failed to initialize file database");
    AppState::new(pool, &config)
}

fn event_on(name: &str, date: &str) -> EventFields {
    event_on_date(name, NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap())
}

fn event_on_date(name: &str, date: NaiveDate) -> EventFields {
    EventFields {
        name: name.to_string(),
        description: format!("{name} description"),
        date,
        time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        location: "Town hall".to_string(),
    }
}

#[cfg(test)]
mod scenario_tests {
    use super::*;
    use crate::error::AppError;

    #[tokio::test]
    async fn test_alice_and_bob_booking_scenario() {
        let state = setup_state().await;
        state.auth.register("alice", "pw1", Role::User).await.unwrap();
        state.auth.register("bob", "pw2", Role::Admin).await.unwrap();

        let alice_login = state.auth.login("alice", "pw1").await.unwrap();
        let bob_login = state.auth.login("bob", "pw2").await.unwrap();
        let alice = state.auth.authenticate(&alice_login.token).unwrap();
        let bob = state.auth.authenticate(&bob_login.token).unwrap();
        assert_eq!(alice, UserIdentity::new("alice", Role::User));
        assert_eq!(bob, UserIdentity::new("bob", Role::Admin));

        state
            .bookings
            .create_event(event_on("Alice's Launch", "2024-05-01"), &alice.username)
            .await
            .unwrap();

        let conflict = state
            .bookings
            .create_event(event_on("Bob's Launch", "2024-05-01"), &bob.username)
            .await;
        assert!(matches!(conflict, Err(AppError::DateConflict(_))));

        state
            .bookings
            .create_event(event_on("Bob's Party", "2024-05-02"), &bob.username)
            .await
            .unwrap();

        assert_eq!(state.bookings.list_events(&alice).await.unwrap().len(), 1);

        let bobs_view = state.bookings.list_events(&bob).await.unwrap();
        assert_eq!(bobs_view.len(), 2);

        let sorted = sort_by_date(&bobs_view);
        let dates: Vec<String> = sorted.iter().map(|e| e.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-05-01", "2024-05-02"]);
    }

    #[tokio::test]
    async fn test_register_is_unique_per_username() {
        let state = setup_state().await;
        for name in ["u1", "u2", "u3"] {
            state.auth.register(name, "pw", Role::User).await.unwrap();
        }
        for name in ["u1", "u2", "u3"] {
            assert!(matches!(
                state.auth.register(name, "pw", Role::User).await,
                Err(AppError::DuplicateUsername)
            ));
        }
    }
}

#[cfg(test)]
mod concurrency_tests {
    use super::*;
    use crate::error::AppError;
    use chrono::Days;

    fn first_of_year() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    async fn setup_with_users(dir: &tempfile::TempDir) -> AppState {
        let state = setup_file_state(dir).await;
        state.auth.register("alice", "pw1", Role::User).await.unwrap();
        state.auth.register("bob", "pw2", Role::Admin).await.unwrap();
        state
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overlapping_bookings_on_distinct_dates_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let state = setup_with_users(&dir).await;

        let handles: Vec<_> = (0..40u64)
            .map(|i| {
                let bookings = state.bookings.clone();
                let owner = if i % 2 == 0 { "alice" } else { "bob" };
                tokio::spawn(async move {
                    let date = first_of_year() + Days::new(i);
                    bookings
                        .create_event(event_on_date(&format!("event {i}"), date), owner)
                        .await
                })
            })
            .collect();

        for handle in handles {
            let result = handle.await.unwrap();
            assert!(result.is_ok(), "booking failed: {result:?}");
        }

        let bob = UserIdentity::new("bob", Role::Admin);
        assert_eq!(state.bookings.list_events(&bob).await.unwrap().len(), 40);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overlapping_bookings_on_one_date() {
        let dir = tempfile::tempdir().unwrap();
        let state = setup_with_users(&dir).await;

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let bookings = state.bookings.clone();
                tokio::spawn(async move {
                    bookings
                        .create_event(event_on(&format!("event {i}"), "2024-05-01"), "alice")
                        .await
                })
            })
            .collect();

        let mut booked = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => booked += 1,
                Err(AppError::DateConflict(_)) => {}
                Err(e) => panic!("unexpected error: {e:?}"),
            }
        }

        assert_eq!(booked, 1);
        let bob = UserIdentity::new("bob", Role::Admin);
        assert_eq!(state.bookings.list_events(&bob).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overlapping_updates_on_one_event() {
        let dir = tempfile::tempdir().unwrap();
        let state = setup_with_users(&dir).await;
        let id = state
            .bookings
            .create_event(event_on("Launch", "2024-05-01"), "alice")
            .await
            .unwrap();

        let handles: Vec<_> = (0..20u64)
            .map(|i| {
                let bookings = state.bookings.clone();
                let requester = if i % 2 == 0 {
                    UserIdentity::new("alice", Role::User)
                } else {
                    UserIdentity::new("bob", Role::Admin)
                };
                tokio::spawn(async move {
                    let date = first_of_year() + Days::new(i);
                    bookings
                        .update_event(id, event_on_date(&format!("v{i}"), date), &requester)
                        .await
                })
            })
            .collect();

        for handle in handles {
            let result = handle.await.unwrap();
            assert!(result.is_ok(), "update failed: {result:?}");
        }

        let alice = UserIdentity::new("alice", Role::User);
        let events = state.bookings.list_events(&alice).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].owner_username, "alice");
        // Whichever update committed last wrote name and date together
        let version: u64 = events[0].name.trim_start_matches('v').parse().unwrap();
        assert_eq!(events[0].date, first_of_year() + Days::new(version));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_updates_racing_a_delete() {
        let dir = tempfile::tempdir().unwrap();
        let state = setup_with_users(&dir).await;
        let id = state
            .bookings
            .create_event(event_on("Launch", "2024-05-01"), "alice")
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..10u64 {
            let bookings = state.bookings.clone();
            handles.push(tokio::spawn(async move {
                let alice = UserIdentity::new("alice", Role::User);
                let date = first_of_year() + Days::new(i);
                bookings
                    .update_event(id, event_on_date(&format!("v{i}"), date), &alice)
                    .await
            }));
            if i == 4 {
                let bookings = state.bookings.clone();
                handles.push(tokio::spawn(async move {
                    let bob = UserIdentity::new("bob", Role::Admin);
                    bookings.delete_event(id, &bob).await
                }));
            }
        }

        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) | Err(AppError::NotFound(_)) => {}
                Err(e) => panic!("unexpected error: {e:?}"),
            }
        }

        let bob = UserIdentity::new("bob", Role::Admin);
        assert!(state.bookings.list_events(&bob).await.unwrap().is_empty());
    }
}

#[cfg(test)]
mod router_tests {
    use super::*;
    use crate::handlers::router;
    use crate::models::event::{CreatedEvent, Event};
    use crate::models::user::LoginResponse;

    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn register_and_login(
        app: &Router,
        username: &str,
        password: &str,
        role: &str,
    ) -> String {
        let (status, _) = send(
            app,
            "POST",
            "/auth/register",
            None,
            Some(json!({ "username": username, "password": password, "role": role })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice::<LoginResponse>(&body).unwrap().token
    }

    fn event_json(name: &str, date: &str) -> Value {
        json!({
            "name": name,
            "description": "desc",
            "date": date,
            "time": "18:00:00",
            "location": "Town hall",
        })
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(setup_state().await);
        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"Event booking server is running.");
    }

    #[tokio::test]
    async fn test_auth_errors() {
        let app = router(setup_state().await);
        register_and_login(&app, "alice", "pw1", "User").await;

        let (status, _) = send(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(json!({ "username": "alice", "password": "other" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "wrong" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, "GET", "/events", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, "GET", "/events", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_booking_over_http() {
        let app = router(setup_state().await);
        let alice = register_and_login(&app, "alice", "pw1", "User").await;
        let bob = register_and_login(&app, "bob", "pw2", "Admin").await;

        let (status, _) = send(
            &app,
            "POST",
            "/events",
            Some(bob.as_str()),
            Some(event_json("Party", "2024-05-02")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            &app,
            "POST",
            "/events",
            Some(alice.as_str()),
            Some(event_json("Launch", "2024-05-01")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let alice_event = serde_json::from_slice::<CreatedEvent>(&body).unwrap().id;

        let (status, body) = send(
            &app,
            "POST",
            "/events",
            Some(bob.as_str()),
            Some(event_json("Clash", "2024-05-01")),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        let error: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(error["error"], "Date already booked: 2024-05-01");

        let (status, _) = send(
            &app,
            "POST",
            "/events",
            Some(alice.as_str()),
            Some(event_json("", "2024-06-01")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&app, "GET", "/events", Some(alice.as_str()), None).await;
        let alice_view: Vec<Event> = serde_json::from_slice(&body).unwrap();
        assert_eq!(alice_view.len(), 1);
        assert_eq!(alice_view[0].owner_username, "alice");

        let (_, body) = send(&app, "GET", "/events?sort=date", Some(bob.as_str()), None).await;
        let names: Vec<String> = serde_json::from_slice::<Vec<Event>>(&body)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Launch", "Party"]);

        let (status, _) = send(&app, "GET", "/events?sort=name", Some(bob.as_str()), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "PUT",
            "/events/1",
            Some(alice.as_str()),
            Some(event_json("Mine now", "2024-07-01")),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let uri = format!("/events/{alice_event}");
        let (status, _) = send(
            &app,
            "PUT",
            &uri,
            Some(bob.as_str()),
            Some(event_json("Launch (moved)", "2024-07-01")),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(
            &app,
            "PUT",
            "/events/999",
            Some(bob.as_str()),
            Some(event_json("Ghost", "2024-08-01")),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "DELETE", &uri, Some(alice.as_str()), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "DELETE", &uri, Some(alice.as_str()), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = send(&app, "GET", "/events", Some(alice.as_str()), None).await;
        assert!(serde_json::from_slice::<Vec<Event>>(&body).unwrap().is_empty());
    }
}
