use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;

use crate::{AppState, routes};

pub mod auth;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(routes::users::router(&state))
        .merge(routes::tasks::router(&state))
        .merge(routes::actions::router(&state))
        .merge(routes::dashboard::router(&state));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, Response, StatusCode, header},
    };
    use chrono::{Duration, Utc};
    use config::RewardRules;
    use db::types::{ActionStatus, TaskCategory, UserRole};
    use serde_json::{Value, json};
    use services::points::PointsService;
    use tower::ServiceExt;
    use utils_jwt::JwtService;
    use uuid::Uuid;

    use crate::AppState;

    async fn setup() -> (AppState, Router) {
        let db = test_support::test_db().await;
        let state = AppState::new(
            db,
            JwtService::new("test-secret", 30),
            PointsService::new(RewardRules::default()),
        );
        let app = super::router(state.clone());
        (state, app)
    }

    fn json_request(
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn response_json(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn today() -> String {
        Utc::now().date_naive().to_string()
    }

    async fn register_and_login(app: &Router, username: &str, email: &str) -> String {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/register",
                None,
                Some(json!({
                    "username": username,
                    "email": email,
                    "password": "hunter2hunter2",
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/login",
                None,
                Some(json!({ "email": email, "password": "hunter2hunter2" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        body.pointer("/data/access_token")
            .and_then(Value::as_str)
            .expect("access token")
            .to_string()
    }

    async fn create_task_as_admin(
        app: &Router,
        admin_token: &str,
        category: &str,
        date: &str,
    ) -> String {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/tasks",
                Some(admin_token),
                Some(json!({
                    "title": format!("{category} task"),
                    "description": "daily task",
                    "category": category,
                    "date": date,
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response_json(response).await;
        body.pointer("/data/id")
            .and_then(Value::as_str)
            .expect("task id")
            .to_string()
    }

    async fn check_in(app: &Router, token: &str, task_id: &str) -> Response<Body> {
        app.clone()
            .oneshot(json_request(
                "POST",
                "/api/actions",
                Some(token),
                Some(json!({ "task_id": task_id })),
            ))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let (_state, app) = setup().await;
        let response = app
            .oneshot(json_request("GET", "/health", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn register_login_and_profile_flow() {
        let (_state, app) = setup().await;
        let token = register_and_login(&app, "alice", "alice@example.com").await;

        // duplicate email conflicts
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/register",
                None,
                Some(json!({
                    "username": "alice2",
                    "email": "alice@example.com",
                    "password": "another-password",
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        // wrong password
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/login",
                None,
                Some(json!({ "email": "alice@example.com", "password": "wrong" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(json_request("GET", "/api/user/me", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(
            body.pointer("/data/username").and_then(Value::as_str),
            Some("alice")
        );
        assert!(body.pointer("/data/password_hash").is_none());

        let response = app
            .oneshot(json_request("GET", "/api/user/me", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn governance_checkin_awards_twelve_points() {
        let (state, app) = setup().await;
        let admin = test_support::seed_user(
            &state.db().pool,
            "admin",
            "admin@example.com",
            UserRole::Admin,
        )
        .await;
        let admin_token = state.jwt().issue(admin.id).unwrap();

        let task_id = create_task_as_admin(&app, &admin_token, "governance", &today()).await;
        let token = register_and_login(&app, "bob", "bob@example.com").await;

        let response = check_in(&app, &token, &task_id).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response_json(response).await;
        assert_eq!(
            body.pointer("/data/points_earned").and_then(Value::as_i64),
            Some(12)
        );

        let response = app
            .clone()
            .oneshot(json_request("GET", "/api/user/points", Some(&token), None))
            .await
            .unwrap();
        let body = response_json(response).await;
        assert_eq!(body.pointer("/data/points").and_then(Value::as_i64), Some(12));
        assert_eq!(
            body.pointer("/data/streak_days").and_then(Value::as_i64),
            Some(1)
        );

        // second check-in on the same task conflicts
        let response = check_in(&app, &token, &task_id).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn checkin_is_rejected_outside_the_task_day() {
        let (state, app) = setup().await;
        let admin = test_support::seed_user(
            &state.db().pool,
            "admin",
            "admin@example.com",
            UserRole::Admin,
        )
        .await;
        let admin_token = state.jwt().issue(admin.id).unwrap();
        let yesterday = (Utc::now().date_naive() - Duration::days(1)).to_string();
        let task_id = create_task_as_admin(&app, &admin_token, "environment", &yesterday).await;

        let token = register_and_login(&app, "late", "late@example.com").await;
        let response = check_in(&app, &token, &task_id).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn checkin_on_unknown_task_is_not_found() {
        let (_state, app) = setup().await;
        let token = register_and_login(&app, "ghost", "ghost@example.com").await;
        let response = check_in(&app, &token, &Uuid::new_v4().to_string()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn task_creation_requires_admin() {
        let (_state, app) = setup().await;
        let token = register_and_login(&app, "pleb", "pleb@example.com").await;

        let payload = json!({
            "title": "t",
            "description": "d",
            "category": "society",
            "date": today(),
        });
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/tasks",
                Some(&token),
                Some(payload.clone()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(json_request("POST", "/api/tasks", None, Some(payload)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_task_category_filter_returns_empty_list() {
        let (state, app) = setup().await;
        test_support::seed_task(&state.db().pool, TaskCategory::Environment, &today()).await;

        let response = app
            .clone()
            .oneshot(json_request("GET", "/api/tasks?category=finance", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body.pointer("/data").and_then(Value::as_array).map(Vec::len), Some(0));

        let response = app
            .oneshot(json_request(
                "GET",
                "/api/tasks?category=environment",
                None,
                None,
            ))
            .await
            .unwrap();
        let body = response_json(response).await;
        assert_eq!(body.pointer("/data").and_then(Value::as_array).map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn seven_day_streak_pays_the_streak_bonus() {
        let (state, app) = setup().await;
        let pool = &state.db().pool;
        let user =
            test_support::seed_user(pool, "streaker", "streaker@example.com", UserRole::User).await;
        let token = state.jwt().issue(user.id).unwrap();

        for n in 1..=6 {
            let ts = Utc::now() - Duration::days(n);
            let past_task = test_support::seed_task(
                pool,
                TaskCategory::Environment,
                &ts.date_naive().to_string(),
            )
            .await;
            test_support::seed_action(
                pool,
                user.id,
                past_task.id,
                ActionStatus::Completed,
                10,
                ts,
            )
            .await;
        }
        let task = test_support::seed_task(pool, TaskCategory::Environment, &today()).await;

        // day 7 of the streak: base 10 plus the 7-day bonus of 10
        let response = check_in(&app, &token, &task.id.to_string()).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response_json(response).await;
        assert_eq!(
            body.pointer("/data/points_earned").and_then(Value::as_i64),
            Some(20)
        );
    }

    #[tokio::test]
    async fn admin_point_correction_applies_the_delta() {
        let (state, app) = setup().await;
        let pool = &state.db().pool;
        let admin =
            test_support::seed_user(pool, "admin", "admin@example.com", UserRole::Admin).await;
        let admin_token = state.jwt().issue(admin.id).unwrap();
        let task_id = create_task_as_admin(&app, &admin_token, "governance", &today()).await;
        let token = register_and_login(&app, "carol", "carol@example.com").await;

        let response = check_in(&app, &token, &task_id).await;
        let body = response_json(response).await;
        let action_id = body
            .pointer("/data/id")
            .and_then(Value::as_str)
            .unwrap()
            .to_string();

        // non-admin cannot correct
        let response = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                &format!("/api/actions/{action_id}"),
                Some(&token),
                Some(json!({ "points_earned": 20 })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                &format!("/api/actions/{action_id}"),
                Some(&admin_token),
                Some(json!({ "points_earned": 20, "status": "verified" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(
            body.pointer("/data/points_earned").and_then(Value::as_i64),
            Some(20)
        );
        assert_eq!(
            body.pointer("/data/status").and_then(Value::as_str),
            Some("verified")
        );

        // 12 awarded at check-in, corrected to 20: total moves by the delta
        let response = app
            .oneshot(json_request("GET", "/api/user/points", Some(&token), None))
            .await
            .unwrap();
        let body = response_json(response).await;
        assert_eq!(body.pointer("/data/points").and_then(Value::as_i64), Some(20));
    }

    #[tokio::test]
    async fn checkins_are_visible_to_owner_and_admin_only() {
        let (state, app) = setup().await;
        let pool = &state.db().pool;
        let admin =
            test_support::seed_user(pool, "admin", "admin@example.com", UserRole::Admin).await;
        let admin_token = state.jwt().issue(admin.id).unwrap();
        let task_id = create_task_as_admin(&app, &admin_token, "society", &today()).await;

        let owner_token = register_and_login(&app, "owner", "owner@example.com").await;
        let other_token = register_and_login(&app, "other", "other@example.com").await;

        let response = check_in(&app, &owner_token, &task_id).await;
        let body = response_json(response).await;
        let action_id = body
            .pointer("/data/id")
            .and_then(Value::as_str)
            .unwrap()
            .to_string();

        let uri = format!("/api/actions/{action_id}");
        for (token, expected) in [
            (&owner_token, StatusCode::OK),
            (&other_token, StatusCode::FORBIDDEN),
            (&admin_token, StatusCode::OK),
        ] {
            let response = app
                .clone()
                .oneshot(json_request("GET", &uri, Some(token), None))
                .await
                .unwrap();
            assert_eq!(response.status(), expected);
        }
    }

    #[tokio::test]
    async fn leaderboard_and_overview_are_public() {
        let (state, app) = setup().await;
        let pool = &state.db().pool;
        for (name, points) in [("gold", 30i64), ("silver", 20), ("bronze", 10)] {
            let user = test_support::seed_user(
                pool,
                name,
                &format!("{name}@example.com"),
                UserRole::User,
            )
            .await;
            db::models::user::User::add_points(pool, user.id, points)
                .await
                .unwrap();
        }

        let response = app
            .clone()
            .oneshot(json_request("GET", "/api/leaderboard?limit=2", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        let entries = body.pointer("/data").and_then(Value::as_array).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].get("rank").and_then(Value::as_u64), Some(1));
        assert_eq!(entries[0].get("username").and_then(Value::as_str), Some("gold"));
        assert_eq!(entries[1].get("rank").and_then(Value::as_u64), Some(2));

        let response = app
            .oneshot(json_request("GET", "/api/dashboard/overview", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(
            body.pointer("/data/total_users").and_then(Value::as_u64),
            Some(3)
        );
    }

    #[tokio::test]
    async fn dashboards_enforce_their_audiences() {
        let (state, app) = setup().await;
        let admin = test_support::seed_user(
            &state.db().pool,
            "admin",
            "admin@example.com",
            UserRole::Admin,
        )
        .await;
        let admin_token = state.jwt().issue(admin.id).unwrap();
        let member_token = register_and_login(&app, "member", "member@example.com").await;

        let response = app
            .clone()
            .oneshot(json_request(
                "GET",
                "/api/dashboard/user",
                Some(&member_token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(json_request(
                "GET",
                "/api/dashboard/admin",
                Some(&member_token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(json_request(
                "GET",
                "/api/dashboard/admin",
                Some(&admin_token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
