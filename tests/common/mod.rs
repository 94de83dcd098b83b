#![allow(dead_code)]

use actix_web::{
    App, Error,
    body::MessageBody,
    dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse},
    http::StatusCode,
    test, web,
};
use fake::{Fake, faker::name::en::Name};
use serde_json::Value;
use sqlx::SqlitePool;
use std::env;
use tempfile::TempDir;

use handson::database::init_database;
use handson::database::models::{
    Event, EventStatus, HelpRequest, HelpStatus, Team, UrgencyLevel, User,
};
use handson::database::new_id;
use handson::{AppState, Config, routes};

pub fn setup_test_env() {
    unsafe {
        env::set_var("RUST_LOG", "warn");
    }
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A signed-in test user.
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

/// Fresh SQLite file plus the state the app runs on.
pub struct TestContext {
    pub pool: SqlitePool,
    pub state: web::Data<AppState>,
    _temp_dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        setup_test_env();

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let database_url = format!("sqlite:{}/test.db", temp_dir.path().display());

        let config = Config {
            database_url: database_url.clone(),
            database_max_connections: 5,
            jwt_secret: "test-jwt-secret-key".to_string(),
            jwt_expiration_days: 1,
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
            client_base_url: "http://localhost:3000".to_string(),
        };

        let pool = init_database(&database_url, config.database_max_connections)
            .await
            .expect("Failed to initialize test database");
        let state = web::Data::new(AppState::new(pool.clone(), config));

        Self {
            pool,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Inserts a user directly (cheap hash) and mints a token for it.
    pub async fn create_user(&self) -> TestUser {
        let name: String = Name().fake();
        let email = format!("{}@example.com", uuid::Uuid::new_v4());
        let password_hash = bcrypt::hash("password123", 4).expect("Failed to hash password");

        let user = self
            .state
            .user_repository
            .create_user(&User::new(email.clone(), password_hash, name))
            .await
            .expect("Failed to insert test user");

        let token = self
            .state
            .auth_service
            .generate_token(&user)
            .expect("Failed to sign token");

        TestUser {
            id: user.id,
            email,
            token,
        }
    }

    /// Inserts an event for `organizer` (0 means unlimited) and enrolls each of `attendees`.
    pub async fn create_event(
        &self,
        organizer: &TestUser,
        title: &str,
        max_attendees: i64,
        attendees: &[&TestUser],
    ) -> String {
        let now = chrono::Utc::now();
        let event = Event {
            id: new_id(),
            title: title.to_string(),
            description: "Sorting donations".to_string(),
            category: "community".to_string(),
            date: now,
            time: "10:00 AM".to_string(),
            address: "Main Street Shelter".to_string(),
            latitude: None,
            longitude: None,
            max_attendees,
            image_url: "default-event.jpg".to_string(),
            status: EventStatus::Upcoming,
            organizer_id: organizer.id.clone(),
            created_at: now,
            updated_at: now,
        };

        let event = self
            .state
            .event_repository
            .create_event(&event)
            .await
            .expect("Failed to insert test event");

        for attendee in attendees {
            self.state
                .membership_service
                .join_event(&event.id, &attendee.id)
                .await
                .expect("Failed to enroll test attendee");
        }

        event.id
    }

    pub async fn create_team(&self, creator: &TestUser, name: &str) -> String {
        let now = chrono::Utc::now();
        let team = Team {
            id: new_id(),
            name: name.to_string(),
            description: "Neighbours who like to help".to_string(),
            is_public: true,
            team_image: "default-team.jpg".to_string(),
            creator_id: creator.id.clone(),
            created_at: now,
            updated_at: now,
        };

        self.state
            .team_repository
            .create_team(&team)
            .await
            .expect("Failed to insert test team")
            .id
    }

    pub async fn create_help_request(&self, requestor: &TestUser, title: &str) -> String {
        let now = chrono::Utc::now();
        let help_request = HelpRequest {
            id: new_id(),
            title: title.to_string(),
            description: "Need a hand".to_string(),
            urgency_level: UrgencyLevel::Medium,
            status: HelpStatus::Open,
            requestor_id: requestor.id.clone(),
            created_at: now,
            updated_at: now,
        };

        self.state
            .help_request_repository
            .create_help_request(&help_request)
            .await
            .expect("Failed to insert test help request")
            .id
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count records")
    }
}

/// The full route table over the given state, as `main` wires it.
pub fn build_app(
    state: web::Data<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Response = ServiceResponse<impl MessageBody>,
        Config = (),
        InitError = (),
        Error = Error,
    >,
> {
    App::new()
        .app_data(state)
        .configure(routes::configure)
}

pub fn auth_header(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

pub fn get(uri: &str, token: Option<&str>) -> test::TestRequest {
    let req = test::TestRequest::get().uri(uri);
    match token {
        Some(token) => req.insert_header(auth_header(token)),
        None => req,
    }
}

pub fn post(uri: &str, token: &str, body: Value) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .insert_header(auth_header(token))
        .set_json(body)
}

pub fn put(uri: &str, token: &str, body: Value) -> test::TestRequest {
    test::TestRequest::put()
        .uri(uri)
        .insert_header(auth_header(token))
        .set_json(body)
}

pub fn delete(uri: &str, token: &str) -> test::TestRequest {
    test::TestRequest::delete()
        .uri(uri)
        .insert_header(auth_header(token))
}

/// Calls the app and decodes the JSON body (`Null` when empty).
pub async fn send<S, R, B>(app: &S, req: R) -> (StatusCode, Value)
where
    S: Service<R, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let res = test::call_service(app, req).await;
    let status = res.status();
    let body = test::read_body(res).await;

    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("Response body is not JSON")
    };

    (status, json)
}

pub fn event_body(title: &str, max_attendees: i64) -> Value {
    serde_json::json!({
        "title": title,
        "description": "Picking up litter along the river",
        "category": "environment",
        "date": "2025-06-01",
        "time": "9:00 AM - 12:00 PM",
        "address": "Riverside Park",
        "maxAttendees": max_attendees,
    })
}

pub fn team_body(name: &str, is_public: bool) -> Value {
    serde_json::json!({
        "name": name,
        "description": "Neighbours who like to help",
        "isPublic": is_public,
    })
}

pub fn help_request_body(title: &str) -> Value {
    serde_json::json!({
        "title": title,
        "description": "Need a hand moving boxes",
        "urgencyLevel": "high",
    })
}
