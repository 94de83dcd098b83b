use actix_web::{http::StatusCode, test};
use pretty_assertions::assert_eq;
use serde_json::json;

mod common;

use common::{TestContext, delete, event_body, get, post, put, send};

#[actix_web::test]
async fn test_create_event_applies_defaults() {
    let ctx = TestContext::new().await;
    let app = test::init_service(common::build_app(ctx.state.clone())).await;
    let organizer = ctx.create_user().await;

    let mut body = event_body("River cleanup", 0);
    body.as_object_mut().unwrap().remove("maxAttendees");

    let (status, event) = send(&app, post("/api/events", &organizer.token, body).to_request()).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(event["title"], "River cleanup");
    assert_eq!(event["maxAttendees"], 0);
    assert_eq!(event["status"], "upcoming");
    assert_eq!(event["imageUrl"], "default-event.jpg");
    assert_eq!(event["organizerId"], organizer.id.as_str());
    assert_eq!(event["date"], "2025-06-01T00:00:00Z");
}

#[actix_web::test]
async fn test_create_event_validates_input() {
    let ctx = TestContext::new().await;
    let app = test::init_service(common::build_app(ctx.state.clone())).await;
    let organizer = ctx.create_user().await;

    let mut missing_title = event_body("x", 0);
    missing_title.as_object_mut().unwrap().remove("title");
    let (status, body) = send(
        &app,
        post("/api/events", &organizer.token, missing_title).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "message": "title is required" }));

    let (status, _) = send(
        &app,
        post("/api/events", &organizer.token, event_body("Negative", -1)).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut bad_date = event_body("Bad date", 0);
    bad_date["date"] = json!("next tuesday");
    let (status, body) = send(
        &app,
        post("/api/events", &organizer.token, bad_date).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[actix_web::test]
async fn test_capacity_is_enforced() {
    let ctx = TestContext::new().await;
    let app = test::init_service(common::build_app(ctx.state.clone())).await;
    let organizer = ctx.create_user().await;
    let (a, b, c) = (
        ctx.create_user().await,
        ctx.create_user().await,
        ctx.create_user().await,
    );

    let (_, event) = send(
        &app,
        post("/api/events", &organizer.token, event_body("Food bank", 2)).to_request(),
    )
    .await;
    let id = event["id"].as_str().unwrap();
    let join = format!("/api/events/{}/join", id);

    for user in [&a, &b] {
        let (status, body) = send(&app, post(&join, &user.token, json!({})).to_request()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Successfully joined event");
    }

    let (status, body) = send(&app, post(&join, &c.token, json!({})).to_request()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Event is full");

    let (_, detail) = send(&app, get(&format!("/api/events/{}", id), None).to_request()).await;
    assert_eq!(detail["attendeeCount"], 2);
    assert_eq!(detail["attendees"].as_array().unwrap().len(), 2);
    assert_eq!(detail["organizer"]["id"], organizer.id.as_str());
}

#[actix_web::test]
async fn test_join_leave_and_status() {
    let ctx = TestContext::new().await;
    let app = test::init_service(common::build_app(ctx.state.clone())).await;
    let organizer = ctx.create_user().await;
    let volunteer = ctx.create_user().await;

    let (_, event) = send(
        &app,
        post("/api/events", &organizer.token, event_body("Soup kitchen", 0)).to_request(),
    )
    .await;
    let id = event["id"].as_str().unwrap();
    let joined = format!("/api/events/{}/joined", id);

    let (status, body) = send(&app, get(&joined, Some(&volunteer.token)).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "joined": false, "attendance": null }));

    let join = format!("/api/events/{}/join", id);
    let (status, _) = send(&app, post(&join, &volunteer.token, json!({})).to_request()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, post(&join, &volunteer.token, json!({})).to_request()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Already joined this event");

    let (_, body) = send(&app, get(&joined, Some(&volunteer.token)).to_request()).await;
    assert_eq!(body["joined"], true);
    assert_eq!(body["attendance"]["userId"], volunteer.id.as_str());
    assert_eq!(body["attendance"]["eventId"], id);

    let leave = format!("/api/events/{}/leave", id);
    let (status, body) = send(&app, post(&leave, &volunteer.token, json!({})).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully left event");

    let (status, body) = send(&app, post(&leave, &volunteer.token, json!({})).to_request()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Not attending this event");

    assert_eq!(ctx.count("event_attendees").await, 0);
}

#[actix_web::test]
async fn test_join_missing_event_is_not_found() {
    let ctx = TestContext::new().await;
    let app = test::init_service(common::build_app(ctx.state.clone())).await;
    let volunteer = ctx.create_user().await;

    let (status, body) = send(
        &app,
        post("/api/events/missing/join", &volunteer.token, json!({})).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Event not found");

    let (status, _) = send(&app, get("/api/events/missing", None).to_request()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_only_the_organizer_updates() {
    let ctx = TestContext::new().await;
    let app = test::init_service(common::build_app(ctx.state.clone())).await;
    let organizer = ctx.create_user().await;
    let other = ctx.create_user().await;

    let mut body = event_body("Tree planting", 10);
    body["latitude"] = json!(51.5);
    body["longitude"] = json!(-0.12);
    let (_, event) = send(&app, post("/api/events", &organizer.token, body).to_request()).await;
    let uri = format!("/api/events/{}", event["id"].as_str().unwrap());

    let (status, _) = send(
        &app,
        put(&uri, &other.token, json!({ "title": "Hijacked" })).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = send(
        &app,
        put(
            &uri,
            &organizer.token,
            json!({ "maxAttendees": 0, "latitude": null, "status": "in-progress" }),
        )
        .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Tree planting");
    assert_eq!(updated["maxAttendees"], 0);
    assert_eq!(updated["latitude"], json!(null));
    assert_eq!(updated["longitude"], json!(-0.12));
    assert_eq!(updated["status"], "in-progress");

    let (status, body) = send(
        &app,
        put(&uri, &organizer.token, json!({ "title": "  " })).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "title cannot be empty");
}

#[actix_web::test]
async fn test_delete_cascades_dependents() {
    let ctx = TestContext::new().await;
    let app = test::init_service(common::build_app(ctx.state.clone())).await;
    let organizer = ctx.create_user().await;
    let volunteer = ctx.create_user().await;

    let (_, event) = send(
        &app,
        post("/api/events", &organizer.token, event_body("Beach day", 0)).to_request(),
    )
    .await;
    let id = event["id"].as_str().unwrap().to_string();

    send(
        &app,
        post(&format!("/api/events/{}/join", id), &volunteer.token, json!({})).to_request(),
    )
    .await;

    let (_, team) = send(
        &app,
        post("/api/teams", &organizer.token, common::team_body("Beach crew", true)).to_request(),
    )
    .await;
    let (status, _) = send(
        &app,
        post(
            &format!("/api/teams/{}/events", team["id"].as_str().unwrap()),
            &organizer.token,
            json!({ "eventId": id }),
        )
        .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        post(
            &format!("/api/events/{}/volunteer-logs", id),
            &organizer.token,
            json!({ "userId": volunteer.id, "hours": 2.0 }),
        )
        .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/events/{}", id);
    let (status, _) = send(&app, delete(&uri, &volunteer.token).to_request()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, delete(&uri, &organizer.token).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Event removed");

    let (status, _) = send(&app, get(&uri, None).to_request()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(ctx.count("events").await, 0);
    assert_eq!(ctx.count("event_attendees").await, 0);
    assert_eq!(ctx.count("team_events").await, 0);
    assert_eq!(ctx.count("volunteer_logs").await, 0);
    assert_eq!(ctx.count("teams").await, 1);
}

#[actix_web::test]
async fn test_list_paginates_and_filters() {
    let ctx = TestContext::new().await;
    let app = test::init_service(common::build_app(ctx.state.clone())).await;
    let organizer = ctx.create_user().await;

    for (title, date, category) in [
        ("Third", "2025-09-01", "environment"),
        ("First", "2025-07-01", "environment"),
        ("Second", "2025-08-01", "education"),
    ] {
        let mut body = event_body(title, 0);
        body["date"] = json!(date);
        body["category"] = json!(category);
        send(&app, post("/api/events", &organizer.token, body).to_request()).await;
    }

    let (status, page) = send(&app, get("/api/events?limit=2", None).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = page["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["First", "Second"]);
    assert_eq!(
        page["pagination"],
        json!({
            "total": 3,
            "page": 1,
            "limit": 2,
            "totalPages": 2,
            "hasNext": true,
            "hasPrev": false,
        })
    );
    assert_eq!(page["events"][0]["attendeeCount"], 0);
    assert_eq!(page["events"][0]["attendees"], json!([]));

    let (_, page) = send(&app, get("/api/events?limit=2&page=2", None).to_request()).await;
    assert_eq!(page["events"].as_array().unwrap().len(), 1);
    assert_eq!(page["pagination"]["hasNext"], false);
    assert_eq!(page["pagination"]["hasPrev"], true);

    let (_, page) = send(&app, get("/api/events?page=9", None).to_request()).await;
    assert_eq!(page["events"], json!([]));
    assert_eq!(page["pagination"]["total"], 3);

    let (_, page) = send(&app, get("/api/events?category=education", None).to_request()).await;
    assert_eq!(page["pagination"]["total"], 1);
    assert_eq!(page["events"][0]["title"], "Second");

    let (status, body) = send(&app, get("/api/events?page=0", None).to_request()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "page must be at least 1");
    let (status, page) = send(
        &app,
        get(&format!("/api/events?limit={}", i64::MAX), None).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["events"].as_array().unwrap().len(), 3);
    assert_eq!(page["pagination"]["totalPages"], 1);
    assert_eq!(page["pagination"]["hasNext"], false);
}
