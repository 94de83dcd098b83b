use actix_web::{http::StatusCode, test};
use pretty_assertions::assert_eq;
use serde_json::json;

mod common;

use common::{TestContext, delete, get, help_request_body, post, put, send};

#[actix_web::test]
async fn test_create_help_request_defaults() {
    let ctx = TestContext::new().await;
    let app = test::init_service(common::build_app(ctx.state.clone())).await;
    let requestor = ctx.create_user().await;

    let (status, request) = send(
        &app,
        post(
            "/api/help-requests",
            &requestor.token,
            json!({ "title": "Groceries", "description": "Weekly shop" }),
        )
        .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["urgencyLevel"], "medium");
    assert_eq!(request["status"], "open");

    let (_, detail) = send(
        &app,
        get(
            &format!("/api/help-requests/{}", request["id"].as_str().unwrap()),
            None,
        )
        .to_request(),
    )
    .await;
    assert_eq!(detail["requestor"]["email"], requestor.email.as_str());
    assert_eq!(detail["helperCount"], 0);
    assert_eq!(detail["helpers"], json!([]));
}

#[actix_web::test]
async fn test_offer_and_withdraw_drive_status() {
    let ctx = TestContext::new().await;
    let app = test::init_service(common::build_app(ctx.state.clone())).await;
    let requestor = ctx.create_user().await;
    let helper = ctx.create_user().await;

    let (_, request) = send(
        &app,
        post("/api/help-requests", &requestor.token, help_request_body("Move")).to_request(),
    )
    .await;
    let uri = format!("/api/help-requests/{}", request["id"].as_str().unwrap());
    let offer = format!("{}/offer-help", uri);
    let withdraw = format!("{}/withdraw-help", uri);

    let (status, body) = send(&app, post(&offer, &helper.token, json!({})).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully offered help");

    let (_, detail) = send(&app, get(&uri, None).to_request()).await;
    assert_eq!(detail["status"], "in-progress");
    assert_eq!(detail["helperCount"], 1);
    assert_eq!(detail["helpers"][0]["id"], helper.id.as_str());

    let (status, body) = send(&app, post(&withdraw, &helper.token, json!({})).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully withdrew help");

    let (_, detail) = send(&app, get(&uri, None).to_request()).await;
    assert_eq!(detail["status"], "open");
    assert_eq!(detail["helperCount"], 0);

    let (status, body) = send(&app, post(&withdraw, &helper.token, json!({})).to_request()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Not offering help for this request");
}

#[actix_web::test]
async fn test_offer_requires_open_status() {
    let ctx = TestContext::new().await;
    let app = test::init_service(common::build_app(ctx.state.clone())).await;
    let requestor = ctx.create_user().await;
    let first = ctx.create_user().await;
    let second = ctx.create_user().await;

    let (_, request) = send(
        &app,
        post("/api/help-requests", &requestor.token, help_request_body("Paint")).to_request(),
    )
    .await;
    let uri = format!("/api/help-requests/{}", request["id"].as_str().unwrap());
    let offer = format!("{}/offer-help", uri);

    send(&app, post(&offer, &first.token, json!({})).to_request()).await;

    let (status, body) = send(&app, post(&offer, &first.token, json!({})).to_request()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "This request is in-progress");

    let (status, body) = send(&app, post(&offer, &second.token, json!({})).to_request()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "This request is in-progress");

    // Requestor reopens it by hand; later offers and withdrawals leave that choice alone.
    let (status, _) = send(
        &app,
        put(&uri, &requestor.token, json!({ "status": "open" })).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, post(&offer, &second.token, json!({})).to_request()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        post(&format!("{}/withdraw-help", uri), &first.token, json!({})).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, detail) = send(&app, get(&uri, None).to_request()).await;
    assert_eq!(detail["status"], "open");
    assert_eq!(detail["helperCount"], 1);
    assert_eq!(detail["helpers"][0]["id"], second.id.as_str());
}

#[actix_web::test]
async fn test_completed_request_keeps_status_when_last_helper_leaves() {
    let ctx = TestContext::new().await;
    let app = test::init_service(common::build_app(ctx.state.clone())).await;
    let requestor = ctx.create_user().await;
    let helper = ctx.create_user().await;

    let (_, request) = send(
        &app,
        post("/api/help-requests", &requestor.token, help_request_body("Fence")).to_request(),
    )
    .await;
    let uri = format!("/api/help-requests/{}", request["id"].as_str().unwrap());

    send(
        &app,
        post(&format!("{}/offer-help", uri), &helper.token, json!({})).to_request(),
    )
    .await;

    let (status, _) = send(
        &app,
        put(&uri, &helper.token, json!({ "status": "completed" })).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = send(
        &app,
        put(&uri, &requestor.token, json!({ "status": "completed" })).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "completed");

    send(
        &app,
        post(&format!("{}/withdraw-help", uri), &helper.token, json!({})).to_request(),
    )
    .await;

    let (_, detail) = send(&app, get(&uri, None).to_request()).await;
    assert_eq!(detail["status"], "completed");
    assert_eq!(detail["helperCount"], 0);

    let (status, body) = send(
        &app,
        post(&format!("{}/offer-help", uri), &helper.token, json!({})).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "This request is completed");
}

#[actix_web::test]
async fn test_delete_help_request_removes_helpers() {
    let ctx = TestContext::new().await;
    let app = test::init_service(common::build_app(ctx.state.clone())).await;
    let requestor = ctx.create_user().await;
    let helper = ctx.create_user().await;

    let (_, request) = send(
        &app,
        post("/api/help-requests", &requestor.token, help_request_body("Lift")).to_request(),
    )
    .await;
    let uri = format!("/api/help-requests/{}", request["id"].as_str().unwrap());
    send(
        &app,
        post(&format!("{}/offer-help", uri), &helper.token, json!({})).to_request(),
    )
    .await;

    let (status, _) = send(&app, delete(&uri, &helper.token).to_request()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, delete(&uri, &requestor.token).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Help request removed");

    assert_eq!(ctx.count("help_requests").await, 0);
    assert_eq!(ctx.count("help_helpers").await, 0);

    let (status, body) = send(
        &app,
        post(&format!("{}/offer-help", uri), &helper.token, json!({})).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Help request not found");
}

#[actix_web::test]
async fn test_list_filters_and_embeds_helpers() {
    let ctx = TestContext::new().await;
    let app = test::init_service(common::build_app(ctx.state.clone())).await;
    let requestor = ctx.create_user().await;
    let helper = ctx.create_user().await;

    let (_, urgent) = send(
        &app,
        post(
            "/api/help-requests",
            &requestor.token,
            json!({ "title": "Flood", "description": "Sandbags", "urgencyLevel": "urgent" }),
        )
        .to_request(),
    )
    .await;
    send(
        &app,
        post("/api/help-requests", &requestor.token, help_request_body("Garden")).to_request(),
    )
    .await;
    send(
        &app,
        post(
            &format!("/api/help-requests/{}/offer-help", urgent["id"].as_str().unwrap()),
            &helper.token,
            json!({}),
        )
        .to_request(),
    )
    .await;

    let (_, page) = send(&app, get("/api/help-requests?urgencyLevel=urgent", None).to_request()).await;
    assert_eq!(page["pagination"]["total"], 1);
    let item = &page["helpRequests"][0];
    assert_eq!(item["title"], "Flood");
    assert_eq!(item["helperCount"], 1);
    assert_eq!(item["helpers"][0]["id"], helper.id.as_str());
    assert_eq!(item["requestor"]["id"], requestor.id.as_str());
    assert!(item["requestor"].get("email").is_none());

    let (_, page) = send(&app, get("/api/help-requests?status=open", None).to_request()).await;
    assert_eq!(page["pagination"]["total"], 1);
    assert_eq!(page["helpRequests"][0]["title"], "Garden");

    let (status, _) = send(&app, get("/api/help-requests?status=bogus", None).to_request()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
