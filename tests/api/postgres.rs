//! The same API, backed by Postgres. Each test gets its own database, so
//! these need a running instance (see `configuration/base.yaml`).

use fake::faker::internet::en::SafeEmail;
use fake::Fake;
use serde_json::json;
use serde_json::Value;

use crate::helpers::error_code;
use crate::helpers::spawn_pg_app;

fn email() -> String { SafeEmail().fake() }

fn contact_form() -> Value {
    json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": "ada@example.com",
        "subject": "Course question",
        "message": "When does the next cohort start?",
    })
}

fn ids(body: Value) -> Vec<String> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = spawn_pg_app().await;
    let email = email();

    assert_eq!(app.subscribe(&email).await.status().as_u16(), 201);

    let resp = app.subscribe(&email).await;
    assert_eq!(resp.status().as_u16(), 409);
    assert_eq!(error_code(resp).await, "DUPLICATE_ENTRY");

    let resp = app
        .admin_post("/admin/subscribers", &json!({ "email": email }))
        .await;
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn subscribers_are_filtered_by_status() {
    let app = spawn_pg_app().await;
    let first = app.create_subscriber(&email(), "active").await;
    let second = app.create_subscriber(&email(), "inactive").await;

    let all = app.admin_get("/admin/subscribers").await.json().await.unwrap();
    assert_eq!(ids(all), vec![first.clone(), second.clone()]);

    let resp = app
        .admin_patch(
            &format!("/admin/subscribers/{first}"),
            &json!({ "status": "inactive" }),
        )
        .await;
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["id"], first.as_str());
    assert_eq!(body["status"], "inactive");

    let active = app
        .admin_get("/admin/subscribers?status=active")
        .await
        .json()
        .await
        .unwrap();
    assert!(ids(active).is_empty());

    let inactive = app
        .admin_get("/admin/subscribers?status=inactive")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(ids(inactive), vec![first, second]);
}

#[tokio::test]
async fn messages_are_filtered_by_status() {
    let app = spawn_pg_app().await;
    let mut created = vec![];
    for _ in 0..2 {
        let message: Value = app
            .post_message(&contact_form())
            .await
            .json()
            .await
            .unwrap();
        created.push(message["id"].as_str().unwrap().to_string());
    }

    let resp = app
        .admin_patch(
            &format!("/admin/messages/{}", created[0]),
            &json!({ "status": "read" }),
        )
        .await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "read");

    let read = app.admin_get("/admin/messages?status=read").await;
    assert_eq!(ids(read.json().await.unwrap()), vec![created[0].clone()]);
    let unread = app.admin_get("/admin/messages?status=unread").await;
    assert_eq!(ids(unread.json().await.unwrap()), vec![created[1].clone()]);
    let all = app.admin_get("/admin/messages").await;
    assert_eq!(ids(all.json().await.unwrap()), created);
}

#[tokio::test]
async fn unknown_records_are_not_found() {
    let app = spawn_pg_app().await;
    let id = uuid::Uuid::new_v4();

    for path in [
        format!("/admin/subscribers/{id}"),
        format!("/admin/messages/{id}"),
    ] {
        let resp = app.admin_get(&path).await;
        assert_eq!(resp.status().as_u16(), 404, "GET {path}");
        assert_eq!(error_code(resp).await, "NOT_FOUND");

        let resp = app.admin_patch(&path, &json!({ "status": "read" })).await;
        // subscribers have no "read" status, which is checked before the lookup
        let expected = if path.contains("messages") { 404 } else { 400 };
        assert_eq!(resp.status().as_u16(), expected, "PATCH {path}");

        let resp = app.admin_delete(&path).await;
        assert_eq!(resp.status().as_u16(), 404, "DELETE {path}");
    }

    let resp = app
        .admin_patch(
            &format!("/admin/subscribers/{id}"),
            &json!({ "status": "active" }),
        )
        .await;
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn deleted_records_are_gone() {
    let app = spawn_pg_app().await;
    let subscriber = app.create_subscriber(&email(), "active").await;
    let message: Value = app
        .post_message(&contact_form())
        .await
        .json()
        .await
        .unwrap();

    for path in [
        format!("/admin/subscribers/{subscriber}"),
        format!("/admin/messages/{}", message["id"].as_str().unwrap()),
    ] {
        assert_eq!(app.admin_delete(&path).await.status().as_u16(), 200);
        assert_eq!(app.admin_get(&path).await.status().as_u16(), 404);
        assert_eq!(app.admin_delete(&path).await.status().as_u16(), 404);
    }
}

#[tokio::test]
async fn stats_and_newsletters() {
    let app = spawn_pg_app().await;
    app.create_subscriber(&email(), "active").await;
    app.create_subscriber(&email(), "active").await;
    app.create_subscriber(&email(), "inactive").await;
    app.post_message(&contact_form())
        .await
        .error_for_status()
        .unwrap();

    let resp = app
        .admin_post(
            "/admin/newsletter-send",
            &json!({ "topic": "October issue", "body": "News", "recipients": "active" }),
        )
        .await;
    assert_eq!(resp.status().as_u16(), 201);
    let sent: Value = resp.json().await.unwrap();
    assert_eq!(sent["sent_count"], 2);

    let listed: Value = app.admin_get("/admin/newsletters").await.json().await.unwrap();
    // timestamps lose precision in the database, so compare the rest
    assert_eq!(ids(listed.clone()), vec![sent["id"].as_str().unwrap().to_string()]);
    assert_eq!(listed[0]["topic"], "October issue");
    assert_eq!(listed[0]["recipients"], "active");
    assert_eq!(listed[0]["sent_count"], 2);

    let stats: Value = app.admin_get("/admin/stats").await.json().await.unwrap();
    assert_eq!(
        stats,
        json!({
            "totalSubscribers": 3,
            "activeSubscribers": 2,
            "totalMessages": 1,
            "unreadMessages": 1,
            "totalSent": 1,
        })
    );
}

#[tokio::test]
async fn fields_at_the_length_limit_are_stored() {
    let app = spawn_pg_app().await;

    // e + combining acute: one grapheme, two code points
    let accented = |n: usize| "e\u{301}".repeat(n);
    let mut form = contact_form();
    form["first_name"] = json!(accented(100));
    form["last_name"] = json!(accented(100));
    form["subject"] = json!(accented(200));
    form["message"] = json!(accented(2000));

    let resp = app.post_message(&form).await;
    assert_eq!(resp.status().as_u16(), 201);
    let created: Value = resp.json().await.unwrap();

    let path = format!("/admin/messages/{}", created["id"].as_str().unwrap());
    let stored: Value = app.admin_get(&path).await.json().await.unwrap();
    assert_eq!(stored["first_name"], accented(100));
    assert_eq!(stored["message"], accented(2000));

    form["subject"] = json!(accented(201));
    let resp = app.post_message(&form).await;
    assert_eq!(resp.status().as_u16(), 400);
    assert_eq!(error_code(resp).await, "VALIDATION_ERROR");
}
