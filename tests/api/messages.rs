use serde_json::json;
use serde_json::Value;

use crate::helpers::error_code;
use crate::helpers::spawn_app;

fn contact_form() -> Value {
    json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": "ada@example.com",
        "subject": "Course question",
        "message": "When does the next cohort start?",
    })
}

#[tokio::test]
async fn submitted_message_is_unread() {
    let app = spawn_app().await;

    let resp = app.post_message(&contact_form()).await;
    assert_eq!(resp.status().as_u16(), 201);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "unread");
    assert_eq!(body["subject"], "Course question");
    assert!(body["id"].is_string());
    assert!(body["created_at"].is_string());
}

#[tokio::test]
async fn missing_fields_are_listed() {
    let app = spawn_app().await;
    let mut form = contact_form();
    form.as_object_mut().unwrap().remove("subject");
    form["message"] = json!("   ");

    let resp = app.post_message(&form).await;
    assert_eq!(resp.status().as_u16(), 400);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert_eq!(body["message"], "Missing required fields: subject, message");
}

#[tokio::test]
async fn invalid_fields_are_rejected() {
    let app = spawn_app().await;

    for (field, value, msg) in [
        ("email", json!("not-an-email"), "invalid email"),
        ("first_name", json!("<script>"), "forbidden characters"),
        ("subject", json!("a".repeat(201)), "subject too long"),
        ("message", json!("a".repeat(2001)), "message too long"),
    ] {
        let mut form = contact_form();
        form[field] = value;
        let resp = app.post_message(&form).await;
        assert_eq!(resp.status().as_u16(), 400, "{msg}");
        assert_eq!(error_code(resp).await, "VALIDATION_ERROR", "{msg}");
    }
}

#[tokio::test]
async fn read_message_moves_between_status_filters() {
    let app = spawn_app().await;
    let message: Value = app
        .post_message(&contact_form())
        .await
        .json()
        .await
        .unwrap();
    let id = message["id"].as_str().unwrap();

    let resp = app
        .admin_patch(&format!("/admin/messages/{id}"), &json!({ "status": "read" }))
        .await;
    assert_eq!(resp.status().as_u16(), 200);

    let contains = |body: Value| {
        body.as_array()
            .unwrap()
            .iter()
            .any(|m| m["id"].as_str() == Some(id))
    };

    let read = app.admin_get("/admin/messages?status=read").await;
    assert!(contains(read.json().await.unwrap()));
    let unread = app.admin_get("/admin/messages?status=unread").await;
    assert!(!contains(unread.json().await.unwrap()));
    let all = app.admin_get("/admin/messages").await;
    assert!(contains(all.json().await.unwrap()));
}

#[tokio::test]
async fn get_and_delete_message() {
    let app = spawn_app().await;
    let message: Value = app
        .post_message(&contact_form())
        .await
        .json()
        .await
        .unwrap();
    let path = format!("/admin/messages/{}", message["id"].as_str().unwrap());

    let fetched: Value = app.admin_get(&path).await.json().await.unwrap();
    assert_eq!(fetched, message);

    assert_eq!(app.admin_delete(&path).await.status().as_u16(), 200);

    let resp = app.admin_get(&path).await;
    assert_eq!(resp.status().as_u16(), 404);
    assert_eq!(error_code(resp).await, "NOT_FOUND");
    assert_eq!(app.admin_delete(&path).await.status().as_u16(), 404);
}

#[tokio::test]
async fn message_admin_endpoints_require_a_token() {
    let app = spawn_app().await;

    let resp = app
        .api_client
        .get(format!("{}/admin/messages", app.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}
