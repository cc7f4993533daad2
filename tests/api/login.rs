use serde_json::Value;

use crate::helpers::error_code;
use crate::helpers::spawn_app;

#[tokio::test]
async fn login_returns_a_bearer_token() {
    let app = spawn_app().await;

    let resp = app.login(&app.admin.email, &app.admin.password).await;
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 30 * 60);
    let token = body["token"].as_str().unwrap();

    let resp = app
        .api_client
        .get(format!("{}/admin/stats", app.addr))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn bad_credentials_are_unauthorized() {
    let app = spawn_app().await;

    for (email, password, msg) in [
        (app.admin.email.as_str(), "wrong-password", "wrong password"),
        ("nobody@example.com", app.admin.password.as_str(), "unknown email"),
    ] {
        let resp = app.login(email, password).await;
        assert_eq!(resp.status().as_u16(), 401, "{msg}");
        assert_eq!(resp.headers()["WWW-Authenticate"], "Bearer", "{msg}");
        assert_eq!(error_code(resp).await, "UNAUTHORIZED", "{msg}");
    }
}

#[tokio::test]
async fn missing_or_malformed_authorization_is_unauthorized() {
    let app = spawn_app().await;
    let url = format!("{}/admin/stats", app.addr);

    for (header, msg) in [
        (None, "no header"),
        (Some("Basic YWRtaW46cGFzc3dvcmQ="), "basic auth"),
        (Some("Bearer"), "no token"),
        (Some("Bearer not-a-token"), "garbage token"),
    ] {
        let mut request = app.api_client.get(&url);
        if let Some(header) = header {
            request = request.header("Authorization", header);
        }
        let resp = request.send().await.unwrap();
        assert_eq!(resp.status().as_u16(), 401, "{msg}");
        assert_eq!(resp.headers()["WWW-Authenticate"], "Bearer", "{msg}");
        assert_eq!(error_code(resp).await, "UNAUTHORIZED", "{msg}");
    }
}

#[tokio::test]
async fn tampered_token_is_unauthorized() {
    let app = spawn_app().await;

    // flip the last hex digit of the signature
    let mut token = app.admin_token.clone();
    let last = token.pop().unwrap();
    token.push(if last == '0' { '1' } else { '0' });

    let resp = app
        .api_client
        .get(format!("{}/admin/stats", app.addr))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn expired_token_is_unauthorized() {
    let app = spawn_app().await;
    let url = format!("{}/admin/stats", app.addr);

    let fresh = app.forge_token(chrono::Duration::minutes(5));
    let resp = app.api_client.get(&url).bearer_auth(fresh).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let expired = app.forge_token(chrono::Duration::minutes(-5));
    let resp = app.api_client.get(&url).bearer_auth(expired).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}
