use mockito::Matcher;
use serde_json::json;

use crate::{Client, CreateSite, HostingError, RepoSource};

const SITE_JSON: &str = r#"{
    "id": "site-b",
    "name": "site-rotation-1",
    "url": "http://site-rotation-1.netlify.app",
    "ssl_url": "https://site-rotation-1.netlify.app",
    "admin_url": "https://app.netlify.com/sites/site-rotation-1",
    "state": "current"
}"#;

fn client(server: &mockito::Server) -> Client {
    Client::new(server.url(), "tok").unwrap()
}

#[tokio::test]
async fn create_site_sends_bearer_token_and_repo() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/sites")
        .match_header("authorization", "Bearer tok")
        .match_body(Matcher::PartialJson(json!({
            "name": "site-rotation-1",
            "repo": {"provider": "github", "repo": "acme/site", "branch": "main", "dir": "public"},
            "build_settings": {"dir": "public"}
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(SITE_JSON)
        .create_async()
        .await;

    let body = CreateSite::named("site-rotation-1").with_repo(RepoSource {
        provider: "github".into(),
        repo: "acme/site".into(),
        branch: "main".into(),
        dir: Some("public".into()),
    });
    let site = client(&server).create_site(&body).await.unwrap();

    mock.assert_async().await;
    assert_eq!(site.id, "site-b");
    assert_eq!(site.public_url(), "https://site-rotation-1.netlify.app");
}

#[tokio::test]
async fn non_success_status_captures_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/sites")
        .with_status(422)
        .with_body("name already taken")
        .create_async()
        .await;

    let err = client(&server)
        .create_site(&CreateSite::named("dup"))
        .await
        .unwrap_err();

    match err {
        HostingError::Api {
            status,
            endpoint,
            body,
        } => {
            assert_eq!(status, 422);
            assert_eq!(endpoint, "/sites");
            assert_eq!(body, "name already taken");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn delete_site_accepts_empty_204() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("DELETE", "/sites/site-a")
        .match_header("authorization", "Bearer tok")
        .with_status(204)
        .create_async()
        .await;

    client(&server).delete_site("site-a").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn list_deploys_keeps_platform_order() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/sites/site-b/deploys")
        .with_status(200)
        .with_body(r#"[{"id":"d2","state":"building"},{"id":"d1","state":"ready"}]"#)
        .create_async()
        .await;

    let deploys = client(&server).list_deploys("site-b").await.unwrap();
    assert_eq!(deploys.len(), 2);
    assert_eq!(deploys[0].id, "d2");
    assert!(!deploys[0].is_ready());
    assert!(deploys[1].is_ready());
}

#[tokio::test]
async fn trigger_build_posts_clear_cache() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/sites/site-b/builds")
        .match_body(Matcher::Json(json!({"clear_cache": true})))
        .with_status(200)
        .with_body(r#"{"id":"b1","deploy_id":"d1","done":false}"#)
        .create_async()
        .await;

    let build = client(&server).trigger_build("site-b", true).await.unwrap();
    mock.assert_async().await;
    assert_eq!(build.deploy_id.as_deref(), Some("d1"));
}

#[tokio::test]
async fn get_site_not_found_is_flagged() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/sites/gone.netlify.app")
        .with_status(404)
        .with_body("Not Found")
        .create_async()
        .await;

    let err = client(&server).get_site("gone.netlify.app").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/sites")
        .with_status(200)
        .with_body("<html>")
        .create_async()
        .await;

    let err = client(&server).list_sites().await.unwrap_err();
    assert!(matches!(err, HostingError::Decode { .. }));
}

#[test]
fn base_url_trailing_slash_is_trimmed() {
    let c = Client::new("https://api.example.com/v1/", "t").unwrap();
    assert_eq!(c.base(), "https://api.example.com/v1");
}

#[test]
fn site_matches_by_url_or_name() {
    let site: crate::Site = serde_json::from_str(SITE_JSON).unwrap();
    assert!(site.matches("https://site-rotation-1.netlify.app/", None));
    assert!(site.matches("http://site-rotation-1.netlify.app", None));
    assert!(site.matches("https://elsewhere.example", Some("site-rotation-1")));
    assert!(!site.matches("https://elsewhere.example", Some("other")));
}

#[test]
fn public_url_falls_back_to_plain_url() {
    let site = crate::Site {
        id: "x".into(),
        url: "http://x.netlify.app".into(),
        ..Default::default()
    };
    assert_eq!(site.public_url(), "http://x.netlify.app");
}
