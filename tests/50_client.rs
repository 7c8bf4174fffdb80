mod common;

use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode as AxumStatus},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use common::{MockUpstream, TestServer};
use rootly_bff::client::{plants, users, ClientError, ImageSource, RootlyClient, SessionStore};
use rootly_bff::models::{CreatePlantInput, UpdateUserInput, User};
use serde_json::{json, Value};
use tokio::sync::watch;

const TOKEN: &str = "tok-1";
const PNG: [u8; 4] = [0x89, b'P', b'N', b'G'];

#[derive(Clone, Default)]
struct Store {
    plants: Arc<Mutex<Vec<Value>>>,
}

async fn create_plant(State(store): State<Store>, Json(mut plant): Json<Value>) -> Response {
    if plant["name"] == "fail" {
        return (AxumStatus::INTERNAL_SERVER_ERROR, "database unavailable").into_response();
    }
    let mut plants = store.plants.lock().unwrap();
    plant["id"] = json!(plants.len() + 1);
    plants.push(plant.clone());
    (AxumStatus::CREATED, Json(plant)).into_response()
}

async fn user_plants(State(store): State<Store>, Path(user_id): Path<String>) -> Json<Vec<Value>> {
    let plants = store.plants.lock().unwrap();
    Json(plants.iter().filter(|plant| plant["user_id"] == user_id.as_str()).cloned().collect())
}

async fn delete_device(Path(device_id): Path<String>) -> Response {
    match device_id.as_str() {
        "gone" => (AxumStatus::NOT_FOUND, "Device not found").into_response(),
        "boom" => (AxumStatus::INTERNAL_SERVER_ERROR, "exploded").into_response(),
        _ => AxumStatus::NO_CONTENT.into_response(),
    }
}

async fn user_photo(Path(user_id): Path<String>) -> Response {
    if user_id == "7" {
        ([(header::CONTENT_TYPE, "image/png")], PNG.to_vec()).into_response()
    } else {
        (AxumStatus::NOT_FOUND, "No photo").into_response()
    }
}

async fn delete_user_photo(Path(user_id): Path<String>) -> Response {
    if user_id == "7" {
        (AxumStatus::NOT_FOUND, "No photo").into_response()
    } else {
        (AxumStatus::INTERNAL_SERVER_ERROR, "storage offline").into_response()
    }
}

async fn graphql(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .is_some_and(|value| value == format!("Bearer {TOKEN}").as_str());
    if !authorized {
        return (AxumStatus::UNAUTHORIZED, "missing token").into_response();
    }

    let query = body["query"].as_str().unwrap_or_default();
    if query.contains("Broken") {
        return Json(json!({
            "data": null,
            "errors": [{ "message": "unknown metric" }, { "message": "bad controller" }]
        }))
        .into_response();
    }
    Json(json!({ "data": { "getSupportedMetrics": ["temperature", "air_humidity"] } })).into_response()
}

async fn update_user(Path(user_id): Path<String>, Json(changes): Json<Value>) -> Json<Value> {
    let mut user = json!({ "id": user_id, "email": "ana@rootly.dev", "first_name": "Ana" });
    if let (Some(user), Some(changes)) = (user.as_object_mut(), changes.as_object()) {
        user.extend(changes.clone());
    }
    Json(user)
}

fn backend() -> Router {
    Router::new()
        .route(
            "/api/v1/auth/login",
            post(|| async {
                Json(json!({
                    "access_token": TOKEN,
                    "refresh_token": "ref-1",
                    "user": { "id": 7, "email": "ana@rootly.dev", "first_name": "Ana" }
                }))
            }),
        )
        .route("/api/v1/plants", post(create_plant))
        .route("/api/v1/plants/users/:user_id", get(user_plants))
        .route("/api/v1/devices/:device_id", delete(delete_device))
        .route("/api/v1/users/:user_id", put(update_user))
        .route("/api/v1/users/:user_id/photo", get(user_photo).delete(delete_user_photo))
        .route("/api/v1/graphql", post(graphql))
        .with_state(Store::default())
}

async fn client() -> Result<(MockUpstream, TestServer, RootlyClient)> {
    let upstream = MockUpstream::spawn(backend()).await?;
    let server = TestServer::single_upstream(&upstream.base_url).await?;
    let client = RootlyClient::new(&server.base_url, false, SessionStore::in_memory())?;
    Ok((upstream, server, client))
}

fn basil() -> CreatePlantInput {
    CreatePlantInput {
        name: "Basil".into(),
        species: "Ocimum basilicum".into(),
        description: Some("Kitchen window".into()),
        user_id: "7".into(),
        photo_filename: None,
    }
}

#[tokio::test]
async fn created_plant_shows_up_in_user_list() -> Result<()> {
    let (_upstream, _server, client) = client().await?;
    let plants = client.plants();

    assert!(plants.user_plants("7").await?.unwrap_or_default().is_empty());

    let created = plants.create(&basil()).await?;
    assert_eq!(created.id, "1");

    let listed = plants.user_plants("7").await?.unwrap_or_default();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, created.id);
    assert_eq!(listed[0].name, "Basil");
    assert_eq!(listed[0].species, "Ocimum basilicum");
    assert_eq!(listed[0].description.as_deref(), Some("Kitchen window"));
    Ok(())
}

#[tokio::test]
async fn failed_create_rolls_back_placeholder() -> Result<()> {
    let (_upstream, _server, client) = client().await?;
    let plants = client.plants();
    plants.user_plants("7").await?;

    let mut input = basil();
    input.name = "fail".into();
    let err = plants.create(&input).await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));

    let cached = client.cache().get(&plants::keys::user_plants("7")).unwrap();
    assert_eq!(cached, json!([]));
    Ok(())
}

#[tokio::test]
async fn device_delete_tolerates_not_found() -> Result<()> {
    let (upstream, _server, client) = client().await?;
    let devices = client.devices();

    devices.delete("gone").await?;
    devices.delete("42").await?;

    let err = devices.delete("boom").await.unwrap_err();
    assert!(matches!(&err, ClientError::Http { message, .. } if message == "exploded"));
    assert_eq!(upstream.hit_count(), 3);
    Ok(())
}

#[tokio::test]
async fn photo_delete_tolerates_not_found() -> Result<()> {
    let (upstream, _server, client) = client().await?;
    let users = client.users();

    users.delete_photo("7").await?;
    assert_eq!(upstream.hit_count(), 1);

    // retried twice before giving up
    let err = users.delete_photo("9").await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
    assert_eq!(upstream.hit_count(), 4);
    Ok(())
}

#[tokio::test]
async fn login_stores_session_and_authorizes_graphql() -> Result<()> {
    let (upstream, _server, client) = client().await?;
    let mut events = client.session().subscribe();

    let unauthenticated = client
        .graphql()
        .query::<Value>("{ getSupportedMetrics }", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(unauthenticated, ClientError::Unauthenticated));

    let login = client.auth().login("ana@rootly.dev", "secret").await?;
    assert_eq!(login.token, TOKEN);
    assert!(client.session().is_authenticated());
    assert_eq!(client.session().user().map(|user| user.id), Some("7".to_string()));
    assert!(matches!(events.recv().await?, rootly_bff::client::AuthChange::SignedIn(user) if user.id == "7"));

    let metrics = client.analytics().supported_metrics().await?.unwrap_or_default();
    assert_eq!(metrics, vec!["temperature", "air_humidity"]);

    let last = upstream.hits().pop().unwrap();
    assert_eq!(last.path, "/api/v1/graphql");
    assert_eq!(last.authorization.as_deref(), Some("Bearer tok-1"));
    Ok(())
}

#[tokio::test]
async fn graphql_errors_are_joined() -> Result<()> {
    let (_upstream, _server, client) = client().await?;
    client.auth().login("ana@rootly.dev", "secret").await?;

    let err = client
        .graphql()
        .query::<Value>("query Broken { nothing }", json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "GraphQL errors: unknown metric, bad controller");
    Ok(())
}

#[tokio::test]
async fn image_loader_hands_out_object_urls() -> Result<()> {
    let (upstream, _server, client) = client().await?;
    let images = client.images();

    let source = images.load("/api/users/7/photo", Some("/placeholder.png")).await;
    let ImageSource::Object(url) = &source else {
        panic!("expected an object URL, got {source:?}");
    };
    assert!(url.as_str().starts_with("blob:rootly/"));
    let blob = url.blob().unwrap();
    assert_eq!(blob.bytes, PNG.to_vec());
    assert_eq!(blob.content_type, "image/png");
    assert!(upstream.hits()[0].query.as_deref().is_some_and(|q| q.starts_with("_t=")));

    drop(source);
    assert!(images.registry().is_empty());

    let missing = images.load("/api/users/8/photo", Some("/placeholder.png")).await;
    assert_eq!(missing.src(), Some("/placeholder.png"));
    let missing = images.load("/api/users/8/photo", None).await;
    assert!(matches!(missing, ImageSource::Unavailable));
    Ok(())
}

#[tokio::test]
async fn image_loader_waits_for_visibility() -> Result<()> {
    let (upstream, _server, client) = client().await?;
    let images = client.images();

    let (visible, receiver) = watch::channel(false);
    let load = tokio::spawn({
        let images = images.clone();
        async move { images.load_when_visible("/api/users/7/photo", None, receiver).await }
    });

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(upstream.hit_count(), 0);

    visible.send(true)?;
    let source = load.await?.unwrap();
    assert!(matches!(source, ImageSource::Object(_)));
    assert_eq!(upstream.hit_count(), 1);

    let (hidden, receiver) = watch::channel(false);
    drop(hidden);
    assert!(images.load_when_visible("/api/users/7/photo", None, receiver).await.is_none());
    Ok(())
}

#[tokio::test]
async fn profile_update_survives_unwritable_session_file() -> Result<()> {
    let upstream = MockUpstream::spawn(backend()).await?;
    let server = TestServer::single_upstream(&upstream.base_url).await?;

    // The session file's parent is a regular file, so every write fails.
    let blocker = std::env::temp_dir().join(format!("rootly-session-{}", uuid::Uuid::new_v4()));
    std::fs::write(&blocker, b"")?;
    let session = SessionStore::load(blocker.join("session.json"));
    let ana: User = serde_json::from_value(json!({ "id": 7, "email": "ana@rootly.dev", "first_name": "Ana" }))?;
    assert!(session.sign_in(TOKEN.into(), None, ana).is_err());

    let client = RootlyClient::new(&server.base_url, false, session)?;
    client.cache().set(users::keys::detail("7"), json!({ "id": "7" }));

    let changes = UpdateUserInput {
        first_name: Some("Anabel".into()),
        ..Default::default()
    };
    let updated = client.users().update("7", &changes).await?;
    std::fs::remove_file(&blocker)?;

    assert_eq!(updated.first_name.as_deref(), Some("Anabel"));
    assert_eq!(client.session().user().and_then(|user| user.first_name).as_deref(), Some("Anabel"));
    assert!(client.cache().is_invalidated(&users::keys::detail("7")));
    Ok(())
}
