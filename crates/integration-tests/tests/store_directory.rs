//! Store reads by vendor and store settings updates.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use bazaar_client::api::StoreSettingsUpdate;
use bazaar_core::VendorId;
use bazaar_integration_tests::{MockBackend, TestClient, auth_json, store_json};
use serde_json::json;

async fn signed_in(backend: &MockBackend) -> TestClient {
    backend.ok(Method::POST, "/auth/login", auth_json("u1", "Ada", "vendor"));
    let client = backend.client();
    client.login("u1@example.com").await;
    client
}

#[tokio::test]
async fn test_store_by_vendor_accepts_wrapped_and_bare_bodies() {
    let wrapped = MockBackend::start().await;
    wrapped.ok(
        Method::GET,
        "/stores/vendor",
        json!({ "store": store_json("s1", "Mama Put", "mama-put"), "products": [] }),
    );
    let bare = MockBackend::start().await;
    bare.ok(
        Method::GET,
        "/stores/vendor",
        store_json("s1", "Mama Put", "mama-put"),
    );

    let vendor = VendorId::new("v1");
    let from_wrapped = wrapped.client().bazaar.stores().by_vendor(&vendor).await.unwrap();
    let from_bare = bare.client().bazaar.stores().by_vendor(&vendor).await.unwrap();

    assert_eq!(from_wrapped.into_option().unwrap(), from_bare.into_option().unwrap());
    let request = wrapped.last(&Method::GET, "/stores/vendor").unwrap();
    assert_eq!(request.query.as_deref(), Some("id=v1"));
}

#[tokio::test]
async fn test_store_by_blank_vendor_is_disabled() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    let result = client.bazaar.stores().by_vendor(&VendorId::new(" ")).await.unwrap();

    assert!(result.is_disabled());
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_settings_update_refreshes_the_store_page() {
    let backend = MockBackend::start().await;
    let client = signed_in(&backend).await;
    let stores = client.bazaar.stores();

    backend.ok(
        Method::GET,
        "/stores/mama-put",
        json!({ "store": store_json("s1", "Mama Put", "mama-put"), "products": [] }),
    );
    stores.by_slug("mama-put").await.unwrap();
    stores.by_slug("mama-put").await.unwrap();
    assert_eq!(backend.hits(&Method::GET, "/stores/mama-put"), 1);

    let mut renamed = store_json("s1", "Mama Put Kitchen", "mama-put");
    renamed["bio"] = json!("Open daily");
    backend.ok(Method::PUT, "/stores", json!({ "store": renamed.clone() }));
    backend.ok(
        Method::GET,
        "/stores/mama-put",
        json!({ "store": renamed, "products": [] }),
    );

    let store = stores
        .update_settings(&StoreSettingsUpdate {
            name: Some("Mama Put Kitchen".into()),
            bio: Some("Open daily".into()),
            ..StoreSettingsUpdate::default()
        })
        .await
        .unwrap();
    assert_eq!(store.name, "Mama Put Kitchen");
    assert_eq!(
        backend.last(&Method::PUT, "/stores").unwrap().json(),
        json!({ "name": "Mama Put Kitchen", "bio": "Open daily" })
    );

    let page = stores.by_slug("mama-put").await.unwrap().into_option().unwrap();
    assert_eq!(page.store.bio, "Open daily");
    assert_eq!(backend.hits(&Method::GET, "/stores/mama-put"), 2);
}

#[tokio::test]
async fn test_rejected_settings_update_keeps_the_store_page() {
    let backend = MockBackend::start().await;
    let client = signed_in(&backend).await;
    let stores = client.bazaar.stores();

    backend.ok(
        Method::GET,
        "/stores/mama-put",
        json!({ "store": store_json("s1", "Mama Put", "mama-put"), "products": [] }),
    );
    stores.by_slug("mama-put").await.unwrap();

    backend.respond(
        Method::PUT,
        "/stores",
        StatusCode::BAD_REQUEST,
        json!({ "error": "Bad Request", "message": "WhatsApp number is invalid" }),
    );
    stores
        .update_settings(&StoreSettingsUpdate {
            whatsapp_number: Some("123".into()),
            ..StoreSettingsUpdate::default()
        })
        .await
        .unwrap_err();

    assert_eq!(
        client.bazaar.store_directory().snapshot().error.as_deref(),
        Some("WhatsApp number is invalid")
    );
    stores.by_slug("mama-put").await.unwrap();
    assert_eq!(backend.hits(&Method::GET, "/stores/mama-put"), 1);
}
