//! Write-path behaviour: mutations invalidate the reads they affect, and
//! only after the backend confirms them.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use bazaar_client::ApiError;
use bazaar_client::api::{CreateProduct, ImageUpload, UpdateProduct};
use bazaar_core::{ImageId, ProductId};
use bazaar_integration_tests::{MockBackend, TestClient, auth_json, product_json};
use serde_json::json;

async fn signed_in(backend: &MockBackend) -> TestClient {
    backend.ok(Method::POST, "/auth/login", auth_json("u1", "Ada", "vendor"));
    let client = backend.client();
    client.login("u1@example.com").await;
    client
}

#[tokio::test]
async fn test_created_product_shows_up_in_my_products() {
    let backend = MockBackend::start().await;
    let client = signed_in(&backend).await;
    let products = client.bazaar.products();

    backend.ok(Method::GET, "/products/my", json!([]));
    assert!(products.mine().await.unwrap().into_option().unwrap().is_empty());

    backend.ok(
        Method::POST,
        "/products",
        json!({ "product": product_json("p9", "Widget", 19.99, true) }),
    );
    backend.ok(
        Method::GET,
        "/products/my",
        json!([product_json("p9", "Widget", 19.99, true)]),
    );

    let created = products
        .create(&CreateProduct {
            name: "Widget".into(),
            description: "A widget".into(),
            price: "19.99".parse().unwrap(),
        })
        .await
        .unwrap();
    assert_eq!(created.id, ProductId::new("p9"));

    let sent = backend.last(&Method::POST, "/products").unwrap();
    assert_eq!(
        sent.json(),
        json!({ "name": "Widget", "description": "A widget", "price": 19.99 })
    );
    assert_eq!(sent.authorization.as_deref(), Some("Bearer token-u1"));

    let mine = products.mine().await.unwrap().into_option().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine.first().map(|p| p.name.as_str()), Some("Widget"));
    assert_eq!(backend.hits(&Method::GET, "/products/my"), 2);
    assert_eq!(client.bazaar.product_catalog().snapshot().my_products, mine);
}

#[tokio::test]
async fn test_deleting_the_only_product_leaves_my_products_empty() {
    let backend = MockBackend::start().await;
    let client = signed_in(&backend).await;
    let products = client.bazaar.products();

    backend.ok(
        Method::GET,
        "/products/my",
        json!([product_json("p1", "Jollof", 1500.0, true)]),
    );
    assert_eq!(products.mine().await.unwrap().into_option().unwrap().len(), 1);

    backend.ok(Method::DELETE, "/products/p1", json!({ "success": true }));
    backend.ok(Method::GET, "/products/my", json!([]));

    assert!(products.delete(&ProductId::new("p1")).await.unwrap());
    assert!(products.mine().await.unwrap().into_option().unwrap().is_empty());
    assert!(client.bazaar.product_catalog().snapshot().my_products.is_empty());
}

#[tokio::test]
async fn test_failed_mutation_keeps_cached_reads() {
    let backend = MockBackend::start().await;
    let client = signed_in(&backend).await;
    let products = client.bazaar.products();

    backend.ok(
        Method::GET,
        "/products/my",
        json!([product_json("p1", "Jollof", 1500.0, true)]),
    );
    products.mine().await.unwrap();

    backend.respond(
        Method::PUT,
        "/products/p1",
        StatusCode::UNPROCESSABLE_ENTITY,
        json!({ "message": "Name is required", "code": "validation" }),
    );
    let err = products
        .update(
            &ProductId::new("p1"),
            &UpdateProduct {
                name: Some(String::new()),
                ..UpdateProduct::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Api { ref code, .. } if code.as_deref() == Some("validation")));
    assert_eq!(
        client.bazaar.product_catalog().snapshot().error.as_deref(),
        Some("Name is required")
    );

    products.mine().await.unwrap();
    assert_eq!(backend.hits(&Method::GET, "/products/my"), 1);
}

#[tokio::test]
async fn test_status_change_refreshes_active_products() {
    let backend = MockBackend::start().await;
    let client = signed_in(&backend).await;
    let products = client.bazaar.products();

    backend.ok(
        Method::GET,
        "/products/active",
        json!([product_json("p1", "Jollof", 1500.0, true)]),
    );
    products.active().await.unwrap();

    backend.ok(
        Method::PUT,
        "/products/p1/status",
        json!(product_json("p1", "Jollof", 1500.0, false)),
    );
    backend.ok(Method::GET, "/products/active", json!([]));

    let product = products.set_status(&ProductId::new("p1"), false).await.unwrap();
    assert!(!product.is_active);
    assert_eq!(
        backend.last(&Method::PUT, "/products/p1/status").unwrap().json(),
        json!({ "is_active": false })
    );

    assert!(products.active().await.unwrap().into_option().unwrap().is_empty());
    assert_eq!(backend.hits(&Method::GET, "/products/active"), 2);
}

#[tokio::test]
async fn test_image_upload_is_sent_as_multipart() {
    let backend = MockBackend::start().await;
    let client = signed_in(&backend).await;
    let products = client.bazaar.products();

    backend.ok(
        Method::GET,
        "/products/my",
        json!([product_json("p1", "Jollof", 1500.0, true)]),
    );
    products.mine().await.unwrap();

    backend.ok(
        Method::POST,
        "/products/p1/images",
        json!({ "image": { "id": "img1", "image_url": "https://cdn.example/img1.jpg", "position": 2 } }),
    );
    let image = products
        .upload_image(
            &ProductId::new("p1"),
            ImageUpload {
                file_name: "cover.jpg".into(),
                content_type: "image/jpeg".into(),
                bytes: b"not really a jpeg".to_vec(),
                position: Some(2),
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(image.id, ImageId::new("img1"));
    assert_eq!(image.position, 2);

    let sent = backend.last(&Method::POST, "/products/p1/images").unwrap();
    let content_type = sent.content_type.unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    let body = String::from_utf8_lossy(&sent.body);
    assert!(body.contains("name=\"image\"; filename=\"cover.jpg\""));
    assert!(body.contains("not really a jpeg"));
    assert!(body.contains("name=\"position\""));
    assert_eq!(sent.authorization.as_deref(), Some("Bearer token-u1"));

    products.mine().await.unwrap();
    assert_eq!(backend.hits(&Method::GET, "/products/my"), 2);
}

#[tokio::test]
async fn test_image_changes_refresh_product_searches() {
    let backend = MockBackend::start().await;
    let client = signed_in(&backend).await;
    let products = client.bazaar.products();

    backend.ok(
        Method::GET,
        "/products/search",
        json!([product_json("p1", "Jollof", 1500.0, true)]),
    );
    products.search("jollof").await.unwrap();
    products.search("jollof").await.unwrap();
    assert_eq!(backend.hits(&Method::GET, "/products/search"), 1);

    backend.ok(Method::PUT, "/images/img1/position", json!({ "success": true }));
    assert!(products.set_image_position(&ImageId::new("img1"), 0).await.unwrap());
    assert_eq!(
        backend.last(&Method::PUT, "/images/img1/position").unwrap().json(),
        json!({ "position": 0 })
    );
    products.search("jollof").await.unwrap();
    assert_eq!(backend.hits(&Method::GET, "/products/search"), 2);

    backend.ok(Method::DELETE, "/images/img1", json!(null));
    assert!(products.delete_image(&ImageId::new("img1")).await.unwrap());
    products.search("jollof").await.unwrap();
    assert_eq!(backend.hits(&Method::GET, "/products/search"), 3);
}

#[tokio::test]
async fn test_failed_image_delete_keeps_searches_cached() {
    let backend = MockBackend::start().await;
    let client = signed_in(&backend).await;
    let products = client.bazaar.products();

    backend.ok(Method::GET, "/products/search", json!([]));
    products.search("jollof").await.unwrap();

    backend.respond(
        Method::DELETE,
        "/images/img1",
        StatusCode::FORBIDDEN,
        json!({ "error": "Forbidden", "message": "Not your image" }),
    );
    products.delete_image(&ImageId::new("img1")).await.unwrap_err();

    assert_eq!(
        client.bazaar.product_catalog().snapshot().error.as_deref(),
        Some("Not your image")
    );
    products.search("jollof").await.unwrap();
    assert_eq!(backend.hits(&Method::GET, "/products/search"), 1);
}
