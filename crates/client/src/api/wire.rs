//! Raw backend payloads and their mapping into domain types.
//!
//! The backend spells the same field several ways depending on the
//! endpoint. Each raw struct lists every known spelling as its own field and
//! one `normalize_*` function coalesces them, so a payload carrying two
//! spellings at once still decodes.

use bazaar_core::{
    ImageId, Price, Product, ProductId, ProductImage, Role, Store, StoreId, StorefrontPage,
    UserId, UserProfile, Vendor, VendorId,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use secrecy::SecretString;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::{ApiError, Result};

/// Wrapper fields a list may arrive under.
const LIST_FIELDS: [&str; 5] = ["data", "items", "products", "stores", "vendors"];

/// An identifier sent as either a string or a number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(serde_json::Number),
}

impl WireId {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) => n.to_string(),
        }
    }
}

fn decode<T: DeserializeOwned>(what: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(format!("{what}: {e}")))
}

/// First candidate that is present and not blank.
fn first_text<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
}

fn first_id<const N: usize>(candidates: [Option<WireId>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(WireId::into_string)
        .find(|s| !s.is_empty())
}

fn required_id<const N: usize>(what: &str, candidates: [Option<WireId>; N]) -> Result<String> {
    first_id(candidates).ok_or_else(|| ApiError::Decode(format!("{what}: missing id")))
}

/// Parse a backend timestamp. RFC 3339 first, then naive forms read as UTC.
fn parse_timestamp(raw: Option<String>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

// =============================================================================
// Lists
// =============================================================================

/// Pull the element array out of a list body.
///
/// Accepts a bare array or an object holding it under one of
/// [`LIST_FIELDS`]. Anything else is an empty list.
fn list_items(what: &str, body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        Value::Object(mut map) => {
            let found = LIST_FIELDS.iter().find_map(|field| match map.remove(*field) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            });
            found.unwrap_or_else(|| {
                warn!(what, "List response has no recognised array field");
                Vec::new()
            })
        }
        other => {
            warn!(what, kind = json_kind(&other), "List response is not an array");
            Vec::new()
        }
    }
}

/// Normalize a list body, skipping elements that fail to decode.
pub(crate) fn normalize_list<T>(
    what: &str,
    body: Value,
    normalize: impl Fn(Value) -> Result<T>,
) -> Vec<T> {
    list_items(what, body)
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match normalize(item) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(what, index, error = %e, "Skipping malformed list element");
                None
            }
        })
        .collect()
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct RawUser {
    id: Option<WireId>,
    name: Option<String>,
    email: Option<String>,
    emai: Option<String>,
    #[serde(rename = "whatsappNumber")]
    whatsapp_number_camel: Option<String>,
    whatsapp_number: Option<String>,
    whatsapp: Option<String>,
    #[serde(rename = "storeName")]
    store_name_camel: Option<String>,
    store_name: Option<String>,
    storename: Option<String>,
    #[serde(rename = "storeSlug")]
    store_slug_camel: Option<String>,
    store_slug: Option<String>,
    slugname: Option<String>,
    slug: Option<String>,
    role: Option<String>,
    bio: Option<String>,
}

/// Map any known user shape onto [`UserProfile`].
///
/// # Errors
///
/// Returns [`ApiError::Decode`] when the body is not an object or has no id.
pub(crate) fn normalize_user(value: Value) -> Result<UserProfile> {
    let raw: RawUser = decode("user", value)?;
    let whatsapp = [
        raw.whatsapp_number_camel,
        raw.whatsapp_number,
        raw.whatsapp,
    ]
    .into_iter()
    .flatten()
    .map(|s| s.trim().to_string())
    .find(|s| !s.is_empty());

    Ok(UserProfile {
        id: UserId::new(required_id("user", [raw.id])?),
        name: raw.name.unwrap_or_default(),
        email: first_text([raw.email, raw.emai]),
        role: Role::from_wire(raw.role.as_deref()),
        store_name: first_text([raw.store_name_camel, raw.store_name, raw.storename]),
        store_slug: first_text([
            raw.store_slug_camel,
            raw.store_slug,
            raw.slugname,
            raw.slug,
        ]),
        whatsapp_number: whatsapp,
        bio: first_text([raw.bio]),
    })
}

#[derive(Debug, Deserialize)]
struct RawAuth {
    token: Option<String>,
    #[serde(default)]
    user: Value,
}

/// Split an auth response into the bearer token and the normalized profile.
///
/// # Errors
///
/// Returns [`ApiError::Decode`] when the token or a usable user is missing.
pub(crate) fn normalize_auth(body: Value) -> Result<(SecretString, UserProfile)> {
    let raw: RawAuth = decode("auth response", body)?;
    let token = raw
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::Decode("auth response: missing token".to_string()))?;
    let user = normalize_user(raw.user)?;
    Ok((SecretString::from(token), user))
}

// =============================================================================
// Vendors
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawVendor {
    id: Option<WireId>,
    name: Option<String>,
    email: Option<String>,
    whatsapp_number: Option<String>,
    #[serde(rename = "whatsappNumber")]
    whatsapp_number_camel: Option<String>,
    username: Option<String>,
    bio: Option<String>,
    store_name: Option<String>,
    #[serde(rename = "storeName")]
    store_name_camel: Option<String>,
    store_slug: Option<String>,
    #[serde(rename = "storeSlug")]
    store_slug_camel: Option<String>,
    role: Option<String>,
    is_active: Option<bool>,
    #[serde(rename = "isActive")]
    is_active_camel: Option<bool>,
    created_at: Option<String>,
    #[serde(rename = "createdAt")]
    created_at_camel: Option<String>,
}

pub(crate) fn normalize_vendor(value: Value) -> Result<Vendor> {
    let raw: RawVendor = decode("vendor", value)?;
    Ok(Vendor {
        id: VendorId::new(required_id("vendor", [raw.id])?),
        name: raw.name.unwrap_or_default(),
        email: raw.email.unwrap_or_default(),
        whatsapp_number: first_text([raw.whatsapp_number, raw.whatsapp_number_camel])
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
        username: raw.username.unwrap_or_default(),
        bio: raw.bio.unwrap_or_default(),
        store_name: first_text([raw.store_name, raw.store_name_camel]).unwrap_or_default(),
        store_slug: first_text([raw.store_slug, raw.store_slug_camel]).unwrap_or_default(),
        role: Role::from_wire(raw.role.as_deref()),
        is_active: raw.is_active.or(raw.is_active_camel).unwrap_or(false),
        created_at: parse_timestamp(first_text([raw.created_at, raw.created_at_camel])),
    })
}

/// Body of `POST /admin/vendors/{id}/approve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalOutcome {
    pub success: bool,
    pub message: Option<String>,
    /// The vendor as it now stands, when the backend includes it.
    pub vendor: Option<Vendor>,
}

#[derive(Debug, Default, Deserialize)]
struct RawApproval {
    success: Option<bool>,
    message: Option<String>,
    vendor: Option<Value>,
}

pub(crate) fn normalize_approval(body: Value) -> ApprovalOutcome {
    let raw: RawApproval = if body.is_null() {
        RawApproval::default()
    } else {
        decode("approval", body).unwrap_or_else(|e: ApiError| {
            warn!(error = %e, "Unreadable approval response");
            RawApproval::default()
        })
    };
    let vendor = raw.vendor.filter(|v| !v.is_null()).and_then(|v| {
        normalize_vendor(v)
            .inspect_err(|e| warn!(error = %e, "Ignoring malformed approved vendor"))
            .ok()
    });
    ApprovalOutcome {
        success: raw.success.unwrap_or(true),
        message: raw.message,
        vendor,
    }
}

// =============================================================================
// Stores
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawStore {
    id: Option<WireId>,
    name: Option<String>,
    slug: Option<String>,
    username: Option<String>,
    bio: Option<String>,
    whatsapp_number: Option<String>,
    #[serde(rename = "whatsappNumber")]
    whatsapp_number_camel: Option<String>,
    email: Option<String>,
    updated_at: Option<String>,
    #[serde(rename = "updatedAt")]
    updated_at_camel: Option<String>,
}

pub(crate) fn normalize_store(value: Value) -> Result<Store> {
    let raw: RawStore = decode("store", value)?;
    Ok(Store {
        id: StoreId::new(required_id("store", [raw.id])?),
        name: raw.name.unwrap_or_default(),
        slug: raw.slug.map(|s| s.trim().to_string()).unwrap_or_default(),
        username: raw.username.unwrap_or_default(),
        bio: raw.bio.unwrap_or_default(),
        whatsapp_number: first_text([raw.whatsapp_number, raw.whatsapp_number_camel])
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
        email: raw.email.unwrap_or_default(),
        updated_at: parse_timestamp(first_text([raw.updated_at, raw.updated_at_camel])),
    })
}

/// A store body that may come wrapped as `{ store, ... }`.
pub(crate) fn normalize_store_body(body: Value) -> Result<Store> {
    match body {
        Value::Object(mut map) if map.get("store").is_some_and(Value::is_object) => {
            normalize_store(map.remove("store").unwrap_or_default())
        }
        other => normalize_store(other),
    }
}

/// Public store page: `{ store, products, store_url }` or a bare store.
pub(crate) fn normalize_storefront_page(body: Value) -> Result<StorefrontPage> {
    match body {
        Value::Object(mut map) if map.get("store").is_some_and(Value::is_object) => {
            let store = normalize_store(map.remove("store").unwrap_or_default())?;
            let products = normalize_list(
                "storefront products",
                map.remove("products").unwrap_or_default(),
                normalize_product,
            );
            let store_url = first_text([
                map.remove("store_url").and_then(|v| v.as_str().map(str::to_string)),
                map.remove("storeUrl").and_then(|v| v.as_str().map(str::to_string)),
            ]);
            Ok(StorefrontPage {
                store,
                products,
                store_url,
            })
        }
        other => Ok(StorefrontPage {
            store: normalize_store(other)?,
            products: Vec::new(),
            store_url: None,
        }),
    }
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawImage {
    id: Option<WireId>,
    #[serde(rename = "imageUrl")]
    image_url_camel: Option<String>,
    image_url: Option<String>,
    #[serde(rename = "imageURL")]
    image_url_upper: Option<String>,
    position: Option<i32>,
}

pub(crate) fn normalize_image(value: Value) -> Result<ProductImage> {
    let raw: RawImage = decode("image", value)?;
    Ok(ProductImage {
        id: ImageId::new(required_id("image", [raw.id])?),
        image_url: first_text([raw.image_url_camel, raw.image_url, raw.image_url_upper])
            .unwrap_or_default(),
        position: raw.position.unwrap_or(0),
    })
}

/// An upload response: the image itself or `{ image: {...} }`.
pub(crate) fn normalize_image_body(body: Value) -> Option<ProductImage> {
    let value = match body {
        Value::Object(mut map) if map.get("image").is_some_and(Value::is_object) => {
            map.remove("image").unwrap_or_default()
        }
        Value::Null => return None,
        other => other,
    };
    normalize_image(value)
        .inspect_err(|e| warn!(error = %e, "Upload response carries no readable image"))
        .ok()
}

#[derive(Debug, Deserialize)]
struct RawProduct {
    id: Option<WireId>,
    user_id: Option<WireId>,
    #[serde(rename = "userId")]
    user_id_camel: Option<WireId>,
    owner_id: Option<WireId>,
    name: Option<String>,
    description: Option<String>,
    price: Option<Price>,
    is_active: Option<bool>,
    #[serde(rename = "isActive")]
    is_active_camel: Option<bool>,
    images: Option<Vec<Value>>,
    created_at: Option<String>,
    #[serde(rename = "createdAt")]
    created_at_camel: Option<String>,
    updated_at: Option<String>,
    #[serde(rename = "updatedAt")]
    updated_at_camel: Option<String>,
}

/// Map a product body onto [`Product`].
///
/// # Errors
///
/// Returns [`ApiError::Decode`] for a missing id or a negative or
/// unparseable price.
pub(crate) fn normalize_product(value: Value) -> Result<Product> {
    let raw: RawProduct = decode("product", value)?;
    let images = raw
        .images
        .map(|items| normalize_list("product images", Value::Array(items), normalize_image))
        .unwrap_or_default();

    Ok(Product {
        id: ProductId::new(required_id("product", [raw.id])?),
        owner_user_id: UserId::new(
            first_id([raw.user_id, raw.user_id_camel, raw.owner_id]).unwrap_or_default(),
        ),
        name: raw.name.unwrap_or_default(),
        description: raw.description.unwrap_or_default(),
        price: raw.price.unwrap_or(Price::ZERO),
        is_active: raw.is_active.or(raw.is_active_camel).unwrap_or(false),
        images,
        created_at: parse_timestamp(first_text([raw.created_at, raw.created_at_camel])),
        updated_at: parse_timestamp(first_text([raw.updated_at, raw.updated_at_camel])),
    })
}

/// A product body that may come wrapped as `{ product: {...} }`.
pub(crate) fn normalize_product_body(body: Value) -> Result<Product> {
    match body {
        Value::Object(mut map) if map.get("product").is_some_and(Value::is_object) => {
            normalize_product(map.remove("product").unwrap_or_default())
        }
        other => normalize_product(other),
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawAck {
    success: Option<bool>,
}

/// Whether a `{ success }` acknowledgement reports success. A missing or
/// empty body counts as success since the status code already did.
pub(crate) fn normalize_ack(body: Value) -> bool {
    if body.is_null() {
        return true;
    }
    serde_json::from_value::<RawAck>(body)
        .ok()
        .and_then(|ack| ack.success)
        .unwrap_or(true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use secrecy::ExposeSecret;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_user_snake_case_variant() {
        let user = normalize_user(json!({
            "id": "u1",
            "name": "Ada",
            "email": "ada@example.com",
            "whatsapp_number": " 2348012345678 ",
            "store_name": "Ada Wares",
            "store_slug": "ada-wares",
            "role": "vendor",
        }))
        .unwrap();
        assert_eq!(user.whatsapp_number.as_deref(), Some("2348012345678"));
        assert_eq!(user.store_name.as_deref(), Some("Ada Wares"));
        assert_eq!(user.store_slug.as_deref(), Some("ada-wares"));
        assert_eq!(user.role, Role::Vendor);
    }

    #[test]
    fn test_user_camel_case_variant() {
        let user = normalize_user(json!({
            "id": 7,
            "name": "Bola",
            "whatsappNumber": "0801",
            "storeName": "Bola Shop",
            "storeSlug": "bola",
            "role": "ADMIN",
        }))
        .unwrap();
        assert_eq!(user.id.as_str(), "7");
        assert_eq!(user.whatsapp_number.as_deref(), Some("0801"));
        assert_eq!(user.store_slug.as_deref(), Some("bola"));
        assert!(user.is_admin());
    }

    #[test]
    fn test_user_legacy_variant() {
        let user = normalize_user(json!({
            "id": "u2",
            "name": "Chi",
            "emai": "chi@example.com",
            "whatsapp": "0802",
            "storename": "Chi Store",
            "slugname": "chi-store",
        }))
        .unwrap();
        assert_eq!(user.email.as_deref(), Some("chi@example.com"));
        assert_eq!(user.whatsapp_number.as_deref(), Some("0802"));
        assert_eq!(user.store_name.as_deref(), Some("Chi Store"));
        assert_eq!(user.store_slug.as_deref(), Some("chi-store"));
        assert_eq!(user.role, Role::Vendor);
    }

    #[test]
    fn test_user_both_spellings_present() {
        let user = normalize_user(json!({
            "id": "u3",
            "name": "Dayo",
            "whatsappNumber": "   ",
            "whatsapp_number": "0803",
            "slug": "dayo",
        }))
        .unwrap();
        assert_eq!(user.whatsapp_number.as_deref(), Some("0803"));
        assert_eq!(user.store_slug.as_deref(), Some("dayo"));
    }

    #[test]
    fn test_user_without_id_is_rejected() {
        assert!(normalize_user(json!({"name": "x"})).is_err());
    }

    #[test]
    fn test_auth_response() {
        let (token, user) = normalize_auth(json!({
            "token": "abc",
            "user": {"id": "u1", "name": "Ada"},
        }))
        .unwrap();
        assert_eq!(token.expose_secret(), "abc");
        assert_eq!(user.id.as_str(), "u1");
        assert!(normalize_auth(json!({"user": {"id": "u1"}})).is_err());
    }

    #[test]
    fn test_product_variants() {
        let snake = normalize_product(json!({
            "id": "p1",
            "user_id": "u1",
            "name": "Widget",
            "description": "A widget",
            "price": 19.99,
            "is_active": true,
            "created_at": "2024-05-01T10:00:00Z",
        }))
        .unwrap();
        let camel = normalize_product(json!({
            "id": "p1",
            "userId": "u1",
            "name": "Widget",
            "description": "A widget",
            "price": "19.99",
            "isActive": true,
            "createdAt": "2024-05-01T10:00:00Z",
        }))
        .unwrap();
        assert_eq!(snake, camel);
        assert_eq!(snake.price.amount(), Decimal::new(1999, 2));
        assert!(snake.created_at.is_some());
    }

    #[test]
    fn test_product_owner_id_variant_and_images() {
        let product = normalize_product(json!({
            "id": 12,
            "owner_id": 3,
            "name": "Bag",
            "price": 0,
            "images": [
                {"id": "i2", "image_url": "https://cdn/b.jpg", "position": 1},
                {"id": "i1", "imageUrl": "https://cdn/a.jpg"},
                {"id": "i3", "imageURL": "https://cdn/c.jpg", "position": 1},
                {"imageUrl": "https://cdn/no-id.jpg"},
            ],
        }))
        .unwrap();
        assert_eq!(product.owner_user_id.as_str(), "3");
        assert_eq!(product.images.len(), 3);
        let ordered: Vec<_> = product.images_in_order().iter().map(|i| i.id.to_string()).collect();
        assert_eq!(ordered, ["i1", "i2", "i3"]);
    }

    #[test]
    fn test_negative_price_element_is_skipped() {
        let products = normalize_list(
            "products",
            json!([
                {"id": "p1", "name": "ok", "price": 5},
                {"id": "p2", "name": "bad", "price": -5},
            ]),
            normalize_product,
        );
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id.as_str(), "p1");
    }

    #[test]
    fn test_list_shapes() {
        let bare = json!([{"id": "s1", "name": "A", "slug": "a"}]);
        for body in [
            bare.clone(),
            json!({"data": bare.clone()}),
            json!({"items": bare.clone()}),
            json!({"stores": bare.clone()}),
        ] {
            assert_eq!(normalize_list("stores", body, normalize_store).len(), 1);
        }
        for body in [Value::Null, json!({"message": "ok"}), json!("nope"), json!(3)] {
            assert!(normalize_list("stores", body, normalize_store).is_empty());
        }
    }

    #[test]
    fn test_bare_array_and_store_wrapper_give_same_products() {
        let products = json!([
            {"id": "p1", "user_id": "u1", "name": "Widget", "price": 19.99, "is_active": true},
            {"id": "p2", "user_id": "u1", "name": "Gadget", "price": "5", "is_active": false},
        ]);
        let wrapped = json!({
            "store": {"id": "s1", "name": "Shop", "slug": "shop"},
            "products": products.clone(),
        });
        assert_eq!(
            normalize_list("products", products, normalize_product),
            normalize_list("products", wrapped, normalize_product)
        );
    }

    #[test]
    fn test_storefront_page_shapes() {
        let page = normalize_storefront_page(json!({
            "store": {"id": "s1", "name": "Shop", "slug": "shop", "whatsappNumber": "0801"},
            "products": [{"id": "p1", "name": "Widget", "price": 1}],
            "store_url": "https://bazaar.example/store/shop",
        }))
        .unwrap();
        assert_eq!(page.store.whatsapp_number, "0801");
        assert_eq!(page.products.len(), 1);
        assert!(page.store_url.is_some());

        let bare = normalize_storefront_page(json!({"id": "s1", "name": "Shop", "slug": "shop"}))
            .unwrap();
        assert_eq!(bare.store.slug, "shop");
        assert!(bare.products.is_empty());
    }

    #[test]
    fn test_store_body_unwraps() {
        let store = normalize_store_body(json!({
            "store": {"id": "s1", "name": "Shop", "slug": "shop", "updatedAt": "2024-01-02 03:04:05"},
            "products": [],
        }))
        .unwrap();
        assert_eq!(store.id.as_str(), "s1");
        assert!(store.updated_at.is_some());
    }

    #[test]
    fn test_vendor_variants() {
        let vendor = normalize_vendor(json!({
            "id": "v123",
            "name": "Eze",
            "email": "eze@example.com",
            "whatsappNumber": "0804",
            "storeSlug": "eze",
            "isActive": true,
            "created_at": "not a date",
        }))
        .unwrap();
        assert_eq!(vendor.whatsapp_number, "0804");
        assert_eq!(vendor.store_slug, "eze");
        assert!(vendor.is_active);
        assert!(vendor.created_at.is_none());
    }

    #[test]
    fn test_approval_and_ack() {
        let outcome = normalize_approval(json!({
            "success": true,
            "message": "Vendor approved",
            "vendor": {"id": "v123", "name": "Eze", "is_active": true},
        }));
        assert!(outcome.success);
        assert_eq!(outcome.vendor.unwrap().id.as_str(), "v123");
        assert!(normalize_approval(Value::Null).vendor.is_none());

        assert!(normalize_ack(json!({"success": true})));
        assert!(!normalize_ack(json!({"success": false})));
        assert!(normalize_ack(Value::Null));
    }

    #[test]
    fn test_image_body() {
        let image = normalize_image_body(json!({"image": {"id": 5, "image_url": "u", "position": 2}}))
            .unwrap();
        assert_eq!(image.position, 2);
        assert!(normalize_image_body(json!({"success": true})).is_none());
    }
}
