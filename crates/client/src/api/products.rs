//! Product reads, product writes and product images.

use bazaar_core::{ImageId, Price, Product, ProductId, ProductImage, VendorId};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::json;
use tracing::instrument;

use super::{mutate, read_list, read_one, wire};
use crate::error::Result;
use crate::http::segment;
use crate::query::{Fetched, Mutation, QueryKey};
use crate::state::Bazaar;

/// Body of `POST /products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
}

/// Body of `PUT /products/{id}`. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateProduct {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// An image file to attach to a product.
#[derive(Clone)]
pub struct ImageUpload {
    pub file_name: String,
    /// MIME type, e.g. `image/jpeg`.
    pub content_type: String,
    pub bytes: Vec<u8>,
    /// Display position; the backend appends when absent.
    pub position: Option<i32>,
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .field("position", &self.position)
            .finish()
    }
}

impl ImageUpload {
    fn into_form(self) -> Result<Form> {
        let part = Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.content_type)?;
        let form = Form::new().part("image", part);
        Ok(match self.position {
            Some(position) => form.text("position", position.to_string()),
            None => form,
        })
    }
}

/// Product reads and writes.
pub struct ProductsApi<'a> {
    ctx: &'a Bazaar,
}

impl<'a> ProductsApi<'a> {
    pub(crate) const fn new(ctx: &'a Bazaar) -> Self {
        Self { ctx }
    }

    /// One product. Disabled for a blank id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get(&self, id: &ProductId) -> Result<Fetched<Product>> {
        read_one(
            self.ctx,
            QueryKey::product(id),
            self.ctx.product_catalog(),
            "Failed to fetch product",
            wire::normalize_product_body,
            |_, _| {},
        )
        .await
    }

    /// Products visible to shoppers.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn active(&self) -> Result<Fetched<Vec<Product>>> {
        read_list(
            self.ctx,
            QueryKey::active_products(),
            self.ctx.product_catalog(),
            "Failed to fetch active products",
            wire::normalize_product,
            |c, products| c.set_active_products(products.clone()),
        )
        .await
    }

    /// The signed-in vendor's products.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn mine(&self) -> Result<Fetched<Vec<Product>>> {
        read_list(
            self.ctx,
            QueryKey::my_products(),
            self.ctx.product_catalog(),
            "Failed to fetch your products",
            wire::normalize_product,
            |c, products| c.set_my_products(products.clone()),
        )
        .await
    }

    /// Products priced within the given bounds. Disabled when both are absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn by_price(
        &self,
        min: Option<Price>,
        max: Option<Price>,
    ) -> Result<Fetched<Vec<Product>>> {
        self.filtered(
            QueryKey::products_by_price(min, max),
            "Failed to fetch products by price",
        )
        .await
    }

    /// Search products. Disabled for blank text.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn search(&self, q: &str) -> Result<Fetched<Vec<Product>>> {
        self.filtered(QueryKey::product_search(q), "Failed to search products")
            .await
    }

    /// Every product of vendor `id`. Disabled for a blank id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(vendor_id = %id))]
    pub async fn by_vendor(&self, id: &VendorId) -> Result<Fetched<Vec<Product>>> {
        self.filtered(
            QueryKey::vendor_products(id),
            "Failed to fetch vendor products",
        )
        .await
    }

    /// Active products of vendor `id`. Disabled for a blank id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(vendor_id = %id))]
    pub async fn active_by_vendor(&self, id: &VendorId) -> Result<Fetched<Vec<Product>>> {
        self.filtered(
            QueryKey::vendor_active_products(id),
            "Failed to fetch vendor active products",
        )
        .await
    }

    async fn filtered(&self, key: QueryKey, fallback: &'static str) -> Result<Fetched<Vec<Product>>> {
        read_list(
            self.ctx,
            key,
            self.ctx.product_catalog(),
            fallback,
            wire::normalize_product,
            |c, products| c.set_products(products.clone()),
        )
        .await
    }

    /// Create a product owned by the signed-in vendor.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response holds no product.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create(&self, product: &CreateProduct) -> Result<Product> {
        let http = self.ctx.http();
        mutate(
            self.ctx,
            self.ctx.product_catalog(),
            Mutation::CreateProduct,
            async {
                http.post("products", product)
                    .await
                    .and_then(wire::normalize_product_body)
            },
        )
        .await
    }

    /// Change a product's details.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response holds no product.
    #[instrument(skip(self, update), fields(product_id = %id))]
    pub async fn update(&self, id: &ProductId, update: &UpdateProduct) -> Result<Product> {
        let http = self.ctx.http();
        let path = format!("products/{}", segment(id.as_str()));
        mutate(
            self.ctx,
            self.ctx.product_catalog(),
            Mutation::UpdateProduct(id.clone()),
            async {
                http.put(&path, update)
                    .await
                    .and_then(wire::normalize_product_body)
            },
        )
        .await
    }

    /// List or unlist a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response holds no product.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn set_status(&self, id: &ProductId, is_active: bool) -> Result<Product> {
        let http = self.ctx.http();
        let path = format!("products/{}/status", segment(id.as_str()));
        let body = json!({ "is_active": is_active });
        mutate(
            self.ctx,
            self.ctx.product_catalog(),
            Mutation::SetProductStatus(id.clone()),
            async {
                http.put(&path, &body)
                    .await
                    .and_then(wire::normalize_product_body)
            },
        )
        .await
    }

    /// Delete a product. Returns the backend's success flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: &ProductId) -> Result<bool> {
        let http = self.ctx.http();
        let path = format!("products/{}", segment(id.as_str()));
        mutate(
            self.ctx,
            self.ctx.product_catalog(),
            Mutation::DeleteProduct(id.clone()),
            async { http.delete(&path).await.map(wire::normalize_ack) },
        )
        .await
    }

    /// Upload an image for `product_id` as multipart form data.
    ///
    /// Returns the stored image when the backend echoes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the content type is invalid or the request fails.
    #[instrument(skip(self, upload), fields(product_id = %product_id, file = %upload.file_name))]
    pub async fn upload_image(
        &self,
        product_id: &ProductId,
        upload: ImageUpload,
    ) -> Result<Option<ProductImage>> {
        let http = self.ctx.http();
        let path = format!("products/{}/images", segment(product_id.as_str()));
        mutate(
            self.ctx,
            self.ctx.product_catalog(),
            Mutation::UploadImage(product_id.clone()),
            async {
                let form = upload.into_form()?;
                http.post_multipart(&path, form)
                    .await
                    .map(wire::normalize_image_body)
            },
        )
        .await
    }

    /// Move an image to a new display position.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(image_id = %image_id))]
    pub async fn set_image_position(&self, image_id: &ImageId, position: i32) -> Result<bool> {
        let http = self.ctx.http();
        let path = format!("images/{}/position", segment(image_id.as_str()));
        let body = json!({ "position": position });
        mutate(
            self.ctx,
            self.ctx.product_catalog(),
            Mutation::SetImagePosition(image_id.clone()),
            async { http.put(&path, &body).await.map(wire::normalize_ack) },
        )
        .await
    }

    /// Delete a product image.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(image_id = %image_id))]
    pub async fn delete_image(&self, image_id: &ImageId) -> Result<bool> {
        let http = self.ctx.http();
        let path = format!("images/{}", segment(image_id.as_str()));
        mutate(
            self.ctx,
            self.ctx.product_catalog(),
            Mutation::DeleteImage(image_id.clone()),
            async { http.delete(&path).await.map(wire::normalize_ack) },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_create_body_sends_price_as_number() {
        let body = serde_json::to_value(CreateProduct {
            name: "Widget".into(),
            description: "A widget".into(),
            price: Price::new(Decimal::new(1999, 2)).unwrap_or(Price::ZERO),
        })
        .unwrap_or_default();
        assert_eq!(
            body,
            json!({"name": "Widget", "description": "A widget", "price": 19.99})
        );
    }

    #[test]
    fn test_update_body_skips_unset_fields() {
        let body = serde_json::to_value(UpdateProduct {
            is_active: Some(false),
            ..UpdateProduct::default()
        })
        .unwrap_or_default();
        assert_eq!(body, json!({"is_active": false}));
    }

    #[test]
    fn test_upload_debug_hides_bytes() {
        let upload = ImageUpload {
            file_name: "a.jpg".into(),
            content_type: "image/jpeg".into(),
            bytes: vec![0; 1024],
            position: Some(2),
        };
        let debug = format!("{upload:?}");
        assert!(debug.contains("len: 1024"));
        assert!(upload.into_form().is_ok());
    }
}
