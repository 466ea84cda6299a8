//! Product commands.

use std::path::Path;

use bazaar_client::Bazaar;
use bazaar_client::api::{CreateProduct, ImageUpload};
use bazaar_core::{Price, ProductId};

use super::{CommandError, print_line, print_products, ready};

type CommandResult = Result<(), Box<dyn std::error::Error>>;

fn require_session(bazaar: &Bazaar) -> Result<(), CommandError> {
    if bazaar.session().snapshot().is_authenticated() {
        Ok(())
    } else {
        Err(CommandError::NotSignedIn)
    }
}

pub async fn mine(bazaar: &Bazaar) -> CommandResult {
    require_session(bazaar)?;
    let products = ready(bazaar.products().mine().await?, "your products")?;
    print_products(&products);
    Ok(())
}

pub async fn active(bazaar: &Bazaar) -> CommandResult {
    let products = ready(bazaar.products().active().await?, "active products")?;
    print_products(&products);
    Ok(())
}

pub async fn search(bazaar: &Bazaar, query: &str) -> CommandResult {
    let products = ready(bazaar.products().search(query).await?, "search text")?;
    print_products(&products);
    Ok(())
}

pub async fn by_price(bazaar: &Bazaar, min: Option<Price>, max: Option<Price>) -> CommandResult {
    let products = ready(
        bazaar.products().by_price(min, max).await?,
        "price range (pass --min and/or --max)",
    )?;
    print_products(&products);
    Ok(())
}

pub async fn create(bazaar: &Bazaar, name: String, description: String, price: Price) -> CommandResult {
    require_session(bazaar)?;
    let product = bazaar
        .products()
        .create(&CreateProduct {
            name,
            description,
            price,
        })
        .await?;
    print_line(&format!("Created {} ({})", product.name, product.id));
    Ok(())
}

pub async fn set_status(bazaar: &Bazaar, id: &str, active: bool) -> CommandResult {
    require_session(bazaar)?;
    let product = bazaar.products().set_status(&ProductId::new(id), active).await?;
    let state = if product.is_active { "listed" } else { "hidden" };
    print_line(&format!("{} is now {state}", product.name));
    Ok(())
}

pub async fn delete(bazaar: &Bazaar, id: &str) -> CommandResult {
    require_session(bazaar)?;
    if bazaar.products().delete(&ProductId::new(id)).await? {
        print_line(&format!("Deleted {id}"));
    } else {
        tracing::warn!(product_id = id, "Backend reported the delete as unsuccessful");
    }
    Ok(())
}

pub async fn upload(bazaar: &Bazaar, id: &str, file: &Path, position: Option<i32>) -> CommandResult {
    require_session(bazaar)?;
    let bytes = tokio::fs::read(file).await.map_err(|source| CommandError::ReadFile {
        path: file.display().to_string(),
        source,
    })?;
    let upload = ImageUpload {
        file_name: file
            .file_name()
            .map_or_else(|| "image".to_string(), |n| n.to_string_lossy().into_owned()),
        content_type: content_type(file).to_string(),
        bytes,
        position,
    };
    match bazaar.products().upload_image(&ProductId::new(id), upload).await? {
        Some(image) => print_line(&format!("Uploaded {} at position {}", image.image_url, image.position)),
        None => print_line("Uploaded."),
    }
    Ok(())
}

fn content_type(file: &Path) -> &'static str {
    match file
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("jpg" | "jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(content_type(Path::new("a/cover.JPG")), "image/jpeg");
        assert_eq!(content_type(Path::new("b.png")), "image/png");
        assert_eq!(content_type(Path::new("notes")), "application/octet-stream");
    }
}
