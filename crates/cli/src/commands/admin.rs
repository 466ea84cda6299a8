//! Vendor approval commands. The backend rejects non-admin sessions.

use bazaar_client::Bazaar;
use bazaar_core::VendorId;

use super::{CommandError, print_line, print_vendors, ready};

type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub async fn pending(bazaar: &Bazaar) -> CommandResult {
    let vendors = ready(bazaar.admin().pending_vendors().await?, "pending vendors")?;
    print_vendors(&vendors);
    Ok(())
}

pub async fn approved(bazaar: &Bazaar) -> CommandResult {
    let vendors = ready(bazaar.admin().approved_vendors().await?, "approved vendors")?;
    print_vendors(&vendors);
    Ok(())
}

pub async fn approve(bazaar: &Bazaar, id: &str) -> CommandResult {
    if id.trim().is_empty() {
        return Err(CommandError::EmptyInput("vendor id").into());
    }
    let outcome = bazaar.admin().approve(&VendorId::new(id.trim())).await?;
    let message = outcome.message.as_deref().unwrap_or("Vendor approved");
    print_line(&format!("{message} ({id})"));
    let remaining = bazaar.vendor_admin().snapshot().pending_vendors.len();
    print_line(&format!("{remaining} vendor(s) still pending"));
    Ok(())
}
