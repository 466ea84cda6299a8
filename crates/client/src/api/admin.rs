//! Admin vendor approval console.

use bazaar_core::{Vendor, VendorId};
use tracing::{info, instrument};

use super::wire::{self, ApprovalOutcome};
use super::{mutate, read_list};
use crate::error::Result;
use crate::http::segment;
use crate::query::{Fetched, Mutation, QueryKey};
use crate::state::Bazaar;

/// Vendor queues and approval.
pub struct AdminApi<'a> {
    ctx: &'a Bazaar,
}

impl<'a> AdminApi<'a> {
    pub(crate) const fn new(ctx: &'a Bazaar) -> Self {
        Self { ctx }
    }

    /// Vendors awaiting approval.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn pending_vendors(&self) -> Result<Fetched<Vec<Vendor>>> {
        read_list(
            self.ctx,
            QueryKey::pending_vendors(),
            self.ctx.vendor_admin(),
            "Failed to fetch pending vendors",
            wire::normalize_vendor,
            |a, vendors| a.set_pending_vendors(vendors.clone()),
        )
        .await
    }

    /// Vendors already approved.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn approved_vendors(&self) -> Result<Fetched<Vec<Vendor>>> {
        read_list(
            self.ctx,
            QueryKey::approved_vendors(),
            self.ctx.vendor_admin(),
            "Failed to fetch approved vendors",
            wire::normalize_vendor,
            |a, vendors| a.set_approved_vendors(vendors.clone()),
        )
        .await
    }

    /// Approve vendor `id`.
    ///
    /// On success both vendor queues are invalidated and the console state
    /// moves the vendor from pending to approved right away.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(vendor_id = %id))]
    pub async fn approve(&self, id: &VendorId) -> Result<ApprovalOutcome> {
        let admin = self.ctx.vendor_admin();
        let _approving = admin.begin_approving();
        let http = self.ctx.http();
        let path = format!("admin/vendors/{}/approve", segment(id.as_str()));

        let outcome = mutate(
            self.ctx,
            admin,
            Mutation::ApproveVendor(id.clone()),
            async { http.post_empty(&path).await.map(wire::normalize_approval) },
        )
        .await?;

        let approved = admin
            .snapshot()
            .pending_vendors
            .into_iter()
            .find(|v| &v.id == id)
            .map(|v| Vendor {
                is_active: true,
                ..v
            });
        admin.remove_from_pending(id);
        if let Some(vendor) = outcome.vendor.clone().or(approved) {
            admin.add_to_approved(vendor);
        }
        info!(message = outcome.message.as_deref().unwrap_or_default(), "Vendor approved");
        Ok(outcome)
    }
}
