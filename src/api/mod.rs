//! Client side of the booking service
//!
//! This module provides:
//! - The [`BookingApi`] trait the wizard operations talk to
//! - An HTTP implementation backed by reqwest
//! - Loading the Form Content catalog into a wizard

use async_trait::async_trait;
use thiserror::Error;

pub mod error;
pub mod http;

pub use error::ApiError;
pub use http::HttpBookingApi;

use crate::booking::Booking;
use crate::content::FormContent;
use crate::session::{SessionHandle, SessionKind};
use crate::wizard::{Variant, Wizard};

/// Path serving the Form Content catalog of a variant
pub fn form_content_path(variant: Variant) -> &'static str {
    match variant {
        Variant::Attendee => "/api/formcontent",
        Variant::Artist => "/api/artist/formcontent",
    }
}

/// Path accepting finished bookings of a variant
pub fn submit_path(variant: Variant) -> &'static str {
    match variant {
        Variant::Attendee => "/api/submitForm",
        Variant::Artist => "/api/artist/submitForm",
    }
}

/// Operations offered by the booking service
#[async_trait]
pub trait BookingApi: Send + Sync {
    /// Exchange a shared password for an access token
    async fn login(&self, kind: SessionKind, password: &str) -> Result<String, ApiError>;

    async fn fetch_form_content(&self, variant: Variant, token: &str) -> Result<FormContent, ApiError>;

    async fn submit_booking(&self, variant: Variant, token: &str, booking: &Booking) -> Result<(), ApiError>;
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("not logged in")]
    NotAuthenticated,
    #[error("failed to load form content: {0}")]
    Api(#[from] ApiError),
}

/// Fetch the catalog for the wizard's variant and install it.
///
/// Any failure logs the session out, since the wizard cannot be used without
/// a catalog.
pub async fn load_form_content(
    wizard: &mut Wizard,
    session: &SessionHandle,
    api: &dyn BookingApi,
) -> Result<(), ContentError> {
    let variant = wizard.variant();
    let Some(token) = session.token() else {
        return Err(ContentError::NotAuthenticated);
    };

    match api.fetch_form_content(variant, &token).await {
        Ok(content) => {
            tracing::info!(
                variant = %variant,
                tickets = content.ticket_options.len(),
                "Form content loaded"
            );
            wizard.set_form_content(content);
            Ok(())
        }
        Err(e) => {
            tracing::warn!(variant = %variant, error = %e, "Failed to load form content");
            session.invalidate();
            Err(ContentError::Api(e))
        }
    }
}
