//! Festival booking - registration wizards for attendees and artists
//!
//! The library holds the booking model, the draft store, validation and
//! pricing rules, the wizard state machine, the session and the client for
//! the booking service. The `festival-booking` binary drives it from the
//! command line.

pub mod api;
pub mod booking;
pub mod config;
pub mod content;
pub mod logging;
pub mod pricing;
pub mod session;
pub mod store;
pub mod submission;
pub mod validation;
pub mod wizard;

pub use api::{BookingApi, HttpBookingApi};
pub use booking::{Booking, Field, FieldUpdate, Selection};
pub use content::FormContent;
pub use session::{Session, SessionHandle, SessionKind};
pub use store::{DraftStore, FileStore, KeyValueStore, MemoryStore};
pub use submission::{submit, LogoutTiming, SubmissionOutcome};
pub use wizard::{Step, SubmissionStatus, Transition, Variant, Wizard};
