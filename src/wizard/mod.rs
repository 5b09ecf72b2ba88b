//! Multi-step booking wizard.
//!
//! The wizard owns the draft of one registration flow: the booking, the
//! validation map, the active step, the submission status and the displayed
//! error. Every mutation is written through to the [`DraftStore`] before the
//! method returns, so a restart resumes exactly where the user left off.

use crate::booking::{Booking, Field, FieldUpdate};
use crate::content::FormContent;
use crate::pricing;
use crate::store::{Draft, DraftStore, KeyValueStore};
use crate::validation::{self, ValidationMap};

pub mod types;

pub use types::*;


/// State machine behind the attendee and artist registration flows
pub struct Wizard {
    variant: Variant,
    store: DraftStore,
    content: FormContent,
    booking: Booking,
    validation: ValidationMap,
    active_step: usize,
    status: SubmissionStatus,
    current_error: String,
}

impl Wizard {
    /// Open a wizard, restoring any compatible draft from `backend`
    pub fn open(variant: Variant, backend: impl KeyValueStore + 'static) -> Self {
        let mut store = DraftStore::new(variant, backend);
        store.check_version();
        let draft = store.load_draft();

        let last_step = variant.steps().len() - 1;
        let status = match draft.status {
            // The request died with the previous process
            SubmissionStatus::Submitting => SubmissionStatus::NotSubmitted,
            other => other,
        };

        let mut wizard = Self {
            variant,
            store,
            content: FormContent::default(),
            booking: draft.booking,
            validation: draft.validation,
            active_step: draft.active_step.min(last_step),
            status,
            current_error: draft.current_error,
        };
        // The saved total already matches the saved selections; it is only
        // recomputed once a real catalog is installed
        if !wizard.content.is_placeholder() {
            wizard.reprice();
        }

        tracing::debug!(
            variant = %variant,
            step = ?wizard.step(),
            status = wizard.status.label(),
            "Wizard opened"
        );
        wizard
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn booking(&self) -> &Booking {
        &self.booking
    }

    pub fn content(&self) -> &FormContent {
        &self.content
    }

    pub fn validation(&self) -> &ValidationMap {
        &self.validation
    }

    pub fn active_step(&self) -> usize {
        self.active_step
    }

    pub fn step(&self) -> Step {
        self.steps()[self.active_step]
    }

    pub fn steps(&self) -> &'static [Step] {
        self.variant.steps()
    }

    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    /// Error message currently shown to the user, empty if none
    pub fn current_error(&self) -> &str {
        &self.current_error
    }

    pub fn is_final_step(&self) -> bool {
        self.active_step + 1 == self.steps().len()
    }

    /// Navigation is frozen while a submission is in flight or done
    pub fn is_locked(&self) -> bool {
        self.status != SubmissionStatus::NotSubmitted
    }

    /// Snapshot of everything that gets persisted
    pub fn draft(&self) -> Draft {
        Draft {
            booking: self.booking.clone(),
            validation: self.validation.clone(),
            active_step: self.active_step,
            status: self.status,
            current_error: self.current_error.clone(),
        }
    }

    /// Apply a field edit.
    ///
    /// Price-relevant edits reprice the booking in the same update, and any
    /// displayed error is cleared until the next validation.
    pub fn update(&mut self, update: FieldUpdate) {
        tracing::debug!(variant = %self.variant, update = ?update, "Booking field updated");

        if self.booking.apply(update) {
            self.reprice();
        }
        self.current_error.clear();
        self.persist();
    }

    /// Install the catalog fetched from the booking service
    pub fn set_form_content(&mut self, content: FormContent) {
        self.content = content;
        self.reprice();
        self.persist();
    }

    /// Validate one field on demand and refresh the displayed error
    pub fn validate_field(&mut self, field: Field) -> String {
        let message = self.record_validation(field);
        self.refresh_current_error();
        self.persist();
        message
    }

    /// Advance if every required field of the current step is valid
    pub fn next(&mut self) -> Transition {
        if self.is_locked() || self.is_final_step() {
            return Transition::Unchanged;
        }

        let step = self.step();
        let mut first_failure = None;
        for &field in step.required_fields() {
            let message = self.record_validation(field);
            if !message.is_empty() && first_failure.is_none() {
                first_failure = Some(field);
            }
        }
        self.refresh_current_error();

        let transition = match first_failure {
            Some(field) => {
                tracing::debug!(step = ?step, field = %field, "Step blocked by validation");
                Transition::Blocked {
                    field,
                    error: self.current_error.clone(),
                }
            }
            None => {
                self.active_step += 1;
                self.current_error.clear();
                tracing::info!(variant = %self.variant, from = ?step, to = ?self.step(), "Advanced");
                Transition::Advanced(self.step())
            }
        };
        self.persist();
        transition
    }

    /// Go back one step without validating the step being left
    pub fn back(&mut self) -> Transition {
        if self.is_locked() || self.active_step == 0 {
            return Transition::Unchanged;
        }

        self.active_step -= 1;
        self.current_error.clear();
        self.persist();
        tracing::info!(variant = %self.variant, to = ?self.step(), "Went back");
        Transition::Retreated(self.step())
    }

    /// Discard the draft and start over
    pub fn reset(&mut self) {
        self.store.clear();
        self.booking = Booking::default();
        self.validation.clear();
        self.active_step = 0;
        self.status = SubmissionStatus::NotSubmitted;
        self.current_error.clear();
        self.reprice();
        tracing::info!(variant = %self.variant, "Draft reset");
    }

    /// Titles of the current selections for the summary step
    pub fn summary(&self) -> BookingSummary {
        let booking = &self.booking;
        let content = &self.content;

        let materials = match self.variant {
            Variant::Attendee => content
                .materials
                .iter()
                .filter(|m| booking.material_ids.contains(&m.id))
                .map(|m| m.title.clone())
                .collect(),
            Variant::Artist => content
                .artist_materials
                .iter()
                .filter(|m| booking.artist_material_ids.contains(&m.id))
                .map(|m| m.title.clone())
                .collect(),
        };

        let time_slots = [
            booking.timeslot_priority_1,
            booking.timeslot_priority_2,
            booking.timeslot_priority_3,
        ]
        .into_iter()
        .filter_map(|selection| content.time_slot(selection))
        .map(|(shift, slot)| format!("{} ({})", shift.title, slot.title))
        .collect();

        BookingSummary {
            name: format!("{} {}", booking.first_name, booking.last_name)
                .trim()
                .to_string(),
            email: booking.email.clone(),
            phone: booking.phone.clone(),
            ticket: content.ticket(booking.ticket).map(|t| t.title.clone()),
            beverage: content.beverage(booking.beverage).map(|b| b.title.clone()),
            food: content.food(booking.food).map(|f| f.title.clone()),
            materials,
            time_slots,
            total_price: booking.total_price(),
        }
    }

    /// Mark the start of a submission; false if submitting is not allowed now
    pub(crate) fn begin_submission(&mut self) -> bool {
        if !self.is_final_step() || self.status != SubmissionStatus::NotSubmitted {
            return false;
        }
        self.status = SubmissionStatus::Submitting;
        self.persist();
        true
    }

    pub(crate) fn finish_submission(&mut self, successful: bool) {
        self.status = SubmissionStatus::Submitted { successful };
        self.persist();
    }

    /// Return to "not submitted", used when the session was rejected
    pub(crate) fn abort_submission(&mut self) {
        self.status = SubmissionStatus::NotSubmitted;
        self.persist();
    }

    fn record_validation(&mut self, field: Field) -> String {
        let message = validation::validate_field(self.variant, field, &self.booking);
        self.validation.insert(field, message.clone());
        message
    }

    fn refresh_current_error(&mut self) {
        self.current_error = validation::first_error(&self.validation, self.step().required_fields());
    }

    fn reprice(&mut self) {
        let total = pricing::total_price(self.variant, &self.booking, &self.content);
        self.booking.set_total_price(total);
    }

    fn persist(&mut self) {
        let draft = self.draft();
        self.store.save_draft(&draft);
    }
}
