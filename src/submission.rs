//! Submission of a finished booking.
//!
//! Submitting is only possible from the final step of a wizard that has not
//! been submitted yet. The outcome decides the session's fate: an accepted
//! booking keeps the user logged in for a while, a rejected token logs out at
//! once, and any other failure logs out after a short grace period.

use std::time::Duration;

use crate::api::BookingApi;
use crate::config::SessionConfig;
use crate::session::SessionHandle;
use crate::wizard::Wizard;

/// Delays before the automatic logout that follows a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoutTiming {
    pub after_success: Duration,
    pub after_failure: Duration,
}

impl Default for LogoutTiming {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

impl From<&SessionConfig> for LogoutTiming {
    fn from(config: &SessionConfig) -> Self {
        Self {
            after_success: Duration::from_secs(config.logout_after_success_secs),
            after_failure: Duration::from_secs(config.logout_after_failure_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The service stored the booking
    Accepted,
    /// The service refused or could not be reached
    Failed { message: String },
    /// The token was rejected; the session is gone and the booking can be resubmitted
    Unauthorized,
    /// Not on the final step, or already submitted
    NotReady,
}

/// Send the wizard's booking to the service
pub async fn submit(
    wizard: &mut Wizard,
    session: &SessionHandle,
    api: &dyn BookingApi,
    timing: &LogoutTiming,
) -> SubmissionOutcome {
    if !wizard.begin_submission() {
        tracing::debug!(status = wizard.status().label(), step = ?wizard.step(), "Submission not possible");
        return SubmissionOutcome::NotReady;
    }

    let variant = wizard.variant();
    let Some(token) = session.token() else {
        tracing::warn!(variant = %variant, "Submission attempted without a session");
        wizard.abort_submission();
        return SubmissionOutcome::Unauthorized;
    };

    tracing::info!(
        variant = %variant,
        total_price = wizard.booking().total_price(),
        "Submitting booking"
    );
    let booking = wizard.booking().clone();

    match api.submit_booking(variant, &token, &booking).await {
        Ok(()) => {
            tracing::info!(variant = %variant, "Booking accepted");
            wizard.finish_submission(true);
            session.invalidate_after(timing.after_success);
            SubmissionOutcome::Accepted
        }
        Err(e) if e.is_auth_error() => {
            tracing::warn!(variant = %variant, error = %e, "Session rejected during submission");
            session.invalidate();
            wizard.abort_submission();
            SubmissionOutcome::Unauthorized
        }
        Err(e) => {
            tracing::warn!(variant = %variant, error = %e, "Booking submission failed");
            wizard.finish_submission(false);
            session.invalidate_after(timing.after_failure);
            SubmissionOutcome::Failed {
                message: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::booking::{Booking, FieldUpdate, Selection};
    use crate::content::FormContent;
    use crate::session::{Session, SessionKind};
    use crate::store::MemoryStore;
    use crate::wizard::{SubmissionStatus, Variant};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers every submission with a fixed result and records the payloads
    struct FakeService {
        result: Result<(), ApiError>,
        submitted: Mutex<Vec<(Variant, String, Booking)>>,
    }

    impl FakeService {
        fn answering(result: Result<(), ApiError>) -> Self {
            Self {
                result,
                submitted: Mutex::new(Vec::new()),
            }
        }

        fn submissions(&self) -> usize {
            self.submitted.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl BookingApi for FakeService {
        async fn login(&self, _kind: SessionKind, _password: &str) -> Result<String, ApiError> {
            Ok("token".to_string())
        }

        async fn fetch_form_content(
            &self,
            _variant: Variant,
            _token: &str,
        ) -> Result<FormContent, ApiError> {
            Ok(FormContent::default())
        }

        async fn submit_booking(
            &self,
            variant: Variant,
            token: &str,
            booking: &Booking,
        ) -> Result<(), ApiError> {
            self.submitted
                .lock()
                .unwrap()
                .push((variant, token.to_string(), booking.clone()));
            self.result.clone()
        }
    }

    fn session() -> SessionHandle {
        let handle = SessionHandle::new(Session::new(SessionKind::Attendee));
        handle.login("valid-token");
        handle
    }

    fn finished_wizard() -> Wizard {
        let mut wizard = Wizard::open(Variant::Attendee, MemoryStore::new());
        wizard.update(FieldUpdate::FirstName("Max".to_string()));
        wizard.update(FieldUpdate::LastName("Müller".to_string()));
        wizard.update(FieldUpdate::Email("a@b.de".to_string()));
        wizard.update(FieldUpdate::Phone("01512345678".to_string()));
        wizard.update(FieldUpdate::Ticket(Selection::Selected(1)));
        wizard.update(FieldUpdate::TimeslotPriority1(Selection::Selected(1)));
        wizard.update(FieldUpdate::TimeslotPriority2(Selection::Selected(2)));
        wizard.update(FieldUpdate::TimeslotPriority3(Selection::Selected(3)));
        wizard.update(FieldUpdate::Signature("signed".to_string()));
        while !wizard.is_final_step() {
            wizard.next();
        }
        wizard
    }

    #[tokio::test(start_paused = true)]
    async fn test_accepted_booking_logs_out_after_an_hour() {
        let mut wizard = finished_wizard();
        let session = session();
        let api = FakeService::answering(Ok(()));

        let outcome = submit(&mut wizard, &session, &api, &LogoutTiming::default()).await;
        assert_eq!(outcome, SubmissionOutcome::Accepted);
        assert_eq!(wizard.status(), SubmissionStatus::Submitted { successful: true });

        let submitted = api.submitted.lock().unwrap().clone();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].1, "valid-token");
        assert_eq!(submitted[0].2.first_name, "Max");

        tokio::time::sleep(Duration::from_secs(3599)).await;
        assert!(session.is_authenticated());
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!session.is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_booking_logs_out_after_grace_period() {
        let mut wizard = finished_wizard();
        let session = session();
        let api = FakeService::answering(Err(ApiError::http("/api/submitForm", 400, "Duplicate booking")));

        let outcome = submit(&mut wizard, &session, &api, &LogoutTiming::default()).await;
        assert_eq!(
            outcome,
            SubmissionOutcome::Failed {
                message: "/api/submitForm: HTTP 400 - Duplicate booking".to_string()
            }
        );
        assert_eq!(wizard.status(), SubmissionStatus::Submitted { successful: false });
        assert!(session.is_authenticated());

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_rejected_token_logs_out_immediately() {
        let mut wizard = finished_wizard();
        let session = session();
        let api = FakeService::answering(Err(ApiError::unauthorized("/api/submitForm")));

        let outcome = submit(&mut wizard, &session, &api, &LogoutTiming::default()).await;
        assert_eq!(outcome, SubmissionOutcome::Unauthorized);
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), None);
        assert_eq!(wizard.status(), SubmissionStatus::NotSubmitted);
    }

    #[tokio::test]
    async fn test_only_final_step_submits() {
        let mut wizard = Wizard::open(Variant::Attendee, MemoryStore::new());
        let session = session();
        let api = FakeService::answering(Ok(()));

        let outcome = submit(&mut wizard, &session, &api, &LogoutTiming::default()).await;
        assert_eq!(outcome, SubmissionOutcome::NotReady);
        assert_eq!(api.submissions(), 0);
        assert_eq!(wizard.status(), SubmissionStatus::NotSubmitted);
    }

    #[tokio::test]
    async fn test_second_submission_is_refused() {
        let mut wizard = finished_wizard();
        let session = session();
        let api = FakeService::answering(Ok(()));
        let timing = LogoutTiming::default();

        submit(&mut wizard, &session, &api, &timing).await;
        let outcome = submit(&mut wizard, &session, &api, &timing).await;
        assert_eq!(outcome, SubmissionOutcome::NotReady);
        assert_eq!(api.submissions(), 1);
    }

    #[tokio::test]
    async fn test_missing_session_does_not_call_service() {
        let mut wizard = finished_wizard();
        let session = SessionHandle::new(Session::new(SessionKind::Attendee));
        let api = FakeService::answering(Ok(()));

        let outcome = submit(&mut wizard, &session, &api, &LogoutTiming::default()).await;
        assert_eq!(outcome, SubmissionOutcome::Unauthorized);
        assert_eq!(api.submissions(), 0);
        assert_eq!(wizard.status(), SubmissionStatus::NotSubmitted);
    }

    #[test]
    fn test_timing_from_config() {
        let config = SessionConfig {
            logout_after_success_secs: 60,
            logout_after_failure_secs: 5,
        };
        let timing = LogoutTiming::from(&config);
        assert_eq!(timing.after_success, Duration::from_secs(60));
        assert_eq!(timing.after_failure, Duration::from_secs(5));
    }
}
