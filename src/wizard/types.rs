//! Type definitions for the booking wizards

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::booking::Field;

/// Which registration flow a wizard runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// General festival attendee
    Attendee,
    /// Performing artist
    Artist,
}

impl Variant {
    /// Ordered steps of this flow
    pub fn steps(self) -> &'static [Step] {
        match self {
            Variant::Attendee => &[
                Step::PersonalDetails,
                Step::Ticket,
                Step::Beverage,
                Step::Food,
                Step::Workshift,
                Step::Materials,
                Step::AwarenessCode,
                Step::Signature,
                Step::Summary,
                Step::Confirmation,
            ],
            Variant::Artist => &[
                Step::PersonalDetails,
                Step::PerformanceDetails,
                Step::Ticket,
                Step::Beverage,
                Step::Food,
                Step::Materials,
                Step::TechnicalRequirements,
                Step::Signature,
                Step::Summary,
                Step::Confirmation,
            ],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Variant::Attendee => "attendee",
            Variant::Artist => "artist",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One page of a wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Name, email and phone
    PersonalDetails,
    /// Artist set details
    PerformanceDetails,
    Ticket,
    Beverage,
    Food,
    /// Three prioritised work-shift time slots
    Workshift,
    Materials,
    /// Code of conduct, nothing to fill in
    AwarenessCode,
    /// Artist equipment and stage needs
    TechnicalRequirements,
    Signature,
    Summary,
    /// Final step where the booking is submitted
    Confirmation,
}

impl Step {
    /// Fields that must validate before leaving this step, in display order
    pub fn required_fields(self) -> &'static [Field] {
        match self {
            Step::PersonalDetails => &[Field::LastName, Field::FirstName, Field::Email, Field::Phone],
            Step::PerformanceDetails => &[Field::PerformanceDetails],
            Step::Ticket => &[Field::Ticket],
            Step::Workshift => &[
                Field::TimeslotPriority1,
                Field::TimeslotPriority2,
                Field::TimeslotPriority3,
            ],
            Step::TechnicalRequirements => &[Field::Equipment],
            Step::Signature => &[Field::Signature],
            Step::Beverage
            | Step::Food
            | Step::Materials
            | Step::AwarenessCode
            | Step::Summary
            | Step::Confirmation => &[],
        }
    }

    /// Heading shown above the step
    pub fn title(self, variant: Variant) -> &'static str {
        match (self, variant) {
            (Step::PersonalDetails, Variant::Attendee) => "Persönliche Daten",
            (Step::PersonalDetails, Variant::Artist) => "Persönliche Daten (Künstler-Registrierung)",
            (Step::PerformanceDetails, _) => "Details zu deinem Auftritt",
            (Step::Ticket, Variant::Attendee) => "Wann fliegst du mit?",
            (Step::Ticket, Variant::Artist) => "An welchen Tagen bist du auf dem Festival?",
            (Step::Beverage, Variant::Attendee) => "Ein Spacebier gefällig?",
            (Step::Beverage, Variant::Artist) => "Getränke für Künstler (kostenlos)",
            (Step::Food, Variant::Attendee) => "Wähle deine Astronautenkost",
            (Step::Food, Variant::Artist) => "Dein Essen (erste Mahlzeit kostenlos)",
            (Step::Workshift, _) => "Tritt der Crew bei",
            (Step::Materials, Variant::Attendee) => "Ich bringe folgende Ersatzteile mit",
            (Step::Materials, Variant::Artist) => "Welche Materialien kannst du mitbringen?",
            (Step::AwarenessCode, _) => "Ein paar Regeln für unsere Reise durch die Galaxis",
            (Step::TechnicalRequirements, _) => "Benötigte Ausrüstung und technische Anforderungen",
            (Step::Signature, _) => "Ein Abenteuer auf eigene Gefahr",
            (Step::Summary, _) => "Zusammenfassung",
            (Step::Confirmation, _) => "Bereit zum Abheben!",
        }
    }
}

/// Outcome of a navigation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Moved forward to the given step
    Advanced(Step),
    /// Stayed put because a required field failed
    Blocked { field: Field, error: String },
    /// Moved back to the given step
    Retreated(Step),
    /// Nothing to do (boundary reached or navigation locked)
    Unchanged,
}

/// Submission progress of a booking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BookingStateFlags", into = "BookingStateFlags")]
pub enum SubmissionStatus {
    #[default]
    NotSubmitted,
    /// Request in flight
    Submitting,
    /// The service answered; `successful` is false for a rejected booking
    Submitted { successful: bool },
}

impl SubmissionStatus {
    pub fn is_submitted(self) -> bool {
        matches!(self, SubmissionStatus::Submitted { .. })
    }

    pub fn label(self) -> &'static str {
        match self {
            SubmissionStatus::NotSubmitted => "not submitted",
            SubmissionStatus::Submitting => "submitting",
            SubmissionStatus::Submitted { successful: true } => "submitted",
            SubmissionStatus::Submitted { successful: false } => "failed",
        }
    }
}

/// Persisted shape of [`SubmissionStatus`]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BookingStateFlags {
    pub is_submitted: bool,
    pub is_submitting: bool,
    pub is_successful: bool,
}

impl From<BookingStateFlags> for SubmissionStatus {
    fn from(flags: BookingStateFlags) -> Self {
        if flags.is_submitting {
            SubmissionStatus::Submitting
        } else if flags.is_submitted {
            SubmissionStatus::Submitted {
                successful: flags.is_successful,
            }
        } else {
            SubmissionStatus::NotSubmitted
        }
    }
}

impl From<SubmissionStatus> for BookingStateFlags {
    fn from(status: SubmissionStatus) -> Self {
        match status {
            SubmissionStatus::NotSubmitted => Self::default(),
            SubmissionStatus::Submitting => Self {
                is_submitting: true,
                ..Self::default()
            },
            SubmissionStatus::Submitted { successful } => Self {
                is_submitted: true,
                is_submitting: false,
                is_successful: successful,
            },
        }
    }
}

/// Human-readable view of the draft for the summary step
#[derive(Debug, Clone, PartialEq)]
pub struct BookingSummary {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub ticket: Option<String>,
    pub beverage: Option<String>,
    pub food: Option<String>,
    pub materials: Vec<String>,
    pub time_slots: Vec<String>,
    pub total_price: f64,
}

impl fmt::Display for BookingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let or_dash = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

        writeln!(f, "Name:      {}", self.name)?;
        writeln!(f, "Email:     {}", self.email)?;
        writeln!(f, "Telefon:   {}", self.phone)?;
        writeln!(f, "Ticket:    {}", or_dash(&self.ticket))?;
        writeln!(f, "Getränke:  {}", or_dash(&self.beverage))?;
        writeln!(f, "Essen:     {}", or_dash(&self.food))?;
        if !self.time_slots.is_empty() {
            writeln!(f, "Schichten: {}", self.time_slots.join(", "))?;
        }
        if !self.materials.is_empty() {
            writeln!(f, "Material:  {}", self.materials.join(", "))?;
        }
        write!(f, "Gesamt:    {:.2} €", self.total_price)
    }
}
