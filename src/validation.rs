//! Field validation rules for the booking wizards.
//!
//! Every rule returns the user-facing message, or an empty string when the
//! value is valid. Messages are the festival's German texts.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::booking::{Booking, Field, Selection};
use crate::wizard::Variant;

/// Latest message per validated field; empty string means valid
pub type ValidationMap = BTreeMap<Field, String>;

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-zÄÖÜäöüß\s]+$").expect("name pattern is valid"));

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("email pattern is valid")
});

// ASCII digits only, `\d` would also accept other scripts
static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{10,15}$").expect("phone pattern is valid"));

pub mod messages {
    pub const FIRST_NAME_MISSING: &str = "Bitte gib einen Vornamen an";
    pub const FIRST_NAME_INVALID: &str = "Bitte verwende nur Buchstaben für deinen Vornamen";
    pub const LAST_NAME_MISSING: &str = "Bitte gib einen Nachnamen an";
    pub const LAST_NAME_INVALID: &str = "Bitte verwende nur Buchstaben für deinen Nachnamen";
    pub const EMAIL_MISSING: &str = "Bitte gib eine Email ein";
    pub const EMAIL_INVALID: &str = "Bitte gib eine gültige Email ein.";
    pub const PHONE_MISSING: &str = "Bitte gib eine Telefonnummer ein";
    pub const PHONE_INVALID: &str = "Bitte gib eine gültige Telefonnummer ein";
    pub const TICKET_MISSING: &str = "Bitte wähle ein Ticket aus.";
    pub const ATTENDANCE_MISSING: &str = "Bitte wähle deine Anwesenheitstage.";
    pub const TIMESLOTS_MISSING: &str = "Bitte gib drei Prioritäten an.";
    pub const EQUIPMENT_MISSING: &str = "Bitte gib deine technischen Anforderungen an.";
    pub const PERFORMANCE_MISSING: &str = "Bitte gib Details zu deinem Auftritt an.";
    pub const DURATION_INVALID: &str = "Bitte wähle eine gültige Set-Dauer.";
    pub const SIGNATURE_MISSING: &str = "Wir würden uns freuen, wenn du das Formular unterschreibst";
}

fn validate_name(value: &str, missing: &str, invalid: &str) -> String {
    if value.is_empty() {
        return missing.to_string();
    }
    if !NAME_PATTERN.is_match(value) {
        return invalid.to_string();
    }
    String::new()
}

fn validate_pattern(value: &str, pattern: &Regex, missing: &str, invalid: &str) -> String {
    if value.is_empty() {
        missing.to_string()
    } else if !pattern.is_match(value) {
        invalid.to_string()
    } else {
        String::new()
    }
}

fn require_selection(selection: Selection, message: &str) -> String {
    if selection.is_selected() {
        String::new()
    } else {
        message.to_string()
    }
}

fn require_text(value: &str, message: &str) -> String {
    if value.is_empty() {
        message.to_string()
    } else {
        String::new()
    }
}

/// Validate one field of the booking
pub fn validate_field(variant: Variant, field: Field, booking: &Booking) -> String {
    use messages::*;

    match field {
        Field::FirstName => validate_name(&booking.first_name, FIRST_NAME_MISSING, FIRST_NAME_INVALID),
        Field::LastName => validate_name(&booking.last_name, LAST_NAME_MISSING, LAST_NAME_INVALID),
        Field::Email => validate_pattern(&booking.email, &EMAIL_PATTERN, EMAIL_MISSING, EMAIL_INVALID),
        Field::Phone => validate_pattern(&booking.phone, &PHONE_PATTERN, PHONE_MISSING, PHONE_INVALID),
        Field::Ticket => match variant {
            Variant::Attendee => require_selection(booking.ticket, TICKET_MISSING),
            Variant::Artist => require_selection(booking.ticket, ATTENDANCE_MISSING),
        },
        Field::TimeslotPriority1 => require_selection(booking.timeslot_priority_1, TIMESLOTS_MISSING),
        Field::TimeslotPriority2 => require_selection(booking.timeslot_priority_2, TIMESLOTS_MISSING),
        Field::TimeslotPriority3 => require_selection(booking.timeslot_priority_3, TIMESLOTS_MISSING),
        Field::Equipment => require_text(&booking.equipment, EQUIPMENT_MISSING),
        Field::PerformanceDetails => {
            let details = &booking.performance_details;
            if details.is_empty() {
                PERFORMANCE_MISSING.to_string()
            } else if !details.has_valid_duration() {
                DURATION_INVALID.to_string()
            } else {
                String::new()
            }
        }
        Field::Signature => require_text(&booking.signature, SIGNATURE_MISSING),
    }
}

/// First non-empty message among `fields`, in the given order
pub fn first_error(map: &ValidationMap, fields: &[Field]) -> String {
    fields
        .iter()
        .filter_map(|field| map.get(field))
        .find(|message| !message.is_empty())
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::messages::*;
    use super::*;
    use crate::booking::PerformanceDetails;

    fn booking() -> Booking {
        Booking::default()
    }

    #[test]
    fn test_names_accept_umlauts_and_spaces() {
        let mut b = booking();
        b.last_name = "Müller Lüdenscheidt".to_string();
        b.first_name = "Jörg".to_string();
        assert_eq!(validate_field(Variant::Attendee, Field::LastName, &b), "");
        assert_eq!(validate_field(Variant::Attendee, Field::FirstName, &b), "");
    }

    #[test]
    fn test_names_reject_digits_and_punctuation() {
        let mut b = booking();
        b.first_name = "Max2".to_string();
        b.last_name = "O'Neil".to_string();
        assert_eq!(validate_field(Variant::Artist, Field::FirstName, &b), FIRST_NAME_INVALID);
        assert_eq!(validate_field(Variant::Artist, Field::LastName, &b), LAST_NAME_INVALID);
    }

    #[test]
    fn test_missing_names_name_the_field() {
        let b = booking();
        assert_eq!(validate_field(Variant::Attendee, Field::FirstName, &b), FIRST_NAME_MISSING);
        assert_eq!(validate_field(Variant::Attendee, Field::LastName, &b), LAST_NAME_MISSING);
    }

    #[test]
    fn test_email_rules() {
        let mut b = booking();
        assert_eq!(validate_field(Variant::Attendee, Field::Email, &b), EMAIL_MISSING);

        for valid in ["a@b.de", "Max.Mueller+fest@Example.ORG", "x_y%z@sub.domain.io"] {
            b.email = valid.to_string();
            assert_eq!(validate_field(Variant::Attendee, Field::Email, &b), "", "{valid}");
        }
        for invalid in ["a@b", "a@b.d", "@b.de", "a b@c.de", "a@b.d3"] {
            b.email = invalid.to_string();
            assert_eq!(
                validate_field(Variant::Attendee, Field::Email, &b),
                EMAIL_INVALID,
                "{invalid}"
            );
        }
    }

    #[test]
    fn test_phone_rules() {
        let mut b = booking();
        assert_eq!(validate_field(Variant::Attendee, Field::Phone, &b), PHONE_MISSING);

        b.phone = "01512345678".to_string();
        assert_eq!(validate_field(Variant::Attendee, Field::Phone, &b), "");

        for invalid in ["123456789", "1234567890123456", "0151 2345678", "+491512345678", "١٢٣٤٥٦٧٨٩٠"] {
            b.phone = invalid.to_string();
            assert_eq!(
                validate_field(Variant::Attendee, Field::Phone, &b),
                PHONE_INVALID,
                "{invalid}"
            );
        }
    }

    #[test]
    fn test_ticket_message_depends_on_variant() {
        let mut b = booking();
        assert_eq!(validate_field(Variant::Attendee, Field::Ticket, &b), TICKET_MISSING);
        assert_eq!(validate_field(Variant::Artist, Field::Ticket, &b), ATTENDANCE_MISSING);

        b.ticket = Selection::Selected(2);
        assert_eq!(validate_field(Variant::Artist, Field::Ticket, &b), "");
    }

    #[test]
    fn test_performance_details_rules() {
        let mut b = booking();
        assert_eq!(
            validate_field(Variant::Artist, Field::PerformanceDetails, &b),
            PERFORMANCE_MISSING
        );

        b.performance_details = PerformanceDetails {
            duration: "75".to_string(),
            ..PerformanceDetails::default()
        };
        assert_eq!(
            validate_field(Variant::Artist, Field::PerformanceDetails, &b),
            DURATION_INVALID
        );

        b.performance_details.duration = "45".to_string();
        assert_eq!(validate_field(Variant::Artist, Field::PerformanceDetails, &b), "");
    }

    #[test]
    fn test_free_text_and_signature() {
        let mut b = booking();
        assert_eq!(validate_field(Variant::Artist, Field::Equipment, &b), EQUIPMENT_MISSING);
        assert_eq!(validate_field(Variant::Artist, Field::Signature, &b), SIGNATURE_MISSING);
        assert_eq!(
            validate_field(Variant::Attendee, Field::TimeslotPriority2, &b),
            TIMESLOTS_MISSING
        );

        b.equipment = "2 DI boxes".to_string();
        b.signature = "data:image/png;base64,AAAA".to_string();
        assert_eq!(validate_field(Variant::Artist, Field::Equipment, &b), "");
        assert_eq!(validate_field(Variant::Artist, Field::Signature, &b), "");
    }

    #[test]
    fn test_first_error_follows_field_order() {
        let mut map = ValidationMap::new();
        map.insert(Field::Email, EMAIL_INVALID.to_string());
        map.insert(Field::LastName, String::new());
        map.insert(Field::Phone, PHONE_MISSING.to_string());

        let order = [Field::LastName, Field::FirstName, Field::Phone, Field::Email];
        assert_eq!(first_error(&map, &order), PHONE_MISSING);
        assert_eq!(first_error(&map, &[Field::LastName]), "");
        assert_eq!(first_error(&map, &[]), "");
    }
}
