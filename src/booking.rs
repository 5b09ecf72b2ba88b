//! Booking draft model shared by the attendee and artist wizards.
//!
//! Field names on the wire follow the booking service (snake_case), so a
//! serialized [`Booking`] is both the persisted draft and the submission payload.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of an option inside one Form Content category
pub type OptionId = u32;

/// Wire value of an unselected option
pub const UNSELECTED: i64 = -1;

/// A single-choice selection that may still be open.
///
/// Serialized as a plain integer where `-1` means "nothing selected".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Selection {
    #[default]
    Unselected,
    Selected(OptionId),
}

impl Selection {
    pub fn id(self) -> Option<OptionId> {
        match self {
            Selection::Unselected => None,
            Selection::Selected(id) => Some(id),
        }
    }

    pub fn is_selected(self) -> bool {
        matches!(self, Selection::Selected(_))
    }
}

impl From<i64> for Selection {
    fn from(raw: i64) -> Self {
        // Anything outside the id range is treated like the sentinel
        u32::try_from(raw)
            .map(Selection::Selected)
            .unwrap_or(Selection::Unselected)
    }
}

impl From<Selection> for i64 {
    fn from(selection: Selection) -> Self {
        selection.id().map(i64::from).unwrap_or(UNSELECTED)
    }
}

impl From<Option<OptionId>> for Selection {
    fn from(id: Option<OptionId>) -> Self {
        id.map(Selection::Selected).unwrap_or_default()
    }
}

/// Set durations offered to artists, in minutes
pub const PERFORMANCE_DURATIONS: &[&str] = &["30", "45", "60", "90", "120"];

/// Structured performance details of an artist booking.
///
/// The booking service stores this as JSON text, see [`performance_text`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PerformanceDetails {
    pub preferred_day: String,
    pub preferred_time: String,
    /// Set length in minutes, one of [`PERFORMANCE_DURATIONS`]
    pub duration: String,
    pub genre: String,
    pub description: String,
    #[serde(rename = "bandMembers")]
    pub collaborators: String,
}

impl PerformanceDetails {
    /// True when nothing has been filled in yet
    pub fn is_empty(&self) -> bool {
        [
            &self.preferred_day,
            &self.preferred_time,
            &self.duration,
            &self.genre,
            &self.description,
            &self.collaborators,
        ]
        .iter()
        .all(|value| value.trim().is_empty())
    }

    pub fn has_valid_duration(&self) -> bool {
        self.duration.is_empty() || PERFORMANCE_DURATIONS.contains(&self.duration.as_str())
    }
}

/// Serde adapter that nests [`PerformanceDetails`] as a JSON string.
///
/// An empty record is written as `""` and `""` reads back as the empty record.
pub mod performance_text {
    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::PerformanceDetails;

    pub fn serialize<S>(details: &PerformanceDetails, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if details.is_empty() {
            return serializer.serialize_str("");
        }
        let text = serde_json::to_string(details).map_err(S::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<PerformanceDetails, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        if text.trim().is_empty() {
            return Ok(PerformanceDetails::default());
        }
        serde_json::from_str(&text).map_err(D::Error::custom)
    }
}

/// The in-progress booking edited by a wizard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Booking {
    pub last_name: String,
    pub first_name: String,
    pub email: String,
    pub phone: String,
    #[serde(rename = "ticket_id")]
    pub ticket: Selection,
    #[serde(rename = "beverage_id")]
    pub beverage: Selection,
    #[serde(rename = "food_id")]
    pub food: Selection,
    /// Materials an attendee offers to bring
    pub material_ids: BTreeSet<OptionId>,
    /// Materials an artist needs on site
    pub artist_material_ids: BTreeSet<OptionId>,
    pub timeslot_priority_1: Selection,
    pub timeslot_priority_2: Selection,
    pub timeslot_priority_3: Selection,
    pub amount_shifts: u32,
    pub supporter_buddy: String,
    pub equipment: String,
    pub special_requests: String,
    #[serde(with = "performance_text")]
    pub performance_details: PerformanceDetails,
    pub signature: String,
    total_price: f64,
    // Payment metadata is maintained by the organisers and only carried through
    pub is_paid: bool,
    pub paid_amount: f64,
    pub payment_date: String,
    pub payment_notes: String,
}

impl Default for Booking {
    fn default() -> Self {
        Self {
            last_name: String::new(),
            first_name: String::new(),
            email: String::new(),
            phone: String::new(),
            ticket: Selection::Unselected,
            beverage: Selection::Unselected,
            food: Selection::Unselected,
            material_ids: BTreeSet::new(),
            artist_material_ids: BTreeSet::new(),
            timeslot_priority_1: Selection::Unselected,
            timeslot_priority_2: Selection::Unselected,
            timeslot_priority_3: Selection::Unselected,
            amount_shifts: 1,
            supporter_buddy: String::new(),
            equipment: String::new(),
            special_requests: String::new(),
            performance_details: PerformanceDetails::default(),
            signature: String::new(),
            total_price: 0.0,
            is_paid: false,
            paid_amount: 0.0,
            payment_date: String::new(),
            payment_notes: String::new(),
        }
    }
}

impl Booking {
    /// Derived total; only the wizard's pricing step writes it
    pub fn total_price(&self) -> f64 {
        self.total_price
    }

    pub(crate) fn set_total_price(&mut self, total: f64) {
        self.total_price = total;
    }

    /// Apply a single field edit.
    ///
    /// Returns true when the edit touched a field the price depends on.
    pub(crate) fn apply(&mut self, update: FieldUpdate) -> bool {
        match update {
            FieldUpdate::LastName(value) => self.last_name = value,
            FieldUpdate::FirstName(value) => self.first_name = value,
            FieldUpdate::Email(value) => self.email = value,
            FieldUpdate::Phone(value) => self.phone = value,
            FieldUpdate::Ticket(selection) => {
                self.ticket = selection;
                return true;
            }
            FieldUpdate::Beverage(selection) => {
                self.beverage = selection;
                return true;
            }
            FieldUpdate::Food(selection) => {
                self.food = selection;
                return true;
            }
            FieldUpdate::Materials(ids) => self.material_ids = ids,
            FieldUpdate::ArtistMaterials(ids) => self.artist_material_ids = ids,
            FieldUpdate::TimeslotPriority1(selection) => self.timeslot_priority_1 = selection,
            FieldUpdate::TimeslotPriority2(selection) => self.timeslot_priority_2 = selection,
            FieldUpdate::TimeslotPriority3(selection) => self.timeslot_priority_3 = selection,
            FieldUpdate::AmountShifts(amount) => self.amount_shifts = amount.max(1),
            FieldUpdate::SupporterBuddy(value) => self.supporter_buddy = value,
            FieldUpdate::Equipment(value) => self.equipment = value,
            FieldUpdate::SpecialRequests(value) => self.special_requests = value,
            FieldUpdate::PerformanceDetails(details) => self.performance_details = details,
            FieldUpdate::Signature(value) => self.signature = value,
        }
        false
    }
}

/// Fields that carry a validation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    LastName,
    FirstName,
    Email,
    Phone,
    #[serde(rename = "ticket_id")]
    Ticket,
    #[serde(rename = "timeslot_priority_1")]
    TimeslotPriority1,
    #[serde(rename = "timeslot_priority_2")]
    TimeslotPriority2,
    #[serde(rename = "timeslot_priority_3")]
    TimeslotPriority3,
    Equipment,
    PerformanceDetails,
    Signature,
}

impl Field {
    pub fn all() -> &'static [Field] {
        &[
            Field::LastName,
            Field::FirstName,
            Field::Email,
            Field::Phone,
            Field::Ticket,
            Field::TimeslotPriority1,
            Field::TimeslotPriority2,
            Field::TimeslotPriority3,
            Field::Equipment,
            Field::PerformanceDetails,
            Field::Signature,
        ]
    }

    /// Wire name of the field, as used in the validation map
    pub fn key(self) -> &'static str {
        match self {
            Field::LastName => "last_name",
            Field::FirstName => "first_name",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::Ticket => "ticket_id",
            Field::TimeslotPriority1 => "timeslot_priority_1",
            Field::TimeslotPriority2 => "timeslot_priority_2",
            Field::TimeslotPriority3 => "timeslot_priority_3",
            Field::Equipment => "equipment",
            Field::PerformanceDetails => "performance_details",
            Field::Signature => "signature",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One edit of the booking. There is deliberately no variant for the total price.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    LastName(String),
    FirstName(String),
    Email(String),
    Phone(String),
    Ticket(Selection),
    Beverage(Selection),
    Food(Selection),
    Materials(BTreeSet<OptionId>),
    ArtistMaterials(BTreeSet<OptionId>),
    TimeslotPriority1(Selection),
    TimeslotPriority2(Selection),
    TimeslotPriority3(Selection),
    AmountShifts(u32),
    SupporterBuddy(String),
    Equipment(String),
    SpecialRequests(String),
    PerformanceDetails(PerformanceDetails),
    Signature(String),
}

impl FieldUpdate {
    /// Validated field this update touches, if any
    pub fn field(&self) -> Option<Field> {
        match self {
            FieldUpdate::LastName(_) => Some(Field::LastName),
            FieldUpdate::FirstName(_) => Some(Field::FirstName),
            FieldUpdate::Email(_) => Some(Field::Email),
            FieldUpdate::Phone(_) => Some(Field::Phone),
            FieldUpdate::Ticket(_) => Some(Field::Ticket),
            FieldUpdate::TimeslotPriority1(_) => Some(Field::TimeslotPriority1),
            FieldUpdate::TimeslotPriority2(_) => Some(Field::TimeslotPriority2),
            FieldUpdate::TimeslotPriority3(_) => Some(Field::TimeslotPriority3),
            FieldUpdate::Equipment(_) => Some(Field::Equipment),
            FieldUpdate::PerformanceDetails(_) => Some(Field::PerformanceDetails),
            FieldUpdate::Signature(_) => Some(Field::Signature),
            FieldUpdate::Beverage(_)
            | FieldUpdate::Food(_)
            | FieldUpdate::Materials(_)
            | FieldUpdate::ArtistMaterials(_)
            | FieldUpdate::AmountShifts(_)
            | FieldUpdate::SupporterBuddy(_)
            | FieldUpdate::SpecialRequests(_) => None,
        }
    }

    /// Build an update from a wire field name and a textual value.
    ///
    /// Selections accept an id, or `-1`/`none`/empty to unselect. Material
    /// sets are comma-separated ids. `performance_details` takes the JSON text
    /// the service stores.
    pub fn parse(key: &str, value: &str) -> Result<Self, UpdateParseError> {
        let value = value.trim();
        let update = match key {
            "last_name" => FieldUpdate::LastName(value.to_string()),
            "first_name" => FieldUpdate::FirstName(value.to_string()),
            "email" => FieldUpdate::Email(value.to_string()),
            "phone" => FieldUpdate::Phone(value.to_string()),
            "ticket_id" => FieldUpdate::Ticket(parse_selection(key, value)?),
            "beverage_id" => FieldUpdate::Beverage(parse_selection(key, value)?),
            "food_id" => FieldUpdate::Food(parse_selection(key, value)?),
            "material_ids" => FieldUpdate::Materials(parse_id_set(key, value)?),
            "artist_material_ids" => FieldUpdate::ArtistMaterials(parse_id_set(key, value)?),
            "timeslot_priority_1" => FieldUpdate::TimeslotPriority1(parse_selection(key, value)?),
            "timeslot_priority_2" => FieldUpdate::TimeslotPriority2(parse_selection(key, value)?),
            "timeslot_priority_3" => FieldUpdate::TimeslotPriority3(parse_selection(key, value)?),
            "amount_shifts" => FieldUpdate::AmountShifts(
                value
                    .parse()
                    .map_err(|_| UpdateParseError::invalid(key, value))?,
            ),
            "supporter_buddy" => FieldUpdate::SupporterBuddy(value.to_string()),
            "equipment" => FieldUpdate::Equipment(value.to_string()),
            "special_requests" => FieldUpdate::SpecialRequests(value.to_string()),
            "performance_details" => {
                let details = if value.is_empty() {
                    PerformanceDetails::default()
                } else {
                    serde_json::from_str(value).map_err(|_| UpdateParseError::invalid(key, value))?
                };
                FieldUpdate::PerformanceDetails(details)
            }
            "signature" => FieldUpdate::Signature(value.to_string()),
            other => return Err(UpdateParseError::UnknownField(other.to_string())),
        };
        Ok(update)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UpdateParseError {
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("invalid value '{value}' for {field}")]
    InvalidValue { field: String, value: String },
}

impl UpdateParseError {
    fn invalid(field: &str, value: &str) -> Self {
        UpdateParseError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

fn parse_selection(key: &str, value: &str) -> Result<Selection, UpdateParseError> {
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return Ok(Selection::Unselected);
    }
    value
        .parse::<i64>()
        .map(Selection::from)
        .map_err(|_| UpdateParseError::invalid(key, value))
}

fn parse_id_set(key: &str, value: &str) -> Result<BTreeSet<OptionId>, UpdateParseError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse().map_err(|_| UpdateParseError::invalid(key, part)))
        .collect()
}
