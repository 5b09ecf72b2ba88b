//! Form Content: the read-only option catalog served by the booking service

use serde::{Deserialize, Serialize};

use crate::booking::{OptionId, Selection};

/// Catalog of selectable options, fetched once per session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormContent {
    pub ticket_options: Vec<TicketOption>,
    pub beverage_options: Vec<PricedOption>,
    pub food_options: Vec<PricedOption>,
    pub materials: Vec<Material>,
    pub artist_materials: Vec<Material>,
    pub work_shifts: Vec<WorkShift>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketOption {
    pub id: OptionId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    /// Number of tickets available in total
    #[serde(default)]
    pub amount: u32,
    #[serde(default)]
    pub num_booked: u32,
}

/// Beverage and food options share one shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedOption {
    pub id: OptionId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub num_booked: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: OptionId,
    pub title: String,
    #[serde(default)]
    pub num_needed: u32,
    #[serde(default)]
    pub num_booked: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkShift {
    pub id: OptionId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub time_slots: Vec<TimeSlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: OptionId,
    pub title: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub num_needed: u32,
    #[serde(default)]
    pub num_booked: u32,
}

impl FormContent {
    pub fn ticket(&self, selection: Selection) -> Option<&TicketOption> {
        let id = selection.id()?;
        self.ticket_options.iter().find(|t| t.id == id)
    }

    pub fn beverage(&self, selection: Selection) -> Option<&PricedOption> {
        let id = selection.id()?;
        self.beverage_options.iter().find(|b| b.id == id)
    }

    pub fn food(&self, selection: Selection) -> Option<&PricedOption> {
        let id = selection.id()?;
        self.food_options.iter().find(|f| f.id == id)
    }

    /// Find a time slot across all work shifts
    pub fn time_slot(&self, selection: Selection) -> Option<(&WorkShift, &TimeSlot)> {
        let id = selection.id()?;
        self.work_shifts.iter().find_map(|shift| {
            shift
                .time_slots
                .iter()
                .find(|slot| slot.id == id)
                .map(|slot| (shift, slot))
        })
    }

    /// True until the first real catalog has been installed
    pub fn is_placeholder(&self) -> bool {
        self.ticket_options.is_empty()
            && self.beverage_options.is_empty()
            && self.food_options.is_empty()
    }
}

impl TicketOption {
    pub fn is_sold_out(&self) -> bool {
        self.amount > 0 && self.num_booked >= self.amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "ticket_options": [{"id": 1, "title": "Weekend", "price": 20.0, "amount": 2, "num_booked": 2}],
        "beverage_options": [{"id": 4, "title": "Flatrate", "description": "", "price": 5}],
        "food_options": [],
        "work_shifts": [{"id": 9, "title": "Bar", "description": "",
            "time_slots": [{"id": 31, "title": "Fr 18-22", "start_time": "18:00", "end_time": "22:00", "num_needed": 3}]}]
    }"#;

    #[test]
    fn test_parses_service_catalog() {
        let content: FormContent = serde_json::from_str(CATALOG).unwrap();
        assert_eq!(content.ticket_options.len(), 1);
        assert!(content.materials.is_empty());
        assert!(content.artist_materials.is_empty());
        assert_eq!(content.beverage_options[0].price, 5.0);
    }

    #[test]
    fn test_lookup_by_selection() {
        let content: FormContent = serde_json::from_str(CATALOG).unwrap();
        assert_eq!(content.ticket(Selection::Selected(1)).unwrap().title, "Weekend");
        assert!(content.ticket(Selection::Unselected).is_none());
        assert!(content.beverage(Selection::Selected(99)).is_none());

        let (shift, slot) = content.time_slot(Selection::Selected(31)).unwrap();
        assert_eq!(shift.title, "Bar");
        assert_eq!(slot.start_time, "18:00");
    }

    #[test]
    fn test_sold_out() {
        let content: FormContent = serde_json::from_str(CATALOG).unwrap();
        assert!(content.ticket_options[0].is_sold_out());
        assert!(!content.is_placeholder());
        assert!(FormContent::default().is_placeholder());
    }
}
