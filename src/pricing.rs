//! Total price of a booking.
//!
//! The total is always recomputed from the complete selection set so that
//! switching between priced options can never leave a stale charge behind.

use crate::booking::Booking;
use crate::content::FormContent;
use crate::wizard::Variant;

/// Food option titles containing this marker are the paid "both meals" bundle
pub const BOTH_MEALS_MARKER: &str = "Beide Essen";

/// Price of the current selections under the variant's rules
pub fn total_price(variant: Variant, booking: &Booking, content: &FormContent) -> f64 {
    match variant {
        Variant::Attendee => attendee_total(booking, content),
        Variant::Artist => artist_total(booking, content),
    }
}

fn attendee_total(booking: &Booking, content: &FormContent) -> f64 {
    let ticket = content.ticket(booking.ticket).map_or(0.0, |t| t.price);
    let beverage = content.beverage(booking.beverage).map_or(0.0, |b| b.price);
    let food = content.food(booking.food).map_or(0.0, |f| f.price);
    ticket + beverage + food
}

// Tickets and beverages are free for artists, the first meal too
fn artist_total(booking: &Booking, content: &FormContent) -> f64 {
    content
        .food(booking.food)
        .filter(|food| food.title.contains(BOTH_MEALS_MARKER))
        .map_or(0.0, |food| food.price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::Selection;
    use crate::content::{PricedOption, TicketOption};

    fn priced(id: u32, title: &str, price: f64) -> PricedOption {
        PricedOption {
            id,
            title: title.to_string(),
            description: String::new(),
            price,
            num_booked: 0,
        }
    }

    fn content() -> FormContent {
        FormContent {
            ticket_options: vec![TicketOption {
                id: 1,
                title: "Wochenende".to_string(),
                description: String::new(),
                price: 20.0,
                amount: 100,
                num_booked: 0,
            }],
            beverage_options: vec![priced(1, "Getränkeflat", 5.0)],
            food_options: vec![
                priced(1, "Ein Essen", 8.0),
                priced(2, "Beide Essen (Sa + So)", 12.0),
                priced(3, "Beide Essen vegan", 14.0),
            ],
            ..FormContent::default()
        }
    }

    #[test]
    fn test_attendee_sums_selected_options() {
        let mut booking = Booking::default();
        booking.ticket = Selection::Selected(1);
        booking.beverage = Selection::Selected(1);
        assert_eq!(total_price(Variant::Attendee, &booking, &content()), 25.0);

        booking.food = Selection::Selected(1);
        assert_eq!(total_price(Variant::Attendee, &booking, &content()), 33.0);
    }

    #[test]
    fn test_sentinels_and_unknown_ids_contribute_nothing() {
        let mut booking = Booking::default();
        assert_eq!(total_price(Variant::Attendee, &booking, &content()), 0.0);

        booking.ticket = Selection::Selected(42);
        assert_eq!(total_price(Variant::Attendee, &booking, &content()), 0.0);
    }

    #[test]
    fn test_artist_tickets_and_beverages_are_free() {
        let mut booking = Booking::default();
        booking.ticket = Selection::Selected(1);
        booking.beverage = Selection::Selected(1);
        assert_eq!(total_price(Variant::Artist, &booking, &content()), 0.0);

        booking.food = Selection::Selected(1);
        assert_eq!(total_price(Variant::Artist, &booking, &content()), 0.0);
    }

    #[test]
    fn test_artist_pays_only_for_both_meals() {
        let mut booking = Booking::default();
        booking.food = Selection::Selected(2);
        assert_eq!(total_price(Variant::Artist, &booking, &content()), 12.0);

        // switching between two priced bundles charges only the new one
        booking.food = Selection::Selected(3);
        assert_eq!(total_price(Variant::Artist, &booking, &content()), 14.0);

        booking.food = Selection::Unselected;
        assert_eq!(total_price(Variant::Artist, &booking, &content()), 0.0);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut booking = Booking::default();
        booking.ticket = Selection::Selected(1);
        booking.food = Selection::Selected(3);
        let catalog = content();
        for variant in [Variant::Attendee, Variant::Artist] {
            assert_eq!(
                total_price(variant, &booking, &catalog),
                total_price(variant, &booking, &catalog)
            );
        }
    }
}
