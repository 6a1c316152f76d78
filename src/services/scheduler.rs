use crate::models::event::Event;

/// Order events by date, earliest first.
///
/// The sort is stable, so events sharing a date keep their relative order.
/// The input is left untouched.
pub fn sort_by_date(events: &[Event]) -> Vec<Event> {
    let mut sorted = events.to_vec();
    sorted.sort_by_key(|event| event.date);
    sorted
}
