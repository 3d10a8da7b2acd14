use std::cmp::Ordering;

use shared::domain::{Entry, SortOrder};

/// Orders by `created_at`, breaking ties by id so that descending is the
/// exact reverse of ascending.
pub fn compare(a: &Entry, b: &Entry, order: SortOrder) -> Ordering {
    let ascending = a
        .created_at
        .cmp(&b.created_at)
        .then_with(|| a.id.cmp(&b.id));
    match order {
        SortOrder::Ascending => ascending,
        SortOrder::Descending => ascending.reverse(),
    }
}

pub fn sort_entries(entries: &mut [Entry], order: SortOrder) {
    entries.sort_by(|a, b| compare(a, b, order));
}

pub fn sorted(entries: impl IntoIterator<Item = Entry>, order: SortOrder) -> Vec<Entry> {
    let mut entries: Vec<Entry> = entries.into_iter().collect();
    sort_entries(&mut entries, order);
    entries
}
