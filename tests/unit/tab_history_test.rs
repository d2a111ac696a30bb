//! Unit tests for the bounded recency list.

use lasttab::managers::tab_history::TabHistory;
use lasttab::types::tab::TabId;
use rstest::rstest;

fn ids(raw: &[i64]) -> Vec<TabId> {
    raw.iter().copied().map(TabId).collect()
}

#[test]
fn test_new_history_is_empty() {
    let history = TabHistory::default();
    assert!(history.is_empty());
    assert_eq!(history.limit(), 10);
    assert_eq!(history.last_used(None), None);
}

#[test]
fn test_push_front_orders_most_recent_first() {
    let mut history = TabHistory::new(10);
    history.push_front(TabId(1));
    history.push_front(TabId(2));
    history.push_front(TabId(3));
    assert_eq!(history.entries(), ids(&[3, 2, 1]).as_slice());
}

#[test]
fn test_push_front_never_duplicates() {
    let mut history = TabHistory::from_entries(ids(&[3, 2, 1]), 10);
    history.push_front(TabId(2));
    assert_eq!(history.entries(), ids(&[2, 3, 1]).as_slice());
    assert_eq!(history.len(), 3);
}

#[test]
fn test_eleventh_push_drops_oldest() {
    let mut history = TabHistory::new(10);
    for id in 1..=11 {
        history.push_front(TabId(id));
    }
    assert_eq!(history.len(), 10);
    assert!(!history.contains(TabId(1)));
    assert_eq!(history.entries()[0], TabId(11));
}

#[test]
fn test_remove_keeps_relative_order() {
    let mut history = TabHistory::from_entries(ids(&[5, 4, 3, 2]), 10);
    assert!(history.remove(TabId(4)));
    assert_eq!(history.entries(), ids(&[5, 3, 2]).as_slice());
    assert!(!history.remove(TabId(4)));
}

#[rstest]
#[case(&[3, 2, 1], Some(3), Some(2))]
#[case(&[3, 2, 1], Some(7), Some(3))]
#[case(&[3, 2, 1], None, Some(3))]
#[case(&[3], Some(3), None)]
#[case(&[], Some(1), None)]
fn test_last_used_skips_current(
    #[case] entries: &[i64],
    #[case] current: Option<i64>,
    #[case] expected: Option<i64>,
) {
    let history = TabHistory::from_entries(ids(entries), 10);
    assert_eq!(
        history.last_used(current.map(TabId)),
        expected.map(TabId),
        "entries={entries:?} current={current:?}"
    );
}

#[rstest]
#[case(&[1, 2, 1, 3], 10, &[1, 2, 3])]
#[case(&[1, 2, 3, 4, 5], 3, &[1, 2, 3])]
#[case(&[4, 4, 4], 10, &[4])]
#[case(&[1, 1, 2, 2, 3, 3], 2, &[1, 2])]
fn test_from_entries_normalises(
    #[case] stored: &[i64],
    #[case] limit: usize,
    #[case] expected: &[i64],
) {
    let history = TabHistory::from_entries(ids(stored), limit);
    assert_eq!(history.entries(), ids(expected).as_slice());
}
