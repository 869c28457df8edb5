use super::*;

fn selectors() -> Vec<(&'static str, usize)> {
    vec![
        ("toString", 0),
        ("add", 2),
        ("add", 1),
        ("valueOf", 0),
        ("add", 3),
        ("clear", 0),
    ]
}

#[test]
fn test_sort_advances_state_once() {
    let mut table = MemberTable::new(selectors());
    assert_eq!(table.state(), MemberState::Unresolved);
    table.sort_by(|a, b| a.0.cmp(b.0).then(a.1.cmp(&b.1)));
    assert_eq!(table.state(), MemberState::Sorted);
    let sorted = Arc::clone(table.items());
    // a second sort is a no-op and keeps the allocation
    table.sort_by(|a, b| b.0.cmp(a.0));
    assert!(Arc::ptr_eq(&sorted, table.items()));
    assert_eq!(sorted[0], ("add", 1));
}

#[test]
fn test_complete_is_idempotent() {
    let mut table = MemberTable::new(selectors());
    table.sort_by(|a, b| a.0.cmp(b.0).then(a.1.cmp(&b.1)));
    let first = table.complete(|item| item.0 != "clear");
    let second = table.complete(|_| false);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.len(), 5);
    assert!(table.is_complete());
}

#[test]
fn test_complete_table_ignores_mutation() {
    let mut table = MemberTable::new(vec![1u32, 2]);
    let frozen = table.complete(|_| true);
    table.extend(&[3]);
    table.replace(vec![9], true);
    assert!(Arc::ptr_eq(&frozen, table.items()));
}

#[test]
fn test_method_range_covers_every_overload() {
    let mut items = selectors();
    items.sort_by(|a, b| a.0.cmp(b.0).then(a.1.cmp(&b.1)));
    let (low, high) = find_method_range(&items, "add", |item| item.0).expect("add present");
    assert_eq!((low, high), (0, 2));
    for (index, item) in items.iter().enumerate() {
        assert_eq!(item.0 == "add", (low..=high).contains(&index));
    }
    assert_eq!(find_method_range(&items, "valueOf", |item| item.0), Some((5, 5)));
    assert_eq!(find_method_range(&items, "missing", |item| item.0), None);
}

#[test]
fn test_method_range_on_empty_slice() {
    let items: Vec<(&str, usize)> = Vec::new();
    assert_eq!(find_method_range(&items, "any", |item| item.0), None);
}

#[test]
fn test_binary_search_by_name() {
    let names = ["a", "c", "e", "g"];
    assert_eq!(binary_search_by_name(&names, "e", |n| *n), Some(2));
    assert_eq!(binary_search_by_name(&names, "d", |n| *n), None);
}
