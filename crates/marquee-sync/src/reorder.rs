//! Reorder resolution: local splice plus the order mapping sent upstream.

use marquee_core::{Error, Ordered, OrderMapping, Result};

/// Result of resolving a reorder gesture: the rows in their new order with
/// orders reassigned densely, and the one-based position map the server is
/// asked to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderPlan<T> {
    pub items: Vec<T>,
    pub mapping: OrderMapping,
}

/// Resolve moving the row at `source` to `destination` within one page.
///
/// Both indices address the page's current row order. Returns `Ok(None)`
/// when the indices are equal: nothing changes and nothing should reach
/// the server. Out-of-bounds indices and rows from mixed parent scopes are
/// rejected before anything is patched.
pub fn resolve_move<T: Ordered>(
    items: &[T],
    source: usize,
    destination: usize,
) -> Result<Option<ReorderPlan<T>>> {
    if source == destination {
        return Ok(None);
    }
    let len = items.len();
    if source >= len || destination >= len {
        return Err(Error::InvalidReorder(format!(
            "Move from {source} to {destination} is outside 0..{len}"
        )));
    }
    if let Some(first) = items.first() {
        let scope = first.scope();
        if items.iter().any(|item| item.scope() != scope) {
            return Err(Error::InvalidReorder(
                "Rows belong to more than one parent scope".into(),
            ));
        }
    }

    let mut rows = items.to_vec();
    let moved = rows.remove(source);
    rows.insert(destination, moved);

    let mut mapping = OrderMapping::new();
    let items = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let position = index as i64 + 1;
            mapping.set(row.id(), position);
            row.with_order(position)
        })
        .collect();

    Ok(Some(ReorderPlan { items, mapping }))
}

/// Sort rows by a possibly-partial mapping.
///
/// Mapped rows take their mapped position, unmapped rows keep their stored
/// order, and ties preserve the rows' current relative order.
pub fn merge_mapping<T: Ordered>(items: &[T], mapping: &OrderMapping) -> Vec<T> {
    let mut rows: Vec<T> = items
        .iter()
        .map(|item| match mapping.position(item.id()) {
            Some(position) => item.with_order(position),
            None => item.clone(),
        })
        .collect();
    rows.sort_by_key(Ordered::order);
    rows
}
