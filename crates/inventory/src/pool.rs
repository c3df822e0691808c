//! Audit pool selection and natural lot ordering.

use core::cmp::Ordering;
use std::collections::BTreeSet;

use crate::session::PairKey;
use crate::stock::StockItem;

/// Ledger items a pair's audit must account for, sorted by lot code.
pub fn audit_pool(items: &[StockItem], pair: &PairKey) -> Vec<StockItem> {
    let mut pool: Vec<StockItem> = items
        .iter()
        .filter(|i| i.is_auditable() && pair.matches(&i.material_type, i.gauge))
        .cloned()
        .collect();
    pool.sort_by(|a, b| natural_cmp(&a.internal_lot, &b.internal_lot));
    pool
}

/// Every pair present among auditable ledger items, in key order.
pub fn distinct_pairs(items: &[StockItem]) -> Vec<PairKey> {
    items
        .iter()
        .filter(|i| i.is_auditable())
        .map(StockItem::pair)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Numeric-aware string comparison: "L2" < "L10".
///
/// Digit runs compare by numeric value (leading zeros ignored, shorter run first
/// on ties); other characters compare case-insensitively.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ai = a.chars().peekable();
    let mut bi = b.chars().peekable();

    loop {
        match (ai.peek().copied(), bi.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let da = take_digits(&mut ai);
                let db = take_digits(&mut bi);
                let ta = da.trim_start_matches('0');
                let tb = db.trim_start_matches('0');
                let ord = ta
                    .len()
                    .cmp(&tb.len())
                    .then_with(|| ta.cmp(tb))
                    .then_with(|| da.len().cmp(&db.len()));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = x.to_lowercase().cmp(y.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                ai.next();
                bi.next();
            }
        }
    }
}

fn take_digits(it: &mut core::iter::Peekable<core::str::Chars<'_>>) -> String {
    let mut out = String::new();
    while let Some(c) = it.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        out.push(c);
        it.next();
    }
    out
}
