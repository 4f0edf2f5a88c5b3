//! Cross-type value ordering, as the store sorts values in queries
//!
//! Values of different kinds sort by kind: null, booleans, numbers,
//! timestamps, strings, bytes, references, geopoints, arrays, maps.
//! Integers and doubles share one numeric order, with NaN first.

use super::types::StoreValue;
use std::cmp::Ordering;

fn kind_rank(value: &StoreValue) -> u8 {
    match value {
        StoreValue::Null => 0,
        StoreValue::Boolean(_) => 1,
        StoreValue::Integer(_) | StoreValue::Double(_) => 2,
        StoreValue::Timestamp(_) | StoreValue::ServerTimestamp => 3,
        StoreValue::String(_) => 4,
        StoreValue::Bytes(_) => 5,
        StoreValue::Reference(_) => 6,
        StoreValue::GeoPoint(_) => 7,
        StoreValue::Array(_) => 8,
        StoreValue::Map(_) => 9,
        StoreValue::Other(_) => 10,
    }
}

/// Compare two values the way the store orders them
pub fn store_cmp(a: &StoreValue, b: &StoreValue) -> Ordering {
    let by_kind = kind_rank(a).cmp(&kind_rank(b));
    if by_kind != Ordering::Equal {
        return by_kind;
    }

    match (a, b) {
        (StoreValue::Boolean(x), StoreValue::Boolean(y)) => x.cmp(y),
        (StoreValue::Integer(x), StoreValue::Integer(y)) => x.cmp(y),
        (StoreValue::Integer(x), StoreValue::Double(y)) => cmp_f64(*x as f64, *y),
        (StoreValue::Double(x), StoreValue::Integer(y)) => cmp_f64(*x, *y as f64),
        (StoreValue::Double(x), StoreValue::Double(y)) => cmp_f64(*x, *y),
        (StoreValue::Timestamp(x), StoreValue::Timestamp(y)) => x.cmp(y),
        // Pending server timestamps resolve to "now", after anything stored
        (StoreValue::Timestamp(_), StoreValue::ServerTimestamp) => Ordering::Less,
        (StoreValue::ServerTimestamp, StoreValue::Timestamp(_)) => Ordering::Greater,
        (StoreValue::String(x), StoreValue::String(y)) => x.cmp(y),
        (StoreValue::Bytes(x), StoreValue::Bytes(y)) => x.cmp(y),
        (StoreValue::Reference(x), StoreValue::Reference(y)) => cmp_paths(&x.path, &y.path),
        (StoreValue::GeoPoint(x), StoreValue::GeoPoint(y)) => cmp_f64(x.latitude, y.latitude)
            .then_with(|| cmp_f64(x.longitude, y.longitude)),
        (StoreValue::Array(x), StoreValue::Array(y)) => {
            for (left, right) in x.iter().zip(y) {
                let ord = store_cmp(left, right);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (StoreValue::Map(x), StoreValue::Map(y)) => {
            for ((lk, lv), (rk, rv)) in x.iter().zip(y) {
                let ord = lk.cmp(rk).then_with(|| store_cmp(lv, rv));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (StoreValue::Other(x), StoreValue::Other(y)) => x.repr.cmp(&y.repr),
        _ => Ordering::Equal,
    }
}

/// Paths compare segment by segment, not as flat strings
fn cmp_paths(a: &str, b: &str) -> Ordering {
    a.split('/').cmp(b.split('/'))
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Whether two values fall in the same ordering class.
///
/// Range filters only match values of the filter value's class.
pub fn same_kind(a: &StoreValue, b: &StoreValue) -> bool {
    kind_rank(a) == kind_rank(b)
}
