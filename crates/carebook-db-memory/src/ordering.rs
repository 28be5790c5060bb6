//! Row ordering that matches the hosted backend closely enough for tests.
//!
//! Strings that parse as RFC 3339 timestamps or as `H:MM[:SS]` clock times
//! compare chronologically. Other strings compare lexically and numbers
//! numerically. Missing and `null` values sort as larger than everything else
//! (nulls last ascending, first descending).

use std::cmp::Ordering;

use carebook_storage::{SortKey, SortOrder};
use serde_json::Value;
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, Time};

const CLOCK_HM: &[BorrowedFormatItem<'static>] =
    format_description!("[hour padding:none]:[minute]");
const CLOCK_HMS: &[BorrowedFormatItem<'static>] =
    format_description!("[hour padding:none]:[minute]:[second]");

pub(crate) fn compare_rows(a: &Value, b: &Value, keys: &[SortKey]) -> Ordering {
    for key in keys {
        let ord = compare_values(a.get(&key.column), b.get(&key.column));
        let ord = match key.order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::String(a)), Some(Value::String(b))) => compare_strings(a, b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            let a = a.as_f64().unwrap_or(f64::NAN);
            let b = b.as_f64().unwrap_or(f64::NAN);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (Some(a), Some(b)) => a.to_string().cmp(&b.to_string()),
    }
}

fn compare_strings(a: &str, b: &str) -> Ordering {
    match (
        OffsetDateTime::parse(a, &Rfc3339),
        OffsetDateTime::parse(b, &Rfc3339),
    ) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => match (clock_time(a), clock_time(b)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => a.cmp(b),
        },
    }
}

fn clock_time(value: &str) -> Option<Time> {
    Time::parse(value, CLOCK_HMS)
        .or_else(|_| Time::parse(value, CLOCK_HM))
        .ok()
}
