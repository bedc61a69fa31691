//! Deterministic sample values per field kind
//!
//! Repeated runs see identical inputs, so timings are comparable.

use crate::types::FieldKind;
use chrono::{Days, NaiveDate};
use serde_json::{json, Value};

/// Generate `count` sample values of the given kind
pub fn generate_sample_data(kind: FieldKind, count: usize) -> Vec<Value> {
    (0..count).map(|i| sample(kind, i)).collect()
}

fn sample(kind: FieldKind, i: usize) -> Value {
    match kind {
        FieldKind::Text | FieldKind::Title => json!(format!("Texto de ejemplo {}", i + 1)),
        FieldKind::RichText => json!([{ "text": { "content": format!("Texto con formato {}", i + 1) } }]),
        FieldKind::Number => json!(i as f64 * 10.5 + 0.1),
        FieldKind::Date => json!({ "start": day(i) }),
        FieldKind::CreatedTime | FieldKind::LastEditedTime => json!(format!("{}T09:00:00.000Z", day(i))),
        FieldKind::Checkbox => json!(i % 2 == 0),
        FieldKind::Select | FieldKind::Status => json!({ "name": format!("Opción {}", i + 1) }),
        FieldKind::MultiSelect => json!([
            { "name": format!("Opción A{}", i) },
            { "name": format!("Opción B{}", i) }
        ]),
        FieldKind::Url => json!(format!("https://example{}.com", i)),
        FieldKind::Email => json!(format!("usuario{}@example.com", i)),
        FieldKind::PhoneNumber => json!(format!("+34 600 000 {:03}", i % 1000)),
        FieldKind::Person | FieldKind::CreatedBy | FieldKind::LastEditedBy => json!({
            "id": format!("user-{}", i),
            "name": format!("Usuario {}", i + 1)
        }),
        FieldKind::Files => json!([
            { "name": format!("documento{}.pdf", i), "url": format!("https://example.com/documento{}.pdf", i) },
            { "name": format!("imagen{}.jpg", i), "url": format!("https://example.com/imagen{}.jpg", i) }
        ]),
        FieldKind::Image => json!({ "url": format!("https://example.com/imagen{}.jpg", i) }),
        FieldKind::Formula => json!({ "type": "number", "number": i }),
        FieldKind::Relation => json!([{ "id": format!("page-{}", i) }]),
        FieldKind::Rollup => json!({ "type": "number", "number": i * 2 }),
    }
}

/// ISO date `i` days after 2024-01-01
fn day(i: usize) -> String {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|start| start.checked_add_days(Days::new(i as u64)))
        .unwrap_or_default()
        .format("%Y-%m-%d")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_are_deterministic() {
        for kind in FieldKind::ALL {
            assert_eq!(generate_sample_data(kind, 5), generate_sample_data(kind, 5));
            assert_eq!(generate_sample_data(kind, 5).len(), 5);
        }
        assert!(generate_sample_data(FieldKind::Text, 0).is_empty());
    }

    #[test]
    fn test_dates_are_consecutive() {
        let dates = generate_sample_data(FieldKind::Date, 3);
        assert_eq!(dates[0], json!({ "start": "2024-01-01" }));
        assert_eq!(dates[2], json!({ "start": "2024-01-03" }));
        let last = generate_sample_data(FieldKind::Date, 32);
        assert_eq!(last[31], json!({ "start": "2024-02-01" }));
    }

    #[test]
    fn test_numbers_follow_progression() {
        let numbers = generate_sample_data(FieldKind::Number, 3);
        assert_eq!(numbers, vec![json!(0.1), json!(10.6), json!(21.1)]);
    }
}
