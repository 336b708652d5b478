mod common;

use datagrid_core::cell::{Alignment, CellData, ErrorCategory};
use datagrid_core::column::{Column, ColumnKind, ColumnProps, SortMode};
use datagrid_core::data::RawValue;
use datagrid_core::source::PhysicalType;
use serde_json::json;

use common::snapshot_from_json;

fn column(kind: ColumnKind, physical: PhysicalType, params: serde_json::Value) -> Column {
    let mut props = ColumnProps::new(0, "col", kind, physical);
    if let serde_json::Value::Object(map) = params {
        props.params.extend(map);
    }
    Column::new(props)
}

#[test]
fn number_min_rejects_while_max_clamps() {
    let col = column(
        ColumnKind::Number,
        PhysicalType::Float64,
        json!({"min_value": 0, "max_value": 10}),
    );

    let below = col.encode(&RawValue::Float(-0.5), true);
    assert!(below.is_error());
    assert!(below.error_details().unwrap().contains("minimum allowed value (0)"));

    let above = col.encode(&RawValue::Float(12.5), true);
    assert_eq!(above.data(), Some(&CellData::Number(10.0)));

    // Without validation both bounds are ignored.
    assert_eq!(
        col.encode(&RawValue::Float(-0.5), false).data(),
        Some(&CellData::Number(-0.5))
    );
}

#[test]
fn number_columns_truncate_to_step_and_guard_safe_integers() {
    let ints = column(ColumnKind::Number, PhysicalType::Int32, json!({}));
    assert_eq!(ints.encode(&RawValue::from("7.9"), true).display(), "7");
    assert_eq!(ints.encode(&RawValue::from("-7.9"), true).display(), "-7");
    assert_eq!(ints.decode(&ints.encode(&RawValue::from("2k"), true)), Some(json!(2000)));
    assert!(ints.encode(&RawValue::BigInt(1 << 60), true).is_error());

    let cents = column(
        ColumnKind::Number,
        PhysicalType::Float64,
        json!({"step": 0.01, "format": "%.2f"}),
    );
    assert_eq!(cents.encode(&RawValue::Float(3.14159), true).display(), "3.14");
    assert_eq!(cents.sort_mode(), SortMode::Smart);
    assert_eq!(cents.alignment(), Some(Alignment::Right));
}

#[test]
fn unsupported_number_formats_become_error_cells() {
    let col = column(
        ColumnKind::Number,
        PhysicalType::Float64,
        json!({"format": "%q"}),
    );
    let cell = col.encode(&RawValue::Float(1.0), false);
    assert!(cell.is_error());
    assert!(cell.error_details().unwrap().contains("%q"));
}

#[test]
fn boolean_and_select_kinds() {
    let flag = column(ColumnKind::Boolean, PhysicalType::Boolean, json!({}));
    assert_eq!(flag.decode(&flag.encode(&RawValue::from("Y"), true)), Some(json!(true)));
    assert_eq!(flag.alignment(), Some(Alignment::Center));

    let size = column(
        ColumnKind::Select,
        PhysicalType::Text,
        json!({"options": ["S", "M", 3]}),
    );
    assert_eq!(size.decode(&size.encode(&RawValue::from("3"), true)), Some(json!(3)));
    assert!(size.encode(&RawValue::from("XL"), true).is_error());
    assert_eq!(size.encode(&RawValue::from("XL"), false).display(), "XL");
    assert!(size.encode(&RawValue::Null, true).is_missing());
}

#[test]
fn text_validation_truncates_and_matches_patterns() {
    let code = column(
        ColumnKind::Text,
        PhysicalType::Text,
        json!({"max_chars": 4, "validate": "^[A-Z]+$"}),
    );
    assert_eq!(code.encode(&RawValue::from("ABCDEF"), true).display(), "ABCD");
    let bad = code.encode(&RawValue::from("ab"), true);
    assert!(bad.is_error());
    // Validation is an edit-time concern; snapshot values pass through.
    assert_eq!(code.encode(&RawValue::from("ab"), false).display(), "ab");

    let broken = column(ColumnKind::Text, PhysicalType::Text, json!({"validate": "("}));
    assert_eq!(broken.encode(&RawValue::from("x("), true).display(), "x(");
}

#[test]
fn list_and_object_kinds() {
    let tags = column(
        ColumnKind::List,
        PhysicalType::List(Box::new(PhysicalType::Text)),
        json!({}),
    );
    let cell = tags.encode(&RawValue::from("a, b ,c"), true);
    assert_eq!(cell.display(), "a, b, c");
    assert_eq!(tags.decode(&cell), Some(json!(["a", "b", "c"])));
    assert_eq!(tags.decode(&tags.encode(&RawValue::from("[1, 2]"), true)), Some(json!([1, 2])));
    assert!(tags.encode(&RawValue::Null, true).is_missing());

    let blob = column(ColumnKind::Object, PhysicalType::Object, json!({}));
    let cell = blob.encode(&RawValue::Json(json!({"a": "x\ny"})), false);
    assert!(!cell.display().contains('\n'));
    assert!(!blob.is_editable());
}

#[test]
fn temporal_kinds_convert_zones_and_bounds() {
    let stamp = column(
        ColumnKind::DateTime,
        PhysicalType::DateTime(Some("+02:00".into())),
        json!({"format": "YYYY-MM-DD HH:mm Z"}),
    );
    let cell = stamp.encode(&RawValue::from("2024-06-01T10:00:00Z"), true);
    assert_eq!(cell.display(), "2024-06-01 12:00 +02:00");
    assert_eq!(
        stamp.decode(&cell),
        Some(json!("2024-06-01T12:00:00.000+02:00"))
    );
    assert_eq!(stamp.sort_mode(), SortMode::Raw);

    let day = column(
        ColumnKind::Date,
        PhysicalType::Date,
        json!({"min_value": "2024-01-01", "max_value": "2024-12-31"}),
    );
    assert!(day.encode(&RawValue::from("2023-12-31"), true).is_error());
    assert!(day.encode(&RawValue::from("2025-01-01"), true).is_error());
    assert_eq!(day.encode(&RawValue::from("2024-02-29"), true).display(), "2024-02-29");

    let clock = column(ColumnKind::Time, PhysicalType::Time, json!({}));
    assert_eq!(
        clock.decode(&clock.encode(&RawValue::from("13:45"), true)),
        Some(json!("13:45:00.000"))
    );
}

#[test]
fn range_and_chart_kinds_are_read_only() {
    let progress = column(
        ColumnKind::Range,
        PhysicalType::Int64,
        json!({}),
    );
    let cell = progress.encode(&RawValue::Int(250), false);
    assert_eq!(
        cell.data(),
        Some(&CellData::Progress {
            value: 100.0,
            min: 0.0,
            max: 100.0
        })
    );
    assert!(!progress.is_editable());

    let inverted = column(
        ColumnKind::Range,
        PhysicalType::Float64,
        json!({"min_value": 5, "max_value": 1}),
    );
    assert!(inverted.encode(&RawValue::Float(2.0), false).is_error());

    let trend = column(ColumnKind::BarChart, PhysicalType::Object, json!({}));
    let cell = trend.encode(&RawValue::from("[2, 4, 6]"), false);
    match cell.data() {
        Some(CellData::Chart { normalized, .. }) => assert_eq!(normalized, &vec![0.0, 0.5, 1.0]),
        other => panic!("expected chart data, got {other:?}"),
    }
    assert_eq!(trend.decode(&cell), Some(json!([2, 4, 6])));
    let bad = trend.encode(&RawValue::from("[1, \"x\"]"), false);
    assert!(bad.is_error());
    assert!(!trend.is_editable());
}

#[test]
fn url_and_image_kinds() {
    let link = column(
        ColumnKind::Url,
        PhysicalType::Text,
        json!({"display_text": "https://(.*?)/"}),
    );
    let cell = link.encode(&RawValue::from("https://example.com/docs"), true);
    assert_eq!(cell.display(), "example.com");
    assert_eq!(link.decode(&cell), Some(json!("https://example.com/docs")));

    let image = column(ColumnKind::Image, PhysicalType::Text, json!({}));
    assert!(!image.is_editable());
    assert!(image.encode(&RawValue::from(""), false).is_missing());
}

#[test]
fn unknown_kinds_fall_back_to_the_physical_default() {
    let col = column(
        ColumnKind::from("sparkles"),
        PhysicalType::Boolean,
        json!({}),
    );
    assert_eq!(col.kind(), ColumnKind::Boolean);
}

#[test]
fn error_categories_distinguish_coercion_from_constraints() {
    use datagrid_core::cell::CellError;
    assert_eq!(
        CellError::NotANumber { input: "x".into() }.category(),
        ErrorCategory::ValueCoercion
    );
    assert_eq!(CellError::Required.category(), ErrorCategory::ConstraintViolation);
    assert_eq!(
        CellError::OutOfBounds { col: 0, row: 0 }.category(),
        ErrorCategory::Structural
    );
}

#[test]
fn configured_kinds_override_physical_defaults() {
    let snapshot = snapshot_from_json(
        r#"{"columns": [{"name": "score", "type": "int64", "values": [3, 7]}]}"#,
        r#"{"score": {"type_config": {"type": "progress", "max_value": 10}}}"#,
    );
    let score = &snapshot.columns()[0];
    assert_eq!(score.kind(), ColumnKind::Range);
    assert_eq!(
        snapshot.cell(0, 1).data(),
        Some(&CellData::Progress {
            value: 7.0,
            min: 0.0,
            max: 10.0
        })
    );
}
