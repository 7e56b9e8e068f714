//! FILENAME: tests/common/mod.rs
//! Fixtures and helpers for grid-api integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;

use grid_api::{GridApi, GridOptions, GridView};
use grid_api::grid_engine::{
    record, AggregationType, ColumnDef, ColumnDefaults, FilterType, GroupViewRow, Row, RowView, Value,
};

pub type Rec = BTreeMap<String, Value>;

// ============================================================================
// FIXTURES
// ============================================================================

/// A small car sales data set.
pub struct CarFixture;

impl CarFixture {
    pub fn headers() -> Vec<&'static str> {
        vec!["Make", "Model", "Year", "Price", "Sold"]
    }

    pub fn data() -> Vec<(&'static str, &'static str, i64, f64, &'static str)> {
        vec![
            ("Ford", "Focus", 2020, 18000.0, "2024-01-15"),
            ("Ford", "Mustang", 2021, 42000.0, "2024-02-03"),
            ("VW", "Golf", 2020, 21000.0, "2024-01-20"),
            ("VW", "Polo", 2021, 16000.0, "2024-03-11"),
            ("Audi", "A4", 2021, 39000.0, "2024-02-28"),
            ("Toyota", "Corolla", 2020, 19500.0, "2024-03-30"),
        ]
    }

    pub fn rows() -> Vec<Rec> {
        Self::data()
            .into_iter()
            .map(|(make, model, year, price, sold)| {
                record([
                    ("make", Value::from(make)),
                    ("model", Value::from(model)),
                    ("year", Value::from(year)),
                    ("price", Value::from(price)),
                    ("sold", Value::from(sold)),
                ])
            })
            .collect()
    }

    /// Column set: everything sortable through the grid defaults except
    /// `model`, `price` summed when aggregated.
    pub fn columns() -> Vec<ColumnDef<Rec>> {
        vec![
            ColumnDef::new("make").with_header("Make").with_filter(FilterType::Text),
            ColumnDef::new("model").with_header("Model").sortable(false),
            ColumnDef::new("year").with_header("Year").with_filter(FilterType::Number),
            ColumnDef::new("price")
                .with_header("Price")
                .with_filter(FilterType::Number)
                .with_agg(AggregationType::Sum),
            ColumnDef::new("sold").with_header("Sold").with_filter(FilterType::Date),
        ]
    }

    pub fn options() -> GridOptions<Rec> {
        GridOptions::new().with_default_col_def(ColumnDefaults {
            sortable: Some(true),
            width: Some(160),
            ..Default::default()
        })
    }
}

/// Three rows, two makes: the canonical grouping example.
pub fn scenario_rows() -> Vec<Rec> {
    vec![
        record([("make", Value::from("Ford")), ("price", Value::from(100))]),
        record([("make", Value::from("Ford")), ("price", Value::from(50))]),
        record([("make", Value::from("VW")), ("price", Value::from(80))]),
    ]
}

/// `make` and a sortable `price`.
pub fn scenario_columns() -> Vec<ColumnDef<Rec>> {
    vec![ColumnDef::new("make"), ColumnDef::new("price").sortable(true)]
}

// ============================================================================
// HARNESS
// ============================================================================

/// A grid loaded with the car fixture.
pub fn create_car_grid() -> GridApi<Rec> {
    let mut api = GridApi::new(CarFixture::options());
    api.set_column_defs(CarFixture::columns());
    api.set_row_data(CarFixture::rows());
    api
}

// ============================================================================
// ASSERTION HELPERS
// ============================================================================

/// The values of `field` across the displayed data rows.
pub fn leaf_values(api: &GridApi<Rec>, field: &str) -> Vec<Value> {
    api.leaf_rows()
        .into_iter()
        .map(|row| row.field(field).unwrap_or_default())
        .collect()
}

/// The string forms of `field` across the displayed data rows.
pub fn leaf_strings(api: &GridApi<Rec>, field: &str) -> Vec<String> {
    leaf_values(api, field).iter().map(|v| v.to_string()).collect()
}

/// The group markers of a row view.
pub fn group_markers(api: &GridApi<Rec>) -> Vec<GroupViewRow> {
    match api.view() {
        GridView::Rows(rows) => rows.iter().filter_map(RowView::as_group).cloned().collect(),
        GridView::Pivot(_) => panic!("expected a row view, got a pivot"),
    }
}

/// Assert that a value is a number close to `expected`.
pub fn assert_number(value: &Value, expected: f64) {
    match value {
        Value::Number(n) => assert!(
            (n - expected).abs() < 0.001,
            "expected {} but got {}",
            expected,
            n
        ),
        other => panic!("expected Number({}) but got {:?}", expected, other),
    }
}
