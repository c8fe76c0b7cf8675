//! Chart specifications handed to whatever draws them

use crate::aggregate::{CitySum, YearPoint};
use serde::Serialize;

/// Rotation of category labels on the city comparison chart, in degrees
pub const CATEGORY_LABEL_ROTATION: i32 = 45;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Degrees, counter-clockwise
    pub x_label_rotation: i32,
    pub bars: Vec<Bar>,
}

impl BarChart {
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Largest bar value, ignoring NaN
    pub fn max_value(&self) -> Option<f64> {
        self.bars
            .iter()
            .map(|b| b.value)
            .filter(|v| !v.is_nan())
            .reduce(f64::max)
    }
}

/// Sum of `Valor` per city
pub fn city_comparison(sums: &[CitySum]) -> BarChart {
    BarChart {
        title: "Frequency by city".to_string(),
        x_label: "Cities".to_string(),
        y_label: "Frequency".to_string(),
        x_label_rotation: CATEGORY_LABEL_ROTATION,
        bars: sums
            .iter()
            .map(|s| Bar {
                label: s.city.clone(),
                value: s.total,
            })
            .collect(),
    }
}

/// `Valor` by year for one city; one bar per row
pub fn city_by_year(city: &str, points: &[YearPoint]) -> BarChart {
    BarChart {
        title: format!("Valor by year: {}", city),
        x_label: "ano".to_string(),
        y_label: "Valor".to_string(),
        x_label_rotation: 0,
        bars: points
            .iter()
            .map(|p| Bar {
                label: p.year.clone(),
                value: p.value,
            })
            .collect(),
    }
}
