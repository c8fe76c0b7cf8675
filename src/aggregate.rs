//! Aggregations over the loaded table: per-city sums, per-city statistics and
//! the per-city/per-year mean pivot.

use crate::error::{DashError, DashResult};
use crate::stats::{describe, Describe};
use crate::types::{Table, CITY_COLUMN, VALUE_COLUMN, YEAR_COLUMN};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CitySum {
    pub city: String,
    pub total: f64,
}

/// One `(ano, Valor)` point for the selected city
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearPoint {
    pub year: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearMean {
    pub year: String,
    pub mean: f64,
}

/// Statistics of a single year column of the pivot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearStats {
    pub year: String,
    #[serde(flatten)]
    pub stats: Describe,
}

/// Mean `Valor` per year for one city, years in ascending text order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearPivot {
    pub city: String,
    pub years: Vec<YearMean>,
}

impl YearPivot {
    /// Statistics over the series of per-year means
    pub fn describe(&self) -> Describe {
        let means: Vec<f64> = self.years.iter().map(|y| y.mean).collect();
        describe(&means)
    }

    /// Statistics of each year column taken on its own. With a single city
    /// each column holds one mean, so `count` is 1 and `std` is NaN.
    pub fn describe_by_year(&self) -> Vec<YearStats> {
        self.years
            .iter()
            .map(|y| YearStats {
                year: y.year.clone(),
                stats: describe(&[y.mean]),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

struct Columns<'a> {
    cities: &'a [String],
    years: &'a [String],
    values: &'a [f64],
}

fn columns(table: &Table) -> DashResult<Columns<'_>> {
    let cities = table
        .texts(CITY_COLUMN)
        .ok_or_else(|| DashError::UnknownColumn(CITY_COLUMN.to_string()))?;
    let years = table
        .texts(YEAR_COLUMN)
        .ok_or_else(|| DashError::UnknownColumn(YEAR_COLUMN.to_string()))?;
    let values = table
        .numbers(VALUE_COLUMN)
        .ok_or_else(|| DashError::UnknownColumn(VALUE_COLUMN.to_string()))?;
    Ok(Columns {
        cities,
        years,
        values,
    })
}

/// Sum of `Valor` per city, one entry per distinct city ordered by name.
/// NaN values do not contribute.
pub fn sum_by_city(table: &Table) -> DashResult<Vec<CitySum>> {
    let cols = columns(table)?;
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();

    for (city, value) in cols.cities.iter().zip(cols.values) {
        let entry = totals.entry(city.as_str()).or_insert(0.0);
        if !value.is_nan() {
            *entry += value;
        }
    }

    Ok(totals
        .into_iter()
        .map(|(city, total)| CitySum {
            city: city.to_string(),
            total,
        })
        .collect())
}

/// Values of `Valor` for one city, in table order
fn city_values(cols: &Columns<'_>, city: &str) -> Vec<f64> {
    cols.cities
        .iter()
        .zip(cols.values)
        .filter(|(c, _)| c.as_str() == city)
        .map(|(_, v)| *v)
        .collect()
}

/// Descriptive statistics of `Valor` for one city. Unknown or empty cities
/// give an empty result, not an error.
pub fn city_stats(table: &Table, city: &str) -> DashResult<Describe> {
    let cols = columns(table)?;
    Ok(describe(&city_values(&cols, city)))
}

/// `(ano, Valor)` points for one city in table order
pub fn city_series(table: &Table, city: &str) -> DashResult<Vec<YearPoint>> {
    let cols = columns(table)?;
    Ok(cols
        .cities
        .iter()
        .zip(cols.years.iter().zip(cols.values))
        .filter(|(c, _)| c.as_str() == city)
        .map(|(_, (year, value))| YearPoint {
            year: year.clone(),
            value: *value,
        })
        .collect())
}

/// Mean `Valor` per year for one city. Years whose values are all NaN are
/// left out, as a mean pivot drops them.
pub fn year_pivot(table: &Table, city: &str) -> DashResult<YearPivot> {
    let cols = columns(table)?;
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();

    for ((c, year), value) in cols.cities.iter().zip(cols.years).zip(cols.values) {
        if c.as_str() != city || value.is_nan() {
            continue;
        }
        let entry = groups.entry(year.as_str()).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    Ok(YearPivot {
        city: city.to_string(),
        years: groups
            .into_iter()
            .map(|(year, (sum, n))| YearMean {
                year: year.to_string(),
                mean: sum / n as f64,
            })
            .collect(),
    })
}
