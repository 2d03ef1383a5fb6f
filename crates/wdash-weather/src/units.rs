//! Temperature conversion for display.

use crate::types::TemperatureUnit;

/// Convert a Celsius reading to a whole number in `unit`.
///
/// Halves round up (`-0.5` becomes `0`), so the result is monotonic in `temp_c`.
pub fn to_display(temp_c: f64, unit: TemperatureUnit) -> i64 {
    let value = match unit {
        TemperatureUnit::Celsius => temp_c,
        TemperatureUnit::Fahrenheit => temp_c * 9.0 / 5.0 + 32.0,
    };
    (value + 0.5).floor() as i64
}

pub fn unit_label(unit: TemperatureUnit) -> &'static str {
    match unit {
        TemperatureUnit::Celsius => "°C",
        TemperatureUnit::Fahrenheit => "°F",
    }
}
