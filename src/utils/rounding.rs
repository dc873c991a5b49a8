/// Rounds `value` to `precision` decimal places, ties toward positive infinity.
///
/// The shift is done on the decimal representation (`"<value>e<precision>"`)
/// rather than by multiplying, so inputs such as `1.005` round to `1.01`
/// instead of falling victim to binary representation error.
pub fn round_half_up(value: f64, precision: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let shifted = shift_decimal(value, precision);
    let rounded = (shifted + 0.5).floor();
    let result = shift_decimal(rounded, -precision);

    // Normalise -0.0 so serialized output never shows "-0".
    if result == 0.0 {
        0.0
    } else {
        result
    }
}

/// Integer percentage of `part` in `total`, 0 when `total` is 0.
pub fn percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    round_half_up(part as f64 / total as f64 * 100.0, 0) as u32
}

fn shift_decimal(value: f64, exponent: i32) -> f64 {
    format!("{value}e{exponent}")
        .parse::<f64>()
        .unwrap_or_else(|_| value * 10f64.powi(exponent))
}
