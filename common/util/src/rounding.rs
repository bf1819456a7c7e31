/// Round a value to the given number of decimal places, halves are rounded away from zero.
///
/// Non-finite values are returned unchanged.
pub fn round_to_decimals(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round() / factor
}
