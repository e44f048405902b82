//! Year-fraction time helpers shared by the market and the curves

/// Days per year used for all year-fraction conversions
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Apply the time stretch transform to a year-fraction
///
/// Larger stretch constants flatten the curve's rate sensitivity.
pub fn stretch_time(time: f64, time_stretch: f64) -> f64 {
    time / time_stretch
}

pub fn days_to_years(days: f64) -> f64 {
    days / DAYS_PER_YEAR
}

/// Year-fraction left on a bond minted at `mint_time`, clamped to `[0, token_duration]`
pub fn time_remaining(token_duration: f64, mint_time: f64, current_time: f64) -> f64 {
    let elapsed = current_time - mint_time;
    (token_duration - elapsed).clamp(0.0, token_duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stretch_shrinks_time() {
        let stretched = stretch_time(0.25, 22.186877016851916);
        assert!((stretched - 0.25 / 22.186877016851916).abs() < 1e-15);
        assert_eq!(stretch_time(0.25, 1.0), 0.25);
    }

    #[test]
    fn test_time_remaining_clamps() {
        assert_eq!(time_remaining(0.5, 0.0, 0.0), 0.5);
        assert!((time_remaining(0.5, 0.1, 0.3) - 0.3).abs() < 1e-12);
        // matured bonds have nothing left
        assert_eq!(time_remaining(0.5, 0.0, 2.0), 0.0);
        // clock moved backwards past the mint time
        assert_eq!(time_remaining(0.5, 1.0, 0.0), 0.5);
    }

    #[test]
    fn test_days_to_years() {
        assert!((days_to_years(73.0) - 0.2).abs() < 1e-12);
    }
}
