//! Magnus-formula dew point approximation.

use micromath::F32Ext;

const MAGNUS_A: f32 = 17.27;
const MAGNUS_B: f32 = 237.7;

/// Dew point in °C for an air temperature in °C and relative humidity in
/// percent.
///
/// Undefined for `humidity_pct <= 0` (the logarithm has no value there);
/// callers validate humidity before calling. At 100 % humidity the dew
/// point equals the air temperature.
pub fn dewpoint(temperature_c: f32, humidity_pct: f32) -> f32 {
    let alpha = (MAGNUS_A * temperature_c) / (MAGNUS_B + temperature_c)
        + F32Ext::ln(humidity_pct / 100.0);
    (MAGNUS_B * alpha) / (MAGNUS_A - alpha)
}

#[cfg(test)]
mod tests {
    use super::dewpoint;

    #[test]
    fn room_air_at_half_saturation() {
        assert!((dewpoint(20.0, 50.0) - 9.26).abs() < 0.1);
    }

    /// At saturation the dew point collapses to the air temperature.
    #[test]
    fn saturated_air_dews_at_air_temperature() {
        for &t in &[-10.0_f32, 0.0, 10.0, 20.0, 35.0] {
            assert!(
                (dewpoint(t, 100.0) - t).abs() < 0.05,
                "dewpoint({t}, 100.0) strayed from {t}"
            );
        }
    }

    #[test]
    fn drier_air_dews_lower() {
        assert!(dewpoint(20.0, 40.0) < dewpoint(20.0, 60.0));
    }
}
