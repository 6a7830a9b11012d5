//! Weather snapshot -> speed recommendation.
//!
//! Adjustments are applied multiplicatively in a fixed order (wind, waves,
//! current) and only the final values are rounded.

use crate::error::AdvisoryError;
use crate::model::{SpeedRecommendation, WeatherConditions};

pub const DEFAULT_BASELINE_KNOTS: f64 = 12.0;

const HIGH_WIND_MPS: f64 = 15.0;
const CALM_WIND_MPS: f64 = 5.0;
const HIGH_WAVES_M: f64 = 3.0;
const CURRENT_EFFECT_MPS: f64 = 0.5;

const HIGH_WIND_FACTOR: f64 = 0.85;
const CALM_FACTOR: f64 = 1.10;
const HIGH_WAVES_FACTOR: f64 = 0.80;
const FAVORABLE_CURRENT_FACTOR: f64 = 1.05;
const ADVERSE_CURRENT_FACTOR: f64 = 0.95;

/// Derives a recommendation from `baseline_knots` and the day's weather.
///
/// The current is resolved against a 0 deg heading, whatever the vessel's
/// actual heading is.
pub fn recommend_speed(
    baseline_knots: f64,
    conditions: &WeatherConditions,
) -> Result<SpeedRecommendation, AdvisoryError> {
    if !baseline_knots.is_finite() || baseline_knots < 0.0 {
        return Err(AdvisoryError::InvalidBaseline(baseline_knots));
    }

    let mut speed = baseline_knots;
    let mut fuel_savings = 0.0_f64;
    let mut time_impact = 0.0_f64;
    let mut reasoning = String::from("Normal conditions");

    if conditions.wind_speed_mps > HIGH_WIND_MPS {
        speed *= HIGH_WIND_FACTOR;
        fuel_savings = 12.0;
        time_impact = 2.0;
        reasoning = String::from("Reduced speed due to high winds for fuel efficiency and safety");
    } else if conditions.wind_speed_mps < CALM_WIND_MPS {
        speed *= CALM_FACTOR;
        fuel_savings = -5.0;
        time_impact = -1.0;
        reasoning = String::from("Increased speed in calm conditions");
    }

    if conditions.wave_height_m > HIGH_WAVES_M {
        speed *= HIGH_WAVES_FACTOR;
        fuel_savings += 15.0;
        time_impact += 3.0;
        reasoning.push_str(". High waves require speed reduction");
    }

    let current_effect =
        conditions.current_speed_mps * conditions.current_direction_deg.to_radians().cos();

    if current_effect > CURRENT_EFFECT_MPS {
        speed *= FAVORABLE_CURRENT_FACTOR;
        fuel_savings += 3.0;
        time_impact -= 0.5;
    } else if current_effect < -CURRENT_EFFECT_MPS {
        speed *= ADVERSE_CURRENT_FACTOR;
        fuel_savings += 2.0;
        time_impact += 0.5;
    }

    Ok(SpeedRecommendation {
        baseline_knots,
        recommended_knots: round_tenths(speed).max(0.0),
        fuel_savings_pct: fuel_savings.round() as i32,
        time_impact_hours: round_tenths(time_impact),
        reasoning,
        conditions: *conditions,
    })
}

fn round_tenths(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather(wind: f64, waves: f64, current: f64, direction: f64) -> WeatherConditions {
        WeatherConditions {
            wind_speed_mps: wind,
            wave_height_m: waves,
            current_speed_mps: current,
            current_direction_deg: direction,
        }
    }

    #[test]
    fn high_wind_alone() {
        let rec = recommend_speed(12.0, &weather(20.0, 1.0, 0.0, 0.0)).unwrap();

        assert_eq!(rec.recommended_knots, 10.2);
        assert_eq!(rec.fuel_savings_pct, 12);
        assert_eq!(rec.time_impact_hours, 2.0);
        assert_eq!(
            rec.reasoning,
            "Reduced speed due to high winds for fuel efficiency and safety"
        );
    }

    #[test]
    fn wind_waves_and_favorable_current_compound() {
        let rec = recommend_speed(12.0, &weather(20.0, 4.0, 0.8, 0.0)).unwrap();

        assert_eq!(rec.recommended_knots, 8.6);
        assert_eq!(rec.fuel_savings_pct, 30);
        assert_eq!(rec.time_impact_hours, 4.5);
        assert!(rec.reasoning.ends_with(". High waves require speed reduction"));
    }

    #[test]
    fn calm_conditions_speed_up() {
        let rec = recommend_speed(12.0, &weather(3.0, 1.0, 0.2, 0.0)).unwrap();

        assert_eq!(rec.recommended_knots, 13.2);
        assert_eq!(rec.fuel_savings_pct, -5);
        assert_eq!(rec.time_impact_hours, -1.0);
        assert_eq!(rec.reasoning, "Increased speed in calm conditions");
    }

    #[test]
    fn moderate_wind_leaves_speed_unchanged() {
        let rec = recommend_speed(12.0, &weather(10.0, 2.0, 0.4, 0.0)).unwrap();

        assert_eq!(rec.recommended_knots, 12.0);
        assert_eq!(rec.fuel_savings_pct, 0);
        assert_eq!(rec.time_impact_hours, 0.0);
        assert_eq!(rec.reasoning, "Normal conditions");
    }

    #[test]
    fn current_from_the_south_is_adverse() {
        let rec = recommend_speed(12.0, &weather(10.0, 2.0, 0.8, 180.0)).unwrap();

        assert_eq!(rec.recommended_knots, 11.4);
        assert_eq!(rec.fuel_savings_pct, 2);
        assert_eq!(rec.time_impact_hours, 0.5);
    }

    #[test]
    fn crosswise_current_has_no_effect() {
        let rec = recommend_speed(12.0, &weather(10.0, 2.0, 1.3, 90.0)).unwrap();
        assert_eq!(rec.recommended_knots, 12.0);
    }

    #[test]
    fn identical_inputs_give_identical_outputs() {
        let conditions = weather(16.3, 3.4, 0.9, 200.0);
        let a = recommend_speed(14.5, &conditions).unwrap();
        let b = recommend_speed(14.5, &conditions).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn result_is_non_negative_with_one_decimal() {
        for wind in [0.0, 4.9, 5.0, 15.0, 15.1, 40.0] {
            for waves in [0.0, 3.0, 3.1, 9.0] {
                for (current, direction) in [(0.0, 0.0), (1.0, 0.0), (1.0, 180.0), (1.0, 45.0)] {
                    for baseline in [0.0, 7.3, 12.0, 22.75] {
                        let rec =
                            recommend_speed(baseline, &weather(wind, waves, current, direction))
                                .unwrap();
                        let tenths = rec.recommended_knots * 10.0;

                        assert!(rec.recommended_knots >= 0.0);
                        assert!((tenths - tenths.round()).abs() < 1e-9);
                    }
                }
            }
        }
    }

    #[test]
    fn rejects_negative_or_non_finite_baseline() {
        let conditions = weather(10.0, 1.0, 0.0, 0.0);

        assert!(matches!(
            recommend_speed(-1.0, &conditions),
            Err(AdvisoryError::InvalidBaseline(_))
        ));
        assert!(recommend_speed(f64::INFINITY, &conditions).is_err());
    }
}
