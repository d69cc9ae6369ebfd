use serde::{Deserialize, Serialize};

use super::model::{ConcentrationSeries, MeasurementSeries, Variant};
use crate::error::CalibrationError;

// ---------------------------------------------------------------------------
// Calibration constants
// ---------------------------------------------------------------------------

/// Adjustable calibration constants, loaded from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// µM per volt. Temporary placeholder: 1 V -> 10000 µM.
    pub gain: f64,
    /// µA per µM, from the offline regression against reference samples.
    pub slope: f64,
    /// µA at zero concentration.
    pub intercept: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        CalibrationConfig {
            gain: 10_000.0,
            slope: 1.0,
            intercept: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Calibration model
// ---------------------------------------------------------------------------

/// Maps a raw instrument reading to a concentration (µM).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Calibration {
    /// `concentration = voltage * gain`
    LinearVoltage { gain: f64 },
    /// `concentration = (peak_current - intercept) / slope`
    CurrentIntercept { slope: f64, intercept: f64 },
}

impl Calibration {
    pub fn linear_voltage(gain: f64) -> Result<Self, CalibrationError> {
        if !gain.is_finite() || gain == 0.0 {
            return Err(CalibrationError::Configuration(format!(
                "gain must be finite and non-zero, got {gain}"
            )));
        }
        Ok(Calibration::LinearVoltage { gain })
    }

    pub fn current_intercept(slope: f64, intercept: f64) -> Result<Self, CalibrationError> {
        if slope == 0.0 {
            return Err(CalibrationError::Configuration(
                "slope must be non-zero".to_string(),
            ));
        }
        if !slope.is_finite() || !intercept.is_finite() {
            return Err(CalibrationError::Configuration(format!(
                "slope and intercept must be finite, got slope={slope} intercept={intercept}"
            )));
        }
        Ok(Calibration::CurrentIntercept { slope, intercept })
    }

    /// The model used for a format variant.
    pub fn for_variant(variant: Variant, config: &CalibrationConfig) -> Result<Self, CalibrationError> {
        match variant {
            Variant::Structured => Self::linear_voltage(config.gain),
            Variant::Delimited => Self::current_intercept(config.slope, config.intercept),
        }
    }

    /// Concentration for a single reading (volts or µA, per model).
    pub fn estimate_concentration(&self, reading: f64) -> f64 {
        match *self {
            Calibration::LinearVoltage { gain } => reading * gain,
            Calibration::CurrentIntercept { slope, intercept } => (reading - intercept) / slope,
        }
    }

    /// Apply the model to every voltage in a time/voltage series.
    pub fn apply(&self, series: &MeasurementSeries) -> ConcentrationSeries {
        let (time, values): (Vec<f64>, Vec<f64>) = series
            .samples
            .iter()
            .filter_map(|s| Some((s.time?, self.estimate_concentration(s.voltage?))))
            .unzip();
        ConcentrationSeries { time, values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::RawSample;

    #[test]
    fn voltage_gain_scales_linearly() {
        let cal = Calibration::linear_voltage(10_000.0).unwrap();
        assert_eq!(cal.estimate_concentration(0.25), 2500.0);
        assert_eq!(cal.estimate_concentration(-0.5), -5000.0);
    }

    #[test]
    fn current_intercept_round_trips() {
        let (slope, intercept) = (0.042, -0.37);
        let cal = Calibration::current_intercept(slope, intercept).unwrap();
        for c in [0.0, 1.5, 25.0, 250.0, -3.0, 1.0e4] {
            let reading = slope * c + intercept;
            let back = cal.estimate_concentration(reading);
            assert!((back - c).abs() < 1e-9 * c.abs().max(1.0), "{c} -> {back}");
        }
    }

    #[test]
    fn zero_slope_is_a_configuration_error() {
        let err = Calibration::current_intercept(0.0, 1.0).unwrap_err();
        assert!(matches!(err, CalibrationError::Configuration(_)));
        assert!(Calibration::current_intercept(f64::NAN, 0.0).is_err());
        assert!(Calibration::current_intercept(1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn degenerate_gain_is_rejected() {
        assert!(Calibration::linear_voltage(0.0).is_err());
        assert!(Calibration::linear_voltage(f64::INFINITY).is_err());
    }

    #[test]
    fn for_variant_picks_model() {
        let config = CalibrationConfig::default();
        assert_eq!(
            Calibration::for_variant(Variant::Structured, &config).unwrap(),
            Calibration::LinearVoltage { gain: 10_000.0 }
        );
        let bad = CalibrationConfig { slope: 0.0, ..config };
        assert!(Calibration::for_variant(Variant::Delimited, &bad).is_err());
        // gain is irrelevant to the delimited model
        let bad_gain = CalibrationConfig { gain: 0.0, ..config };
        assert!(Calibration::for_variant(Variant::Delimited, &bad_gain).is_ok());
    }

    #[test]
    fn apply_keeps_series_length() {
        let series = MeasurementSeries::new(vec![
            RawSample::timed(0.0, 0.001, 0),
            RawSample::timed(0.5, 0.002, 0),
            RawSample::timed(1.0, 0.003, 0),
        ]);
        let conc = Calibration::linear_voltage(10_000.0).unwrap().apply(&series);
        assert_eq!(conc.len(), 3);
        assert_eq!(conc.time, vec![0.0, 0.5, 1.0]);
        assert!((conc.values[2] - 30.0).abs() < 1e-9);
    }
}
