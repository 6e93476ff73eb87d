use std::ops::RangeInclusive;

use crate::types::Model;

/// Accepted temperature values.
pub const TEMPERATURE_RANGE: RangeInclusive<f32> = 0.2..=2.0;
/// Accepted max output token counts.
pub const MAX_TOKENS_RANGE: RangeInclusive<u32> = 1..=4095;
/// Accepted nucleus sampling values.
pub const TOP_P_RANGE: RangeInclusive<f32> = 0.0..=1.0;
/// Accepted presence penalty values.
pub const PRESENCE_PENALTY_RANGE: RangeInclusive<f32> = 0.0..=2.0;
/// Accepted frequency penalty values.
pub const FREQUENCY_PENALTY_RANGE: RangeInclusive<f32> = 0.0..=2.0;

/// Model choice and sampling knobs for the configurable session.
///
/// These are read fresh for every request and are never persisted with the
/// conversation.  Bounds are checked where values enter the program (command
/// line, config file, slash commands); the request builder copies them
/// through untouched.
///
/// ```
/// # use palaver::{GenerationParams, Model};
/// let params = GenerationParams::new()
///     .with_model(Model::Gpt4)
///     .with_temperature(0.2)
///     .unwrap();
/// assert_eq!(params.temperature, 0.2);
/// assert!(params.with_temperature(2.5).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    /// The model that will complete the conversation.
    pub model: Model,
    /// Amount of randomness injected into the response.
    pub temperature: f32,
    /// Maximum number of tokens to generate.
    pub max_tokens: u32,
    /// Nucleus sampling threshold.
    pub top_p: f32,
    /// Penalty for tokens that already appeared at all.
    pub presence_penalty: f32,
    /// Penalty proportional to how often a token already appeared.
    pub frequency_penalty: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            model: Model::Gpt35Turbo,
            temperature: 1.0,
            max_tokens: 256,
            top_p: 1.0,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
        }
    }
}

impl GenerationParams {
    /// Create parameters holding the default slider positions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Set the temperature, rejecting values outside [`TEMPERATURE_RANGE`].
    pub fn with_temperature(mut self, temperature: f32) -> Result<Self, crate::Error> {
        validate_float_range(temperature, &TEMPERATURE_RANGE, "temperature")?;
        self.temperature = temperature;
        Ok(self)
    }

    /// Set max tokens, rejecting values outside [`MAX_TOKENS_RANGE`].
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Result<Self, crate::Error> {
        if !MAX_TOKENS_RANGE.contains(&max_tokens) {
            return Err(crate::Error::validation(
                format!(
                    "max_tokens must be between {} and {}, got {max_tokens}",
                    MAX_TOKENS_RANGE.start(),
                    MAX_TOKENS_RANGE.end()
                ),
                Some("max_tokens".to_string()),
            ));
        }
        self.max_tokens = max_tokens;
        Ok(self)
    }

    /// Set top-p, rejecting values outside [`TOP_P_RANGE`].
    pub fn with_top_p(mut self, top_p: f32) -> Result<Self, crate::Error> {
        validate_float_range(top_p, &TOP_P_RANGE, "top_p")?;
        self.top_p = top_p;
        Ok(self)
    }

    /// Set the presence penalty, rejecting values outside [`PRESENCE_PENALTY_RANGE`].
    pub fn with_presence_penalty(mut self, penalty: f32) -> Result<Self, crate::Error> {
        validate_float_range(penalty, &PRESENCE_PENALTY_RANGE, "presence_penalty")?;
        self.presence_penalty = penalty;
        Ok(self)
    }

    /// Set the frequency penalty, rejecting values outside [`FREQUENCY_PENALTY_RANGE`].
    pub fn with_frequency_penalty(mut self, penalty: f32) -> Result<Self, crate::Error> {
        validate_float_range(penalty, &FREQUENCY_PENALTY_RANGE, "frequency_penalty")?;
        self.frequency_penalty = penalty;
        Ok(self)
    }

    /// Check every knob against its range.
    ///
    /// Used for values that bypass the builder, e.g. a merged config file.
    pub fn validate(&self) -> Result<(), crate::Error> {
        GenerationParams::new()
            .with_temperature(self.temperature)?
            .with_max_tokens(self.max_tokens)?
            .with_top_p(self.top_p)?
            .with_presence_penalty(self.presence_penalty)?
            .with_frequency_penalty(self.frequency_penalty)?;
        Ok(())
    }
}

#[inline]
fn validate_float_range(
    value: f32,
    range: &RangeInclusive<f32>,
    field_name: &str,
) -> Result<(), crate::Error> {
    if value.is_finite() && range.contains(&value) {
        return Ok(());
    }

    if value.is_nan() {
        return Err(crate::Error::validation(
            format!("{field_name} cannot be NaN"),
            Some(field_name.to_string()),
        ));
    }

    Err(crate::Error::validation(
        format!(
            "{field_name} must be between {} and {}, got {value}",
            range.start(),
            range.end()
        ),
        Some(field_name.to_string()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_initial_slider_positions() {
        let params = GenerationParams::default();
        assert_eq!(params.model, Model::Gpt35Turbo);
        assert_eq!(params.temperature, 1.0);
        assert_eq!(params.max_tokens, 256);
        assert_eq!(params.top_p, 1.0);
        assert_eq!(params.presence_penalty, 0.0);
        assert_eq!(params.frequency_penalty, 0.0);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn bounds_are_inclusive() {
        let params = GenerationParams::new()
            .with_temperature(0.2)
            .unwrap()
            .with_temperature(2.0)
            .unwrap()
            .with_max_tokens(1)
            .unwrap()
            .with_max_tokens(4095)
            .unwrap()
            .with_top_p(0.0)
            .unwrap()
            .with_presence_penalty(2.0)
            .unwrap()
            .with_frequency_penalty(0.0)
            .unwrap();
        assert_eq!(params.temperature, 2.0);
        assert_eq!(params.max_tokens, 4095);
        assert_eq!(params.top_p, 0.0);
        assert_eq!(params.presence_penalty, 2.0);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let params = GenerationParams::new();
        assert!(params.with_temperature(0.1).is_err());
        assert!(params.with_temperature(f32::NAN).is_err());
        assert!(params.with_max_tokens(0).is_err());
        assert!(params.with_max_tokens(4096).is_err());
        assert!(params.with_top_p(1.01).is_err());
        assert!(params.with_presence_penalty(-0.1).is_err());
        assert!(params.with_frequency_penalty(f32::INFINITY).is_err());
    }

    #[test]
    fn rejected_value_names_the_parameter() {
        let err = GenerationParams::new().with_top_p(3.0).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("top_p"));
    }

    #[test]
    fn validate_catches_direct_assignment() {
        let params = GenerationParams {
            max_tokens: 9000,
            ..GenerationParams::default()
        };
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("max_tokens"));
    }
}
