//! LLM invocation cost calculation
//!
//! Prices are USD per one million tokens.

/// Input/output price of one model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl ModelPricing {
    const fn new(input_per_million: f64, output_per_million: f64) -> Self {
        Self {
            input_per_million,
            output_per_million,
        }
    }
}

const PRICING: [(&str, ModelPricing); 5] = [
    (
        "anthropic.claude-3-5-sonnet-20241022-v2:0",
        ModelPricing::new(3.00, 15.00),
    ),
    (
        "anthropic.claude-3-sonnet-20240229-v1:0",
        ModelPricing::new(3.00, 15.00),
    ),
    (
        "anthropic.claude-3-haiku-20240307-v1:0",
        ModelPricing::new(0.25, 1.25),
    ),
    ("gpt-4o", ModelPricing::new(2.50, 10.00)),
    ("gpt-4o-mini", ModelPricing::new(0.15, 0.60)),
];

/// Look up the price table entry for `model`
pub fn pricing_for(model: &str) -> Option<ModelPricing> {
    PRICING
        .iter()
        .find(|(id, _)| *id == model)
        .map(|(_, pricing)| *pricing)
}

/// Cost of one call in USD, rounded to six decimals
///
/// Unknown models cost `0.0` so an unpriced model never breaks the caller.
///
/// # Example
///
/// ```
/// use trace_logger::core::cost::calculate_cost;
///
/// assert_eq!(calculate_cost("gpt-4o", 1_000_000, 0), 2.5);
/// assert_eq!(calculate_cost("unknown-model", 10, 10), 0.0);
/// ```
pub fn calculate_cost(model: &str, input_tokens: u64, output_tokens: u64) -> f64 {
    let Some(pricing) = pricing_for(model) else {
        return 0.0;
    };

    let input_cost = input_tokens as f64 / 1_000_000.0 * pricing.input_per_million;
    let output_cost = output_tokens as f64 / 1_000_000.0 * pricing.output_per_million;

    ((input_cost + output_cost) * 1_000_000.0).round() / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_models() {
        assert_eq!(
            calculate_cost("anthropic.claude-3-5-sonnet-20241022-v2:0", 1_000_000, 1_000_000),
            18.0
        );
        assert_eq!(
            calculate_cost("anthropic.claude-3-haiku-20240307-v1:0", 2_000_000, 0),
            0.5
        );
        assert_eq!(calculate_cost("gpt-4o-mini", 0, 1_000_000), 0.6);
    }

    #[test]
    fn test_rounds_to_six_decimals() {
        // 1 input token of Sonnet is 0.000003, 1 of Haiku is 0.00000025
        assert_eq!(
            calculate_cost("anthropic.claude-3-sonnet-20240229-v1:0", 1, 0),
            0.000003
        );
        assert_eq!(
            calculate_cost("anthropic.claude-3-haiku-20240307-v1:0", 1, 0),
            0.0
        );
    }

    #[test]
    fn test_unknown_model() {
        assert!(pricing_for("mystery").is_none());
        assert_eq!(calculate_cost("mystery", 1_000, 1_000), 0.0);
    }
}
