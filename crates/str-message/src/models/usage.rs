//! Token usage accounting and model pricing.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::wire::chat::CompletionUsage;
use crate::wire::responses::ResponseUsage;

/// Token counts of one or more requests, normalised across wire formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    /// Portion of `input_tokens` served from the provider's prompt cache
    #[serde(default)]
    pub cached_input_tokens: u64,
    /// Portion of `output_tokens` spent on reasoning
    #[serde(default)]
    pub reasoning_tokens: u64,
}

impl Usage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
            cached_input_tokens: 0,
            reasoning_tokens: 0,
        }
    }
}

impl From<&CompletionUsage> for Usage {
    fn from(usage: &CompletionUsage) -> Self {
        Usage {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
            cached_input_tokens: usage
                .prompt_tokens_details
                .as_ref()
                .and_then(|details| details.cached_tokens)
                .unwrap_or_default(),
            reasoning_tokens: usage
                .completion_tokens_details
                .as_ref()
                .and_then(|details| details.reasoning_tokens)
                .unwrap_or_default(),
        }
    }
}

impl From<&ResponseUsage> for Usage {
    fn from(usage: &ResponseUsage) -> Self {
        Usage {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            total_tokens: usage.total_tokens,
            cached_input_tokens: usage
                .input_tokens_details
                .as_ref()
                .map(|details| details.cached_tokens)
                .unwrap_or_default(),
            reasoning_tokens: usage
                .output_tokens_details
                .as_ref()
                .map(|details| details.reasoning_tokens)
                .unwrap_or_default(),
        }
    }
}

impl AddAssign for Usage {
    fn add_assign(&mut self, other: Self) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.total_tokens += other.total_tokens;
        self.cached_input_tokens += other.cached_input_tokens;
        self.reasoning_tokens += other.reasoning_tokens;
    }
}

/// Per-model pricing in USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub input_per_mtok: f64,
    /// Applied to cached input tokens instead of `input_per_mtok`
    pub cached_input_per_mtok: f64,
    pub output_per_mtok: f64,
}

impl ModelPricing {
    pub fn new(input_per_mtok: f64, cached_input_per_mtok: f64, output_per_mtok: f64) -> Self {
        Self {
            input_per_mtok,
            cached_input_per_mtok,
            output_per_mtok,
        }
    }
}

/// Source of model prices used when recording usage on a conversation
pub trait PriceTable {
    fn price(&self, model: &str) -> Option<ModelPricing>;
}

/// A fixed table keyed by model name prefix; the longest matching prefix wins
#[derive(Debug, Clone, Default)]
pub struct StaticPriceTable {
    entries: Vec<(String, ModelPricing)>,
}

impl StaticPriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model<S: Into<String>>(mut self, prefix: S, pricing: ModelPricing) -> Self {
        self.entries.push((prefix.into(), pricing));
        self
    }
}

impl PriceTable for StaticPriceTable {
    fn price(&self, model: &str) -> Option<ModelPricing> {
        self.entries
            .iter()
            .filter(|(prefix, _)| model.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, pricing)| *pricing)
    }
}

/// Cost in USD of `usage` at `pricing`.
///
/// Cached input tokens are billed at the cached rate, the rest of the input at the full rate.
pub fn calculate_cost(usage: &Usage, pricing: &ModelPricing) -> f64 {
    let cached = usage.cached_input_tokens.min(usage.input_tokens);
    let uncached = usage.input_tokens - cached;
    let input = (uncached as f64 / 1_000_000.0) * pricing.input_per_mtok;
    let cached = (cached as f64 / 1_000_000.0) * pricing.cached_input_per_mtok;
    let output = (usage.output_tokens as f64 / 1_000_000.0) * pricing.output_per_mtok;
    input + cached + output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::chat::PromptTokensDetails;
    use crate::wire::responses::OutputTokensDetails;

    fn prices() -> StaticPriceTable {
        StaticPriceTable::new()
            .with_model("gpt-4.1", ModelPricing::new(2.0, 0.5, 8.0))
            .with_model("gpt-4.1-mini", ModelPricing::new(0.4, 0.1, 1.6))
    }

    #[test]
    fn test_longest_prefix_wins() {
        let table = prices();
        let mini = table.price("gpt-4.1-mini-2025-04-14").unwrap();
        assert!((mini.input_per_mtok - 0.4).abs() < f64::EPSILON);
        let full = table.price("gpt-4.1-2025-04-14").unwrap();
        assert!((full.input_per_mtok - 2.0).abs() < f64::EPSILON);
        assert!(table.price("o3").is_none());
    }

    #[test]
    fn test_calculate_cost() {
        let usage = Usage {
            input_tokens: 1000,
            output_tokens: 500,
            total_tokens: 1500,
            cached_input_tokens: 200,
            reasoning_tokens: 0,
        };
        let cost = calculate_cost(&usage, &ModelPricing::new(2.0, 0.5, 8.0));
        // 800/1M * 2.0 + 200/1M * 0.5 + 500/1M * 8.0
        let expected = 0.0016 + 0.0001 + 0.004;
        assert!((cost - expected).abs() < 1e-10, "expected {expected}, got {cost}");
    }

    #[test]
    fn test_zero_tokens_zero_cost() {
        let cost = calculate_cost(&Usage::default(), &ModelPricing::new(2.0, 0.5, 8.0));
        assert!(cost.abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_wire_usages() {
        let chat = CompletionUsage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
            prompt_tokens_details: Some(PromptTokensDetails {
                cached_tokens: Some(4),
            }),
            completion_tokens_details: None,
        };
        let usage = Usage::from(&chat);
        assert_eq!(usage.input_tokens, 10);
        assert_eq!(usage.cached_input_tokens, 4);
        assert_eq!(usage.reasoning_tokens, 0);

        let response = ResponseUsage {
            input_tokens: 7,
            output_tokens: 3,
            total_tokens: 10,
            input_tokens_details: None,
            output_tokens_details: Some(OutputTokensDetails {
                reasoning_tokens: 2,
            }),
        };
        let mut total = Usage::from(&response);
        assert_eq!(total.reasoning_tokens, 2);

        total += usage;
        assert_eq!(total.input_tokens, 17);
        assert_eq!(total.total_tokens, 25);
        assert_eq!(total, {
            let mut expected = Usage::new(17, 8);
            expected.cached_input_tokens = 4;
            expected.reasoning_tokens = 2;
            expected
        });
    }
}
