use super::provider::EnrichmentRequest;
use super::schemas::EnrichmentReply;

pub const SYSTEM_PROMPT: &str = "\
You analyze tabular-data scanner scripts that filter market rows with \
boolean conditions. Propose named threshold parameters that the structural \
pass missed: values that a user tuning this scanner would want to adjust. \
Never repeat a parameter name you were told is already known. Respond with \
JSON only, matching the schema you are given. Use snake_case names ending \
in _min, _max, _eq or _ne where the comparison direction is clear, and a \
confidence between 0.0 and 1.0 reflecting how sure you are the value is a \
tunable threshold rather than incidental.";

pub fn user_prompt(request: &EnrichmentRequest) -> String {
    let known = if request.prior_names.is_empty() {
        "(none)".to_string()
    } else {
        request.prior_names.join(", ")
    };

    format!(
        "Already-known parameters: {known}\n\n\
         Reply schema:\n{schema}\n\n\
         Scanner source:\n```python\n{source}\n```",
        known = known,
        schema = EnrichmentReply::schema_definition(),
        source = request.source,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_prompt_carries_priors_and_source() {
        let request = EnrichmentRequest {
            source: "mask = df['gap'] >= 0.5".to_string(),
            prior_names: vec!["gap_min".to_string()],
        };
        let prompt = user_prompt(&request);
        assert!(prompt.contains("gap_min"));
        assert!(prompt.contains("df['gap']"));
        assert!(prompt.contains("\"parameters\""));
    }
}
