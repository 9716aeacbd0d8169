//! Turns free-text model output into validated recommendations.
//!
//! Models are asked to answer with a bare JSON object but routinely wrap it in
//! a Markdown code fence. A single leading and trailing fence is removed;
//! prose around the fenced block is not recognised and fails as
//! [`NormalizeError::MalformedResponse`].

use serde_json::Value;
use thiserror::Error;

use crate::recommendations::NewRecommendation;

/// Checked in order, so the tagged fence must come before the bare one.
const OPENING_FENCES: [&str; 2] = ["```json", "```"];
const CLOSING_FENCE: &str = "```";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// The text is not JSON once fences are removed.
    #[error("model response is not valid JSON: {0}")]
    MalformedResponse(String),
    /// The JSON has no `recommendations` array.
    #[error("model response has no recommendations array")]
    InvalidShape,
    /// No entry carried a gift name, search URL and platform.
    #[error("model response contained no valid recommendations")]
    EmptyResult,
}

impl NormalizeError {
    /// Stable machine-readable name for logs and error details.
    pub fn kind(&self) -> &'static str {
        match self {
            NormalizeError::MalformedResponse(_) => "malformed_response",
            NormalizeError::InvalidShape => "invalid_shape",
            NormalizeError::EmptyResult => "empty_result",
        }
    }
}

/// Remove one opening and one closing code fence, then trim.
pub fn strip_code_fences(raw: &str) -> &str {
    let text = raw.trim();
    let text = OPENING_FENCES
        .iter()
        .find_map(|fence| text.strip_prefix(fence))
        .unwrap_or(text);
    let text = text.strip_suffix(CLOSING_FENCE).unwrap_or(text);
    text.trim()
}

/// Parse and filter a model response.
///
/// Entries missing `gift_name`, `search_url` or `platform` are dropped; the
/// survivors keep the model's order. Numeric fields are kept as text.
pub fn normalize_response(raw: &str) -> Result<Vec<NewRecommendation>, NormalizeError> {
    let body = strip_code_fences(raw);

    let parsed: Value = serde_json::from_str(body)
        .map_err(|e| NormalizeError::MalformedResponse(e.to_string()))?;

    let entries = parsed
        .get("recommendations")
        .and_then(Value::as_array)
        .ok_or(NormalizeError::InvalidShape)?;

    let recommendations: Vec<NewRecommendation> = entries
        .iter()
        .filter_map(NewRecommendation::from_model_entry)
        .collect();

    if recommendations.is_empty() {
        return Err(NormalizeError::EmptyResult);
    }

    Ok(recommendations)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn mug() -> NewRecommendation {
        NewRecommendation {
            gift_name: "Mug".to_string(),
            description: String::new(),
            price_range: String::new(),
            platform: "Amazon".to_string(),
            product_image: String::new(),
            search_url: "http://x".to_string(),
        }
    }

    #[test]
    fn fenced_single_recommendation() {
        let raw = "```json\n{\"recommendations\":[{\"gift_name\":\"Mug\",\"search_url\":\"http://x\",\"platform\":\"Amazon\"}]}\n```";
        assert_eq!(normalize_response(raw).unwrap(), vec![mug()]);
    }

    #[test]
    fn fenced_array_keeps_model_order() {
        let body = json!({
            "recommendations": [
                {"gift_name": "Vinyl record", "description": "Classic album", "price_range": "₹900 - ₹1500",
                 "platform": "Amazon", "product_image": "black vinyl", "search_url": "https://amazon.in/s?k=vinyl"},
                {"gift_name": "Headphones", "description": "Wireless", "price_range": "₹1500 - ₹3000",
                 "platform": "Flipkart", "product_image": "over-ear", "search_url": "https://flipkart.com/search?q=headphones"},
                {"gift_name": "Concert voucher", "description": "Live music", "price_range": "₹2000",
                 "platform": "BookMyShow", "product_image": "ticket", "search_url": "https://in.bookmyshow.com"},
            ]
        });
        let raw = format!("```json\n{}\n```", serde_json::to_string_pretty(&body).unwrap());

        let names: Vec<String> = normalize_response(&raw)
            .unwrap()
            .into_iter()
            .map(|r| r.gift_name)
            .collect();
        assert_eq!(names, vec!["Vinyl record", "Headphones", "Concert voucher"]);
    }

    #[test]
    fn bare_fence_and_unfenced_json_are_accepted() {
        let body = r#"{"recommendations":[{"gift_name":"Mug","search_url":"http://x","platform":"Amazon"}]}"#;
        assert_eq!(normalize_response(body).unwrap(), vec![mug()]);
        assert_eq!(
            normalize_response(&format!("```\n{body}\n```")).unwrap(),
            vec![mug()]
        );
        assert_eq!(
            normalize_response(&format!("\n  ```json\n{body}\n```\n\n")).unwrap(),
            vec![mug()]
        );
    }

    #[test]
    fn not_json_is_malformed() {
        let err = normalize_response("not json").unwrap_err();
        assert!(matches!(err, NormalizeError::MalformedResponse(_)));
        assert_eq!(err.kind(), "malformed_response");
    }

    #[test]
    fn prose_around_fence_is_malformed() {
        let raw = "Here are some ideas!\n```json\n{\"recommendations\":[]}\n```\nEnjoy.";
        assert!(matches!(
            normalize_response(raw),
            Err(NormalizeError::MalformedResponse(_))
        ));
    }

    #[test]
    fn non_sequence_recommendations_is_invalid_shape() {
        for raw in [
            r#"{"recommendations": {"gift_name": "Mug"}}"#,
            r#"{"recommendations": "Mug"}"#,
            r#"{"gifts": []}"#,
            r#"[{"gift_name": "Mug"}]"#,
            "42",
        ] {
            assert_eq!(
                normalize_response(raw),
                Err(NormalizeError::InvalidShape),
                "input: {raw}"
            );
        }
    }

    #[test]
    fn entries_without_gift_name_leave_empty_result() {
        let raw = json!({
            "recommendations": [
                {"search_url": "http://x", "platform": "Amazon"},
                {"gift_name": "", "search_url": "http://y", "platform": "Flipkart"},
                {"gift_name": null, "search_url": "http://z", "platform": "Myntra"},
            ]
        })
        .to_string();
        assert_eq!(normalize_response(&raw), Err(NormalizeError::EmptyResult));
        assert_eq!(
            normalize_response(r#"{"recommendations": []}"#),
            Err(NormalizeError::EmptyResult)
        );
    }

    #[test]
    fn numeric_fields_survive_as_text() {
        let raw = json!({
            "recommendations": [
                {"gift_name": "Mug", "search_url": "http://x", "platform": "Amazon", "price_range": 1500},
                {"gift_name": 1984, "search_url": "http://book", "platform": "Amazon"},
            ]
        })
        .to_string();

        let recs = normalize_response(&raw).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].price_range, "1500");
        assert_eq!(recs[1].gift_name, "1984");
        assert_eq!(recs[1].search_url, "http://book");
    }

    #[test]
    fn invalid_entries_are_filtered_out() {
        let raw = json!({
            "recommendations": [
                {"gift_name": "Mug", "search_url": "http://x", "platform": "Amazon"},
                {"gift_name": "Scarf", "platform": "Myntra"},
                "just a string",
                {"gift_name": "Lamp", "search_url": "http://lamp", "platform": ""},
            ]
        })
        .to_string();
        assert_eq!(normalize_response(&raw).unwrap(), vec![mug()]);
    }

    #[test]
    fn normalizing_filtered_output_is_idempotent() {
        let raw = json!({
            "recommendations": [
                {"gift_name": "Mug", "search_url": "http://x", "platform": "Amazon", "description": "Ceramic"},
                {"gift_name": "Scarf", "platform": "Myntra"},
                {"gift_name": "Book", "search_url": "http://b", "platform": "Flipkart", "price_range": "₹300"},
            ]
        })
        .to_string();

        let first = normalize_response(&raw).unwrap();
        let again = json!({ "recommendations": first }).to_string();
        assert_eq!(normalize_response(&again).unwrap(), first);
    }

    #[test]
    fn strip_code_fences_only_removes_one_marker_each_side() {
        assert_eq!(strip_code_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("```json```json{}``````"), "```json{}```");
        assert_eq!(strip_code_fences("  {}  "), "{}");
    }
}
