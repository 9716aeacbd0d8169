//! Prompt text sent to the model.

use std::fmt::Write as _;

use giftwise_core::chat::ChatMessage;
use giftwise_core::recommendations::{GiftPreferences, Questionnaire};

const PERSONA: &str = "You are a professional gift recommendation expert.";

const NOT_SPECIFIED: &str = "not specified";

const RESPONSE_SHAPE: &str = r#"{
  "recommendations": [
    {
      "gift_name": "Specific Gift Name",
      "description": "Why this is a great gift for the given person and occasion",
      "price_range": "₹X - ₹Y",
      "platform": "Amazon/Flipkart/Myntra/etc",
      "product_image": "Image URL or short visual description",
      "search_url": "Direct working product or search link"
    }
  ]
}"#;

const SELECTION_RULES: &str = "\
1. Consider the recipient's interests, age, and relationship carefully
2. Stay within the specified price range
3. Provide practical and thoughtful recommendations
4. Include popular shopping platforms available in India
5. Generate realistic search URLs or product links
6. Do not invent placeholder domains such as example.com";

/// Prompt for `/api/generate`: one-shot recommendations for a full questionnaire.
pub fn recommendation_prompt(questionnaire: &Questionnaire) -> String {
    let criteria = [
        ("Relationship", questionnaire.relationship.as_str()),
        ("Age Group", questionnaire.age_group.as_str()),
        ("Gender", questionnaire.gender.as_str()),
        ("Occasion", questionnaire.occasion.as_str()),
        ("Interests", questionnaire.interests.as_str()),
        ("Price Range", questionnaire.price_range.as_str()),
        ("Gift Type", questionnaire.gift_type.as_str()),
    ];

    let mut prompt = format!(
        "{PERSONA} Based on the following criteria, provide exactly 6 detailed gift \
         recommendations in JSON format.\n\nCRITERIA:\n"
    );
    push_criteria(&mut prompt, &criteria);
    let _ = write!(
        prompt,
        "\nINSTRUCTIONS:\n{SELECTION_RULES}\n\n\
         Respond ONLY with valid JSON in this exact format:\n{RESPONSE_SHAPE}"
    );
    prompt
}

/// Prompt for a chat turn.
///
/// `history` is the recent session transcript in chronological order.
pub fn chat_prompt(
    preferences: Option<&GiftPreferences>,
    history: &[ChatMessage],
    message: &str,
) -> String {
    let labels = [
        "Relationship",
        "Age Group",
        "Gender",
        "Occasion",
        "Interests",
        "Price Range",
        "Gift Type",
    ];
    let values = preferences.cloned().unwrap_or_default();
    let criteria: Vec<(&str, &str)> = labels
        .into_iter()
        .zip(values.fields())
        .map(|(label, (_, value))| (label, value.filter(|v| !v.is_empty()).unwrap_or(NOT_SPECIFIED)))
        .collect();

    let mut prompt = format!(
        "{PERSONA} Help the user find a gift. When you suggest gifts, provide exactly 6 \
         detailed and personalized recommendations in valid JSON format.\n\nCRITERIA:\n"
    );
    push_criteria(&mut prompt, &criteria);
    let _ = write!(
        prompt,
        "\nRULES:\n{SELECTION_RULES}\n\n\
         When recommending gifts, respond ONLY with JSON in this exact format:\n{RESPONSE_SHAPE}\n\n\
         Recent conversation context:\n"
    );
    for entry in history {
        let _ = writeln!(prompt, "{}: {}", entry.sender, entry.message);
    }
    let _ = write!(
        prompt,
        "\nCurrent user message: {message}\n\nPlease respond helpfully to the user's message:"
    );
    prompt
}

fn push_criteria(prompt: &mut String, criteria: &[(&str, &str)]) {
    for (label, value) in criteria {
        let _ = writeln!(prompt, "- {label}: {value}");
    }
}
