use clap::Args;
use serde_json::json;

use crate::util::api_request;

/// Questionnaire answers sent to `POST /api/generate`
#[derive(Args)]
pub struct GenerateArgs {
    /// Relationship to the recipient (e.g. "Friend", "Mother")
    #[arg(long)]
    relationship: String,
    /// Recipient age group (e.g. "25-34")
    #[arg(long)]
    age_group: String,
    #[arg(long)]
    gender: String,
    /// Occasion (e.g. "Birthday", "Diwali")
    #[arg(long)]
    occasion: String,
    /// Free-form interests (e.g. "coffee, hiking")
    #[arg(long)]
    interests: String,
    /// Budget (e.g. "₹500 - ₹1500")
    #[arg(long)]
    price_range: String,
    /// Kind of gift (e.g. "Practical", "Experience")
    #[arg(long)]
    gift_type: String,
}

impl GenerateArgs {
    fn body(&self) -> serde_json::Value {
        json!({
            "relationship": self.relationship,
            "ageGroup": self.age_group,
            "gender": self.gender,
            "occasion": self.occasion,
            "interests": self.interests,
            "priceRange": self.price_range,
            "giftType": self.gift_type,
        })
    }
}

pub async fn run(api_url: &str, args: GenerateArgs, raw: bool) -> i32 {
    api_request(
        api_url,
        reqwest::Method::POST,
        "/api/generate",
        None,
        Some(args.body()),
        &[],
        raw,
    )
    .await
}
