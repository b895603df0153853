use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use crate::models::domain::FundingStage;

/// Request to open a funding request and optionally reach out to investors
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_outreach_selection"))]
pub struct CreateFundingRequest {
    #[serde(default)]
    pub founder_id: Option<String>,
    pub funding_stage: FundingStage,
    #[validate(custom(function = "not_blank"), length(max = 5000))]
    pub use_of_funds: String,
    #[serde(default)]
    #[validate(length(max = 20000))]
    pub business_plan: Option<String>,
    #[serde(default)]
    #[validate(length(max = 20000))]
    pub financial_projections: Option<String>,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub additional_notes: Option<String>,
    #[serde(default)]
    pub send_to_investors_immediately: bool,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub investor_ids: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub custom_email_message: Option<String>,
    #[serde(default)]
    pub specified_pitch_deck_document_ids: Vec<String>,
}

impl CreateFundingRequest {
    /// Whether the caller asked for outreach and gave someone to reach
    pub fn wants_outreach(&self) -> bool {
        self.send_to_investors_immediately && !self.investor_ids.is_empty()
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some(Cow::from("must not be blank"));
        return Err(err);
    }
    Ok(())
}

fn validate_outreach_selection(req: &CreateFundingRequest) -> Result<(), ValidationError> {
    if req.send_to_investors_immediately && req.investor_ids.is_empty() {
        let mut err = ValidationError::new("investor_ids_required");
        err.message = Some(Cow::from(
            "investorIds must list at least one investor when sendToInvestorsImmediately is set",
        ));
        return Err(err);
    }

    if req.investor_ids.iter().any(|id| id.trim().is_empty()) {
        let mut err = ValidationError::new("blank_investor_id");
        err.message = Some(Cow::from("investorIds must not contain blank identifiers"));
        return Err(err);
    }

    Ok(())
}
