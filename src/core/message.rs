use crate::models::{FounderProfile, FundingStage};

/// Build the outreach message used when the founder did not write one.
///
/// Without documents the copy offers materials on request instead of
/// pointing at attachments.
pub fn default_outreach_message(
    founder: &FounderProfile,
    stage: FundingStage,
    use_of_funds: &str,
    has_documents: bool,
) -> String {
    let company = founder
        .company_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| format!(", founder of {}", name))
        .unwrap_or_default();

    let mut message = format!(
        "Hello,\n\nI'm {}{}, and we are raising a {} round. We plan to use the funds for: {}.\n\n",
        founder.name.trim(),
        company,
        stage.label(),
        use_of_funds.trim()
    );

    if has_documents {
        message.push_str("Our pitch materials are attached for your review.");
    } else {
        message.push_str("Our pitch materials are available on request.");
    }

    message.push_str("\n\nI would welcome the chance to talk.\n\nBest regards,\n");
    message.push_str(founder.name.trim());

    message
}

/// Prefer the caller's message when it has content
pub fn outreach_message(
    custom: Option<&str>,
    founder: &FounderProfile,
    stage: FundingStage,
    use_of_funds: &str,
    has_documents: bool,
) -> String {
    match custom.map(str::trim).filter(|m| !m.is_empty()) {
        Some(message) => message.to_string(),
        None => default_outreach_message(founder, stage, use_of_funds, has_documents),
    }
}
