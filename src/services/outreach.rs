use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{FounderProfile, FounderSummary, OutreachOutcome, Recipient};

/// Errors a dispatcher may raise. Delivery problems are never errors; they
/// come back as an unsuccessful [`OutreachOutcome`].
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Malformed dispatch call: {0}")]
    InvalidCall(String),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Dispatcher internal error: {0}")]
    Internal(String),
}

/// Everything needed to send one round of outreach
#[derive(Debug, Clone)]
pub struct OutreachDispatch {
    pub founder: FounderProfile,
    pub recipients: Vec<Recipient>,
    pub document_ids: Vec<String>,
    pub message: String,
    pub funding_request_id: Uuid,
}

impl OutreachDispatch {
    fn check(&self) -> Result<(), DispatchError> {
        if self.recipients.is_empty() {
            return Err(DispatchError::InvalidCall("no recipients".into()));
        }
        if self.message.trim().is_empty() {
            return Err(DispatchError::InvalidCall("empty message".into()));
        }
        Ok(())
    }

    fn payload(&self) -> Value {
        json!({
            "fundingRequestId": self.funding_request_id,
            "founder": FounderSummary::from(&self.founder),
            "recipients": self.recipients,
            "documentIds": self.document_ids,
            "message": self.message,
        })
    }
}

/// Sends outreach to investors on a founder's behalf
#[async_trait]
pub trait OutreachDispatcher: Send + Sync {
    async fn dispatch(&self, request: &OutreachDispatch) -> Result<OutreachOutcome, DispatchError>;
}

/// Dispatcher backed by the platform's outreach (mail) service
pub struct HttpOutreachDispatcher {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl HttpOutreachDispatcher {
    pub fn new(endpoint: String, api_key: String, timeout: Duration) -> Result<Self, DispatchError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            endpoint,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl OutreachDispatcher for HttpOutreachDispatcher {
    async fn dispatch(&self, request: &OutreachDispatch) -> Result<OutreachOutcome, DispatchError> {
        request.check()?;

        let url = format!("{}/outreach", self.endpoint.trim_end_matches('/'));

        tracing::debug!(
            "Dispatching outreach for funding request {} to {} recipients",
            request.funding_request_id,
            request.recipients.len()
        );

        let response = match self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request.payload())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let reason = if e.is_timeout() { "timed out" } else { "unreachable" };
                tracing::warn!("Outreach provider {}: {}", reason, e);
                return Ok(OutreachOutcome::failed(
                    format!("Outreach provider {}: {}", reason, e),
                    json!({ "recipients": request.recipients.len() }),
                ));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Outreach provider responded {}: {}", status, body);
            return Ok(OutreachOutcome::failed(
                format!("Outreach provider responded with {}", status),
                json!({ "status": status.as_u16(), "body": body }),
            ));
        }

        match response.json::<OutreachOutcome>().await {
            Ok(outcome) => Ok(outcome),
            Err(e) => Ok(OutreachOutcome::failed(
                format!("Unreadable outreach provider response: {}", e),
                Value::Null,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatch_to(recipients: Vec<Recipient>) -> OutreachDispatch {
        OutreachDispatch {
            founder: FounderProfile {
                user_id: "f1".into(),
                name: "Ada".into(),
                company_name: Some("Engines Ltd".into()),
                email: Some("ada@engines.io".into()),
                signup_status: "complete".into(),
                documents: vec![],
            },
            recipients,
            document_ids: vec!["d1".into()],
            message: "Hello".into(),
            funding_request_id: Uuid::nil(),
        }
    }

    fn recipient() -> Recipient {
        Recipient {
            investor_id: "i1".into(),
            email: "grace@fund.vc".into(),
        }
    }

    #[tokio::test]
    async fn test_empty_recipients_is_a_malformed_call() {
        let dispatcher =
            HttpOutreachDispatcher::new("http://127.0.0.1:1".into(), "k".into(), Duration::from_secs(1))
                .unwrap();

        let err = dispatcher.dispatch(&dispatch_to(vec![])).await.unwrap_err();
        assert!(matches!(err, DispatchError::InvalidCall(_)));
    }

    #[tokio::test]
    async fn test_provider_outcome_is_passed_through() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/outreach")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_body(r#"{"success":true,"message":"sent 1","data":{"sent":1}}"#)
            .create_async()
            .await;

        let dispatcher =
            HttpOutreachDispatcher::new(server.url(), "secret".into(), Duration::from_secs(5))
                .unwrap();
        let outcome = dispatcher.dispatch(&dispatch_to(vec![recipient()])).await.unwrap();

        mock.assert_async().await;
        assert!(outcome.success);
        assert_eq!(outcome.data["sent"], 1);
    }

    #[tokio::test]
    async fn test_provider_error_status_is_unsuccessful_outcome() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/outreach")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let dispatcher =
            HttpOutreachDispatcher::new(server.url(), "secret".into(), Duration::from_secs(5))
                .unwrap();
        let outcome = dispatcher.dispatch(&dispatch_to(vec![recipient()])).await.unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.data["status"], 502);
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_unsuccessful_outcome() {
        let dispatcher =
            HttpOutreachDispatcher::new("http://127.0.0.1:1".into(), "k".into(), Duration::from_secs(1))
                .unwrap();

        let outcome = dispatcher.dispatch(&dispatch_to(vec![recipient()])).await.unwrap();
        assert!(!outcome.success);
    }
}
