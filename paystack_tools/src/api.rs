use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
    StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    config::PaystackConfig,
    data_objects::{
        Bank,
        InitializeTransaction,
        NewTransfer,
        NewTransferRecipient,
        PaystackResponse,
        ResolvedAccount,
        TransactionAuthorization,
        TransactionVerification,
        Transfer,
        TransferRecipient,
    },
    PaystackApiError,
};

#[derive(Clone)]
pub struct PaystackApi {
    config: PaystackConfig,
    client: Arc<Client>,
}

impl PaystackApi {
    pub fn new(config: PaystackConfig) -> Result<Self, PaystackApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(format!("Bearer {}", config.secret_key.reveal()).as_str())
            .map_err(|e| PaystackApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaystackApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &PaystackConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Sends a request and unwraps the standard Paystack envelope, returning the `data` field.
    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<B>,
    ) -> Result<T, PaystackApiError> {
        let url = self.url(path);
        trace!("💳️ Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| PaystackApiError::RestRequestError(e.to_string()))?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("💳️ Paystack is rate limiting us");
            return Err(PaystackApiError::RateLimited);
        }
        if status.is_success() {
            trace!("💳️ REST query successful. {status}");
            let envelope = response
                .json::<PaystackResponse<T>>()
                .await
                .map_err(|e| PaystackApiError::JsonError(e.to_string()))?;
            if !envelope.status {
                return Err(PaystackApiError::Rejected(envelope.message));
            }
            envelope.data.ok_or(PaystackApiError::EmptyResponse)
        } else {
            let text = response.text().await.map_err(|e| PaystackApiError::RestResponseError(e.to_string()))?;
            let message = extract_message(&text);
            debug!("💳️ REST query failed. {status}: {message}");
            Err(PaystackApiError::QueryError { status: status.as_u16(), message })
        }
    }

    pub async fn initialize_transaction(
        &self,
        request: &InitializeTransaction,
    ) -> Result<TransactionAuthorization, PaystackApiError> {
        debug!("💳️ Initializing transaction {} for {}", request.reference, request.amount);
        let result = self
            .rest_query::<TransactionAuthorization, _>(Method::POST, "/transaction/initialize", &[], Some(request))
            .await?;
        info!("💳️ Initialized transaction {}", result.reference);
        Ok(result)
    }

    pub async fn verify_transaction(&self, reference: &str) -> Result<TransactionVerification, PaystackApiError> {
        let path = format!("/transaction/verify/{reference}");
        debug!("💳️ Verifying transaction {reference}");
        let result = self.rest_query::<TransactionVerification, ()>(Method::GET, &path, &[], None).await?;
        info!("💳️ Transaction {reference} has status '{}'", result.status);
        Ok(result)
    }

    /// Fetches the active banks for the given country, sorted by name.
    pub async fn list_banks(&self, country: &str, currency: &str) -> Result<Vec<Bank>, PaystackApiError> {
        let params = [("country", country), ("currency", currency), ("perPage", "100")];
        let mut banks = self.rest_query::<Vec<Bank>, ()>(Method::GET, "/bank", &params, None).await?;
        banks.retain(|b| b.active);
        banks.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        debug!("💳️ Fetched {} active banks", banks.len());
        Ok(banks)
    }

    pub async fn resolve_account(
        &self,
        account_number: &str,
        bank_code: &str,
    ) -> Result<ResolvedAccount, PaystackApiError> {
        let params = [("account_number", account_number), ("bank_code", bank_code)];
        let result = self.rest_query::<ResolvedAccount, ()>(Method::GET, "/bank/resolve", &params, None).await?;
        debug!("💳️ Resolved account at bank {bank_code}");
        Ok(result)
    }

    pub async fn create_transfer_recipient(
        &self,
        recipient: &NewTransferRecipient,
    ) -> Result<TransferRecipient, PaystackApiError> {
        let result =
            self.rest_query::<TransferRecipient, _>(Method::POST, "/transferrecipient", &[], Some(recipient)).await?;
        info!("💳️ Created transfer recipient {}", result.recipient_code);
        Ok(result)
    }

    pub async fn initiate_transfer(&self, transfer: &NewTransfer) -> Result<Transfer, PaystackApiError> {
        debug!("💳️ Transferring {} to {} ({})", transfer.amount, transfer.recipient, transfer.reference);
        let result = self.rest_query::<Transfer, _>(Method::POST, "/transfer", &[], Some(transfer)).await?;
        info!("💳️ Transfer {} initiated", result.transfer_code);
        Ok(result)
    }
}

/// Paystack error bodies look like `{"status": false, "message": "..."}`. Fall back to the raw text otherwise.
fn extract_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.to_string())
}
