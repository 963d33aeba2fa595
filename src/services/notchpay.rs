// src/services/notchpay.rs
// DOCUMENTATION: NotchPay Mobile Money gateway client
// PURPOSE: Handle communication with the NotchPay API for payment
// initialization, processing, verification and webhooks

use crate::errors::FindamError;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// NotchPay API client
/// DOCUMENTATION: Handles authentication and API calls to NotchPay
pub struct NotchPayClient {
    /// HTTP client for making requests
    client: Client,
    /// Public API key, sent verbatim (no Bearer prefix)
    public_key: String,
    /// Key used to verify webhook signatures
    hash_key: String,
    /// Base URL for the NotchPay API
    base_url: String,
}

/// Transaction object embedded in NotchPay responses
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotchPayTransaction {
    /// Gateway-side reference (trx.xxx)
    pub reference: Option<String>,
    pub status: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
}

/// Response from payment initialization and verification calls
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotchPayPaymentResponse {
    pub status: Option<String>,
    pub message: Option<String>,
    pub transaction: Option<NotchPayTransaction>,
    /// Hosted payment page for redirect flows
    pub authorization_url: Option<String>,
}

impl NotchPayPaymentResponse {
    /// Gateway reference, when present
    pub fn reference(&self) -> Option<&str> {
        self.transaction
            .as_ref()
            .and_then(|t| t.reference.as_deref())
    }

    /// Gateway transaction status, when present
    pub fn transaction_status(&self) -> Option<&str> {
        self.transaction.as_ref().and_then(|t| t.status.as_deref())
    }
}

/// Payment channel advertised by the gateway
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotchPayChannel {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub enabled: bool,
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    data: Vec<NotchPayChannel>,
}

/// Customer block sent with a payment initialization
#[derive(Debug, Clone, Serialize)]
pub struct CustomerInfo {
    pub email: String,
    pub phone: String,
    pub name: String,
}

impl NotchPayClient {
    pub fn new(public_key: String, hash_key: String, sandbox: bool) -> Self {
        log::info!("NotchPay client initialized (sandbox: {})", sandbox);
        Self {
            client: Client::new(),
            public_key,
            hash_key,
            base_url: "https://api.notchpay.co".to_string(),
        }
    }

    /// Initialize a payment and obtain the gateway reference
    /// DOCUMENTATION: POST /payments; amount in whole XAF
    pub async fn initialize_payment(
        &self,
        amount: i64,
        reference: &str,
        description: &str,
        customer: &CustomerInfo,
        metadata: Option<Value>,
        callback_url: Option<&str>,
    ) -> Result<NotchPayPaymentResponse, FindamError> {
        let mut payload = json!({
            "currency": "XAF",
            "amount": amount,
            "reference": reference,
            "description": description,
            "customer": customer,
        });

        if let Some(metadata) = metadata {
            payload["metadata"] = metadata;
        }
        if let Some(callback) = callback_url {
            payload["callback"] = json!(callback);
        }

        log::info!("Initializing NotchPay payment {} ({} XAF)", reference, amount);

        let response = self
            .client
            .post(format!("{}/payments", self.base_url))
            .header("Accept", "application/json")
            .header("Authorization", &self.public_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                log::error!("NotchPay initialization request failed: {}", e);
                FindamError::PaymentGatewayError(e.to_string())
            })?;

        Self::parse_payment_response(response).await
    }

    /// Charge an initialized payment through a Mobile Money channel
    /// DOCUMENTATION: POST /payments/{reference} with the channel code
    pub async fn process_payment(
        &self,
        reference: &str,
        channel: &str,
        phone: Option<&str>,
    ) -> Result<NotchPayPaymentResponse, FindamError> {
        let mut payload = json!({ "channel": channel });
        if let Some(phone) = phone {
            payload["phone"] = json!(phone);
        }

        log::info!("Processing NotchPay payment {} via {}", reference, channel);

        let response = self
            .client
            .post(format!("{}/payments/{}", self.base_url, reference))
            .header("Accept", "application/json")
            .header("Authorization", &self.public_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                log::error!("NotchPay processing request failed: {}", e);
                FindamError::PaymentGatewayError(e.to_string())
            })?;

        Self::parse_payment_response(response).await
    }

    /// Fetch the current status of a payment
    pub async fn verify_payment(
        &self,
        reference: &str,
    ) -> Result<NotchPayPaymentResponse, FindamError> {
        log::info!("Verifying NotchPay payment {}", reference);

        let response = self
            .client
            .get(format!("{}/payments/{}", self.base_url, reference))
            .header("Accept", "application/json")
            .header("Authorization", &self.public_key)
            .send()
            .await
            .map_err(|e| {
                log::error!("NotchPay verification request failed: {}", e);
                FindamError::PaymentGatewayError(e.to_string())
            })?;

        Self::parse_payment_response(response).await
    }

    /// Cancel an initialized payment
    pub async fn cancel_payment(
        &self,
        reference: &str,
    ) -> Result<NotchPayPaymentResponse, FindamError> {
        log::info!("Cancelling NotchPay payment {}", reference);

        let response = self
            .client
            .delete(format!("{}/payments/{}", self.base_url, reference))
            .header("Accept", "application/json")
            .header("Authorization", &self.public_key)
            .send()
            .await
            .map_err(|e| {
                log::error!("NotchPay cancellation request failed: {}", e);
                FindamError::PaymentGatewayError(e.to_string())
            })?;

        Self::parse_payment_response(response).await
    }

    /// Payment channels currently usable on the gateway
    pub async fn get_payment_channels(&self) -> Result<Vec<NotchPayChannel>, FindamError> {
        let response = self
            .client
            .get(format!("{}/channels", self.base_url))
            .header("Accept", "application/json")
            .header("Authorization", &self.public_key)
            .send()
            .await
            .map_err(|e| {
                log::error!("NotchPay channel listing failed: {}", e);
                FindamError::PaymentGatewayError(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("NotchPay channel listing returned {}: {}", status, body);
            return Err(FindamError::PaymentGatewayError(format!(
                "Channel listing failed with status {}",
                status
            )));
        }

        let channels: ChannelListResponse = response.json().await.map_err(|e| {
            log::error!("NotchPay channel response unreadable: {}", e);
            FindamError::PaymentGatewayError(e.to_string())
        })?;

        Ok(channels
            .data
            .into_iter()
            .filter(|c| c.active && c.enabled)
            .collect())
    }

    /// Verify the HMAC-SHA256 signature of a webhook body
    /// DOCUMENTATION: NotchPay signs the raw body with the hash key and
    /// sends the hex digest in X-Notch-Signature
    pub fn verify_webhook_signature(&self, payload: &[u8], signature_header: &str) -> bool {
        if signature_header.is_empty() || self.hash_key.is_empty() {
            return false;
        }

        let mut mac = match HmacSha256::new_from_slice(self.hash_key.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return false,
        };
        mac.update(payload);
        let computed = hex::encode(mac.finalize().into_bytes());

        // Constant-time comparison
        let received = signature_header.as_bytes();
        let computed = computed.as_bytes();
        if received.len() != computed.len() {
            return false;
        }
        received
            .iter()
            .zip(computed.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }

    async fn parse_payment_response(
        response: reqwest::Response,
    ) -> Result<NotchPayPaymentResponse, FindamError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            log::error!("NotchPay response unreadable: {}", e);
            FindamError::PaymentGatewayError(e.to_string())
        })?;

        log::debug!("NotchPay response ({}): {}", status, body);

        if !status.is_success() {
            log::error!("NotchPay returned {}: {}", status, body);
            return Err(FindamError::PaymentGatewayError(format!(
                "Gateway returned status {}",
                status
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            log::error!("NotchPay response is not valid JSON: {}", e);
            FindamError::PaymentGatewayError(e.to_string())
        })
    }
}

/// Generate a unique payment reference: findam-{8 hex}-{unix ts}
pub fn generate_reference() -> String {
    let unique = Uuid::new_v4().simple().to_string();
    format!(
        "findam-{}-{}",
        &unique[..8],
        chrono::Utc::now().timestamp()
    )
}

/// Map a gateway status string to our internal transaction status
pub fn convert_gateway_status(gateway_status: &str) -> &'static str {
    match gateway_status.to_lowercase().as_str() {
        "new" | "pending" => "pending",
        "processing" => "processing",
        "success" | "successful" | "complete" | "completed" => "completed",
        "failed" | "expired" | "error" => "failed",
        "canceled" | "cancelled" => "cancelled",
        "refunded" => "refunded",
        _ => "pending",
    }
}

/// Map a Mobile Money operator name to a NotchPay channel code
/// "mobile_money" lets the gateway detect the operator itself
pub fn mobile_operator_channel(operator: Option<&str>) -> &'static str {
    match operator.map(|o| o.to_lowercase()).as_deref() {
        Some("orange") => "cm.orange",
        Some("mtn") => "cm.mtn",
        _ => "cm.mobile",
    }
}

/// Normalize a phone number for NotchPay
/// DOCUMENTATION: Strips non-digits and prefixes Cameroonian mobile
/// numbers with the 237 country code
pub fn format_phone_number(phone_number: &str) -> String {
    let cleaned: String = phone_number.chars().filter(|c| c.is_ascii_digit()).collect();

    if cleaned.len() == 9 && cleaned.starts_with('6') {
        return format!("237{}", cleaned);
    }

    // Already carries the country code (with or without a leading +)
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_gateway_status() {
        assert_eq!(convert_gateway_status("new"), "pending");
        assert_eq!(convert_gateway_status("pending"), "pending");
        assert_eq!(convert_gateway_status("processing"), "processing");
        assert_eq!(convert_gateway_status("success"), "completed");
        assert_eq!(convert_gateway_status("successful"), "completed");
        assert_eq!(convert_gateway_status("complete"), "completed");
        assert_eq!(convert_gateway_status("Completed"), "completed");
        assert_eq!(convert_gateway_status("failed"), "failed");
        assert_eq!(convert_gateway_status("expired"), "failed");
        assert_eq!(convert_gateway_status("canceled"), "cancelled");
        assert_eq!(convert_gateway_status("refunded"), "refunded");
        // Unknown statuses stay pending rather than failing the flow
        assert_eq!(convert_gateway_status("galactic"), "pending");
    }

    #[test]
    fn test_mobile_operator_channel() {
        assert_eq!(mobile_operator_channel(Some("orange")), "cm.orange");
        assert_eq!(mobile_operator_channel(Some("Orange")), "cm.orange");
        assert_eq!(mobile_operator_channel(Some("mtn")), "cm.mtn");
        assert_eq!(mobile_operator_channel(Some("mobile_money")), "cm.mobile");
        assert_eq!(mobile_operator_channel(None), "cm.mobile");
    }

    #[test]
    fn test_format_phone_number() {
        // Local mobile number gets the country code
        assert_eq!(format_phone_number("650123456"), "237650123456");
        // Already prefixed numbers pass through
        assert_eq!(format_phone_number("237650123456"), "237650123456");
        assert_eq!(format_phone_number("+237 650 123 456"), "237650123456");
        // Separators are stripped
        assert_eq!(format_phone_number("6 50 12 34 56"), "237650123456");
    }

    #[test]
    fn test_generate_reference_shape() {
        let reference = generate_reference();
        assert!(reference.starts_with("findam-"));
        let parts: Vec<&str> = reference.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].len(), 8);
        assert!(parts[2].parse::<i64>().is_ok());
    }

    #[test]
    fn test_webhook_signature_verification() {
        let client = NotchPayClient::new(
            "pk.test".to_string(),
            "webhook-hash-key".to_string(),
            true,
        );

        let payload = br#"{"event":"payment.complete"}"#;

        let mut mac = HmacSha256::new_from_slice(b"webhook-hash-key").unwrap();
        mac.update(payload);
        let signature = hex::encode(mac.finalize().into_bytes());

        assert!(client.verify_webhook_signature(payload, &signature));
        assert!(!client.verify_webhook_signature(payload, "deadbeef"));
        assert!(!client.verify_webhook_signature(b"other body", &signature));
    }

    #[test]
    fn test_payment_response_accessors() {
        let response: NotchPayPaymentResponse = serde_json::from_str(
            r#"{
                "status": "Accepted",
                "transaction": {"reference": "trx.abc123", "status": "pending"},
                "authorization_url": "https://pay.notchpay.co/trx.abc123"
            }"#,
        )
        .unwrap();

        assert_eq!(response.reference(), Some("trx.abc123"));
        assert_eq!(response.transaction_status(), Some("pending"));
        assert!(response.authorization_url.is_some());
    }
}
