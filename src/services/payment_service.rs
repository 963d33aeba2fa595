// src/services/payment_service.rs
// DOCUMENTATION: Payment orchestration between bookings and NotchPay
// PURPOSE: Initialize gateway payments, reconcile webhook events,
// maintain the ledger and commissions

use crate::db::{BookingRepository, PaymentRepository, PropertyRepository, UserRepository};
use crate::errors::FindamError;
use crate::models::*;
use crate::services::notchpay::{self, CustomerInfo, NotchPayClient};
use crate::services::pricing;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

pub struct PaymentService;

impl PaymentService {
    /// Initialize a Mobile Money payment for a booking
    /// DOCUMENTATION: Creates the gateway attempt record, initializes
    /// the payment on NotchPay and pushes the charge to the phone
    pub async fn init_booking_payment(
        pool: &PgPool,
        client: &NotchPayClient,
        tenant_id: Uuid,
        req: &InitPaymentRequest,
        callback_url: &str,
    ) -> Result<InitPaymentResponse, FindamError> {
        let booking = BookingRepository::get_by_id(pool, req.booking_id).await?;

        if booking.tenant_id != tenant_id {
            return Err(FindamError::Forbidden);
        }

        if booking.status == booking_status::CANCELLED {
            return Err(FindamError::BookingConflict(
                "Cancelled bookings cannot be paid".to_string(),
            ));
        }

        if booking.payment_status == payment_status::PAID {
            return Err(FindamError::BookingConflict(
                "Booking is already paid".to_string(),
            ));
        }

        let tenant = UserRepository::get_by_id(pool, tenant_id).await?;

        let reference = notchpay::generate_reference();
        let payment_transaction = PaymentRepository::create_payment_transaction(
            pool,
            booking.id,
            booking.total_price,
            payment_method_type::MOBILE_MONEY,
            &reference,
        )
        .await?;

        let customer = CustomerInfo {
            email: tenant.email.clone(),
            phone: notchpay::format_phone_number(&req.phone_number),
            name: tenant.full_name(),
        };

        let metadata = json!({
            "booking_id": booking.id,
            "payment_transaction_id": payment_transaction.id,
        });

        let init_response = client
            .initialize_payment(
                booking.total_price,
                &reference,
                &format!("Réservation Findam {}", booking.id),
                &customer,
                Some(metadata),
                Some(callback_url),
            )
            .await?;

        let gateway_reference = init_response.reference().map(|r| r.to_string());
        let response_value =
            serde_json::to_value(&init_response).unwrap_or_else(|_| Value::Null);

        PaymentRepository::attach_gateway_response(
            pool,
            payment_transaction.id,
            gateway_reference.as_deref(),
            &response_value,
        )
        .await?;

        // Push the charge to the customer's phone
        let channel = notchpay::mobile_operator_channel(req.operator.as_deref());
        let mut status = transaction_status::PENDING;

        if let Some(ref gateway_ref) = gateway_reference {
            let process_response = client
                .process_payment(gateway_ref, channel, Some(&customer.phone))
                .await?;

            if let Some(gateway_status) = process_response
                .transaction_status()
                .or(process_response.status.as_deref())
            {
                status = notchpay::convert_gateway_status(gateway_status);
            } else {
                status = transaction_status::PROCESSING;
            }

            PaymentRepository::update_payment_transaction_status(
                pool,
                payment_transaction.id,
                status,
            )
            .await?;
            Self::propagate_to_booking(pool, booking.id, status).await?;
        }

        log::info!(
            "Payment {} initialized for booking {} ({} XAF, status {})",
            reference,
            booking.id,
            booking.total_price,
            status
        );

        Ok(InitPaymentResponse {
            payment_transaction_id: payment_transaction.id,
            reference,
            gateway_reference,
            authorization_url: init_response.authorization_url.clone(),
            status: status.to_string(),
            amount: booking.total_price,
            currency: "XAF",
        })
    }

    /// Re-check a payment against the gateway and sync our records
    pub async fn verify_payment(
        pool: &PgPool,
        client: &NotchPayClient,
        reference: &str,
    ) -> Result<PaymentTransaction, FindamError> {
        let payment_transaction =
            PaymentRepository::get_payment_transaction_by_reference(pool, reference).await?;

        let gateway_ref = payment_transaction
            .gateway_reference
            .as_deref()
            .unwrap_or(&payment_transaction.reference);

        let response = client.verify_payment(gateway_ref).await?;

        if let Some(gateway_status) = response.transaction_status() {
            let status = notchpay::convert_gateway_status(gateway_status);
            Self::apply_status(pool, &payment_transaction, status).await?;
        }

        PaymentRepository::get_payment_transaction_by_reference(pool, reference).await
    }

    /// Apply a webhook event to the matching payment transaction
    /// DOCUMENTATION: The event carries the gateway transaction with our
    /// merchant reference; signature verification happens in the handler
    pub async fn handle_webhook_event(pool: &PgPool, event: &Value) -> Result<(), FindamError> {
        let transaction = event
            .get("data")
            .or_else(|| event.get("transaction"))
            .ok_or_else(|| {
                FindamError::InvalidInput("Webhook without transaction payload".to_string())
            })?;

        let reference = transaction
            .get("merchant_reference")
            .or_else(|| transaction.get("reference"))
            .and_then(|r| r.as_str())
            .ok_or_else(|| {
                FindamError::InvalidInput("Webhook without a reference".to_string())
            })?;

        let gateway_status = transaction
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or("pending");

        let payment_transaction =
            PaymentRepository::get_payment_transaction_by_reference(pool, reference).await?;

        let status = notchpay::convert_gateway_status(gateway_status);
        log::info!(
            "Webhook for payment {}: gateway status '{}' -> '{}'",
            reference,
            gateway_status,
            status
        );

        Self::apply_status(pool, &payment_transaction, status).await
    }

    /// Propagate a gateway status onto our records
    async fn apply_status(
        pool: &PgPool,
        payment_transaction: &PaymentTransaction,
        status: &str,
    ) -> Result<(), FindamError> {
        if payment_transaction.status == status {
            return Ok(());
        }

        PaymentRepository::update_payment_transaction_status(pool, payment_transaction.id, status)
            .await?;
        Self::propagate_to_booking(pool, payment_transaction.booking_id, status).await?;

        // A completed payment feeds the ledger and fixes the commission
        if status == transaction_status::COMPLETED {
            let booking =
                BookingRepository::get_by_id(pool, payment_transaction.booking_id).await?;

            PaymentRepository::create_transaction(
                pool,
                booking.tenant_id,
                transaction_type::PAYMENT,
                transaction_status::COMPLETED,
                payment_transaction.amount,
                Some(booking.id),
                Some(payment_transaction.id),
                payment_transaction.gateway_reference.as_deref(),
                &format!("Paiement de la réservation {}", booking.id),
            )
            .await?;

            Self::compute_commission(pool, &booking).await?;
        }

        Ok(())
    }

    /// Map an internal transaction status to the booking payment status
    async fn propagate_to_booking(
        pool: &PgPool,
        booking_id: Uuid,
        status: &str,
    ) -> Result<(), FindamError> {
        let booking_payment_status = match status {
            "completed" => payment_status::PAID,
            "refunded" => payment_status::REFUNDED,
            "failed" => payment_status::FAILED,
            "processing" => payment_status::AUTHORIZED,
            _ => payment_status::PENDING,
        };

        BookingRepository::update_payment_status(pool, booking_id, booking_payment_status).await
    }

    /// Compute and store the commission split for a paid booking
    pub async fn compute_commission(
        pool: &PgPool,
        booking: &Booking,
    ) -> Result<Commission, FindamError> {
        let property = PropertyRepository::get_by_id(pool, booking.property_id).await?;
        let subscription =
            UserRepository::get_active_subscription(pool, property.owner_id).await?;

        let owner_rate = pricing::owner_commission_rate(
            subscription.as_ref().map(|s| s.subscription_type.as_str()),
        );
        let owner_amount = pricing::apply_rate(booking.base_price, owner_rate);

        // The tenant side was already charged as the service fee
        let tenant_amount = booking.service_fee;
        let tenant_rate = 7.0;

        PaymentRepository::upsert_commission(
            pool,
            booking.id,
            owner_amount,
            tenant_amount,
            owner_rate,
            tenant_rate,
        )
        .await
    }
}
