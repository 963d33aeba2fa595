// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod auth;
pub mod booking_service;
pub mod cancellation;
pub mod config_cache;
pub mod invoice;
pub mod message_filter;
pub mod notchpay;
pub mod payment_service;
pub mod payout_service;
pub mod pricing;

pub use booking_service::BookingService;
pub use config_cache::{start_cleanup_task, ConfigCache};
pub use notchpay::NotchPayClient;
pub use payment_service::PaymentService;
pub use payout_service::{start_payout_processor, PayoutService};
