// src/services/pricing.rs
// DOCUMENTATION: Booking price computation
// PURPOSE: Tiered base price, long-stay and promo discounts, service fee

use crate::errors::FindamError;
use crate::models::{LongStayDiscount, Property};
use serde::Serialize;

/// Full price breakdown for a stay, all amounts in whole FCFA
#[derive(Debug, Clone, Serialize)]
pub struct PriceQuote {
    pub nights: i64,
    pub base_price: i64,
    pub cleaning_fee: i64,
    pub security_deposit: i64,
    /// Long-stay reduction applied to the base
    pub long_stay_discount: i64,
    /// Promo code reduction applied after the long-stay one
    pub promo_discount: i64,
    /// Sum of both reductions, the figure carried on the booking
    pub discount_amount: i64,
    /// Guest-side commission
    pub service_fee: i64,
    pub total_price: i64,
}

/// Apply a percentage rate to an amount, rounding to the nearest franc
/// XAF has no minor unit so every intermediate figure is a whole number
pub fn apply_rate(amount: i64, rate_percent: f64) -> i64 {
    (amount as f64 * rate_percent / 100.0).round() as i64
}

/// Base price for a number of nights, using the property's weekly and
/// monthly tiers when the stay is long enough
/// DOCUMENTATION: months/weeks are billed at their tier price, the
/// remaining days at the nightly rate
pub fn base_price_for_nights(property: &Property, nights: i64) -> i64 {
    if nights >= 30 {
        if let Some(monthly) = property.price_per_month {
            let months = nights / 30;
            let remaining = nights % 30;
            return months * monthly + remaining * property.price_per_night;
        }
    }

    if nights >= 7 {
        if let Some(weekly) = property.price_per_week {
            let weeks = nights / 7;
            let remaining = nights % 7;
            return weeks * weekly + remaining * property.price_per_night;
        }
    }

    nights * property.price_per_night
}

/// Best long-stay discount percentage for a stay length
/// Picks the tier with the highest qualifying min_days
pub fn best_long_stay_rate(discounts: &[LongStayDiscount], nights: i64) -> f64 {
    discounts
        .iter()
        .filter(|d| i64::from(d.min_days) <= nights)
        .max_by_key(|d| d.min_days)
        .map(|d| d.discount_percentage)
        .unwrap_or(0.0)
}

/// Owner-side commission rate by subscription plan
pub fn owner_commission_rate(subscription_type: Option<&str>) -> f64 {
    match subscription_type {
        Some("monthly") => 2.0,
        Some("quarterly") => 1.5,
        Some("yearly") => 1.0,
        // Free plan and owners without a subscription
        _ => 3.0,
    }
}

/// Compute the complete price breakdown for a stay
///
/// The long-stay discount reduces the base first; a valid promo code then
/// applies to the reduced base. The service fee is charged on what the
/// guest actually pays for the stay itself (base minus discounts).
pub fn compute_quote(
    property: &Property,
    nights: i64,
    discounts: &[LongStayDiscount],
    promo_rate: Option<f64>,
    service_fee_rate: f64,
) -> Result<PriceQuote, FindamError> {
    if nights < 1 {
        return Err(FindamError::ValidationError(
            "Stay must cover at least one night".to_string(),
        ));
    }

    let base_price = base_price_for_nights(property, nights);

    let long_stay_rate = if property.allow_discount {
        best_long_stay_rate(discounts, nights)
    } else {
        0.0
    };
    let long_stay_discount = apply_rate(base_price, long_stay_rate);

    let promo_discount = match promo_rate {
        Some(rate) => apply_rate(base_price - long_stay_discount, rate),
        None => 0,
    };

    let discount_amount = long_stay_discount + promo_discount;
    let service_fee = apply_rate(base_price - discount_amount, service_fee_rate);

    let total_price = base_price + property.cleaning_fee + property.security_deposit
        + service_fee
        - discount_amount;

    Ok(PriceQuote {
        nights,
        base_price,
        cleaning_fee: property.cleaning_fee,
        security_deposit: property.security_deposit,
        long_stay_discount,
        promo_discount,
        discount_amount,
        service_fee,
        total_price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn test_property(night: i64, week: Option<i64>, month: Option<i64>) -> Property {
        Property {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "Studio meublé Bonapriso".to_string(),
            description: "Studio lumineux".to_string(),
            property_type: "studio".to_string(),
            capacity: 2,
            bedrooms: 1,
            bathrooms: 1,
            city_id: 1,
            neighborhood_id: 1,
            address: "Rue Njo-Njo".to_string(),
            latitude: None,
            longitude: None,
            price_per_night: night,
            price_per_week: week,
            price_per_month: month,
            cleaning_fee: 5_000,
            security_deposit: 50_000,
            allow_discount: true,
            cancellation_policy: "moderate".to_string(),
            amenity_ids: vec![],
            is_published: true,
            is_verified: true,
            avg_rating: 0.0,
            rating_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            main_image_url: None,
        }
    }

    fn discount(min_days: i32, percentage: f64) -> LongStayDiscount {
        LongStayDiscount {
            id: Uuid::new_v4(),
            property_id: Uuid::new_v4(),
            min_days,
            discount_percentage: percentage,
        }
    }

    #[test]
    fn test_nightly_base() {
        let property = test_property(25_000, None, None);
        assert_eq!(base_price_for_nights(&property, 3), 75_000);
    }

    #[test]
    fn test_weekly_tier() {
        let property = test_property(25_000, Some(150_000), None);
        // 1 week + 3 nights
        assert_eq!(base_price_for_nights(&property, 10), 150_000 + 75_000);
        // Below 7 nights the weekly rate is ignored
        assert_eq!(base_price_for_nights(&property, 6), 150_000);
    }

    #[test]
    fn test_monthly_tier() {
        let property = test_property(25_000, Some(150_000), Some(500_000));
        // 1 month + 5 nights at the nightly rate
        assert_eq!(base_price_for_nights(&property, 35), 500_000 + 125_000);
        // Without a monthly price, a 35-night stay falls back to weeks
        let weekly_only = test_property(25_000, Some(150_000), None);
        assert_eq!(base_price_for_nights(&weekly_only, 35), 5 * 150_000);
    }

    #[test]
    fn test_best_long_stay_rate() {
        let tiers = vec![discount(7, 5.0), discount(30, 15.0)];
        assert_eq!(best_long_stay_rate(&tiers, 3), 0.0);
        assert_eq!(best_long_stay_rate(&tiers, 10), 5.0);
        assert_eq!(best_long_stay_rate(&tiers, 45), 15.0);
    }

    #[test]
    fn test_quote_without_discounts() {
        let property = test_property(25_000, None, None);
        let quote = compute_quote(&property, 4, &[], None, 7.0).unwrap();

        assert_eq!(quote.base_price, 100_000);
        assert_eq!(quote.discount_amount, 0);
        // 7% of 100 000
        assert_eq!(quote.service_fee, 7_000);
        // base + cleaning + deposit + fee
        assert_eq!(quote.total_price, 100_000 + 5_000 + 50_000 + 7_000);
    }

    #[test]
    fn test_quote_with_promo() {
        let property = test_property(25_000, None, None);
        let quote = compute_quote(&property, 4, &[], Some(10.0), 7.0).unwrap();

        assert_eq!(quote.promo_discount, 10_000);
        // Fee charged on the discounted base: 7% of 90 000
        assert_eq!(quote.service_fee, 6_300);
        assert_eq!(
            quote.total_price,
            100_000 + 5_000 + 50_000 + 6_300 - 10_000
        );
    }

    #[test]
    fn test_quote_stacks_long_stay_then_promo() {
        let property = test_property(10_000, None, None);
        let tiers = vec![discount(7, 10.0)];
        let quote = compute_quote(&property, 10, &tiers, Some(10.0), 7.0).unwrap();

        assert_eq!(quote.base_price, 100_000);
        assert_eq!(quote.long_stay_discount, 10_000);
        // Promo applies to the reduced base of 90 000
        assert_eq!(quote.promo_discount, 9_000);
        assert_eq!(quote.discount_amount, 19_000);
        // 7% of 81 000
        assert_eq!(quote.service_fee, 5_670);
    }

    #[test]
    fn test_quote_ignores_discounts_when_disallowed() {
        let mut property = test_property(10_000, None, None);
        property.allow_discount = false;
        let tiers = vec![discount(7, 10.0)];
        let quote = compute_quote(&property, 10, &tiers, None, 7.0).unwrap();

        assert_eq!(quote.long_stay_discount, 0);
    }

    #[test]
    fn test_quote_rejects_empty_stay() {
        let property = test_property(10_000, None, None);
        assert!(compute_quote(&property, 0, &[], None, 7.0).is_err());
    }

    #[test]
    fn test_service_fee_rounding() {
        // 7% of 333 = 23.31 -> rounds to 23
        assert_eq!(apply_rate(333, 7.0), 23);
        // 7% of 350 = 24.5 -> rounds to 25
        assert_eq!(apply_rate(350, 7.0), 25);
    }

    #[test]
    fn test_owner_commission_rates() {
        assert_eq!(owner_commission_rate(None), 3.0);
        assert_eq!(owner_commission_rate(Some("free")), 3.0);
        assert_eq!(owner_commission_rate(Some("monthly")), 2.0);
        assert_eq!(owner_commission_rate(Some("quarterly")), 1.5);
        assert_eq!(owner_commission_rate(Some("yearly")), 1.0);
    }
}
