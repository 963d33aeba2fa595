// src/services/invoice.rs
// DOCUMENTATION: Server-side HTML invoice/receipt rendering
// PURPOSE: Turn a booking and its parties into a self-contained HTML
// document

use crate::models::{Booking, Property, User};
use chrono::Datelike;

/// Group an FCFA amount with non-breaking spaces: 1 234 567 FCFA
pub fn format_fcfa(amount: i64) -> String {
    let negative = amount < 0;
    let digits = amount.unsigned_abs().to_string();

    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('\u{00A0}');
        }
        grouped.push(c);
    }

    if negative {
        format!("-{}\u{00A0}FCFA", grouped)
    } else {
        format!("{}\u{00A0}FCFA", grouped)
    }
}

/// Escape user-supplied text for safe HTML embedding
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Invoice number derived from the booking: FD-{year}-{first id block}
pub fn invoice_number(booking: &Booking) -> String {
    let id = booking.id.simple().to_string();
    format!(
        "FD-{}-{}",
        booking.created_at.year(),
        id[..8].to_uppercase()
    )
}

/// Human label for a payment status badge
fn payment_status_label(status: &str) -> (&'static str, &'static str) {
    match status {
        "paid" => ("Payé", "paid"),
        "authorized" => ("Autorisé", "authorized"),
        "refunded" => ("Remboursé", "refunded"),
        "failed" => ("Échoué", "failed"),
        _ => ("En attente", "pending"),
    }
}

/// Render the complete invoice document
/// DOCUMENTATION: Self-contained HTML with inline styles, suited for
/// browser display and print/PDF export
pub fn render_invoice(
    booking: &Booking,
    property: &Property,
    tenant: &User,
    owner: &User,
) -> String {
    let number = invoice_number(booking);
    let (status_label, status_class) = payment_status_label(&booking.payment_status);
    let nights = booking.nights();

    let discount_row = if booking.discount_amount > 0 {
        format!(
            r#"      <tr class="discount">
        <td>Réduction</td>
        <td class="amount">-{}</td>
      </tr>
"#,
            format_fcfa(booking.discount_amount)
        )
    } else {
        String::new()
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head>
  <meta charset="utf-8">
  <title>Reçu {number}</title>
  <style>
    body {{ font-family: 'Helvetica Neue', Arial, sans-serif; color: #1f2933; margin: 0; background: #f5f7fa; }}
    .invoice {{ max-width: 720px; margin: 24px auto; background: #fff; border-radius: 8px; padding: 32px; box-shadow: 0 1px 4px rgba(0,0,0,0.08); }}
    header {{ display: flex; justify-content: space-between; align-items: flex-start; border-bottom: 2px solid #0b7285; padding-bottom: 16px; }}
    .brand {{ font-size: 24px; font-weight: 700; color: #0b7285; }}
    .brand small {{ display: block; font-size: 12px; font-weight: 400; color: #5f6b76; }}
    .meta {{ text-align: right; font-size: 13px; color: #5f6b76; }}
    .meta strong {{ color: #1f2933; }}
    .badge {{ display: inline-block; padding: 2px 10px; border-radius: 12px; font-size: 12px; font-weight: 600; }}
    .badge.paid {{ background: #d3f9d8; color: #2b8a3e; }}
    .badge.pending {{ background: #fff3bf; color: #e67700; }}
    .badge.authorized {{ background: #d0ebff; color: #1971c2; }}
    .badge.refunded {{ background: #e5dbff; color: #5f3dc4; }}
    .badge.failed {{ background: #ffe3e3; color: #c92a2a; }}
    section {{ margin-top: 24px; }}
    h2 {{ font-size: 14px; text-transform: uppercase; letter-spacing: 0.06em; color: #5f6b76; margin: 0 0 8px; }}
    .stay {{ display: flex; gap: 32px; font-size: 14px; }}
    .stay div span {{ display: block; color: #5f6b76; font-size: 12px; }}
    table {{ width: 100%; border-collapse: collapse; margin-top: 8px; font-size: 14px; }}
    td {{ padding: 8px 0; border-bottom: 1px solid #e4e9ee; }}
    td.amount {{ text-align: right; white-space: nowrap; }}
    tr.discount td {{ color: #2b8a3e; }}
    tr.total td {{ border-bottom: none; border-top: 2px solid #0b7285; font-size: 16px; font-weight: 700; padding-top: 12px; }}
    .parties {{ display: flex; gap: 32px; font-size: 13px; }}
    .parties div {{ flex: 1; }}
    footer {{ margin-top: 32px; font-size: 11px; color: #8795a1; text-align: center; }}
  </style>
</head>
<body>
  <div class="invoice">
    <header>
      <div class="brand">Findam<small>Location de logements au Cameroun</small></div>
      <div class="meta">
        Reçu <strong>{number}</strong><br>
        Émis le {issue_date}<br>
        <span class="badge {status_class}">{status_label}</span>
      </div>
    </header>

    <section>
      <h2>Séjour</h2>
      <div class="stay">
        <div><span>Logement</span>{property_title}</div>
        <div><span>Arrivée</span>{check_in}</div>
        <div><span>Départ</span>{check_out}</div>
        <div><span>Nuits</span>{nights}</div>
        <div><span>Voyageurs</span>{guests}</div>
      </div>
    </section>

    <section>
      <h2>Détail du prix</h2>
      <table>
      <tr>
        <td>Hébergement ({nights} nuit(s))</td>
        <td class="amount">{base_price}</td>
      </tr>
      <tr>
        <td>Frais de ménage</td>
        <td class="amount">{cleaning_fee}</td>
      </tr>
      <tr>
        <td>Caution</td>
        <td class="amount">{security_deposit}</td>
      </tr>
{discount_row}      <tr>
        <td>Frais de service</td>
        <td class="amount">{service_fee}</td>
      </tr>
      <tr class="total">
        <td>Total</td>
        <td class="amount">{total_price}</td>
      </tr>
      </table>
    </section>

    <section class="parties">
      <div>
        <h2>Locataire</h2>
        {tenant_name}<br>
        {tenant_email}<br>
        {tenant_phone}
      </div>
      <div>
        <h2>Propriétaire</h2>
        {owner_name}<br>
        {owner_email}
      </div>
    </section>

    <footer>
      Findam &mdash; Réservation {booking_id} &mdash; Montants en francs CFA (XAF)
    </footer>
  </div>
</body>
</html>
"#,
        number = escape_html(&number),
        issue_date = booking.created_at.format("%d/%m/%Y"),
        status_class = status_class,
        status_label = status_label,
        property_title = escape_html(&property.title),
        check_in = booking.check_in_date.format("%d/%m/%Y"),
        check_out = booking.check_out_date.format("%d/%m/%Y"),
        nights = nights,
        guests = booking.guests_count,
        base_price = format_fcfa(booking.base_price),
        cleaning_fee = format_fcfa(booking.cleaning_fee),
        security_deposit = format_fcfa(booking.security_deposit),
        discount_row = discount_row,
        service_fee = format_fcfa(booking.service_fee),
        total_price = format_fcfa(booking.total_price),
        tenant_name = escape_html(&tenant.full_name()),
        tenant_email = escape_html(&tenant.email),
        tenant_phone = escape_html(&tenant.phone_number),
        owner_name = escape_html(&owner.full_name()),
        owner_email = escape_html(&owner.email),
        booking_id = booking.id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    fn test_booking() -> Booking {
        let created = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        Booking {
            id: Uuid::new_v4(),
            property_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            check_in_date: NaiveDate::from_ymd_opt(2025, 7, 10).unwrap(),
            check_out_date: NaiveDate::from_ymd_opt(2025, 7, 14).unwrap(),
            guests_count: 2,
            base_price: 100_000,
            cleaning_fee: 5_000,
            security_deposit: 50_000,
            promo_code_id: None,
            discount_amount: 10_000,
            service_fee: 6_300,
            total_price: 151_300,
            status: "confirmed".to_string(),
            payment_status: "paid".to_string(),
            special_requests: None,
            notes: None,
            created_at: created,
            updated_at: created,
            cancelled_at: None,
            cancelled_by: None,
        }
    }

    fn test_property(title: &str) -> Property {
        Property {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            property_type: "apartment".to_string(),
            capacity: 4,
            bedrooms: 2,
            bathrooms: 1,
            city_id: 1,
            neighborhood_id: 1,
            address: "Akwa, Douala".to_string(),
            latitude: None,
            longitude: None,
            price_per_night: 25_000,
            price_per_week: None,
            price_per_month: None,
            cleaning_fee: 5_000,
            security_deposit: 50_000,
            allow_discount: true,
            cancellation_policy: "moderate".to_string(),
            amenity_ids: vec![],
            is_published: true,
            is_verified: true,
            avg_rating: 4.5,
            rating_count: 12,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            main_image_url: None,
        }
    }

    fn test_user(email: &str, first: &str, last: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            phone_number: "237650000001".to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            user_type: "tenant".to_string(),
            password_hash: String::new(),
            is_active: true,
            is_verified: true,
            date_joined: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn test_format_fcfa_grouping() {
        assert_eq!(format_fcfa(0), "0\u{00A0}FCFA");
        assert_eq!(format_fcfa(950), "950\u{00A0}FCFA");
        assert_eq!(format_fcfa(25_000), "25\u{00A0}000\u{00A0}FCFA");
        assert_eq!(format_fcfa(1_234_567), "1\u{00A0}234\u{00A0}567\u{00A0}FCFA");
        assert_eq!(format_fcfa(-5_000), "-5\u{00A0}000\u{00A0}FCFA");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Chez&nous"</b>"#),
            "&lt;b&gt;&quot;Chez&amp;nous&quot;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_invoice_number_shape() {
        let booking = test_booking();
        let number = invoice_number(&booking);
        assert!(number.starts_with("FD-2025-"));
        assert_eq!(number.len(), "FD-2025-".len() + 8);
    }

    #[test]
    fn test_render_invoice_contains_breakdown() {
        let booking = test_booking();
        let property = test_property("Appartement Bonanjo");
        let tenant = test_user("aline@example.cm", "Aline", "Mbarga");
        let owner = test_user("paul@example.cm", "Paul", "Essomba");

        let html = render_invoice(&booking, &property, &tenant, &owner);

        assert!(html.contains("Appartement Bonanjo"));
        assert!(html.contains("Aline Mbarga"));
        assert!(html.contains(&format_fcfa(100_000)));
        assert!(html.contains(&format_fcfa(151_300)));
        // Discount shows as a negative line
        assert!(html.contains(&format!("-{}", format_fcfa(10_000))));
        assert!(html.contains("Payé"));
        assert!(html.contains("10/07/2025"));
        assert!(html.contains("4 nuit(s)") || html.contains(">4<"));
    }

    #[test]
    fn test_render_invoice_escapes_user_content() {
        let booking = test_booking();
        let property = test_property("<script>alert('x')</script>");
        let tenant = test_user("aline@example.cm", "Aline", "Mbarga");
        let owner = test_user("paul@example.cm", "Paul", "Essomba");

        let html = render_invoice(&booking, &property, &tenant, &owner);

        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_render_invoice_hides_zero_discount() {
        let mut booking = test_booking();
        booking.discount_amount = 0;
        let property = test_property("Studio Bastos");
        let tenant = test_user("a@example.cm", "A", "B");
        let owner = test_user("c@example.cm", "C", "D");

        let html = render_invoice(&booking, &property, &tenant, &owner);
        assert!(!html.contains("Réduction"));
    }
}
