// src/bin/smoke.rs
// End-to-end exerciser for a locally running findam-api instance.
// Registers an owner and a tenant, lists a property, quotes and books a
// stay, then fetches the invoice.

use anyhow::{bail, Context, Result};
use dotenv::dotenv;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::env;
use std::time::Instant;

// --- ANSI colors for terminal output ---
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

#[derive(Debug, Deserialize)]
struct TokenPair {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct AuthPayload {
    tokens: TokenPair,
}

struct Api {
    client: Client,
    base_url: String,
}

impl Api {
    async fn post(&self, path: &str, token: Option<&str>, body: Value) -> Result<Value> {
        let mut request = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(&body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.context("request failed")?;
        let status = response.status();
        let value: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            bail!("POST {} returned {}: {}", path, status, value);
        }
        Ok(value)
    }

    async fn get(&self, path: &str, token: Option<&str>) -> Result<Value> {
        let mut request = self.client.get(format!("{}{}", self.base_url, path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.context("request failed")?;
        let status = response.status();
        let value: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            bail!("GET {} returned {}: {}", path, status, value);
        }
        Ok(value)
    }
}

fn step(label: &str) {
    println!("{}{}==>{} {}", BOLD, CYAN, RESET, label);
}

fn ok(label: &str) {
    println!("    {}{}✓{} {}", BOLD, GREEN, RESET, label);
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let base_url =
        env::var("SMOKE_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:8004".to_string());
    let api = Api {
        client: Client::new(),
        base_url: base_url.clone(),
    };

    println!(
        "{}{}findam-api smoke run{} against {}\n",
        BOLD, YELLOW, RESET, base_url
    );
    let started = Instant::now();

    // 1. Health
    step("Health check");
    let health = api.get("/health", None).await?;
    if health["status"] != "ok" {
        bail!("service unhealthy: {}", health);
    }
    ok("service is up");

    // 2. Accounts (unique per run so the smoke can be repeated)
    step("Register owner and tenant");
    let run_tag = std::process::id();
    let owner_email = format!("owner-{}@smoke.findam.cm", run_tag);
    let tenant_email = format!("tenant-{}@smoke.findam.cm", run_tag);

    let owner: AuthPayload = serde_json::from_value(
        api.post(
            "/api/v1/auth/register",
            None,
            json!({
                "email": owner_email,
                "phone_number": format!("6{:08}", run_tag % 100_000_000),
                "password": "smoke-password-1",
                "first_name": "Paul",
                "last_name": "Essomba",
                "user_type": "owner",
            }),
        )
        .await?,
    )?;
    let tenant: AuthPayload = serde_json::from_value(
        api.post(
            "/api/v1/auth/register",
            None,
            json!({
                "email": tenant_email,
                "phone_number": format!("6{:08}", (run_tag + 1) % 100_000_000),
                "password": "smoke-password-2",
                "first_name": "Aline",
                "last_name": "Mbarga",
                "user_type": "tenant",
            }),
        )
        .await?,
    )?;
    ok("both accounts created");

    // 3. Catalog
    step("Load city catalog");
    let cities = api.get("/api/v1/cities", None).await?;
    let city_id = cities
        .as_array()
        .and_then(|c| c.first())
        .and_then(|c| c["id"].as_i64())
        .context("no cities seeded - run the schema seed first")?;
    let neighborhoods = api
        .get(&format!("/api/v1/cities/{}/neighborhoods", city_id), None)
        .await?;
    let neighborhood_id = neighborhoods
        .as_array()
        .and_then(|n| n.first())
        .and_then(|n| n["id"].as_i64())
        .context("city has no neighborhoods")?;
    ok("city and neighborhood resolved");

    // 4. Property
    step("Create and publish a property");
    let owner_token = Some(owner.tokens.access_token.as_str());
    let property = api
        .post(
            "/api/v1/properties",
            owner_token,
            json!({
                "title": "Appartement smoke-test Akwa",
                "description": "Deux chambres, balcon, fibre.",
                "property_type": "apartment",
                "capacity": 4,
                "bedrooms": 2,
                "bathrooms": 1,
                "city_id": city_id,
                "neighborhood_id": neighborhood_id,
                "address": "Rue de la Joie, Akwa",
                "price_per_night": 25000,
                "cleaning_fee": 5000,
                "security_deposit": 50000,
            }),
        )
        .await?;
    let property_id = property["id"].as_str().context("property id missing")?.to_string();
    api.post(
        &format!("/api/v1/properties/{}/publish", property_id),
        owner_token,
        json!({}),
    )
    .await?;
    ok("property online");

    // 5. Quote then book
    step("Quote and book a 4-night stay");
    let tenant_token = Some(tenant.tokens.access_token.as_str());
    let check_in = chrono::Utc::now().date_naive() + chrono::Duration::days(30);
    let check_out = check_in + chrono::Duration::days(4);
    let stay = json!({
        "property_id": property_id,
        "check_in_date": check_in,
        "check_out_date": check_out,
        "guests_count": 2,
    });

    let quote = api.post("/api/v1/bookings/quote", tenant_token, stay.clone()).await?;
    let total = quote["total_price"].as_i64().context("quote without total")?;
    ok(&format!("quoted at {} XAF", total));

    let booking = api.post("/api/v1/bookings", tenant_token, stay).await?;
    let booking_id = booking["id"].as_str().context("booking id missing")?.to_string();
    if booking["total_price"].as_i64() != Some(total) {
        bail!("booking total diverges from the quote");
    }
    ok("booking created");

    api.post(
        &format!("/api/v1/bookings/{}/confirm", booking_id),
        owner_token,
        json!({}),
    )
    .await?;
    ok("booking confirmed by the owner");

    // 6. Invoice
    step("Fetch the HTML invoice");
    let invoice = api
        .client
        .get(format!("{}/api/v1/bookings/{}/invoice", base_url, booking_id))
        .bearer_auth(tenant.tokens.access_token.as_str())
        .send()
        .await?;
    if !invoice.status().is_success() {
        bail!("invoice returned {}", invoice.status());
    }
    let html = invoice.text().await?;
    if !html.contains("FCFA") || !html.contains("Findam") {
        bail!("invoice does not look like a receipt");
    }
    ok("invoice rendered");

    println!(
        "\n{}{}All steps passed{} in {:.1}s",
        BOLD,
        GREEN,
        RESET,
        started.elapsed().as_secs_f64()
    );
    Ok(())
}
