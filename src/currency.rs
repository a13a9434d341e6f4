use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use crate::invoice::{round_money, Invoice};

const DEFAULT_API_BASE: &str = "https://api.exchangerate-api.com/v4/latest";

/// Env override for the rate endpoint, mainly so tests can point the
/// provider at an unreachable address and exercise the fallback path.
pub const RATE_API_ENV: &str = "QUICKBILL_RATE_API";

const CACHE_TTL: Duration = Duration::from_secs(60 * 60);
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Currency {
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "INR")]
    Inr,
    #[serde(rename = "GBP")]
    Gbp,
}

impl Currency {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Some(Self::Usd),
            "EUR" => Some(Self::Eur),
            "INR" => Some(Self::Inr),
            "GBP" => Some(Self::Gbp),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Inr => "INR",
            Self::Gbp => "GBP",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Usd => "$",
            Self::Eur => "€",
            Self::Inr => "₹",
            Self::Gbp => "£",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Where a conversion rate came from, so callers can warn the user when an
/// approximate static rate was used instead of a live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    Live,
    Fallback,
}

struct CachedRates {
    rates: HashMap<String, f64>,
    fetched_at: Instant,
}

/// Fetches exchange rates keyed by source currency, caching each table for
/// an hour. Any provider failure degrades to the static table; a missing
/// pair degrades to 1 so a currency switch never fails outright.
pub struct RateProvider {
    agent: ureq::Agent,
    base_url: String,
    cache: HashMap<Currency, CachedRates>,
}

impl RateProvider {
    pub fn new() -> Self {
        let base_url =
            std::env::var(RATE_API_ENV).unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        Self::with_base_url(base_url)
    }

    pub fn with_base_url(base_url: String) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(FETCH_TIMEOUT))
            .build()
            .into();
        Self {
            agent,
            base_url,
            cache: HashMap::new(),
        }
    }

    pub fn rate(&mut self, from: Currency, to: Currency) -> (Decimal, RateSource) {
        if from == to {
            return (Decimal::ONE, RateSource::Live);
        }

        if let Some(rates) = self.rates_for(from) {
            let rate = rates
                .get(to.code())
                .copied()
                .and_then(Decimal::from_f64)
                .filter(|r| *r > Decimal::ZERO)
                .unwrap_or(Decimal::ONE);
            return (rate, RateSource::Live);
        }

        (fallback_rate(from, to), RateSource::Fallback)
    }

    fn rates_for(&mut self, base: Currency) -> Option<&HashMap<String, f64>> {
        let stale = self
            .cache
            .get(&base)
            .map_or(true, |c| c.fetched_at.elapsed() >= CACHE_TTL);
        if stale {
            let fetched = self.fetch(base)?;
            self.cache.insert(
                base,
                CachedRates {
                    rates: fetched,
                    fetched_at: Instant::now(),
                },
            );
        }
        self.cache.get(&base).map(|c| &c.rates)
    }

    fn fetch(&self, base: Currency) -> Option<HashMap<String, f64>> {
        let url = format!("{}/{}", self.base_url, base.code());
        let body: String = self
            .agent
            .get(&url)
            .call()
            .ok()?
            .body_mut()
            .read_to_string()
            .ok()?;
        let json: serde_json::Value = serde_json::from_str(&body).ok()?;
        let rates = json.get("rates")?.as_object()?;
        Some(
            rates
                .iter()
                .filter_map(|(code, v)| v.as_f64().map(|r| (code.clone(), r)))
                .collect(),
        )
    }
}

impl Default for RateProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Approximate static rates used when the provider is unreachable.
/// Unknown pairs convert at 1 so the currency label still switches.
pub fn fallback_rate(from: Currency, to: Currency) -> Decimal {
    use Currency::*;
    match (from, to) {
        (Usd, Eur) => dec!(0.92),
        (Usd, Gbp) => dec!(0.79),
        (Usd, Inr) => dec!(83.5),
        (Eur, Usd) => dec!(1.09),
        (Eur, Gbp) => dec!(0.86),
        (Eur, Inr) => dec!(90.5),
        (Gbp, Usd) => dec!(1.27),
        (Gbp, Eur) => dec!(1.16),
        (Gbp, Inr) => dec!(105.5),
        (Inr, Usd) => dec!(0.012),
        (Inr, Eur) => dec!(0.011),
        (Inr, Gbp) => dec!(0.0095),
        _ => Decimal::ONE,
    }
}

/// Rewrite every monetary field of the invoice at the given rate.
///
/// Each unit price and the discount amount is rounded to 2 decimals on its
/// own, which lets tiny rounding drift accumulate across many items; that
/// per-field behavior is intentional and covered by tests.
pub fn convert_invoice(invoice: &mut Invoice, to: Currency, rate: Decimal) {
    for item in &mut invoice.items {
        item.unit_price = round_money(item.unit_price * rate);
    }
    invoice.discount_amount = round_money(invoice.discount_amount * rate);
    invoice.currency = to;
}
