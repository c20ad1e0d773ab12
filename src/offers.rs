// src/offers.rs
//! Streaming-availability offers: classification into stream/rent/buy
//! buckets and display formatting. Offers are recomputed per country
//! selection and never persisted.

use serde::{Deserialize, Serialize};

/// Commercial model of one offer as reported by the streaming catalog.
/// Anything we do not recognize is kept as `Other` and dropped during
/// classification (not an error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonetizationKind {
    Flatrate,
    Ads,
    Rent,
    Buy,
    #[serde(other)]
    Other,
}

/// Picture quality of one offer. The catalog spells 4K as "_4K".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationQuality {
    #[serde(rename = "SD")]
    Sd,
    #[serde(rename = "HD")]
    Hd,
    #[serde(rename = "_4K")]
    FourK,
    #[serde(other)]
    Unknown,
}

impl PresentationQuality {
    /// Short label for badges. Unknown kinds render as SD, matching how
    /// the catalog treats everything below HD.
    pub fn label(&self) -> &'static str {
        match self {
            PresentationQuality::FourK => "4K",
            PresentationQuality::Hd => "HD",
            PresentationQuality::Sd | PresentationQuality::Unknown => "SD",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferPackage {
    pub name: String,
    #[serde(default)]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Offer {
    pub package: OfferPackage,
    pub monetization: MonetizationKind,
    pub presentation: PresentationQuality,
    #[serde(default)]
    pub price_value: Option<f64>,
    #[serde(default)]
    pub price_currency: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Offer {
    /// Preformatted price for rent/buy badges; empty when price or
    /// currency is missing, rather than failing.
    pub fn price_label(&self) -> String {
        format_price(self.price_value, self.price_currency.as_deref())
    }
}

// Serialized in display form: the UI gets the quality and price labels,
// not the raw wire fields they were derived from.
impl Serialize for Offer {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("Offer", 5)?;
        s.serialize_field("package", &self.package)?;
        s.serialize_field("monetization", &self.monetization)?;
        s.serialize_field("quality", self.presentation.label())?;
        s.serialize_field("price", &self.price_label())?;
        s.serialize_field("url", &self.url)?;
        s.end()
    }
}

/// Classified offers for the selected country, each bucket sorted by
/// provider package name (case-sensitive ordinal order) so the UI renders
/// deterministically.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OfferBuckets {
    pub stream: Vec<Offer>,
    pub rent: Vec<Offer>,
    pub buy: Vec<Offer>,
}

impl OfferBuckets {
    pub fn is_empty(&self) -> bool {
        self.stream.is_empty() && self.rent.is_empty() && self.buy.is_empty()
    }
}

/// Exhaustive, mutually exclusive partition by monetization kind:
/// FLATRATE and ADS stream, RENT rents, BUY buys, anything else is dropped.
pub fn classify(offers: Vec<Offer>) -> OfferBuckets {
    let mut buckets = OfferBuckets::default();
    for offer in offers {
        match offer.monetization {
            MonetizationKind::Flatrate | MonetizationKind::Ads => buckets.stream.push(offer),
            MonetizationKind::Rent => buckets.rent.push(offer),
            MonetizationKind::Buy => buckets.buy.push(offer),
            MonetizationKind::Other => {}
        }
    }
    for bucket in [&mut buckets.stream, &mut buckets.rent, &mut buckets.buy] {
        bucket.sort_by(|a, b| a.package.name.cmp(&b.package.name));
    }
    buckets
}

/// Currency formatting for offer badges. Whole amounts drop the fraction
/// ("$4", "$3.99"); unknown currency codes fall back to "CODE amount".
/// Missing price or currency yields an empty string.
pub fn format_price(value: Option<f64>, currency: Option<&str>) -> String {
    let (value, currency) = match (value, currency) {
        (Some(v), Some(c)) if !c.is_empty() => (v, c),
        _ => return String::new(),
    };

    let amount = if (value - value.trunc()).abs() < 1e-9 {
        format!("{}", value.trunc() as i64)
    } else {
        format!("{value:.2}")
    };

    match currency_symbol(currency) {
        Some(symbol) => format!("{symbol}{amount}"),
        None => format!("{} {}", currency.to_ascii_uppercase(), amount),
    }
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    match code.to_ascii_uppercase().as_str() {
        "USD" | "CAD" | "AUD" | "NZD" | "MXN" => Some("$"),
        "EUR" => Some("\u{20AC}"),
        "GBP" => Some("\u{00A3}"),
        "JPY" | "CNY" => Some("\u{00A5}"),
        "INR" => Some("\u{20B9}"),
        "KRW" => Some("\u{20A9}"),
        "BRL" => Some("R$"),
        "CHF" => Some("CHF "),
        "SEK" | "NOK" | "DKK" => Some("kr "),
        "PLN" => Some("z\u{0142} "),
        _ => None,
    }
}
