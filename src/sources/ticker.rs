//! Spot price for one coin from CoinGecko's simple-price endpoint.

use anyhow::Context;
use serde_json::Value;

use super::{http_client, Source};
use crate::core::item::Item;
use crate::ui::theme::Theme;

const SIMPLE_PRICE_URL: &str = "https://api.coingecko.com/api/v3/simple/price";

/// Price and 24h change in one quote currency.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Quote {
    pub price: Option<f64>,
    pub change_24h: Option<f64>,
}

/// Pull `id`'s quote in `currency` out of a simple-price response
/// (`{"bitcoin":{"usd":67000.1,"usd_24h_change":-1.2}}`).
pub fn parse_quote(body: &str, id: &str, currency: &str) -> anyhow::Result<Quote> {
    let root: Value = serde_json::from_str(body).context("response is not JSON")?;
    let coin = root
        .get(id)
        .with_context(|| format!("unknown coin id {id:?}"))?;
    Ok(Quote {
        price: coin.get(currency).and_then(Value::as_f64),
        change_24h: coin
            .get(format!("{currency}_24h_change"))
            .and_then(Value::as_f64),
    })
}

pub struct TickerSource {
    id: String,
    currency: String,
    client: reqwest::blocking::Client,
    theme: Theme,
}

impl TickerSource {
    /// `id` is a CoinGecko coin id (`bitcoin`, `monero`, ...).
    pub fn new(id: &str, currency: &str, theme: Theme) -> anyhow::Result<Self> {
        Ok(Self {
            id: id.trim().to_lowercase(),
            currency: currency.trim().to_lowercase(),
            client: http_client()?,
            theme,
        })
    }

    pub fn render(&self, quote: Quote) -> Vec<Item> {
        let t = &self.theme;
        let cur = self.currency.to_uppercase();
        let price = match quote.price {
            Some(p) if p >= 1.0 => format!("{p:.2} {cur}"),
            Some(p) => format!("{p:.6} {cur}"),
            None => "n/a".into(),
        };
        let change = match quote.change_24h {
            Some(c) => {
                let color = if c >= 0.0 { t.good } else { t.error };
                Item::new(1, 2, format!("{c:+.2}% 24h")).fg(color).bg(t.background)
            }
            None => t.value_item(1, 2, ""),
        };
        vec![
            t.title_item(0, 0, "ticker"),
            t.value_item(0, 1, "coingecko"),
            t.label_item(1, self.id.clone()),
            t.value_item(1, 1, price),
            change,
        ]
    }
}

impl Source for TickerSource {
    fn name(&self) -> &str {
        "ticker"
    }

    fn fetch(&mut self) -> anyhow::Result<Vec<Item>> {
        let body = self
            .client
            .get(SIMPLE_PRICE_URL)
            .query(&[
                ("ids", self.id.as_str()),
                ("vs_currencies", self.currency.as_str()),
                ("include_24hr_change", "true"),
            ])
            .send()
            .and_then(|r| r.error_for_status())
            .context("price lookup failed")?
            .text()?;
        let quote = parse_quote(&body, &self.id, &self.currency)?;
        Ok(self.render(quote))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::item::NamedColor;

    #[test]
    fn parses_price_and_change() {
        let body = r#"{"monero":{"usd":162.35,"usd_24h_change":-2.514}}"#;
        let q = parse_quote(body, "monero", "usd").unwrap();
        assert_eq!(q.price, Some(162.35));
        assert_eq!(q.change_24h, Some(-2.514));
    }

    #[test]
    fn unknown_coin_is_an_error() {
        let err = parse_quote("{}", "nocoin", "usd").unwrap_err();
        assert!(err.to_string().contains("nocoin"));
    }

    #[test]
    fn missing_currency_leaves_fields_empty() {
        let q = parse_quote(r#"{"bitcoin":{"eur":1.0}}"#, "bitcoin", "usd").unwrap();
        assert_eq!(q, Quote::default());
    }

    #[test]
    fn falling_price_is_red() {
        let src = TickerSource::new("Monero", "usd", Theme::default()).unwrap();
        let items = src.render(Quote {
            price: Some(162.351),
            change_24h: Some(-2.5),
        });
        assert_eq!(items[2].text, "monero");
        assert_eq!(items[3].text, "162.35 USD");
        assert_eq!(items[4].text, "-2.50% 24h");
        assert_eq!(items[4].fg, NamedColor::Red);
    }
}
