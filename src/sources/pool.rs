//! Remote pool statistics (JSON over HTTP).
//!
//! Two kinds of pool are understood: Cardano stake pools (live stake,
//! delegators, blocks minted, saturation, as served by Koios-style APIs)
//! and hash-rate pools.  APIs disagree on field names, on whether the
//! numbers sit at the top level, under a `pool_statistics` object or in a
//! one-element array, and on whether big amounts are JSON numbers or
//! strings, so decoding accepts the common spellings and leaves anything
//! missing as `None`.

use anyhow::Context;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::format::{grouped, human_rate};
use super::{http_client, Source};
use crate::core::item::Item;
use crate::ui::theme::Theme;

const LOVELACE_PER_ADA: f64 = 1_000_000.0;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PoolStats {
    #[serde(alias = "poolTicker")]
    pub ticker: Option<String>,
    /// Delegated stake, in lovelace.
    #[serde(alias = "live_stake", alias = "liveStake", deserialize_with = "lenient_f64")]
    pub stake: Option<f64>,
    #[serde(alias = "live_delegators", alias = "delegatorCount", deserialize_with = "lenient_u64")]
    pub delegators: Option<u64>,
    #[serde(alias = "block_count", alias = "blocksMinted", deserialize_with = "lenient_u64")]
    pub blocks_minted: Option<u64>,
    /// Saturation as a percentage of the pool cap.
    #[serde(alias = "live_saturation", deserialize_with = "lenient_f64")]
    pub saturation: Option<f64>,

    #[serde(alias = "hashRate", alias = "poolHashrate", deserialize_with = "lenient_f64")]
    pub hashrate: Option<f64>,
    #[serde(alias = "minersCount", deserialize_with = "lenient_u64")]
    pub miners: Option<u64>,
    #[serde(alias = "workersCount", deserialize_with = "lenient_u64")]
    pub workers: Option<u64>,
    #[serde(alias = "totalBlocksFound", alias = "blocksFound", deserialize_with = "lenient_u64")]
    pub blocks_found: Option<u64>,
    #[serde(alias = "lastBlockFound", alias = "lastBlockHeight", deserialize_with = "lenient_u64")]
    pub last_block: Option<u64>,
    #[serde(alias = "poolFee", deserialize_with = "lenient_f64")]
    pub fee: Option<f64>,
}

/// A number, or a string holding one; anything else is absent.
fn lenient_f64<'de, D: Deserializer<'de>>(de: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<Value>::deserialize(de)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_u64<'de, D: Deserializer<'de>>(de: D) -> Result<Option<u64>, D::Error> {
    Ok(lenient_f64(de)?.filter(|n| n.is_finite() && *n >= 0.0).map(|n| n as u64))
}

/// Decode a pool API response.
pub fn parse_pool_stats(body: &str) -> anyhow::Result<PoolStats> {
    let mut value: Value = serde_json::from_str(body).context("response is not JSON")?;
    if let Value::Array(entries) = &mut value {
        if entries.len() != 1 {
            anyhow::bail!("expected one pool, got {}", entries.len());
        }
        value = entries.remove(0);
    }
    if let Some(inner) = value.get_mut("pool_statistics").map(Value::take) {
        value = inner;
    }
    if !value.is_object() {
        anyhow::bail!("expected a JSON object");
    }
    Ok(serde_json::from_value(value)?)
}

pub struct PoolSource {
    url: String,
    client: reqwest::blocking::Client,
    theme: Theme,
}

impl PoolSource {
    pub fn new(url: String, theme: Theme) -> anyhow::Result<Self> {
        Ok(Self {
            url,
            client: http_client()?,
            theme,
        })
    }

    /// One row per field the API reported; unreported fields are left out
    /// so a stake pool does not show hash-rate rows and vice versa.
    pub fn render(&self, stats: &PoolStats) -> Vec<Item> {
        let t = &self.theme;
        let title = stats.ticker.clone().unwrap_or_else(|| self.url.clone());
        let mut items = vec![t.title_item(0, 0, "pool"), t.value_item(0, 1, title)];

        let rows = [
            ("live stake", stats.stake.map(|l| format!("{} ADA", grouped((l / LOVELACE_PER_ADA) as u64)))),
            ("delegators", stats.delegators.map(grouped)),
            ("blocks minted", stats.blocks_minted.map(grouped)),
            ("hashrate", stats.hashrate.map(human_rate)),
            ("miners", stats.miners.map(grouped)),
            ("workers", stats.workers.map(grouped)),
            ("blocks found", stats.blocks_found.map(grouped)),
            ("last block", stats.last_block.map(grouped)),
            ("fee", stats.fee.map(|f| format!("{f:.2}%"))),
        ];
        let mut row = 1;
        if let Some(sat) = stats.saturation {
            let color = match sat {
                s if s >= 100.0 => t.error,
                s if s >= 90.0 => t.warn,
                _ => t.good,
            };
            items.push(t.label_item(row, "saturation"));
            items.push(Item::new(row, 1, format!("{sat:.1}%")).fg(color).bg(t.background));
            row += 1;
        }
        for (label, value) in rows {
            if let Some(value) = value {
                items.extend(t.pair(row, label, value));
                row += 1;
            }
        }
        if row == 1 {
            items.push(Item::new(1, 0, "no recognised fields").fg(t.warn).bg(t.background));
        }
        items
    }
}

impl Source for PoolSource {
    fn name(&self) -> &str {
        "pool"
    }

    fn fetch(&mut self) -> anyhow::Result<Vec<Item>> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("GET {}", self.url))?
            .text()?;
        let stats = parse_pool_stats(&body)?;
        Ok(self.render(&stats))
    }
}
