//! Process metrics scraped from a Prometheus text endpoint.
//!
//! Only the standard `process_*` family is read.  Each field is optional:
//! exporters differ in what they publish, and an absent series renders as
//! `n/a` rather than failing the whole block.

use std::time::{Duration, Instant};

use anyhow::Context;

use super::format::{human_duration, human_size};
use super::{http_client, Source};
use crate::core::item::Item;
use crate::ui::theme::Theme;

/// The subset of an exposition this dashboard understands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessMetrics {
    pub cpu_seconds: Option<f64>,
    pub resident_memory_bytes: Option<f64>,
    pub virtual_memory_bytes: Option<f64>,
    pub open_fds: Option<f64>,
    pub max_fds: Option<f64>,
    pub start_time_seconds: Option<f64>,
    pub threads: Option<f64>,
    /// Sample lines seen, recognised or not.
    pub samples: usize,
}

/// Parse the Prometheus text exposition format.
///
/// Comments and malformed lines are skipped.  When a series appears more
/// than once (different labels), the last sample wins.
pub fn parse_exposition(text: &str) -> ProcessMetrics {
    let mut m = ProcessMetrics::default();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((name, value)) = split_sample(line) else {
            continue;
        };
        m.samples += 1;
        let slot = match name {
            "process_cpu_seconds_total" => &mut m.cpu_seconds,
            "process_resident_memory_bytes" => &mut m.resident_memory_bytes,
            "process_virtual_memory_bytes" => &mut m.virtual_memory_bytes,
            "process_open_fds" => &mut m.open_fds,
            "process_max_fds" => &mut m.max_fds,
            "process_start_time_seconds" => &mut m.start_time_seconds,
            "process_threads" | "go_threads" => &mut m.threads,
            _ => continue,
        };
        *slot = Some(value);
    }
    m
}

/// `name{labels} value [timestamp]` → `(name, value)`.
fn split_sample(line: &str) -> Option<(&str, f64)> {
    let (name, rest) = match line.find(['{', ' ', '\t']) {
        Some(i) if line[i..].starts_with('{') => {
            let close = line[i..].find('}')? + i;
            (&line[..i], &line[close + 1..])
        }
        Some(i) => (&line[..i], &line[i..]),
        None => return None,
    };
    let raw = rest.split_whitespace().next()?;
    let value = match raw {
        "+Inf" => f64::INFINITY,
        "-Inf" => f64::NEG_INFINITY,
        other => other.parse().ok()?,
    };
    Some((name, value))
}

/// Scrapes `url` and renders [`ProcessMetrics`].
pub struct MetricsSource {
    url: String,
    client: reqwest::blocking::Client,
    theme: Theme,
    /// Previous CPU reading, for a usage percentage between scrapes.
    last_cpu: Option<(f64, Instant)>,
}

impl MetricsSource {
    pub fn new(url: String, theme: Theme) -> anyhow::Result<Self> {
        Ok(Self {
            url,
            client: http_client()?,
            theme,
            last_cpu: None,
        })
    }

    /// Items for a scrape taken at `now` (unix seconds `wall_now`).
    pub fn render(&mut self, m: &ProcessMetrics, now: Instant, wall_now: f64) -> Vec<Item> {
        let t = self.theme;
        let na = || "n/a".to_string();
        let mut items = vec![
            t.title_item(0, 0, "process"),
            t.value_item(0, 1, self.url.clone()),
        ];

        let cpu = match (m.cpu_seconds, self.last_cpu) {
            (Some(total), Some((prev, at))) => {
                let wall = now.saturating_duration_since(at).as_secs_f64();
                if wall > 0.0 {
                    format!("{:.1}%", (total - prev).max(0.0) / wall * 100.0)
                } else {
                    na()
                }
            }
            (Some(total), None) => format!("{total:.1}s total"),
            (None, _) => na(),
        };
        if let Some(total) = m.cpu_seconds {
            self.last_cpu = Some((total, now));
        }

        // The start time comes from the remote end: infinities or absurd
        // magnitudes show as n/a rather than a bogus duration.
        let uptime = m
            .start_time_seconds
            .and_then(|start| Duration::try_from_secs_f64((wall_now - start).max(0.0)).ok())
            .map(human_duration)
            .unwrap_or_else(na);
        let fds = match (m.open_fds, m.max_fds) {
            (Some(open), Some(max)) => format!("{open:.0} / {max:.0}"),
            (Some(open), None) => format!("{open:.0}"),
            _ => na(),
        };

        items.extend(t.pair(1, "cpu", cpu));
        items.extend(t.pair(2, "resident", m.resident_memory_bytes.map(human_size).unwrap_or_else(na)));
        items.extend(t.pair(3, "virtual", m.virtual_memory_bytes.map(human_size).unwrap_or_else(na)));
        items.extend(t.pair(4, "open fds", fds));
        items.extend(t.pair(5, "threads", m.threads.map(|n| format!("{n:.0}")).unwrap_or_else(na)));
        items.extend(t.pair(6, "uptime", uptime));
        items
    }
}

impl Source for MetricsSource {
    fn name(&self) -> &str {
        "metrics"
    }

    fn fetch(&mut self) -> anyhow::Result<Vec<Item>> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("GET {}", self.url))?
            .text()?;
        let metrics = parse_exposition(&body);
        if metrics.samples == 0 {
            anyhow::bail!("no samples at {}", self.url);
        }
        let wall_now = chrono::Utc::now().timestamp() as f64;
        Ok(self.render(&metrics, Instant::now(), wall_now))
    }
}
