//! Title block: what is being watched, the wall clock, and the key hints.

use chrono::{DateTime, Local};

use super::Source;
use crate::core::item::Item;
use crate::ui::theme::Theme;

pub struct HeaderSource {
    target: String,
    hint: String,
    theme: Theme,
}

impl HeaderSource {
    pub fn new(target: String, hint: String, theme: Theme) -> Self {
        Self {
            target,
            hint,
            theme,
        }
    }

    pub fn render(&self, now: DateTime<Local>) -> Vec<Item> {
        let t = &self.theme;
        vec![
            t.title_item(0, 0, env!("CARGO_PKG_NAME")),
            t.value_item(0, 1, self.target.clone()),
            t.value_item(0, 2, now.format("%Y-%m-%d %H:%M:%S").to_string()),
            Item::new(1, 0, self.hint.clone()).fg(t.label).bg(t.background),
        ]
    }
}

impl Source for HeaderSource {
    fn name(&self) -> &str {
        "header"
    }

    fn fetch(&mut self) -> anyhow::Result<Vec<Item>> {
        Ok(self.render(Local::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn shows_target_and_time() {
        let src = HeaderSource::new("localhost:9100".into(), "q: quit".into(), Theme::default());
        let now = Local.with_ymd_and_hms(2026, 10, 17, 9, 5, 0).unwrap();
        let items = src.render(now);
        assert_eq!(items[0].text, "blocktop");
        assert_eq!(items[1].text, "localhost:9100");
        assert_eq!(items[2].text, "2026-10-17 09:05:00");
        assert_eq!(items[3].row, 1);
    }
}
