//! TCP connection counts for the watched port, read from the kernel's
//! connection tables.

use std::path::PathBuf;

use super::format::grouped;
use super::Source;
use crate::core::item::Item;
use crate::ui::theme::Theme;

// Kernel socket states (include/net/tcp_states.h).
const TCP_ESTABLISHED: u8 = 0x01;
const TCP_TIME_WAIT: u8 = 0x06;
const TCP_LISTEN: u8 = 0x0A;

/// Connection tally by TCP state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnCounts {
    pub listen: u64,
    pub established: u64,
    pub time_wait: u64,
    pub other: u64,
}

impl ConnCounts {
    pub fn total(&self) -> u64 {
        self.listen + self.established + self.time_wait + self.other
    }

    fn add(&mut self, other: ConnCounts) {
        self.listen += other.listen;
        self.established += other.established;
        self.time_wait += other.time_wait;
        self.other += other.other;
    }
}

/// Count sockets in a `/proc/net/tcp{,6}` table whose local or remote port
/// is `port`.  The header line and malformed rows are ignored.
pub fn parse_tcp_table(text: &str, port: u16) -> ConnCounts {
    let mut counts = ConnCounts::default();
    for line in text.lines().skip(1) {
        let mut fields = line.split_whitespace();
        let (Some(_slot), Some(local), Some(remote), Some(state)) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        let (Some(lport), Some(rport)) = (endpoint_port(local), endpoint_port(remote)) else {
            continue;
        };
        if lport != port && rport != port {
            continue;
        }
        match u8::from_str_radix(state, 16) {
            Ok(TCP_LISTEN) => counts.listen += 1,
            Ok(TCP_ESTABLISHED) => counts.established += 1,
            Ok(TCP_TIME_WAIT) => counts.time_wait += 1,
            Ok(_) => counts.other += 1,
            Err(_) => {}
        }
    }
    counts
}

/// `0100007F:1F90` → `8080`.
fn endpoint_port(endpoint: &str) -> Option<u16> {
    let (_, port) = endpoint.rsplit_once(':')?;
    u16::from_str_radix(port, 16).ok()
}

pub struct NetworkSource {
    port: u16,
    tables: Vec<PathBuf>,
    theme: Theme,
}

impl NetworkSource {
    pub fn new(port: u16, theme: Theme) -> Self {
        Self {
            port,
            tables: vec![PathBuf::from("/proc/net/tcp"), PathBuf::from("/proc/net/tcp6")],
            theme,
        }
    }

    /// Read from other tables instead of procfs.
    #[cfg(test)]
    pub fn with_tables(mut self, tables: Vec<PathBuf>) -> Self {
        self.tables = tables;
        self
    }

    pub fn render(&self, counts: ConnCounts) -> Vec<Item> {
        let t = &self.theme;
        let mut items = vec![
            t.title_item(0, 0, "network"),
            t.value_item(0, 1, format!("tcp port {}", self.port)),
        ];
        let listening = if counts.listen > 0 {
            Item::new(1, 1, "yes").fg(t.good).bg(t.background)
        } else {
            Item::new(1, 1, "no").fg(t.warn).bg(t.background)
        };
        items.push(t.label_item(1, "listening"));
        items.push(listening);
        items.extend(t.pair(2, "established", grouped(counts.established)));
        items.extend(t.pair(3, "time-wait", grouped(counts.time_wait)));
        items.extend(t.pair(4, "other", grouped(counts.other)));
        items.extend(t.pair(5, "total", grouped(counts.total())));
        items
    }
}

impl Source for NetworkSource {
    fn name(&self) -> &str {
        "network"
    }

    fn fetch(&mut self) -> anyhow::Result<Vec<Item>> {
        let mut counts = ConnCounts::default();
        let mut read_any = false;
        for table in &self.tables {
            match std::fs::read_to_string(table) {
                Ok(text) => {
                    read_any = true;
                    counts.add(parse_tcp_table(&text, self.port));
                }
                Err(err) => tracing::debug!("skipping {}: {err}", table.display()),
            }
        }
        if !read_any {
            anyhow::bail!("no readable connection table (is /proc mounted?)");
        }
        Ok(self.render(counts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TABLE: &str = "\
  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 00000000:1F90 00000000:0000 0A 00000000:00000000 00:00000000 00000000  1000        0 1 1
   1: 0100007F:1F90 0100007F:C350 01 00000000:00000000 00:00000000 00000000  1000        0 2 1
   2: 0100007F:C350 0100007F:1F90 01 00000000:00000000 00:00000000 00000000  1000        0 3 1
   3: 0100007F:1F90 0100007F:C351 06 00000000:00000000 00:00000000 00000000     0        0 0 3
   4: 0100007F:0016 0100007F:D000 01 00000000:00000000 00:00000000 00000000     0        0 4 1
   5: 0100007F:1F90 0100007F:C352 08 00000000:00000000 00:00000000 00000000     0        0 5 1
   6: broken
";

    #[test]
    fn counts_by_state_for_port() {
        let c = parse_tcp_table(TABLE, 8080);
        assert_eq!(
            c,
            ConnCounts {
                listen: 1,
                established: 2,
                time_wait: 1,
                other: 1
            }
        );
        assert_eq!(c.total(), 5);
        assert_eq!(parse_tcp_table(TABLE, 22).established, 1);
    }

    #[test]
    fn ipv6_endpoints_parse() {
        assert_eq!(endpoint_port("00000000000000000000000001000000:1F90"), Some(8080));
        assert_eq!(endpoint_port("nocolon"), None);
    }

    #[test]
    fn reads_and_sums_tables() {
        let mut a = tempfile::NamedTempFile::new().unwrap();
        a.write_all(TABLE.as_bytes()).unwrap();
        let mut src = NetworkSource::new(8080, Theme::default())
            .with_tables(vec![a.path().to_path_buf(), a.path().to_path_buf()]);
        let items = src.fetch().unwrap();
        let value_at = |row: usize| &items.iter().find(|i| i.row == row && i.column == 1).unwrap().text;
        assert_eq!(value_at(2), "4");
        assert_eq!(value_at(5), "10");
    }

    #[test]
    fn missing_tables_are_an_error() {
        let mut src = NetworkSource::new(1, Theme::default())
            .with_tables(vec![PathBuf::from("/definitely/not/here")]);
        assert!(src.fetch().is_err());
    }
}
