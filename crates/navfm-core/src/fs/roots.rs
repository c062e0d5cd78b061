//! Storage root discovery and periodic polling.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::event::Event;
use crate::host::{Capacity, Host, RootStyle};

/// A top-level storage mount point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveRoot {
    pub label: String,
    pub root_path: String,
    pub total_bytes: Option<u64>,
    pub free_bytes: Option<u64>,
}

impl DriveRoot {
    fn new(label: String, root_path: String, capacity: Option<&Capacity>) -> Self {
        Self {
            label,
            root_path,
            total_bytes: capacity.map(|c| c.total_bytes),
            free_bytes: capacity.map(|c| c.free_bytes),
        }
    }
}

/// Lists the storage roots the host currently exposes.
///
/// On drive-letter hosts every letter from `C` to `Z` is probed; on
/// single-root hosts the result is just `/`. Capacity is best effort: when
/// the probe fails the roots are still returned, without sizes. Never fails.
pub async fn list_roots<H: Host + ?Sized>(host: &H) -> Vec<DriveRoot> {
    let capacities = match host.root_capacities().await {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!("capacity probe failed: {e}");
            HashMap::new()
        }
    };

    match host.root_style() {
        RootStyle::DriveLetters => {
            let mut roots = Vec::new();
            for letter in 'C'..='Z' {
                let root_path = format!("{letter}:\\");
                if !host.exists(Path::new(&root_path)).await {
                    continue;
                }
                let capacity = capacities.get(&letter.to_string());
                roots.push(DriveRoot::new(format!("{letter}:"), root_path, capacity));
            }
            roots
        }
        RootStyle::SingleRoot => {
            vec![DriveRoot::new(
                "/".to_string(),
                "/".to_string(),
                capacities.get("/"),
            )]
        }
    }
}

/// Parses `wmic logicaldisk get Caption,FreeSpace,Size /format:csv` output.
///
/// Keys are upper-case drive letters without the colon. Rows missing either
/// number (optical drives, unmounted media) are skipped.
pub fn parse_wmic_csv(text: &str) -> HashMap<String, Capacity> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    let Some(header) = lines.next() else {
        return HashMap::new();
    };
    let columns: Vec<String> = header.split(',').map(|c| c.trim().to_lowercase()).collect();
    let index = |name: &str| columns.iter().position(|c| c == name);
    let (Some(caption_at), Some(free_at), Some(size_at)) =
        (index("caption"), index("freespace"), index("size"))
    else {
        return HashMap::new();
    };

    let mut map = HashMap::new();
    for line in lines {
        let parts: Vec<&str> = line.split(',').map(str::trim).collect();
        let (Some(caption), Some(free), Some(size)) =
            (parts.get(caption_at), parts.get(free_at), parts.get(size_at))
        else {
            continue;
        };
        let letter = caption.trim_end_matches('\\').trim_end_matches(':');
        if letter.len() != 1 || !letter.chars().all(|c| c.is_ascii_alphabetic()) {
            continue;
        }
        if let (Ok(free), Ok(total)) = (free.parse::<u64>(), size.parse::<u64>()) {
            map.insert(
                letter.to_ascii_uppercase(),
                Capacity {
                    total_bytes: total,
                    free_bytes: free,
                },
            );
        }
    }
    map
}

/// Parses POSIX `df -Pk` output, keyed by mount point.
pub fn parse_df_output(text: &str) -> HashMap<String, Capacity> {
    let mut map = HashMap::new();
    for line in text.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 6 {
            continue;
        }
        let (Ok(blocks), Ok(available)) = (fields[1].parse::<u64>(), fields[3].parse::<u64>())
        else {
            continue;
        };
        map.insert(
            fields[5..].join(" "),
            Capacity {
                total_bytes: blocks.saturating_mul(1024),
                free_bytes: available.saturating_mul(1024),
            },
        );
    }
    map
}

/// Spawns a task that re-lists roots every `interval` and sends
/// [`Event::RootsChanged`].
///
/// The first listing is sent immediately. The task ends once the receiver
/// is dropped.
pub fn spawn_root_poller<H: Host + 'static>(
    host: Arc<H>,
    interval: Duration,
    tx: UnboundedSender<Event>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let roots = list_roots(host.as_ref()).await;
            if tx.send(Event::RootsChanged(roots)).is_err() {
                tracing::debug!("root poller stopped: receiver dropped");
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;

    const WMIC_SAMPLE: &str = "\r\r\nNode,Caption,FreeSpace,Size\r\r\nDESK,C:,1000,5000\r\r\nDESK,D:,,\r\r\nDESK,E:,20,40\r\r\n";

    #[test]
    fn wmic_rows_are_keyed_by_letter() {
        let map = parse_wmic_csv(WMIC_SAMPLE);
        assert_eq!(map.len(), 2);
        assert_eq!(
            map["C"],
            Capacity {
                total_bytes: 5000,
                free_bytes: 1000
            }
        );
        assert_eq!(map["E"].free_bytes, 20);
        assert!(!map.contains_key("D"));
    }

    #[test]
    fn wmic_without_header_is_empty() {
        assert!(parse_wmic_csv("").is_empty());
        assert!(parse_wmic_csv("garbage\nmore").is_empty());
    }

    #[test]
    fn df_output_is_converted_to_bytes() {
        let text = "Filesystem     1024-blocks      Used Available Capacity Mounted on\n\
                    /dev/sda1          1000       400       600      40% /\n";
        let map = parse_df_output(text);
        assert_eq!(
            map["/"],
            Capacity {
                total_bytes: 1_024_000,
                free_bytes: 614_400
            }
        );
    }

    #[tokio::test]
    async fn drive_letters_are_probed() {
        let host = MemoryHost::new(RootStyle::DriveLetters);
        host.mark_exists("C:\\");
        host.mark_exists("E:\\");
        let mut caps = HashMap::new();
        caps.insert(
            "C".to_string(),
            Capacity {
                total_bytes: 10,
                free_bytes: 4,
            },
        );
        host.set_capacities(Some(caps));

        let roots = list_roots(&host).await;
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].label, "C:");
        assert_eq!(roots[0].root_path, "C:\\");
        assert_eq!(roots[0].total_bytes, Some(10));
        assert_eq!(roots[1].label, "E:");
        assert_eq!(roots[1].free_bytes, None);
    }

    #[tokio::test]
    async fn capacity_failure_keeps_drives() {
        let host = MemoryHost::new(RootStyle::DriveLetters);
        host.mark_exists("C:\\");
        host.set_capacities(None);

        let roots = list_roots(&host).await;
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].total_bytes, None);
    }

    #[tokio::test]
    async fn single_root_host_lists_slash() {
        let host = MemoryHost::default();
        let roots = list_roots(&host).await;
        assert_eq!(
            roots,
            vec![DriveRoot {
                label: "/".to_string(),
                root_path: "/".to_string(),
                total_bytes: None,
                free_bytes: None,
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn poller_sends_roots_each_interval() {
        let host = Arc::new(MemoryHost::default());
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let handle = spawn_root_poller(host, Duration::from_secs(10), tx);

        for _ in 0..2 {
            match rx.recv().await {
                Some(Event::RootsChanged(roots)) => assert_eq!(roots.len(), 1),
                other => panic!("unexpected {other:?}"),
            }
        }
        drop(rx);
        tokio::time::advance(Duration::from_secs(10)).await;
        handle.await.unwrap();
    }
}
