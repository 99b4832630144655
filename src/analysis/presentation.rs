//! Completeness level → label/color lookup and the cross-view hand-off.

use crate::error::Result;
use crate::storage::{KeyValueStore, COMPLETENESS_COLOR_KEY, COMPLETENESS_LEVEL_KEY};
use serde::Serialize;

pub const INSUFFICIENT_COLOR: &str = "#959595";

const LEVELS: [(&str, &str); 5] = [
    (INSUFFICIENT_COLOR, "足りない…"),
    (INSUFFICIENT_COLOR, "足りない…"),
    ("#C6AA0E", "もう少し！"),
    ("#FF753E", "まぁよさそう"),
    ("#16C47F", "問題なし！"),
];

fn entry(level: i64) -> (&'static str, &'static str) {
    match level {
        1..=5 => LEVELS[(level - 1) as usize],
        _ => LEVELS[0],
    }
}

/// Out-of-range levels get the level-1 color.
pub fn level_color(level: i64) -> &'static str {
    entry(level).0
}

pub fn level_label(level: i64) -> &'static str {
    entry(level).1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletenessBadge {
    pub level: u8,
    pub color: &'static str,
    pub label: &'static str,
}

impl CompletenessBadge {
    pub fn for_level(level: u8) -> Self {
        Self {
            level,
            color: level_color(level.into()),
            label: level_label(level.into()),
        }
    }
}

/// Write the level and its color for other views to read.
pub fn persist_completeness(store: &dyn KeyValueStore, level: u8) -> Result<()> {
    let level = level.min(5);
    store.set(COMPLETENESS_LEVEL_KEY, &level.to_string())?;
    store.set(COMPLETENESS_COLOR_KEY, level_color(level.into()))?;
    Ok(())
}

/// Last level handed off by the entry view, with its stored color.
pub fn read_completeness(store: &dyn KeyValueStore) -> Option<(u8, String)> {
    let level: u8 = store.get(COMPLETENESS_LEVEL_KEY)?.trim().parse().ok()?;
    let color = store
        .get(COMPLETENESS_COLOR_KEY)
        .unwrap_or_else(|| level_color(level.into()).to_string());
    Some((level, color))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn color_table() {
        assert_eq!(level_color(1), "#959595");
        assert_eq!(level_color(2), "#959595");
        assert_eq!(level_color(3), "#C6AA0E");
        assert_eq!(level_color(4), "#FF753E");
        assert_eq!(level_color(5), "#16C47F");
        assert_eq!(level_color(0), "#959595");
        assert_eq!(level_color(6), "#959595");
        assert_eq!(level_color(-3), "#959595");
    }

    #[test]
    fn label_table() {
        assert_eq!(level_label(2), "足りない…");
        assert_eq!(level_label(3), "もう少し！");
        assert_eq!(level_label(4), "まぁよさそう");
        assert_eq!(level_label(5), "問題なし！");
        assert_eq!(level_label(9), "足りない…");
    }

    #[test]
    fn handoff_roundtrip() {
        let store = MemoryStore::new();
        assert!(read_completeness(&store).is_none());
        persist_completeness(&store, 5).unwrap();
        assert_eq!(store.get(COMPLETENESS_LEVEL_KEY).as_deref(), Some("5"));
        assert_eq!(
            read_completeness(&store),
            Some((5, "#16C47F".to_string()))
        );
    }
}
