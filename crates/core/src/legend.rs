use std::collections::HashSet;

use cenplot_protocol::Color;
use serde::Serialize;

use crate::model::TrackType;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: Color,
}

impl LegendEntry {
    pub fn new(label: impl Into<String>, color: Color) -> Self {
        Self {
            label: label.into(),
            color,
        }
    }
}

/// Accumulates entries for one legend panel, keeping the first entry seen
/// for each label.
#[derive(Debug, Clone, Default)]
pub struct LegendBuilder {
    entries: Vec<LegendEntry>,
    seen: HashSet<String>,
}

impl LegendBuilder {
    pub fn push(&mut self, entry: LegendEntry) {
        if self.seen.insert(entry.label.clone()) {
            self.entries.push(entry);
        }
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = LegendEntry>) {
        for entry in entries {
            self.push(entry);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LegendEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<LegendEntry> {
        self.entries
    }
}

/// Drop repeated labels, first occurrence wins.
pub fn dedup_entries(entries: impl IntoIterator<Item = LegendEntry>) -> Vec<LegendEntry> {
    let mut builder = LegendBuilder::default();
    builder.extend(entries);
    builder.into_entries()
}

/// Hands out legend titles, suppressing repeats for split-track siblings.
///
/// Siblings are recognised by the input track they were expanded from.
#[derive(Debug, Default)]
pub struct LegendTitles {
    splits_titled: HashSet<usize>,
}

impl LegendTitles {
    pub fn title_for(
        &mut self,
        source: usize,
        kind: TrackType,
        title: Option<String>,
    ) -> Option<String> {
        if kind != TrackType::HorSplit || self.splits_titled.insert(source) {
            title
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedups_by_label_in_first_seen_order() {
        let merged = dedup_entries([
            LegendEntry::new("8", Color::BLACK),
            LegendEntry::new("4", Color::GRAY),
            LegendEntry::new("8", Color::WHITE),
            LegendEntry::new("2", Color::WHITE),
        ]);
        let labels: Vec<_> = merged.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, ["8", "4", "2"]);
        assert_eq!(merged[0].color, Color::BLACK);
    }

    #[test]
    fn builder_merges_across_tracks() {
        let mut builder = LegendBuilder::default();
        builder.extend([LegendEntry::new("+", Color::BLACK)]);
        builder.extend([LegendEntry::new("+", Color::GRAY), LegendEntry::new("-", Color::GRAY)]);
        assert_eq!(builder.entries().len(), 2);
    }

    #[test]
    fn split_titles_only_once_per_split() {
        let mut titles = LegendTitles::default();
        let hors = || Some("HORs".to_string());
        assert_eq!(titles.title_for(0, TrackType::HorSplit, hors()), hors());
        assert_eq!(titles.title_for(0, TrackType::HorSplit, hors()), None);
        assert_eq!(titles.title_for(1, TrackType::Hor, hors()), hors());
        assert_eq!(titles.title_for(1, TrackType::Hor, hors()), hors());
        assert_eq!(titles.title_for(2, TrackType::HorSplit, hors()), hors());
        assert_eq!(titles.title_for(2, TrackType::HorSplit, hors()), None);
    }
}
