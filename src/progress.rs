//! Progress bar display for batch operations

use indicatif::{ProgressBar, ProgressStyle};

/// Progress display over a list of named items (packages, modules)
pub struct ProgressDisplay {
    item_pb: ProgressBar,
}

impl ProgressDisplay {
    /// Create a new progress display with total item count
    pub fn new(total_items: u64) -> Self {
        let item_pb = ProgressBar::new(total_items);
        if let Ok(style) = ProgressStyle::default_bar().template("[{bar:40.cyan/blue}] {pos}/{len} {msg}") {
            item_pb.set_style(style.progress_chars("#>-"));
        }
        Self { item_pb }
    }

    /// A display that draws nothing
    #[cfg(test)]
    pub fn hidden() -> Self {
        Self {
            item_pb: ProgressBar::hidden(),
        }
    }

    /// Show the item currently being processed
    pub fn update_item(&self, item: &str) {
        // Truncate long names for display
        let display = match item.char_indices().rev().nth(46) {
            Some((start, _)) if item.chars().count() > 50 => format!("...{}", &item[start..]),
            _ => item.to_string(),
        };
        self.item_pb.set_message(display);
    }

    pub fn inc_item(&self) {
        self.item_pb.inc(1);
    }

    #[cfg(test)]
    pub fn position(&self) -> u64 {
        self.item_pb.position()
    }

    pub fn finish(&self) {
        self.item_pb.finish_and_clear();
    }

    /// Abandon on error
    pub fn abandon(&self) {
        self.item_pb.abandon();
    }
}

/// Advance an optional progress display past `item`
pub fn step(progress: Option<&ProgressDisplay>, item: &str) {
    if let Some(p) = progress {
        p.update_item(item);
        p.inc_item();
    }
}
