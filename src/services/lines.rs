//! Line sequence builder.
//!
//! Flattens a markup subtree into the ordered sequence of trimmed,
//! non-empty text leaves it contains. All field extraction addresses
//! lines of such a sequence, by signed index.

use scraper::ElementRef;

/// Ordered, trimmed text lines derived from one markup subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSequence {
    lines: Vec<String>,
}

impl LineSequence {
    /// Collect the text leaves of a subtree, in document order.
    ///
    /// Leaves are whitespace-trimmed; empty leaves (inter-tag whitespace)
    /// are dropped. The source document is not touched.
    pub fn from_element(element: ElementRef<'_>) -> Self {
        let lines = element
            .text()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .collect();
        Self { lines }
    }

    /// Build a sequence from already-extracted lines.
    pub fn from_lines(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Resolve a signed index: non-negative counts from the start,
    /// negative from the end (-1 is the last line). Out of range is a
    /// lookup failure, not a silent default.
    pub fn resolve(&self, index: i32) -> Option<(usize, &str)> {
        let len = self.lines.len() as i64;
        let resolved = if index >= 0 {
            i64::from(index)
        } else {
            len + i64::from(index)
        };
        if resolved < 0 || resolved >= len {
            return None;
        }
        let resolved = resolved as usize;
        Some((resolved, self.lines[resolved].as_str()))
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Copy of the lines, for diagnostic snapshots.
    pub fn snapshot(&self) -> Vec<String> {
        self.lines.clone()
    }
}
