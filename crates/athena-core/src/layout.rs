//! Responsive layout selection.

use serde::{Deserialize, Serialize};

/// Width breakpoints, in terminal columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoints {
    /// Narrower than this is the compact layout.
    #[serde(default = "default_md")]
    pub md: u16,
}

fn default_md() -> u16 {
    48
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self { md: default_md() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Narrow,
    Wide,
}

impl Breakpoints {
    pub fn layout(&self, width: u16) -> Layout {
        if width < self.md {
            Layout::Narrow
        } else {
            Layout::Wide
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_switches_at_md() {
        let bp = Breakpoints::default();
        assert_eq!(bp.layout(47), Layout::Narrow);
        assert_eq!(bp.layout(48), Layout::Wide);
        assert_eq!(Breakpoints { md: 100 }.layout(80), Layout::Narrow);
    }
}
