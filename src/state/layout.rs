/// Per-layout session rules
///
/// Each layout decides how many shots a session takes, which overlay
/// screen B shows while shooting, and whether the overlay switches to an
/// alternate asset partway through.
use super::data::LayoutId;

/// Static rules for one layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSpec {
    pub total_shots: u32,
    /// Key into the screen B asset map (e.g., "page10b_01")
    pub overlay_key: &'static str,
    /// Zero-based index of the shot that triggers the alternate overlay
    pub alternate_at_shot: Option<u32>,
}

impl LayoutSpec {
    /// Look up the rules for a layout
    pub fn for_layout(layout: LayoutId) -> Self {
        use LayoutId::*;

        let (total_shots, overlay_key, alternate_at_shot) = match layout {
            Square1 => (5, "page10b_01", None),
            Square2 | Square5 => (8, "page10b_01", None),
            Square3 => (8, "page10b_01", Some(4)),
            Square4 => (8, "page10b_01", Some(5)),
            FourFive1 => (5, "page10b_02", None),
            FourFive3 | FourFive4 => (8, "page10b_02", None),
            FourFive5 => (6, "page10b_02", None),
            FourFive2 | FourFive6 => (6, "page10b_03", None),
        };

        Self {
            total_shots,
            overlay_key,
            alternate_at_shot,
        }
    }

    /// Whether capturing shot `shots_taken` (zero-based) switches the overlay
    pub fn switches_overlay_at(&self, shots_taken: u32) -> bool {
        self.alternate_at_shot == Some(shots_taken)
    }
}
