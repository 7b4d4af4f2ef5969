use sp_dom::NodeHandle;
use sp_dom::NodePath;
use sp_style::ComputedStyles;

/// The element the popover is editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedNode {
    pub path: NodePath,
    /// Handle into the current preview frame, refreshed after each render.
    pub element: NodeHandle,
    /// Cascaded values at selection time.
    pub computed: ComputedStyles,
}

/// Screen position of the open popover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopoverState {
    pub x: f32,
    pub y: f32,
}

/// A pointer press inside the preview pane, hit-tested by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewClick {
    /// Innermost element under the pointer, if any.
    pub target: Option<NodeHandle>,
    pub x: f32,
    pub y: f32,
    pub alt: bool,
    /// The press landed on the popover itself.
    pub on_popover: bool,
}

impl PreviewClick {
    pub fn plain(target: Option<NodeHandle>, x: f32, y: f32) -> Self {
        Self {
            target,
            x,
            y,
            alt: false,
            on_popover: false,
        }
    }

    pub fn with_alt(target: NodeHandle, x: f32, y: f32) -> Self {
        Self {
            alt: true,
            ..Self::plain(Some(target), x, y)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Escape,
    Other,
}
