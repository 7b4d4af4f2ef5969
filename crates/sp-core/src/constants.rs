//! Editor-wide constants.

use std::time::Duration;

/// Marker class carried by the preview root container.
pub const PREVIEW_ROOT_CLASS: &str = "preview-content";

/// Marker class carried by the style popover.
pub const POPOVER_CLASS: &str = "style-editor-popover";

/// Pseudo-path handed to the compiler for syntax detection.
pub const COMPONENT_FILENAME: &str = "component.tsx";

/// Window during which a patched source is not re-synchronized.
pub const SYNC_GUARD_WINDOW: Duration = Duration::from_millis(100);

/// Pixels between the anchor point and the popover's top edge.
pub const POPOVER_OFFSET_Y: f32 = 10.0;

pub const POPOVER_WIDTH: f32 = 320.0;

/// Template loaded when no source file is given.
pub const DEFAULT_COMPONENT_SOURCE: &str = r##"import React from 'react';

export default function Component() {
  return (
    <div style={{ maxWidth: '1200px', margin: '0 auto', padding: '16px' }}>
      <h1 style={{ fontSize: '24px', fontWeight: 'bold', marginBottom: '16px' }}>Hello World</h1>
      <p style={{ color: '#666' }}>This is a sample component that you can edit!</p>
      <div style={{ marginTop: '16px', padding: '16px', backgroundColor: '#dbeafe', borderRadius: '8px' }}>
        <span style={{ color: '#1e40af' }}>Click on any element to start editing its styles.</span>
      </div>
      <div style={{ marginTop: '16px', display: 'flex', gap: '8px' }}>
        <button style={{ padding: '8px 16px', backgroundColor: '#3b82f6', color: 'white', border: 'none', borderRadius: '6px', cursor: 'pointer' }}>
          Primary Button
        </button>
        <button>
          Secondary Button
        </button>
      </div>
    </div>
  );
}"##;
