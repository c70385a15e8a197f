//! MJML editor: debounced conversion controller and preview rendering.

pub mod controller;
pub mod debounce;
pub mod preview;
pub mod state;

pub use controller::EditorController;
pub use debounce::Debouncer;
pub use preview::{render, render_page, render_preview, render_source};
pub use state::{Applied, EditorState, Ticket};

/// Document the editor starts with when nothing else is configured.
pub const DEFAULT_SOURCE: &str = r#"<mjml>
  <mj-body>
    <mj-section>
      <mj-column>
        <mj-text>Hello World</mj-text>
      </mj-column>
    </mj-section>
  </mj-body>
</mjml>
"#;
