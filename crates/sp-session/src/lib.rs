//! Editor session state.
//!
//! [`SessionStore`] owns the source text, the style overrides, the current
//! selection and the rendered preview. The host forwards UI input to it and
//! reads state back; every change is also broadcast as a [`SessionEvent`].

mod event;
mod guard;
mod selection;

pub use event::PatchSkip;
pub use event::SessionEvent;
pub use event::SourceOrigin;
pub use event::SubscriptionId;
pub use guard::SyncGuard;
pub use selection::KeyInput;
pub use selection::PopoverState;
pub use selection::PreviewClick;
pub use selection::SelectedNode;

use event::Subscribers;
use sp_core::EditorConfig;
use sp_core::EditorError;
use sp_core::constants::DEFAULT_COMPONENT_SOURCE;
use sp_css::CssParser;
use sp_css::DEFAULT_PREVIEW_CSS;
use sp_css::StyleSheet;
use sp_dom::Document;
use sp_dom::NodeHandle;
use sp_dom::NodePath;
use sp_js::CompiledComponent;
use sp_js::Compiler;
use sp_js::CompilerConfig;
use sp_patch::SourcePatcher;
use sp_style::ComputedStyles;
use sp_style::EditableStyles;
use sp_style::StyleOverrideMap;
use sp_style::StyleProperty;
use sp_style::apply_overrides_to_dom;
use sp_style::resolve_current_styles;
use std::time::Instant;
use tracing::debug;
use tracing::warn;

/// The document rendered from one compiled component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewFrame {
    document: Document,
    render_key: u64,
}

impl PreviewFrame {
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The container carrying the preview root marker class.
    pub fn root(&self) -> NodeHandle {
        self.document.root()
    }

    pub fn render_key(&self) -> u64 {
        self.render_key
    }
}

#[derive(Debug)]
pub struct SessionStore {
    config: EditorConfig,
    compiler: Compiler,
    patcher: SourcePatcher,
    stylesheet: StyleSheet,
    source: String,
    overrides: StyleOverrideMap,
    selection: Option<SelectedNode>,
    popover: Option<PopoverState>,
    component: Option<CompiledComponent>,
    frame: Option<PreviewFrame>,
    compile_error: Option<EditorError>,
    runtime_error: Option<EditorError>,
    guard: SyncGuard,
    last_patched: String,
    patch_pending: bool,
    subscribers: Subscribers,
}

impl SessionStore {
    /// Starts a session on the built-in template.
    pub fn new(config: EditorConfig) -> Self {
        Self::with_source(config, DEFAULT_COMPONENT_SOURCE)
    }

    /// Starts a session and compiles `source` right away.
    pub fn with_source(config: EditorConfig, source: impl Into<String>) -> Self {
        let compiler = Compiler::new(CompilerConfig::from(&config));
        let guard = SyncGuard::new(config.sync_guard_window());
        let mut store = Self {
            config,
            compiler,
            patcher: SourcePatcher::new(),
            stylesheet: CssParser.parse(DEFAULT_PREVIEW_CSS),
            source: source.into(),
            overrides: StyleOverrideMap::new(),
            selection: None,
            popover: None,
            component: None,
            frame: None,
            compile_error: None,
            runtime_error: None,
            guard,
            last_patched: String::new(),
            patch_pending: false,
            subscribers: Subscribers::default(),
        };
        store.recompile();
        store
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn overrides(&self) -> &StyleOverrideMap {
        &self.overrides
    }

    pub fn selection(&self) -> Option<&SelectedNode> {
        self.selection.as_ref()
    }

    pub fn popover(&self) -> Option<PopoverState> {
        self.popover
    }

    pub fn frame(&self) -> Option<&PreviewFrame> {
        self.frame.as_ref()
    }

    pub fn compile_error(&self) -> Option<&EditorError> {
        self.compile_error.as_ref()
    }

    pub fn runtime_error(&self) -> Option<&EditorError> {
        self.runtime_error.as_ref()
    }

    pub fn component_name(&self) -> Option<&str> {
        self.component.as_ref().map(CompiledComponent::name)
    }

    pub fn render_key(&self) -> u64 {
        self.compiler.render_key()
    }

    /// True while a patch is waiting for the guard window to close.
    pub fn patch_pending(&self) -> bool {
        self.patch_pending
    }

    /// Values for the edit surface of the selected element.
    pub fn current_styles(&self) -> Option<EditableStyles> {
        let selection = self.selection.as_ref()?;
        let frame = self.frame.as_ref()?;
        Some(resolve_current_styles(
            &frame.document,
            selection.element,
            self.overrides.get(&selection.path),
        ))
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&SessionEvent) + 'static,
    {
        self.subscribers.add(Box::new(listener))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    /// Replaces the source with user-typed text. Returns false when the text
    /// did not change.
    pub fn set_source(&mut self, source: impl Into<String>) -> bool {
        let source = source.into();
        if source == self.source {
            return false;
        }
        self.replace_source(source, SourceOrigin::User);
        true
    }

    /// Alt-click selects the element under the pointer; any other click
    /// outside the popover closes it. Returns true when the selection changed.
    pub fn handle_click(&mut self, click: PreviewClick) -> bool {
        if click.on_popover {
            return false;
        }
        match click.target {
            Some(target) if click.alt => self.select(target, click.x, click.y),
            _ => self.clear_selection(),
        }
    }

    pub fn handle_key(&mut self, key: KeyInput) -> bool {
        match key {
            KeyInput::Escape => self.clear_selection(),
            KeyInput::Other => false,
        }
    }

    pub fn close_popover(&mut self) -> bool {
        self.clear_selection()
    }

    /// Records an edit for the selected element, applies it to the preview
    /// and patches the source unless the guard defers it.
    pub fn update_style(&mut self, property: StyleProperty, value: impl Into<String>) -> bool {
        self.update_style_at(property, value, Instant::now())
    }

    pub fn update_style_at(
        &mut self,
        property: StyleProperty,
        value: impl Into<String>,
        now: Instant,
    ) -> bool {
        let Some(path) = self.selection.as_ref().map(|selected| selected.path.clone()) else {
            return false;
        };

        self.overrides.set(path.clone(), property, value);
        if let Some(frame) = self.frame.as_mut() {
            let root = frame.document.root();
            apply_overrides_to_dom(&mut frame.document, root, &self.overrides);
        }
        self.emit(SessionEvent::OverridesChanged { path: Some(path) });
        self.sync_source(now);
        true
    }

    /// Drops every override and re-renders without them. The source keeps
    /// whatever was already patched into it.
    pub fn clear_overrides(&mut self) -> bool {
        if self.overrides.is_empty() {
            return false;
        }
        self.overrides.clear();
        self.patch_pending = false;
        self.emit(SessionEvent::OverridesChanged { path: None });
        self.render_preview();
        true
    }

    /// Tears down the selection when the editor goes away.
    pub fn unmount(&mut self) {
        self.clear_selection();
        self.guard.reset();
        self.patch_pending = false;
    }

    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    /// Releases an expired guard and runs a deferred patch. Returns true when
    /// a deferred patch was attempted.
    pub fn tick_at(&mut self, now: Instant) -> bool {
        self.guard.release_expired(now);
        if !self.patch_pending || self.guard.is_engaged(now) {
            return false;
        }
        self.sync_source(now);
        true
    }

    fn replace_source(&mut self, source: String, origin: SourceOrigin) {
        self.source = source;
        self.emit(SessionEvent::SourceChanged { origin });
        self.recompile();
    }

    fn recompile(&mut self) {
        self.component = None;
        self.frame = None;
        self.runtime_error = None;

        match self.compiler.compile(&self.source) {
            Ok(component) => {
                self.compile_error = None;
                let event = SessionEvent::Compiled {
                    component: component.name().to_owned(),
                    render_key: component.render_key(),
                };
                self.component = Some(component);
                self.emit(event);
                self.render_preview();
            }
            Err(error) => {
                let event = SessionEvent::CompileFailed {
                    code: error.code(),
                    message: error.to_string(),
                };
                self.compile_error = Some(error);
                self.emit(event);
                self.clear_selection();
            }
        }
    }

    fn render_preview(&mut self) {
        let Some(component) = self.component.as_mut() else {
            return;
        };
        let render_key = component.render_key();

        match component.render(&self.config.preview_root_class) {
            Ok(mut document) => {
                let root = document.root();
                let touched = apply_overrides_to_dom(&mut document, root, &self.overrides);
                debug!(render_key, touched, "preview rendered");
                self.frame = Some(PreviewFrame {
                    document,
                    render_key,
                });
                self.runtime_error = None;
                self.emit(SessionEvent::PreviewRendered { render_key });
                self.refresh_selection();
            }
            Err(error) => {
                warn!(render_key, %error, "component crashed during render");
                self.frame = None;
                let event = SessionEvent::RenderFailed {
                    render_key,
                    message: error.to_string(),
                };
                self.runtime_error = Some(error);
                self.emit(event);
                self.clear_selection();
            }
        }
    }

    /// Re-resolves the selected element in the new frame, dropping the
    /// selection when its path no longer exists.
    fn refresh_selection(&mut self) {
        let located = match (self.selection.as_ref(), self.frame.as_ref()) {
            (Some(selected), Some(frame)) => selected.path.locate(&frame.document, frame.root()),
            (Some(_), None) => None,
            (None, _) => return,
        };
        match (located, self.selection.as_mut()) {
            (Some(element), Some(selected)) => selected.element = element,
            _ => {
                self.clear_selection();
            }
        }
    }

    fn select(&mut self, element: NodeHandle, x: f32, y: f32) -> bool {
        let Some(frame) = self.frame.as_ref() else {
            return false;
        };
        let root = frame.root();
        if element == root || frame.document.element(element).is_none() {
            return false;
        }

        let path = NodePath::identify(&frame.document, element, root);
        if path.is_empty() {
            return false;
        }
        let computed = ComputedStyles::capture(&frame.document, element, &self.stylesheet);

        debug!(path = %path, "selected element");
        self.selection = Some(SelectedNode {
            path: path.clone(),
            element,
            computed,
        });
        self.popover = Some(PopoverState {
            x,
            y: y + self.config.popover_offset_y,
        });
        self.emit(SessionEvent::SelectionChanged { path: Some(path) });
        true
    }

    fn clear_selection(&mut self) -> bool {
        let had_selection = self.selection.take().is_some();
        let had_popover = self.popover.take().is_some();
        if !had_selection && !had_popover {
            return false;
        }
        self.patch_pending = false;
        self.emit(SessionEvent::SelectionChanged { path: None });
        true
    }

    /// Writes the selected element's overrides into the source. Skipped
    /// while the guard is engaged (retried on the next tick) and when the
    /// override set is unchanged since the last patch.
    fn sync_source(&mut self, now: Instant) {
        let Some(path) = self.selection.as_ref().map(|selected| selected.path.clone()) else {
            return;
        };
        if self.overrides.is_empty() {
            return;
        }

        if self.guard.is_engaged(now) {
            self.patch_pending = true;
            debug!(path = %path, "patch deferred by sync guard");
            self.emit(SessionEvent::PatchSkipped {
                reason: PatchSkip::Guarded,
            });
            return;
        }
        self.patch_pending = false;

        let snapshot = self.overrides.snapshot();
        if snapshot == self.last_patched {
            self.emit(SessionEvent::PatchSkipped {
                reason: PatchSkip::Redundant,
            });
            return;
        }
        self.last_patched = snapshot;

        let Some(styles) = self.overrides.get(&path) else {
            return;
        };
        let result = self.patcher.patch_path(&self.source, &path, styles);
        self.guard.engage(now);

        match result {
            Ok(patched) if patched != self.source => {
                debug!(path = %path, "style patch applied");
                self.emit(SessionEvent::PatchApplied { path });
                self.replace_source(patched, SourceOrigin::Patch);
            }
            Ok(_) => self.emit(SessionEvent::PatchSkipped {
                reason: PatchSkip::Redundant,
            }),
            Err(error) => {
                debug!(path = %path, code = error.code(), %error, "style patch skipped");
                self.emit(SessionEvent::PatchSkipped {
                    reason: PatchSkip::Failed { code: error.code() },
                });
            }
        }
    }

    fn emit(&mut self, event: SessionEvent) {
        self.subscribers.emit(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::KeyInput;
    use super::PreviewClick;
    use super::SessionStore;
    use sp_core::EditorConfig;
    use sp_core::ErrorKind;
    use sp_dom::NodeHandle;
    use sp_style::StyleProperty;

    const TWO_BUTTONS: &str = r#"export default function App() {
  return (
    <div>
      <button>One</button>
      <button style={{ margin: "2px" }}>Two</button>
    </div>
  );
}"#;

    fn immediate() -> EditorConfig {
        EditorConfig {
            sync_guard_ms: 0,
            ..EditorConfig::default()
        }
    }

    fn find(store: &SessionStore, tag: &str, nth: usize) -> NodeHandle {
        let Some(frame) = store.frame() else {
            panic!("no preview frame");
        };
        let doc = frame.document();
        doc.descendants(frame.root())
            .into_iter()
            .filter(|handle| doc.tag_name(*handle) == Some(tag))
            .nth(nth)
            .unwrap_or_else(|| panic!("no <{tag}> #{nth}"))
    }

    #[test]
    fn default_template_compiles_and_renders() {
        let store = SessionStore::new(immediate());
        assert!(store.compile_error().is_none());
        assert!(store.runtime_error().is_none());
        assert_eq!(store.component_name(), Some("Component"));
        let Some(frame) = store.frame() else {
            panic!("no preview frame");
        };
        assert!(
            frame
                .document()
                .text_content(frame.root())
                .contains("Hello World")
        );
    }

    #[test]
    fn alt_click_selects_and_positions_the_popover() {
        let mut store = SessionStore::with_source(immediate(), TWO_BUTTONS);
        let second = find(&store, "button", 1);

        assert!(!store.handle_click(PreviewClick::plain(Some(second), 5.0, 5.0)));
        assert!(store.selection().is_none());

        assert!(store.handle_click(PreviewClick::with_alt(second, 40.0, 60.0)));
        let Some(selected) = store.selection() else {
            panic!("nothing selected");
        };
        assert_eq!(selected.path.to_string(), "div[0]>button[1]");
        assert_eq!(selected.computed.get(StyleProperty::Margin), "2px");
        assert_eq!(store.popover().map(|popover| popover.y), Some(70.0));

        let styles = store.current_styles().unwrap_or_default();
        assert_eq!(styles.value(StyleProperty::Margin), "2px");
        assert_eq!(styles.value(StyleProperty::Padding), "");
    }

    #[test]
    fn clicks_on_the_popover_are_ignored() {
        let mut store = SessionStore::with_source(immediate(), TWO_BUTTONS);
        let first = find(&store, "button", 0);
        store.handle_click(PreviewClick::with_alt(first, 0.0, 0.0));

        let mut on_popover = PreviewClick::plain(None, 1.0, 1.0);
        on_popover.on_popover = true;
        assert!(!store.handle_click(on_popover));
        assert!(store.selection().is_some());

        assert!(!store.handle_key(KeyInput::Other));
        assert!(store.handle_key(KeyInput::Escape));
        assert!(store.selection().is_none());
        assert!(store.popover().is_none());
    }

    #[test]
    fn compile_failure_clears_the_preview_and_selection() {
        let mut store = SessionStore::with_source(immediate(), TWO_BUTTONS);
        let first = find(&store, "button", 0);
        store.handle_click(PreviewClick::with_alt(first, 0.0, 0.0));

        assert!(store.set_source("const x = 1;"));
        assert!(!store.set_source("const x = 1;"));
        assert_eq!(
            store.compile_error().map(|error| error.kind()),
            Some(ErrorKind::Compile)
        );
        assert!(store.frame().is_none());
        assert!(store.selection().is_none());
    }

    #[test]
    fn render_crash_keeps_the_session_usable() {
        let crashing = r#"export default function Boom() {
  throw new Error("kaboom");
}"#;
        let mut store = SessionStore::with_source(immediate(), crashing);
        assert!(store.compile_error().is_none());
        let Some(error) = store.runtime_error() else {
            panic!("expected a runtime error");
        };
        assert_eq!(error.kind(), ErrorKind::Runtime);
        assert!(error.to_string().contains("kaboom"));
        assert_eq!(store.source(), crashing);

        assert!(store.set_source(TWO_BUTTONS));
        assert!(store.runtime_error().is_none());
        assert!(store.frame().is_some());
    }

    #[test]
    fn update_without_selection_is_ignored() {
        let mut store = SessionStore::with_source(immediate(), TWO_BUTTONS);
        assert!(!store.update_style(StyleProperty::Padding, "1px"));
        assert!(store.overrides().is_empty());
        assert!(!store.clear_overrides());
    }
}
