//! Component compiler: turns component source text into a sandboxed,
//! renderable artifact backed by an embedded JavaScript engine.

mod module;
mod prelude;
mod transform;

pub use module::ModuleBody;
pub use module::SYNTHETIC_DEFAULT;
pub use transform::SourceDialect;
pub use transform::TransformError;

use boa_engine::Context;
use boa_engine::JsError;
use boa_engine::JsObject;
use boa_engine::JsValue;
use boa_engine::Source;
use boa_engine::js_string;
use prelude::FACTORY_PARAMETERS;
use prelude::RUNTIME_PRELUDE;
use regex::Regex;
use sp_core::EditorConfig;
use sp_core::EditorError;
use sp_core::EditorResult;
use sp_core::config::RuntimeLimits;
use sp_dom::Document;
use sp_html::HtmlParser;
use std::fmt;
use std::sync::OnceLock;
use tracing::debug;
use tracing::warn;

/// Compiler settings derived from [`EditorConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    pub filename: String,
    pub max_source_bytes: usize,
    pub limits: RuntimeLimits,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self::from(&EditorConfig::default())
    }
}

impl From<&EditorConfig> for CompilerConfig {
    fn from(config: &EditorConfig) -> Self {
        Self {
            filename: config.component_filename.clone(),
            max_source_bytes: config.max_source_bytes,
            limits: config.runtime.clone(),
        }
    }
}

/// Compiles component sources. Every call, successful or not, advances the
/// render key so a recompiled component never inherits the previous render.
#[derive(Debug, Default)]
pub struct Compiler {
    config: CompilerConfig,
    render_key: u64,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            render_key: 0,
        }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn render_key(&self) -> u64 {
        self.render_key
    }

    pub fn compile(&mut self, source: &str) -> EditorResult<CompiledComponent> {
        self.render_key = self.render_key.wrapping_add(1);
        let result = self.compile_inner(source);
        match &result {
            Ok(component) => debug!(
                render_key = self.render_key,
                component = component.name(),
                "compiled component"
            ),
            Err(error) => warn!(code = error.code(), %error, "component failed to compile"),
        }
        result
    }

    fn compile_inner(&self, source: &str) -> EditorResult<CompiledComponent> {
        if source.len() > self.config.max_source_bytes {
            return Err(EditorError::compile(format!(
                "Source is {} bytes; the limit is {} bytes",
                source.len(),
                self.config.max_source_bytes
            )));
        }

        let module = module::normalize(source)?;
        let dialect = SourceDialect::from_filename(&self.config.filename);
        let body = transform::transform(&module.body, dialect).map_err(|error| {
            let (line, column) = transform::line_column(&module.body, error.offset);
            EditorError::syntax(error.message, line, column)
        })?;

        let mut context = Context::default();
        apply_limits(&mut context, &self.config.limits);

        let wrapped = wrap_module(&body, &module.component);
        let factory = context
            .eval(Source::from_bytes(wrapped.as_bytes()))
            .map_err(|error| engine_syntax_error(&error, &mut context))?;

        let runtime = context
            .eval(Source::from_bytes(RUNTIME_PRELUDE.as_bytes()))
            .map_err(|error| EditorError::compile(describe_error(&error, &mut context)))?;
        let Some(runtime) = runtime.as_object().cloned() else {
            return Err(EditorError::compile("component runtime failed to initialize"));
        };

        let instantiate = runtime
            .get(js_string!("instantiate"), &mut context)
            .map_err(|error| EditorError::compile(describe_error(&error, &mut context)))?;
        let Some(instantiate) = instantiate.as_object().filter(|object| object.is_callable()) else {
            return Err(EditorError::compile("component runtime failed to initialize"));
        };

        let component = instantiate
            .call(&JsValue::undefined(), &[factory], &mut context)
            .map_err(|error| EditorError::compile(describe_error(&error, &mut context)))?;

        let Some(component) = component
            .as_object()
            .filter(|object| object.is_callable())
            .cloned()
        else {
            return Err(EditorError::compile("Component is not a function"));
        };

        Ok(CompiledComponent {
            context,
            runtime,
            component,
            name: module.component,
            render_key: self.render_key,
        })
    }
}

/// A component instantiated inside its own engine context.
pub struct CompiledComponent {
    context: Context,
    runtime: JsObject,
    component: JsObject,
    name: String,
    render_key: u64,
}

impl fmt::Debug for CompiledComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledComponent")
            .field("name", &self.name)
            .field("render_key", &self.render_key)
            .finish_non_exhaustive()
    }
}

impl CompiledComponent {
    /// Binding the component was read from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render_key(&self) -> u64 {
        self.render_key
    }

    /// Renders one pass to markup. Throws inside the component surface as
    /// [`EditorError::Runtime`].
    pub fn render_markup(&mut self) -> EditorResult<String> {
        let render = self
            .runtime
            .get(js_string!("render"), &mut self.context)
            .map_err(|error| EditorError::runtime(describe_error(&error, &mut self.context)))?;
        let Some(render) = render.as_object().filter(|object| object.is_callable()) else {
            return Err(EditorError::runtime("component runtime is missing `render`"));
        };

        let markup = render
            .call(
                &JsValue::undefined(),
                &[JsValue::from(self.component.clone())],
                &mut self.context,
            )
            .and_then(|value| value.to_string(&mut self.context))
            .map_err(|error| EditorError::runtime(describe_error(&error, &mut self.context)))?;
        Ok(markup.to_std_string_escaped())
    }

    /// Renders into a fresh document whose root carries `root_class`.
    pub fn render(&mut self, root_class: &str) -> EditorResult<Document> {
        let markup = self.render_markup()?;
        debug!(
            render_key = self.render_key,
            bytes = markup.len(),
            "rendered component"
        );
        Ok(HtmlParser.parse_fragment(&markup, root_class))
    }
}

fn apply_limits(context: &mut Context, limits: &RuntimeLimits) {
    context
        .runtime_limits_mut()
        .set_recursion_limit(limits.recursion_limit);
    context
        .runtime_limits_mut()
        .set_stack_size_limit(limits.stack_size_limit);
    context
        .runtime_limits_mut()
        .set_loop_iteration_limit(limits.loop_iteration_limit);
}

/// Wraps the module body in a factory whose parameters are the only
/// bindings it can see. The header stays on one line so engine positions
/// are off by exactly one line.
fn wrap_module(body: &str, component: &str) -> String {
    format!("(function ({FACTORY_PARAMETERS}) {{ \"use strict\";\n{body}\n;return {component};\n}})")
}

fn describe_error(error: &JsError, context: &mut Context) -> String {
    error
        .try_native(context)
        .map(|native| native.to_string())
        .unwrap_or_else(|_| error.to_string())
}

static ENGINE_POSITION: OnceLock<Option<Regex>> = OnceLock::new();

/// Maps an evaluation failure of the wrapped module. Engine syntax errors
/// keep their position, shifted back past the wrapper header.
fn engine_syntax_error(error: &JsError, context: &mut Context) -> EditorError {
    let message = describe_error(error, context);
    if !message.starts_with("SyntaxError") {
        return EditorError::compile(message);
    }

    let position = ENGINE_POSITION
        .get_or_init(|| Regex::new(r"line (\d+), col(?:umn)? (\d+)").ok())
        .as_ref()
        .and_then(|pattern| pattern.captures(&message))
        .and_then(|caps| {
            let line = caps.get(1)?.as_str().parse::<usize>().ok()?;
            let column = caps.get(2)?.as_str().parse::<usize>().ok()?;
            Some((line.saturating_sub(1).max(1), column.saturating_sub(1)))
        });
    let (line, column) = position.unwrap_or((1, 0));
    EditorError::syntax(message, line, column)
}

#[cfg(test)]
mod tests {
    use super::Compiler;
    use super::CompilerConfig;
    use sp_core::ErrorKind;
    use sp_core::constants::DEFAULT_COMPONENT_SOURCE;

    fn render(source: &str) -> String {
        let mut compiler = Compiler::default();
        let Ok(mut component) = compiler.compile(source) else {
            panic!("component should compile");
        };
        component.render_markup().unwrap_or_else(|error| panic!("render failed: {error}"))
    }

    #[test]
    fn default_template_renders_its_text() {
        let markup = render(DEFAULT_COMPONENT_SOURCE);
        assert!(markup.contains("<h1 style=\"font-size:24px;font-weight:bold;margin-bottom:16px\">Hello World</h1>"));
        assert!(markup.contains("Secondary Button"));
    }

    #[test]
    fn render_builds_a_document_under_the_marker_root() {
        let mut compiler = Compiler::default();
        let Ok(mut component) =
            compiler.compile("export default function A() { return <p className=\"x\">hi</p>; }")
        else {
            panic!("component should compile");
        };
        let Ok(document) = component.render("preview-content") else {
            panic!("component should render");
        };
        assert!(document.has_class(document.root(), "preview-content"));
        let Some(p) = document.element_children(document.root()).next() else {
            panic!("paragraph should be rendered");
        };
        assert!(document.has_class(p, "x"));
        assert_eq!(document.text_content(p), "hi");
    }

    #[test]
    fn hooks_and_composition_render_first_pass() {
        let markup = render(
            r#"import React, { useState, useEffect } from 'react';
const Theme = React.createContext('light');
function Label({ text }: { text: string }) {
  const theme = React.useContext(Theme);
  return <span data-theme={theme}>{text}</span>;
}
export default function Counter() {
  const [count, setCount] = useState<number>(() => 3);
  useEffect(() => { setCount(10); }, []);
  return (
    <Theme.Provider value="dark">
      <button onClick={() => setCount(count + 1)} disabled>
        <Label text={`Count: ${count}`} />
      </button>
      {[1, 2].map((n) => <i key={n}>{n}</i>)}
    </Theme.Provider>
  );
}"#,
        );
        assert_eq!(
            markup,
            "<button disabled><span data-theme=\"dark\">Count: 3</span></button><i>1</i><i>2</i>"
        );
    }

    #[test]
    fn enums_generics_and_satisfies_evaluate() {
        let markup = render(
            r#"export enum Tone { Quiet, Loud = 5, Louder }
const pick = <T,>(items: T[], index: number): T => items[index];
const wrap = <T extends object>(value: T) => value;
const labels = { quiet: 'q', loud: 'L' } satisfies Record<string, string>;
export default function Badge() {
  const tone: Tone = pick([Tone.Quiet, Tone.Louder], 1);
  return <i data-name={Tone[tone]}>{tone}:{wrap(labels).loud}</i>;
}"#,
        );
        assert_eq!(markup, "<i data-name=\"Louder\">6:L</i>");
    }

    #[test]
    fn class_components_render() {
        let markup = render(
            "export default class Hello extends React.Component {\n  render() { return <b>{this.props.name || 'anon'}</b>; }\n}",
        );
        assert_eq!(markup, "<b>anon</b>");
    }

    #[test]
    fn missing_default_export_is_a_compile_error() {
        let mut compiler = Compiler::default();
        let Err(error) = compiler.compile("function A() { return <p/>; }") else {
            panic!("compile should fail");
        };
        assert_eq!(error.kind(), ErrorKind::Compile);
    }

    #[test]
    fn non_callable_export_is_rejected() {
        let mut compiler = Compiler::default();
        let Err(error) = compiler.compile("export default 42;") else {
            panic!("compile should fail");
        };
        assert_eq!(error.to_string(), "Component is not a function");
    }

    #[test]
    fn malformed_jsx_is_a_syntax_error() {
        let mut compiler = Compiler::default();
        let Err(error) =
            compiler.compile("export default function A() {\n  return <div><span></div>;\n}")
        else {
            panic!("compile should fail");
        };
        assert_eq!(error.code(), "compiler.syntax");
        assert!(error.to_string().ends_with("(2:20)"));
    }

    #[test]
    fn engine_syntax_errors_are_syntax_errors() {
        let mut compiler = Compiler::default();
        let Err(error) = compiler.compile("export default function A() { return 1 +; }") else {
            panic!("compile should fail");
        };
        assert_eq!(error.kind(), ErrorKind::Syntax);
    }

    #[test]
    fn throwing_component_is_a_runtime_error() {
        let mut compiler = Compiler::default();
        let Ok(mut component) = compiler
            .compile("export default function A() { throw new Error('boom'); }")
        else {
            panic!("component should compile");
        };
        let Err(error) = component.render_markup() else {
            panic!("render should fail");
        };
        assert_eq!(error.kind(), ErrorKind::Runtime);
        assert!(error.to_string().contains("boom"));
    }

    #[test]
    fn host_globals_are_shadowed() {
        let markup = render(
            "export default function A() { return <p>{typeof window}-{typeof document}</p>; }",
        );
        assert_eq!(markup, "<p>undefined-undefined</p>");
    }

    #[test]
    fn runaway_loops_are_stopped() {
        let mut compiler = Compiler::default();
        let Ok(mut component) =
            compiler.compile("export default function A() { while (true) {} }")
        else {
            panic!("component should compile");
        };
        assert!(component.render_markup().is_err());
    }

    #[test]
    fn render_key_advances_on_every_attempt() {
        let mut compiler = Compiler::new(CompilerConfig::default());
        let _ = compiler.compile("export default () => <p/>;");
        let _ = compiler.compile("not a component");
        assert_eq!(compiler.render_key(), 2);
    }

    #[test]
    fn oversized_source_is_rejected() {
        let mut compiler = Compiler::new(CompilerConfig {
            max_source_bytes: 8,
            ..CompilerConfig::default()
        });
        let Err(error) = compiler.compile("export default () => null;") else {
            panic!("compile should fail");
        };
        assert_eq!(error.kind(), ErrorKind::Compile);
    }
}
