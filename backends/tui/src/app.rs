use std::{cell::RefCell, rc::Rc};

use rill_core::{Node, NodeId, Surface};
use rill_memory::MemoryDocument;
use tracing::debug;

use crate::{
    error::TuiError,
    renderer::{RenderFrame, Renderer},
    terminal::Terminal,
};

/// Entry point for running rill trees in the terminal.
///
/// The app owns an in-memory output document. Trees are mounted into its root, and every
/// mount or dispatched event presents a fresh frame of the document.
///
/// The document never frees replaced output (see [`MemoryDocument`]), so its size grows
/// with every update over the life of the app.
#[derive(Debug)]
pub struct TuiApp {
    terminal: Terminal,
    renderer: Renderer,
    document: Rc<RefCell<MemoryDocument>>,
    surface: Surface,
    root: Option<Node>,
}

impl TuiApp {
    /// Mounts `root` into the document root and presents the result.
    ///
    /// The app keeps `root` alive until the next mount, so a mounted component keeps
    /// reacting to dispatched events.
    ///
    /// # Errors
    ///
    /// Returns an error when rendering the tree fails or when the terminal cannot be
    /// written to.
    pub fn mount(&mut self, root: Node) -> Result<(), TuiError> {
        let target = self.document.borrow().root();
        rill_core::mount(&root, &self.surface, target)?;
        self.root = Some(root);
        self.present()
    }

    /// Returns the tree passed to the last successful [`TuiApp::mount`].
    #[must_use]
    pub const fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    /// Fires `event` on `target`, then presents the document again.
    ///
    /// Returns how many listeners ran.
    ///
    /// # Errors
    ///
    /// Fails for an unknown `target` or when the terminal cannot be written to.
    pub fn dispatch(&mut self, target: NodeId, event: &str) -> Result<usize, TuiError> {
        let handled = self.surface.dispatch(target, event)?;
        debug!(?target, event, handled, "dispatched event");
        self.present()?;
        Ok(handled)
    }

    /// Draws the current state of the document.
    ///
    /// # Errors
    ///
    /// Propagates terminal I/O failures.
    pub fn present(&mut self) -> Result<(), TuiError> {
        let frame = self.render_to_frame()?;
        self.terminal.render(&frame)?;
        debug!(lines = frame.lines().len(), "presented frame");
        Ok(())
    }

    /// Renders the document into a frame without drawing it to the terminal.
    ///
    /// # Errors
    ///
    /// Fails only when the document lost its root, which cannot happen for documents
    /// created through [`MemoryDocument::new`].
    pub fn render_to_frame(&self) -> Result<RenderFrame, TuiError> {
        let document = self.document.borrow();
        self.renderer.render(&document, document.root())
    }

    /// Returns the output document.
    #[must_use]
    pub const fn document(&self) -> &Rc<RefCell<MemoryDocument>> {
        &self.document
    }

    /// Returns the surface trees are rendered through.
    #[must_use]
    pub const fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Provides immutable access to the renderer.
    #[must_use]
    pub const fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Provides mutable access to the terminal handle.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn terminal_mut(&mut self) -> &mut Terminal {
        &mut self.terminal
    }

    /// Provides immutable access to the terminal handle.
    #[must_use]
    pub const fn terminal(&self) -> &Terminal {
        &self.terminal
    }
}

/// Builder for [`TuiApp`] instances.
#[derive(Debug, Default)]
pub struct TuiAppBuilder {
    terminal: Option<Terminal>,
    renderer: Renderer,
    document: Option<Rc<RefCell<MemoryDocument>>>,
}

impl TuiAppBuilder {
    /// Creates a new builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the terminal handle used by the application. Defaults to
    /// [`Terminal::stdout`].
    #[must_use]
    pub fn with_terminal(mut self, terminal: Terminal) -> Self {
        self.terminal = Some(terminal);
        self
    }

    /// Sets how many columns each nesting level is indented by.
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.renderer = self.renderer.with_indent(indent);
        self
    }

    /// Cuts presented lines to `width` columns.
    #[must_use]
    pub fn with_max_width(mut self, width: usize) -> Self {
        self.renderer = self.renderer.with_max_width(Some(width));
        self
    }

    /// Presents an existing document instead of a fresh one.
    #[must_use]
    pub fn with_document(mut self, document: Rc<RefCell<MemoryDocument>>) -> Self {
        self.document = Some(document);
        self
    }

    /// Consumes the builder and produces a [`TuiApp`].
    #[must_use]
    pub fn build(self) -> TuiApp {
        let document = self
            .document
            .unwrap_or_else(|| Rc::new(RefCell::new(MemoryDocument::new())));
        TuiApp {
            terminal: self.terminal.unwrap_or_else(Terminal::stdout),
            renderer: self.renderer,
            surface: Surface::new(document.clone()),
            document,
            root: None,
        }
    }
}

impl From<TuiAppBuilder> for TuiApp {
    fn from(value: TuiAppBuilder) -> Self {
        value.build()
    }
}

impl Default for TuiApp {
    fn default() -> Self {
        TuiAppBuilder::new().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_core::{Attrs, Component, Listener, Result, Scope, Type, Value, build, json};

    fn buffered_app() -> TuiApp {
        TuiAppBuilder::new()
            .with_terminal(Terminal::buffered())
            .build()
    }

    #[test]
    fn mount_into_buffer() {
        let mut app = buffered_app();
        let tree = build("p", [("class", "greeting")], "Hello TUI").expect("tree should build");
        app.mount(tree).expect("mount should succeed");
        let snapshot = app.terminal().snapshot().expect("buffered terminal");
        assert_eq!(snapshot, "p class=\"greeting\"\n  Hello TUI");
        assert_eq!(app.terminal().frames(), 1);
    }

    #[test]
    fn dispatch_presents_again() {
        let mut app = buffered_app();
        let attrs = Attrs::new().with("onClick", Listener::new(|_| {}));
        app.mount(build("button", attrs, "go").unwrap()).unwrap();

        let button = {
            let document = app.document().borrow();
            document.children(document.root())[0]
        };
        assert_eq!(app.dispatch(button, "click").unwrap(), 1);
        assert_eq!(app.terminal().frames(), 2);
    }

    #[test]
    fn builder_settings_reach_the_renderer() {
        let mut app = TuiAppBuilder::new()
            .with_terminal(Terminal::buffered())
            .with_indent(4)
            .with_max_width(6)
            .build();
        app.mount(build("div", (), "abcdefghij").unwrap()).unwrap();
        assert_eq!(app.terminal().snapshot(), Some("div\n    ab"));
    }

    #[test]
    fn shares_a_given_document() {
        let document = Rc::new(RefCell::new(MemoryDocument::new()));
        let mut app = TuiAppBuilder::new()
            .with_terminal(Terminal::buffered())
            .with_document(document.clone())
            .build();
        app.mount(build("hr", (), ()).unwrap()).unwrap();
        let document = document.borrow();
        assert_eq!(document.inner_markup(document.root()), "<hr></hr>");
    }

    #[derive(Default)]
    struct Toggle;

    impl Component for Toggle {
        fn render(&self, scope: &Scope<'_>) -> Result<rill_core::Node> {
            let on = scope.state()["on"].as_bool().unwrap_or(false);
            let handle = scope.weak_handle();
            let flip = Listener::new(move |_| {
                let handle = handle.upgrade().expect("mounted component should be alive");
                let on = handle.state()["on"].as_bool().unwrap_or(false);
                handle.set_state(json!({ "on": !on })).unwrap();
            });
            build(
                "button",
                Attrs::new().with("onClick", flip),
                if on { "on" } else { "off" },
            )
        }

        fn initial_state(&self) -> Option<Value> {
            Some(json!({ "on": false }))
        }
    }

    #[test]
    fn mounted_component_outlives_the_mount_call() {
        let mut app = buffered_app();
        app.mount(build(Type::component::<Toggle>(), (), ()).unwrap())
            .unwrap();
        assert_eq!(app.terminal().snapshot(), Some("button\n  off"));

        let button = {
            let document = app.document().borrow();
            document.find_element(document.root(), "button").unwrap()
        };
        assert_eq!(app.dispatch(button, "click").unwrap(), 1);
        assert_eq!(app.terminal().snapshot(), Some("button\n  on"));
        assert!(matches!(app.root(), Some(rill_core::Node::Component(_))));
    }
}
