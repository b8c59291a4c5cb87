//! Counter demo: every click bumps the count and appends a history entry.
//!
//! Run with `RILL_LOG=rill_core=debug` to see the reconciliation summaries.

use rill::prelude::*;
use rill::Value;
use tracing::info;

#[derive(Default)]
struct Counter;

fn count_of(state: &Value) -> i64 {
    state["count"].as_i64().unwrap_or(0)
}

impl Component for Counter {
    fn render(&self, scope: &Scope<'_>) -> Result<Node> {
        let count = count_of(scope.state());
        let handle = scope.weak_handle();
        let increment = Listener::new(move |_| {
            let Some(handle) = handle.upgrade() else {
                return;
            };
            let count = count_of(&handle.state()) + 1;
            if let Err(error) = handle.set_state(json!({ "count": count })) {
                tracing::error!(%error, "counter update failed");
            }
        });

        let history = (1..=count)
            .map(|n| build("li", (), format!("clicked ({n})")))
            .collect::<Result<Vec<_>>>()?;

        build(
            "div",
            [("class", "counter")],
            children![
                build("span", (), format!("count: {count}"))?,
                build("button", Attrs::new().with("onClick", increment), "+")?,
                build("ul", (), history)?,
            ],
        )
    }

    fn initial_state(&self) -> Option<Value> {
        Some(json!({ "count": 0 }))
    }
}

fn main() -> core::result::Result<(), Box<dyn std::error::Error>> {
    rill::logging::install();

    let mut app = TuiAppBuilder::new().with_terminal(Terminal::stdout()).build();
    app.mount(build(Type::component::<Counter>(), (), ())?)?;

    let button = {
        let document = app.document().borrow();
        document
            .find_element(document.root(), "button")
            .ok_or("counter rendered no button")?
    };
    for _ in 0..3 {
        println!("---");
        app.dispatch(button, "click")?;
    }

    let document = app.document().borrow();
    let root = document.root();
    info!(markup = %document.inner_markup(root), "final document");
    if let Some(snapshot) = document.snapshot(root) {
        println!("{}", snapshot.to_json()?);
    }
    Ok(())
}
