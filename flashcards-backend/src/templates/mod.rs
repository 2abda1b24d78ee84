use minijinja::{Value, context};

mod engine;

pub use engine::{MiniJinjaEngine, TemplateEngine};

use crate::session::FlashSession;

/// Render a page, exposing the request's flushed flash messages as
/// `messages` and `has_messages` next to the page's own context.
pub fn render_page(
    engine: &dyn TemplateEngine,
    template_name: &str,
    flash: &FlashSession,
    page: Value,
) -> Result<String, minijinja::Error> {
    let context = context! {
        messages => flash.messages(),
        has_messages => flash.has_messages(),
        ..page
    };
    engine.render(template_name, context)
}
