use minijinja::{Environment, Value, default_auto_escape_callback};

pub trait TemplateEngine: Send + Sync {
    fn render(&self, template_name: &str, context: Value) -> Result<String, minijinja::Error>;
}

pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl MiniJinjaEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(default_auto_escape_callback);
        for &(name, source) in EMBEDDED_TEMPLATES {
            if let Err(e) = env.add_template(name, source) {
                log::error!("Failed to load template {}: {}", name, e);
            }
        }
        Self { env }
    }
}

impl Default for MiniJinjaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn render(&self, template_name: &str, context: Value) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template(template_name)?;
        tmpl.render(context)
    }
}

/// Templates compiled into the binary
const EMBEDDED_TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("html/layout.html")),
    ("messages.html", include_str!("html/messages.html")),
    // Error pages
    ("error_404.html", include_str!("html/error_404.html")),
    ("error_500.html", include_str!("html/error_500.html")),
    // Card pages
    ("cards/list.html", include_str!("html/cards/list.html")),
    ("cards/show.html", include_str!("html/cards/show.html")),
    ("cards/new.html", include_str!("html/cards/new.html")),
    ("cards/edit.html", include_str!("html/cards/edit.html")),
    ("cards/form_fields.html", include_str!("html/cards/form_fields.html")),
];

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn test_all_embedded_templates_parse() {
        let mut env = Environment::new();
        for &(name, source) in EMBEDDED_TEMPLATES {
            env.add_template(name, source)
                .unwrap_or_else(|e| panic!("template {} failed to parse: {}", name, e));
        }
    }

    #[test]
    fn test_messages_are_escaped() {
        let engine = MiniJinjaEngine::new();
        let html = engine
            .render(
                "error_404.html",
                context! {
                    url => "/<script>",
                    messages => Vec::<String>::new(),
                    has_messages => false,
                },
            )
            .unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
