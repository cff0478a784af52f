use handlebars::{Handlebars, RenderError, TemplateError};

use model::Post;

const INDEX: &'static str = "index";
const ADD: &'static str = "add";
const UPDATE: &'static str = "update";

/// Compiled page templates, shared by every handler.
pub struct Views {
    registry: Handlebars<'static>,
}

impl Views {
    pub fn new() -> Result<Views, TemplateError> {
        let mut registry = Handlebars::new();
        registry.register_template_string(INDEX, include_str!("../templates/index.hbs"))?;
        registry.register_template_string(ADD, include_str!("../templates/add.hbs"))?;
        registry.register_template_string(UPDATE, include_str!("../templates/update.hbs"))?;

        Ok(Views { registry: registry })
    }

    pub fn index(&self, posts: &[Post]) -> Result<String, RenderError> {
        self.registry.render(INDEX, &json!({ "post": posts }))
    }

    pub fn add(&self) -> Result<String, RenderError> {
        self.registry.render(ADD, &json!({ "title": "Add form" }))
    }

    pub fn update(&self, post: &Post) -> Result<String, RenderError> {
        self.registry.render(UPDATE, &json!({ "post": post }))
    }
}
