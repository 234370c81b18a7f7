//! Callback status page rendering.
//!
//! Renders a [`CallbackView`] from embedded templates via minijinja.

pub mod templates;

use minijinja::{Environment, context};

use crate::auth::oauth::CallbackView;

/// Build a minijinja environment with all embedded templates registered.
fn template_env() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("layout.html", templates::LAYOUT)?;
    env.add_template("callback.html", templates::CALLBACK)?;
    Ok(env)
}

/// Human-readable provider name.
fn provider_label(provider: &str) -> &str {
    match provider {
        "kakao" => "카카오",
        "apple" => "Apple",
        other => other,
    }
}

/// Render the status page for `view`.
pub fn render_status_page(view: &CallbackView) -> Result<String, minijinja::Error> {
    let env = template_env()?;
    let tmpl = env.get_template("callback.html")?;
    tmpl.render(context! {
        status => view.status,
        provider => &view.provider,
        provider_label => provider_label(&view.provider),
        message => view.message.as_deref().unwrap_or_default(),
        redirect_to => &view.redirect_to,
    })
}
