//! `global` and `defaults` sections.

use crate::model::Configuration;
use crate::render::directive::{self, GLOBAL};
use crate::render::{RenderError, Renderer};

pub(super) fn global(
    renderer: &Renderer,
    configuration: &Configuration,
) -> Result<Vec<String>, RenderError> {
    if configuration.pidfile().is_empty() {
        return Err(RenderError::MissingField {
            section: "global".to_string(),
            field: "pidfile",
        });
    }

    let mut lines = vec!["global".to_string()];
    lines.extend(
        directive::emit(configuration, GLOBAL)
            .into_iter()
            .map(|token| renderer.line(token)),
    );
    Ok(lines)
}

pub(super) fn defaults(renderer: &Renderer, configuration: &Configuration) -> Vec<String> {
    let mut lines = vec![
        "defaults".to_string(),
        renderer.line(format!("mode {}", configuration.default_mode)),
    ];

    for (phase, value) in [
        ("connect", &configuration.default_connect_timeout),
        ("client", &configuration.default_client_timeout),
        ("server", &configuration.default_server_timeout),
    ] {
        if let Some(value) = value {
            lines.push(renderer.line(format!("timeout {} {}", phase, value)));
        }
    }
    lines
}
