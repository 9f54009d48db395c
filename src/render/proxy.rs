//! `frontend` and `backend` sections.

use std::collections::HashSet;

use crate::model::{Backend, Frontend, Proxy, ProxyKind, ProxyOptions};
use crate::render::directive::{self, SERVER};
use crate::render::{RenderError, Renderer};

/// Timeout directives in emission order, keyed by phase (`connect_timeout` → `connect`).
const TIMEOUTS: [(&str, fn(&ProxyOptions) -> Option<&str>); 3] = [
    ("connect", |o| o.connect_timeout.as_deref()),
    ("client", |o| o.client_timeout.as_deref()),
    ("server", |o| o.server_timeout.as_deref()),
];

pub(super) fn block(renderer: &Renderer, proxy: &Proxy) -> Result<Vec<String>, RenderError> {
    let section = format!("{} {}", proxy.proxy_type(), proxy.name());
    let mut lines = vec![section.clone()];

    if let ProxyKind::Frontend(frontend) = proxy.kind() {
        if frontend.bind().trim().is_empty() {
            return Err(RenderError::MissingField {
                section,
                field: "bind",
            });
        }
        lines.push(renderer.line(format!("bind {}", frontend.bind())));
    }

    common_options(renderer, &proxy.options, &mut lines);

    if !proxy.acls().is_empty() {
        lines.push(String::new());
        for acl in proxy.acls() {
            lines.push(renderer.line(format!("acl {} {}", acl.name(), acl.expression())));
        }
    }

    match proxy.kind() {
        ProxyKind::Backend(backend) => servers(renderer, &section, backend, &mut lines)?,
        ProxyKind::Frontend(frontend) => targets(renderer, &section, frontend, &mut lines)?,
    }

    Ok(lines)
}

fn common_options(renderer: &Renderer, options: &ProxyOptions, lines: &mut Vec<String>) {
    if let Some(mode) = options.mode {
        lines.push(renderer.line(format!("mode {}", mode)));
    }

    for (phase, read) in TIMEOUTS {
        if let Some(value) = read(options) {
            lines.push(renderer.line(format!("timeout {} {}", phase, value)));
        }
    }

    if options.forwardfor {
        let mut line = "option forwardfor".to_string();
        if let Some(header) = &options.forwardfor_header {
            line.push_str(" header ");
            line.push_str(header);
        }
        lines.push(renderer.line(line));
    }

    for (enabled, option) in [
        (options.http_log, "httplog"),
        (options.http_close, "httpclose"),
        (options.http_server_close, "http-server-close"),
    ] {
        if enabled {
            lines.push(renderer.line(format!("option {}", option)));
        }
    }

    if options.log_global {
        lines.push(renderer.line("log global"));
    }
}

fn servers(
    renderer: &Renderer,
    section: &str,
    backend: &Backend,
    lines: &mut Vec<String>,
) -> Result<(), RenderError> {
    let mut seen = HashSet::new();
    for server in backend.servers() {
        if !seen.insert(server.name()) {
            return Err(RenderError::Duplicate {
                section: section.to_string(),
                what: "server",
                value: server.name().to_string(),
            });
        }
        // The separator after the address is kept even when no options follow.
        lines.push(renderer.line(format!(
            "server {} {} {}",
            server.name(),
            server.address(),
            directive::emit(server, SERVER).join(" ")
        )));
    }
    Ok(())
}

fn targets(
    renderer: &Renderer,
    section: &str,
    frontend: &Frontend,
    lines: &mut Vec<String>,
) -> Result<(), RenderError> {
    let ranked = frontend.targets_by_rank();
    if let Some(pair) = ranked.windows(2).find(|pair| pair[0].rank() == pair[1].rank()) {
        return Err(RenderError::Duplicate {
            section: section.to_string(),
            what: "target rank",
            value: pair[0].rank().to_string(),
        });
    }

    if !ranked.is_empty() {
        lines.push(String::new());
        for target in ranked {
            lines.push(renderer.line(format!(
                "use_backend {} {} {}",
                target.backend(),
                target.operator,
                target.condition()
            )));
        }
    }

    if let Some(default_backend) = &frontend.default_backend {
        lines.push(String::new());
        lines.push(renderer.line(format!("default_backend {}", default_backend)));
    }
    Ok(())
}
