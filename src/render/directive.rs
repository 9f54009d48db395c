//! Descriptor tables for attribute-driven directives.
//!
//! Sections whose lines are a fixed list of optional attributes (the `global`
//! section, the options of a `server` line) are described by a static table of
//! `Directive`s and emitted by one routine instead of per-field code.

use crate::model::{Configuration, Server};

/// Value of one attribute as the emitter sees it.
pub(crate) enum Setting<'a> {
    /// Bare keyword when true, nothing when false.
    Flag(bool),
    Text(Option<&'a str>),
    Number(Option<u32>),
}

/// `keyword` is already hyphenated (`error_limit` renders as `error-limit`).
pub(crate) struct Directive<T> {
    pub keyword: &'static str,
    pub read: fn(&T) -> Setting<'_>,
}

impl<T> Directive<T> {
    fn token(&self, entity: &T) -> Option<String> {
        match (self.read)(entity) {
            Setting::Flag(true) => Some(self.keyword.to_string()),
            Setting::Flag(false) | Setting::Text(None) | Setting::Number(None) => None,
            Setting::Text(Some(value)) => Some(format!("{} {}", self.keyword, value)),
            Setting::Number(Some(value)) => Some(format!("{} {}", self.keyword, value)),
        }
    }
}

/// Tokens for every set attribute, in table order.
pub(crate) fn emit<T>(entity: &T, table: &[Directive<T>]) -> Vec<String> {
    table.iter().filter_map(|d| d.token(entity)).collect()
}

pub(crate) const GLOBAL: &[Directive<Configuration>] = &[
    Directive { keyword: "chroot", read: |c| Setting::Text(c.chroot.as_deref()) },
    Directive { keyword: "daemon", read: |c| Setting::Flag(c.daemon) },
    Directive { keyword: "group", read: |c| Setting::Text(c.group.as_deref()) },
    Directive { keyword: "log-tag", read: |c| Setting::Text(c.log_tag.as_deref()) },
    Directive { keyword: "pidfile", read: |c| Setting::Text(Some(c.pidfile())) },
    Directive { keyword: "user", read: |c| Setting::Text(c.user.as_deref()) },
];

pub(crate) const SERVER: &[Directive<Server>] = &[
    Directive { keyword: "addr", read: |s| Setting::Text(s.options.addr.as_deref()) },
    Directive { keyword: "backup", read: |s| Setting::Flag(s.options.backup) },
    Directive { keyword: "check", read: |s| Setting::Flag(s.options.check) },
    Directive { keyword: "cookie", read: |s| Setting::Text(s.options.cookie.as_deref()) },
    Directive { keyword: "disabled", read: |s| Setting::Flag(s.options.disabled) },
    Directive { keyword: "error-limit", read: |s| Setting::Number(s.options.error_limit) },
    Directive { keyword: "fall", read: |s| Setting::Number(s.options.fall) },
    Directive { keyword: "inter", read: |s| Setting::Number(s.options.inter) },
    Directive { keyword: "fastinter", read: |s| Setting::Number(s.options.fastinter) },
    Directive { keyword: "downinter", read: |s| Setting::Number(s.options.downinter) },
    Directive { keyword: "maxconn", read: |s| Setting::Number(s.options.maxconn) },
    Directive { keyword: "maxqueue", read: |s| Setting::Number(s.options.maxqueue) },
    Directive { keyword: "minconn", read: |s| Setting::Number(s.options.minconn) },
    Directive { keyword: "observe", read: |s| Setting::Text(s.options.observe.as_deref()) },
    Directive { keyword: "on-error", read: |s| Setting::Text(s.options.on_error.as_deref()) },
    Directive { keyword: "port", read: |s| Setting::Number(s.options.port) },
    Directive { keyword: "redir", read: |s| Setting::Text(s.options.redir.as_deref()) },
    Directive { keyword: "rise", read: |s| Setting::Number(s.options.rise) },
    Directive { keyword: "slowstart", read: |s| Setting::Number(s.options.slowstart) },
    Directive { keyword: "track", read: |s| Setting::Text(s.options.track.as_deref()) },
    Directive { keyword: "weight", read: |s| Setting::Number(s.options.weight) },
];
