//! Frontend and backend proxies.
//!
//! A proxy is a common set of fields plus a variant payload selected by the
//! `kind` tag: frontends carry a bind address and ranked targets, backends
//! carry servers.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::model::acl::{self, Acl, AclDiff};
use crate::model::error::{self, ValidationError};
use crate::model::server::Server;
use crate::model::target::Target;
use crate::model::Mode;

/// Discriminator of the proxy variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyType {
    Frontend,
    Backend,
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyType::Frontend => write!(f, "frontend"),
            ProxyType::Backend => write!(f, "backend"),
        }
    }
}

/// Options shared by both proxy variants.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyOptions {
    pub mode: Option<Mode>,
    pub connect_timeout: Option<String>,
    pub client_timeout: Option<String>,
    pub server_timeout: Option<String>,
    pub forwardfor: bool,
    pub forwardfor_header: Option<String>,
    pub http_close: bool,
    pub http_server_close: bool,
    pub http_log: bool,
    pub log_global: bool,
}

/// Frontend-only payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Frontend {
    bind: String,
    #[serde(default)]
    pub default_backend: Option<String>,
    #[serde(default)]
    targets: Vec<Target>,
}

impl Frontend {
    pub fn bind(&self) -> &str {
        &self.bind
    }

    pub fn set_bind(&mut self, bind: impl Into<String>) -> Result<(), ValidationError> {
        let bind = bind.into();
        error::required("frontend.bind", &bind)?;
        self.bind = bind;
        Ok(())
    }

    /// Targets in insertion order.
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Targets in emission order: ascending rank.
    pub fn targets_by_rank(&self) -> Vec<&Target> {
        let mut targets: Vec<&Target> = self.targets.iter().collect();
        targets.sort_by_key(|t| t.rank());
        targets
    }

    pub fn target(&self, rank: u32) -> Option<&Target> {
        self.targets.iter().find(|t| t.rank() == rank)
    }

    pub fn target_mut(&mut self, rank: u32) -> Option<&mut Target> {
        self.targets.iter_mut().find(|t| t.rank() == rank)
    }

    pub fn add_target(&mut self, target: Target) -> Result<(), ValidationError> {
        target.validate()?;
        if self.target(target.rank()).is_some() {
            return Err(ValidationError::unique("target.rank"));
        }
        self.targets.push(target);
        Ok(())
    }

    pub fn remove_target(&mut self, rank: u32) -> Option<Target> {
        let index = self.targets.iter().position(|t| t.rank() == rank)?;
        Some(self.targets.remove(index))
    }

    fn validate(&self) -> Result<(), ValidationError> {
        error::required("frontend.bind", &self.bind)?;
        if let Some(backend) = &self.default_backend {
            error::token("frontend.default_backend", backend)?;
        }
        let mut ranks = HashSet::new();
        for target in &self.targets {
            target.validate()?;
            if !ranks.insert(target.rank()) {
                return Err(ValidationError::unique("target.rank"));
            }
        }
        Ok(())
    }
}

/// Backend-only payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Backend {
    #[serde(default)]
    servers: Vec<Server>,
}

impl Backend {
    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    pub fn server(&self, name: &str) -> Option<&Server> {
        self.servers.iter().find(|s| s.name() == name)
    }

    pub fn server_mut(&mut self, name: &str) -> Option<&mut Server> {
        self.servers.iter_mut().find(|s| s.name() == name)
    }

    pub fn add_server(&mut self, server: Server) -> Result<(), ValidationError> {
        server.validate()?;
        if self.server(server.name()).is_some() {
            return Err(ValidationError::unique("server.name"));
        }
        self.servers.push(server);
        Ok(())
    }

    pub fn remove_server(&mut self, name: &str) -> Option<Server> {
        let index = self.servers.iter().position(|s| s.name() == name)?;
        Some(self.servers.remove(index))
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let mut names = HashSet::new();
        for server in &self.servers {
            server.validate()?;
            if !names.insert(server.name()) {
                return Err(ValidationError::unique("server.name"));
            }
        }
        Ok(())
    }
}

/// Variant payload, tagged by `kind` in serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProxyKind {
    Frontend(Frontend),
    Backend(Backend),
}

/// A listener (frontend) or server pool (backend).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Proxy {
    name: String,
    #[serde(flatten)]
    pub options: ProxyOptions,
    #[serde(default)]
    acls: Vec<Acl>,
    #[serde(flatten)]
    kind: ProxyKind,
}

impl Proxy {
    pub fn frontend(
        name: impl Into<String>,
        bind: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Self::with_kind(
            name.into(),
            ProxyKind::Frontend(Frontend {
                bind: bind.into(),
                default_backend: None,
                targets: Vec::new(),
            }),
        )
    }

    pub fn backend(name: impl Into<String>) -> Result<Self, ValidationError> {
        Self::with_kind(name.into(), ProxyKind::Backend(Backend::default()))
    }

    fn with_kind(name: String, kind: ProxyKind) -> Result<Self, ValidationError> {
        let proxy = Self {
            name,
            options: ProxyOptions::default(),
            acls: Vec::new(),
            kind,
        };
        proxy.validate()?;
        Ok(proxy)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames are coordinated by the owning configuration, which checks sibling uniqueness.
    pub(crate) fn set_name(&mut self, name: String) -> Result<(), ValidationError> {
        error::token("proxy.name", &name)?;
        self.name = name;
        Ok(())
    }

    pub fn proxy_type(&self) -> ProxyType {
        match self.kind {
            ProxyKind::Frontend(_) => ProxyType::Frontend,
            ProxyKind::Backend(_) => ProxyType::Backend,
        }
    }

    pub fn kind(&self) -> &ProxyKind {
        &self.kind
    }

    pub fn as_frontend(&self) -> Option<&Frontend> {
        match &self.kind {
            ProxyKind::Frontend(frontend) => Some(frontend),
            ProxyKind::Backend(_) => None,
        }
    }

    pub fn as_frontend_mut(&mut self) -> Option<&mut Frontend> {
        match &mut self.kind {
            ProxyKind::Frontend(frontend) => Some(frontend),
            ProxyKind::Backend(_) => None,
        }
    }

    pub fn as_backend(&self) -> Option<&Backend> {
        match &self.kind {
            ProxyKind::Backend(backend) => Some(backend),
            ProxyKind::Frontend(_) => None,
        }
    }

    pub fn as_backend_mut(&mut self) -> Option<&mut Backend> {
        match &mut self.kind {
            ProxyKind::Backend(backend) => Some(backend),
            ProxyKind::Frontend(_) => None,
        }
    }

    /// ACL rows in declared order.
    pub fn acls(&self) -> &[Acl] {
        &self.acls
    }

    /// Expressions of every row named `name`, in declared order.
    pub fn acl_expressions(&self, name: &str) -> Vec<&str> {
        self.acls
            .iter()
            .filter(|a| a.name() == name)
            .map(Acl::expression)
            .collect()
    }

    pub fn add_acl(&mut self, acl: Acl) -> Result<(), ValidationError> {
        acl.validate()?;
        if self.acls.contains(&acl) {
            return Err(ValidationError::unique("acl.expression"));
        }
        self.acls.push(acl);
        Ok(())
    }

    /// Remove every row named `name`, returning how many were removed.
    pub fn remove_acls(&mut self, name: &str) -> usize {
        let before = self.acls.len();
        self.acls.retain(|a| a.name() != name);
        before - self.acls.len()
    }

    /// Reconcile the rows named `name` to exactly `desired`.
    ///
    /// Rows whose expression is still desired keep their position; the others
    /// are dropped and new expressions are appended in the given order.
    pub fn reconcile_acls(
        &mut self,
        name: &str,
        desired: &[String],
    ) -> Result<AclDiff, ValidationError> {
        error::token("acl.name", name)?;
        acl::check_expressions(desired)?;

        let diff = acl::diff(&self.acl_expressions(name), desired);
        self.acls
            .retain(|a| a.name() != name || !diff.removed.iter().any(|r| r == a.expression()));
        for expression in &diff.added {
            self.acls.push(Acl::new(name, expression.clone())?);
        }
        Ok(diff)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        error::token("proxy.name", &self.name)?;

        let o = &self.options;
        for (field, value) in [
            ("proxy.connect_timeout", &o.connect_timeout),
            ("proxy.client_timeout", &o.client_timeout),
            ("proxy.server_timeout", &o.server_timeout),
        ] {
            error::single_line(field, value.as_deref())?;
        }
        if let Some(header) = &o.forwardfor_header {
            error::word("proxy.forwardfor_header", header)?;
        }

        let mut seen = HashSet::new();
        for acl in &self.acls {
            acl.validate()?;
            if !seen.insert((acl.name(), acl.expression())) {
                return Err(ValidationError::unique("acl.expression"));
            }
        }

        match &self.kind {
            ProxyKind::Frontend(frontend) => frontend.validate(),
            ProxyKind::Backend(backend) => backend.validate(),
        }
    }
}
