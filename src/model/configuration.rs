//! Root configuration entity.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::model::error::{self, ValidationError};
use crate::model::proxy::{Proxy, ProxyType};
use crate::model::Mode;

/// One rendered proxy configuration file and everything it contains.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Configuration {
    name: String,
    filepath: PathBuf,
    pidfile: String,

    #[serde(default)]
    pub chroot: Option<String>,
    #[serde(default = "default_true")]
    pub daemon: bool,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub log_tag: Option<String>,
    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub default_mode: Mode,
    #[serde(default = "default_connect_timeout")]
    pub default_connect_timeout: Option<String>,
    #[serde(default = "default_client_timeout")]
    pub default_client_timeout: Option<String>,
    #[serde(default = "default_server_timeout")]
    pub default_server_timeout: Option<String>,

    /// Emit the `global` section.
    #[serde(default = "default_true")]
    pub include_globals: bool,
    /// Emit the `defaults` section.
    #[serde(default = "default_true")]
    pub include_defaults: bool,

    /// Command run after a successful write, split on whitespace.
    #[serde(default)]
    pub reload_command: Option<String>,

    #[serde(default)]
    proxies: Vec<Proxy>,
}

fn default_true() -> bool {
    true
}

fn default_connect_timeout() -> Option<String> {
    Some("5000ms".to_string())
}

fn default_client_timeout() -> Option<String> {
    Some("50000ms".to_string())
}

fn default_server_timeout() -> Option<String> {
    Some("50000ms".to_string())
}

impl Configuration {
    pub fn new(
        name: impl Into<String>,
        filepath: impl Into<PathBuf>,
        pidfile: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let configuration = Self {
            name: name.into(),
            filepath: filepath.into(),
            pidfile: pidfile.into(),
            chroot: None,
            daemon: true,
            group: None,
            log_tag: None,
            user: None,
            default_mode: Mode::default(),
            default_connect_timeout: default_connect_timeout(),
            default_client_timeout: default_client_timeout(),
            default_server_timeout: default_server_timeout(),
            include_globals: true,
            include_defaults: true,
            reload_command: None,
            proxies: Vec::new(),
        };
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn filepath(&self) -> &Path {
        &self.filepath
    }

    pub fn pidfile(&self) -> &str {
        &self.pidfile
    }

    pub fn set_pidfile(&mut self, pidfile: impl Into<String>) -> Result<(), ValidationError> {
        let pidfile = pidfile.into();
        error::word("configuration.pidfile", &pidfile)?;
        self.pidfile = pidfile;
        Ok(())
    }

    /// Names are unique across all configurations; the catalog checks that.
    pub(crate) fn set_name(&mut self, name: String) -> Result<(), ValidationError> {
        error::token("configuration.name", &name)?;
        self.name = name;
        Ok(())
    }

    /// All proxies in insertion order.
    pub fn proxies(&self) -> &[Proxy] {
        &self.proxies
    }

    pub fn frontends(&self) -> impl Iterator<Item = &Proxy> {
        self.proxies_of(ProxyType::Frontend)
    }

    pub fn backends(&self) -> impl Iterator<Item = &Proxy> {
        self.proxies_of(ProxyType::Backend)
    }

    fn proxies_of(&self, kind: ProxyType) -> impl Iterator<Item = &Proxy> {
        self.proxies.iter().filter(move |p| p.proxy_type() == kind)
    }

    pub fn proxy(&self, name: &str) -> Option<&Proxy> {
        self.proxies.iter().find(|p| p.name() == name)
    }

    pub fn proxy_mut(&mut self, name: &str) -> Option<&mut Proxy> {
        self.proxies.iter_mut().find(|p| p.name() == name)
    }

    pub fn add_proxy(&mut self, proxy: Proxy) -> Result<(), ValidationError> {
        proxy.validate()?;
        if self.proxy(proxy.name()).is_some() {
            return Err(ValidationError::unique("proxy.name"));
        }
        self.proxies.push(proxy);
        Ok(())
    }

    pub fn remove_proxy(&mut self, name: &str) -> Option<Proxy> {
        let index = self.proxies.iter().position(|p| p.name() == name)?;
        Some(self.proxies.remove(index))
    }

    /// Rename a proxy in place, keeping its position and children.
    pub fn rename_proxy(&mut self, from: &str, to: &str) -> Result<bool, ValidationError> {
        if from != to && self.proxy(to).is_some() {
            return Err(ValidationError::unique("proxy.name"));
        }
        match self.proxy_mut(from) {
            Some(proxy) => {
                proxy.set_name(to.to_string())?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        error::token("configuration.name", &self.name)?;
        check_filepath(&self.filepath)?;
        error::word("configuration.pidfile", &self.pidfile)?;

        for (field, value) in [
            ("configuration.chroot", &self.chroot),
            ("configuration.group", &self.group),
            ("configuration.log_tag", &self.log_tag),
            ("configuration.user", &self.user),
            ("configuration.default_connect_timeout", &self.default_connect_timeout),
            ("configuration.default_client_timeout", &self.default_client_timeout),
            ("configuration.default_server_timeout", &self.default_server_timeout),
        ] {
            error::single_line(field, value.as_deref())?;
        }
        if let Some(command) = &self.reload_command {
            error::required("configuration.reload_command", command)?;
        }

        let mut names = HashSet::new();
        for proxy in &self.proxies {
            proxy.validate()?;
            if !names.insert(proxy.name()) {
                return Err(ValidationError::unique("proxy.name"));
            }
        }
        Ok(())
    }
}

fn check_filepath(filepath: &Path) -> Result<(), ValidationError> {
    if filepath.as_os_str().is_empty() {
        return Err(ValidationError::required("configuration.filepath"));
    }
    Ok(())
}
