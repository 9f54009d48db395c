//! Backend servers.

use serde::{Deserialize, Serialize};

use crate::model::error::{self, ValidationError};

/// Optional per-server tuning, rendered as trailing tokens of the `server` line.
///
/// Boolean options render as bare flags when set; everything else renders as
/// `<keyword> <value>` when present.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerOptions {
    pub addr: Option<String>,
    pub backup: bool,
    pub check: bool,
    pub cookie: Option<String>,
    pub disabled: bool,
    pub error_limit: Option<u32>,
    pub fall: Option<u32>,
    pub inter: Option<u32>,
    pub fastinter: Option<u32>,
    pub downinter: Option<u32>,
    pub maxconn: Option<u32>,
    pub maxqueue: Option<u32>,
    pub minconn: Option<u32>,
    pub observe: Option<String>,
    pub on_error: Option<String>,
    pub port: Option<u32>,
    pub redir: Option<String>,
    pub rise: Option<u32>,
    pub slowstart: Option<u32>,
    pub track: Option<String>,
    pub weight: Option<u32>,
}

/// A `server <name> <address> [options]` line of a backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Server {
    name: String,
    address: String,
    #[serde(flatten)]
    pub options: ServerOptions,
}

impl Server {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let server = Self {
            name: name.into(),
            address: address.into(),
            options: ServerOptions::default(),
        };
        server.validate()?;
        Ok(server)
    }

    pub fn with_options(mut self, options: ServerOptions) -> Result<Self, ValidationError> {
        self.options = options;
        self.validate()?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn set_address(&mut self, address: impl Into<String>) -> Result<(), ValidationError> {
        let address = address.into();
        error::word("server.address", &address)?;
        self.address = address;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        error::token("server.name", &self.name)?;
        error::word("server.address", &self.address)?;

        let o = &self.options;
        for (field, value) in [
            ("server.addr", &o.addr),
            ("server.cookie", &o.cookie),
            ("server.observe", &o.observe),
            ("server.on_error", &o.on_error),
            ("server.redir", &o.redir),
            ("server.track", &o.track),
        ] {
            error::single_line(field, value.as_deref())?;
        }
        Ok(())
    }
}
