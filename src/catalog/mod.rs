//! In-memory catalog of configurations.
//!
//! # Responsibilities
//! - Resolve decoded composite ids to entities (or `NotFound`)
//! - Enforce uniqueness that spans configurations (name, filepath)
//! - Apply create / partial update / rename / delete per entity type
//! - Expose ACL rows as named sets with replace-by-diff updates
//!
//! # Design Decisions
//! - Single writer: callers serialize access (the HTTP layer holds one mutex)
//! - Every accepted entity has passed `validate()`, including deserialized ones
//! - A proxy of the wrong kind is reported as not found (a frontend is not
//!   addressable as a backend)

pub mod acl_set;
pub mod patch;

use std::fmt;
use thiserror::Error;

use crate::keys::{ConfigurationKey, ElementKey, KeyError, ProxyKey, TargetKey};
use crate::model::acl::AclDiff;
use crate::model::error::{self, ValidationError};
use crate::model::{Backend, Configuration, Frontend, Proxy, ProxyType, Server, Target};

pub use acl_set::AclSet;
pub use patch::Patch;

/// Errors from catalog operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error(transparent)]
    Malformed(#[from] KeyError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

fn not_found(entity: &'static str, id: impl fmt::Display) -> CatalogError {
    CatalogError::NotFound {
        entity,
        id: id.to_string(),
    }
}

fn kind_name(kind: Option<ProxyType>) -> &'static str {
    match kind {
        Some(ProxyType::Frontend) => "frontend",
        Some(ProxyType::Backend) => "backend",
        None => "proxy",
    }
}

/// Ordered collection of configurations.
#[derive(Debug, Default)]
pub struct Catalog {
    configurations: Vec<Configuration>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog, validating each configuration as if it were created.
    pub fn from_configurations(
        configurations: impl IntoIterator<Item = Configuration>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for configuration in configurations {
            catalog.create_configuration(configuration)?;
        }
        Ok(catalog)
    }

    pub fn configurations(&self) -> &[Configuration] {
        &self.configurations
    }

    // --- Configurations ---

    pub fn create_configuration(
        &mut self,
        configuration: Configuration,
    ) -> Result<ConfigurationKey, CatalogError> {
        configuration.validate()?;
        if self.find(configuration.name()).is_some() {
            return Err(ValidationError::unique("configuration.name").into());
        }
        self.check_filepath(&configuration, None)?;

        let key = ConfigurationKey::of(&configuration);
        tracing::info!(configuration = %key, "Configuration created");
        self.configurations.push(configuration);
        Ok(key)
    }

    pub fn configuration(&self, key: &ConfigurationKey) -> Result<&Configuration, CatalogError> {
        self.find(&key.configuration)
            .ok_or_else(|| not_found("configuration", key))
    }

    pub fn update_configuration(
        &mut self,
        key: &ConfigurationKey,
        patch: &Patch,
    ) -> Result<&Configuration, CatalogError> {
        let updated: Configuration =
            patch::merge(self.configuration(key)?, patch, patch::CONFIGURATION_READONLY)?;
        updated.validate()?;
        self.check_filepath(&updated, Some(key.configuration.as_str()))?;

        let configuration = self.configuration_mut(key)?;
        *configuration = updated;
        tracing::info!(configuration = %key, "Configuration updated");
        Ok(&*configuration)
    }

    /// Rename a configuration; every descendant id changes with it.
    pub fn rename_configuration(
        &mut self,
        key: &ConfigurationKey,
        name: &str,
    ) -> Result<ConfigurationKey, CatalogError> {
        error::token("configuration.name", name)?;
        if name != key.configuration && self.find(name).is_some() {
            return Err(ValidationError::unique("configuration.name").into());
        }
        let configuration = self.configuration_mut(key)?;
        configuration.set_name(name.to_string())?;
        tracing::info!(from = %key, to = %name, "Configuration renamed");
        Ok(ConfigurationKey::of(configuration))
    }

    pub fn delete_configuration(
        &mut self,
        key: &ConfigurationKey,
    ) -> Result<Configuration, CatalogError> {
        let index = self
            .configurations
            .iter()
            .position(|c| c.name() == key.configuration)
            .ok_or_else(|| not_found("configuration", key))?;
        tracing::info!(configuration = %key, "Configuration deleted");
        Ok(self.configurations.remove(index))
    }

    fn find(&self, name: &str) -> Option<&Configuration> {
        self.configurations.iter().find(|c| c.name() == name)
    }

    fn configuration_mut(
        &mut self,
        key: &ConfigurationKey,
    ) -> Result<&mut Configuration, CatalogError> {
        self.configurations
            .iter_mut()
            .find(|c| c.name() == key.configuration)
            .ok_or_else(|| not_found("configuration", key))
    }

    /// Filepath must be unique among configurations other than `except`.
    fn check_filepath(
        &self,
        configuration: &Configuration,
        except: Option<&str>,
    ) -> Result<(), CatalogError> {
        let taken = self.configurations.iter().any(|c| {
            Some(c.name()) != except && c.filepath() == configuration.filepath()
        });
        if taken {
            return Err(ValidationError::unique("configuration.filepath").into());
        }
        Ok(())
    }

    // --- Proxies ---

    pub fn create_proxy(
        &mut self,
        parent: &ConfigurationKey,
        proxy: Proxy,
    ) -> Result<ProxyKey, CatalogError> {
        let configuration = self.configuration_mut(parent)?;
        let key = ProxyKey::of(configuration, &proxy);
        let kind = proxy.proxy_type();
        configuration.add_proxy(proxy)?;
        tracing::info!(proxy = %key, kind = %kind, "Proxy created");
        Ok(key)
    }

    pub fn proxy(&self, key: &ProxyKey, kind: ProxyType) -> Result<&Proxy, CatalogError> {
        self.find_proxy(key, Some(kind))
    }

    /// Every proxy of `kind` with its id, configurations in order.
    pub fn proxies(&self, kind: ProxyType) -> Vec<(ProxyKey, &Proxy)> {
        self.configurations
            .iter()
            .flat_map(|c| {
                c.proxies()
                    .iter()
                    .filter(move |p| p.proxy_type() == kind)
                    .map(move |p| (ProxyKey::of(c, p), p))
            })
            .collect()
    }

    pub fn update_proxy(
        &mut self,
        key: &ProxyKey,
        kind: ProxyType,
        patch: &Patch,
    ) -> Result<&Proxy, CatalogError> {
        let proxy = self.proxy_mut(key, Some(kind))?;
        let updated: Proxy = patch::merge(&*proxy, patch, patch::PROXY_READONLY)?;
        updated.validate()?;
        *proxy = updated;
        tracing::info!(proxy = %key, kind = %kind, "Proxy updated");
        Ok(&*proxy)
    }

    pub fn rename_proxy(
        &mut self,
        key: &ProxyKey,
        kind: ProxyType,
        name: &str,
    ) -> Result<ProxyKey, CatalogError> {
        self.find_proxy(key, Some(kind))?;
        let configuration = self.configuration_mut(&key.parent())?;
        configuration.rename_proxy(&key.proxy, name)?;
        tracing::info!(from = %key, to = %name, "Proxy renamed");
        Ok(ProxyKey {
            configuration: key.configuration.clone(),
            proxy: name.to_string(),
        })
    }

    pub fn delete_proxy(&mut self, key: &ProxyKey, kind: ProxyType) -> Result<Proxy, CatalogError> {
        self.find_proxy(key, Some(kind))?;
        let configuration = self.configuration_mut(&key.parent())?;
        let proxy = configuration
            .remove_proxy(&key.proxy)
            .ok_or_else(|| not_found(kind_name(Some(kind)), key))?;
        tracing::info!(proxy = %key, kind = %kind, "Proxy deleted");
        Ok(proxy)
    }

    fn find_proxy(&self, key: &ProxyKey, kind: Option<ProxyType>) -> Result<&Proxy, CatalogError> {
        self.find(&key.configuration)
            .and_then(|c| c.proxy(&key.proxy))
            .filter(|p| kind.map_or(true, |k| p.proxy_type() == k))
            .ok_or_else(|| not_found(kind_name(kind), key))
    }

    fn proxy_mut(
        &mut self,
        key: &ProxyKey,
        kind: Option<ProxyType>,
    ) -> Result<&mut Proxy, CatalogError> {
        self.configurations
            .iter_mut()
            .find(|c| c.name() == key.configuration)
            .and_then(|c| c.proxy_mut(&key.proxy))
            .filter(|p| kind.map_or(true, |k| p.proxy_type() == k))
            .ok_or_else(|| not_found(kind_name(kind), key))
    }

    fn backend_mut(&mut self, key: &ProxyKey) -> Result<&mut Backend, CatalogError> {
        self.proxy_mut(key, Some(ProxyType::Backend))?
            .as_backend_mut()
            .ok_or_else(|| not_found("backend", key))
    }

    fn frontend_mut(&mut self, key: &ProxyKey) -> Result<&mut Frontend, CatalogError> {
        self.proxy_mut(key, Some(ProxyType::Frontend))?
            .as_frontend_mut()
            .ok_or_else(|| not_found("frontend", key))
    }

    // --- Servers ---

    pub fn create_server(
        &mut self,
        parent: &ProxyKey,
        server: Server,
    ) -> Result<ElementKey, CatalogError> {
        let key = ElementKey {
            configuration: parent.configuration.clone(),
            proxy: parent.proxy.clone(),
            element: server.name().to_string(),
        };
        self.backend_mut(parent)?.add_server(server)?;
        tracing::info!(server = %key, "Server created");
        Ok(key)
    }

    pub fn server(&self, key: &ElementKey) -> Result<&Server, CatalogError> {
        self.find_proxy(&key.parent(), Some(ProxyType::Backend))
            .ok()
            .and_then(Proxy::as_backend)
            .and_then(|b| b.server(&key.element))
            .ok_or_else(|| not_found("server", key))
    }

    pub fn servers(&self) -> Vec<(ElementKey, &Server)> {
        let mut servers = Vec::new();
        for configuration in &self.configurations {
            for proxy in configuration.backends() {
                if let Some(backend) = proxy.as_backend() {
                    for server in backend.servers() {
                        servers.push((ElementKey::of(configuration, proxy, server.name()), server));
                    }
                }
            }
        }
        servers
    }

    pub fn update_server(&mut self, key: &ElementKey, patch: &Patch) -> Result<&Server, CatalogError> {
        let server = self
            .backend_mut(&key.parent())
            .ok()
            .and_then(|b| b.server_mut(&key.element))
            .ok_or_else(|| not_found("server", key))?;
        let updated: Server = patch::merge(&*server, patch, patch::SERVER_READONLY)?;
        updated.validate()?;
        *server = updated;
        tracing::info!(server = %key, "Server updated");
        Ok(&*server)
    }

    pub fn delete_server(&mut self, key: &ElementKey) -> Result<Server, CatalogError> {
        let server = self
            .backend_mut(&key.parent())
            .ok()
            .and_then(|b| b.remove_server(&key.element))
            .ok_or_else(|| not_found("server", key))?;
        tracing::info!(server = %key, "Server deleted");
        Ok(server)
    }

    // --- Targets ---

    pub fn create_target(
        &mut self,
        parent: &ProxyKey,
        target: Target,
    ) -> Result<TargetKey, CatalogError> {
        let key = TargetKey {
            configuration: parent.configuration.clone(),
            proxy: parent.proxy.clone(),
            rank: target.rank(),
        };
        self.frontend_mut(parent)?.add_target(target)?;
        tracing::info!(target = %key, "Target created");
        Ok(key)
    }

    pub fn target(&self, key: &TargetKey) -> Result<&Target, CatalogError> {
        self.find_proxy(&key.parent(), Some(ProxyType::Frontend))
            .ok()
            .and_then(Proxy::as_frontend)
            .and_then(|f| f.target(key.rank))
            .ok_or_else(|| not_found("target", key))
    }

    /// Every target with its id, each frontend's targets by ascending rank.
    pub fn targets(&self) -> Vec<(TargetKey, &Target)> {
        let mut targets = Vec::new();
        for configuration in &self.configurations {
            for proxy in configuration.frontends() {
                if let Some(frontend) = proxy.as_frontend() {
                    for target in frontend.targets_by_rank() {
                        targets.push((TargetKey::of(configuration, proxy, target), target));
                    }
                }
            }
        }
        targets
    }

    pub fn update_target(&mut self, key: &TargetKey, patch: &Patch) -> Result<&Target, CatalogError> {
        let target = self
            .frontend_mut(&key.parent())
            .ok()
            .and_then(|f| f.target_mut(key.rank))
            .ok_or_else(|| not_found("target", key))?;
        let updated: Target = patch::merge(&*target, patch, patch::TARGET_READONLY)?;
        updated.validate()?;
        *target = updated;
        tracing::info!(target = %key, "Target updated");
        Ok(&*target)
    }

    pub fn delete_target(&mut self, key: &TargetKey) -> Result<Target, CatalogError> {
        let target = self
            .frontend_mut(&key.parent())
            .ok()
            .and_then(|f| f.remove_target(key.rank))
            .ok_or_else(|| not_found("target", key))?;
        tracing::info!(target = %key, "Target deleted");
        Ok(target)
    }

    // --- ACL sets ---

    /// Create the set `key` with one row per expression.
    pub fn create_acls(
        &mut self,
        key: &ElementKey,
        expressions: &[String],
    ) -> Result<AclSet, CatalogError> {
        error::token("acl.name", &key.element)?;
        if expressions.is_empty() {
            return Err(ValidationError::required("acls").into());
        }
        let proxy = self.proxy_mut(&key.parent(), None)?;
        if !proxy.acl_expressions(&key.element).is_empty() {
            return Err(ValidationError::unique("acl.name").into());
        }
        proxy.reconcile_acls(&key.element, expressions)?;
        tracing::info!(acl = %key, rows = expressions.len(), "ACL set created");
        AclSet::collect(key, proxy).ok_or_else(|| not_found("acl", key))
    }

    pub fn acl_set(&self, key: &ElementKey) -> Result<AclSet, CatalogError> {
        self.find_proxy(&key.parent(), None)
            .ok()
            .and_then(|p| AclSet::collect(key, p))
            .ok_or_else(|| not_found("acl", key))
    }

    pub fn acl_sets(&self) -> Vec<AclSet> {
        let mut sets = Vec::new();
        for configuration in &self.configurations {
            for proxy in configuration.proxies() {
                for name in acl_set::names(proxy) {
                    let key = ElementKey::of(configuration, proxy, name);
                    sets.extend(AclSet::collect(&key, proxy));
                }
            }
        }
        sets
    }

    /// Reconcile the set to exactly `desired`. A set with no rows yet is
    /// filled from `desired`; an empty list removes the set.
    pub fn update_acls(
        &mut self,
        key: &ElementKey,
        desired: &[String],
    ) -> Result<AclDiff, CatalogError> {
        let proxy = self.proxy_mut(&key.parent(), None)?;
        let diff = proxy.reconcile_acls(&key.element, desired)?;
        tracing::info!(
            acl = %key,
            added = diff.added.len(),
            removed = diff.removed.len(),
            "ACL set reconciled"
        );
        Ok(diff)
    }

    pub fn delete_acls(&mut self, key: &ElementKey) -> Result<AclSet, CatalogError> {
        let proxy = self.proxy_mut(&key.parent(), None)?;
        let set = AclSet::collect(key, proxy).ok_or_else(|| not_found("acl", key))?;
        proxy.remove_acls(&key.element);
        tracing::info!(acl = %key, "ACL set deleted");
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::CompositeKey;
    use crate::model::Operator;
    use serde_json::json;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        let prod = catalog
            .create_configuration(
                Configuration::new("prod", "/etc/haproxy/prod.cfg", "/run/prod.pid").unwrap(),
            )
            .unwrap();
        let web = catalog
            .create_proxy(&prod, Proxy::backend("web").unwrap())
            .unwrap();
        catalog
            .create_proxy(&prod, Proxy::frontend("http-in", "*:80").unwrap())
            .unwrap();
        catalog
            .create_server(&web, Server::new("s1", "10.0.0.1").unwrap())
            .unwrap();
        catalog
    }

    fn patch(value: serde_json::Value) -> Patch {
        value.as_object().cloned().unwrap()
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_configuration_name_and_filepath_unique() {
        let mut catalog = catalog();
        let err = catalog
            .create_configuration(
                Configuration::new("prod", "/etc/haproxy/other.cfg", "/run/p.pid").unwrap(),
            )
            .unwrap_err();
        assert_eq!(err, ValidationError::unique("configuration.name").into());

        let err = catalog
            .create_configuration(
                Configuration::new("stage", "/etc/haproxy/prod.cfg", "/run/p.pid").unwrap(),
            )
            .unwrap_err();
        assert_eq!(err, ValidationError::unique("configuration.filepath").into());
    }

    #[test]
    fn test_update_configuration_filepath_conflict() {
        let mut catalog = catalog();
        catalog
            .create_configuration(
                Configuration::new("stage", "/etc/haproxy/stage.cfg", "/run/s.pid").unwrap(),
            )
            .unwrap();
        let stage = ConfigurationKey::decode("stage").unwrap();

        let err = catalog
            .update_configuration(&stage, &patch(json!({"filepath": "/etc/haproxy/prod.cfg"})))
            .unwrap_err();
        assert_eq!(err, ValidationError::unique("configuration.filepath").into());

        let updated = catalog
            .update_configuration(&stage, &patch(json!({"default_mode": "tcp", "user": "lb"})))
            .unwrap();
        assert_eq!(updated.user.as_deref(), Some("lb"));
    }

    #[test]
    fn test_proxy_kind_mismatch_is_not_found() {
        let catalog = catalog();
        let key = ProxyKey::decode("prod:web").unwrap();
        assert!(catalog.proxy(&key, ProxyType::Backend).is_ok());
        assert!(matches!(
            catalog.proxy(&key, ProxyType::Frontend),
            Err(CatalogError::NotFound { entity: "frontend", .. })
        ));
    }

    #[test]
    fn test_server_lookup() {
        let catalog = catalog();
        let key = ElementKey::decode("prod:web:s1").unwrap();
        assert_eq!(catalog.server(&key).unwrap().address(), "10.0.0.1");

        let missing = ElementKey::decode("prod:web:s9").unwrap();
        assert!(matches!(
            catalog.server(&missing),
            Err(CatalogError::NotFound { entity: "server", .. })
        ));
    }

    #[test]
    fn test_server_cannot_be_created_on_frontend() {
        let mut catalog = catalog();
        let frontend = ProxyKey::decode("prod:http-in").unwrap();
        assert!(matches!(
            catalog.create_server(&frontend, Server::new("s1", "10.0.0.1").unwrap()),
            Err(CatalogError::NotFound { .. })
        ));
    }

    #[test]
    fn test_update_server_keeps_name() {
        let mut catalog = catalog();
        let key = ElementKey::decode("prod:web:s1").unwrap();
        let server = catalog
            .update_server(&key, &patch(json!({"port": 8080, "address": "10.0.0.2"})))
            .unwrap();
        assert_eq!(server.address(), "10.0.0.2");
        assert_eq!(server.options.port, Some(8080));

        let err = catalog
            .update_server(&key, &patch(json!({"name": "s2"})))
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[test]
    fn test_duplicate_target_rank() {
        let mut catalog = catalog();
        let frontend = ProxyKey::decode("prod:http-in").unwrap();
        let key = catalog
            .create_target(&frontend, Target::new(1, "web", Operator::If, "is_web").unwrap())
            .unwrap();
        assert_eq!(key.encode(), "prod:http-in:1");

        let err = catalog
            .create_target(&frontend, Target::new(1, "api", Operator::If, "is_api").unwrap())
            .unwrap_err();
        assert_eq!(err, ValidationError::unique("target.rank").into());
    }

    #[test]
    fn test_proxy_update_cannot_touch_children() {
        let mut catalog = catalog();
        let key = ProxyKey::decode("prod:web").unwrap();
        let err = catalog
            .update_proxy(&key, ProxyType::Backend, &patch(json!({"servers": []})))
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));

        let proxy = catalog
            .update_proxy(&key, ProxyType::Backend, &patch(json!({"mode": "tcp"})))
            .unwrap();
        assert_eq!(proxy.as_backend().unwrap().servers().len(), 1);
    }

    #[test]
    fn test_rename_changes_descendant_ids() {
        let mut catalog = catalog();
        let prod = ConfigurationKey::decode("prod").unwrap();
        catalog.rename_configuration(&prod, "live").unwrap();

        let ids: Vec<String> = catalog.servers().iter().map(|(k, _)| k.encode()).collect();
        assert_eq!(ids, vec!["live:web:s1"]);

        let web = ProxyKey::decode("live:web").unwrap();
        catalog.rename_proxy(&web, ProxyType::Backend, "pool").unwrap();
        let ids: Vec<String> = catalog.servers().iter().map(|(k, _)| k.encode()).collect();
        assert_eq!(ids, vec!["live:pool:s1"]);
    }

    #[test]
    fn test_acl_set_lifecycle() {
        let mut catalog = catalog();
        let key = ElementKey::decode("prod:http-in:is_api").unwrap();

        let set = catalog.create_acls(&key, &strings(&["path_beg /api", "hdr(host) api"])).unwrap();
        assert_eq!(set.id, "prod:http-in:is_api");
        assert_eq!(set.acls.len(), 2);

        assert!(catalog.create_acls(&key, &strings(&["x"])).is_err());

        let diff = catalog.update_acls(&key, &strings(&["hdr(host) api", "path_beg /v2"])).unwrap();
        assert_eq!(diff.added, strings(&["path_beg /v2"]));
        assert_eq!(diff.removed, strings(&["path_beg /api"]));
        assert_eq!(
            catalog.acl_set(&key).unwrap().acls,
            strings(&["hdr(host) api", "path_beg /v2"])
        );

        catalog.delete_acls(&key).unwrap();
        assert!(matches!(
            catalog.acl_set(&key),
            Err(CatalogError::NotFound { entity: "acl", .. })
        ));
    }

    #[test]
    fn test_update_acls_fills_missing_set() {
        let mut catalog = catalog();
        let key = ElementKey::decode("prod:http-in:is_static").unwrap();

        let diff = catalog.update_acls(&key, &strings(&["path_beg /static"])).unwrap();
        assert_eq!(diff.added, strings(&["path_beg /static"]));
        assert!(diff.removed.is_empty());
        assert_eq!(catalog.acl_set(&key).unwrap().acls, strings(&["path_beg /static"]));

        let missing_proxy = ElementKey::decode("prod:nope:is_static").unwrap();
        assert!(matches!(
            catalog.update_acls(&missing_proxy, &strings(&["x"])),
            Err(CatalogError::NotFound { .. })
        ));
    }

    #[test]
    fn test_delete_cascades() {
        let mut catalog = catalog();
        let web = ProxyKey::decode("prod:web").unwrap();
        catalog.delete_proxy(&web, ProxyType::Backend).unwrap();
        assert!(catalog.servers().is_empty());

        let prod = ConfigurationKey::decode("prod").unwrap();
        catalog.delete_configuration(&prod).unwrap();
        assert!(catalog.configurations().is_empty());
        assert!(catalog.delete_configuration(&prod).is_err());
    }
}
