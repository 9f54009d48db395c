//! ACL rows grouped by name, the unit the catalog exposes.

use serde::Serialize;

use crate::keys::ElementKey;
use crate::model::Proxy;

/// All rows of one ACL name inside one proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AclSet {
    pub id: String,
    pub name: String,
    pub acls: Vec<String>,
}

impl AclSet {
    /// `None` when the proxy has no row with that name.
    pub(crate) fn collect(key: &ElementKey, proxy: &Proxy) -> Option<Self> {
        let acls: Vec<String> = proxy
            .acl_expressions(&key.element)
            .into_iter()
            .map(str::to_string)
            .collect();
        if acls.is_empty() {
            return None;
        }
        Some(Self {
            id: key.to_string(),
            name: key.element.clone(),
            acls,
        })
    }
}

/// Distinct ACL names of a proxy in first-declared order.
pub(crate) fn names(proxy: &Proxy) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for acl in proxy.acls() {
        if !names.contains(&acl.name()) {
            names.push(acl.name());
        }
    }
    names
}
