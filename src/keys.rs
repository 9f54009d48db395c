//! Composite identifiers.
//!
//! Flat CRUD callers address nested entities with colon-delimited ids built
//! from ancestor names:
//!
//! ```text
//! configuration            prod
//! proxy                    prod:web
//! acl / server             prod:web:is_api
//! target                   prod:web:3
//! ```
//!
//! Decoding only yields coordinates; resolving them against a catalog is a
//! separate step. Ids are always encoded from current entity state, so a
//! rename of any ancestor is reflected immediately.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::{Configuration, Proxy, Target};

/// Segment separator.
pub const DELIMITER: char = ':';

/// A composite id did not decode to the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("malformed {entity} id {id:?}: expected {expected} segments, found {found}")]
    Arity {
        entity: &'static str,
        id: String,
        expected: usize,
        found: usize,
    },

    #[error("malformed {entity} id {id:?}: empty segment")]
    EmptySegment { entity: &'static str, id: String },

    #[error("malformed target id {id:?}: {segment:?} is not a positive integer rank")]
    Rank { id: String, segment: String },
}

/// Shared decode/encode contract of every id shape.
pub trait CompositeKey: Sized + fmt::Display {
    /// Entity name used in error messages.
    const ENTITY: &'static str;
    /// Number of segments.
    const ARITY: usize;

    /// Build the key from exactly `ARITY` non-empty segments.
    fn from_segments(id: &str, segments: &[&str]) -> Result<Self, KeyError>;

    /// Split `id` and check its arity before handing off to `from_segments`.
    fn decode(id: &str) -> Result<Self, KeyError> {
        let segments: Vec<&str> = id.split(DELIMITER).collect();
        if segments.len() != Self::ARITY {
            return Err(KeyError::Arity {
                entity: Self::ENTITY,
                id: id.to_string(),
                expected: Self::ARITY,
                found: segments.len(),
            });
        }
        if segments.iter().any(|s| s.is_empty()) {
            return Err(KeyError::EmptySegment {
                entity: Self::ENTITY,
                id: id.to_string(),
            });
        }
        Self::from_segments(id, &segments)
    }

    fn encode(&self) -> String {
        self.to_string()
    }
}

/// `configuration`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigurationKey {
    pub configuration: String,
}

/// `configuration:proxy`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyKey {
    pub configuration: String,
    pub proxy: String,
}

/// `configuration:proxy:element`, shared by ACL sets and servers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementKey {
    pub configuration: String,
    pub proxy: String,
    pub element: String,
}

/// `configuration:proxy:rank`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetKey {
    pub configuration: String,
    pub proxy: String,
    pub rank: u32,
}

impl ConfigurationKey {
    pub fn of(configuration: &Configuration) -> Self {
        Self {
            configuration: configuration.name().to_string(),
        }
    }
}

impl ProxyKey {
    pub fn of(configuration: &Configuration, proxy: &Proxy) -> Self {
        Self {
            configuration: configuration.name().to_string(),
            proxy: proxy.name().to_string(),
        }
    }

    pub fn parent(&self) -> ConfigurationKey {
        ConfigurationKey {
            configuration: self.configuration.clone(),
        }
    }
}

impl ElementKey {
    pub fn of(configuration: &Configuration, proxy: &Proxy, element: &str) -> Self {
        Self {
            configuration: configuration.name().to_string(),
            proxy: proxy.name().to_string(),
            element: element.to_string(),
        }
    }

    pub fn parent(&self) -> ProxyKey {
        ProxyKey {
            configuration: self.configuration.clone(),
            proxy: self.proxy.clone(),
        }
    }
}

impl TargetKey {
    pub fn of(configuration: &Configuration, proxy: &Proxy, target: &Target) -> Self {
        Self {
            configuration: configuration.name().to_string(),
            proxy: proxy.name().to_string(),
            rank: target.rank(),
        }
    }

    pub fn parent(&self) -> ProxyKey {
        ProxyKey {
            configuration: self.configuration.clone(),
            proxy: self.proxy.clone(),
        }
    }
}

impl CompositeKey for ConfigurationKey {
    const ENTITY: &'static str = "configuration";
    const ARITY: usize = 1;

    fn from_segments(_id: &str, segments: &[&str]) -> Result<Self, KeyError> {
        Ok(Self {
            configuration: segments[0].to_string(),
        })
    }
}

impl CompositeKey for ProxyKey {
    const ENTITY: &'static str = "proxy";
    const ARITY: usize = 2;

    fn from_segments(_id: &str, segments: &[&str]) -> Result<Self, KeyError> {
        Ok(Self {
            configuration: segments[0].to_string(),
            proxy: segments[1].to_string(),
        })
    }
}

impl CompositeKey for ElementKey {
    const ENTITY: &'static str = "element";
    const ARITY: usize = 3;

    fn from_segments(_id: &str, segments: &[&str]) -> Result<Self, KeyError> {
        Ok(Self {
            configuration: segments[0].to_string(),
            proxy: segments[1].to_string(),
            element: segments[2].to_string(),
        })
    }
}

impl CompositeKey for TargetKey {
    const ENTITY: &'static str = "target";
    const ARITY: usize = 3;

    fn from_segments(id: &str, segments: &[&str]) -> Result<Self, KeyError> {
        let rank = parse_rank(segments[2]).ok_or_else(|| KeyError::Rank {
            id: id.to_string(),
            segment: segments[2].to_string(),
        })?;
        Ok(Self {
            configuration: segments[0].to_string(),
            proxy: segments[1].to_string(),
            rank,
        })
    }
}

/// Only canonical decimal (no sign, no leading zero) so that encoding is the exact inverse.
fn parse_rank(segment: &str) -> Option<u32> {
    if !segment.bytes().all(|b| b.is_ascii_digit()) || segment.starts_with('0') {
        return None;
    }
    segment.parse().ok()
}

impl fmt::Display for ConfigurationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.configuration)
    }
}

impl fmt::Display for ProxyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.configuration, DELIMITER, self.proxy)
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{d}{}{d}{}",
            self.configuration,
            self.proxy,
            self.element,
            d = DELIMITER
        )
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{d}{}{d}{}",
            self.configuration,
            self.proxy,
            self.rank,
            d = DELIMITER
        )
    }
}

macro_rules! from_str_via_decode {
    ($($key:ty),*) => {
        $(
            impl FromStr for $key {
                type Err = KeyError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    <$key as CompositeKey>::decode(s)
                }
            }
        )*
    };
}

from_str_via_decode!(ConfigurationKey, ProxyKey, ElementKey, TargetKey);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Operator, Server};

    fn tree() -> (Configuration, Proxy, Proxy) {
        let config = Configuration::new("prod", "/etc/haproxy.cfg", "/run/haproxy.pid").unwrap();
        let frontend = Proxy::frontend("http-in", "*:80").unwrap();
        let backend = Proxy::backend("web").unwrap();
        (config, frontend, backend)
    }

    #[test]
    fn test_encode_examples() {
        let (config, frontend, backend) = tree();
        let server = Server::new("s1", "10.0.0.1").unwrap();
        let target = Target::new(3, "web", Operator::If, "is_web").unwrap();

        assert_eq!(ConfigurationKey::of(&config).encode(), "prod");
        assert_eq!(ProxyKey::of(&config, &backend).encode(), "prod:web");
        assert_eq!(
            ElementKey::of(&config, &backend, server.name()).encode(),
            "prod:web:s1"
        );
        assert_eq!(
            TargetKey::of(&config, &frontend, &target).encode(),
            "prod:http-in:3"
        );
    }

    #[test]
    fn test_decode_is_inverse_of_encode() {
        let (config, frontend, backend) = tree();
        let target = Target::new(12, "web", Operator::Unless, "is_static").unwrap();

        let key = ProxyKey::of(&config, &backend);
        assert_eq!(ProxyKey::decode(&key.encode()), Ok(key));

        let key = ElementKey::of(&config, &backend, "is_api");
        assert_eq!(key.encode().parse::<ElementKey>(), Ok(key));

        let key = TargetKey::of(&config, &frontend, &target);
        assert_eq!(TargetKey::decode(&key.encode()), Ok(key));
    }

    #[test]
    fn test_encode_follows_rename() {
        let (mut config, _, backend) = tree();
        config.add_proxy(backend).unwrap();
        config.rename_proxy("web", "www").unwrap();

        let proxy = config.proxy("www").unwrap();
        assert_eq!(ProxyKey::of(&config, proxy).encode(), "prod:www");
    }

    #[test]
    fn test_wrong_arity_is_malformed() {
        assert_eq!(
            ElementKey::decode("prod"),
            Err(KeyError::Arity {
                entity: "element",
                id: "prod".to_string(),
                expected: 3,
                found: 1,
            })
        );
        assert!(matches!(
            ProxyKey::decode("prod:web:s1"),
            Err(KeyError::Arity { found: 3, .. })
        ));
        assert!(matches!(
            ConfigurationKey::decode("a:b"),
            Err(KeyError::Arity { .. })
        ));
    }

    #[test]
    fn test_empty_segment_is_malformed() {
        assert!(matches!(
            ProxyKey::decode("prod:"),
            Err(KeyError::EmptySegment { .. })
        ));
        assert!(matches!(
            ConfigurationKey::decode(""),
            Err(KeyError::EmptySegment { .. })
        ));
    }

    #[test]
    fn test_target_rank_must_be_positive_integer() {
        for bad in ["prod:web:0", "prod:web:-1", "prod:web:x", "prod:web:+3", "prod:web:03"] {
            assert!(
                matches!(TargetKey::decode(bad), Err(KeyError::Rank { .. })),
                "{bad} should be rejected"
            );
        }
        assert_eq!(TargetKey::decode("prod:web:3").unwrap().rank, 3);
    }
}
