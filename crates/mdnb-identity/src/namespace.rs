//! Namespaced name-based UUIDs
//!
//! Identifiers are version-5 UUIDs. The namespace is itself derived by
//! hashing the URL namespace constant with a caller namespace string and
//! then with the host machine id, so two machines (or two namespaces)
//! never produce the same ids for the same content.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace string used when the caller does not supply one
pub const DEFAULT_NAMESPACE: &str = "runme.dev";

/// Machine id used when the host does not supply one
pub const ANONYMOUS_MACHINE: &str = "anonymous";

/// Salted namespace for identity derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityNamespace(Uuid);

impl IdentityNamespace {
    /// Derive namespace from a machine id and a namespace string
    #[must_use]
    pub fn new(machine_id: &str, namespace: &str) -> Self {
        Self(namespaced_machine_id(namespace, machine_id))
    }

    /// Wrap an already-derived namespace uuid
    #[inline]
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Underlying uuid
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Name-based id within this namespace
    #[inline]
    #[must_use]
    pub fn derive(&self, name: &str) -> Uuid {
        Uuid::new_v5(&self.0, name.as_bytes())
    }
}

impl Default for IdentityNamespace {
    fn default() -> Self {
        Self::new(ANONYMOUS_MACHINE, DEFAULT_NAMESPACE)
    }
}

/// Machine id hashed into a caller namespace
///
/// `v5(v5(URL, namespace), machine_id)`
#[must_use]
pub fn namespaced_machine_id(namespace: &str, machine_id: &str) -> Uuid {
    let ns = Uuid::new_v5(&Uuid::NAMESPACE_URL, namespace.as_bytes());
    Uuid::new_v5(&ns, machine_id.as_bytes())
}

/// Stable, machine-salted hash of a document URI
///
/// `v5(v5(URL, machine_id), uri)`
#[must_use]
pub fn document_uri_hash(machine_id: &str, uri: &str) -> Uuid {
    let ns = Uuid::new_v5(&Uuid::NAMESPACE_URL, machine_id.as_bytes());
    Uuid::new_v5(&ns, uri.as_bytes())
}
