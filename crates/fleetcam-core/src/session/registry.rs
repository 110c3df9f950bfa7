// ── Per-process stream ownership ──
//
// At most one controller may own a given (serial, camera, profile) at a
// time. The registry is shared explicitly (see `Console`); nothing here
// coordinates across processes or with the device.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::CoreError;
use crate::model::StreamKey;

/// Identifies the controller holding a claim.
pub(crate) type OwnerId = u64;

#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    claims: DashMap<StreamKey, OwnerId>,
    next_owner: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn next_owner(&self) -> OwnerId {
        self.inner.next_owner.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Claim `key` for `owner`. Re-claiming one's own key is a no-op.
    pub(crate) fn claim(&self, key: &StreamKey, owner: OwnerId) -> Result<(), CoreError> {
        match self.inner.claims.entry(key.clone()) {
            Entry::Occupied(held) if *held.get() != owner => Err(CoreError::SessionBusy {
                key: key.to_string(),
            }),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(owner);
                Ok(())
            }
        }
    }

    /// Drop `owner`'s claim on `key`; claims held by others are untouched.
    pub(crate) fn release(&self, key: &StreamKey, owner: OwnerId) {
        self.inner.claims.remove_if(key, |_, held| *held == owner);
    }

    pub fn is_claimed(&self, key: &StreamKey) -> bool {
        self.inner.claims.contains_key(key)
    }

    /// Number of keys currently owned.
    pub fn len(&self) -> usize {
        self.inner.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.claims.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Camera, Profile};

    #[test]
    fn second_owner_is_refused() {
        let registry = SessionRegistry::new();
        let key = StreamKey::new("SN1", Camera::Road, Profile::High);
        let (a, b) = (registry.next_owner(), registry.next_owner());

        registry.claim(&key, a).unwrap();
        registry.claim(&key, a).unwrap();
        assert!(matches!(
            registry.claim(&key, b),
            Err(CoreError::SessionBusy { .. })
        ));

        registry.release(&key, b);
        assert!(registry.is_claimed(&key));

        registry.release(&key, a);
        assert!(registry.is_empty());
        registry.claim(&key, b).unwrap();
    }

    #[test]
    fn other_profiles_are_independent() {
        let registry = SessionRegistry::new();
        let owner = registry.next_owner();
        registry
            .claim(&StreamKey::new("SN1", Camera::Road, Profile::High), owner)
            .unwrap();
        registry
            .claim(
                &StreamKey::new("SN1", Camera::Road, Profile::Low),
                registry.next_owner(),
            )
            .unwrap();
        assert_eq!(registry.len(), 2);
    }
}
