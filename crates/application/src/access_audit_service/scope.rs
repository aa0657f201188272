/// Which governing entities a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityScope<K> {
    /// Every entity known to the store.
    All,
    /// Only the listed entities; unknown keys are a `NotFound` error.
    Only(Vec<K>),
}

impl<K: PartialEq> EntityScope<K> {
    /// Returns whether the scope covers an entity key.
    #[must_use]
    pub fn includes(&self, key: &K) -> bool {
        match self {
            Self::All => true,
            Self::Only(keys) => keys.contains(key),
        }
    }
}

/// Scope of one audit run: a set of governing entities, optionally narrowed
/// to a single member identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditScope<K> {
    entities: EntityScope<K>,
    member: Option<String>,
}

impl<K: PartialEq> AuditScope<K> {
    /// Covers every entity and every member.
    #[must_use]
    pub fn all() -> Self {
        Self {
            entities: EntityScope::All,
            member: None,
        }
    }

    /// Covers the listed entities.
    #[must_use]
    pub fn only(keys: Vec<K>) -> Self {
        Self {
            entities: EntityScope::Only(keys),
            member: None,
        }
    }

    /// Covers a single entity.
    #[must_use]
    pub fn one(key: K) -> Self {
        Self::only(vec![key])
    }

    /// Covers a single (entity, member) pair.
    #[must_use]
    pub fn pair(key: K, member: impl Into<String>) -> Self {
        Self {
            entities: EntityScope::Only(vec![key]),
            member: Some(member.into()),
        }
    }

    /// Returns the covered entities.
    #[must_use]
    pub fn entities(&self) -> &EntityScope<K> {
        &self.entities
    }

    /// Returns the raw member identifier narrowing the run, if any.
    #[must_use]
    pub fn member(&self) -> Option<&str> {
        self.member.as_deref()
    }
}
