//! Time and identifier sources injected into the collection store.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::photo::PhotoId;

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub trait IdGenerator {
    fn next_id(&mut self) -> PhotoId;
}

/// Time-ordered UUIDv7 identifiers.
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> PhotoId {
        PhotoId::new(Uuid::now_v7().to_string())
    }
}

/// Counter plus a per-session salt, e.g. `3f2a9c1e-42`.
pub struct SequentialIds {
    salt: String,
    next: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        let salt = Uuid::new_v4().simple().to_string();
        Self::with_salt(&salt[..8])
    }

    pub fn with_salt(salt: &str) -> Self {
        Self {
            salt: salt.to_string(),
            next: 1,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> PhotoId {
        let id = PhotoId::new(format!("{}-{}", self.salt, self.next));
        self.next += 1;
        id
    }
}
