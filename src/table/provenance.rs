use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Supplies the per-row identifiers and the build timestamp stamped onto
/// every finalized table.
pub trait ProvenanceSource {
    /// A new identifier, unique per call.
    fn row_id(&mut self) -> String;

    /// Called once per table build.
    fn now(&mut self) -> DateTime<Utc>;
}

/// Random v4 identifiers (32 hex digits) and the wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProvenance;

impl ProvenanceSource for SystemProvenance {
    fn row_id(&mut self) -> String {
        Uuid::new_v4().simple().to_string()
    }

    fn now(&mut self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Sequential identifiers and a fixed clock, for reproducible output.
#[derive(Debug, Clone)]
pub struct FixedProvenance {
    next: u128,
    at: DateTime<Utc>,
}

impl FixedProvenance {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { next: 0, at }
    }
}

impl ProvenanceSource for FixedProvenance {
    fn row_id(&mut self) -> String {
        self.next += 1;
        Uuid::from_u128(self.next).simple().to_string()
    }

    fn now(&mut self) -> DateTime<Utc> {
        self.at
    }
}
