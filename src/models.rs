use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

/// Tunnel status as reported by the control plane.
///
/// Unknown values are carried verbatim so comparison stays exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EndpointStatus {
    Online,
    Offline,
    Other(String),
}

impl EndpointStatus {
    pub fn as_str(&self) -> &str {
        match self {
            EndpointStatus::Online => "online",
            EndpointStatus::Offline => "offline",
            EndpointStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for EndpointStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "online" => EndpointStatus::Online,
            "offline" => EndpointStatus::Offline,
            _ => EndpointStatus::Other(raw),
        }
    }
}

impl From<&str> for EndpointStatus {
    fn from(raw: &str) -> Self {
        EndpointStatus::from(raw.to_string())
    }
}

impl fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One element of the `proxies` array as it comes off the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEndpoint {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub last_start: Option<String>,
    #[serde(default)]
    pub last_close: Option<String>,
}

/// Body of `GET /api/proxy/tcp`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusPayload {
    #[serde(default)]
    pub proxies: Option<Vec<RawEndpoint>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndpointRecord {
    pub name: String,
    pub status: EndpointStatus,
    pub last_start: String,
    pub last_close: String,
}

impl EndpointRecord {
    pub fn new(name: impl Into<String>, status: impl Into<EndpointStatus>) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
            last_start: String::new(),
            last_close: String::new(),
        }
    }

    fn from_raw(raw: RawEndpoint) -> Option<Self> {
        let name = raw.name.filter(|n| !n.is_empty())?;
        Some(Self {
            name,
            status: raw.status.unwrap_or_default().into(),
            last_start: raw.last_start.unwrap_or_default(),
            last_close: raw.last_close.unwrap_or_default(),
        })
    }
}

/// Every endpoint seen in one fetch, keyed by name, in fetch order.
///
/// A repeated name replaces the earlier record but keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    records: Vec<EndpointRecord>,
    index: HashMap<String, usize>,
}

impl Snapshot {
    pub fn build(raw: impl IntoIterator<Item = RawEndpoint>) -> Self {
        raw.into_iter()
            .filter_map(|item| {
                let record = EndpointRecord::from_raw(item);
                if record.is_none() {
                    warn!("Skipping proxy entry without a name");
                }
                record
            })
            .collect()
    }

    pub fn from_payload(payload: StatusPayload) -> Self {
        Self::build(payload.proxies.unwrap_or_default())
    }

    fn insert(&mut self, record: EndpointRecord) {
        match self.index.get(&record.name) {
            Some(&pos) => self.records[pos] = record,
            None => {
                self.index.insert(record.name.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&EndpointRecord> {
        self.index.get(name).map(|&pos| &self.records[pos])
    }

    pub fn status_of(&self, name: &str) -> Option<&EndpointStatus> {
        self.get(name).map(|r| &r.status)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EndpointRecord> {
        self.records.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.name.as_str())
    }
}

impl FromIterator<EndpointRecord> for Snapshot {
    fn from_iter<I: IntoIterator<Item = EndpointRecord>>(iter: I) -> Self {
        let mut snapshot = Snapshot::default();
        for record in iter {
            snapshot.insert(record);
        }
        snapshot
    }
}

/// One endpoint whose status differs from the previous snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEntry {
    pub name: String,
    /// `None` only for newly appeared endpoints.
    pub previous_status: Option<EndpointStatus>,
    pub current_status: EndpointStatus,
    pub is_new: bool,
    pub last_start: String,
    pub last_close: String,
    pub observed_at: DateTime<Utc>,
}

/// Result of one diff, ordered like the current snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    entries: Vec<ChangeEntry>,
}

impl ChangeSet {
    pub(crate) fn push(&mut self, entry: ChangeEntry) {
        self.entries.push(entry);
    }

    pub fn get(&self, name: &str) -> Option<&ChangeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChangeEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a ChangeEntry;
    type IntoIter = std::slice::Iter<'a, ChangeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
