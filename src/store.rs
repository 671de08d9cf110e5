use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::data_dir;
use crate::error::Result;
use crate::ticket::Ticket;

/// Read-only ticket set for one session.
#[derive(Debug, Clone, Default)]
pub struct TicketStore {
    tickets: Vec<Ticket>,
    source: Option<PathBuf>,
}

/// Shape of the loaded snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSummary {
    pub source: Option<PathBuf>,
    pub tickets: usize,
    pub first_created: Option<DateTime<Utc>>,
    pub last_created: Option<DateTime<Utc>>,
    /// Ticket count per status label, sorted by label.
    pub statuses: BTreeMap<String, usize>,
    pub regions: Vec<String>,
    pub groups: Vec<String>,
}

/// `~/.ticketdash/tickets.json`
pub fn default_snapshot_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("tickets.json"))
}

impl TicketStore {
    /// Load the default snapshot.
    pub fn load() -> Result<Self> {
        Self::load_from(default_snapshot_path()?)
    }

    /// Load a JSON array of tickets from `path`.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let mut store = Self::from_reader(std::io::BufReader::new(file))?;
        store.source = Some(path.to_path_buf());
        log::info!("loaded {} tickets from {}", store.len(), path.display());
        Ok(store)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let tickets: Vec<Ticket> = serde_json::from_reader(reader)?;
        Ok(Self::from_tickets(tickets))
    }

    /// Ticket ids are unique: a repeated id keeps its first occurrence.
    pub fn from_tickets(tickets: Vec<Ticket>) -> Self {
        let mut seen: HashSet<String> = HashSet::with_capacity(tickets.len());
        let mut kept = Vec::with_capacity(tickets.len());
        for t in tickets {
            if !seen.insert(t.ticket_id.clone()) {
                log::warn!("duplicate ticket id {}, keeping the first", t.ticket_id);
                continue;
            }
            if t.resolved.is_some_and(|r| r < t.created) {
                log::warn!("ticket {} resolved before it was created", t.ticket_id);
            }
            kept.push(t);
        }
        Self {
            tickets: kept,
            source: None,
        }
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn get(&self, ticket_id: &str) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.ticket_id == ticket_id)
    }

    pub fn summary(&self) -> StoreSummary {
        let mut statuses: BTreeMap<String, usize> = BTreeMap::new();
        for t in &self.tickets {
            *statuses.entry(t.status.as_str().to_string()).or_default() += 1;
        }
        StoreSummary {
            source: self.source.clone(),
            tickets: self.tickets.len(),
            first_created: self.tickets.iter().map(|t| t.created).min(),
            last_created: self.tickets.iter().map(|t| t.created).max(),
            statuses,
            regions: distinct(self.tickets.iter().map(|t| t.region.as_str())),
            groups: distinct(self.tickets.iter().map(|t| t.assignment_group.as_str())),
        }
    }
}

/// Sorted distinct non-empty values.
fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let set: HashSet<&str> = values.filter(|s| !s.is_empty()).collect();
    let mut v: Vec<String> = set.into_iter().map(str::to_string).collect();
    v.sort();
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::fixtures::*;
    use crate::ticket::{Priority, Status};

    const SNAPSHOT: &str = r#"[
        {"ticketId": "INC1", "title": "Mail down", "priority": "P1", "status": "Open",
         "assignmentGroup": "Messaging", "region": "EMEA", "assignee": "Alice",
         "created": "2026-10-01 09:00:00", "slaStatus": "met", "reassignmentCount": 1},
        {"ticketId": "INC2", "title": "Printer", "priority": "P4", "status": "Closed",
         "assignmentGroup": "Service Desk", "region": "APAC", "resolver": "Bob",
         "created": "2026-10-02T10:00:00Z", "resolved": "2026-10-02T14:30:00Z",
         "slaStatus": "breached"},
        {"ticketId": "INC1", "title": "Duplicate", "priority": "P2", "status": "Open",
         "created": "2026-10-03", "slaStatus": "met"}
    ]"#;

    #[test]
    fn test_from_reader_drops_duplicate_ids() {
        let store = TicketStore::from_reader(SNAPSHOT.as_bytes()).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("INC1").unwrap().title, "Mail down");
        assert_eq!(store.get("INC2").unwrap().resolution_hours(), Some(4.5));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickets.json");
        std::fs::write(&path, SNAPSHOT).unwrap();
        let store = TicketStore::load_from(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.source(), Some(path.as_path()));
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TicketStore::load_from(dir.path().join("missing.json")).is_err());

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"not": "an array"}"#).unwrap();
        assert!(TicketStore::load_from(&bad).is_err());
    }

    #[test]
    fn test_summary() {
        let store = TicketStore::from_reader(SNAPSHOT.as_bytes()).unwrap();
        let s = store.summary();
        assert_eq!(s.tickets, 2);
        assert_eq!(s.statuses.get("Open"), Some(&1));
        assert_eq!(s.statuses.get("Closed"), Some(&1));
        assert_eq!(s.regions, vec!["APAC", "EMEA"]);
        assert!(s.first_created < s.last_created);
    }

    #[test]
    fn test_from_tickets_keeps_order() {
        let store = TicketStore::from_tickets(vec![
            ticket("B", Priority::P2, Status::Open),
            ticket("A", Priority::P1, Status::Open),
        ]);
        let ids: Vec<_> = store.tickets().iter().map(|t| t.ticket_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
        assert!(TicketStore::default().is_empty());
    }
}
