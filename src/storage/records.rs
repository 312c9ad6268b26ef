//! In-memory record store
//!
//! Records are grouped by owner; within an owner they are keyed by label and
//! kept in insertion order. The serialized form is a plain JSON object
//! `owner → label → record`, so the order survives a save/load cycle.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::EncryptedRecord;

/// One owner's records in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerRecords {
    entries: Vec<(String, EncryptedRecord)>,
}

impl OwnerRecords {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, label: &str) -> Option<usize> {
        self.entries.iter().position(|(l, _)| l == label)
    }

    /// Insert or overwrite; an overwrite keeps the label's position
    pub fn insert(&mut self, label: String, record: EncryptedRecord) -> Option<EncryptedRecord> {
        match self.position(&label) {
            Some(idx) => Some(std::mem::replace(&mut self.entries[idx].1, record)),
            None => {
                self.entries.push((label, record));
                None
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<&EncryptedRecord> {
        self.position(label).map(|idx| &self.entries[idx].1)
    }

    pub fn remove(&mut self, label: &str) -> Option<EncryptedRecord> {
        self.position(label).map(|idx| self.entries.remove(idx).1)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.position(label).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EncryptedRecord)> {
        self.entries.iter().map(|(l, r)| (l.as_str(), r))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for OwnerRecords {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, record) in &self.entries {
            map.serialize_entry(label, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for OwnerRecords {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OwnerRecordsVisitor;

        impl<'de> Visitor<'de> for OwnerRecordsVisitor {
            type Value = OwnerRecords;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of record labels to records")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut records = OwnerRecords::new();
                while let Some((label, record)) =
                    access.next_entry::<String, EncryptedRecord>()?
                {
                    records.insert(label, record);
                }
                Ok(records)
            }
        }

        deserializer.deserialize_map(OwnerRecordsVisitor)
    }
}

/// All records, keyed by owner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordStore {
    owners: BTreeMap<String, OwnerRecords>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a record; returns the record it replaced
    pub fn put(
        &mut self,
        owner: &str,
        label: impl Into<String>,
        record: EncryptedRecord,
    ) -> Option<EncryptedRecord> {
        self.owners
            .entry(owner.to_string())
            .or_default()
            .insert(label.into(), record)
    }

    pub fn get(&self, owner: &str, label: &str) -> Option<&EncryptedRecord> {
        self.owners.get(owner).and_then(|records| records.get(label))
    }

    /// Remove a record if present
    pub fn delete(&mut self, owner: &str, label: &str) -> Option<EncryptedRecord> {
        self.owners
            .get_mut(owner)
            .and_then(|records| records.remove(label))
    }

    /// An owner's records in insertion order; unknown owners have none
    pub fn list_by_owner(&self, owner: &str) -> Vec<(&str, &EncryptedRecord)> {
        self.owners
            .get(owner)
            .map(|records| records.iter().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, owner: &str, label: &str) -> bool {
        self.get(owner, label).is_some()
    }

    /// Copy of one owner's collection, for undoing a failed mutation
    pub fn owner_snapshot(&self, owner: &str) -> Option<OwnerRecords> {
        self.owners.get(owner).cloned()
    }

    /// Put back a collection taken with [`RecordStore::owner_snapshot`]
    pub fn restore_owner(&mut self, owner: &str, snapshot: Option<OwnerRecords>) {
        match snapshot {
            Some(records) => {
                self.owners.insert(owner.to_string(), records);
            }
            None => {
                self.owners.remove(owner);
            }
        }
    }

    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.owners.keys().map(String::as_str)
    }

    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    pub fn record_count(&self) -> usize {
        self.owners.values().map(OwnerRecords::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordKind;

    fn record(token: &str) -> EncryptedRecord {
        EncryptedRecord::text(token.to_string(), "hash".to_string())
    }

    #[test]
    fn test_put_get_delete() {
        let mut store = RecordStore::new();
        assert!(store.put("admin", "note1", record("a")).is_none());

        assert_eq!(store.get("admin", "note1").unwrap().ciphertext, "a");
        assert!(store.get("user1", "note1").is_none());

        assert!(store.delete("admin", "note1").is_some());
        assert!(store.delete("admin", "note1").is_none());
        assert!(store.delete("ghost", "note1").is_none());
    }

    #[test]
    fn test_insertion_order_and_overwrite_position() {
        let mut store = RecordStore::new();
        store.put("admin", "zeta", record("1"));
        store.put("admin", "alpha", record("2"));
        store.put("admin", "mid", record("3"));

        let previous = store.put("admin", "zeta", record("4"));
        assert_eq!(previous.unwrap().ciphertext, "1");

        let labels: Vec<_> = store
            .list_by_owner("admin")
            .into_iter()
            .map(|(l, r)| (l, r.ciphertext.as_str()))
            .collect();
        assert_eq!(labels, vec![("zeta", "4"), ("alpha", "2"), ("mid", "3")]);
    }

    #[test]
    fn test_owner_isolation() {
        let mut store = RecordStore::new();
        store.put("admin", "note1", record("a"));

        assert!(store.list_by_owner("user1").is_empty());
        assert_eq!(store.list_by_owner("admin").len(), 1);
        assert_eq!(store.owner_count(), 1);
    }

    #[test]
    fn test_serde_preserves_order() {
        let mut store = RecordStore::new();
        store.put("admin", "zeta", record("1"));
        store.put("admin", "alpha", record("2"));

        let json = serde_json::to_string_pretty(&store).unwrap();
        assert!(json.find("zeta").unwrap() < json.find("alpha").unwrap());

        let loaded: RecordStore = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, store);
        let labels: Vec<_> = loaded.list_by_owner("admin").into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_parse_stored_document() {
        let json = r#"{
          "user1": {
            "photo": {
              "encrypted_text": "AAAA",
              "passkey": "ff",
              "timestamp": "2024-03-19 10:15:00",
              "type": "file",
              "file_info": {"filename": "a.png", "type": "image/png", "size": 3}
            },
            "memo": {
              "encrypted_text": "BBBB",
              "passkey": "ee",
              "timestamp": "2024-03-19 10:16:00",
              "type": "text"
            }
          }
        }"#;

        let store: RecordStore = serde_json::from_str(json).unwrap();
        assert_eq!(store.record_count(), 2);
        let listed = store.list_by_owner("user1");
        assert_eq!(listed[0].0, "photo");
        assert_eq!(listed[0].1.kind, RecordKind::File);
        assert_eq!(listed[1].1.kind, RecordKind::Text);
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(serde_json::from_str::<RecordStore>("[1, 2]").is_err());
        assert!(serde_json::from_str::<RecordStore>(r#"{"admin": []}"#).is_err());
    }

    #[test]
    fn test_snapshot_restore() {
        let mut store = RecordStore::new();
        store.put("admin", "a", record("1"));
        store.put("admin", "b", record("2"));

        let snapshot = store.owner_snapshot("admin");
        store.delete("admin", "a");
        store.restore_owner("admin", snapshot);

        let labels: Vec<_> = store.list_by_owner("admin").into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["a", "b"]);

        let none = store.owner_snapshot("user1");
        store.put("user1", "x", record("3"));
        store.restore_owner("user1", none);
        assert!(store.list_by_owner("user1").is_empty());
    }
}
