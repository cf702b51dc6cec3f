use std::{
    collections::{BTreeMap, HashMap},
    sync::Mutex,
};

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};

use super::{RecordStore, Sequence, SequenceGenerator, Write};
use crate::error::{Error, Result};

/// In-process record store. Commits are applied to a copy of the data and
/// swapped in only when every write succeeded.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<BTreeMap<String, Vec<Document>>>,
    sequences: Mutex<HashMap<String, i64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(key, value)| match (document.get(key), value) {
            (Some(found), expected) => found == expected,
            (None, Bson::Null) => true,
            (None, _) => false,
        })
}

fn document_id(document: &Document) -> Option<ObjectId> {
    document.get_object_id("_id").ok()
}

fn stored_version(document: &Document) -> i64 {
    match document.get("version") {
        Some(Bson::Int64(version)) => *version,
        Some(Bson::Int32(version)) => i64::from(*version),
        _ => 0,
    }
}

fn apply(collections: &mut BTreeMap<String, Vec<Document>>, write: Write) -> Result<()> {
    match write {
        Write::Insert {
            collection,
            document,
        } => {
            let records: &mut Vec<Document> = collections.entry(collection.to_string()).or_default();
            let _id: ObjectId = document_id(&document)
                .ok_or_else(|| Error::Store(format!("insert into {collection} without _id")))?;
            if records
                .iter()
                .any(|record| document_id(record) == Some(_id))
            {
                return Err(Error::Store(format!("duplicate _id {_id} in {collection}")));
            }
            records.push(document);
        }
        Write::Replace {
            collection,
            _id,
            version,
            document,
        } => {
            let record: &mut Document = collections
                .get_mut(collection)
                .and_then(|records| {
                    records
                        .iter_mut()
                        .find(|record| document_id(record) == Some(_id))
                })
                .ok_or_else(|| Error::Store(format!("no record {_id} in {collection}")))?;
            if stored_version(record) != version {
                return Err(Error::Conflict(format!(
                    "Record {_id} in {collection} was changed by another request."
                )));
            }
            *record = document;
        }
    }
    Ok(())
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find(&self, collection: &str, filter: Document) -> Result<Vec<Document>> {
        let collections = self
            .collections
            .lock()
            .map_err(|_| Error::Store("memory store poisoned".to_string()))?;
        Ok(collections
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| matches(record, &filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn commit(&self, writes: Vec<Write>) -> Result<()> {
        let mut collections = self
            .collections
            .lock()
            .map_err(|_| Error::Store("memory store poisoned".to_string()))?;
        let mut staged: BTreeMap<String, Vec<Document>> = collections.clone();
        for write in writes {
            apply(&mut staged, write)?;
        }
        *collections = staged;
        Ok(())
    }
}

#[async_trait]
impl SequenceGenerator for MemoryStore {
    async fn next_by_code(&self, sequence: &Sequence) -> Result<String> {
        let mut sequences = self
            .sequences
            .lock()
            .map_err(|_| Error::Store("memory store poisoned".to_string()))?;
        let value: &mut i64 = sequences.entry(sequence.code.to_string()).or_insert(0);
        *value += 1;
        Ok(sequence.format(*value))
    }
}
