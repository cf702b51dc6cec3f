use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::{doc, from_document, oid::ObjectId, to_document, Document};
use regex::Regex;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// A single write inside a [`UnitOfWork`].
#[derive(Debug, Clone)]
pub enum Write {
    Insert {
        collection: &'static str,
        document: Document,
    },
    /// Only applies while the stored record still carries `version`.
    Replace {
        collection: &'static str,
        _id: ObjectId,
        version: i64,
        document: Document,
    },
}

/// Typed record persistence. `find` takes top-level equality filters only;
/// `commit` applies every write or none of them.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find(&self, collection: &str, filter: Document) -> Result<Vec<Document>>;
    async fn commit(&self, writes: Vec<Write>) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sequence {
    pub code: &'static str,
    pub prefix: &'static str,
    pub padding: usize,
}

impl Sequence {
    pub const fn new(code: &'static str, prefix: &'static str) -> Self {
        Self {
            code,
            prefix,
            padding: 5,
        }
    }
    pub fn format(&self, value: i64) -> String {
        format!("{}{:0width$}", self.prefix, value, width = self.padding)
    }
}

#[async_trait]
pub trait SequenceGenerator: Send + Sync {
    async fn next_by_code(&self, sequence: &Sequence) -> Result<String>;
}

#[async_trait]
pub trait Record: Serialize + DeserializeOwned + Send + Sync + Sized {
    const COLLECTION: &'static str;
    /// Used in `NotFound` errors, e.g. `INCIDENT_REPORT_NOT_FOUND`.
    const NAME: &'static str;
    const SEQUENCE: Option<Sequence> = None;

    fn id(&self) -> Option<ObjectId>;
    /// Bumped by every update so that a write based on a stale read is refused.
    fn version_mut(&mut self) -> &mut i64;

    /// Standing constraints, checked on every write.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    async fn find_many(store: &dyn RecordStore, filter: Document) -> Result<Vec<Self>> {
        let documents: Vec<Document> = store.find(Self::COLLECTION, filter).await?;
        let mut records: Vec<Self> = Vec::with_capacity(documents.len());
        for document in documents {
            records.push(from_document::<Self>(document)?);
        }
        Ok(records)
    }
    async fn find_by_id(store: &dyn RecordStore, _id: &ObjectId) -> Result<Option<Self>> {
        let mut records: Vec<Self> = Self::find_many(store, doc! { "_id": _id }).await?;
        Ok(records.pop())
    }
    async fn get(store: &dyn RecordStore, _id: &ObjectId) -> Result<Self> {
        Self::find_by_id(store, _id)
            .await?
            .ok_or(Error::NotFound(Self::NAME))
    }
}

/// Records carrying a many-to-many attachment list.
pub trait Attachable: Record {
    /// Owner of the record. Only attachments of the same company can be linked.
    fn company_id(&self) -> ObjectId;
    fn attachment_ids_mut(&mut self) -> &mut Vec<ObjectId>;
}

/// Collects the writes of one action so they reach the store together.
#[derive(Debug, Default)]
pub struct UnitOfWork {
    writes: Vec<Write>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert<R: Record>(&mut self, record: &R) -> Result<()> {
        record.validate()?;
        if record.id().is_none() {
            return Err(Error::Store(format!("{} has no id", R::NAME)));
        }
        self.writes.push(Write::Insert {
            collection: R::COLLECTION,
            document: to_document(record)?,
        });
        Ok(())
    }
    pub fn update<R: Record>(&mut self, record: &mut R) -> Result<()> {
        record.validate()?;
        let _id: ObjectId = record
            .id()
            .ok_or_else(|| Error::Store(format!("{} has no id", R::NAME)))?;
        let version: i64 = *record.version_mut();
        *record.version_mut() = version + 1;
        self.writes.push(Write::Replace {
            collection: R::COLLECTION,
            _id,
            version,
            document: to_document(record)?,
        });
        Ok(())
    }
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
    pub async fn commit(self, store: &dyn RecordStore) -> Result<()> {
        if self.writes.is_empty() {
            return Ok(());
        }
        tracing::debug!(writes = self.writes.len(), "committing unit of work");
        store.commit(self.writes).await
    }
}

/// The collaborators every action runs against.
#[derive(Clone)]
pub struct Env {
    pub store: Arc<dyn RecordStore>,
    pub sequence: Arc<dyn SequenceGenerator>,
    /// Default currency of new claims.
    pub currency: String,
}

impl Env {
    pub fn mongo(store: MongoStore, currency: String) -> Self {
        let store: Arc<MongoStore> = Arc::new(store);
        Self {
            store: store.clone(),
            sequence: store,
            currency,
        }
    }
    pub fn in_memory(currency: String) -> Self {
        let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
        Self {
            store: store.clone(),
            sequence: store,
            currency,
        }
    }
    #[cfg(test)]
    pub fn memory() -> Self {
        Self::in_memory(String::from("USD"))
    }
    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }
}

/// Resolves the human-readable reference of a new record: a caller-supplied one
/// when present, otherwise the next value of the record's sequence.
pub async fn assign_reference<R: Record>(env: &Env, requested: Option<String>) -> Result<String> {
    let sequence: Sequence = R::SEQUENCE
        .ok_or_else(|| Error::Store(format!("{} has no sequence", R::NAME)))?;

    let reference: String = match requested {
        Some(reference) => {
            let reference: String = reference.trim().to_string();
            let pattern: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9/_.\-]{0,63}$")
                .map_err(|error| Error::Store(error.to_string()))?;
            if !pattern.is_match(&reference) {
                return Err(Error::guard(format!(
                    "Reference \"{reference}\" is not a valid reference."
                )));
            }
            reference
        }
        None => env.sequence.next_by_code(&sequence).await?,
    };

    if !R::find_many(env.store(), doc! { "reference": &reference })
        .await?
        .is_empty()
    {
        return Err(Error::guard(format!(
            "Reference {reference} is already used by another record."
        )));
    }
    Ok(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize)]
    struct Sample {
        _id: Option<ObjectId>,
        #[serde(default)]
        version: i64,
        reference: String,
        value: i32,
    }

    impl Record for Sample {
        const COLLECTION: &'static str = "samples";
        const NAME: &'static str = "SAMPLE";
        const SEQUENCE: Option<Sequence> = Some(Sequence::new("sample", "SMP"));

        fn id(&self) -> Option<ObjectId> {
            self._id
        }
        fn version_mut(&mut self) -> &mut i64 {
            &mut self.version
        }
        fn validate(&self) -> Result<()> {
            if self.value < 0 {
                return Err(Error::guard("Value must not be negative."));
            }
            Ok(())
        }
    }

    #[test]
    fn formats_sequence_values_with_padding() {
        let sequence = Sequence::new("sample", "SMP");
        assert_eq!(sequence.format(7), "SMP00007");
        assert_eq!(sequence.format(123456), "SMP123456");
    }

    #[test]
    fn unit_of_work_runs_standing_constraints() {
        let mut uow = UnitOfWork::new();
        let sample = Sample {
            _id: Some(ObjectId::new()),
            version: 0,
            reference: "SMP00001".to_string(),
            value: -1,
        };
        assert!(uow.insert(&sample).unwrap_err().is_guard_violation());
        assert!(uow.is_empty());
    }

    #[actix_web::test]
    async fn generated_references_are_distinct_and_ordered() {
        let env = Env::memory();
        let mut references: Vec<String> = Vec::new();
        for value in 0..12 {
            let reference = assign_reference::<Sample>(&env, None).await.unwrap();
            let mut uow = UnitOfWork::new();
            uow.insert(&Sample {
                _id: Some(ObjectId::new()),
                version: 0,
                reference: reference.clone(),
                value,
            })
            .unwrap();
            uow.commit(env.store()).await.unwrap();
            references.push(reference);
        }
        let mut sorted = references.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted, references);
        assert_eq!(references[0], "SMP00001");
    }

    #[actix_web::test]
    async fn supplied_references_must_be_unique_and_well_formed() {
        let env = Env::memory();
        let mut uow = UnitOfWork::new();
        uow.insert(&Sample {
            _id: Some(ObjectId::new()),
            version: 0,
            reference: "CUSTOM-1".to_string(),
            value: 1,
        })
        .unwrap();
        uow.commit(env.store()).await.unwrap();

        let duplicate = assign_reference::<Sample>(&env, Some("CUSTOM-1".to_string())).await;
        assert!(duplicate.unwrap_err().is_guard_violation());

        let malformed = assign_reference::<Sample>(&env, Some("bad ref!".to_string())).await;
        assert!(malformed.unwrap_err().is_guard_violation());

        let fresh = assign_reference::<Sample>(&env, Some("CUSTOM-2".to_string())).await;
        assert_eq!(fresh.unwrap(), "CUSTOM-2");
    }

    #[actix_web::test]
    async fn updates_from_a_stale_read_are_refused() {
        let env = Env::memory();
        let _id = ObjectId::new();
        let mut uow = UnitOfWork::new();
        uow.insert(&Sample {
            _id: Some(_id),
            version: 0,
            reference: "SMP00001".to_string(),
            value: 1,
        })
        .unwrap();
        uow.commit(env.store()).await.unwrap();

        let mut first = Sample::get(env.store(), &_id).await.unwrap();
        let mut second = Sample::get(env.store(), &_id).await.unwrap();

        first.value = 2;
        let mut uow = UnitOfWork::new();
        uow.update(&mut first).unwrap();
        uow.commit(env.store()).await.unwrap();
        assert_eq!(first.version, 1);

        second.value = 3;
        let mut uow = UnitOfWork::new();
        uow.update(&mut second).unwrap();
        let stale = uow.commit(env.store()).await;
        assert!(matches!(stale, Err(Error::Conflict(_))));

        let stored = Sample::get(env.store(), &_id).await.unwrap();
        assert_eq!(stored.value, 2);
        assert_eq!(stored.version, 1);
    }
}
