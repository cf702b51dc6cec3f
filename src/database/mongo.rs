use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument},
    Client, ClientSession, Collection, Database, IndexModel,
};

use super::{RecordStore, Sequence, SequenceGenerator, Write};
use crate::error::{Error, Result};

const SEQUENCES: &str = "sequences";

/// MongoDB-backed store. Commits run inside a session transaction, which
/// requires the server to be a replica set member.
#[derive(Clone, Debug)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

pub async fn connect(uri: &str, database: &str) -> Result<MongoStore> {
    let client: Client = Client::with_uri_str(uri).await?;
    let db: Database = client.database(database);
    db.run_command(doc! { "ping": 1 }, None).await?;
    tracing::info!(database, "connected to mongodb");
    Ok(MongoStore { client, db })
}

impl MongoStore {
    /// Creates a unique index for every `(collection, field)` pair.
    pub async fn ensure_unique_indexes(&self, fields: &[(&str, &str)]) -> Result<()> {
        for (name, field) in fields {
            let collection: Collection<Document> = self.db.collection::<Document>(name);
            let mut keys: Document = Document::new();
            keys.insert(*field, 1);
            let index: IndexModel = IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().unique(true).build())
                .build();
            collection.create_index(index, None).await?;
        }
        Ok(())
    }

    async fn apply(&self, write: Write, session: &mut ClientSession) -> Result<()> {
        match write {
            Write::Insert {
                collection,
                document,
            } => {
                self.db
                    .collection::<Document>(collection)
                    .insert_one_with_session(document, None, session)
                    .await?;
            }
            Write::Replace {
                collection,
                _id,
                version,
                document,
            } => {
                // Records written before versioning have no `version` field yet.
                let filter: Document = if version == 0 {
                    doc! { "_id": _id, "version": { "$in": [0_i64, Bson::Null] } }
                } else {
                    doc! { "_id": _id, "version": version }
                };
                let result = self
                    .db
                    .collection::<Document>(collection)
                    .replace_one_with_session(filter, document, None, session)
                    .await?;
                if result.matched_count == 0 {
                    return Err(Error::Conflict(format!(
                        "Record {_id} in {collection} was changed by another request."
                    )));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MongoStore {
    async fn find(&self, collection: &str, filter: Document) -> Result<Vec<Document>> {
        let cursor = self
            .db
            .collection::<Document>(collection)
            .find(filter, None)
            .await?;
        Ok(cursor.try_collect::<Vec<Document>>().await?)
    }

    async fn commit(&self, writes: Vec<Write>) -> Result<()> {
        let mut session: ClientSession = self.client.start_session(None).await?;
        session.start_transaction(None).await?;

        for write in writes {
            if let Err(error) = self.apply(write, &mut session).await {
                if let Err(abort) = session.abort_transaction().await {
                    tracing::error!(error = %abort, "aborting transaction failed");
                }
                return Err(error);
            }
        }

        session.commit_transaction().await?;
        Ok(())
    }
}

#[async_trait]
impl SequenceGenerator for MongoStore {
    async fn next_by_code(&self, sequence: &Sequence) -> Result<String> {
        let options: FindOneAndUpdateOptions = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        let counter: Document = self
            .db
            .collection::<Document>(SEQUENCES)
            .find_one_and_update(
                doc! { "_id": sequence.code },
                doc! { "$inc": { "value": 1_i64 } },
                options,
            )
            .await?
            .ok_or_else(|| Error::Store(format!("sequence {} unavailable", sequence.code)))?;
        let value: i64 = counter
            .get_i64("value")
            .map_err(|_| Error::Store(format!("sequence {} is corrupt", sequence.code)))?;
        Ok(sequence.format(value))
    }
}
