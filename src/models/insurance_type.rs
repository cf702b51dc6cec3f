use mongodb::bson::{doc, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::{require_text, user::Actor};
use crate::{
    database::{Env, Record, RecordStore, UnitOfWork},
    error::{Error, Result},
};

pub const COLLECTION: &str = "insurance_types";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InsuranceType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    #[serde(default)]
    version: i64,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub coverage_details: Option<String>,
    pub company_id: ObjectId,
    pub provider_ids: Vec<ObjectId>,
    pub active: bool,
}
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct InsuranceTypeRequest {
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub coverage_details: Option<String>,
    #[serde(default)]
    pub provider_ids: Vec<ObjectId>,
    pub active: Option<bool>,
}

impl Record for InsuranceType {
    const COLLECTION: &'static str = COLLECTION;
    const NAME: &'static str = "INSURANCE_TYPE";

    fn id(&self) -> Option<ObjectId> {
        self._id
    }
    fn version_mut(&mut self) -> &mut i64 {
        &mut self.version
    }
    fn validate(&self) -> Result<()> {
        require_text(Some(self.name.as_str()), "An insurance type needs a name.")?;
        require_text(Some(self.code.as_str()), "An insurance type needs a code.")
    }
}

impl InsuranceType {
    /// Active types of the company, ordered by name.
    pub async fn find_active(store: &dyn RecordStore, company_id: &ObjectId) -> Result<Vec<InsuranceType>> {
        let mut types: Vec<InsuranceType> =
            Self::find_many(store, doc! { "company_id": company_id, "active": true }).await?;
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(types)
    }

    pub async fn create(env: &Env, actor: &Actor, request: InsuranceTypeRequest) -> Result<InsuranceType> {
        let code: String = request.code.trim().to_string();
        let taken: Vec<InsuranceType> = Self::find_many(
            env.store(),
            doc! { "company_id": actor.company_id, "code": &code },
        )
        .await?;
        if !taken.is_empty() {
            return Err(Error::guard(format!(
                "Insurance type code {code} is already in use."
            )));
        }

        let insurance_type: InsuranceType = InsuranceType {
            _id: Some(ObjectId::new()),
            version: 0,
            name: request.name,
            code,
            description: request.description,
            coverage_details: request.coverage_details,
            company_id: actor.company_id,
            provider_ids: request.provider_ids,
            active: request.active.unwrap_or(true),
        };

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.insert(&insurance_type)?;
        uow.commit(env.store()).await?;
        Ok(insurance_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn lists_active_types_by_name() {
        let env = Env::memory();
        let actor = Actor {
            user_id: ObjectId::new(),
            company_id: ObjectId::new(),
        };
        for (name, code, active) in [("Workers comp", "WC", true), ("Auto", "AU", true), ("Legacy", "LG", false)] {
            InsuranceType::create(
                &env,
                &actor,
                InsuranceTypeRequest {
                    name: name.to_string(),
                    code: code.to_string(),
                    active: Some(active),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }

        let types = InsuranceType::find_active(env.store(), &actor.company_id).await.unwrap();
        let names: Vec<&str> = types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Auto", "Workers comp"]);
    }

    #[actix_web::test]
    async fn codes_are_unique_per_company() {
        let env = Env::memory();
        let actor = Actor {
            user_id: ObjectId::new(),
            company_id: ObjectId::new(),
        };
        let request = || InsuranceTypeRequest {
            name: "Property".to_string(),
            code: "PR".to_string(),
            ..Default::default()
        };
        InsuranceType::create(&env, &actor, request()).await.unwrap();
        let duplicate = InsuranceType::create(&env, &actor, request()).await;
        assert!(duplicate.unwrap_err().is_guard_violation());
    }
}
