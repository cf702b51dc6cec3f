use std::{
    fs::{copy, create_dir_all, read, remove_file, rename},
    path::{Path, PathBuf},
};

use actix_multipart::form::{tempfile::TempFile, MultipartForm};
use mime_guess::{from_path, get_mime_extensions_str};
use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::{
    accident_investigation::AccidentInvestigation, employee_safety_induction::EmployeeSafetyInduction,
    employee_suggestion::EmployeeSuggestion, incident_report::IncidentReport,
    insurance_claim::InsuranceClaim, office_inspection::OfficeInspection, user::Actor,
    vehicle_inspection::VehicleInspection, welding_machine_inspection::WeldingMachineInspection,
    RecordKind,
};
use crate::{
    database::{Attachable, Env, Record, UnitOfWork},
    error::{Error, Result},
};

pub const COLLECTION: &str = "attachments";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Attachment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    #[serde(default)]
    version: i64,
    pub name: String,
    pub mimetype: String,
    pub extension: String,
    pub size: u64,
    pub company_id: ObjectId,
    pub uploaded_by: ObjectId,
    pub uploaded_at: DateTime,
}
#[derive(Debug, MultipartForm)]
pub struct AttachmentMultipartRequest {
    #[multipart(rename = "file")]
    pub file: TempFile,
}

impl Record for Attachment {
    const COLLECTION: &'static str = COLLECTION;
    const NAME: &'static str = "ATTACHMENT";

    fn id(&self) -> Option<ObjectId> {
        self._id
    }
    fn version_mut(&mut self) -> &mut i64 {
        &mut self.version
    }
}

impl Attachment {
    pub fn path(&self, files_dir: &Path) -> Option<PathBuf> {
        let _id: ObjectId = self._id?;
        Some(
            files_dir
                .join("attachments")
                .join(format!("{}.{}", _id, self.extension)),
        )
    }

    pub fn read(&self, files_dir: &Path) -> Result<Vec<u8>> {
        let path: PathBuf = self.path(files_dir).ok_or(Error::NotFound(Self::NAME))?;
        Ok(read(path)?)
    }

    /// Moves an uploaded file under `files_dir` and records it. The MIME type
    /// comes from the upload when given, otherwise from the file name.
    pub async fn store(
        env: &Env,
        files_dir: &Path,
        actor: &Actor,
        source: &Path,
        name: Option<String>,
        content_type: Option<String>,
        size: u64,
    ) -> Result<Attachment> {
        let name: String = name.unwrap_or_else(|| String::from("attachment"));
        let mimetype: String =
            content_type.unwrap_or_else(|| from_path(&name).first_or_octet_stream().to_string());
        let extension: String = match Path::new(&name).extension().and_then(|ext| ext.to_str()) {
            Some(ext) => ext.to_lowercase(),
            None => get_mime_extensions_str(&mimetype)
                .and_then(|extensions| extensions.first())
                .map(|ext| ext.to_string())
                .unwrap_or_else(|| String::from("bin")),
        };

        let attachment: Attachment = Attachment {
            _id: Some(ObjectId::new()),
            version: 0,
            name,
            mimetype,
            extension,
            size,
            company_id: actor.company_id,
            uploaded_by: actor.user_id,
            uploaded_at: DateTime::now(),
        };
        let target: PathBuf = attachment.path(files_dir).ok_or(Error::NotFound(Self::NAME))?;
        if let Some(dir) = target.parent() {
            create_dir_all(dir)?;
        }
        if rename(source, &target).is_err() {
            copy(source, &target)?;
        }

        let mut uow: UnitOfWork = UnitOfWork::new();
        uow.insert(&attachment)?;
        if let Err(error) = uow.commit(env.store()).await {
            let _ = remove_file(&target);
            return Err(error);
        }

        tracing::info!(attachment = ?attachment._id, name = %attachment.name, size, "attachment stored");
        Ok(attachment)
    }
}

async fn link<R: Attachable>(
    env: &Env,
    company_id: &ObjectId,
    record_id: &ObjectId,
    attachment_id: &ObjectId,
) -> Result<Vec<ObjectId>> {
    let mut record: R = R::get(env.store(), record_id).await?;
    if record.company_id() != *company_id {
        return Err(Error::NotFound(R::NAME));
    }
    let attachment_ids: &mut Vec<ObjectId> = record.attachment_ids_mut();
    if !attachment_ids.contains(attachment_id) {
        attachment_ids.push(*attachment_id);
    }
    let linked: Vec<ObjectId> = attachment_ids.clone();

    let mut uow: UnitOfWork = UnitOfWork::new();
    uow.update(&mut record)?;
    uow.commit(env.store()).await?;
    Ok(linked)
}

/// Adds an existing attachment to a record's attachment list. Returns the
/// record's attachment ids afterwards. Both the attachment and the record must
/// belong to `company_id`; anything else is reported as not found.
pub async fn attach(
    env: &Env,
    company_id: &ObjectId,
    kind: RecordKind,
    record_id: &ObjectId,
    attachment_id: &ObjectId,
) -> Result<Vec<ObjectId>> {
    let attachment: Attachment = Attachment::get(env.store(), attachment_id).await?;
    if attachment.company_id != *company_id {
        return Err(Error::NotFound(Attachment::NAME));
    }
    match kind {
        RecordKind::IncidentReport => link::<IncidentReport>(env, company_id, record_id, attachment_id).await,
        RecordKind::AccidentInvestigation => {
            link::<AccidentInvestigation>(env, company_id, record_id, attachment_id).await
        }
        RecordKind::OfficeInspection => link::<OfficeInspection>(env, company_id, record_id, attachment_id).await,
        RecordKind::VehicleInspection => link::<VehicleInspection>(env, company_id, record_id, attachment_id).await,
        RecordKind::WeldingMachineInspection => {
            link::<WeldingMachineInspection>(env, company_id, record_id, attachment_id).await
        }
        RecordKind::EmployeeSuggestion => {
            link::<EmployeeSuggestion>(env, company_id, record_id, attachment_id).await
        }
        RecordKind::InsuranceClaim => link::<InsuranceClaim>(env, company_id, record_id, attachment_id).await,
        RecordKind::EmployeeSafetyInduction => {
            link::<EmployeeSafetyInduction>(env, company_id, record_id, attachment_id).await
        }
        RecordKind::FireExtinguisher => Err(Error::guard(
            "Fire extinguishers do not take attachments.",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::employee_safety_induction::{
        EmployeeSafetyInductionRequest, InductionAction, InductionStatus,
    };
    use chrono::NaiveDate;
    use std::{env::temp_dir, fs::write};

    fn actor() -> Actor {
        Actor {
            user_id: ObjectId::new(),
            company_id: ObjectId::new(),
        }
    }

    fn upload(dir: &Path, contents: &[u8]) -> PathBuf {
        create_dir_all(dir).unwrap();
        let path = dir.join(format!("upload-{}", ObjectId::new()));
        write(&path, contents).unwrap();
        path
    }

    #[actix_web::test]
    async fn stored_files_can_be_read_back() {
        let env = Env::memory();
        let files_dir = temp_dir().join(format!("attachments-{}", ObjectId::new()));
        let source = upload(&files_dir, b"%PDF-1.4 induction form");

        let attachment = Attachment::store(
            &env,
            &files_dir,
            &actor(),
            &source,
            Some("Induction Form.PDF".to_string()),
            None,
            23,
        )
        .await
        .unwrap();

        assert_eq!(attachment.extension, "pdf");
        assert_eq!(attachment.mimetype, "application/pdf");
        assert_eq!(attachment.read(&files_dir).unwrap(), b"%PDF-1.4 induction form");
        assert!(!source.exists());
    }

    #[actix_web::test]
    async fn attached_documents_unblock_induction_completion() {
        let env = Env::memory();
        let actor = actor();
        let files_dir = temp_dir().join(format!("attachments-{}", ObjectId::new()));
        let source = upload(&files_dir, b"signed");
        let attachment = Attachment::store(&env, &files_dir, &actor, &source, Some("signed.txt".to_string()), None, 6)
            .await
            .unwrap();
        let induction = EmployeeSafetyInduction::create(
            &env,
            &actor,
            EmployeeSafetyInductionRequest {
                employee_id: Some(ObjectId::new()),
                ..Default::default()
            },
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        )
        .await
        .unwrap();
        let _id = induction._id.unwrap();
        let attachment_id = attachment._id.unwrap();

        for _ in 0..2 {
            let linked = attach(&env, &actor.company_id, RecordKind::EmployeeSafetyInduction, &_id, &attachment_id)
                .await
                .unwrap();
            assert_eq!(linked, vec![attachment_id]);
        }
        let completed = EmployeeSafetyInduction::apply(&env, &_id, InductionAction::Complete)
            .await
            .unwrap();
        assert_eq!(completed.status(), InductionStatus::Completed);
    }

    #[actix_web::test]
    async fn unknown_attachments_are_not_linked() {
        let env = Env::memory();
        let result = attach(
            &env,
            &ObjectId::new(),
            RecordKind::InsuranceClaim,
            &ObjectId::new(),
            &ObjectId::new(),
        )
        .await;
        assert!(matches!(result, Err(Error::NotFound("ATTACHMENT"))));
    }

    #[actix_web::test]
    async fn attachments_stay_within_their_company() {
        let env = Env::memory();
        let owner = actor();
        let outsider = actor();
        let files_dir = temp_dir().join(format!("attachments-{}", ObjectId::new()));
        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let request = || EmployeeSafetyInductionRequest {
            employee_id: Some(ObjectId::new()),
            ..Default::default()
        };

        let source = upload(&files_dir, b"owner");
        let owned = Attachment::store(&env, &files_dir, &owner, &source, Some("owner.txt".to_string()), None, 5)
            .await
            .unwrap();
        let source = upload(&files_dir, b"outsider");
        let foreign = Attachment::store(&env, &files_dir, &outsider, &source, Some("outsider.txt".to_string()), None, 8)
            .await
            .unwrap();
        let induction = EmployeeSafetyInduction::create(&env, &owner, request(), today)
            .await
            .unwrap();
        let foreign_induction = EmployeeSafetyInduction::create(&env, &outsider, request(), today)
            .await
            .unwrap();
        let _id = induction._id.unwrap();

        let result = attach(
            &env,
            &owner.company_id,
            RecordKind::EmployeeSafetyInduction,
            &_id,
            &foreign._id.unwrap(),
        )
        .await;
        assert!(matches!(result, Err(Error::NotFound("ATTACHMENT"))));

        let result = attach(
            &env,
            &owner.company_id,
            RecordKind::EmployeeSafetyInduction,
            &foreign_induction._id.unwrap(),
            &owned._id.unwrap(),
        )
        .await;
        assert!(matches!(result, Err(Error::NotFound(name)) if name == EmployeeSafetyInduction::NAME));

        let stored = EmployeeSafetyInduction::get(env.store(), &_id).await.unwrap();
        let untouched = EmployeeSafetyInduction::get(env.store(), &foreign_induction._id.unwrap())
            .await
            .unwrap();
        assert!(stored.attachment_ids.is_empty());
        assert!(untouched.attachment_ids.is_empty());
    }
}
