use actix_multipart::form::MultipartForm;
use actix_web::{get, post, put, web, HttpMessage, HttpRequest, HttpResponse, ResponseError};
use chrono::{Local, NaiveDate};
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;

use crate::{
    config::Config,
    database::{Env, Record},
    models::{
        attachment::{self, Attachment, AttachmentMultipartRequest},
        report,
        user::{Actor, UserAuthentication},
        RecordKind,
    },
};

pub mod accident_investigation;
pub mod action_item;
pub mod employee_safety_induction;
pub mod employee_suggestion;
pub mod fire_extinguisher;
pub mod incident_report;
pub mod insurance_claim;
pub mod office_inspection;
pub mod vehicle_inspection;
pub mod welding_machine_inspection;

#[derive(Deserialize)]
pub struct ReportQueryParams {
    pub ids: String,
}

pub fn actor(req: &HttpRequest) -> Option<Actor> {
    req.extensions()
        .get::<UserAuthentication>()
        .map(|actor| **actor)
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(upload_attachment)
        .service(get_attachment)
        .service(link_attachment)
        .service(get_report)
        .service(incident_report::get_incident_reports)
        .service(incident_report::get_incident_report)
        .service(incident_report::create_incident_report)
        .service(incident_report::update_incident_report)
        .service(incident_report::create_insurance_claim)
        .service(incident_report::run_incident_report_action)
        .service(accident_investigation::get_accident_investigations)
        .service(accident_investigation::get_accident_investigation)
        .service(accident_investigation::create_accident_investigation)
        .service(accident_investigation::update_accident_investigation)
        .service(accident_investigation::get_corrective_actions)
        .service(accident_investigation::add_corrective_action)
        .service(accident_investigation::run_accident_investigation_action)
        .service(action_item::run_action_item_action)
        .service(fire_extinguisher::get_fire_extinguishers)
        .service(fire_extinguisher::get_fire_extinguisher)
        .service(fire_extinguisher::create_fire_extinguisher)
        .service(fire_extinguisher::update_fire_extinguisher)
        .service(fire_extinguisher::get_maintenance_history)
        .service(fire_extinguisher::create_maintenance)
        .service(fire_extinguisher::run_fire_extinguisher_action)
        .service(office_inspection::get_office_inspections)
        .service(office_inspection::get_office_inspection)
        .service(office_inspection::create_office_inspection)
        .service(office_inspection::update_office_inspection)
        .service(office_inspection::add_corrective_action)
        .service(office_inspection::run_office_inspection_action)
        .service(vehicle_inspection::get_vehicle_inspections)
        .service(vehicle_inspection::get_vehicle_inspection)
        .service(vehicle_inspection::create_vehicle_inspection)
        .service(vehicle_inspection::update_vehicle_inspection)
        .service(vehicle_inspection::get_maintenance_items)
        .service(vehicle_inspection::add_maintenance_item)
        .service(vehicle_inspection::run_vehicle_inspection_action)
        .service(welding_machine_inspection::get_welding_machine_inspections)
        .service(welding_machine_inspection::get_welding_machine_inspection)
        .service(welding_machine_inspection::create_welding_machine_inspection)
        .service(welding_machine_inspection::update_welding_machine_inspection)
        .service(welding_machine_inspection::run_welding_machine_inspection_action)
        .service(employee_suggestion::get_employee_suggestions)
        .service(employee_suggestion::get_employee_suggestion)
        .service(employee_suggestion::create_employee_suggestion)
        .service(employee_suggestion::update_employee_suggestion)
        .service(employee_suggestion::get_implementation_plan)
        .service(employee_suggestion::add_plan_step)
        .service(employee_suggestion::run_employee_suggestion_action)
        .service(insurance_claim::get_insurance_types)
        .service(insurance_claim::create_insurance_type)
        .service(insurance_claim::get_insurance_claims)
        .service(insurance_claim::get_insurance_claim)
        .service(insurance_claim::create_insurance_claim)
        .service(insurance_claim::update_insurance_claim)
        .service(insurance_claim::run_insurance_claim_action)
        .service(employee_safety_induction::get_employee_safety_inductions)
        .service(employee_safety_induction::get_employee_safety_induction)
        .service(employee_safety_induction::create_employee_safety_induction)
        .service(employee_safety_induction::update_employee_safety_induction)
        .service(employee_safety_induction::run_employee_safety_induction_action);
}

#[post("/attachments")]
pub async fn upload_attachment(
    env: web::Data<Env>,
    config: web::Data<Config>,
    form: MultipartForm<AttachmentMultipartRequest>,
    req: HttpRequest,
) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };

    let file = &form.file;
    match Attachment::store(
        &env,
        &config.files_dir,
        &actor,
        file.file.path(),
        file.file_name.clone(),
        file.content_type.as_ref().map(|mime| mime.to_string()),
        file.size as u64,
    )
    .await
    {
        Ok(attachment) => HttpResponse::Created().json(attachment),
        Err(error) => error.error_response(),
    }
}
#[get("/attachments/{attachment_id}")]
pub async fn get_attachment(
    env: web::Data<Env>,
    config: web::Data<Config>,
    attachment_id: web::Path<String>,
    req: HttpRequest,
) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };
    let attachment_id: ObjectId = match attachment_id.parse() {
        Ok(attachment_id) => attachment_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    let attachment: Attachment = match Attachment::get(env.store(), &attachment_id).await {
        Ok(attachment) if attachment.company_id == actor.company_id => attachment,
        Ok(_) => return HttpResponse::NotFound().body("ATTACHMENT_NOT_FOUND".to_string()),
        Err(error) => return error.error_response(),
    };
    if let Ok(file) = attachment.read(&config.files_dir) {
        HttpResponse::Ok()
            .content_type(attachment.mimetype.as_str())
            .body(file)
    } else {
        HttpResponse::NotFound().body("CONTENT_NOT_FOUND")
    }
}
#[put("/records/{kind}/{record_id}/attachments/{attachment_id}")]
pub async fn link_attachment(
    env: web::Data<Env>,
    path: web::Path<(RecordKind, String, String)>,
    req: HttpRequest,
) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };
    let (kind, record_id, attachment_id) = path.into_inner();
    let (record_id, attachment_id): (ObjectId, ObjectId) =
        match (record_id.parse(), attachment_id.parse()) {
            (Ok(record_id), Ok(attachment_id)) => (record_id, attachment_id),
            _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
        };

    match attachment::attach(&env, &actor.company_id, kind, &record_id, &attachment_id).await {
        Ok(attachment_ids) => HttpResponse::Ok().json(attachment_ids),
        Err(error) => error.error_response(),
    }
}
#[get("/reports/{kind}")]
pub async fn get_report(
    env: web::Data<Env>,
    kind: web::Path<RecordKind>,
    query: web::Query<ReportQueryParams>,
    req: HttpRequest,
) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };
    let mut ids: Vec<ObjectId> = Vec::new();
    for id in query.ids.split(',').filter(|id| !id.is_empty()) {
        match id.parse() {
            Ok(id) => ids.push(id),
            _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
        }
    }

    match report::report_values(
        env.store(),
        &actor.company_id,
        kind.into_inner(),
        ids,
        serde_json::Value::Null,
    )
    .await
    {
        Ok(values) => HttpResponse::Ok().json(values),
        Err(error) => error.error_response(),
    }
}
