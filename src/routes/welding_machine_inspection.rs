use actix_web::{get, post, put, web, HttpRequest, HttpResponse, ResponseError};
use mongodb::bson::oid::ObjectId;

use super::{actor, today};
use crate::{
    database::{Env, Record},
    models::{
        inspection::InspectionAction,
        user::Actor,
        welding_machine_inspection::{WeldingMachineInspection, WeldingMachineInspectionRequest},
    },
};

#[get("/welding-machine-inspections")]
pub async fn get_welding_machine_inspections(env: web::Data<Env>, req: HttpRequest) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };

    match WeldingMachineInspection::find_by_company(env.store(), &actor.company_id).await {
        Ok(inspections) => HttpResponse::Ok().json(inspections),
        Err(error) => error.error_response(),
    }
}
#[get("/welding-machine-inspections/{inspection_id}")]
pub async fn get_welding_machine_inspection(
    env: web::Data<Env>,
    inspection_id: web::Path<String>,
    req: HttpRequest,
) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };
    let inspection_id: ObjectId = match inspection_id.parse() {
        Ok(inspection_id) => inspection_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    match WeldingMachineInspection::get(env.store(), &inspection_id).await {
        Ok(inspection) if inspection.company_id == actor.company_id => {
            HttpResponse::Ok().json(inspection)
        }
        Ok(_) => HttpResponse::NotFound().body("WELDING_MACHINE_INSPECTION_NOT_FOUND".to_string()),
        Err(error) => error.error_response(),
    }
}
#[post("/welding-machine-inspections")]
pub async fn create_welding_machine_inspection(
    env: web::Data<Env>,
    payload: web::Json<WeldingMachineInspectionRequest>,
    req: HttpRequest,
) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };

    match WeldingMachineInspection::create(&env, &actor, payload.into_inner(), today()).await {
        Ok(inspection) => HttpResponse::Created().json(inspection),
        Err(error) => error.error_response(),
    }
}
#[put("/welding-machine-inspections/{inspection_id}")]
pub async fn update_welding_machine_inspection(
    env: web::Data<Env>,
    inspection_id: web::Path<String>,
    payload: web::Json<WeldingMachineInspectionRequest>,
    req: HttpRequest,
) -> HttpResponse {
    if actor(&req).is_none() {
        return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string());
    }
    let inspection_id: ObjectId = match inspection_id.parse() {
        Ok(inspection_id) => inspection_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    match WeldingMachineInspection::update(&env, &inspection_id, payload.into_inner()).await {
        Ok(inspection) => HttpResponse::Ok().json(inspection),
        Err(error) => error.error_response(),
    }
}
#[put("/welding-machine-inspections/{inspection_id}/{action}")]
pub async fn run_welding_machine_inspection_action(
    env: web::Data<Env>,
    path: web::Path<(String, InspectionAction)>,
    req: HttpRequest,
) -> HttpResponse {
    if actor(&req).is_none() {
        return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string());
    }
    let (inspection_id, action) = path.into_inner();
    let inspection_id: ObjectId = match inspection_id.parse() {
        Ok(inspection_id) => inspection_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    match WeldingMachineInspection::apply(&env, &inspection_id, action).await {
        Ok(inspection) => HttpResponse::Ok().json(inspection),
        Err(error) => error.error_response(),
    }
}
