use actix_web::{get, post, put, web, HttpRequest, HttpResponse, ResponseError};
use mongodb::bson::oid::ObjectId;

use super::{actor, today};
use crate::{
    database::{Env, Record},
    models::{
        accident_investigation::{
            AccidentInvestigation, AccidentInvestigationRequest, InvestigationAction,
        },
        action_item::ActionItemRequest,
        user::Actor,
    },
};

#[get("/accident-investigations")]
pub async fn get_accident_investigations(env: web::Data<Env>, req: HttpRequest) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };

    match AccidentInvestigation::find_by_company(env.store(), &actor.company_id).await {
        Ok(investigations) => HttpResponse::Ok().json(investigations),
        Err(error) => error.error_response(),
    }
}
#[get("/accident-investigations/{investigation_id}")]
pub async fn get_accident_investigation(
    env: web::Data<Env>,
    investigation_id: web::Path<String>,
    req: HttpRequest,
) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };
    let investigation_id: ObjectId = match investigation_id.parse() {
        Ok(investigation_id) => investigation_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    match AccidentInvestigation::get(env.store(), &investigation_id).await {
        Ok(investigation) if investigation.company_id == actor.company_id => {
            HttpResponse::Ok().json(investigation)
        }
        Ok(_) => HttpResponse::NotFound().body("ACCIDENT_INVESTIGATION_NOT_FOUND".to_string()),
        Err(error) => error.error_response(),
    }
}
#[post("/accident-investigations")]
pub async fn create_accident_investigation(
    env: web::Data<Env>,
    payload: web::Json<AccidentInvestigationRequest>,
    req: HttpRequest,
) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };

    match AccidentInvestigation::create(&env, &actor, payload.into_inner(), today()).await {
        Ok(investigation) => HttpResponse::Created().json(investigation),
        Err(error) => error.error_response(),
    }
}
#[put("/accident-investigations/{investigation_id}")]
pub async fn update_accident_investigation(
    env: web::Data<Env>,
    investigation_id: web::Path<String>,
    payload: web::Json<AccidentInvestigationRequest>,
    req: HttpRequest,
) -> HttpResponse {
    if actor(&req).is_none() {
        return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string());
    }
    let investigation_id: ObjectId = match investigation_id.parse() {
        Ok(investigation_id) => investigation_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    match AccidentInvestigation::update(&env, &investigation_id, payload.into_inner()).await {
        Ok(investigation) => HttpResponse::Ok().json(investigation),
        Err(error) => error.error_response(),
    }
}
#[get("/accident-investigations/{investigation_id}/corrective-actions")]
pub async fn get_corrective_actions(
    env: web::Data<Env>,
    investigation_id: web::Path<String>,
    req: HttpRequest,
) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };
    let investigation_id: ObjectId = match investigation_id.parse() {
        Ok(investigation_id) => investigation_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    let investigation: AccidentInvestigation =
        match AccidentInvestigation::get(env.store(), &investigation_id).await {
            Ok(investigation) if investigation.company_id == actor.company_id => investigation,
            Ok(_) => {
                return HttpResponse::NotFound().body("ACCIDENT_INVESTIGATION_NOT_FOUND".to_string())
            }
            Err(error) => return error.error_response(),
        };
    match investigation.corrective_actions(env.store()).await {
        Ok(items) => HttpResponse::Ok().json(items),
        Err(error) => error.error_response(),
    }
}
#[post("/accident-investigations/{investigation_id}/corrective-actions")]
pub async fn add_corrective_action(
    env: web::Data<Env>,
    investigation_id: web::Path<String>,
    payload: web::Json<ActionItemRequest>,
    req: HttpRequest,
) -> HttpResponse {
    if actor(&req).is_none() {
        return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string());
    }
    let investigation_id: ObjectId = match investigation_id.parse() {
        Ok(investigation_id) => investigation_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    match AccidentInvestigation::add_corrective_action(&env, &investigation_id, payload.into_inner())
        .await
    {
        Ok(item) => HttpResponse::Created().json(item),
        Err(error) => error.error_response(),
    }
}
#[put("/accident-investigations/{investigation_id}/{action}")]
pub async fn run_accident_investigation_action(
    env: web::Data<Env>,
    path: web::Path<(String, InvestigationAction)>,
    req: HttpRequest,
) -> HttpResponse {
    if actor(&req).is_none() {
        return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string());
    }
    let (investigation_id, action) = path.into_inner();
    let investigation_id: ObjectId = match investigation_id.parse() {
        Ok(investigation_id) => investigation_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    match AccidentInvestigation::apply(&env, &investigation_id, action).await {
        Ok(investigation) => HttpResponse::Ok().json(investigation),
        Err(error) => error.error_response(),
    }
}
