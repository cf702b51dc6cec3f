use actix_web::{get, post, put, web, HttpRequest, HttpResponse, ResponseError};
use mongodb::bson::oid::ObjectId;
use serde_json::json;

use super::{actor, today};
use crate::{
    database::{Env, Record},
    models::{
        fire_extinguisher::{
            FireExtinguisher, FireExtinguisherAction, FireExtinguisherMaintenance,
            FireExtinguisherRequest, MaintenanceRequest,
        },
        user::Actor,
    },
};

#[get("/fire-extinguishers")]
pub async fn get_fire_extinguishers(env: web::Data<Env>, req: HttpRequest) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };

    match FireExtinguisher::find_by_company(env.store(), &actor.company_id).await {
        Ok(extinguishers) => HttpResponse::Ok().json(extinguishers),
        Err(error) => error.error_response(),
    }
}
#[get("/fire-extinguishers/{extinguisher_id}")]
pub async fn get_fire_extinguisher(
    env: web::Data<Env>,
    extinguisher_id: web::Path<String>,
    req: HttpRequest,
) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };
    let extinguisher_id: ObjectId = match extinguisher_id.parse() {
        Ok(extinguisher_id) => extinguisher_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    match FireExtinguisher::get(env.store(), &extinguisher_id).await {
        Ok(extinguisher) if extinguisher.company_id == actor.company_id => {
            HttpResponse::Ok().json(extinguisher)
        }
        Ok(_) => HttpResponse::NotFound().body("FIRE_EXTINGUISHER_NOT_FOUND".to_string()),
        Err(error) => error.error_response(),
    }
}
#[post("/fire-extinguishers")]
pub async fn create_fire_extinguisher(
    env: web::Data<Env>,
    payload: web::Json<FireExtinguisherRequest>,
    req: HttpRequest,
) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };

    match FireExtinguisher::create(&env, &actor, payload.into_inner()).await {
        Ok(extinguisher) => HttpResponse::Created().json(extinguisher),
        Err(error) => error.error_response(),
    }
}
#[put("/fire-extinguishers/{extinguisher_id}")]
pub async fn update_fire_extinguisher(
    env: web::Data<Env>,
    extinguisher_id: web::Path<String>,
    payload: web::Json<FireExtinguisherRequest>,
    req: HttpRequest,
) -> HttpResponse {
    if actor(&req).is_none() {
        return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string());
    }
    let extinguisher_id: ObjectId = match extinguisher_id.parse() {
        Ok(extinguisher_id) => extinguisher_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    match FireExtinguisher::update(&env, &extinguisher_id, payload.into_inner()).await {
        Ok(extinguisher) => HttpResponse::Ok().json(extinguisher),
        Err(error) => error.error_response(),
    }
}
#[get("/fire-extinguishers/{extinguisher_id}/maintenance")]
pub async fn get_maintenance_history(
    env: web::Data<Env>,
    extinguisher_id: web::Path<String>,
    req: HttpRequest,
) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };
    let extinguisher_id: ObjectId = match extinguisher_id.parse() {
        Ok(extinguisher_id) => extinguisher_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    match FireExtinguisher::get(env.store(), &extinguisher_id).await {
        Ok(extinguisher) if extinguisher.company_id == actor.company_id => (),
        Ok(_) => return HttpResponse::NotFound().body("FIRE_EXTINGUISHER_NOT_FOUND".to_string()),
        Err(error) => return error.error_response(),
    }
    match FireExtinguisherMaintenance::find_by_extinguisher(env.store(), &extinguisher_id).await {
        Ok(history) => HttpResponse::Ok().json(history),
        Err(error) => error.error_response(),
    }
}
#[post("/fire-extinguishers/{extinguisher_id}/maintenance")]
pub async fn create_maintenance(
    env: web::Data<Env>,
    extinguisher_id: web::Path<String>,
    payload: web::Json<MaintenanceRequest>,
    req: HttpRequest,
) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };
    let extinguisher_id: ObjectId = match extinguisher_id.parse() {
        Ok(extinguisher_id) => extinguisher_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    match FireExtinguisherMaintenance::create(
        &env,
        &actor,
        &extinguisher_id,
        payload.into_inner(),
        today(),
    )
    .await
    {
        Ok((maintenance, extinguisher)) => HttpResponse::Created().json(json!({
            "maintenance": maintenance,
            "extinguisher": extinguisher,
        })),
        Err(error) => error.error_response(),
    }
}
#[put("/fire-extinguishers/{extinguisher_id}/{action}")]
pub async fn run_fire_extinguisher_action(
    env: web::Data<Env>,
    path: web::Path<(String, FireExtinguisherAction)>,
    req: HttpRequest,
) -> HttpResponse {
    if actor(&req).is_none() {
        return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string());
    }
    let (extinguisher_id, action) = path.into_inner();
    let extinguisher_id: ObjectId = match extinguisher_id.parse() {
        Ok(extinguisher_id) => extinguisher_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    match FireExtinguisher::apply(&env, &extinguisher_id, action).await {
        Ok(extinguisher) => HttpResponse::Ok().json(extinguisher),
        Err(error) => error.error_response(),
    }
}
