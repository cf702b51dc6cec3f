use actix_web::{get, post, put, web, HttpRequest, HttpResponse, ResponseError};
use mongodb::bson::oid::ObjectId;

use super::{actor, today};
use crate::{
    database::{Env, Record},
    models::{
        insurance_claim::{InsuranceClaim, InsuranceClaimAction, InsuranceClaimRequest},
        insurance_type::{InsuranceType, InsuranceTypeRequest},
        user::Actor,
    },
};

#[get("/insurance-types")]
pub async fn get_insurance_types(env: web::Data<Env>, req: HttpRequest) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };

    match InsuranceType::find_active(env.store(), &actor.company_id).await {
        Ok(types) => HttpResponse::Ok().json(types),
        Err(error) => error.error_response(),
    }
}
#[post("/insurance-types")]
pub async fn create_insurance_type(
    env: web::Data<Env>,
    payload: web::Json<InsuranceTypeRequest>,
    req: HttpRequest,
) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };

    match InsuranceType::create(&env, &actor, payload.into_inner()).await {
        Ok(insurance_type) => HttpResponse::Created().json(insurance_type),
        Err(error) => error.error_response(),
    }
}

#[get("/insurance-claims")]
pub async fn get_insurance_claims(env: web::Data<Env>, req: HttpRequest) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };

    match InsuranceClaim::find_by_company(env.store(), &actor.company_id).await {
        Ok(claims) => HttpResponse::Ok().json(claims),
        Err(error) => error.error_response(),
    }
}
#[get("/insurance-claims/{claim_id}")]
pub async fn get_insurance_claim(
    env: web::Data<Env>,
    claim_id: web::Path<String>,
    req: HttpRequest,
) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };
    let claim_id: ObjectId = match claim_id.parse() {
        Ok(claim_id) => claim_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    match InsuranceClaim::get(env.store(), &claim_id).await {
        Ok(claim) if claim.company_id == actor.company_id => HttpResponse::Ok().json(claim),
        Ok(_) => HttpResponse::NotFound().body("INSURANCE_CLAIM_NOT_FOUND".to_string()),
        Err(error) => error.error_response(),
    }
}
#[post("/insurance-claims")]
pub async fn create_insurance_claim(
    env: web::Data<Env>,
    payload: web::Json<InsuranceClaimRequest>,
    req: HttpRequest,
) -> HttpResponse {
    if actor(&req).is_none() {
        return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string());
    }

    match InsuranceClaim::create(&env, payload.into_inner(), today()).await {
        Ok(claim) => HttpResponse::Created().json(claim),
        Err(error) => error.error_response(),
    }
}
#[put("/insurance-claims/{claim_id}")]
pub async fn update_insurance_claim(
    env: web::Data<Env>,
    claim_id: web::Path<String>,
    payload: web::Json<InsuranceClaimRequest>,
    req: HttpRequest,
) -> HttpResponse {
    if actor(&req).is_none() {
        return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string());
    }
    let claim_id: ObjectId = match claim_id.parse() {
        Ok(claim_id) => claim_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    match InsuranceClaim::update(&env, &claim_id, payload.into_inner()).await {
        Ok(claim) => HttpResponse::Ok().json(claim),
        Err(error) => error.error_response(),
    }
}
#[put("/insurance-claims/{claim_id}/{action}")]
pub async fn run_insurance_claim_action(
    env: web::Data<Env>,
    path: web::Path<(String, InsuranceClaimAction)>,
    req: HttpRequest,
) -> HttpResponse {
    if actor(&req).is_none() {
        return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string());
    }
    let (claim_id, action) = path.into_inner();
    let claim_id: ObjectId = match claim_id.parse() {
        Ok(claim_id) => claim_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    match InsuranceClaim::apply(&env, &claim_id, action).await {
        Ok(claim) => HttpResponse::Ok().json(claim),
        Err(error) => error.error_response(),
    }
}
