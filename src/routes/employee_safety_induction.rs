use actix_web::{get, post, put, web, HttpRequest, HttpResponse, ResponseError};
use mongodb::bson::oid::ObjectId;

use super::{actor, today};
use crate::{
    database::{Env, Record},
    models::{
        employee_safety_induction::{
            EmployeeSafetyInduction, EmployeeSafetyInductionRequest, InductionAction,
        },
        user::Actor,
    },
};

#[get("/employee-safety-inductions")]
pub async fn get_employee_safety_inductions(env: web::Data<Env>, req: HttpRequest) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };

    match EmployeeSafetyInduction::find_by_company(env.store(), &actor.company_id).await {
        Ok(inductions) => HttpResponse::Ok().json(inductions),
        Err(error) => error.error_response(),
    }
}
#[get("/employee-safety-inductions/{induction_id}")]
pub async fn get_employee_safety_induction(
    env: web::Data<Env>,
    induction_id: web::Path<String>,
    req: HttpRequest,
) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };
    let induction_id: ObjectId = match induction_id.parse() {
        Ok(induction_id) => induction_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    match EmployeeSafetyInduction::get(env.store(), &induction_id).await {
        Ok(induction) if induction.company_id == actor.company_id => {
            HttpResponse::Ok().json(induction)
        }
        Ok(_) => HttpResponse::NotFound().body("EMPLOYEE_SAFETY_INDUCTION_NOT_FOUND".to_string()),
        Err(error) => error.error_response(),
    }
}
#[post("/employee-safety-inductions")]
pub async fn create_employee_safety_induction(
    env: web::Data<Env>,
    payload: web::Json<EmployeeSafetyInductionRequest>,
    req: HttpRequest,
) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };

    match EmployeeSafetyInduction::create(&env, &actor, payload.into_inner(), today()).await {
        Ok(induction) => HttpResponse::Created().json(induction),
        Err(error) => error.error_response(),
    }
}
#[put("/employee-safety-inductions/{induction_id}")]
pub async fn update_employee_safety_induction(
    env: web::Data<Env>,
    induction_id: web::Path<String>,
    payload: web::Json<EmployeeSafetyInductionRequest>,
    req: HttpRequest,
) -> HttpResponse {
    if actor(&req).is_none() {
        return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string());
    }
    let induction_id: ObjectId = match induction_id.parse() {
        Ok(induction_id) => induction_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    match EmployeeSafetyInduction::update(&env, &induction_id, payload.into_inner()).await {
        Ok(induction) => HttpResponse::Ok().json(induction),
        Err(error) => error.error_response(),
    }
}
#[put("/employee-safety-inductions/{induction_id}/{action}")]
pub async fn run_employee_safety_induction_action(
    env: web::Data<Env>,
    path: web::Path<(String, InductionAction)>,
    req: HttpRequest,
) -> HttpResponse {
    if actor(&req).is_none() {
        return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string());
    }
    let (induction_id, action) = path.into_inner();
    let induction_id: ObjectId = match induction_id.parse() {
        Ok(induction_id) => induction_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    match EmployeeSafetyInduction::apply(&env, &induction_id, action).await {
        Ok(induction) => HttpResponse::Ok().json(induction),
        Err(error) => error.error_response(),
    }
}
