use actix_web::{get, post, put, web, HttpRequest, HttpResponse, ResponseError};
use mongodb::bson::oid::ObjectId;

use super::{actor, today};
use crate::{
    database::{Env, Record},
    models::{
        action_item::ActionItemRequest,
        employee_suggestion::{EmployeeSuggestion, EmployeeSuggestionRequest, SuggestionAction},
        user::Actor,
    },
};

#[get("/employee-suggestions")]
pub async fn get_employee_suggestions(env: web::Data<Env>, req: HttpRequest) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };

    match EmployeeSuggestion::find_by_company(env.store(), &actor.company_id).await {
        Ok(suggestions) => HttpResponse::Ok().json(suggestions),
        Err(error) => error.error_response(),
    }
}
#[get("/employee-suggestions/{suggestion_id}")]
pub async fn get_employee_suggestion(
    env: web::Data<Env>,
    suggestion_id: web::Path<String>,
    req: HttpRequest,
) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };
    let suggestion_id: ObjectId = match suggestion_id.parse() {
        Ok(suggestion_id) => suggestion_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    match EmployeeSuggestion::get(env.store(), &suggestion_id).await {
        Ok(suggestion) if suggestion.company_id == actor.company_id => {
            HttpResponse::Ok().json(suggestion)
        }
        Ok(_) => HttpResponse::NotFound().body("EMPLOYEE_SUGGESTION_NOT_FOUND".to_string()),
        Err(error) => error.error_response(),
    }
}
#[post("/employee-suggestions")]
pub async fn create_employee_suggestion(
    env: web::Data<Env>,
    payload: web::Json<EmployeeSuggestionRequest>,
    req: HttpRequest,
) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };

    match EmployeeSuggestion::create(&env, &actor, payload.into_inner(), today()).await {
        Ok(suggestion) => HttpResponse::Created().json(suggestion),
        Err(error) => error.error_response(),
    }
}
#[put("/employee-suggestions/{suggestion_id}")]
pub async fn update_employee_suggestion(
    env: web::Data<Env>,
    suggestion_id: web::Path<String>,
    payload: web::Json<EmployeeSuggestionRequest>,
    req: HttpRequest,
) -> HttpResponse {
    if actor(&req).is_none() {
        return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string());
    }
    let suggestion_id: ObjectId = match suggestion_id.parse() {
        Ok(suggestion_id) => suggestion_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    match EmployeeSuggestion::update(&env, &suggestion_id, payload.into_inner()).await {
        Ok(suggestion) => HttpResponse::Ok().json(suggestion),
        Err(error) => error.error_response(),
    }
}
#[get("/employee-suggestions/{suggestion_id}/implementation-plan")]
pub async fn get_implementation_plan(
    env: web::Data<Env>,
    suggestion_id: web::Path<String>,
    req: HttpRequest,
) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };
    let suggestion_id: ObjectId = match suggestion_id.parse() {
        Ok(suggestion_id) => suggestion_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    let suggestion: EmployeeSuggestion =
        match EmployeeSuggestion::get(env.store(), &suggestion_id).await {
            Ok(suggestion) if suggestion.company_id == actor.company_id => suggestion,
            Ok(_) => {
                return HttpResponse::NotFound().body("EMPLOYEE_SUGGESTION_NOT_FOUND".to_string())
            }
            Err(error) => return error.error_response(),
        };
    match suggestion.implementation_plan(env.store()).await {
        Ok(plan) => HttpResponse::Ok().json(plan),
        Err(error) => error.error_response(),
    }
}
#[post("/employee-suggestions/{suggestion_id}/implementation-plan")]
pub async fn add_plan_step(
    env: web::Data<Env>,
    suggestion_id: web::Path<String>,
    payload: web::Json<ActionItemRequest>,
    req: HttpRequest,
) -> HttpResponse {
    if actor(&req).is_none() {
        return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string());
    }
    let suggestion_id: ObjectId = match suggestion_id.parse() {
        Ok(suggestion_id) => suggestion_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    match EmployeeSuggestion::add_plan_step(&env, &suggestion_id, payload.into_inner()).await {
        Ok(step) => HttpResponse::Created().json(step),
        Err(error) => error.error_response(),
    }
}
#[put("/employee-suggestions/{suggestion_id}/{action}")]
pub async fn run_employee_suggestion_action(
    env: web::Data<Env>,
    path: web::Path<(String, SuggestionAction)>,
    req: HttpRequest,
) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };
    let (suggestion_id, action) = path.into_inner();
    let suggestion_id: ObjectId = match suggestion_id.parse() {
        Ok(suggestion_id) => suggestion_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    match EmployeeSuggestion::apply(&env, &actor, &suggestion_id, action, today()).await {
        Ok(suggestion) => HttpResponse::Ok().json(suggestion),
        Err(error) => error.error_response(),
    }
}
