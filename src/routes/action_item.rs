use actix_web::{put, web, HttpRequest, HttpResponse, ResponseError};
use mongodb::bson::oid::ObjectId;

use super::{actor, today};
use crate::{
    database::Env,
    models::action_item::{ActionItem, ActionItemAction},
};

#[put("/action-items/{item_id}/{action}")]
pub async fn run_action_item_action(
    env: web::Data<Env>,
    path: web::Path<(String, ActionItemAction)>,
    req: HttpRequest,
) -> HttpResponse {
    if actor(&req).is_none() {
        return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string());
    }
    let (item_id, action) = path.into_inner();
    let item_id: ObjectId = match item_id.parse() {
        Ok(item_id) => item_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    match ActionItem::apply(&env, &item_id, action, today()).await {
        Ok(item) => HttpResponse::Ok().json(item),
        Err(error) => error.error_response(),
    }
}
