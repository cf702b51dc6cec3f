use actix_web::{get, post, put, web, HttpRequest, HttpResponse, ResponseError};
use mongodb::bson::oid::ObjectId;

use super::{actor, today};
use crate::{
    database::{Env, Record},
    models::{
        incident_report::{IncidentReport, IncidentReportAction, IncidentReportRequest},
        insurance_claim::InsuranceClaimRequest,
        user::Actor,
    },
};

#[get("/incident-reports")]
pub async fn get_incident_reports(env: web::Data<Env>, req: HttpRequest) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };

    match IncidentReport::find_by_company(env.store(), &actor.company_id).await {
        Ok(incidents) => HttpResponse::Ok().json(incidents),
        Err(error) => error.error_response(),
    }
}
#[get("/incident-reports/{incident_id}")]
pub async fn get_incident_report(
    env: web::Data<Env>,
    incident_id: web::Path<String>,
    req: HttpRequest,
) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };
    let incident_id: ObjectId = match incident_id.parse() {
        Ok(incident_id) => incident_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    match IncidentReport::get(env.store(), &incident_id).await {
        Ok(incident) if incident.company_id == actor.company_id => HttpResponse::Ok().json(incident),
        Ok(_) => HttpResponse::NotFound().body("INCIDENT_REPORT_NOT_FOUND".to_string()),
        Err(error) => error.error_response(),
    }
}
#[post("/incident-reports")]
pub async fn create_incident_report(
    env: web::Data<Env>,
    payload: web::Json<IncidentReportRequest>,
    req: HttpRequest,
) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };

    match IncidentReport::create(&env, &actor, payload.into_inner(), today()).await {
        Ok(incident) => HttpResponse::Created().json(incident),
        Err(error) => error.error_response(),
    }
}
#[put("/incident-reports/{incident_id}")]
pub async fn update_incident_report(
    env: web::Data<Env>,
    incident_id: web::Path<String>,
    payload: web::Json<IncidentReportRequest>,
    req: HttpRequest,
) -> HttpResponse {
    if actor(&req).is_none() {
        return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string());
    }
    let incident_id: ObjectId = match incident_id.parse() {
        Ok(incident_id) => incident_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    match IncidentReport::update(&env, &incident_id, payload.into_inner()).await {
        Ok(incident) => HttpResponse::Ok().json(incident),
        Err(error) => error.error_response(),
    }
}
#[post("/incident-reports/{incident_id}/insurance-claim")]
pub async fn create_insurance_claim(
    env: web::Data<Env>,
    incident_id: web::Path<String>,
    body: web::Bytes,
    req: HttpRequest,
) -> HttpResponse {
    if actor(&req).is_none() {
        return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string());
    }
    let incident_id: ObjectId = match incident_id.parse() {
        Ok(incident_id) => incident_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };
    let request: InsuranceClaimRequest = if body.is_empty() {
        InsuranceClaimRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(request) => request,
            Err(error) => {
                tracing::debug!(%error, "rejected insurance claim body");
                return HttpResponse::BadRequest().body("INVALID_JSON".to_string());
            }
        }
    };

    match IncidentReport::create_insurance_claim(&env, &incident_id, request, today()).await {
        Ok(claim) => HttpResponse::Ok().json(claim),
        Err(error) => error.error_response(),
    }
}
#[put("/incident-reports/{incident_id}/{action}")]
pub async fn run_incident_report_action(
    env: web::Data<Env>,
    path: web::Path<(String, IncidentReportAction)>,
    req: HttpRequest,
) -> HttpResponse {
    let actor: Actor = match actor(&req) {
        Some(actor) => actor,
        None => return HttpResponse::Unauthorized().body("UNAUTHORIZED".to_string()),
    };
    let (incident_id, action) = path.into_inner();
    let incident_id: ObjectId = match incident_id.parse() {
        Ok(incident_id) => incident_id,
        _ => return HttpResponse::BadRequest().body("INVALID_ID".to_string()),
    };

    match IncidentReport::run(&env, &actor, &incident_id, action, today()).await {
        Ok(incident) => HttpResponse::Ok().json(incident),
        Err(error) => error.error_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::env::temp_dir;

    use actix_web::{http::StatusCode, test, web, App};
    use mongodb::bson::oid::ObjectId;
    use serde_json::{json, Value};

    use crate::{
        config::Config,
        database::Env,
        models::user::{Actor, Keys, UserAuthenticationMiddlewareFactory},
    };

    fn keys() -> Keys {
        Keys::from_config(&Config::for_secret("incident-report-routes", temp_dir())).unwrap()
    }

    #[actix_web::test]
    async fn reporting_an_injury_opens_an_investigation() {
        let keys = keys();
        let actor = Actor {
            user_id: ObjectId::new(),
            company_id: ObjectId::new(),
        };
        let token = keys.issue(&actor).unwrap();
        let app = test::init_service(
            App::new()
                .wrap(UserAuthenticationMiddlewareFactory::new(keys.clone()))
                .app_data(web::Data::new(Env::memory()))
                .configure(super::super::configure),
        )
        .await;

        let request = test::TestRequest::post()
            .uri("/incident-reports")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .set_json(json!({
                "employee_id": ObjectId::new(),
                "kind": "injury",
                "severity": "high",
                "location": "Warehouse 2",
                "description": "Slipped on a wet floor near the loading bay",
            }))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(created["status"], "draft");
        let incident_id = created["_id"]["$oid"].as_str().unwrap().to_string();

        let request = test::TestRequest::put()
            .uri(&format!("/incident-reports/{}/report", incident_id))
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let reported: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(reported["status"], "investigation");

        let request = test::TestRequest::get()
            .uri("/accident-investigations")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let investigations: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(investigations.as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn anonymous_requests_are_rejected() {
        let app = test::init_service(
            App::new()
                .wrap(UserAuthenticationMiddlewareFactory::new(keys()))
                .app_data(web::Data::new(Env::memory()))
                .configure(super::super::configure),
        )
        .await;

        let request = test::TestRequest::get().uri("/incident-reports").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn guard_violations_are_bad_requests() {
        let keys = keys();
        let actor = Actor {
            user_id: ObjectId::new(),
            company_id: ObjectId::new(),
        };
        let token = keys.issue(&actor).unwrap();
        let app = test::init_service(
            App::new()
                .wrap(UserAuthenticationMiddlewareFactory::new(keys.clone()))
                .app_data(web::Data::new(Env::memory()))
                .configure(super::super::configure),
        )
        .await;

        let request = test::TestRequest::post()
            .uri("/incident-reports")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .set_json(json!({ "description": "Nobody involved" }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = test::read_body(response).await;
        assert_eq!(body, "Please select the employee involved.");
    }

    #[actix_web::test]
    async fn malformed_claim_bodies_are_not_replaced_by_defaults() {
        let keys = keys();
        let actor = Actor {
            user_id: ObjectId::new(),
            company_id: ObjectId::new(),
        };
        let token = format!("Bearer {}", keys.issue(&actor).unwrap());
        let app = test::init_service(
            App::new()
                .wrap(UserAuthenticationMiddlewareFactory::new(keys.clone()))
                .app_data(web::Data::new(Env::memory()))
                .configure(super::super::configure),
        )
        .await;

        let request = test::TestRequest::post()
            .uri("/incident-reports")
            .insert_header(("Authorization", token.clone()))
            .set_json(json!({
                "employee_id": ObjectId::new(),
                "kind": "property_damage",
                "location": "Workshop",
                "description": "Grinder guard cracked",
            }))
            .to_request();
        let incident: Value = test::call_and_read_body_json(&app, request).await;
        let uri = format!(
            "/incident-reports/{}/insurance-claim",
            incident["_id"]["$oid"].as_str().unwrap()
        );

        let request = test::TestRequest::post()
            .uri(&uri)
            .insert_header(("Authorization", token.clone()))
            .insert_header(("Content-Type", "application/json"))
            .set_payload(r#"{"amount": "#)
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(test::read_body(response).await, "INVALID_JSON");

        let request = test::TestRequest::post()
            .uri(&uri)
            .insert_header(("Authorization", token))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            test::read_body(response).await,
            "The claim amount must be positive."
        );
    }
}
