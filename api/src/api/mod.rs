pub mod service;

use actix_web::{http::StatusCode, post, web, HttpResponse, Responder};
use log::{debug, error, info, trace, warn};
use shared::{ChatRequest, ChatResponse, RunCodeRequest, RunCodeResponse};

use crate::{
    api::service::{RelayService, RelayServiceTrait},
    judge0::Judge0Error,
};
use std::error::Error;

async fn run_code(request: RunCodeRequest, service: &dyn RelayServiceTrait) -> RunCodeResponse {
    let response = service.run_code(request).await;

    match response {
        Ok(report) => {
            info!("Execution accepted");
            trace!("Report: {:?}", report);
            RunCodeResponse::success(report)
        }
        Err(Judge0Error::ExecutionFailed(result)) => {
            warn!(
                "Execution ended with status {} ({})",
                result.status.id, result.status.description
            );
            let details = serde_json::to_value(&*result).ok();
            RunCodeResponse::error(Judge0Error::ExecutionFailed(result).to_string(), details)
        }
        Err(e @ Judge0Error::Timeout { .. }) => {
            warn!("Timeout while waiting for the execution result");
            RunCodeResponse::error(e.to_string(), None)
        }
        Err(e) => {
            error!("Error during submission: {}", e);
            RunCodeResponse::error(e.to_string(), None)
        }
    }
}

async fn chat(request: ChatRequest, service: &dyn RelayServiceTrait) -> (StatusCode, ChatResponse) {
    match service.chat(request.message).await {
        Ok(text) => (StatusCode::OK, ChatResponse::reply(text)),
        Err(e) => {
            error!("Error with Gemini API: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, ChatResponse::failure(e.to_string()))
        }
    }
}

#[post("/run-code")]
pub async fn post_run_code_route(
    run_body: web::Json<RunCodeRequest>,
    api_service: web::Data<RelayService>,
) -> Result<impl Responder, Box<dyn Error>> {
    debug!(
        "Received code execution request from http (language: {})",
        run_body.language
    );
    trace!("Request body: {:?}", run_body);

    let service = api_service.get_ref();
    let result = run_code(run_body.into_inner(), service);

    Ok(web::Json(result.await))
}

#[post("/api/chat")]
pub async fn post_chat_route(
    chat_body: web::Json<ChatRequest>,
    api_service: web::Data<RelayService>,
) -> Result<impl Responder, Box<dyn Error>> {
    debug!("Received chat request from http");

    let (status, response) = chat(chat_body.into_inner(), api_service.get_ref()).await;

    Ok(HttpResponse::build(status).json(response))
}
