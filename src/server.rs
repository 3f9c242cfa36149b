use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use log::{error, info};

use crate::data::AllocationRequest;
use crate::error::AllocationError;
use crate::events::log_events;
use crate::solver::{self, AllocationReport};

pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";
pub const ADDR_ENV: &str = "INSTRUCTOR_ALLOC_ADDR";

fn status_for(err: &AllocationError) -> StatusCode {
    match err {
        AllocationError::Config(_) | AllocationError::Calendar(_) => StatusCode::BAD_REQUEST,
        AllocationError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn solve_handler(
    Json(request): Json<AllocationRequest>,
) -> Result<Json<AllocationReport>, (StatusCode, String)> {
    // the solver blocks for up to its time limit
    let joined = tokio::task::spawn_blocking(move || solver::solve_request(&request)).await;
    match joined {
        Ok(Ok(report)) => {
            log_events(&report.events);
            Ok(Json(report))
        }
        Ok(Err(e)) => {
            error!("Allocation rejected: {e}");
            Err((status_for(&e), e.to_string()))
        }
        Err(e) => {
            error!("Allocation task failed: {e}");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

pub fn router() -> Router {
    Router::new().route("/v1/allocation/solve", post(solve_handler))
}

pub async fn run_server() -> std::io::Result<()> {
    let addr = std::env::var(ADDR_ENV).unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, router()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CalendarError, ConfigError};

    #[test]
    fn maps_errors_to_status_codes() {
        assert_eq!(
            status_for(&AllocationError::Config(ConfigError::Capacity)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&AllocationError::Calendar(CalendarError::EmptyHorizon)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&AllocationError::Backend("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
