// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use pawsteps::error::AppError;

#[test]
fn test_is_health_timeout_matches() {
    let err = AppError::HealthApi(AppError::HEALTH_TIMEOUT.to_string());
    assert!(err.is_health_timeout());
}

#[test]
fn test_is_health_timeout_no_match() {
    let err = AppError::HealthApi("connection refused".to_string());
    assert!(!err.is_health_timeout());

    let err = AppError::HealthApi(AppError::HEALTH_TOKEN_ERROR.to_string());
    assert!(!err.is_health_timeout());

    let err = AppError::BadRequest("Bad Request".to_string());
    assert!(!err.is_health_timeout());
}

#[test]
fn test_status_code_mapping() {
    let cases = [
        (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
        (AppError::InvalidToken, StatusCode::UNAUTHORIZED),
        (
            AppError::NotFound("nope".to_string()),
            StatusCode::NOT_FOUND,
        ),
        (
            AppError::BadRequest("bad".to_string()),
            StatusCode::BAD_REQUEST,
        ),
        (
            AppError::HealthApi("down".to_string()),
            StatusCode::BAD_GATEWAY,
        ),
        (
            AppError::CatalogEmpty("no pets".to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (
            AppError::Database("boom".to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (err, expected) in cases {
        assert_eq!(err.into_response().status(), expected);
    }
}
