// Error handling tests
// Author: kelexine (https://github.com/kelexine)

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use langstats::error::StatsError;

#[test]
fn test_error_display_messages() {
    let errors = vec![
        StatsError::NotFound("ghost".to_string()),
        StatsError::Upstream {
            status: 502,
            message: "Bad gateway".to_string(),
        },
        StatsError::Timeout("repos".to_string()),
        StatsError::CacheUnavailable("disk full".to_string()),
        StatsError::PayloadTooLarge {
            size: 2048,
            limit: 1024,
        },
        StatsError::InvalidRequest("Bad request".to_string()),
        StatsError::Internal("boom".to_string()),
    ];

    for error in errors {
        let display = format!("{}", error);
        assert!(!display.is_empty(), "Error should have display message");
    }
}

#[test]
fn test_status_mapping() {
    let cases = vec![
        (StatsError::NotFound("ghost".to_string()), StatusCode::NOT_FOUND),
        (
            StatsError::Upstream {
                status: 500,
                message: "x".to_string(),
            },
            StatusCode::BAD_GATEWAY,
        ),
        (StatsError::Timeout("x".to_string()), StatusCode::GATEWAY_TIMEOUT),
        (StatsError::InvalidRequest("x".to_string()), StatusCode::BAD_REQUEST),
        (
            StatsError::PayloadTooLarge { size: 2, limit: 1 },
            StatusCode::PAYLOAD_TOO_LARGE,
        ),
        (StatsError::Internal("x".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
    ];

    for (error, expected) in cases {
        assert_eq!(error.status_and_type().0, expected, "{}", error);
    }
}

#[test]
fn test_payload_too_large_mentions_sizes() {
    let error = StatsError::PayloadTooLarge {
        size: 2048,
        limit: 1024,
    };
    let message = error.to_string();
    assert!(message.contains("2048"));
    assert!(message.contains("1024"));
}

#[test]
fn test_io_errors_convert() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
    let error: StatsError = io.into();
    assert!(matches!(error, StatsError::Io(_)));
}

#[tokio::test]
async fn test_error_response_body() {
    let response = StatsError::NotFound("ghost".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["type"], "error");
    assert_eq!(body["error"]["type"], "not_found_error");
    assert!(body["error"]["message"].as_str().unwrap().contains("ghost"));
}
