#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use serial_test::serial;

    use crate::helpers::{make_test_app, send};

    #[tokio::test]
    #[serial]
    async fn login_by_email_returns_ticket_pair() {
        let app = make_test_app().await;

        let (status, json) = send(
            &app.router,
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "identifier": "alice@campus.test", "password": "password123" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Login successful");
        assert!(json["data"]["access_token"].as_str().is_some());
        assert!(json["data"]["refresh_token"].as_str().is_some());
        assert_eq!(json["data"]["subject"]["id"], app.alice.id.to_string());
        assert!(json["data"]["subject"].get("password_hash").is_none());
    }

    #[tokio::test]
    #[serial]
    async fn login_by_identity_number_works() {
        let app = make_test_app().await;

        let (status, json) = send(
            &app.router,
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "identifier": "2023002", "password": "password123" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["subject"]["id"], app.bob.id.to_string());
    }

    #[tokio::test]
    #[serial]
    async fn wrong_password_is_unauthorized() {
        let app = make_test_app().await;

        let (status, json) = send(
            &app.router,
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "identifier": "alice@campus.test", "password": "nope" })),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    #[serial]
    async fn empty_identifier_fails_validation() {
        let app = make_test_app().await;

        let (status, json) = send(
            &app.router,
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "identifier": "", "password": "password123" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    #[serial]
    async fn malformed_body_fails_validation() {
        let app = make_test_app().await;

        let (status, json) = send(
            &app.router,
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "identifier": 42 })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    #[serial]
    async fn refresh_exchanges_renewal_ticket_only() {
        let app = make_test_app().await;

        let (_, login) = send(
            &app.router,
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "identifier": "lena@campus.test", "password": "password123" })),
        )
        .await;
        let refresh_token = login["data"]["refresh_token"].as_str().unwrap().to_owned();
        let access_token = login["data"]["access_token"].as_str().unwrap().to_owned();

        let (status, json) = send(
            &app.router,
            "POST",
            "/api/v1/auth/refresh",
            None,
            Some(json!({ "refresh_token": refresh_token })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["subject"]["id"], app.lecturer.id.to_string());

        let (status, json) = send(
            &app.router,
            "POST",
            "/api/v1/auth/refresh",
            None,
            Some(json!({ "refresh_token": access_token })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["code"], "UNAUTHORIZED");
    }
}
