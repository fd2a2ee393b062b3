#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use db::models::subject::Model as SubjectModel;
    use serial_test::serial;

    use crate::helpers::{make_test_app, send};

    #[tokio::test]
    #[serial]
    async fn access_token_is_stable_across_calls() {
        let app = make_test_app().await;

        let (status, first) = send(&app.router, "GET", "/api/v1/qr/access/generate", Some(&app.alice), None).await;
        assert_eq!(status, StatusCode::OK, "{first}");
        let (_, second) = send(&app.router, "GET", "/api/v1/qr/access/generate", Some(&app.alice), None).await;

        assert_eq!(first["data"]["session_id"], second["data"]["session_id"]);
        assert!(first["data"]["qr_code"].as_str().unwrap().starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    #[serial]
    async fn gate_validation_alternates_tap_in_and_out() {
        let app = make_test_app().await;
        let (_, token) = send(&app.router, "GET", "/api/v1/qr/access/generate", Some(&app.alice), None).await;
        let uri = format!(
            "/api/v1/qr/access/validate/{}",
            token["data"]["session_id"].as_str().unwrap()
        );

        let (status, json) = send(&app.router, "GET", &uri, Some(&app.staff), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["valid"], true);
        assert_eq!(json["data"]["tap_outcome"], "tap_in");
        assert_eq!(json["data"]["subject_id"], app.alice.id.to_string());

        let (_, json) = send(&app.router, "GET", &uri, Some(&app.staff), None).await;
        assert_eq!(json["data"]["tap_outcome"], "tap_out");
    }

    #[tokio::test]
    #[serial]
    async fn unknown_token_is_denied_not_an_error() {
        let app = make_test_app().await;

        let (status, json) = send(
            &app.router,
            "GET",
            "/api/v1/qr/access/validate/no-such-token",
            Some(&app.staff),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["valid"], false);
        assert_eq!(json["data"]["tap_outcome"], "denied");
        assert!(json["data"].get("subject_id").is_none());
    }

    #[tokio::test]
    #[serial]
    async fn deactivated_holder_is_denied() {
        let app = make_test_app().await;
        let (_, token) = send(&app.router, "GET", "/api/v1/qr/access/generate", Some(&app.bob), None).await;
        SubjectModel::set_active(app.state.db(), app.bob.id, false)
            .await
            .unwrap();

        let uri = format!(
            "/api/v1/qr/access/validate/{}",
            token["data"]["session_id"].as_str().unwrap()
        );
        let (status, json) = send(&app.router, "GET", &uri, Some(&app.staff), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["valid"], false);
    }

    #[tokio::test]
    #[serial]
    async fn validation_requires_a_ticket() {
        let app = make_test_app().await;

        let (status, _) = send(&app.router, "GET", "/api/v1/qr/access/validate/x", None, None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
