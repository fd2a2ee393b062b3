#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use db::models::subject::Model as SubjectModel;
    use serial_test::serial;
    use tower::ServiceExt;

    use crate::helpers::{make_test_app, send};

    #[tokio::test]
    #[serial]
    async fn me_returns_subject_with_detail() {
        let app = make_test_app().await;

        let (status, json) = send(&app.router, "GET", "/api/v1/auth/me", Some(&app.alice), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "User data retrieved successfully");
        assert_eq!(json["data"]["id"], app.alice.id.to_string());
        assert_eq!(json["data"]["role"], "student");
        assert!(!json["data"]["detail"].is_null());
    }

    #[tokio::test]
    #[serial]
    async fn me_without_ticket_is_unauthorized() {
        let app = make_test_app().await;

        let (status, json) = send(&app.router, "GET", "/api/v1/auth/me", None, None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    #[serial]
    async fn garbage_ticket_is_unauthorized() {
        let app = make_test_app().await;

        let req = Request::builder()
            .method("GET")
            .uri("/api/v1/auth/me")
            .header("Authorization", "Bearer not-a-ticket")
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    #[serial]
    async fn deactivated_subject_is_refused_with_valid_ticket() {
        let app = make_test_app().await;
        SubjectModel::set_active(app.state.db(), app.alice.id, false)
            .await
            .unwrap();

        let (status, json) = send(&app.router, "GET", "/api/v1/auth/me", Some(&app.alice), None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["message"], "account is inactive");
    }
}
