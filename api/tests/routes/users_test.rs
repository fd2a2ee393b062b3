#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use db::models::enrollment::Model as EnrollmentModel;
    use serde_json::json;
    use serial_test::serial;

    use crate::helpers::{make_test_app, send};

    #[tokio::test]
    #[serial]
    async fn staff_deactivate_account_and_login_stops_working() {
        let app = make_test_app().await;
        let uri = format!("/api/v1/users/{}/status", app.alice.id);

        let (status, json) = send(&app.router, "PUT", &uri, Some(&app.staff), Some(json!({ "active": false }))).await;
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["data"]["active"], false);

        let (status, _) = send(
            &app.router,
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "identifier": "alice@campus.test", "password": "password123" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    #[serial]
    async fn status_change_is_staff_only() {
        let app = make_test_app().await;
        let uri = format!("/api/v1/users/{}/status", app.bob.id);

        let (status, _) = send(&app.router, "PUT", &uri, Some(&app.lecturer), Some(json!({ "active": false }))).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    #[serial]
    async fn unknown_user_is_not_found() {
        let app = make_test_app().await;
        let uri = format!("/api/v1/users/{}/status", uuid::Uuid::new_v4());

        let (status, _) = send(&app.router, "PUT", &uri, Some(&app.staff), Some(json!({ "active": true }))).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[serial]
    async fn grading_enforces_score_range() {
        let app = make_test_app().await;
        let enrollment = EnrollmentModel::create(app.state.db(), app.alice.id, app.course.id)
            .await
            .expect("enroll");
        let uri = format!("/api/v1/enrollments/{}/grade", enrollment.id);

        let (status, json) = send(&app.router, "PUT", &uri, Some(&app.lecturer), Some(json!({ "score": 87.5 }))).await;
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["data"]["score"], 87.5);

        let (status, json) = send(&app.router, "PUT", &uri, Some(&app.lecturer), Some(json!({ "score": 101 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
    }
}
