#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use serial_test::serial;

    use crate::helpers::{make_test_app, send};

    #[tokio::test]
    #[serial]
    async fn regenerate_replaces_consumed_session() {
        let app = make_test_app().await;
        let uri = format!("/api/v1/qr/class/{}/regenerate", app.schedule.id);

        let (status, first) = send(&app.router, "POST", &uri, Some(&app.lecturer), None).await;
        assert_eq!(status, StatusCode::CREATED, "{first}");

        let (status, _) = send(
            &app.router,
            "POST",
            "/api/v1/attendance/qr/scan",
            Some(&app.alice),
            Some(json!({ "qr_data": first["data"]["qr_data"] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, second) = send(&app.router, "POST", &uri, Some(&app.lecturer), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_ne!(second["data"]["session_id"], first["data"]["session_id"]);

        let (status, json) = send(
            &app.router,
            "POST",
            "/api/v1/attendance/qr/scan",
            Some(&app.bob),
            Some(json!({ "qr_data": second["data"]["qr_data"] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
    }

    #[tokio::test]
    #[serial]
    async fn regenerate_unknown_schedule_is_not_found() {
        let app = make_test_app().await;
        let uri = format!("/api/v1/qr/class/{}/regenerate", uuid::Uuid::new_v4());

        let (status, json) = send(&app.router, "POST", &uri, Some(&app.staff), None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    #[serial]
    async fn students_cannot_regenerate() {
        let app = make_test_app().await;
        let uri = format!("/api/v1/qr/class/{}/regenerate", app.schedule.id);

        let (status, _) = send(&app.router, "POST", &uri, Some(&app.alice), None).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
