#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use serial_test::serial;

    use crate::helpers::{TestApp, make_test_app, send};

    async fn manual(app: &TestApp, status: &str) -> Value {
        let (code, json) = send(
            &app.router,
            "POST",
            "/api/v1/attendance/manual",
            Some(&app.lecturer),
            Some(json!({
                "subject_id": app.alice.id,
                "schedule_id": app.schedule.id,
                "type": "kelas",
                "status": status,
                "date": "2024-05-01"
            })),
        )
        .await;
        assert_eq!(code, StatusCode::CREATED, "{json}");
        json["data"].clone()
    }

    #[tokio::test]
    #[serial]
    async fn absent_can_be_corrected_to_late() {
        let app = make_test_app().await;
        let created = manual(&app, "absent").await;
        let uri = format!("/api/v1/attendance/{}", created["id"].as_str().unwrap());

        let (status, json) = send(
            &app.router,
            "PUT",
            &uri,
            Some(&app.lecturer),
            Some(json!({ "status": "late", "notes": "bus strike" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["data"]["status"], "late");
        assert_eq!(json["data"]["notes"], "bus strike");
        assert_eq!(json["data"]["date"], "2024-05-01");
    }

    #[tokio::test]
    #[serial]
    async fn excused_is_final() {
        let app = make_test_app().await;
        let created = manual(&app, "excused").await;
        let uri = format!("/api/v1/attendance/{}", created["id"].as_str().unwrap());

        let (status, json) = send(
            &app.router,
            "PUT",
            &uri,
            Some(&app.lecturer),
            Some(json!({ "status": "present" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["message"], "attendance status is final");
    }

    #[tokio::test]
    #[serial]
    async fn students_cannot_correct_records() {
        let app = make_test_app().await;
        let created = manual(&app, "absent").await;
        let uri = format!("/api/v1/attendance/{}", created["id"].as_str().unwrap());

        let (status, _) = send(
            &app.router,
            "PUT",
            &uri,
            Some(&app.alice),
            Some(json!({ "status": "present" })),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    #[serial]
    async fn unknown_record_is_not_found() {
        let app = make_test_app().await;
        let uri = format!("/api/v1/attendance/{}", uuid::Uuid::new_v4());

        let (status, json) = send(
            &app.router,
            "PUT",
            &uri,
            Some(&app.staff),
            Some(json!({ "status": "present" })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }
}
