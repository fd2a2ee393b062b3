#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use serial_test::serial;

    use crate::helpers::{TestApp, make_test_app, send};

    async fn generate(app: &TestApp, kind: &str) -> Value {
        let (status, json) = send(
            &app.router,
            "POST",
            "/api/v1/attendance/qr/generate",
            Some(&app.lecturer),
            Some(json!({ "schedule_id": app.schedule.id, "type": kind, "duration": 15 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        json["data"].clone()
    }

    #[tokio::test]
    #[serial]
    async fn lecturer_generates_class_session() {
        let app = make_test_app().await;

        let data = generate(&app, "kelas").await;

        assert!(data["qr_code"].as_str().unwrap().starts_with("data:image/png;base64,"));
        assert!(data["qr_data"].as_str().unwrap().starts_with("kelas:"));
        assert_eq!(data["schedule_id"], app.schedule.id.to_string());
        assert!(data["expires_at"].as_str().is_some());
    }

    #[tokio::test]
    #[serial]
    async fn student_cannot_generate() {
        let app = make_test_app().await;

        let (status, json) = send(
            &app.router,
            "POST",
            "/api/v1/attendance/qr/generate",
            Some(&app.alice),
            Some(json!({ "schedule_id": app.schedule.id, "type": "kelas" })),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"]["code"], "FORBIDDEN");
    }

    #[tokio::test]
    #[serial]
    async fn non_positive_duration_is_bad_request() {
        let app = make_test_app().await;

        let (status, json) = send(
            &app.router,
            "POST",
            "/api/v1/attendance/qr/generate",
            Some(&app.lecturer),
            Some(json!({ "schedule_id": app.schedule.id, "type": "kelas", "duration": 0 })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    #[serial]
    async fn unknown_kind_fails_validation() {
        let app = make_test_app().await;

        let (status, json) = send(
            &app.router,
            "POST",
            "/api/v1/attendance/qr/generate",
            Some(&app.lecturer),
            Some(json!({ "schedule_id": app.schedule.id, "type": "lab" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    #[serial]
    async fn student_scans_class_session_once() {
        let app = make_test_app().await;
        let session = generate(&app, "kelas").await;

        let (status, json) = send(
            &app.router,
            "POST",
            "/api/v1/attendance/qr/scan",
            Some(&app.alice),
            Some(json!({ "qr_data": session["qr_data"], "latitude": -6.2, "longitude": 106.8 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        assert_eq!(json["data"]["status"], "present");
        assert!(json["data"]["attendance_id"].as_str().is_some());

        // The class session is consumed by the first scan.
        let (status, json) = send(
            &app.router,
            "POST",
            "/api/v1/attendance/qr/scan",
            Some(&app.bob),
            Some(json!({ "qr_data": session["qr_data"] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["message"], "QR code has expired");
    }

    #[tokio::test]
    #[serial]
    async fn rescanning_is_a_conflict() {
        let app = make_test_app().await;
        let session = generate(&app, "kampus").await;
        let body = json!({ "qr_data": session["qr_data"] });

        let (first, _) = send(
            &app.router,
            "POST",
            "/api/v1/attendance/qr/scan",
            Some(&app.alice),
            Some(body.clone()),
        )
        .await;
        let (second, json) = send(
            &app.router,
            "POST",
            "/api/v1/attendance/qr/scan",
            Some(&app.alice),
            Some(body),
        )
        .await;

        assert_eq!(first, StatusCode::CREATED);
        assert_eq!(second, StatusCode::CONFLICT);
        assert_eq!(json["error"]["message"], "attendance already recorded for today");
    }

    #[tokio::test]
    #[serial]
    async fn garbage_payload_is_bad_request() {
        let app = make_test_app().await;

        let (status, json) = send(
            &app.router,
            "POST",
            "/api/v1/attendance/qr/scan",
            Some(&app.alice),
            Some(json!({ "qr_data": "definitely not a payload" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    #[serial]
    async fn lone_latitude_fails_validation() {
        let app = make_test_app().await;
        let session = generate(&app, "kelas").await;

        let (status, json) = send(
            &app.router,
            "POST",
            "/api/v1/attendance/qr/scan",
            Some(&app.alice),
            Some(json!({ "qr_data": session["qr_data"], "latitude": 10.0 })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    #[serial]
    async fn scan_without_ticket_is_unauthorized() {
        let app = make_test_app().await;

        let (status, _) = send(
            &app.router,
            "POST",
            "/api/v1/attendance/qr/scan",
            None,
            Some(json!({ "qr_data": "kelas:x:1" })),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    #[serial]
    async fn deactivated_session_rejects_scans() {
        let app = make_test_app().await;
        let session = generate(&app, "kampus").await;
        let uri = format!(
            "/api/v1/attendance/qr/sessions/{}/deactivate",
            session["session_id"].as_str().unwrap()
        );

        let (status, json) = send(&app.router, "POST", &uri, Some(&app.staff), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["active"], false);

        let (status, json) = send(
            &app.router,
            "POST",
            "/api/v1/attendance/qr/scan",
            Some(&app.alice),
            Some(json!({ "qr_data": session["qr_data"] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["message"], "QR code has expired");
    }

    #[tokio::test]
    #[serial]
    async fn manual_entry_then_duplicate_conflicts() {
        let app = make_test_app().await;
        let body = json!({
            "subject_id": app.bob.id,
            "schedule_id": app.schedule.id,
            "type": "kelas",
            "status": "sick",
            "date": "2024-05-01",
            "notes": "doctor's note"
        });

        let (status, json) = send(
            &app.router,
            "POST",
            "/api/v1/attendance/manual",
            Some(&app.lecturer),
            Some(body.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        assert_eq!(json["data"]["status"], "sick");

        let (status, json) = send(
            &app.router,
            "POST",
            "/api/v1/attendance/manual",
            Some(&app.lecturer),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    #[serial]
    async fn campus_tap_in_then_out() {
        let app = make_test_app().await;

        let (status, json) = send(&app.router, "POST", "/api/v1/attendance/tap-in", Some(&app.alice), None).await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        assert!(json["data"]["check_out_time"].is_null());

        let (status, json) = send(&app.router, "POST", "/api/v1/attendance/tap-in", Some(&app.alice), None).await;
        assert_eq!(status, StatusCode::CONFLICT, "{json}");

        let (status, json) = send(&app.router, "POST", "/api/v1/attendance/tap-out", Some(&app.alice), None).await;
        assert_eq!(status, StatusCode::OK, "{json}");
        assert!(json["data"]["check_out_time"].as_str().is_some());
    }

    #[tokio::test]
    #[serial]
    async fn tap_out_without_tap_in_is_not_found() {
        let app = make_test_app().await;

        let (status, json) = send(&app.router, "POST", "/api/v1/attendance/tap-out", Some(&app.bob), None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }
}
