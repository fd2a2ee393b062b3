#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use serial_test::serial;

    use crate::helpers::{TestApp, make_test_app, send};

    fn body(app: &TestApp, start: &str, end: &str) -> Value {
        json!({
            "course_id": app.course.id,
            "lecturer_id": app.lecturer.id,
            "date": "2024-05-08",
            "day_of_week": 3,
            "start_time": start,
            "end_time": end,
            "room": "C-101"
        })
    }

    #[tokio::test]
    #[serial]
    async fn staff_create_schedule() {
        let app = make_test_app().await;

        let (status, json) = send(
            &app.router,
            "POST",
            "/api/v1/schedules",
            Some(&app.staff),
            Some(body(&app, "13:00:00", "14:40:00")),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED, "{json}");
        assert_eq!(json["data"]["room"], "C-101");
        assert_eq!(json["data"]["course_id"], app.course.id.to_string());
    }

    #[tokio::test]
    #[serial]
    async fn inverted_times_fail_validation() {
        let app = make_test_app().await;

        let (status, json) = send(
            &app.router,
            "POST",
            "/api/v1/schedules",
            Some(&app.staff),
            Some(body(&app, "14:40:00", "13:00:00")),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    #[serial]
    async fn lecturers_cannot_create_schedules() {
        let app = make_test_app().await;

        let (status, json) = send(
            &app.router,
            "POST",
            "/api/v1/schedules",
            Some(&app.lecturer),
            Some(body(&app, "13:00:00", "14:40:00")),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"]["code"], "FORBIDDEN");
    }
}
