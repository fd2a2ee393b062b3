#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use chrono::NaiveDate;
    use db::models::attendance_record::{AttendanceStatus, Model as RecordModel, NewRecord};
    use db::models::attendance_session::AttendanceKind;
    use serial_test::serial;
    use uuid::Uuid;

    use crate::helpers::{TestApp, make_test_app, send};

    async fn record(app: &TestApp, subject_id: Uuid, day: u32, status: AttendanceStatus) {
        RecordModel::create(
            app.state.db(),
            NewRecord {
                subject_id,
                session_id: None,
                schedule_id: Some(app.schedule.id),
                kind: AttendanceKind::Class,
                status,
                date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
                check_in_time: None,
                latitude: None,
                longitude: None,
                notes: None,
                created_by: Some(app.lecturer.id),
            },
            chrono::Utc::now(),
        )
        .await
        .expect("create record");
    }

    #[tokio::test]
    #[serial]
    async fn students_only_list_their_own_records() {
        let app = make_test_app().await;
        record(&app, app.alice.id, 1, AttendanceStatus::Present).await;
        record(&app, app.alice.id, 2, AttendanceStatus::Absent).await;
        record(&app, app.bob.id, 1, AttendanceStatus::Present).await;

        let uri = format!("/api/v1/attendance?subject_id={}", app.bob.id);
        let (status, json) = send(&app.router, "GET", &uri, Some(&app.alice), None).await;

        assert_eq!(status, StatusCode::OK);
        let records = json["data"].as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r["subject_id"] == app.alice.id.to_string()));
        assert_eq!(json["meta"]["total"], 2);
        assert_eq!(json["meta"]["page"], 1);
    }

    #[tokio::test]
    #[serial]
    async fn staff_list_is_paginated_and_filtered() {
        let app = make_test_app().await;
        for day in 1..=3 {
            record(&app, app.alice.id, day, AttendanceStatus::Present).await;
            record(&app, app.bob.id, day, AttendanceStatus::Late).await;
        }

        let (status, json) = send(
            &app.router,
            "GET",
            "/api/v1/attendance?status=late&page=1&per_page=2",
            Some(&app.staff),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"].as_array().unwrap().len(), 2);
        assert_eq!(json["meta"]["total"], 3);
        assert_eq!(json["meta"]["per_page"], 2);
    }

    #[tokio::test]
    #[serial]
    async fn bad_query_fails_validation() {
        let app = make_test_app().await;

        let (status, json) = send(
            &app.router,
            "GET",
            "/api/v1/attendance?date_from=yesterday",
            Some(&app.staff),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    #[serial]
    async fn page_beyond_offset_range_fails_validation() {
        let app = make_test_app().await;
        record(&app, app.alice.id, 1, AttendanceStatus::Present).await;

        let (status, json) = send(
            &app.router,
            "GET",
            "/api/v1/attendance?page=18446744073709551615&per_page=100",
            Some(&app.staff),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
        assert_eq!(json["error"]["message"], "page is out of range");
    }

    #[tokio::test]
    #[serial]
    async fn statistics_count_by_status() {
        let app = make_test_app().await;
        record(&app, app.alice.id, 1, AttendanceStatus::Present).await;
        record(&app, app.alice.id, 2, AttendanceStatus::Present).await;
        record(&app, app.alice.id, 3, AttendanceStatus::Sick).await;
        record(&app, app.alice.id, 6, AttendanceStatus::Absent).await;

        let (status, json) = send(
            &app.router,
            "GET",
            "/api/v1/attendance/statistics",
            Some(&app.alice),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["total"], 4);
        assert_eq!(json["data"]["by_status"]["present"], 2);
        assert_eq!(json["data"]["attendance_rate"], 0.5);
    }
}
