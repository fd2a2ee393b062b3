#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{NaiveDate, NaiveTime};
use db::models::course::Model as CourseModel;
use db::models::schedule::{Model as ScheduleModel, NewSchedule};
use db::models::subject::{Model as SubjectModel, NewDetail, NewSubject};
use db::test_utils::setup_test_db;
use serde_json::Value;
use tower::ServiceExt;
use util::bus::{EventBus, EventPublisher, InMemoryBus, Topology};
use util::jwt::TokenIssuer;
use util::state::AppState;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub bus: Arc<InMemoryBus>,
    pub lecturer: SubjectModel,
    pub staff: SubjectModel,
    pub alice: SubjectModel,
    pub bob: SubjectModel,
    pub course: CourseModel,
    pub schedule: ScheduleModel,
}

async fn student(state: &AppState, name: &str, number: &str) -> SubjectModel {
    SubjectModel::create(
        state.db(),
        NewSubject {
            name: name.into(),
            email: format!("{}@campus.test", name.to_lowercase()),
            identity_number: number.into(),
            password: "password123".into(),
            detail: NewDetail::Student {
                program: "Informatics".into(),
                faculty: "Engineering".into(),
                cohort: "2023".into(),
            },
        },
    )
    .await
    .expect("create student")
}

/// Fresh in-memory database and broker, seeded with one subject of each role,
/// a course and a schedule.
pub async fn make_test_app() -> TestApp {
    let db = setup_test_db().await;
    let bus = Arc::new(InMemoryBus::new());
    bus.declare(&Topology::campus()).await.expect("declare topology");
    let state = AppState::new(db, EventPublisher::new(bus.clone()));

    let lecturer = SubjectModel::create(
        state.db(),
        NewSubject {
            name: "Lena".into(),
            email: "lena@campus.test".into(),
            identity_number: "L-001".into(),
            password: "password123".into(),
            detail: NewDetail::Lecturer {
                department: "Computer Science".into(),
                title: "Dr.".into(),
            },
        },
    )
    .await
    .expect("create lecturer");
    let staff = SubjectModel::create(
        state.db(),
        NewSubject {
            name: "Sam".into(),
            email: "sam@campus.test".into(),
            identity_number: "S-001".into(),
            password: "password123".into(),
            detail: NewDetail::Staff {
                unit: "Registry".into(),
                position: "Officer".into(),
            },
        },
    )
    .await
    .expect("create staff");
    let alice = student(&state, "Alice", "2023001").await;
    let bob = student(&state, "Bob", "2023002").await;

    let course = CourseModel::create(state.db(), "cs101", "Programming I", 3, Some(lecturer.id))
        .await
        .expect("create course");
    let schedule = ScheduleModel::create(
        state.db(),
        NewSchedule {
            course_id: course.id,
            lecturer_id: lecturer.id,
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            day_of_week: 3,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 40, 0).unwrap(),
            room: "B-204".into(),
        },
    )
    .await
    .expect("create schedule");

    TestApp {
        router: api::app(state.clone()),
        state,
        bus,
        lecturer,
        staff,
        alice,
        bob,
        course,
        schedule,
    }
}

/// `Authorization` header value carrying an access ticket for `subject`.
pub fn bearer(subject: &SubjectModel) -> String {
    let issued = TokenIssuer::from_config()
        .issue_access(subject.id, &subject.role.to_string(), &subject.identity_number)
        .expect("issue access ticket");
    format!("Bearer {}", issued.token)
}

/// Sends one request and returns the status with the decoded JSON envelope.
pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    auth: Option<&SubjectModel>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(subject) = auth {
        builder = builder.header("Authorization", bearer(subject));
    }
    let req = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
