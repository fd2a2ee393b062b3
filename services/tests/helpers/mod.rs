#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use db::models::course::Model as CourseModel;
use db::models::schedule::{Model as ScheduleModel, NewSchedule};
use db::models::subject::{Model as SubjectModel, NewDetail, NewSubject};
use sea_orm::DatabaseConnection;
use services::attendance_service::{AttendanceService, AttendanceSettings};
use services::gate_access_service::{GateAccessService, GateSettings};
use util::bus::{EventBus, EventPublisher, InMemoryBus, Topology};

pub struct Fixture {
    pub db: DatabaseConnection,
    pub bus: Arc<InMemoryBus>,
    pub lecturer: SubjectModel,
    pub staff: SubjectModel,
    pub alice: SubjectModel,
    pub bob: SubjectModel,
    pub schedule: ScheduleModel,
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn attendance_settings() -> AttendanceSettings {
    AttendanceSettings {
        default_duration: Duration::minutes(15),
        qr_image_size: 128,
        utc_offset_minutes: 0,
    }
}

pub fn gate_settings() -> GateSettings {
    GateSettings {
        window: Duration::hours(12),
        qr_image_size: 128,
        utc_offset_minutes: 0,
    }
}

pub async fn publisher() -> (Arc<InMemoryBus>, EventPublisher) {
    let bus = Arc::new(InMemoryBus::new());
    bus.declare(&Topology::campus()).await.expect("declare topology");
    let publisher = EventPublisher::new(bus.clone());
    (bus, publisher)
}

pub async fn student(db: &DatabaseConnection, name: &str, number: &str) -> SubjectModel {
    SubjectModel::create(
        db,
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

pub async fn seed(db: DatabaseConnection) -> Fixture {
    let lecturer = SubjectModel::create(
        &db,
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
        &db,
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
    let alice = student(&db, "Alice", "2023001").await;
    let bob = student(&db, "Bob", "2023002").await;

    let course = CourseModel::create(&db, "cs101", "Programming I", 3, Some(lecturer.id))
        .await
        .expect("create course");
    let schedule = ScheduleModel::create(
        &db,
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

    let (bus, _) = publisher().await;
    Fixture {
        db,
        bus,
        lecturer,
        staff,
        alice,
        bob,
        schedule,
    }
}

impl Fixture {
    pub fn publisher(&self) -> EventPublisher {
        EventPublisher::new(self.bus.clone())
    }

    pub fn attendance(&self) -> AttendanceService {
        AttendanceService::new(self.db.clone(), self.publisher(), attendance_settings())
    }

    pub fn gate(&self) -> GateAccessService {
        GateAccessService::new(self.db.clone(), self.publisher(), gate_settings())
    }
}
