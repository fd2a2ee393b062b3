use crate::seed::Seeder;
use async_trait::async_trait;
use db::models::subject::{Model, NewDetail, NewSubject};
use fake::{Fake, faker::name::en::Name};
use sea_orm::{DatabaseConnection, DbErr};

pub struct SubjectSeeder;

const PROGRAMS: &[(&str, &str)] = &[
    ("Informatics", "Engineering"),
    ("Information Systems", "Engineering"),
    ("Accounting", "Economics"),
];

fn email_for(name: &str, n: u32) -> String {
    let local: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    format!("{local}{n}@campus.test")
}

#[async_trait]
impl Seeder for SubjectSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), DbErr> {
        // Fixed accounts, one per role
        Model::create(
            db,
            NewSubject {
                name: "Campus Staff".into(),
                email: "staff@campus.test".into(),
                identity_number: "S-0001".into(),
                password: "password123".into(),
                detail: NewDetail::Staff {
                    unit: "Registry".into(),
                    position: "Administrator".into(),
                },
            },
        )
        .await?;
        Model::create(
            db,
            NewSubject {
                name: "Campus Lecturer".into(),
                email: "lecturer@campus.test".into(),
                identity_number: "L-0001".into(),
                password: "password123".into(),
                detail: NewDetail::Lecturer {
                    department: "Computer Science".into(),
                    title: "Dr.".into(),
                },
            },
        )
        .await?;
        Model::create(
            db,
            NewSubject {
                name: "Campus Student".into(),
                email: "student@campus.test".into(),
                identity_number: "2024000".into(),
                password: "password123".into(),
                detail: NewDetail::Student {
                    program: "Informatics".into(),
                    faculty: "Engineering".into(),
                    cohort: "2024".into(),
                },
            },
        )
        .await?;

        // Random lecturers
        for n in 2..=4 {
            let name: String = Name().fake();
            Model::create(
                db,
                NewSubject {
                    email: email_for(&name, n),
                    name,
                    identity_number: format!("L-{n:04}"),
                    password: "password123".into(),
                    detail: NewDetail::Lecturer {
                        department: "Computer Science".into(),
                        title: "M.Sc.".into(),
                    },
                },
            )
            .await?;
        }

        // Random students
        for n in 1..=30 {
            let name: String = Name().fake();
            let (program, faculty) = PROGRAMS[fastrand::usize(..PROGRAMS.len())];
            let cohort = 2021 + fastrand::u32(..4);
            Model::create(
                db,
                NewSubject {
                    email: email_for(&name, n),
                    name,
                    identity_number: format!("{cohort}{n:03}"),
                    password: "password123".into(),
                    detail: NewDetail::Student {
                        program: program.into(),
                        faculty: faculty.into(),
                        cohort: cohort.to_string(),
                    },
                },
            )
            .await?;
        }
        Ok(())
    }
}
