mod attendance;
mod auth;
mod health_test;
mod qr;
mod schedules_test;
mod users_test;
