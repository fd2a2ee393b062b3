pub mod app;

pub use app::{TestApp, bearer, make_test_app, send};
