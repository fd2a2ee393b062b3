mod get_test;
mod post_test;
mod put_test;
