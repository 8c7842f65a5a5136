//! Integration tests
//!
//! Both suites are ignored by default. `lending_tests` needs `DATABASE_URL`
//! pointing at a Postgres server where test databases may be created;
//! `api_tests` needs a running server. Run with: cargo test -- --ignored

mod api_tests;
mod lending_tests;
