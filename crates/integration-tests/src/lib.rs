//! Integration tests for Treadline.
//!
//! The tests in `tests/` drive a running storefront server over HTTP and
//! are ignored by default. To run them:
//!
//! ```bash
//! # Migrate and seed the database
//! cargo run -p treadline-cli -- migrate
//! cargo run -p treadline-cli -- seed catalog -f crates/cli/data/catalog.yaml
//!
//! # Start the storefront
//! cargo run -p treadline-storefront
//!
//! # Run the ignored tests against it
//! cargo test -p treadline-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `storefront_health` - Liveness and readiness probes
//! - `storefront_catalog` - Product and variant listings
//! - `storefront_cart` - Guest cart lifecycle
//! - `storefront_auth` - Accounts, sign-in, and cart merging
//! - `storefront_checkout` - The checkout hand-off gate
//! - `repository_pg` - Schema constraints, straight against the database
//!
//! Set `STOREFRONT_BASE_URL` to point the HTTP tests at a non-default
//! server; the repository tests connect to `STOREFRONT_DATABASE_URL`
//! themselves.
