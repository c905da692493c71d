//! # 19sixtyfive Site Test Suite
//!
//! End-to-end flows driven through the fully layered router with a stubbed
//! content API and a manual clock.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs      # Stub CMS, clock, recording revalidator
//!     ├── revalidation.rs  # /api/revalidate end to end
//!     ├── pages.rs         # Page-data routes and the page cache
//!     └── endpoints.rs     # Health, metrics, SEO files, middleware
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p site-tests
//! cargo test -p site-tests integration::revalidation
//! ```

pub mod integration;
