//! Toolshop E2E Test Harness
//!
//! A Rust-controlled test harness for the Toolshop demo store that:
//! - Generates Playwright scripts from step scenarios and runs them via node
//! - Provisions authenticated sessions per role and persists them to disk
//! - Seeds fixtures from persisted session state with guaranteed teardown
//! - Issues typed HTTP assertions against the store API
//! - Performs visual regression testing with baseline screenshots
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     TestRunner (Rust)                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  projects: setup ──▶ ui          api                         │
//! │    setup : AuthSetup per role -> .auth/<role>.json           │
//! │    ui    : Scenario files -> Fixture -> PlaywrightHandle     │
//! │    api   : ApiClient checks over reqwest                     │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Scenario (YAML or page-object built)                        │
//! │    ├── navigate / fill / click / select                      │
//! │    ├── wait_for { locator } / wait_for_url { pattern }       │
//! │    ├── expect { visible?, text?, count?, disabled? }         │
//! │    ├── screenshot { name, mask }                             │
//! │    └── save_state { path }                                   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod auth;
pub mod browser;
pub mod error;
pub mod fixture;
pub mod pages;
pub mod runner;
pub mod scenario;
pub mod target;
pub mod visual;

pub use browser::{Browser, PlaywrightConfig, PlaywrightHandle};
pub use error::{E2eError, E2eResult};
pub use runner::TestRunner;
pub use scenario::{Locator, Scenario, TestStep};
