#![forbid(unsafe_code)]

//! Enrollment funnel controllers.
//!
//! - [`funnel::EnrollmentFunnel`] drives the multi-screen video funnel.
//! - [`apply::ApplyForm`] drives the page-per-step application form.
//!
//! Both are [`funnel_runtime::program::Model`]s: hand them to a
//! [`Program`](funnel_runtime::program::Program) in a host, or to a
//! [`ProgramSimulator`](funnel_runtime::simulator::ProgramSimulator) in tests.

pub mod address;
pub mod application;
pub mod apply;
pub mod assistant;
pub mod config;
pub mod funnel;
pub mod gate;
pub mod pages;
pub mod progress;

pub use address::ParsedAddress;
pub use application::{ApplicationRecord, DEFAULT_DEBT_AMOUNT, Field};
pub use apply::{AddressStep, ApplyForm, ApplyMsg, ContactStep, LandingStep};
pub use assistant::{AssistantOverlay, CAPTIONS};
pub use config::FunnelConfig;
pub use funnel::{EnrollmentFunnel, FunnelMsg, Screen};
pub use gate::{GateRule, ScreenGate};
pub use progress::{ProgressIndicator, StepStatus};
