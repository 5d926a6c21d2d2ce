//! gigmatch: a domain-scoped freelance marketplace engine.
//!
//! Clients post tasks tagged with a skill domain; freelancers accrue quality
//! and reliability history per domain; the platform ranks applicants with a
//! guaranteed-visibility rookie quota, gates Company-segment work behind
//! reputation thresholds, and advises clients on fair budgets from historical
//! data. The [`marketplace`] module holds the decision logic; persistence is
//! abstracted behind repository traits so stores can be swapped at the edge.

pub mod config;
pub mod error;
pub mod marketplace;
pub mod telemetry;
