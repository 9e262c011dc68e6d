// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory operation routing across graph, cache and document systems.
//!
//! ## Architecture
//!
//! - **MemoryRouter**: facade that extracts entities, classifies intent,
//!   scores systems and executes operations with fallback
//! - **Propagator**: best-effort replication of successful writes to the
//!   other systems a data type belongs in
//! - **RoutingStats**: running counters plus tracker snapshots

pub mod propagation;
pub mod router;

pub use propagation::{
    PropagationRequest, PropagationResult, PropagationStatus, Propagator, policy_targets,
};
pub use router::{MemoryRouter, MemoryRouterBuilder, RoutingStats, StoreReport};
