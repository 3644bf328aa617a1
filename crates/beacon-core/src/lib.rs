//! # beacon-core
//!
//! Core room-signaling machinery for Beacon.
//!
//! This crate coordinates WebRTC session negotiation between exactly two
//! peers who share nothing but a room identifier:
//!
//! - **RoomRegistry** - room identity and live membership
//! - **PushRelay** - instant fan-out over persistent peer channels
//! - **SignalStore** - durable offer/answer/candidate records (memory and
//!   file backends)
//! - **PullCoordinator** - single-slot polling resolution
//! - **LifecycleManager** - idempotent room teardown
//! - **SignalingCoordinator** - the facade exposing push and pull as two
//!   named delivery strategies
//!
//! ## Architecture
//!
//! ```text
//!                  ┌─────────────────────────┐
//!   live channel ─▶│  SignalingCoordinator   │◀─ HTTP polling
//!                  └───────────┬─────────────┘
//!              ┌───────────────┼────────────────┐
//!              ▼               ▼                ▼
//!       ┌────────────┐  ┌─────────────┐  ┌────────────┐
//!       │ PushRelay  │  │ SignalStore │  │ Lifecycle  │
//!       └─────┬──────┘  └─────────────┘  └────────────┘
//!             ▼
//!       ┌────────────┐
//!       │  Registry  │
//!       └────────────┘
//! ```

pub mod coordinator;
pub mod event;
pub mod lifecycle;
pub mod pull;
pub mod registry;
pub mod relay;
pub mod room;
pub mod store;

pub use coordinator::{SignalingCoordinator, SignalingError};
pub use event::{PeerId, SignalEvent, SignalPayload};
pub use lifecycle::LifecycleManager;
pub use pull::PullCoordinator;
pub use registry::{RegistryStats, RoomRegistry};
pub use relay::{PushRelay, RelayConfig, RelayError};
pub use room::{Room, RoomId, RoomPhase, RoomSnapshot};
pub use store::{FileStore, MemoryStore, SignalStore, StoreError};
