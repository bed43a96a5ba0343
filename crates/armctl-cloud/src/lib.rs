//! armctl cloud core
//!
//! The confirmation-gated, idempotent upsert pattern every mutating armctl
//! command goes through, plus the plain read path.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   armctl CLI                     │
//! │   (network-security-group new/get/list, ...)     │
//! └─────────────────┬───────────────────────────────┘
//!                   │ InvocationContext
//! ┌─────────────────▼───────────────────────────────┐
//! │                 armctl-cloud                     │
//! │  ┌──────────────────┐  ┌──────────────────┐      │
//! │  │ Upsert           │  │ Reader           │      │
//! │  │  gate → confirm  │  │  get / list      │      │
//! │  │  → map → mutate  │  └──────────────────┘      │
//! │  │  → refetch       │                            │
//! │  └──────────────────┘                            │
//! │  ┌──────────────────────────────────────────┐    │
//! │  │  trait ResourceProvider / ListProvider    │    │
//! │  └──────────────────────────────────────────┘    │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │            armctl-cloud-azure (ARM REST)         │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod confirm;
pub mod context;
pub mod error;
pub mod gate;
pub mod mapper;
pub mod model;
pub mod provider;
pub mod read;
pub mod upsert;
pub mod wire;

// Re-exports
pub use confirm::{
    AlwaysAccept, AlwaysDecline, ConfirmationChannel, ConfirmationOutcome, ConfirmationPolicy,
    GateDecision,
};
pub use context::InvocationContext;
pub use error::{CloudError, Operation, ProviderError, ProviderResult, Result, ValidationError};
pub use mapper::WireMapped;
pub use model::{
    Access, Direction, ExtensionImageType, ExtensionImageVersion, NetworkSecurityGroup, Protocol,
    ResourceIdentity, Scope, SecurityRule, Tag, TagSet,
};
pub use provider::{
    ExtensionTypeQuery, ExtensionVersionQuery, ListProvider, ListQuery, ResourceGroupQuery,
    ResourceProvider,
};
pub use read::Reader;
pub use upsert::{Upsert, UpsertAction, UpsertOutcome};
pub use wire::{NetworkSecurityGroupWire, VirtualMachineImageResource};
