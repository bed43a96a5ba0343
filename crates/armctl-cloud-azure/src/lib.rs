//! Azure Resource Manager provider for armctl
//!
//! Implements the provider traits of `armctl-cloud` over the ARM REST API.
//!
//! # Features
//!
//! - Network security groups: get, create-or-update, list per resource group
//! - VM extension image catalog: list types and versions of a publisher
//! - Long-running operation polling (`Azure-AsyncOperation` / `Location`)
//! - `nextLink` pagination
//!
//! # Requirements
//!
//! `AZURE_SUBSCRIPTION_ID` and `AZURE_ACCESS_TOKEN` (a bearer token for
//! `https://management.azure.com/`), optionally `ARM_ENDPOINT`.
//!
//! # Example
//!
//! ```ignore
//! use armctl_cloud_azure::{ArmClient, ArmConfig, NetworkSecurityGroupClient};
//!
//! let arm = ArmClient::new(ArmConfig::from_env()?)?;
//! let nsgs = NetworkSecurityGroupClient::new(arm);
//! ```

pub mod client;
pub mod compute;
pub mod config;
pub mod error;
pub mod network;

pub use client::ArmClient;
pub use compute::{COMPUTE_API_VERSION, ExtensionImageClient};
pub use config::ArmConfig;
pub use error::{ArmError, Result};
pub use network::{NETWORK_API_VERSION, NetworkSecurityGroupClient};
