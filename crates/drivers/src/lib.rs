// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bmc-drivers: hardware-management driver interfaces.
//!
//! Each sub-driver is an independently replaceable collaborator. Concrete
//! implementations (IPMI, Redfish, ...) live out of tree; this crate defines
//! the contracts the conductor calls through and the recording fakes its
//! tests drive.
//!
//! Interfaces are synchronous: the conductor runs each operation on one
//! worker thread from lock acquisition to release, and driver calls block
//! that thread.

pub mod deploy;
pub mod driver;
pub mod management;
pub mod network;
pub mod power;
pub mod rescue;
pub mod storage;

pub use deploy::DeployInterface;
pub use driver::Driver;
pub use management::ManagementInterface;
pub use network::NetworkInterface;
pub use power::PowerInterface;
pub use rescue::RescueInterface;
pub use storage::StorageInterface;

#[cfg(any(test, feature = "test-support"))]
pub use deploy::FakeDeploy;
#[cfg(any(test, feature = "test-support"))]
pub use driver::FakeDriverSet;
#[cfg(any(test, feature = "test-support"))]
pub use management::FakeManagement;
#[cfg(any(test, feature = "test-support"))]
pub use network::FakeNetwork;
#[cfg(any(test, feature = "test-support"))]
pub use power::FakePower;
#[cfg(any(test, feature = "test-support"))]
pub use rescue::FakeRescue;
#[cfg(any(test, feature = "test-support"))]
pub use storage::FakeStorage;

/// Result of a driver call.
pub type DriverResult<T> = Result<T, bmc_core::ConductorError>;
