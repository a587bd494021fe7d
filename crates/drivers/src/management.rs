// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Management interface: boot device, boot mode, vendor detection.

use crate::DriverResult;
use bmc_core::{BootDevice, BootMode, Node};

pub trait ManagementInterface: Send + Sync + 'static {
    /// Check that the node's driver info is sufficient for management calls.
    fn validate(&self, node: &Node) -> DriverResult<()>;

    /// Select the device the node boots from next (`persistent = false`) or
    /// permanently.
    fn set_boot_device(
        &self,
        node: &Node,
        device: BootDevice,
        persistent: bool,
    ) -> DriverResult<()>;

    /// Currently configured boot mode, or `None` if it cannot be read.
    fn get_boot_mode(&self, node: &Node) -> DriverResult<Option<BootMode>>;

    fn get_supported_boot_modes(&self, node: &Node) -> DriverResult<Vec<BootMode>>;

    fn set_boot_mode(&self, node: &Node, mode: BootMode) -> DriverResult<()>;

    /// Hardware vendor name, or `None` if the hardware does not say.
    fn detect_vendor(&self, node: &Node) -> DriverResult<Option<String>>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::ManagementInterface;
    use crate::DriverResult;
    use bmc_core::{BootDevice, BootMode, ConductorError, Node};
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct State {
        validate_error: Option<ConductorError>,
        boot_mode: Option<BootMode>,
        get_boot_mode_error: Option<ConductorError>,
        supported_boot_modes: Vec<BootMode>,
        vendor: DriverResult<Option<String>>,
        set_boot_device_calls: Vec<(BootDevice, bool)>,
        set_boot_mode_calls: Vec<BootMode>,
        detect_vendor_calls: usize,
    }

    impl Default for State {
        fn default() -> Self {
            Self {
                validate_error: None,
                boot_mode: None,
                get_boot_mode_error: None,
                supported_boot_modes: vec![BootMode::Bios, BootMode::Uefi],
                vendor: Ok(None),
                set_boot_device_calls: Vec::new(),
                set_boot_mode_calls: Vec::new(),
                detect_vendor_calls: 0,
            }
        }
    }

    /// Recording management driver for tests.
    #[derive(Clone, Default)]
    pub struct FakeManagement {
        state: Arc<Mutex<State>>,
    }

    impl FakeManagement {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_validate(&self, error: ConductorError) {
            self.state.lock().validate_error = Some(error);
        }

        pub fn set_reported_boot_mode(&self, mode: BootMode) {
            self.state.lock().boot_mode = Some(mode);
        }

        pub fn fail_get_boot_mode(&self, error: ConductorError) {
            self.state.lock().get_boot_mode_error = Some(error);
        }

        pub fn set_supported_boot_modes(&self, modes: Vec<BootMode>) {
            self.state.lock().supported_boot_modes = modes;
        }

        /// Script the `detect_vendor` outcome.
        pub fn set_vendor(&self, vendor: DriverResult<Option<String>>) {
            self.state.lock().vendor = vendor;
        }

        pub fn set_boot_device_calls(&self) -> Vec<(BootDevice, bool)> {
            self.state.lock().set_boot_device_calls.clone()
        }

        pub fn set_boot_mode_calls(&self) -> Vec<BootMode> {
            self.state.lock().set_boot_mode_calls.clone()
        }

        pub fn detect_vendor_calls(&self) -> usize {
            self.state.lock().detect_vendor_calls
        }
    }

    impl ManagementInterface for FakeManagement {
        fn validate(&self, _node: &Node) -> DriverResult<()> {
            match &self.state.lock().validate_error {
                Some(error) => Err(error.clone()),
                None => Ok(()),
            }
        }

        fn set_boot_device(
            &self,
            _node: &Node,
            device: BootDevice,
            persistent: bool,
        ) -> DriverResult<()> {
            self.state.lock().set_boot_device_calls.push((device, persistent));
            Ok(())
        }

        fn get_boot_mode(&self, _node: &Node) -> DriverResult<Option<BootMode>> {
            let state = self.state.lock();
            match &state.get_boot_mode_error {
                Some(error) => Err(error.clone()),
                None => Ok(state.boot_mode),
            }
        }

        fn get_supported_boot_modes(&self, _node: &Node) -> DriverResult<Vec<BootMode>> {
            Ok(self.state.lock().supported_boot_modes.clone())
        }

        fn set_boot_mode(&self, _node: &Node, mode: BootMode) -> DriverResult<()> {
            let mut state = self.state.lock();
            state.set_boot_mode_calls.push(mode);
            state.boot_mode = Some(mode);
            Ok(())
        }

        fn detect_vendor(&self, _node: &Node) -> DriverResult<Option<String>> {
            let mut state = self.state.lock();
            state.detect_vendor_calls += 1;
            state.vendor.clone()
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeManagement;
