//! Per-operation parameter objects.
//!
//! Every optional field is an `Option`: `None` means "not supplied" and is
//! never confused with an empty string. Each object validates itself; both
//! backends call `validate()` before touching the store or the network.

use crate::error::{EngineError, Result};
use crate::ids::VnicProfileId;
use crate::mac::MacAddress;

fn require_name(what: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(EngineError::ValidationFailed(format!("{} name must not be empty", what)));
    }
    Ok(())
}

fn optional_name(what: &str, name: Option<&str>) -> Result<()> {
    match name {
        Some(name) => require_name(what, name),
        None => Ok(()),
    }
}

fn optional_mac(mac: Option<&str>) -> Result<Option<MacAddress>> {
    mac.map(str::parse::<MacAddress>).transpose()
}

// =============================================================================
// NIC
// =============================================================================

/// Optional parameters for NIC creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateNicParams {
    mac: Option<String>,
}

impl CreateNicParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mac(mut self, mac: impl Into<String>) -> Self {
        self.mac = Some(mac.into());
        self
    }

    pub fn mac(&self) -> Option<&str> {
        self.mac.as_deref()
    }

    /// Validate the NIC name and optional MAC; returns the parsed MAC if one was supplied.
    pub fn validate(&self, name: &str) -> Result<Option<MacAddress>> {
        require_name("NIC", name)?;
        optional_mac(self.mac())
    }
}

/// Fields to change on an existing NIC. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateNicParams {
    name: Option<String>,
    vnic_profile_id: Option<VnicProfileId>,
    mac: Option<String>,
}

impl UpdateNicParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_vnic_profile_id(mut self, id: impl Into<VnicProfileId>) -> Self {
        self.vnic_profile_id = Some(id.into());
        self
    }

    pub fn with_mac(mut self, mac: impl Into<String>) -> Self {
        self.mac = Some(mac.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn vnic_profile_id(&self) -> Option<&VnicProfileId> {
        self.vnic_profile_id.as_ref()
    }

    pub fn mac(&self) -> Option<&str> {
        self.mac.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.vnic_profile_id.is_none() && self.mac.is_none()
    }

    /// Syntactic checks only; profile existence is the backend's job.
    pub fn validate(&self) -> Result<Option<MacAddress>> {
        optional_name("NIC", self.name())?;
        optional_mac(self.mac())
    }
}

// =============================================================================
// VNIC PROFILE
// =============================================================================

/// Optional parameters for VNIC profile creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateVnicProfileParams {
    description: Option<String>,
}

impl CreateVnicProfileParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn validate(&self, name: &str, network_id: &str) -> Result<()> {
        require_name("VNIC profile", name)?;
        if network_id.trim().is_empty() {
            return Err(EngineError::ValidationFailed(
                "VNIC profile network ID must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// NETWORK
// =============================================================================

/// Optional parameters for network creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateNetworkParams {
    description: Option<String>,
}

impl CreateNetworkParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn validate(&self, name: &str) -> Result<()> {
        require_name("Network", name)
    }
}

// =============================================================================
// VM
// =============================================================================

/// Optional parameters for VM creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateVmParams {
    comment: Option<String>,
}

impl CreateVmParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn validate(&self, name: &str) -> Result<()> {
        require_name("VM", name)
    }
}

/// Fields to change on an existing VM.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateVmParams {
    name: Option<String>,
    comment: Option<String>,
}

impl UpdateVmParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn validate(&self) -> Result<()> {
        optional_name("VM", self.name())
    }
}

// =============================================================================
// TEMPLATE
// =============================================================================

/// Optional parameters for template creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTemplateParams {
    description: Option<String>,
}

impl CreateTemplateParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn validate(&self, name: &str) -> Result<()> {
        require_name("Template", name)
    }
}

/// Fields to change on an existing template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTemplateParams {
    name: Option<String>,
    description: Option<String>,
}

impl UpdateTemplateParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn validate(&self) -> Result<()> {
        optional_name("Template", self.name())
    }
}
