//! Entity snapshots returned by both backends.
//!
//! Entities are immutable values. Mutating operations return a new snapshot;
//! nothing here holds a reference back to the client (see [`crate::facade`]
//! for the helpers that route through one).

use serde::{Deserialize, Serialize};

use crate::ids::{NetworkId, NicId, TemplateId, VmId, VnicProfileId};

/// Well-known identifier of the engine's blank template.
pub const BLANK_TEMPLATE_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Name the engine gives its blank template.
pub const BLANK_TEMPLATE_NAME: &str = "Blank";

// =============================================================================
// TEMPLATE
// =============================================================================

/// A VM template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    id: TemplateId,
    name: String,
    description: String,
    blank: bool,
}

impl Template {
    pub(crate) fn new(id: TemplateId, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            blank: false,
        }
    }

    pub(crate) fn with_blank(mut self, blank: bool) -> Self {
        self.blank = blank;
        self
    }

    pub(crate) fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub(crate) fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn id(&self) -> &TemplateId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether the template is flagged as a blank template.
    pub fn is_blank(&self) -> bool {
        self.blank
    }

    /// Whether this is the engine's well-known blank template.
    pub fn is_well_known_blank(&self) -> bool {
        self.id.as_str() == BLANK_TEMPLATE_ID
    }
}

// =============================================================================
// VM
// =============================================================================

/// VM power state as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VmStatus {
    Down,
    Up,
    PoweringUp,
    PoweringDown,
    ImageLocked,
    Unknown,
}

impl VmStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VmStatus::Down => "down",
            VmStatus::Up => "up",
            VmStatus::PoweringUp => "powering_up",
            VmStatus::PoweringDown => "powering_down",
            VmStatus::ImageLocked => "image_locked",
            VmStatus::Unknown => "unknown",
        }
    }

    /// Parse the engine's status string. Anything unrecognised maps to `Unknown`.
    pub fn from_engine(status: &str) -> Self {
        match status {
            "down" => VmStatus::Down,
            "up" => VmStatus::Up,
            "powering_up" => VmStatus::PoweringUp,
            "powering_down" => VmStatus::PoweringDown,
            "image_locked" => VmStatus::ImageLocked,
            _ => VmStatus::Unknown,
        }
    }
}

/// A virtual machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vm {
    id: VmId,
    name: String,
    comment: String,
    template_id: TemplateId,
    status: VmStatus,
}

impl Vm {
    pub(crate) fn new(id: VmId, name: impl Into<String>, template_id: TemplateId) -> Self {
        Self {
            id,
            name: name.into(),
            comment: String::new(),
            template_id,
            status: VmStatus::Down,
        }
    }

    pub(crate) fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub(crate) fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub(crate) fn with_status(mut self, status: VmStatus) -> Self {
        self.status = status;
        self
    }

    pub fn id(&self) -> &VmId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Template the VM was created from.
    pub fn template_id(&self) -> &TemplateId {
        &self.template_id
    }

    pub fn status(&self) -> VmStatus {
        self.status
    }
}

// =============================================================================
// NIC
// =============================================================================

/// A network interface attached to a VM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Nic {
    id: NicId,
    vm_id: VmId,
    name: String,
    vnic_profile_id: VnicProfileId,
    mac: String,
}

impl Nic {
    pub(crate) fn new(
        id: NicId,
        vm_id: VmId,
        name: impl Into<String>,
        vnic_profile_id: VnicProfileId,
        mac: impl Into<String>,
    ) -> Self {
        Self {
            id,
            vm_id,
            name: name.into(),
            vnic_profile_id,
            mac: mac.into(),
        }
    }

    pub(crate) fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub(crate) fn with_vnic_profile_id(mut self, vnic_profile_id: VnicProfileId) -> Self {
        self.vnic_profile_id = vnic_profile_id;
        self
    }

    pub(crate) fn with_mac(mut self, mac: impl Into<String>) -> Self {
        self.mac = mac.into();
        self
    }

    pub fn id(&self) -> &NicId {
        &self.id
    }

    /// VM owning this NIC.
    pub fn vm_id(&self) -> &VmId {
        &self.vm_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vnic_profile_id(&self) -> &VnicProfileId {
        &self.vnic_profile_id
    }

    /// MAC address in lowercase colon notation.
    pub fn mac(&self) -> &str {
        &self.mac
    }
}

// =============================================================================
// VNIC PROFILE
// =============================================================================

/// A VNIC profile, binding NICs to a logical network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VnicProfile {
    id: VnicProfileId,
    name: String,
    network_id: NetworkId,
    description: String,
}

impl VnicProfile {
    pub(crate) fn new(
        id: VnicProfileId,
        name: impl Into<String>,
        network_id: NetworkId,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            network_id,
            description: description.into(),
        }
    }

    pub fn id(&self) -> &VnicProfileId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn network_id(&self) -> &NetworkId {
        &self.network_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

// =============================================================================
// NETWORK
// =============================================================================

/// A logical network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Network {
    id: NetworkId,
    name: String,
    description: String,
}

impl Network {
    pub(crate) fn new(id: NetworkId, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
        }
    }

    pub fn id(&self) -> &NetworkId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}
