//! Remote representations of engine entities and their conversions.
//!
//! The engine's JSON objects use nested links (`"vm": {"id": "..."}`) for
//! references. Every field is optional on the wire; conversion into an entity
//! fails with a protocol violation when a required one is missing.

use serde::{Deserialize, Serialize};

use crate::error::{field_not_found, Result};
use crate::ids::{NetworkId, NicId, TemplateId, VmId, VnicProfileId};
use crate::types::*;

/// Reference to another entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkLink {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl SdkLink {
    pub fn to(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()) }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkMac {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

fn required<T>(value: Option<T>, object: &str, field: &str) -> Result<T> {
    value.ok_or_else(|| field_not_found(object, field))
}

fn link_id(link: Option<SdkLink>, object: &str, field: &str) -> Result<String> {
    required(link.and_then(|l| l.id), object, field)
}

// =============================================================================
// NIC
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkNic {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vm: Option<SdkLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vnic_profile: Option<SdkLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<SdkMac>,
}

impl SdkNic {
    /// Convert into a NIC. `vm_id` is used when the engine omits the VM link.
    pub fn into_nic(self, vm_id: &VmId) -> Result<Nic> {
        let id = required(self.id, "NIC", "id")?;
        let name = required(self.name, "NIC", "name")?;
        let profile = link_id(self.vnic_profile, "NIC", "vnic_profile")?;
        let vm = self
            .vm
            .and_then(|l| l.id)
            .map(VmId::from)
            .unwrap_or_else(|| vm_id.clone());
        let mac = self.mac.and_then(|m| m.address).unwrap_or_default();

        Ok(Nic::new(NicId::from(id), vm, name, VnicProfileId::from(profile), mac))
    }
}

// =============================================================================
// TEMPLATE
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkTemplate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Source VM, only used when creating a template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vm: Option<SdkLink>,
}

impl SdkTemplate {
    pub fn into_template(self) -> Result<Template> {
        let id = required(self.id, "template", "id")?;
        let name = required(self.name, "template", "name")?;
        let blank = id == BLANK_TEMPLATE_ID || name == BLANK_TEMPLATE_NAME;

        Ok(Template::new(TemplateId::from(id), name, self.description.unwrap_or_default())
            .with_blank(blank))
    }
}

// =============================================================================
// VM
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkVm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<SdkLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl SdkVm {
    pub fn into_vm(self) -> Result<Vm> {
        let id = required(self.id, "VM", "id")?;
        let name = required(self.name, "VM", "name")?;
        let template = link_id(self.template, "VM", "template")?;
        let status = self
            .status
            .as_deref()
            .map(VmStatus::from_engine)
            .unwrap_or(VmStatus::Unknown);

        Ok(Vm::new(VmId::from(id), name, TemplateId::from(template))
            .with_comment(self.comment.unwrap_or_default())
            .with_status(status))
    }
}

// =============================================================================
// VNIC PROFILE
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkVnicProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<SdkLink>,
}

impl SdkVnicProfile {
    pub fn into_vnic_profile(self) -> Result<VnicProfile> {
        let id = required(self.id, "VNIC profile", "id")?;
        let name = required(self.name, "VNIC profile", "name")?;
        let network = link_id(self.network, "VNIC profile", "network")?;

        Ok(VnicProfile::new(
            VnicProfileId::from(id),
            name,
            NetworkId::from(network),
            self.description.unwrap_or_default(),
        ))
    }
}

// =============================================================================
// NETWORK
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkNetwork {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SdkNetwork {
    pub fn into_network(self) -> Result<Network> {
        let id = required(self.id, "network", "id")?;
        let name = required(self.name, "network", "name")?;

        Ok(Network::new(NetworkId::from(id), name, self.description.unwrap_or_default()))
    }
}
