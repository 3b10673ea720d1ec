//! Core engine client abstraction trait.

use async_trait::async_trait;

use crate::error::{EngineError, Result};
use crate::ids::{NetworkId, NicId, TemplateId, VmId, VnicProfileId};
use crate::params::*;
use crate::retry::RetryStrategy;
use crate::types::*;

/// Core engine client trait.
///
/// This trait defines the operation set shared by every backend: the REST
/// backend talking to a live engine and the in-memory mock. Timing aside,
/// callers should not be able to tell them apart.
///
/// Every operation takes `retries`, an override of the default retry policy.
/// An empty slice means "use the client's defaults". The mock ignores it.
#[async_trait]
pub trait EngineClient: Send + Sync {
    // =========================================================================
    // Templates
    // =========================================================================

    /// List all templates.
    async fn list_templates(&self, retries: &[RetryStrategy]) -> Result<Vec<Template>>;

    /// Get a template by ID.
    async fn get_template(&self, id: &TemplateId, retries: &[RetryStrategy]) -> Result<Template>;

    /// Create a template from an existing VM.
    async fn create_template(
        &self,
        vm_id: &VmId,
        name: &str,
        params: CreateTemplateParams,
        retries: &[RetryStrategy],
    ) -> Result<Template>;

    /// Change the name and/or description of a template.
    async fn update_template(
        &self,
        id: &TemplateId,
        params: UpdateTemplateParams,
        retries: &[RetryStrategy],
    ) -> Result<Template>;

    /// Remove a template. Fails while VMs still reference it.
    async fn remove_template(&self, id: &TemplateId, retries: &[RetryStrategy]) -> Result<()>;

    /// Find the blank template.
    ///
    /// Lists the templates and defers to [`find_blank_template`].
    async fn get_blank_template(&self, retries: &[RetryStrategy]) -> Result<Template> {
        let templates = self.list_templates(retries).await?;
        find_blank_template(&templates).cloned()
    }

    // =========================================================================
    // VMs
    // =========================================================================

    /// List all VMs.
    async fn list_vms(&self, retries: &[RetryStrategy]) -> Result<Vec<Vm>>;

    /// Get a VM by ID.
    async fn get_vm(&self, id: &VmId, retries: &[RetryStrategy]) -> Result<Vm>;

    /// Create a VM from a template.
    async fn create_vm(
        &self,
        template_id: &TemplateId,
        name: &str,
        params: CreateVmParams,
        retries: &[RetryStrategy],
    ) -> Result<Vm>;

    /// Change the name and/or comment of a VM.
    async fn update_vm(
        &self,
        id: &VmId,
        params: UpdateVmParams,
        retries: &[RetryStrategy],
    ) -> Result<Vm>;

    /// Remove a VM together with its NICs.
    async fn remove_vm(&self, id: &VmId, retries: &[RetryStrategy]) -> Result<()>;

    // =========================================================================
    // NICs
    // =========================================================================

    /// List the NICs of a VM.
    async fn list_nics(&self, vm_id: &VmId, retries: &[RetryStrategy]) -> Result<Vec<Nic>>;

    /// Get a NIC. The NIC must belong to `vm_id`.
    async fn get_nic(&self, vm_id: &VmId, nic_id: &NicId, retries: &[RetryStrategy]) -> Result<Nic>;

    /// Attach a new NIC to a VM.
    async fn create_nic(
        &self,
        vm_id: &VmId,
        name: &str,
        vnic_profile_id: &VnicProfileId,
        params: CreateNicParams,
        retries: &[RetryStrategy],
    ) -> Result<Nic>;

    /// Change the supplied fields of a NIC; unset fields are left untouched.
    async fn update_nic(
        &self,
        vm_id: &VmId,
        nic_id: &NicId,
        params: UpdateNicParams,
        retries: &[RetryStrategy],
    ) -> Result<Nic>;

    /// Detach and remove a NIC.
    async fn remove_nic(&self, vm_id: &VmId, nic_id: &NicId, retries: &[RetryStrategy]) -> Result<()>;

    // =========================================================================
    // VNIC profiles
    // =========================================================================

    /// List all VNIC profiles.
    async fn list_vnic_profiles(&self, retries: &[RetryStrategy]) -> Result<Vec<VnicProfile>>;

    /// Get a VNIC profile by ID.
    async fn get_vnic_profile(
        &self,
        id: &VnicProfileId,
        retries: &[RetryStrategy],
    ) -> Result<VnicProfile>;

    /// Create a VNIC profile on an existing network.
    async fn create_vnic_profile(
        &self,
        name: &str,
        network_id: &NetworkId,
        params: CreateVnicProfileParams,
        retries: &[RetryStrategy],
    ) -> Result<VnicProfile>;

    /// Remove a VNIC profile. Fails while NICs still use it.
    async fn remove_vnic_profile(&self, id: &VnicProfileId, retries: &[RetryStrategy]) -> Result<()>;

    // =========================================================================
    // Networks
    // =========================================================================

    /// List all networks.
    async fn list_networks(&self, retries: &[RetryStrategy]) -> Result<Vec<Network>>;

    /// Get a network by ID.
    async fn get_network(&self, id: &NetworkId, retries: &[RetryStrategy]) -> Result<Network>;

    /// Create a logical network.
    async fn create_network(
        &self,
        name: &str,
        params: CreateNetworkParams,
        retries: &[RetryStrategy],
    ) -> Result<Network>;

    /// Remove a network. Fails while VNIC profiles still reference it.
    async fn remove_network(&self, id: &NetworkId, retries: &[RetryStrategy]) -> Result<()>;
}

/// Pick the blank template out of a template list.
///
/// The well-known blank ID wins over the blank flag; among flagged templates
/// the first one in list order is returned.
pub fn find_blank_template(templates: &[Template]) -> Result<&Template> {
    templates
        .iter()
        .find(|t| t.is_well_known_blank())
        .or_else(|| templates.iter().find(|t| t.is_blank()))
        .ok_or_else(|| EngineError::NotFound("No blank template found".to_string()))
}
