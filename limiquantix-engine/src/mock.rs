//! Mock engine backend for testing and development.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::{lock_poisoned, EngineError, Result};
use crate::ids::{NetworkId, NicId, TemplateId, VmId, VnicProfileId};
use crate::mac::MacAddress;
use crate::params::*;
use crate::retry::RetryStrategy;
use crate::traits::EngineClient;
use crate::types::*;

/// Name of the management network a fresh engine comes with.
pub const DEFAULT_NETWORK_NAME: &str = "ovirtmgmt";

/// Mock engine backend.
///
/// Replicates the engine's externally observable behavior in memory,
/// including the referential checks the engine performs server-side.
/// Useful for:
/// - Unit and integration testing
/// - Development without a reachable engine
/// - Demo environments
///
/// All state lives in one store behind one mutex. Every operation
/// holds the lock for its whole body, so operations are totally ordered.
pub struct MockBackend {
    store: Mutex<MockStore>,
}

impl MockBackend {
    /// Create a mock seeded like a freshly installed engine: the blank
    /// template plus the management network and its VNIC profile.
    pub fn new() -> Self {
        info!("Creating mock engine backend");
        Self {
            store: Mutex::new(MockStore::seeded()),
        }
    }

    /// Create a mock with no entities at all.
    pub fn empty() -> Self {
        Self {
            store: Mutex::new(MockStore::default()),
        }
    }

    fn store(&self) -> Result<MutexGuard<'_, MockStore>> {
        self.store.lock().map_err(|_| lock_poisoned())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// STORE
// =============================================================================

/// In-memory registry of every entity kind.
///
/// Maps are ordered by identifier, which makes list order deterministic.
#[derive(Debug, Default)]
pub(crate) struct MockStore {
    templates: BTreeMap<TemplateId, Template>,
    vms: BTreeMap<VmId, Vm>,
    nics: BTreeMap<NicId, Nic>,
    vnic_profiles: BTreeMap<VnicProfileId, VnicProfile>,
    networks: BTreeMap<NetworkId, Network>,
}

/// Fresh UUID that is not yet a key of `registry`.
fn fresh_id<K: Ord + From<String>, V>(registry: &BTreeMap<K, V>) -> K {
    loop {
        let id = K::from(Uuid::new_v4().to_string());
        if !registry.contains_key(&id) {
            return id;
        }
    }
}

impl MockStore {
    fn seeded() -> Self {
        let mut store = Self::default();

        let blank_id = TemplateId::new(BLANK_TEMPLATE_ID);
        store.templates.insert(
            blank_id.clone(),
            Template::new(blank_id, BLANK_TEMPLATE_NAME, "Blank template").with_blank(true),
        );

        let network_id: NetworkId = fresh_id(&store.networks);
        store.networks.insert(
            network_id.clone(),
            Network::new(network_id.clone(), DEFAULT_NETWORK_NAME, "Management Network"),
        );

        let profile_id: VnicProfileId = fresh_id(&store.vnic_profiles);
        store.vnic_profiles.insert(
            profile_id.clone(),
            VnicProfile::new(profile_id, DEFAULT_NETWORK_NAME, network_id, ""),
        );

        store
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    fn template(&self, id: &TemplateId) -> Result<&Template> {
        self.templates
            .get(id)
            .ok_or_else(|| EngineError::NotFound(format!("Template {} not found", id)))
    }

    fn vm(&self, id: &VmId) -> Result<&Vm> {
        self.vms
            .get(id)
            .ok_or_else(|| EngineError::NotFound(format!("VM {} not found", id)))
    }

    /// A NIC only resolves under the VM that owns it.
    fn nic(&self, vm_id: &VmId, nic_id: &NicId) -> Result<&Nic> {
        self.nics
            .get(nic_id)
            .filter(|nic| nic.vm_id() == vm_id)
            .ok_or_else(|| EngineError::NotFound(format!("NIC {} not found on VM {}", nic_id, vm_id)))
    }

    fn vnic_profile(&self, id: &VnicProfileId) -> Result<&VnicProfile> {
        self.vnic_profiles
            .get(id)
            .ok_or_else(|| EngineError::NotFound(format!("VNIC profile {} not found", id)))
    }

    fn network(&self, id: &NetworkId) -> Result<&Network> {
        self.networks
            .get(id)
            .ok_or_else(|| EngineError::NotFound(format!("Network {} not found", id)))
    }

    // -------------------------------------------------------------------------
    // Templates
    // -------------------------------------------------------------------------

    fn check_template_name(&self, name: &str, except: Option<&TemplateId>) -> Result<()> {
        let taken = self
            .templates
            .values()
            .any(|t| t.name() == name && Some(t.id()) != except);
        if taken {
            return Err(EngineError::Conflict(format!("Template name {} is already in use", name)));
        }
        Ok(())
    }

    pub(crate) fn create_template(
        &mut self,
        vm_id: &VmId,
        name: &str,
        params: &CreateTemplateParams,
    ) -> Result<Template> {
        params.validate(name)?;
        self.vm(vm_id)?;
        self.check_template_name(name, None)?;

        let id: TemplateId = fresh_id(&self.templates);
        let template = Template::new(id.clone(), name, params.description().unwrap_or_default());
        self.templates.insert(id, template.clone());
        Ok(template)
    }

    pub(crate) fn update_template(&mut self, id: &TemplateId, params: &UpdateTemplateParams) -> Result<Template> {
        params.validate()?;
        let mut template = self.template(id)?.clone();

        if let Some(name) = params.name() {
            self.check_template_name(name, Some(id))?;
            template = template.with_name(name);
        }
        if let Some(description) = params.description() {
            template = template.with_description(description);
        }

        self.templates.insert(id.clone(), template.clone());
        Ok(template)
    }

    pub(crate) fn remove_template(&mut self, id: &TemplateId) -> Result<()> {
        let template = self.template(id)?;
        if template.is_well_known_blank() {
            return Err(EngineError::ValidationFailed(
                "The blank template cannot be removed".to_string(),
            ));
        }
        if let Some(vm) = self.vms.values().find(|vm| vm.template_id() == id) {
            return Err(EngineError::Conflict(format!(
                "Template {} is used by VM {}",
                id,
                vm.id()
            )));
        }
        self.templates.remove(id);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // VMs
    // -------------------------------------------------------------------------

    fn check_vm_name(&self, name: &str, except: Option<&VmId>) -> Result<()> {
        let taken = self
            .vms
            .values()
            .any(|vm| vm.name() == name && Some(vm.id()) != except);
        if taken {
            return Err(EngineError::Conflict(format!("VM name {} is already in use", name)));
        }
        Ok(())
    }

    pub(crate) fn create_vm(&mut self, template_id: &TemplateId, name: &str, params: &CreateVmParams) -> Result<Vm> {
        params.validate(name)?;
        self.template(template_id)?;
        self.check_vm_name(name, None)?;

        let id: VmId = fresh_id(&self.vms);
        let vm = Vm::new(id.clone(), name, template_id.clone())
            .with_comment(params.comment().unwrap_or_default());
        self.vms.insert(id, vm.clone());
        Ok(vm)
    }

    pub(crate) fn update_vm(&mut self, id: &VmId, params: &UpdateVmParams) -> Result<Vm> {
        params.validate()?;
        let mut vm = self.vm(id)?.clone();

        if let Some(name) = params.name() {
            self.check_vm_name(name, Some(id))?;
            vm = vm.with_name(name);
        }
        if let Some(comment) = params.comment() {
            vm = vm.with_comment(comment);
        }

        self.vms.insert(id.clone(), vm.clone());
        Ok(vm)
    }

    pub(crate) fn remove_vm(&mut self, id: &VmId) -> Result<()> {
        self.vm(id)?;
        self.nics.retain(|_, nic| nic.vm_id() != id);
        self.vms.remove(id);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // NICs
    // -------------------------------------------------------------------------

    fn check_nic_name(&self, vm_id: &VmId, name: &str, except: Option<&NicId>) -> Result<()> {
        let taken = self
            .nics
            .values()
            .any(|nic| nic.vm_id() == vm_id && nic.name() == name && Some(nic.id()) != except);
        if taken {
            return Err(EngineError::Conflict(format!(
                "NIC name {} is already in use on VM {}",
                name, vm_id
            )));
        }
        Ok(())
    }

    pub(crate) fn list_nics(&self, vm_id: &VmId) -> Result<Vec<Nic>> {
        self.vm(vm_id)?;
        Ok(self
            .nics
            .values()
            .filter(|nic| nic.vm_id() == vm_id)
            .cloned()
            .collect())
    }

    pub(crate) fn create_nic(
        &mut self,
        vm_id: &VmId,
        name: &str,
        vnic_profile_id: &VnicProfileId,
        params: &CreateNicParams,
    ) -> Result<Nic> {
        let mac = params.validate(name)?;
        self.vm(vm_id)?;
        self.vnic_profile(vnic_profile_id)?;
        self.check_nic_name(vm_id, name, None)?;

        let mac = mac.unwrap_or_else(MacAddress::random_local);
        let id: NicId = fresh_id(&self.nics);
        let nic = Nic::new(
            id.clone(),
            vm_id.clone(),
            name,
            vnic_profile_id.clone(),
            mac.to_string(),
        );
        self.nics.insert(id, nic.clone());
        Ok(nic)
    }

    /// Apply the supplied fields to a NIC.
    ///
    /// Every field is checked before the new snapshot is written, so a
    /// rejected update leaves the stored NIC untouched.
    pub(crate) fn update_nic(&mut self, vm_id: &VmId, nic_id: &NicId, params: &UpdateNicParams) -> Result<Nic> {
        let mut nic = self.nic(vm_id, nic_id)?.clone();
        let mac = params.validate()?;

        if let Some(name) = params.name() {
            self.check_nic_name(vm_id, name, Some(nic_id))?;
            nic = nic.with_name(name);
        }
        if let Some(profile_id) = params.vnic_profile_id() {
            self.vnic_profile(profile_id)?;
            nic = nic.with_vnic_profile_id(profile_id.clone());
        }
        if let Some(mac) = mac {
            nic = nic.with_mac(mac.to_string());
        }

        self.nics.insert(nic_id.clone(), nic.clone());
        Ok(nic)
    }

    pub(crate) fn remove_nic(&mut self, vm_id: &VmId, nic_id: &NicId) -> Result<()> {
        self.nic(vm_id, nic_id)?;
        self.nics.remove(nic_id);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // VNIC profiles
    // -------------------------------------------------------------------------

    pub(crate) fn create_vnic_profile(
        &mut self,
        name: &str,
        network_id: &NetworkId,
        params: &CreateVnicProfileParams,
    ) -> Result<VnicProfile> {
        params.validate(name, network_id.as_str())?;
        self.network(network_id)?;

        let taken = self
            .vnic_profiles
            .values()
            .any(|p| p.network_id() == network_id && p.name() == name);
        if taken {
            return Err(EngineError::Conflict(format!(
                "VNIC profile name {} is already in use on network {}",
                name, network_id
            )));
        }

        let id: VnicProfileId = fresh_id(&self.vnic_profiles);
        let profile = VnicProfile::new(
            id.clone(),
            name,
            network_id.clone(),
            params.description().unwrap_or_default(),
        );
        self.vnic_profiles.insert(id, profile.clone());
        Ok(profile)
    }

    pub(crate) fn remove_vnic_profile(&mut self, id: &VnicProfileId) -> Result<()> {
        self.vnic_profile(id)?;
        if let Some(nic) = self.nics.values().find(|nic| nic.vnic_profile_id() == id) {
            return Err(EngineError::Conflict(format!(
                "VNIC profile {} is used by NIC {} on VM {}",
                id,
                nic.id(),
                nic.vm_id()
            )));
        }
        self.vnic_profiles.remove(id);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Networks
    // -------------------------------------------------------------------------

    pub(crate) fn create_network(&mut self, name: &str, params: &CreateNetworkParams) -> Result<Network> {
        params.validate(name)?;
        if self.networks.values().any(|n| n.name() == name) {
            return Err(EngineError::Conflict(format!("Network name {} is already in use", name)));
        }

        let id: NetworkId = fresh_id(&self.networks);
        let network = Network::new(id.clone(), name, params.description().unwrap_or_default());
        self.networks.insert(id, network.clone());
        Ok(network)
    }

    pub(crate) fn remove_network(&mut self, id: &NetworkId) -> Result<()> {
        self.network(id)?;
        if let Some(profile) = self.vnic_profiles.values().find(|p| p.network_id() == id) {
            return Err(EngineError::Conflict(format!(
                "Network {} is used by VNIC profile {}",
                id,
                profile.id()
            )));
        }
        self.networks.remove(id);
        Ok(())
    }
}

// =============================================================================
// CLIENT
// =============================================================================

#[async_trait]
impl EngineClient for MockBackend {
    async fn list_templates(&self, _retries: &[RetryStrategy]) -> Result<Vec<Template>> {
        let store = self.store()?;
        let templates: Vec<Template> = store.templates.values().cloned().collect();
        debug!(count = templates.len(), "Listed templates");
        Ok(templates)
    }

    async fn get_template(&self, id: &TemplateId, _retries: &[RetryStrategy]) -> Result<Template> {
        self.store()?.template(id).cloned()
    }

    #[instrument(skip(self, params, _retries), fields(vm_id = %vm_id))]
    async fn create_template(
        &self,
        vm_id: &VmId,
        name: &str,
        params: CreateTemplateParams,
        _retries: &[RetryStrategy],
    ) -> Result<Template> {
        let template = self.store()?.create_template(vm_id, name, &params)?;
        info!(template_id = %template.id(), "Mock template created");
        Ok(template)
    }

    #[instrument(skip(self, params, _retries), fields(template_id = %id))]
    async fn update_template(
        &self,
        id: &TemplateId,
        params: UpdateTemplateParams,
        _retries: &[RetryStrategy],
    ) -> Result<Template> {
        self.store()?.update_template(id, &params)
    }

    #[instrument(skip(self, _retries), fields(template_id = %id))]
    async fn remove_template(&self, id: &TemplateId, _retries: &[RetryStrategy]) -> Result<()> {
        self.store()?.remove_template(id)?;
        info!("Mock template removed");
        Ok(())
    }

    async fn list_vms(&self, _retries: &[RetryStrategy]) -> Result<Vec<Vm>> {
        let store = self.store()?;
        let vms: Vec<Vm> = store.vms.values().cloned().collect();
        debug!(count = vms.len(), "Listed VMs");
        Ok(vms)
    }

    async fn get_vm(&self, id: &VmId, _retries: &[RetryStrategy]) -> Result<Vm> {
        self.store()?.vm(id).cloned()
    }

    #[instrument(skip(self, params, _retries), fields(template_id = %template_id))]
    async fn create_vm(
        &self,
        template_id: &TemplateId,
        name: &str,
        params: CreateVmParams,
        _retries: &[RetryStrategy],
    ) -> Result<Vm> {
        let vm = self.store()?.create_vm(template_id, name, &params)?;
        info!(vm_id = %vm.id(), "Mock VM created");
        Ok(vm)
    }

    #[instrument(skip(self, params, _retries), fields(vm_id = %id))]
    async fn update_vm(&self, id: &VmId, params: UpdateVmParams, _retries: &[RetryStrategy]) -> Result<Vm> {
        self.store()?.update_vm(id, &params)
    }

    #[instrument(skip(self, _retries), fields(vm_id = %id))]
    async fn remove_vm(&self, id: &VmId, _retries: &[RetryStrategy]) -> Result<()> {
        self.store()?.remove_vm(id)?;
        info!("Mock VM removed");
        Ok(())
    }

    async fn list_nics(&self, vm_id: &VmId, _retries: &[RetryStrategy]) -> Result<Vec<Nic>> {
        self.store()?.list_nics(vm_id)
    }

    async fn get_nic(&self, vm_id: &VmId, nic_id: &NicId, _retries: &[RetryStrategy]) -> Result<Nic> {
        self.store()?.nic(vm_id, nic_id).cloned()
    }

    #[instrument(skip(self, params, _retries), fields(vm_id = %vm_id, vnic_profile_id = %vnic_profile_id))]
    async fn create_nic(
        &self,
        vm_id: &VmId,
        name: &str,
        vnic_profile_id: &VnicProfileId,
        params: CreateNicParams,
        _retries: &[RetryStrategy],
    ) -> Result<Nic> {
        let nic = self.store()?.create_nic(vm_id, name, vnic_profile_id, &params)?;
        info!(nic_id = %nic.id(), mac = %nic.mac(), "Mock NIC created");
        Ok(nic)
    }

    #[instrument(skip(self, params, _retries), fields(vm_id = %vm_id, nic_id = %nic_id))]
    async fn update_nic(
        &self,
        vm_id: &VmId,
        nic_id: &NicId,
        params: UpdateNicParams,
        _retries: &[RetryStrategy],
    ) -> Result<Nic> {
        let nic = self.store()?.update_nic(vm_id, nic_id, &params)?;
        debug!("Mock NIC updated");
        Ok(nic)
    }

    #[instrument(skip(self, _retries), fields(vm_id = %vm_id, nic_id = %nic_id))]
    async fn remove_nic(&self, vm_id: &VmId, nic_id: &NicId, _retries: &[RetryStrategy]) -> Result<()> {
        self.store()?.remove_nic(vm_id, nic_id)?;
        info!("Mock NIC removed");
        Ok(())
    }

    async fn list_vnic_profiles(&self, _retries: &[RetryStrategy]) -> Result<Vec<VnicProfile>> {
        let store = self.store()?;
        Ok(store.vnic_profiles.values().cloned().collect())
    }

    async fn get_vnic_profile(&self, id: &VnicProfileId, _retries: &[RetryStrategy]) -> Result<VnicProfile> {
        self.store()?.vnic_profile(id).cloned()
    }

    #[instrument(skip(self, params, _retries), fields(network_id = %network_id))]
    async fn create_vnic_profile(
        &self,
        name: &str,
        network_id: &NetworkId,
        params: CreateVnicProfileParams,
        _retries: &[RetryStrategy],
    ) -> Result<VnicProfile> {
        let profile = self.store()?.create_vnic_profile(name, network_id, &params)?;
        info!(vnic_profile_id = %profile.id(), "Mock VNIC profile created");
        Ok(profile)
    }

    #[instrument(skip(self, _retries), fields(vnic_profile_id = %id))]
    async fn remove_vnic_profile(&self, id: &VnicProfileId, _retries: &[RetryStrategy]) -> Result<()> {
        self.store()?.remove_vnic_profile(id)?;
        info!("Mock VNIC profile removed");
        Ok(())
    }

    async fn list_networks(&self, _retries: &[RetryStrategy]) -> Result<Vec<Network>> {
        let store = self.store()?;
        Ok(store.networks.values().cloned().collect())
    }

    async fn get_network(&self, id: &NetworkId, _retries: &[RetryStrategy]) -> Result<Network> {
        self.store()?.network(id).cloned()
    }

    #[instrument(skip(self, params, _retries))]
    async fn create_network(
        &self,
        name: &str,
        params: CreateNetworkParams,
        _retries: &[RetryStrategy],
    ) -> Result<Network> {
        let network = self.store()?.create_network(name, &params)?;
        info!(network_id = %network.id(), "Mock network created");
        Ok(network)
    }

    #[instrument(skip(self, _retries), fields(network_id = %id))]
    async fn remove_network(&self, id: &NetworkId, _retries: &[RetryStrategy]) -> Result<()> {
        self.store()?.remove_network(id)?;
        info!("Mock network removed");
        Ok(())
    }
}
