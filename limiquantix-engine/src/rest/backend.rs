//! REST backend implementation.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::connection::{Connection, EngineRequest, EngineResponse, Resource, RestConnection};
use super::sdk::*;
use crate::config::{EngineConfig, RetryConfig};
use crate::error::{field_not_found, EngineError, Result};
use crate::ids::{NetworkId, NicId, TemplateId, VmId, VnicProfileId};
use crate::params::*;
use crate::retry::{retry, strategies_or, DiagnosticSink, RetryStrategy, TracingSink};
use crate::traits::EngineClient;
use crate::types::*;

/// REST engine backend.
///
/// Holds no mutable state: every call builds an independent request, so the
/// backend can be shared freely between tasks.
pub struct RestBackend {
    connection: Arc<dyn Connection>,
    sink: Arc<dyn DiagnosticSink>,
    read_retries: Vec<RetryStrategy>,
    write_retries: Vec<RetryStrategy>,
}

impl RestBackend {
    /// Create a backend talking HTTP to `config.url`.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let connection = RestConnection::new(config)?;
        Ok(Self::with_connection(Arc::new(connection), &config.retry))
    }

    /// Create a backend on top of an arbitrary connection.
    pub fn with_connection(connection: Arc<dyn Connection>, retry: &RetryConfig) -> Self {
        Self {
            connection,
            sink: Arc::new(TracingSink),
            read_retries: retry.read_defaults(),
            write_retries: retry.write_defaults(),
        }
    }

    /// Send retry diagnostics somewhere other than `tracing`.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    async fn read<T, F>(
        &self,
        operation: &str,
        retries: &[RetryStrategy],
        request: EngineRequest,
        convert: F,
    ) -> Result<T>
    where
        T: Send,
        F: Fn(EngineResponse) -> Result<T> + Send + Sync,
    {
        let strategies = strategies_or(retries, &self.read_retries);
        self.execute(operation, strategies, request, convert).await
    }

    async fn write<T, F>(
        &self,
        operation: &str,
        retries: &[RetryStrategy],
        request: EngineRequest,
        convert: F,
    ) -> Result<T>
    where
        T: Send,
        F: Fn(EngineResponse) -> Result<T> + Send + Sync,
    {
        let strategies = strategies_or(retries, &self.write_retries);
        self.execute(operation, strategies, request, convert).await
    }

    /// Send `request` under the retry engine and convert the response.
    async fn execute<T, F>(
        &self,
        operation: &str,
        strategies: &[RetryStrategy],
        request: EngineRequest,
        convert: F,
    ) -> Result<T>
    where
        T: Send,
        F: Fn(EngineResponse) -> Result<T> + Send + Sync,
    {
        let connection = self.connection.as_ref();
        let request = &request;
        let convert = &convert;

        retry(operation, self.sink.as_ref(), strategies, move || {
            let request = request.clone();
            async move {
                let response = connection
                    .send(request)
                    .await
                    .map_err(|e| EngineError::from(e).context(format!("Failed {}", operation)))?;
                convert(response)
            }
        })
        .await
    }
}

fn body<T: Serialize>(object: &T) -> Result<Value> {
    serde_json::to_value(object)
        .map_err(|e| EngineError::Internal(format!("Failed to encode request body: {}", e)))
}

/// The entity embedded in a response; its absence is a protocol violation.
fn single<T: DeserializeOwned>(response: &EngineResponse, object: &str, field: &str) -> Result<T> {
    response
        .entity::<T>()?
        .ok_or_else(|| field_not_found(object, field))
}

fn many<T: DeserializeOwned>(response: &EngineResponse, field: &str) -> Result<Vec<T>> {
    Ok(response.list::<T>(field)?)
}

/// A NIC the engine reports under another VM does not exist on `vm_id`.
fn owned_by(nic: Nic, vm_id: &VmId) -> Result<Nic> {
    if nic.vm_id() != vm_id {
        return Err(EngineError::NotFound(format!(
            "NIC {} not found on VM {}",
            nic.id(),
            vm_id
        )));
    }
    Ok(nic)
}

fn single_nic(response: &EngineResponse, object: &str, vm_id: &VmId) -> Result<Nic> {
    owned_by(single::<SdkNic>(response, object, "NIC")?.into_nic(vm_id)?, vm_id)
}

#[async_trait]
impl EngineClient for RestBackend {
    // =========================================================================
    // Templates
    // =========================================================================

    async fn list_templates(&self, retries: &[RetryStrategy]) -> Result<Vec<Template>> {
        let templates: Vec<Template> = self
            .read(
                "listing templates",
                retries,
                EngineRequest::get(Resource::Templates),
                |response| {
                    many::<SdkTemplate>(&response, "template")?
                        .into_iter()
                        .map(SdkTemplate::into_template)
                        .collect()
                },
            )
            .await?;
        debug!(count = templates.len(), "Listed templates");
        Ok(templates)
    }

    async fn get_template(&self, id: &TemplateId, retries: &[RetryStrategy]) -> Result<Template> {
        self.read(
            &format!("getting template {}", id),
            retries,
            EngineRequest::get(Resource::Template(id.clone())),
            |response| single::<SdkTemplate>(&response, "template response", "template")?.into_template(),
        )
        .await
    }

    #[instrument(skip(self, params, retries), fields(vm_id = %vm_id))]
    async fn create_template(
        &self,
        vm_id: &VmId,
        name: &str,
        params: CreateTemplateParams,
        retries: &[RetryStrategy],
    ) -> Result<Template> {
        params.validate(name)?;

        let request = EngineRequest::post(
            Resource::Templates,
            body(&SdkTemplate {
                name: Some(name.to_string()),
                description: params.description().map(str::to_string),
                vm: Some(SdkLink::to(vm_id.as_str())),
                ..Default::default()
            })?,
        );

        let template = self
            .write(
                &format!("creating template {} from VM {}", name, vm_id),
                retries,
                request,
                |response| single::<SdkTemplate>(&response, "template creation response", "template")?.into_template(),
            )
            .await?;
        info!(template_id = %template.id(), "Template created");
        Ok(template)
    }

    #[instrument(skip(self, params, retries), fields(template_id = %id))]
    async fn update_template(
        &self,
        id: &TemplateId,
        params: UpdateTemplateParams,
        retries: &[RetryStrategy],
    ) -> Result<Template> {
        params.validate()?;

        let request = EngineRequest::put(
            Resource::Template(id.clone()),
            body(&SdkTemplate {
                id: Some(id.to_string()),
                name: params.name().map(str::to_string),
                description: params.description().map(str::to_string),
                ..Default::default()
            })?,
        );

        self.write(
            &format!("updating template {}", id),
            retries,
            request,
            |response| single::<SdkTemplate>(&response, "template update response", "template")?.into_template(),
        )
        .await
    }

    #[instrument(skip(self, retries), fields(template_id = %id))]
    async fn remove_template(&self, id: &TemplateId, retries: &[RetryStrategy]) -> Result<()> {
        if id.as_str() == BLANK_TEMPLATE_ID {
            return Err(EngineError::ValidationFailed(
                "The blank template cannot be removed".to_string(),
            ));
        }

        self.write(
            &format!("removing template {}", id),
            retries,
            EngineRequest::delete(Resource::Template(id.clone())),
            |_| Ok(()),
        )
        .await?;
        info!("Template removed");
        Ok(())
    }

    // =========================================================================
    // VMs
    // =========================================================================

    async fn list_vms(&self, retries: &[RetryStrategy]) -> Result<Vec<Vm>> {
        let vms: Vec<Vm> = self
            .read("listing VMs", retries, EngineRequest::get(Resource::Vms), |response| {
                many::<SdkVm>(&response, "vm")?
                    .into_iter()
                    .map(SdkVm::into_vm)
                    .collect()
            })
            .await?;
        debug!(count = vms.len(), "Listed VMs");
        Ok(vms)
    }

    async fn get_vm(&self, id: &VmId, retries: &[RetryStrategy]) -> Result<Vm> {
        self.read(
            &format!("getting VM {}", id),
            retries,
            EngineRequest::get(Resource::Vm(id.clone())),
            |response| single::<SdkVm>(&response, "VM response", "VM")?.into_vm(),
        )
        .await
    }

    #[instrument(skip(self, params, retries), fields(template_id = %template_id))]
    async fn create_vm(
        &self,
        template_id: &TemplateId,
        name: &str,
        params: CreateVmParams,
        retries: &[RetryStrategy],
    ) -> Result<Vm> {
        params.validate(name)?;

        let request = EngineRequest::post(
            Resource::Vms,
            body(&SdkVm {
                name: Some(name.to_string()),
                comment: params.comment().map(str::to_string),
                template: Some(SdkLink::to(template_id.as_str())),
                ..Default::default()
            })?,
        );

        let vm = self
            .write(
                &format!("creating VM {} from template {}", name, template_id),
                retries,
                request,
                |response| single::<SdkVm>(&response, "VM creation response", "VM")?.into_vm(),
            )
            .await?;
        info!(vm_id = %vm.id(), "VM created");
        Ok(vm)
    }

    #[instrument(skip(self, params, retries), fields(vm_id = %id))]
    async fn update_vm(&self, id: &VmId, params: UpdateVmParams, retries: &[RetryStrategy]) -> Result<Vm> {
        params.validate()?;

        let request = EngineRequest::put(
            Resource::Vm(id.clone()),
            body(&SdkVm {
                id: Some(id.to_string()),
                name: params.name().map(str::to_string),
                comment: params.comment().map(str::to_string),
                ..Default::default()
            })?,
        );

        self.write(
            &format!("updating VM {}", id),
            retries,
            request,
            |response| single::<SdkVm>(&response, "VM update response", "VM")?.into_vm(),
        )
        .await
    }

    #[instrument(skip(self, retries), fields(vm_id = %id))]
    async fn remove_vm(&self, id: &VmId, retries: &[RetryStrategy]) -> Result<()> {
        self.write(
            &format!("removing VM {}", id),
            retries,
            EngineRequest::delete(Resource::Vm(id.clone())),
            |_| Ok(()),
        )
        .await?;
        info!("VM removed");
        Ok(())
    }

    // =========================================================================
    // NICs
    // =========================================================================

    async fn list_nics(&self, vm_id: &VmId, retries: &[RetryStrategy]) -> Result<Vec<Nic>> {
        self.read(
            &format!("listing NICs of VM {}", vm_id),
            retries,
            EngineRequest::get(Resource::Nics(vm_id.clone())),
            |response| {
                many::<SdkNic>(&response, "nic")?
                    .into_iter()
                    .map(|nic| owned_by(nic.into_nic(vm_id)?, vm_id))
                    .collect()
            },
        )
        .await
    }

    async fn get_nic(&self, vm_id: &VmId, nic_id: &NicId, retries: &[RetryStrategy]) -> Result<Nic> {
        self.read(
            &format!("getting NIC {} of VM {}", nic_id, vm_id),
            retries,
            EngineRequest::get(Resource::Nic(vm_id.clone(), nic_id.clone())),
            |response| single_nic(&response, "NIC response", vm_id),
        )
        .await
    }

    #[instrument(skip(self, params, retries), fields(vm_id = %vm_id, vnic_profile_id = %vnic_profile_id))]
    async fn create_nic(
        &self,
        vm_id: &VmId,
        name: &str,
        vnic_profile_id: &VnicProfileId,
        params: CreateNicParams,
        retries: &[RetryStrategy],
    ) -> Result<Nic> {
        let mac = params.validate(name)?;

        let request = EngineRequest::post(
            Resource::Nics(vm_id.clone()),
            body(&SdkNic {
                name: Some(name.to_string()),
                vnic_profile: Some(SdkLink::to(vnic_profile_id.as_str())),
                mac: mac.map(|mac| SdkMac { address: Some(mac.to_string()) }),
                ..Default::default()
            })?,
        );

        let nic = self
            .write(
                &format!("creating NIC {} for VM {}", name, vm_id),
                retries,
                request,
                |response| single_nic(&response, "NIC creation response", vm_id),
            )
            .await?;
        info!(nic_id = %nic.id(), "NIC created");
        Ok(nic)
    }

    /// Only the supplied fields go into the request body; the engine leaves
    /// everything else as it was.
    #[instrument(skip(self, params, retries), fields(vm_id = %vm_id, nic_id = %nic_id))]
    async fn update_nic(
        &self,
        vm_id: &VmId,
        nic_id: &NicId,
        params: UpdateNicParams,
        retries: &[RetryStrategy],
    ) -> Result<Nic> {
        // No request goes out with a malformed MAC
        let mac = params.validate()?;

        let request = EngineRequest::put(
            Resource::Nic(vm_id.clone(), nic_id.clone()),
            body(&SdkNic {
                id: Some(nic_id.to_string()),
                name: params.name().map(str::to_string),
                vnic_profile: params.vnic_profile_id().map(|id| SdkLink::to(id.as_str())),
                mac: mac.map(|mac| SdkMac { address: Some(mac.to_string()) }),
                ..Default::default()
            })?,
        );

        self.write(
            &format!("updating NIC {} for VM {}", nic_id, vm_id),
            retries,
            request,
            |response| single_nic(&response, "NIC update response", vm_id),
        )
        .await
    }

    #[instrument(skip(self, retries), fields(vm_id = %vm_id, nic_id = %nic_id))]
    async fn remove_nic(&self, vm_id: &VmId, nic_id: &NicId, retries: &[RetryStrategy]) -> Result<()> {
        self.write(
            &format!("removing NIC {} from VM {}", nic_id, vm_id),
            retries,
            EngineRequest::delete(Resource::Nic(vm_id.clone(), nic_id.clone())),
            |_| Ok(()),
        )
        .await?;
        info!("NIC removed");
        Ok(())
    }

    // =========================================================================
    // VNIC profiles
    // =========================================================================

    async fn list_vnic_profiles(&self, retries: &[RetryStrategy]) -> Result<Vec<VnicProfile>> {
        self.read(
            "listing VNIC profiles",
            retries,
            EngineRequest::get(Resource::VnicProfiles),
            |response| {
                many::<SdkVnicProfile>(&response, "vnic_profile")?
                    .into_iter()
                    .map(SdkVnicProfile::into_vnic_profile)
                    .collect()
            },
        )
        .await
    }

    async fn get_vnic_profile(&self, id: &VnicProfileId, retries: &[RetryStrategy]) -> Result<VnicProfile> {
        self.read(
            &format!("getting VNIC profile {}", id),
            retries,
            EngineRequest::get(Resource::VnicProfile(id.clone())),
            |response| {
                single::<SdkVnicProfile>(&response, "VNIC profile response", "VNIC profile")?
                    .into_vnic_profile()
            },
        )
        .await
    }

    #[instrument(skip(self, params, retries), fields(network_id = %network_id))]
    async fn create_vnic_profile(
        &self,
        name: &str,
        network_id: &NetworkId,
        params: CreateVnicProfileParams,
        retries: &[RetryStrategy],
    ) -> Result<VnicProfile> {
        params.validate(name, network_id.as_str())?;

        let request = EngineRequest::post(
            Resource::VnicProfiles,
            body(&SdkVnicProfile {
                name: Some(name.to_string()),
                description: params.description().map(str::to_string),
                network: Some(SdkLink::to(network_id.as_str())),
                ..Default::default()
            })?,
        );

        let profile = self
            .write(
                &format!("creating VNIC profile {} on network {}", name, network_id),
                retries,
                request,
                |response| {
                    single::<SdkVnicProfile>(&response, "VNIC profile creation response", "VNIC profile")?
                        .into_vnic_profile()
                },
            )
            .await?;
        info!(vnic_profile_id = %profile.id(), "VNIC profile created");
        Ok(profile)
    }

    #[instrument(skip(self, retries), fields(vnic_profile_id = %id))]
    async fn remove_vnic_profile(&self, id: &VnicProfileId, retries: &[RetryStrategy]) -> Result<()> {
        self.write(
            &format!("removing VNIC profile {}", id),
            retries,
            EngineRequest::delete(Resource::VnicProfile(id.clone())),
            |_| Ok(()),
        )
        .await?;
        info!("VNIC profile removed");
        Ok(())
    }

    // =========================================================================
    // Networks
    // =========================================================================

    async fn list_networks(&self, retries: &[RetryStrategy]) -> Result<Vec<Network>> {
        self.read(
            "listing networks",
            retries,
            EngineRequest::get(Resource::Networks),
            |response| {
                many::<SdkNetwork>(&response, "network")?
                    .into_iter()
                    .map(SdkNetwork::into_network)
                    .collect()
            },
        )
        .await
    }

    async fn get_network(&self, id: &NetworkId, retries: &[RetryStrategy]) -> Result<Network> {
        self.read(
            &format!("getting network {}", id),
            retries,
            EngineRequest::get(Resource::Network(id.clone())),
            |response| single::<SdkNetwork>(&response, "network response", "network")?.into_network(),
        )
        .await
    }

    #[instrument(skip(self, params, retries))]
    async fn create_network(
        &self,
        name: &str,
        params: CreateNetworkParams,
        retries: &[RetryStrategy],
    ) -> Result<Network> {
        params.validate(name)?;

        let request = EngineRequest::post(
            Resource::Networks,
            body(&SdkNetwork {
                name: Some(name.to_string()),
                description: params.description().map(str::to_string),
                ..Default::default()
            })?,
        );

        let network = self
            .write(
                &format!("creating network {}", name),
                retries,
                request,
                |response| single::<SdkNetwork>(&response, "network creation response", "network")?.into_network(),
            )
            .await?;
        info!(network_id = %network.id(), "Network created");
        Ok(network)
    }

    #[instrument(skip(self, retries), fields(network_id = %id))]
    async fn remove_network(&self, id: &NetworkId, retries: &[RetryStrategy]) -> Result<()> {
        self.write(
            &format!("removing network {}", id),
            retries,
            EngineRequest::delete(Resource::Network(id.clone())),
            |_| Ok(()),
        )
        .await?;
        info!("Network removed");
        Ok(())
    }
}
