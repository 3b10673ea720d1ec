//! Entity-oriented conveniences.
//!
//! Entities are plain values. These methods take the client explicitly and
//! forward to the matching [`EngineClient`] operation, so a snapshot never
//! holds a handle to the engine.
//!
//! ```rust,ignore
//! let vm = client.get_vm(&vm_id, &[]).await?;
//! for nic in vm.nics(client.as_ref(), &[]).await? {
//!     let profile = nic.vnic_profile(client.as_ref(), &[]).await?;
//!     println!("{} -> {}", nic.name(), profile.name());
//! }
//! ```

use crate::error::Result;
use crate::ids::VnicProfileId;
use crate::params::{CreateNicParams, UpdateNicParams, UpdateVmParams};
use crate::retry::RetryStrategy;
use crate::traits::EngineClient;
use crate::types::{Network, Nic, Template, Vm, VnicProfile};

impl Nic {
    /// The VM this NIC is attached to.
    pub async fn vm(&self, client: &dyn EngineClient, retries: &[RetryStrategy]) -> Result<Vm> {
        client.get_vm(self.vm_id(), retries).await
    }

    /// The VNIC profile this NIC uses.
    pub async fn vnic_profile(
        &self,
        client: &dyn EngineClient,
        retries: &[RetryStrategy],
    ) -> Result<VnicProfile> {
        client.get_vnic_profile(self.vnic_profile_id(), retries).await
    }

    /// Apply `params` and return the updated snapshot. `self` is not modified.
    pub async fn update(
        &self,
        client: &dyn EngineClient,
        params: UpdateNicParams,
        retries: &[RetryStrategy],
    ) -> Result<Nic> {
        client.update_nic(self.vm_id(), self.id(), params, retries).await
    }

    pub async fn remove(&self, client: &dyn EngineClient, retries: &[RetryStrategy]) -> Result<()> {
        client.remove_nic(self.vm_id(), self.id(), retries).await
    }
}

impl VnicProfile {
    pub async fn network(&self, client: &dyn EngineClient, retries: &[RetryStrategy]) -> Result<Network> {
        client.get_network(self.network_id(), retries).await
    }

    pub async fn remove(&self, client: &dyn EngineClient, retries: &[RetryStrategy]) -> Result<()> {
        client.remove_vnic_profile(self.id(), retries).await
    }
}

impl Vm {
    /// The template this VM was created from.
    pub async fn template(&self, client: &dyn EngineClient, retries: &[RetryStrategy]) -> Result<Template> {
        client.get_template(self.template_id(), retries).await
    }

    pub async fn nics(&self, client: &dyn EngineClient, retries: &[RetryStrategy]) -> Result<Vec<Nic>> {
        client.list_nics(self.id(), retries).await
    }

    /// Attach a new NIC to this VM.
    pub async fn create_nic(
        &self,
        client: &dyn EngineClient,
        name: &str,
        vnic_profile_id: &VnicProfileId,
        params: CreateNicParams,
        retries: &[RetryStrategy],
    ) -> Result<Nic> {
        client
            .create_nic(self.id(), name, vnic_profile_id, params, retries)
            .await
    }

    pub async fn update(
        &self,
        client: &dyn EngineClient,
        params: UpdateVmParams,
        retries: &[RetryStrategy],
    ) -> Result<Vm> {
        client.update_vm(self.id(), params, retries).await
    }

    /// Remove this VM and its NICs.
    pub async fn remove(&self, client: &dyn EngineClient, retries: &[RetryStrategy]) -> Result<()> {
        client.remove_vm(self.id(), retries).await
    }
}

impl Template {
    pub async fn remove(&self, client: &dyn EngineClient, retries: &[RetryStrategy]) -> Result<()> {
        client.remove_template(self.id(), retries).await
    }
}

impl Network {
    /// VNIC profiles defined on this network.
    pub async fn vnic_profiles(
        &self,
        client: &dyn EngineClient,
        retries: &[RetryStrategy],
    ) -> Result<Vec<VnicProfile>> {
        let profiles = client.list_vnic_profiles(retries).await?;
        Ok(profiles
            .into_iter()
            .filter(|profile| profile.network_id() == self.id())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::mock::MockBackend;
    use crate::params::CreateVnicProfileParams;

    #[tokio::test]
    async fn test_navigate_from_nic() {
        let client = MockBackend::new();
        let blank = client.get_blank_template(&[]).await.unwrap();
        let network = client.list_networks(&[]).await.unwrap().remove(0);
        let profile = network.vnic_profiles(&client, &[]).await.unwrap().remove(0);

        let vm = client
            .create_vm(blank.id(), "web", Default::default(), &[])
            .await
            .unwrap();
        let nic = vm
            .create_nic(&client, "eth0", profile.id(), CreateNicParams::new(), &[])
            .await
            .unwrap();

        assert_eq!(nic.vm(&client, &[]).await.unwrap().id(), vm.id());
        assert_eq!(nic.vnic_profile(&client, &[]).await.unwrap().id(), profile.id());
        assert_eq!(
            nic.vnic_profile(&client, &[]).await.unwrap().network(&client, &[]).await.unwrap().id(),
            network.id()
        );
        assert!(vm.template(&client, &[]).await.unwrap().is_blank());
    }

    #[tokio::test]
    async fn test_update_returns_new_snapshot() {
        let client = MockBackend::new();
        let blank = client.get_blank_template(&[]).await.unwrap();
        let profile = client.list_vnic_profiles(&[]).await.unwrap().remove(0);
        let vm = client
            .create_vm(blank.id(), "db", Default::default(), &[])
            .await
            .unwrap();
        let nic = vm
            .create_nic(&client, "eth0", profile.id(), CreateNicParams::new(), &[])
            .await
            .unwrap();

        let renamed = nic
            .update(&client, UpdateNicParams::new().with_name("eth1"), &[])
            .await
            .unwrap();
        assert_eq!(renamed.name(), "eth1");
        assert_eq!(nic.name(), "eth0");
        assert_eq!(vm.nics(&client, &[]).await.unwrap()[0].name(), "eth1");

        renamed.remove(&client, &[]).await.unwrap();
        assert!(vm.nics(&client, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_network_profiles_are_filtered() {
        let client = MockBackend::empty();
        let lan = client.create_network("lan", Default::default(), &[]).await.unwrap();
        let dmz = client.create_network("dmz", Default::default(), &[]).await.unwrap();
        client
            .create_vnic_profile("lan", lan.id(), CreateVnicProfileParams::new(), &[])
            .await
            .unwrap();
        let dmz_profile = client
            .create_vnic_profile("dmz", dmz.id(), CreateVnicProfileParams::new(), &[])
            .await
            .unwrap();

        let profiles = dmz.vnic_profiles(&client, &[]).await.unwrap();
        assert_eq!(profiles, vec![dmz_profile.clone()]);

        dmz_profile.remove(&client, &[]).await.unwrap();
        assert!(dmz.vnic_profiles(&client, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_template_remove_rejected() {
        let client = MockBackend::new();
        let blank = client.get_blank_template(&[]).await.unwrap();
        let err = blank.remove(&client, &[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    }
}
