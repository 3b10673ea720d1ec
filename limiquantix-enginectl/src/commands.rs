//! Command execution against an engine client.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use limiquantix_engine::params::{CreateVnicProfileParams, UpdateNicParams};
use limiquantix_engine::{EngineClient, NetworkId, NicId, VmId};

use crate::cli::{Command, NetworkCommand, NicCommand, TemplateCommand, VmCommand, VnicProfileCommand};

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).context("Failed to encode result")
}

/// Run one command and return its result as JSON.
pub async fn run(client: &dyn EngineClient, command: &Command) -> Result<Value> {
    match command {
        Command::Templates(TemplateCommand::List) => {
            to_json(&client.list_templates(&[]).await.context("Failed to list templates")?)
        }
        Command::Templates(TemplateCommand::Blank) => to_json(
            &client
                .get_blank_template(&[])
                .await
                .context("Failed to find the blank template")?,
        ),
        Command::Vms(VmCommand::List) => {
            to_json(&client.list_vms(&[]).await.context("Failed to list VMs")?)
        }
        Command::Vms(VmCommand::Get { id }) => to_json(
            &client
                .get_vm(&VmId::new(id.as_str()), &[])
                .await
                .with_context(|| format!("Failed to get VM {}", id))?,
        ),
        Command::Nics(NicCommand::List { vm_id }) => to_json(
            &client
                .list_nics(&VmId::new(vm_id.as_str()), &[])
                .await
                .with_context(|| format!("Failed to list NICs of VM {}", vm_id))?,
        ),
        Command::Nics(NicCommand::Update { vm_id, nic_id, name, vnic_profile, mac }) => {
            let mut params = UpdateNicParams::new();
            if let Some(name) = name {
                params = params.with_name(name.as_str());
            }
            if let Some(profile) = vnic_profile {
                params = params.with_vnic_profile_id(profile.as_str());
            }
            if let Some(mac) = mac {
                params = params.with_mac(mac.as_str());
            }
            if params.is_empty() {
                anyhow::bail!("Nothing to update: pass --name, --vnic-profile or --mac");
            }

            let nic = client
                .update_nic(&VmId::new(vm_id.as_str()), &NicId::new(nic_id.as_str()), params, &[])
                .await
                .with_context(|| format!("Failed to update NIC {} of VM {}", nic_id, vm_id))?;
            to_json(&nic)
        }
        Command::VnicProfiles(VnicProfileCommand::List) => to_json(
            &client
                .list_vnic_profiles(&[])
                .await
                .context("Failed to list VNIC profiles")?,
        ),
        Command::VnicProfiles(VnicProfileCommand::Create { name, network, description }) => {
            let mut params = CreateVnicProfileParams::new();
            if let Some(description) = description {
                params = params.with_description(description.as_str());
            }

            let profile = client
                .create_vnic_profile(name, &NetworkId::new(network.as_str()), params, &[])
                .await
                .with_context(|| format!("Failed to create VNIC profile {}", name))?;
            to_json(&profile)
        }
        Command::Networks(NetworkCommand::List) => {
            to_json(&client.list_networks(&[]).await.context("Failed to list networks")?)
        }
    }
}
