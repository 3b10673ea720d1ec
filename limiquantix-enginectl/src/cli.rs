//! Command-line argument parsing.

use clap::{Parser, Subcommand};
use limiquantix_common::LogFormat;

/// limiquantix Engine CLI - Inspect and change engine resources
#[derive(Parser, Debug)]
#[command(name = "limiquantix-enginectl")]
#[command(about = "limiquantix Engine CLI - Inspect and change engine resources")]
#[command(version)]
pub struct Args {
    /// Path to configuration file (optional, defaults used if not found)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Engine API root, e.g. https://engine.example.com/ovirt-engine/api
    #[arg(long, global = true, env = "LIMIQUANTIX_ENGINE_URL")]
    pub url: Option<String>,

    /// Bearer token for the engine API
    #[arg(long, global = true, env = "LIMIQUANTIX_ENGINE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Use the in-memory mock engine instead of a live one
    #[arg(long, global = true)]
    pub mock: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Log output format (pretty, json)
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Template operations
    #[command(subcommand)]
    Templates(TemplateCommand),

    /// VM operations
    #[command(subcommand)]
    Vms(VmCommand),

    /// NIC operations
    #[command(subcommand)]
    Nics(NicCommand),

    /// VNIC profile operations
    #[command(subcommand)]
    VnicProfiles(VnicProfileCommand),

    /// Network operations
    #[command(subcommand)]
    Networks(NetworkCommand),
}

#[derive(Subcommand, Debug)]
pub enum TemplateCommand {
    /// List all templates
    List,
    /// Show the blank template
    Blank,
}

#[derive(Subcommand, Debug)]
pub enum VmCommand {
    /// List all VMs
    List,
    /// Show one VM
    Get {
        /// VM ID
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum NicCommand {
    /// List the NICs of a VM
    List {
        /// VM ID
        vm_id: String,
    },
    /// Change the name, VNIC profile or MAC of a NIC
    Update {
        /// VM ID
        vm_id: String,
        /// NIC ID
        nic_id: String,
        /// New NIC name
        #[arg(long)]
        name: Option<String>,
        /// New VNIC profile ID
        #[arg(long)]
        vnic_profile: Option<String>,
        /// New MAC address
        #[arg(long)]
        mac: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum VnicProfileCommand {
    /// List all VNIC profiles
    List,
    /// Create a VNIC profile on a network
    Create {
        /// Profile name
        name: String,
        /// Network ID
        #[arg(long)]
        network: String,
        /// Profile description
        #[arg(long)]
        description: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum NetworkCommand {
    /// List all networks
    List,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_nic_update() {
        let args = Args::try_parse_from([
            "limiquantix-enginectl",
            "--mock",
            "nics",
            "update",
            "vm-1",
            "nic-1",
            "--mac",
            "00:1a:4a:16:01:51",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert!(args.mock);
        assert_eq!(args.log_format, Some(LogFormat::Json));
        match args.command {
            Command::Nics(NicCommand::Update { vm_id, nic_id, name, mac, .. }) => {
                assert_eq!(vm_id, "vm-1");
                assert_eq!(nic_id, "nic-1");
                assert_eq!(name, None);
                assert_eq!(mac.as_deref(), Some("00:1a:4a:16:01:51"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_vnic_profile_create() {
        let args = Args::try_parse_from([
            "limiquantix-enginectl",
            "vnic-profiles",
            "create",
            "vlan10",
            "--network",
            "net-1",
        ])
        .unwrap();

        assert!(matches!(
            args.command,
            Command::VnicProfiles(VnicProfileCommand::Create { ref name, ref network, description: None })
                if name == "vlan10" && network == "net-1"
        ));
    }
}
