use serde::{Deserialize, Serialize};

// ── Virtual machines ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachine {
    #[serde(default)]
    pub config: Option<VirtualMachineConfigInfo>,
    pub summary: VirtualMachineSummary,
}

impl VirtualMachine {
    /// Hypervisor-assigned instance UUID, if the configuration block was returned.
    pub fn instance_uuid(&self) -> Option<&str> {
        self.config.as_ref().map(|c| c.instance_uuid.as_str())
    }

    pub fn power_state(&self) -> &str {
        &self.summary.runtime.power_state
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineConfigInfo {
    pub name: String,
    pub instance_uuid: String,
    #[serde(default)]
    pub guest_id: Option<String>,
    #[serde(default)]
    pub hardware: VirtualHardware,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualHardware {
    #[serde(default)]
    pub num_cpu: u32,
    #[serde(default, rename = "memoryMB")]
    pub memory_mb: u32,
    #[serde(default)]
    pub device: Option<Vec<VirtualDevice>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineSummary {
    pub runtime: VirtualMachineRuntimeInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineRuntimeInfo {
    /// `poweredOn`, `poweredOff` or `suspended`.
    pub power_state: String,
    #[serde(default)]
    pub host: Option<String>,
}

// ── Devices ──────────────────────────────────────────────────────────

/// A virtual device attached to a VM, discriminated by the API's `_type` tag.
///
/// Every network adapter emulation carries the same [`VirtualEthernetCard`]
/// body. Device types this client does not model land in `Unrecognized`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum VirtualDevice {
    #[serde(rename = "VirtualE1000")]
    E1000(VirtualEthernetCard),
    #[serde(rename = "VirtualE1000e")]
    E1000e(VirtualEthernetCard),
    #[serde(rename = "VirtualPCNet32")]
    PcNet32(VirtualEthernetCard),
    #[serde(rename = "VirtualSriovEthernetCard")]
    SriovEthernetCard(VirtualEthernetCard),
    #[serde(rename = "VirtualVmxnet")]
    Vmxnet(VirtualEthernetCard),
    #[serde(rename = "VirtualVmxnet2")]
    Vmxnet2(VirtualEthernetCard),
    #[serde(rename = "VirtualVmxnet3")]
    Vmxnet3(VirtualEthernetCard),
    #[serde(rename = "VirtualDisk")]
    Disk(VirtualDisk),
    #[serde(other)]
    Unrecognized,
}

impl VirtualDevice {
    /// The ethernet card body, for any of the network adapter emulations.
    pub fn ethernet_card(&self) -> Option<&VirtualEthernetCard> {
        match self {
            Self::E1000(card)
            | Self::E1000e(card)
            | Self::PcNet32(card)
            | Self::SriovEthernetCard(card)
            | Self::Vmxnet(card)
            | Self::Vmxnet2(card)
            | Self::Vmxnet3(card) => Some(card),
            Self::Disk(_) | Self::Unrecognized => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualEthernetCard {
    #[serde(default)]
    pub key: i32,
    #[serde(default)]
    pub mac_address: Option<String>,
    /// `manual`, `generated` or `assigned`.
    #[serde(default)]
    pub address_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualDisk {
    #[serde(default)]
    pub key: i32,
    #[serde(default)]
    pub capacity_in_kb: i64,
}

// ── Guest ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestIdentity {
    #[serde(default)]
    pub ip_address: Option<String>,
}
