use std::sync::Arc;

use async_trait::async_trait;
use listener_api::ListenerClient;
use tracing::{debug, info, warn};
use uk_state::LocalState;
use uk_state::models::{Instance, InstanceState};
use vsphere_api::{VirtualMachine, VsphereClient};

use crate::listener::{IpResolver, LISTENER_PORT, LISTENER_RETRY, resolve_instance_ip};
use crate::{BoxError, Error, InstanceProvider, ProviderName, Result};

/// Inventory name of the VM running the instance listener.
pub const DEFAULT_INSTANCE_LISTENER: &str = "VsphereUnikInstanceListener";

/// The slice of the management API a reconciliation pass needs.
#[async_trait]
pub trait VmInventory: Send + Sync + 'static {
    /// Every VM the hypervisor knows about, in inventory order.
    async fn list_vms(&self) -> std::result::Result<Vec<VirtualMachine>, BoxError>;

    /// Guest IP of the VM with the given inventory name.
    async fn vm_ip(&self, vm_name: &str) -> std::result::Result<String, BoxError>;
}

#[async_trait]
impl VmInventory for VsphereClient {
    async fn list_vms(&self) -> std::result::Result<Vec<VirtualMachine>, BoxError> {
        VsphereClient::list_vms(self).await.map_err(BoxError::from)
    }

    async fn vm_ip(&self, vm_name: &str) -> std::result::Result<String, BoxError> {
        VsphereClient::get_vm_ip(self, vm_name)
            .await
            .map_err(BoxError::from)
    }
}

/// vSphere provider.
///
/// Instances are launched elsewhere; this provider only discovers them again
/// by MAC address and refreshes their state and IP in the shared store.
pub struct VsphereProvider {
    inventory: Arc<dyn VmInventory>,
    resolver: Arc<dyn IpResolver>,
    state: Arc<LocalState>,
    listener_vm: String,
    listener_port: u16,
}

impl VsphereProvider {
    pub fn new(
        inventory: Arc<dyn VmInventory>,
        resolver: Arc<dyn IpResolver>,
        state: Arc<LocalState>,
    ) -> Self {
        Self {
            inventory,
            resolver,
            state,
            listener_vm: DEFAULT_INSTANCE_LISTENER.to_string(),
            listener_port: LISTENER_PORT,
        }
    }

    /// Create from env vars:
    ///
    /// - `VSPHERE_URL`, `VSPHERE_USER`, `VSPHERE_PASSWORD` (required)
    /// - `VSPHERE_INSTANCE_LISTENER` (default: `"VsphereUnikInstanceListener"`)
    /// - `INSTANCE_LISTENER_PORT` (default: `3000`)
    pub async fn from_env(state: Arc<LocalState>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let url = std::env::var("VSPHERE_URL").map_err(|_| Error::MissingEnv("VSPHERE_URL".into()))?;
        let user =
            std::env::var("VSPHERE_USER").map_err(|_| Error::MissingEnv("VSPHERE_USER".into()))?;
        let password = std::env::var("VSPHERE_PASSWORD")
            .map_err(|_| Error::MissingEnv("VSPHERE_PASSWORD".into()))?;

        let listener_vm = std::env::var("VSPHERE_INSTANCE_LISTENER")
            .unwrap_or_else(|_| DEFAULT_INSTANCE_LISTENER.into());

        let listener_port = match std::env::var("INSTANCE_LISTENER_PORT") {
            Ok(raw) => raw.parse::<u16>().map_err(|_| Error::InvalidEnv {
                name: "INSTANCE_LISTENER_PORT",
                value: raw,
            })?,
            Err(_) => LISTENER_PORT,
        };

        let client = VsphereClient::login(url, &user, &password).await?;
        info!(url = client.base_url(), user = %user, "vsphere: session opened");

        Ok(Self::new(Arc::new(client), Arc::new(ListenerClient::new()?), state)
            .with_listener(listener_vm, listener_port))
    }

    /// Override where the instance listener is found.
    pub fn with_listener(mut self, vm_name: impl Into<String>, port: u16) -> Self {
        self.listener_vm = vm_name.into();
        self.listener_port = port;
        self
    }

    /// MAC address of the VM's first network adapter, whatever its emulation.
    ///
    /// Only the first adapter in device order is considered; if it has no MAC
    /// the VM has no usable identity.
    pub fn mac_address(vm: &VirtualMachine) -> Option<&str> {
        vm.config
            .as_ref()?
            .hardware
            .device
            .as_ref()?
            .iter()
            .find_map(|device| device.ethernet_card())?
            .mac_address
            .as_deref()
            .filter(|mac| !mac.is_empty())
    }

    /// Map a vSphere power state onto the canonical lifecycle.
    ///
    /// `None` means the record's current state is left as is.
    // TODO: confirm with the platform owners whether poweredOff should map to
    // Stopped; today only suspended VMs are reported as stopped.
    pub fn parse_power_state(power_state: &str) -> Option<InstanceState> {
        match power_state {
            "poweredOn" => Some(InstanceState::Running),
            "poweredOff" => None,
            "suspended" => Some(InstanceState::Stopped),
            _ => Some(InstanceState::Unknown),
        }
    }
}

#[async_trait]
impl InstanceProvider for VsphereProvider {
    async fn list_instances(&self) -> Result<Vec<Instance>> {
        let vms = self.inventory.list_vms().await.map_err(Error::ListVms)?;
        debug!(vms = vms.len(), "vsphere: enumerated vms");

        // Looked up on the first matched VM and reused for the rest of the pass.
        let mut listener_ip: Option<String> = None;
        let mut instances = Vec::new();

        for vm in &vms {
            let Some(mac) = Self::mac_address(vm) else {
                warn!(vm = ?vm, "vsphere: vm found, cannot identify mac address");
                continue;
            };

            let instance_id = vm.instance_uuid().unwrap_or_default();
            if !self.state.instances().await.contains_key(instance_id) {
                warn!(vm = ?vm, instance_id, "vsphere: vm found, cannot identify instance id");
                continue;
            }
            let power_state = Self::parse_power_state(vm.power_state());

            let listener = match &listener_ip {
                Some(ip) => ip.clone(),
                None => {
                    let ip = self
                        .inventory
                        .vm_ip(&self.listener_vm)
                        .await
                        .map_err(Error::ListenerIp)?;
                    debug!(listener_vm = %self.listener_vm, listener_ip = %ip, "vsphere: found instance listener");
                    listener_ip.insert(ip).clone()
                }
            };

            let ip = resolve_instance_ip(
                self.resolver.as_ref(),
                &listener,
                self.listener_port,
                mac,
                LISTENER_RETRY,
            )
            .await
            .map_err(|e| Error::InstanceIp {
                mac: mac.to_string(),
                attempts: e.attempts,
                source: e.last,
            })?;

            // Merge into the record as it is now; the listener wait can be long
            // and the store may have changed underneath us.
            let merged = self
                .state
                .modify_instances(|instances| {
                    let instance = instances.get_mut(instance_id)?;
                    if let Some(state) = power_state {
                        instance.state = state;
                    }
                    instance.ip_address = Some(ip);
                    Some(instance.clone())
                })
                .await
                .map_err(Error::SaveState)?;

            let Some(instance) = merged else {
                warn!(instance_id, mac, "vsphere: instance removed during reconciliation, skipping");
                continue;
            };

            info!(
                instance_id = %instance.id,
                mac,
                state = %instance.state,
                ip = instance.ip_address.as_deref().unwrap_or_default(),
                "vsphere: instance reconciled"
            );
            instances.push(instance);
        }

        Ok(instances)
    }

    fn name(&self) -> ProviderName {
        ProviderName::Vsphere
    }
}
