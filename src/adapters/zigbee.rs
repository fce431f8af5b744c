//! Zigbee stack adapter.
//!
//! Implements [`AttributeStore`](crate::app::ports::AttributeStore) and
//! [`NetworkPort`](crate::app::ports::NetworkPort).
//!
//! - **`target_os = "espidf"`**: esp-zigbee-lib through the generated
//!   `esp_idf_svc::sys::zigbee` bindings. The stack runs in its own
//!   thread; every call from the application context takes the stack
//!   lock. Stack callbacks only push onto [`EVENTS`](crate::events::EVENTS).
//! - **`not(target_os = "espidf")`**: an in-memory network that keeps an
//!   attribute table and queues the signals a real stack would raise.
//!   Tests drain them with `ZigbeeStack::pop_event`.
//!
//! ## Signal flow
//!
//! ```text
//!  enable ─▶ SkipStartup ─default─▶ FirstStart | Reboot
//!  start_steering ─▶ Steering(ok → joined | err)
//!  coordinator removes node ─▶ Leave
//! ```

use crate::zcl;

#[cfg(target_os = "espidf")]
pub use self::esp::ZigbeeStack;
#[cfg(not(target_os = "espidf"))]
pub use self::sim::ZigbeeStack;

/// Attributes the stack does not create with a cluster; they are added
/// explicitly before registration.
const OPTIONAL_ATTRIBUTES: [(u16, u16); 9] = [
    (zcl::CLUSTER_BASIC, zcl::basic::APP_VERSION),
    (zcl::CLUSTER_BASIC, zcl::basic::STACK_VERSION),
    (zcl::CLUSTER_BASIC, zcl::basic::HW_VERSION),
    (zcl::CLUSTER_BASIC, zcl::basic::MANUFACTURER_NAME),
    (zcl::CLUSTER_BASIC, zcl::basic::MODEL_IDENTIFIER),
    (zcl::CLUSTER_BASIC, zcl::basic::DATE_CODE),
    (zcl::CLUSTER_TEMPERATURE, zcl::ATTR_TOLERANCE),
    (zcl::CLUSTER_HUMIDITY, zcl::ATTR_TOLERANCE),
    (zcl::CLUSTER_CO2, zcl::ATTR_TOLERANCE),
];

// ═══════════════════════════════════════════════════════════════
// ESP-IDF backend
// ═══════════════════════════════════════════════════════════════

#[cfg(target_os = "espidf")]
mod esp {
    use core::ffi::c_void;

    use esp_idf_svc::sys::zigbee::*;
    use esp_idf_svc::sys::{ESP_OK, esp_err_t};
    use log::{debug, error, info, warn};

    use super::OPTIONAL_ATTRIBUTES;
    use crate::app::ports::{AttributeStore, NetworkPort};
    use crate::config::DeviceConfig;
    use crate::error::{InitError, NetworkError};
    use crate::events::{EVENTS, Event, NetworkSignal, SignalBuffer, SignalKind};
    use crate::zcl;

    const BDB_MODE_INITIALIZATION: u8 = 0;
    const BDB_MODE_NETWORK_STEERING: u8 = 2;
    const ALL_CHANNELS_MASK: u32 = 0x07FF_F800;
    const ED_KEEP_ALIVE_MS: u32 = 3_000;
    /// `portMAX_DELAY`.
    const LOCK_FOREVER: u32 = u32::MAX;
    const STACK_TASK_SIZE: usize = 8 * 1024;

    // ── Callbacks (stack task context) ────────────────────────

    /// Called by the stack for every lifecycle signal.
    #[unsafe(no_mangle)]
    extern "C" fn esp_zb_app_signal_handler(signal: *mut esp_zb_app_signal_t) {
        // SAFETY: the stack passes a valid signal for the duration of the
        // call; both pointers are checked before use.
        let Some(signal) = (unsafe { signal.as_ref() }) else {
            return;
        };
        if signal.p_app_signal.is_null() {
            return;
        }
        let raw = unsafe { *signal.p_app_signal };
        let kind = SignalKind::from_raw(raw);
        EVENTS.push(Event::Network(NetworkSignal::new(kind, signal.esp_err_status)));
    }

    extern "C" fn identify_notify(identify_on: u8) {
        EVENTS.push(Event::Identify(identify_on != 0));
    }

    /// Run `f` holding the stack lock.
    fn locked<T>(f: impl FnOnce() -> T) -> Option<T> {
        // SAFETY: the lock API is callable from any task once the stack is
        // initialised.
        if !unsafe { esp_zb_lock_acquire(LOCK_FOREVER) } {
            error!("zigbee: lock acquire failed");
            return None;
        }
        let out = f();
        unsafe { esp_zb_lock_release() };
        Some(out)
    }

    fn check(what: &'static str, ret: esp_err_t) -> Result<(), InitError> {
        if ret == ESP_OK {
            Ok(())
        } else {
            Err(InitError::Status(what, ret))
        }
    }

    /// Add one optional attribute to its cluster's attribute list.
    unsafe fn add_attr(
        list: *mut esp_zb_attribute_list_t,
        cluster: u16,
        attribute: u16,
        value: *mut c_void,
    ) -> esp_err_t {
        unsafe {
            match cluster {
                zcl::CLUSTER_BASIC => esp_zb_basic_cluster_add_attr(list, attribute, value),
                zcl::CLUSTER_TEMPERATURE => {
                    esp_zb_temperature_meas_cluster_add_attr(list, attribute, value)
                }
                zcl::CLUSTER_HUMIDITY => {
                    esp_zb_humidity_meas_cluster_add_attr(list, attribute, value)
                }
                zcl::CLUSTER_CO2 => {
                    esp_zb_carbon_dioxide_measurement_cluster_add_attr(list, attribute, value)
                }
                _ => esp_idf_svc::sys::ESP_ERR_NOT_SUPPORTED,
            }
        }
    }

    #[derive(Debug, Default)]
    pub struct ZigbeeStack {
        registered: bool,
        started: bool,
    }

    impl ZigbeeStack {
        pub fn new() -> Self {
            Self::default()
        }

        fn build_endpoint() -> Result<(), InitError> {
            // SAFETY: boot path, before the stack thread exists. The stack
            // copies every attribute value it is handed.
            unsafe {
                let mut platform: esp_zb_platform_config_t = core::mem::zeroed();
                platform.radio_config.radio_mode = esp_zb_radio_mode_t_ZB_RADIO_MODE_NATIVE;
                platform.host_config.host_connection_mode =
                    esp_zb_host_connection_mode_t_ZB_HOST_CONNECTION_MODE_NONE;
                check("esp_zb_platform_config", esp_zb_platform_config(&mut platform))?;

                let mut cfg: esp_zb_cfg_t = core::mem::zeroed();
                cfg.esp_zb_role = esp_zb_nwk_device_type_t_ESP_ZB_DEVICE_TYPE_ED;
                cfg.install_code_policy = false;
                cfg.nwk_cfg.zed_cfg.ed_timeout =
                    esp_zb_aging_timeout_t_ESP_ZB_ED_AGING_TIMEOUT_64MIN as u8;
                cfg.nwk_cfg.zed_cfg.keep_alive = ED_KEEP_ALIVE_MS;
                esp_zb_init(&mut cfg);

                let mut basic_cfg: esp_zb_basic_cluster_cfg_t = core::mem::zeroed();
                basic_cfg.zcl_version = zcl::ZCL_VERSION;
                basic_cfg.power_source = zcl::POWER_SOURCE_DC;
                let basic = esp_zb_basic_cluster_create(&mut basic_cfg);

                let mut identify_cfg: esp_zb_identify_cluster_cfg_t = core::mem::zeroed();
                identify_cfg.identify_time = 0;
                let identify = esp_zb_identify_cluster_create(&mut identify_cfg);

                let mut t_cfg: esp_zb_temperature_meas_cluster_cfg_t = core::mem::zeroed();
                t_cfg.measured_value = zcl::TEMPERATURE_UNKNOWN;
                let temperature = esp_zb_temperature_meas_cluster_create(&mut t_cfg);

                let mut h_cfg: esp_zb_humidity_meas_cluster_cfg_t = core::mem::zeroed();
                h_cfg.measured_value = zcl::HUMIDITY_UNKNOWN;
                let humidity = esp_zb_humidity_meas_cluster_create(&mut h_cfg);

                let mut c_cfg: esp_zb_carbon_dioxide_measurement_cluster_cfg_t =
                    core::mem::zeroed();
                c_cfg.measured_value = f32::NAN;
                let co2 = esp_zb_carbon_dioxide_measurement_cluster_create(&mut c_cfg);

                let defaults = zcl::boot_defaults(&DeviceConfig::default().valid_ranges());
                for entry in defaults
                    .iter()
                    .filter(|d| OPTIONAL_ATTRIBUTES.contains(&(d.cluster, d.attribute)))
                {
                    let list = match entry.cluster {
                        zcl::CLUSTER_BASIC => basic,
                        zcl::CLUSTER_TEMPERATURE => temperature,
                        zcl::CLUSTER_HUMIDITY => humidity,
                        _ => co2,
                    };
                    let mut bytes = entry.value.to_bytes();
                    let ret = add_attr(
                        list,
                        entry.cluster,
                        entry.attribute,
                        bytes.as_mut_ptr().cast(),
                    );
                    check("cluster add attr", ret)?;
                }

                let role = esp_zb_zcl_cluster_role_t_ESP_ZB_ZCL_CLUSTER_SERVER_ROLE as u8;
                let clusters = esp_zb_zcl_cluster_list_create();
                check("add basic", esp_zb_cluster_list_add_basic_cluster(clusters, basic, role))?;
                check(
                    "add identify",
                    esp_zb_cluster_list_add_identify_cluster(clusters, identify, role),
                )?;
                check(
                    "add temperature",
                    esp_zb_cluster_list_add_temperature_meas_cluster(clusters, temperature, role),
                )?;
                check(
                    "add humidity",
                    esp_zb_cluster_list_add_humidity_meas_cluster(clusters, humidity, role),
                )?;
                check(
                    "add co2",
                    esp_zb_cluster_list_add_carbon_dioxide_measurement_cluster(clusters, co2, role),
                )?;

                let endpoints = esp_zb_ep_list_create();
                let ep = esp_zb_endpoint_config_t {
                    endpoint: zcl::ENDPOINT,
                    app_profile_id: zcl::PROFILE_HA,
                    app_device_id: zcl::DEVICE_ID,
                    app_device_version: 0,
                };
                check("ep list add", esp_zb_ep_list_add_ep(endpoints, clusters, ep))?;
                check("esp_zb_device_register", esp_zb_device_register(endpoints))?;
                esp_zb_set_primary_network_channel_set(ALL_CHANNELS_MASK);
            }
            Ok(())
        }

        fn commission(mode: u8) -> Result<(), NetworkError> {
            let ret = locked(|| unsafe { esp_zb_bdb_start_top_level_commissioning(mode) })
                .ok_or(NetworkError::InvalidState)?;
            if ret == ESP_OK {
                Ok(())
            } else {
                Err(NetworkError::Status(ret))
            }
        }

        fn write_identify_time(&mut self, secs: u16) -> Result<(), NetworkError> {
            let status = self.set_attribute(
                zcl::CLUSTER_IDENTIFY,
                zcl::ATTR_IDENTIFY_TIME,
                &secs.to_le_bytes(),
            );
            if status == zcl::STATUS_SUCCESS {
                Ok(())
            } else {
                Err(NetworkError::Status(i32::from(status)))
            }
        }
    }

    impl AttributeStore for ZigbeeStack {
        fn register_device(&mut self) -> Result<(), InitError> {
            Self::build_endpoint()?;
            self.registered = true;
            info!("zigbee: endpoint {} registered", zcl::ENDPOINT);
            Ok(())
        }

        fn set_attribute(&mut self, cluster: u16, attribute: u16, value: &[u8]) -> u8 {
            if !self.registered {
                return zcl::STATUS_FAILURE;
            }
            let mut buf = [0u8; zcl::MAX_ATTR_LEN];
            let len = value.len().min(buf.len());
            buf[..len].copy_from_slice(&value[..len]);
            let role = esp_zb_zcl_cluster_role_t_ESP_ZB_ZCL_CLUSTER_SERVER_ROLE as u8;
            locked(|| unsafe {
                esp_zb_zcl_set_attribute_val(
                    zcl::ENDPOINT,
                    cluster,
                    role,
                    attribute,
                    buf.as_mut_ptr().cast(),
                    false,
                ) as u8
            })
            .unwrap_or(zcl::STATUS_FAILURE)
        }
    }

    impl NetworkPort for ZigbeeStack {
        fn is_joined(&self) -> bool {
            self.started && locked(|| unsafe { esp_zb_bdb_dev_joined() }).unwrap_or(false)
        }

        fn enable(&mut self) -> Result<(), InitError> {
            if !self.registered {
                return Err(InitError::NotReady("zigbee endpoint"));
            }
            std::thread::Builder::new()
                .name("zigbee".into())
                .stack_size(STACK_TASK_SIZE)
                .spawn(|| {
                    // SAFETY: the stack thread owns the main loop from here.
                    let ret = unsafe { esp_zb_start(false) };
                    if ret != ESP_OK {
                        error!("zigbee: esp_zb_start failed (rc={ret})");
                        return;
                    }
                    unsafe { esp_zb_stack_main_loop() };
                })
                .map_err(|_| InitError::NotReady("zigbee task"))?;
            self.started = true;
            info!("zigbee: stack task started");
            Ok(())
        }

        fn register_identify_handler(&mut self) -> Result<(), InitError> {
            if !self.registered {
                return Err(InitError::NotReady("zigbee endpoint"));
            }
            // SAFETY: boot path, before the stack thread runs.
            unsafe { esp_zb_identify_notify_handler_register(zcl::ENDPOINT, Some(identify_notify)) };
            Ok(())
        }

        fn set_rx_on_when_idle(&mut self, on: bool) {
            // SAFETY: configuration call, valid before `esp_zb_start`.
            unsafe { esp_zb_set_rx_on_when_idle(on) };
            debug!("zigbee: rx_on_when_idle={on}");
        }

        fn start_steering(&mut self) -> Result<(), NetworkError> {
            if !self.started {
                return Err(NetworkError::InvalidState);
            }
            Self::commission(BDB_MODE_NETWORK_STEERING)
        }

        fn start_identify(&mut self) -> Result<(), NetworkError> {
            self.write_identify_time(zcl::IDENTIFY_TIME_SECS)?;
            EVENTS.push(Event::Identify(true));
            Ok(())
        }

        fn cancel_identify(&mut self) -> Result<(), NetworkError> {
            self.write_identify_time(0)?;
            EVENTS.push(Event::Identify(false));
            Ok(())
        }

        fn factory_reset(&mut self) {
            warn!("zigbee: factory reset, device restarts");
            let _ = locked(|| unsafe { esp_zb_factory_reset() });
        }

        fn default_signal_handler(&mut self, signal: &NetworkSignal) {
            match signal.kind {
                SignalKind::SkipStartup => {
                    if let Err(e) = Self::commission(BDB_MODE_INITIALIZATION) {
                        error!("zigbee: BDB initialisation failed: {e}");
                    }
                }
                SignalKind::DeviceFirstStart | SignalKind::DeviceReboot if !signal.is_ok() => {
                    warn!("zigbee: {:?} failed (status {})", signal.kind, signal.status);
                }
                kind => debug!("zigbee: signal {:?} status {}", kind, signal.status),
            }
        }

        fn release_buffer(&mut self, buffer: SignalBuffer) {
            // The stack frees its own buffers after the handler returns.
            debug!("zigbee: buffer {} returned", buffer.0);
        }
    }
}

// ═══════════════════════════════════════════════════════════════
// Host simulation
// ═══════════════════════════════════════════════════════════════

#[cfg(not(target_os = "espidf"))]
mod sim {
    use std::collections::{HashMap, VecDeque};

    use log::{debug, info, warn};

    use super::OPTIONAL_ATTRIBUTES;
    use crate::app::ports::{AttributeStore, NetworkPort};
    use crate::config::DeviceConfig;
    use crate::error::{InitError, NetworkError};
    use crate::events::{Event, NetworkSignal, SignalBuffer, SignalKind};
    use crate::zcl;

    #[derive(Debug)]
    pub struct ZigbeeStack {
        attributes: HashMap<(u16, u16), Vec<u8>>,
        pending: VecDeque<Event>,
        registered: bool,
        enabled: bool,
        identify_handler: bool,
        joined: bool,
        /// Whether a coordinator answers steering.
        network_available: bool,
        /// Credentials survive a restart unless factory reset.
        commissioned: bool,
        rx_on_when_idle: Option<bool>,
        next_buffer: u32,
        released: Vec<u32>,
        factory_resets: u32,
    }

    impl Default for ZigbeeStack {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ZigbeeStack {
        pub fn new() -> Self {
            Self {
                attributes: HashMap::new(),
                pending: VecDeque::new(),
                registered: false,
                enabled: false,
                identify_handler: false,
                joined: false,
                network_available: true,
                commissioned: false,
                rx_on_when_idle: None,
                next_buffer: 1,
                released: Vec::new(),
                factory_resets: 0,
            }
        }

        /// Start as if network credentials were already stored.
        pub fn with_stored_network(mut self) -> Self {
            self.commissioned = true;
            self
        }

        pub fn set_network_available(&mut self, available: bool) {
            self.network_available = available;
        }

        /// Next signal or notification the stack would have delivered.
        pub fn pop_event(&mut self) -> Option<Event> {
            self.pending.pop_front()
        }

        pub fn attribute(&self, cluster: u16, attribute: u16) -> Option<&[u8]> {
            self.attributes.get(&(cluster, attribute)).map(Vec::as_slice)
        }

        pub fn rx_on_when_idle(&self) -> Option<bool> {
            self.rx_on_when_idle
        }

        pub fn released_buffers(&self) -> &[u32] {
            &self.released
        }

        pub fn factory_resets(&self) -> u32 {
            self.factory_resets
        }

        /// The coordinator removed the node.
        pub fn remote_leave(&mut self) {
            self.signal(SignalKind::Leave, 0);
        }

        /// A remote `Identify` command arrived (or the period ran out).
        pub fn remote_identify(&mut self, on: bool) {
            if !self.identify_handler {
                return;
            }
            let secs = if on { zcl::IDENTIFY_TIME_SECS } else { 0 };
            self.attributes.insert(
                (zcl::CLUSTER_IDENTIFY, zcl::ATTR_IDENTIFY_TIME),
                secs.to_le_bytes().to_vec(),
            );
            self.pending.push_back(Event::Identify(on));
        }

        fn signal(&mut self, kind: SignalKind, status: i32) {
            let mut signal = NetworkSignal::new(kind, status);
            signal.buffer = Some(SignalBuffer(self.next_buffer));
            self.next_buffer = self.next_buffer.wrapping_add(1);
            self.pending.push_back(Event::Network(signal));
        }

        fn set_identify(&mut self, on: bool) -> Result<(), NetworkError> {
            let secs = if on { zcl::IDENTIFY_TIME_SECS } else { 0 };
            let status = self.set_attribute(
                zcl::CLUSTER_IDENTIFY,
                zcl::ATTR_IDENTIFY_TIME,
                &secs.to_le_bytes(),
            );
            if status != zcl::STATUS_SUCCESS {
                return Err(NetworkError::Status(i32::from(status)));
            }
            if self.identify_handler {
                self.pending.push_back(Event::Identify(on));
            }
            Ok(())
        }
    }

    impl AttributeStore for ZigbeeStack {
        fn register_device(&mut self) -> Result<(), InitError> {
            let ranges = DeviceConfig::default().valid_ranges();
            for d in zcl::boot_defaults(&ranges) {
                self.attributes
                    .insert((d.cluster, d.attribute), d.value.to_bytes().to_vec());
            }
            self.attributes.insert(
                (zcl::CLUSTER_IDENTIFY, zcl::ATTR_IDENTIFY_TIME),
                0u16.to_le_bytes().to_vec(),
            );
            self.registered = true;
            info!(
                "zigbee(sim): endpoint {} registered ({} attributes, {} optional)",
                zcl::ENDPOINT,
                self.attributes.len(),
                OPTIONAL_ATTRIBUTES.len()
            );
            Ok(())
        }

        fn set_attribute(&mut self, cluster: u16, attribute: u16, value: &[u8]) -> u8 {
            if !self.registered {
                return zcl::STATUS_FAILURE;
            }
            match self.attributes.get_mut(&(cluster, attribute)) {
                Some(slot) => {
                    slot.clear();
                    slot.extend_from_slice(value);
                    zcl::STATUS_SUCCESS
                }
                None => zcl::STATUS_UNSUPPORTED_ATTRIBUTE,
            }
        }
    }

    impl NetworkPort for ZigbeeStack {
        fn is_joined(&self) -> bool {
            self.joined
        }

        fn enable(&mut self) -> Result<(), InitError> {
            if !self.registered {
                return Err(InitError::NotReady("zigbee endpoint"));
            }
            self.enabled = true;
            self.signal(SignalKind::SkipStartup, 0);
            Ok(())
        }

        fn register_identify_handler(&mut self) -> Result<(), InitError> {
            if !self.registered {
                return Err(InitError::NotReady("zigbee endpoint"));
            }
            self.identify_handler = true;
            Ok(())
        }

        fn set_rx_on_when_idle(&mut self, on: bool) {
            self.rx_on_when_idle = Some(on);
        }

        fn start_steering(&mut self) -> Result<(), NetworkError> {
            if !self.enabled {
                return Err(NetworkError::InvalidState);
            }
            if self.network_available {
                self.joined = true;
                self.commissioned = true;
                self.signal(SignalKind::Steering, 0);
            } else {
                self.signal(SignalKind::Steering, -1);
            }
            Ok(())
        }

        fn start_identify(&mut self) -> Result<(), NetworkError> {
            self.set_identify(true)
        }

        fn cancel_identify(&mut self) -> Result<(), NetworkError> {
            self.set_identify(false)
        }

        fn factory_reset(&mut self) {
            warn!("zigbee(sim): factory reset");
            self.factory_resets += 1;
            self.joined = false;
            self.commissioned = false;
        }

        fn default_signal_handler(&mut self, signal: &NetworkSignal) {
            match signal.kind {
                SignalKind::SkipStartup => {
                    // BDB initialisation: rejoin with stored credentials.
                    if self.commissioned {
                        self.joined = true;
                        self.signal(SignalKind::DeviceReboot, 0);
                    } else {
                        self.signal(SignalKind::DeviceFirstStart, 0);
                    }
                }
                SignalKind::Leave => {
                    self.joined = false;
                    self.commissioned = false;
                }
                kind => debug!("zigbee(sim): signal {:?} status {}", kind, signal.status),
            }
        }

        fn release_buffer(&mut self, buffer: SignalBuffer) {
            self.released.push(buffer.0);
        }
    }

}
