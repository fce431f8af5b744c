//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                        | Connects to              |
//! |------------|-----------------------------------|--------------------------|
//! | `hardware` | all device ports (delegating)     | sensor, LEDs, Zigbee     |
//! | `log_sink` | EventSink                         | Serial log output        |
//! | `nvs`      | ConfigPort                        | NVS / in-memory store    |
//! | `time`     | (clock source for `TimerPort`)    | ESP32 system timer       |
//! | `zigbee`   | AttributeStore, NetworkPort       | esp-zigbee-lib / sim     |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
pub mod zigbee;
