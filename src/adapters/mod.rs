//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements                | Connects to              |
//! |-------------|---------------------------|--------------------------|
//! | `hardware`  | DoorSensorPort, PowerPort | GPIO2 detect, GPIO0 hold |
//! | `wifi`      | LinkPort                  | ESP-IDF WiFi STA         |
//! | `mqtt`      | SessionPort               | ESP-IDF MQTT client      |
//! | `device`    | all four (delegating)     | the three above          |
//! | `log_sink`  | EventSink                 | Serial log output        |
//! | `device_id` |:                         | eFuse factory MAC        |

pub mod device;
pub mod device_id;
pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod wifi;
