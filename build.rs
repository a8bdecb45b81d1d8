fn main() {
    println!("cargo:rerun-if-env-changed=DOORSENSE_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=DOORSENSE_WIFI_PASS");
    println!("cargo:rerun-if-env-changed=DOORSENSE_MQTT_HOST");
    println!("cargo:rerun-if-env-changed=DOORSENSE_MQTT_PORT");
    println!("cargo:rerun-if-env-changed=DOORSENSE_MQTT_TLS");
    println!("cargo:rerun-if-env-changed=DOORSENSE_MQTT_USER");
    println!("cargo:rerun-if-env-changed=DOORSENSE_MQTT_PASS");

    // ESP-IDF link arguments are only needed for device builds; host test
    // builds compile the pure-logic library alone.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
