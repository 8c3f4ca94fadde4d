fn main() {
    // Baked into the default config; see src/config.rs.
    for var in ["WIFI_SSID", "WIFI_PASSWORD", "CLOUD_SERVER"] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
