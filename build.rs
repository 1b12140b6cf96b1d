fn main() {
    // Device configuration is baked in with option_env!, so a change to any
    // of these must rebuild the crate.
    for var in [
        "PIRWATCH_WIFI_SSID",
        "PIRWATCH_WIFI_PASSWORD",
        "PIRWATCH_BROKER_HOST",
        "PIRWATCH_BROKER_PORT",
        "PIRWATCH_BROKER_USERNAME",
        "PIRWATCH_BROKER_PASSWORD",
        "PIRWATCH_DEVICE_ID",
    ] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
