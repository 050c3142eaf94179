use hidscribe::Config;
#[cfg(any(target_os = "windows", feature = "hid"))]
use hidscribe::{DescriptorBuilder, DeviceDescriptor, HidSubsystem};

#[cfg(any(target_os = "windows", feature = "hid"))]
fn report<S: HidSubsystem>(builder: &DescriptorBuilder<S>, handle: S::DeviceHandle) {
    let mut d: DeviceDescriptor<S> = match builder.build(handle) {
        Ok(d) => d,
        Err(e) => {
            println!("!! {handle:?}: {e}");
            return;
        }
    };

    println!("== {d} ==");
    println!("   path: {}", d.name());
    if let Some(desc) = d.capabilities_description() {
        println!("   {desc}");
        println!("   buttons: {}", d.button_count());
    }
    for v in d.value_capabilities() {
        if let Some(desc) = v.description() {
            println!("   {desc}");
        }
    }
    println!("{}", d.meta().to_json().expect("serialize meta"));
    d.release();
}

fn main() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let config = match std::env::var_os("HIDSCRIBE_CONFIG") {
        Some(path) => Config::load(path).expect("load config"),
        None => Config::default(),
    };

    #[cfg(target_os = "windows")]
    {
        use hidscribe::backends::windows::{device_list, WindowsSubsystem};
        let builder = DescriptorBuilder::with_config(
            WindowsSubsystem::new(config.windows.clone()),
            config.builder.clone(),
        );
        for handle in device_list().expect("enumerate raw input devices") {
            report(&builder, handle);
        }
    }

    #[cfg(all(not(target_os = "windows"), feature = "hid"))]
    {
        use hidscribe::backends::hid::HidApiSubsystem;
        let subsystem = HidApiSubsystem::new(config.hidapi.clone()).expect("init hidapi");
        let handles: Vec<_> = subsystem.devices().collect();
        let builder = DescriptorBuilder::with_config(subsystem, config.builder.clone());
        for handle in handles {
            report(&builder, handle);
        }
    }

    #[cfg(all(not(target_os = "windows"), not(feature = "hid")))]
    {
        let _ = config;
        eprintln!("no backend available: enable the `hid` feature");
    }
}
