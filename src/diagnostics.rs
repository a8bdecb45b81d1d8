//! Boot banner and panic logging.
//!
//! Nothing is persisted: the device cuts its own power at the end of every
//! cycle, so the serial log is the only diagnostic channel.  The banner
//! records what is running and how much heap is left before the radio
//! starts.

use log::info;

/// Snapshot of build and runtime facts printed at boot.
#[derive(Debug, Clone)]
pub struct BootInfo {
    pub firmware_version: &'static str,
    pub idf_version: heapless::String<32>,
    pub chip_id: u32,
    pub heap_free: u32,
    pub heap_min_free: u32,
    pub build_profile: &'static str,
}

const BUILD_PROFILE: &str = if cfg!(debug_assertions) { "debug" } else { "release" };

impl BootInfo {
    #[cfg(target_os = "espidf")]
    pub fn collect(chip_id: u32) -> Self {
        use esp_idf_svc::sys::*;
        let heap_free = unsafe { esp_get_free_heap_size() };
        let heap_min_free = unsafe { esp_get_minimum_free_heap_size() };

        let mut idf_version = heapless::String::new();
        // SAFETY: esp_get_idf_version returns a static NUL-terminated string.
        let raw = unsafe { core::ffi::CStr::from_ptr(esp_get_idf_version()) };
        for ch in raw.to_string_lossy().chars() {
            if idf_version.push(ch).is_err() {
                break;
            }
        }

        Self {
            firmware_version: env!("CARGO_PKG_VERSION"),
            idf_version,
            chip_id,
            heap_free,
            heap_min_free,
            build_profile: BUILD_PROFILE,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn collect(chip_id: u32) -> Self {
        let mut idf_version = heapless::String::new();
        let _ = idf_version.push_str("host-sim");
        Self {
            firmware_version: env!("CARGO_PKG_VERSION"),
            idf_version,
            chip_id,
            heap_free: 307_200,
            heap_min_free: 261_120,
            build_profile: BUILD_PROFILE,
        }
    }
}

/// Print the boot banner.
pub fn log_banner(boot: &BootInfo) {
    info!("[INFO] BOOTUP...");
    info!("[INFO] Firmware: doorsense v{}", boot.firmware_version);
    info!("[INFO] IDF: {}", boot.idf_version);
    info!("[INFO] Chip ID: {:08X} ({})", boot.chip_id, boot.chip_id);
    info!(
        "[INFO] Heap: {} bytes free (min {})",
        boot.heap_free, boot.heap_min_free
    );
    info!("[INFO] -------------------------------------------");
    info!("[INFO] Build profile: {}", boot.build_profile);
    info!("[INFO] -------------------------------------------");
}

/// Install a panic hook that logs the reason before the default abort.
pub fn install_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        let reason = if let Some(msg) = info.payload().downcast_ref::<&str>() {
            *msg
        } else if let Some(msg) = info.payload().downcast_ref::<String>() {
            msg.as_str()
        } else {
            "unknown panic"
        };

        match info.location() {
            Some(loc) => log::error!("PANIC: {} at {}:{}", reason, loc.file(), loc.line()),
            None => log::error!("PANIC: {}", reason),
        }
    }));
}
