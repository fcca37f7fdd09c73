//! The SPIFFS partition holding the `key:value` configuration files.

use esp_idf_svc::sys::{esp, esp_vfs_spiffs_conf_t, esp_vfs_spiffs_register, EspError};

pub const MOUNT_POINT: &str = "/spiffs";

pub fn mount() -> Result<(), EspError> {
    let conf = esp_vfs_spiffs_conf_t {
        base_path: c"/spiffs".as_ptr(),
        partition_label: std::ptr::null(),
        max_files: 4,
        format_if_mount_failed: false,
    };

    esp!(unsafe { esp_vfs_spiffs_register(&conf) })?;
    log::info!("Mounted SPIFFS at {}", MOUNT_POINT);
    Ok(())
}

/// Absolute path of a file on the mounted partition.
pub fn path(name: &str) -> String {
    format!("{}/{}", MOUNT_POINT, name)
}
