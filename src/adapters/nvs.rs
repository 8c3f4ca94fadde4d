//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`] for the light: one postcard blob under
//! `light::syscfg`, validated with [`SystemConfig::validate`] before it is
//! written.  Host builds keep the blob in a `HashMap` so tests can
//! round-trip.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::SystemConfig;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CONFIG_NAMESPACE: &str = "light";
const CONFIG_KEY: &str = "syscfg";

/// Largest blob read back from flash.
#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 1024;

/// NVS names are at most 15 bytes plus the terminator.
const NVS_NAME_MAX: usize = 15;

#[cfg(target_os = "espidf")]
const OK: i32 = ESP_OK as i32;
#[cfg(target_os = "espidf")]
const NOT_FOUND: i32 = ESP_ERR_NVS_NOT_FOUND as i32;
#[cfg(target_os = "espidf")]
const NO_SPACE: i32 = ESP_ERR_NVS_NOT_ENOUGH_SPACE as i32;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

/// NUL-terminated copy of an NVS name.
#[cfg(target_os = "espidf")]
fn c_name(name: &str) -> [u8; NVS_NAME_MAX + 1] {
    let mut buf = [0u8; NVS_NAME_MAX + 1];
    let len = name.len().min(NVS_NAME_MAX);
    buf[..len].copy_from_slice(&name.as_bytes()[..len]);
    buf
}

impl NvsAdapter {
    /// Initialise NVS flash.  A full or outdated partition is erased and
    /// re-initialised.
    #[cfg(target_os = "espidf")]
    pub fn new() -> Result<Self, ConfigError> {
        // SAFETY: called once from the main task before any other NVS use.
        unsafe {
            let mut ret = nvs_flash_init();
            if ret == ESP_ERR_NVS_NO_FREE_PAGES as i32 || ret == ESP_ERR_NVS_NEW_VERSION_FOUND as i32 {
                warn!("NVS: erasing and re-initialising flash partition");
                if nvs_flash_erase() != OK {
                    return Err(ConfigError::IoError);
                }
                ret = nvs_flash_init();
            }
            if ret != OK {
                return Err(ConfigError::IoError);
            }
        }
        info!("NvsAdapter: ESP-IDF NVS initialised");
        Ok(Self {})
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Result<Self, ConfigError> {
        info!("NvsAdapter: simulation backend");
        Ok(Self {
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        let ns = namespace.get(..NVS_NAME_MAX).unwrap_or(namespace);
        let key = key.get(..NVS_NAME_MAX).unwrap_or(key);
        format!("{}::{}", ns, key)
    }

    /// Open a namespace, run `f` with the handle, close it again.
    #[cfg(target_os = "espidf")]
    fn with_handle<T>(
        namespace: &str,
        write: bool,
        f: impl FnOnce(nvs_handle_t) -> Result<T, i32>,
    ) -> Result<T, i32> {
        let ns = c_name(namespace);
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let mut handle: nvs_handle_t = 0;
        // SAFETY: `ns` is NUL-terminated and outlives the call.
        let ret = unsafe { nvs_open(ns.as_ptr().cast(), mode, &mut handle) };
        if ret != OK {
            return Err(ret);
        }
        let result = f(handle);
        // SAFETY: handle was opened above.
        unsafe { nvs_close(handle) };
        result
    }

    /// Whole blob, or `None` if the key is absent.
    #[cfg(target_os = "espidf")]
    fn get_blob(namespace: &str, key: &str) -> Result<Option<Vec<u8>>, i32> {
        let key = c_name(key);
        let opened = Self::with_handle(namespace, false, |handle| {
            let mut size: usize = 0;
            // SAFETY: null buffer asks NVS for the stored size only.
            let ret = unsafe {
                nvs_get_blob(handle, key.as_ptr().cast(), core::ptr::null_mut(), &mut size)
            };
            if ret == NOT_FOUND {
                return Ok(None);
            }
            if ret != OK || size > MAX_BLOB_SIZE {
                return Err(ret);
            }
            let mut buf = vec![0u8; size];
            // SAFETY: `buf` holds exactly `size` bytes.
            let ret = unsafe {
                nvs_get_blob(handle, key.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut size)
            };
            if ret != OK {
                return Err(ret);
            }
            buf.truncate(size);
            Ok(Some(buf))
        });
        match opened {
            // A namespace that was never written cannot be opened read-only.
            Err(ret) if ret == NOT_FOUND => Ok(None),
            other => other,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn get_blob(&self, namespace: &str, key: &str) -> Option<Vec<u8>> {
        self.store
            .borrow()
            .get(&Self::composite_key(namespace, key))
            .cloned()
    }

    #[cfg(target_os = "espidf")]
    fn set_blob(namespace: &str, key: &str, data: &[u8]) -> Result<(), i32> {
        let key = c_name(key);
        Self::with_handle(namespace, true, |handle| {
            // SAFETY: `data` is valid for `data.len()` bytes.
            let ret = unsafe {
                nvs_set_blob(handle, key.as_ptr().cast(), data.as_ptr().cast(), data.len())
            };
            if ret != OK {
                return Err(ret);
            }
            // SAFETY: handle is open read-write.
            match unsafe { nvs_commit(handle) } {
                OK => Ok(()),
                err => Err(err),
            }
        })
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        #[cfg(target_os = "espidf")]
        let stored = Self::get_blob(CONFIG_NAMESPACE, CONFIG_KEY).unwrap_or_else(|e| {
            warn!("NvsAdapter: NVS read error {}, using defaults", e);
            None
        });

        #[cfg(not(target_os = "espidf"))]
        let stored = self.get_blob(CONFIG_NAMESPACE, CONFIG_KEY);

        match stored {
            Some(bytes) => {
                let cfg: SystemConfig =
                    postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
                info!("NvsAdapter: loaded config ({} bytes)", bytes.len());
                Ok(cfg)
            }
            None => {
                info!("NvsAdapter: no stored config, using defaults");
                Ok(SystemConfig::default())
            }
        }
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;

        #[cfg(target_os = "espidf")]
        Self::set_blob(CONFIG_NAMESPACE, CONFIG_KEY, &bytes).map_err(|e| {
            warn!("NvsAdapter: NVS write error {}", e);
            if e == NO_SPACE {
                ConfigError::StorageFull
            } else {
                ConfigError::IoError
            }
        })?;

        #[cfg(not(target_os = "espidf"))]
        self.store
            .borrow_mut()
            .insert(Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY), bytes.clone());

        info!("NvsAdapter: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}
