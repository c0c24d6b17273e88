//! Config path resolution
//!
//! Handles resolving paths for the permission configuration and backend files.

use std::path::{Path, PathBuf};

use super::{ConfigError, ConfigResult};

/// Subdirectory of the configs directory holding permission files
pub const AUTH_DIR: &str = "auth";

/// File name of the permission configuration document
///
/// The name is kept from the INI-era layout; the contents are TOML.
pub const PERMISSIONS_CONFIG_FILE: &str = "permissions.ini";

/// Returns the cs2rust base directory by navigating up from the running binary.
///
/// The binary is loaded from:
/// `game/csgo/addons/cs2rust/bin/linuxsteamrt64/<binary>`
///
/// This navigates up 3 levels to reach:
/// `game/csgo/addons/cs2rust/`
pub fn cs2rust_base_dir() -> ConfigResult<PathBuf> {
    let exe = std::env::current_exe().map_err(ConfigError::IoError)?;

    // Navigate: <binary> -> linuxsteamrt64 -> bin -> cs2rust
    exe.parent() // linuxsteamrt64/
        .and_then(|p| p.parent()) // bin/
        .and_then(|p| p.parent()) // cs2rust/
        .map(PathBuf::from)
        .ok_or(ConfigError::NoConfigDirectory)
}

/// Returns the base configs directory.
///
/// Path: `game/csgo/addons/cs2rust/configs/`
pub fn configs_dir() -> ConfigResult<PathBuf> {
    Ok(cs2rust_base_dir()?.join("configs"))
}

/// Returns the directory holding permission files.
///
/// Path: `{config_dir}/auth/`
pub fn auth_dir(config_dir: &Path) -> PathBuf {
    config_dir.join(AUTH_DIR)
}

/// Returns the permission configuration document path.
///
/// Path: `{config_dir}/auth/permissions.ini`
pub fn permissions_config_path(config_dir: &Path) -> PathBuf {
    auth_dir(config_dir).join(PERMISSIONS_CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permissions_config_path_format() {
        let base = PathBuf::from("/game/csgo/addons/cs2rust/configs");
        let path = permissions_config_path(&base);

        assert!(path.ends_with("configs/auth/permissions.ini"));
        assert_eq!(auth_dir(&base), base.join("auth"));
    }
}
