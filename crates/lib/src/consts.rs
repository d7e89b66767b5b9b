/// Application name, used for the user agent and environment variable prefix.
pub const APP_NAME: &str = "wheeup";

/// Registry that package manifests are fetched from when no override is configured.
pub const DEFAULT_REGISTRY_URL: &str = "https://raw.githubusercontent.com/WheeLang/wheedb/main/packages";

/// Scratch workspace for staging downloads before they are copied into place.
pub const DEFAULT_SCRATCH_DIR: &str = "/tmp/wheeup";

/// File extension of manifests in the registry.
pub const MANIFEST_EXTENSION: &str = "yml";

/// Scratch file name the manifest is downloaded to.
pub const MANIFEST_SCRATCH_FILE: &str = "package.yml";

/// Scratch file name shared by all remote-file entries of a run.
pub const REMOTE_SCRATCH_FILE: &str = "remote.download";

/// Login shell given to service accounts.
pub const NOLOGIN_SHELL: &str = "/usr/sbin/nologin";

/// Superuser account that is always added to the package group.
pub const SUPERUSER: &str = "root";

pub const ENV_REGISTRY_URL: &str = "WHEEUP_REGISTRY_URL";
pub const ENV_SCRATCH_DIR: &str = "WHEEUP_SCRATCH_DIR";
pub const ENV_ELEVATE: &str = "WHEEUP_ELEVATE";
