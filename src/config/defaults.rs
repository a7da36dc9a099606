//! Default configuration values

/// Workspace and package manifest file name
pub const MANIFEST_FILE: &str = "package.json";

/// Project configuration file name
pub const CONFIG_FILE: &str = "ripple.toml";

/// Baseline revision for change detection
pub const DEFAULT_BASE: &str = "HEAD";

/// Package manager program
pub const PACKAGE_MANAGER: &str = "npm";

/// Arguments used to run a script for one workspace package.
///
/// `{command}` and `{module}` are substituted per invocation; stage flags are
/// appended after these.
pub const SCRIPT_ARGS: &[&str] = &[
    "run",
    "{command}",
    "-w",
    "{module}",
    "--if-present",
    "--color=always",
];

/// Length of the `file:../.` scheme prefix on npm `resolved` locations
pub const RESOLVED_PREFIX_LEN: usize = 9;

/// Default command stages as `(command, flags)`
pub const DEFAULT_STAGES: &[(&str, &str)] = &[
    ("build", ""),
    ("lint", ""),
    ("test", "-- --reporters=jest-standard-reporter"),
];

/// Minimum proptest iterations
pub const MIN_PROPTEST_ITERATIONS: u32 = 100;
