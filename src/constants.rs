// src/constants.rs

/// Manifest path used when neither `--manifest` nor the environment override is given.
pub const DEFAULT_MANIFEST_PATH: &str = "./manifest.yml";

/// Environment variable that overrides the default manifest path.
pub const MANIFEST_ENV_VAR: &str = "DAVE_MANIFEST";

/// Parameter that always carries the tag name of the variant being rendered.
pub const TAG_PARAMETER: &str = "tag";

/// Parameter that carries the context name, at the lowest precedence.
pub const CONTEXT_PARAMETER: &str = "context";

/// Meta-selector that expands to every command type.
pub const ALL_COMMANDS_VERB: &str = "all";

/// Message printed once every command in the pipeline has exited successfully.
pub const SUCCESS_MESSAGE: &str = "All commands completed successfully.";
