pub const APP_NAME: &str = "lambdapack";

/// Project file looked up in the working directory when none is given.
pub const PROJECT_FILENAME: &str = "lambdapack.toml";

/// Install target for dependencies, relative to the target directory.
pub const DEPENDENCIES_DIR: &str = "lambda_dependencies";

/// Dependencies the Lambda runtime already provides.
pub const DEFAULT_EXCLUDES: &[&str] = &["boto", "boto3"];

pub const DEFAULT_TARGET_DIR: &str = "target";
pub const DEFAULT_SOURCE_DIR: &str = "src/main/python";
pub const DEFAULT_SCRIPTS_DIR: &str = "src/main/scripts";

pub const DEFAULT_PIP_COMMAND: &str = "pip";

pub const DEFAULT_TEAMCITY_PARAMETER: &str = "crassus_filename";
