use directories::ProjectDirs;
use std::{
    env,
    path::PathBuf,
};

const PROJECT_NAME: &str = "census";

lazy_static::lazy_static! {
    static ref CONFIG_FOLDER: Option<PathBuf> = env::var(format!("{}_CONFIG_DIR", PROJECT_NAME.to_uppercase()))
        .ok()
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from);
}

/// Where `config.yaml` is looked up. `CENSUS_CONFIG_DIR` wins over the
/// platform default.
pub fn get_config_dir() -> PathBuf {
    if let Some(dir) = CONFIG_FOLDER.clone() {
        dir
    } else if let Some(proj_dirs) = project_directory() {
        proj_dirs.config_local_dir().to_path_buf()
    } else {
        PathBuf::from(".").join(".config")
    }
}

fn project_directory() -> Option<ProjectDirs> {
    ProjectDirs::from("io", PROJECT_NAME, PROJECT_NAME)
}
