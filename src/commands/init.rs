use crate::config::{CONFIG_FILE, generate_config_template};
use crate::fs::{FileSystem, default_fs};
use crate::style;
use std::path::Path;

pub fn cmd_init(root: &Path) -> i32 {
    cmd_init_with_fs(root, default_fs())
}

pub fn cmd_init_with_fs(root: &Path, fs: &dyn FileSystem) -> i32 {
    let config_path = root.join(CONFIG_FILE);
    if fs.exists(&config_path) {
        style::error(&format!(
            "{} already exists at {}",
            CONFIG_FILE,
            style::path(&config_path)
        ));
        return 1;
    }

    if let Err(e) = fs.write(&config_path, &generate_config_template()) {
        style::error(&format!("Failed to write config file: {}", e));
        return 1;
    }

    style::success(&format!("Created {} at {}", CONFIG_FILE, style::path(&config_path)));
    style::hint("Every key is optional; edit only the values that differ in your checkout.");
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fs::mock::MockFs;

    #[test]
    fn test_init_writes_parseable_template() {
        let fs = MockFs::new();
        assert_eq!(cmd_init_with_fs(Path::new("/repo"), &fs), 0);

        let written = fs.contents(Path::new("/repo/.declmap.toml")).unwrap();
        assert!(Config::from_toml(&written).is_ok());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let fs = MockFs::with_files([("/repo/.declmap.toml", "[search]\n")]);
        assert_eq!(cmd_init_with_fs(Path::new("/repo"), &fs), 1);
        assert_eq!(
            fs.contents(Path::new("/repo/.declmap.toml")).as_deref(),
            Some("[search]\n")
        );
    }
}
