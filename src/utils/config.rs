use dotenv::dotenv;
use log::warn;
use rustyline::EditMode;
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::shell::DEFAULT_MAX_LINE;

pub struct Config {
    pub name: String,
    pub config_dir: PathBuf,
    pub theme: String,
    pub history_file: PathBuf,
    pub editor_mode: String,
    pub logger_level: String,
    pub logger_dir: PathBuf,
    pub log_to_stderr: bool,
    pub max_line: usize,
}

impl Config {
    fn get_config_dir(home: Option<String>) -> PathBuf {
        match home {
            Some(home) => PathBuf::from(home).join(".config/forksh"),
            None => PathBuf::from("tmp"),
        }
    }

    fn defaults(home: Option<String>) -> Self {
        let config_dir = Self::get_config_dir(home);
        Config {
            name: String::from(env!("CARGO_PKG_NAME")),
            theme: String::from("default"),
            history_file: config_dir.join(".forksh_history"),
            editor_mode: String::from("emacs"),
            logger_level: String::from("info"),
            logger_dir: config_dir.join("logs"),
            log_to_stderr: false,
            max_line: DEFAULT_MAX_LINE,
            config_dir,
        }
    }

    pub fn new() -> Self {
        // 优先加载 .env 文件
        if cfg!(debug_assertions) {
            dotenv::from_filename(".env.development").ok();
        } else {
            dotenv().ok();
        }

        let config = Self::from_lookup(|key| env::var(key).ok());

        // 确保历史文件目录存在
        if let Some(parent) = config.history_file.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                warn!("无法创建历史记录目录 {}: {}", parent.display(), err);
            }
        }

        config
    }

    /// Builds the configuration from `lookup`, which maps a variable name to
    /// its value. Unusable values keep the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::defaults(lookup("HOME"));

        if let Some(theme) = lookup("FORKSH_THEME") {
            config.theme = theme;
        }

        if let Some(editor) = lookup("FORKSH_EDITOR") {
            config.editor_mode = editor;
        }

        if let Some(history) = lookup("FORKSH_HISTORY") {
            config.history_file = PathBuf::from(history);
        }

        if let Some(level) = lookup("FORKSH_LOG_LEVEL") {
            config.logger_level = level;
        }

        if let Some(dir) = lookup("FORKSH_LOG_DIR") {
            config.logger_dir = PathBuf::from(dir);
        }

        if let Some(flag) = lookup("FORKSH_LOG_STDERR") {
            match flag.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => config.log_to_stderr = true,
                "0" | "false" | "no" | "off" | "" => config.log_to_stderr = false,
                other => warn!("FORKSH_LOG_STDERR 无效: {}", other),
            }
        }

        if let Some(max_line) = lookup("FORKSH_MAX_LINE") {
            match max_line.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.max_line = n,
                _ => warn!("FORKSH_MAX_LINE 无效: {}", max_line),
            }
        }

        config
    }

    pub fn get_edit_mode(&self) -> EditMode {
        match self.editor_mode.to_lowercase().as_str() {
            "vi" => EditMode::Vi,
            _ => EditMode::Emacs,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("HOME", "/home/user")]);
        assert_eq!(config.name, "forksh");
        assert_eq!(config.config_dir, PathBuf::from("/home/user/.config/forksh"));
        assert_eq!(
            config.history_file,
            PathBuf::from("/home/user/.config/forksh/.forksh_history")
        );
        assert_eq!(config.logger_dir, PathBuf::from("/home/user/.config/forksh/logs"));
        assert_eq!(config.max_line, DEFAULT_MAX_LINE);
        assert!(!config.log_to_stderr);
        assert_eq!(config.get_edit_mode(), EditMode::Emacs);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("HOME", "/home/user"),
            ("FORKSH_EDITOR", "VI"),
            ("FORKSH_HISTORY", "/tmp/hist"),
            ("FORKSH_LOG_LEVEL", "debug"),
            ("FORKSH_LOG_DIR", "/tmp/logs"),
            ("FORKSH_LOG_STDERR", "true"),
            ("FORKSH_MAX_LINE", "512"),
        ]);
        assert_eq!(config.get_edit_mode(), EditMode::Vi);
        assert_eq!(config.history_file, PathBuf::from("/tmp/hist"));
        assert_eq!(config.logger_level, "debug");
        assert_eq!(config.logger_dir, PathBuf::from("/tmp/logs"));
        assert!(config.log_to_stderr);
        assert_eq!(config.max_line, 512);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = config_from(&[("FORKSH_MAX_LINE", "lots"), ("FORKSH_LOG_STDERR", "maybe")]);
        assert_eq!(config.max_line, DEFAULT_MAX_LINE);
        assert!(!config.log_to_stderr);
        assert_eq!(config.config_dir, PathBuf::from("tmp"));

        let zero = config_from(&[("FORKSH_MAX_LINE", "0")]);
        assert_eq!(zero.max_line, DEFAULT_MAX_LINE);
    }
}
