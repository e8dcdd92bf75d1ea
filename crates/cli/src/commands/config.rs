use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dsreco_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields: [(&str, String, &[&str]); 6] = [
        ("database.url", config.database.url.clone(), &["DSRECO_DATABASE_URL"]),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["DSRECO_DATABASE_MAX_CONNECTIONS"],
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["DSRECO_DATABASE_TIMEOUT_SECS"],
        ),
        ("recommender.top_k", config.recommender.top_k.to_string(), &["DSRECO_RECOMMENDER_TOP_K"]),
        (
            "logging.level",
            config.logging.level.clone(),
            &["DSRECO_LOGGING_LEVEL", "DSRECO_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            &["DSRECO_LOGGING_FORMAT", "DSRECO_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_keys) in &fields {
        let source = field_source(
            key,
            env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(key, value, source));
    }

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    ["dsreco.toml", "config/dsreco.toml"].into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use super::{contains_path, field_source};

    #[test]
    fn nested_keys_are_resolved_in_toml_documents() {
        let doc: toml::Value = "[recommender]\ntop_k = 3\n".parse().expect("toml");
        assert!(contains_path(&doc, "recommender.top_k"));
        assert!(!contains_path(&doc, "recommender.weights"));
        assert!(!contains_path(&doc, "database.url"));
    }

    #[test]
    fn file_source_is_reported_before_default() {
        let doc: toml::Value = "[recommender]\ntop_k = 3\n".parse().expect("toml");
        let path = std::path::Path::new("dsreco.toml");

        assert_eq!(
            field_source("recommender.top_k", &["DSRECO_TEST_UNSET_KEY"], Some(&doc), Some(path)),
            "file (dsreco.toml)"
        );
        assert_eq!(
            field_source("logging.level", &["DSRECO_TEST_UNSET_KEY"], Some(&doc), Some(path)),
            "default"
        );
    }
}
