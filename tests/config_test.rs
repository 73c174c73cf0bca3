use ratatui::style::Color;
use salesdash::config::{AppConfig, ConfigManager, Theme};
use salesdash::schema::Field;
use std::fs;
use tempfile::TempDir;

// Helper to create a temporary config directory for testing
fn setup_test_config_dir() -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_manager = ConfigManager::with_dir(temp_dir.path().to_path_buf());
    (temp_dir, config_manager)
}

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_default_config() {
    let config = AppConfig::default();

    assert_eq!(config.version, "0.1");
    assert_eq!(config.performance.event_poll_interval_ms, 25);
    assert_eq!(config.display.start_page, "overview");
    assert_eq!(config.display.default_metric, "transactions");
    assert_eq!(config.display.heat_value, "profit");
    assert_eq!(config.columns.header(Field::SubCategory), "sub_category");
    assert_eq!(config.file_loading.delimiter, None);
    assert!(!config.debug.enabled);
    assert_eq!(config.debug.log_level, "info");
}

#[test]
fn test_write_default_config() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let path = config_manager.write_default_config(false).unwrap();
    assert!(path.exists());
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("[columns]"));
    assert!(content.contains("Tipo Entrega"));
    assert_eq!(content, config_manager.generate_default_config());
}

#[test]
fn test_write_config_without_force_fails_if_exists() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    config_manager.write_default_config(false).unwrap();
    let err = config_manager.write_default_config(false).unwrap_err();
    assert!(err.to_string().contains("--force"));
}

#[test]
fn test_write_config_with_force_overwrites() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let path = config_manager.config_path("config.toml");
    config_manager.ensure_config_dir().unwrap();
    fs::write(&path, "version = \"0.1\"\n").unwrap();

    config_manager.write_default_config(true).unwrap();
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("[theme.colors]"));
}

#[test]
fn test_load_partial_config_keeps_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[file_loading]
delimiter = 59

[columns]
sale = "Venda"
profit = "Lucro"

[display]
default_metric = "profit"
"#,
    );

    let config = AppConfig::load_from_path(&path).unwrap();
    assert_eq!(config.file_loading.delimiter, Some(b';'));
    assert_eq!(config.columns.header(Field::Sale), "Venda");
    assert_eq!(config.columns.header(Field::Profit), "Lucro");
    assert_eq!(config.columns.header(Field::Region), "region");
    assert_eq!(config.display.default_metric, "profit");
    assert_eq!(config.display.start_page, "overview");
    assert_eq!(config.theme.colors.bar, "#3399cc");
}

#[test]
fn test_merge_does_not_override_with_defaults() {
    let mut base = AppConfig::default();
    base.display.heat_value = "quantity".to_string();
    base.performance.event_poll_interval_ms = 50;

    base.merge(AppConfig::default());
    assert_eq!(base.display.heat_value, "quantity");
    assert_eq!(base.performance.event_poll_interval_ms, 50);
}

#[test]
fn test_validate_config_invalid_version() {
    let mut config = AppConfig::default();
    config.version = "2.0".to_string();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("Unsupported config version"));
}

#[test]
fn test_validate_config_zero_event_poll_interval() {
    let mut config = AppConfig::default();
    config.performance.event_poll_interval_ms = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_unknown_names() {
    let mut config = AppConfig::default();
    config.display.default_metric = "margin".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.display.start_page = "charts".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.display.heat_value = "sale".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.file_loading.compression = Some("rar".to_string());
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_config_with_invalid_color() {
    std::env::remove_var("NO_COLOR");
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[theme.colors]\nbar = \"not-a-color\"\n");
    let err = AppConfig::load_from_path(&path).unwrap_err();
    assert!(err.to_string().contains("bar"), "{}", err);
}

#[test]
fn test_validate_duplicate_column_mapping() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[columns]\nstate = \"Estado\"\nregion = \"Estado\"\n");
    assert!(AppConfig::load_from_path(&path).is_err());
}

#[test]
fn test_unparseable_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[display\n");
    let err = AppConfig::load_from_path(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn test_theme_colors_load_into_theme() {
    std::env::remove_var("NO_COLOR");
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[theme.colors]\nborder = \"magenta\"\n");
    let config = AppConfig::load_from_path(&path).unwrap();

    let theme = Theme::from_config(&config.theme).unwrap();
    assert_eq!(theme.get("border"), Color::Magenta);
    assert_eq!(theme.get("profit_negative"), Color::Red);
    assert!(!config_template_mentions("color_mode"));
}

fn config_template_mentions(key: &str) -> bool {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    config_manager.generate_default_config().contains(key)
}
