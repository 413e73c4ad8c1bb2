//! INI file configuration adapter.
//!
//! Section and key lookups are case-insensitive, so `[instrument.NIFTY]`
//! is found as `instrument.nifty` as well.

use crate::domain::error::SniperError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SniperError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| SniperError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[session]
instruments = NIFTY,BANKNIFTY
lookback = 300

[risk]
capital = 100000.0
stop_loss = 0.05
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("session", "instruments"),
            Some("NIFTY,BANKNIFTY".to_string())
        );
        assert_eq!(adapter.get_string("session", "lookback"), Some("300".to_string()));
        assert_eq!(adapter.get_string("risk", "stop_loss"), Some("0.05".to_string()));
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[risk]\ncapital = 100\n").unwrap();
        assert_eq!(adapter.get_string("risk", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn section_lookup_ignores_case() {
        let adapter =
            FileConfigAdapter::from_string("[instrument.NIFTY]\nlot_size = 75\n").unwrap();
        assert_eq!(
            adapter.get_string("instrument.NIFTY", "lot_size"),
            Some("75".to_string())
        );
        assert_eq!(
            adapter.get_string("instrument.nifty", "LOT_SIZE"),
            Some("75".to_string())
        );
    }

    #[test]
    fn clock_values_survive_the_colon() {
        let adapter = FileConfigAdapter::from_string("[friday]\nforced_exit = 15:20\n").unwrap();
        assert_eq!(
            adapter.get_string("friday", "forced_exit"),
            Some("15:20".to_string())
        );
    }

    #[test]
    fn unknown_boolean_falls_back_to_default() {
        let adapter = FileConfigAdapter::from_string("[risk]\nreversal_exit = maybe\n").unwrap();
        assert!(adapter.get_bool("risk", "reversal_exit", true));
        assert!(!adapter.get_bool("risk", "reversal_exit", false));
    }

    #[test]
    fn get_bool_values() {
        let adapter = FileConfigAdapter::from_string(
            "[risk]\na = true\nb = yes\nc = on\nd = false\ne = no\nf = off\n",
        )
        .unwrap();
        assert!(adapter.get_bool("risk", "a", false));
        assert!(adapter.get_bool("risk", "b", false));
        assert!(adapter.get_bool("risk", "c", false));
        assert!(!adapter.get_bool("risk", "d", true));
        assert!(!adapter.get_bool("risk", "e", true));
        assert!(!adapter.get_bool("risk", "f", true));
        assert!(adapter.get_bool("risk", "missing", true));
    }

    #[test]
    fn get_list_splits_and_trims() {
        let adapter =
            FileConfigAdapter::from_string("[session]\ninstruments = NIFTY, BANKNIFTY ,,SENSEX\n")
                .unwrap();
        assert_eq!(
            adapter.get_list("session", "instruments"),
            vec!["NIFTY", "BANKNIFTY", "SENSEX"]
        );
        assert!(adapter.get_list("session", "missing").is_empty());
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[session]\nutc_offset_minutes = 330\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("session", "utc_offset_minutes"),
            Some("330".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(SniperError::ConfigParse { .. })));
    }
}
