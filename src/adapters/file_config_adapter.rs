//! INI file configuration adapter.

use crate::domain::error::ScripxirrError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;
use tracing::debug;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScripxirrError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| ScripxirrError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        debug!(path = %path.display(), sections = config.sections().len(), "config loaded");
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, ScripxirrError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| ScripxirrError::ConfigParse {
                file: "<inline>".into(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
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
[input]
transactions = data/PF_Transactions.csv
date_format = %d-%b-%y

[portfolio]
exclude_codes = CRISIL
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("input", "transactions"),
            Some("data/PF_Transactions.csv".to_string())
        );
        assert_eq!(
            adapter.get_string("input", "date_format"),
            Some("%d-%b-%y".to_string())
        );
        assert_eq!(
            adapter.get_string("portfolio", "exclude_codes"),
            Some("CRISIL".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[input]\nvaluations = s.csv\n").unwrap();
        assert_eq!(adapter.get_string("input", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_value() {
        let adapter = FileConfigAdapter::from_string("[solver]\nmax_iterations = 50\n").unwrap();
        assert_eq!(adapter.get_int("solver", "max_iterations", 0), 50);
    }

    #[test]
    fn get_int_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[solver]\n").unwrap();
        assert_eq!(adapter.get_int("solver", "missing", 42), 42);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[columns]\ndate = twelve\n").unwrap();
        assert_eq!(adapter.get_int("columns", "date", 12), 12);
    }

    #[test]
    fn get_double_returns_value() {
        let adapter = FileConfigAdapter::from_string("[solver]\nbracket_high = 250.5\n").unwrap();
        assert_eq!(adapter.get_double("solver", "bracket_high", 0.0), 250.5);
    }

    #[test]
    fn get_double_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[solver]\ninitial_guess = not_a_number\n").unwrap();
        assert_eq!(adapter.get_double("solver", "initial_guess", 0.1), 0.1);
    }

    #[test]
    fn get_list_splits_and_trims() {
        let adapter = FileConfigAdapter::from_string(
            "[input]\nbuy_labels = Buy, B ,,Purchase\n\n[portfolio]\nexclude_codes = ,\n",
        )
        .unwrap();
        assert_eq!(
            adapter.get_list("input", "buy_labels"),
            Some(vec!["Buy".to_string(), "B".to_string(), "Purchase".to_string()])
        );
        assert_eq!(adapter.get_list("portfolio", "exclude_codes"), Some(vec![]));
        assert_eq!(adapter.get_list("portfolio", "missing"), None);
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[report]\noutput_dir = /tmp/reports\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("report", "output_dir"),
            Some("/tmp/reports".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(
            result,
            Err(ScripxirrError::ConfigParse { file, .. }) if file.contains("config.ini")
        ));
    }
}
