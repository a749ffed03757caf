//! Allows configuration stuff to be read from settings.json
//!
//! Both executables get their defaults passed in and let a local
//! settings.json override them, mostly so things can be pointed at a local
//! relay while testing.
use json::JsonValue;
use log::{info, warn};
use regex::Regex;
use std::{
    error::Error,
    fmt,
    io::ErrorKind,
};

#[derive(Debug)]
pub struct MissingConfigError {
    key: String,
}

impl fmt::Display for MissingConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Required configuration value '{}' is missing", self.key)
    }
}

impl Error for MissingConfigError {}

pub struct Config {
    filename: String,
    settings: JsonValue,
    defaults: JsonValue,
}

impl Config {
    pub fn build(filename: String, defaults: JsonValue) -> Result<Config, std::io::Error> {
        // Validate filename only contains valid characters and ends in .json
        let filename_regex = match Regex::new(r"^[a-zA-Z0-9_\-\.]+\.json$") {
            Ok(re) => re,
            Err(e) => {
                return Err(std::io::Error::new(ErrorKind::Other, e.to_string()));
            }
        };
        if !filename_regex.is_match(&filename) {
            return Err(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("Invalid filename '{}' - must contain only letters, numbers, underscore, dash, dot and end in .json", filename)
            ));
        }

        let mut config = Config {
            filename,
            settings: json::object! {},
            defaults,
        };

        if let Err(err) = config.load_from_file() {
            warn!("Using default settings: {}", err);
        }

        Ok(config)
    }

    fn load_from_file(&mut self) -> std::io::Result<()> {
        match std::fs::read_to_string(&self.filename) {
            Ok(raw_data) => match json::parse(&raw_data) {
                Ok(parsed) => {
                    self.settings.clone_from(&parsed);
                    info!("Loaded settings from {}", self.filename);
                    Ok(())
                }
                Err(err) => {
                    warn!("Failed to parse config file {}: {}", self.filename, err);
                    Ok(())
                }
            },
            Err(err) => Err(err),
        }
    }

    pub fn get_str_value(
        &self,
        key: &str,
        default: Option<String>,
    ) -> Result<String, MissingConfigError> {
        if let Some(val) = self.settings[key].as_str() {
            return Ok(val.to_string());
        }
        if let Some(def) = default {
            return Ok(def);
        }
        if let Some(val) = self.defaults[key].as_str() {
            return Ok(val.to_string());
        }
        Err(MissingConfigError {
            key: key.to_string(),
        })
    }

    pub fn get_u32_value(&self, key: &str, default: Option<u32>) -> Result<u32, MissingConfigError> {
        if let Some(val) = self.settings[key].as_u32() {
            return Ok(val);
        }
        if let Some(def) = default {
            return Ok(def);
        }
        if let Some(val) = self.defaults[key].as_u32() {
            return Ok(val);
        }
        Err(MissingConfigError {
            key: key.to_string(),
        })
    }

    pub fn set_value(&mut self, key: &str, val: impl Into<JsonValue>) -> Result<(), String> {
        let json_val = val.into();
        match json_val {
            JsonValue::Short(_)
            | JsonValue::String(_)
            | JsonValue::Boolean(_)
            | JsonValue::Number(_) => {
                self.settings[key] = json_val;
                Ok(())
            }
            _ => Err(format!("Unsupported value type for key: {}", key)),
        }
    }
}

#[cfg(test)]
mod test_config {
    use super::*;

    fn test_defaults() -> JsonValue {
        json::object! {
            "relay_host": "127.0.0.1",
            "port": 7891
        }
    }

    fn test_config(filename: &str) -> Config {
        match Config::build(filename.to_string(), test_defaults()) {
            Ok(config) => config,
            Err(e) => panic!("Failed to build config: {}", e),
        }
    }

    #[test]
    fn should_build_with_any_valid_name() {
        // a missing file is fine, you just get the defaults
        let config = test_config("no_such_settings.json");
        assert_eq!(config.filename, "no_such_settings.json");
    }

    #[test]
    fn should_error_with_invalid_name() {
        let boom = Config::build("I'm_;,`all_{jacked}_up".to_string(), test_defaults());
        match boom {
            Ok(_) => panic!("Expected error for invalid filename"),
            Err(e) => assert_eq!(e.kind(), ErrorKind::InvalidInput),
        }
    }

    #[test]
    fn should_get_defaults_with_no_file() {
        let config = test_config("no_such_settings.json");
        assert_eq!(
            config.get_str_value("relay_host", None).unwrap(),
            "127.0.0.1"
        );
        assert_eq!(config.get_u32_value("port", None).unwrap(), 7891);
    }

    #[test]
    fn explicit_default_wins_over_nothing() {
        let config = test_config("no_such_settings.json");
        assert_eq!(
            config.get_u32_value("i_dont_exist", Some(99)).unwrap(),
            99
        );
    }

    #[test]
    fn set_value_overrides_default() {
        let mut config = test_config("no_such_settings.json");
        config.set_value("port", 9000).unwrap();
        assert_eq!(config.get_u32_value("port", None).unwrap(), 9000);
    }

    #[test]
    fn error_on_missing_key() {
        let config = test_config("no_such_settings.json");
        let boom = config.get_str_value("i_dont_exist", None);
        assert!(boom.is_err());
        assert_eq!(
            boom.err().unwrap().to_string(),
            "Required configuration value 'i_dont_exist' is missing"
        );
    }

    #[test]
    fn set_value_with_unsupported_type() {
        let mut config = test_config("no_such_settings.json");
        let set_result = config.set_value("unsupported", json::array!["value1", "value2"]);
        assert!(set_result.is_err());
    }
}
