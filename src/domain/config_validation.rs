//! Configuration validation.
//!
//! Validates all config fields before a run starts.

use crate::domain::error::SievetraderError;
use crate::domain::screen::ScreenKind;
use crate::domain::snapshot::Metric;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SievetraderError> {
    validate_initial_capital(config)?;
    validate_max_positions(config)?;
    validate_trailing_stop(config, "backtest")?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_screen_config(config: &dyn ConfigPort) -> Result<(), SievetraderError> {
    validate_screen_name(config)?;
    validate_screen_kind(config)?;
    validate_allocated_capital(config)?;
    validate_min_surprise(config)?;
    validate_filter_bounds(config)?;
    Ok(())
}

pub fn validate_account_config(config: &dyn ConfigPort) -> Result<(), SievetraderError> {
    let value = config.get_int("account", "max_positions", 10);
    if value < 1 {
        return Err(SievetraderError::ConfigInvalid {
            section: "account".to_string(),
            key: "max_positions".to_string(),
            reason: "max_positions must be at least 1".to_string(),
        });
    }
    validate_trailing_stop(config, "account")?;
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), SievetraderError> {
    let value = config.get_double("backtest", "initial_capital", 0.0);
    if value <= 0.0 {
        return Err(SievetraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_max_positions(config: &dyn ConfigPort) -> Result<(), SievetraderError> {
    let value = config.get_int("backtest", "max_positions", 10);
    if value < 1 {
        return Err(SievetraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "max_positions".to_string(),
            reason: "max_positions must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_trailing_stop(config: &dyn ConfigPort, section: &str) -> Result<(), SievetraderError> {
    let value = config.get_double(section, "trailing_stop_pct", 2.0);
    if value <= 0.0 || value >= 100.0 {
        return Err(SievetraderError::ConfigInvalid {
            section: section.to_string(),
            key: "trailing_stop_pct".to_string(),
            reason: "trailing_stop_pct must be between 0 and 100 exclusive".to_string(),
        });
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), SievetraderError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date > end_date {
        return Err(SievetraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must not be after end_date".to_string(),
        });
    }
    Ok(())
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, SievetraderError> {
    match value {
        None => Err(SievetraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| SievetraderError::ConfigInvalid {
                section: "backtest".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            })
        }
    }
}

fn validate_screen_name(config: &dyn ConfigPort) -> Result<(), SievetraderError> {
    match config.get_string("screen", "name") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(SievetraderError::ConfigMissing {
            section: "screen".to_string(),
            key: "name".to_string(),
        }),
    }
}

fn validate_screen_kind(config: &dyn ConfigPort) -> Result<(), SievetraderError> {
    match config.get_string("screen", "kind") {
        None => Err(SievetraderError::ConfigMissing {
            section: "screen".to_string(),
            key: "kind".to_string(),
        }),
        Some(s) => match ScreenKind::parse(s.trim()) {
            Some(_) => Ok(()),
            None => Err(SievetraderError::ConfigInvalid {
                section: "screen".to_string(),
                key: "kind".to_string(),
                reason: format!("unknown kind {s}, expected value or earnings"),
            }),
        },
    }
}

fn validate_allocated_capital(config: &dyn ConfigPort) -> Result<(), SievetraderError> {
    if let Some(value) = config.get_opt_double("screen", "allocated_capital") {
        if value <= 0.0 {
            return Err(SievetraderError::ConfigInvalid {
                section: "screen".to_string(),
                key: "allocated_capital".to_string(),
                reason: "allocated_capital must be positive".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_min_surprise(config: &dyn ConfigPort) -> Result<(), SievetraderError> {
    if let Some(value) = config.get_opt_double("screen", "min_surprise_pct") {
        if value < 0.0 {
            return Err(SievetraderError::ConfigInvalid {
                section: "screen".to_string(),
                key: "min_surprise_pct".to_string(),
                reason: "min_surprise_pct must be non-negative".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_filter_bounds(config: &dyn ConfigPort) -> Result<(), SievetraderError> {
    for metric in Metric::ALL {
        let min_key = format!("{}_min", metric.as_str());
        let max_key = format!("{}_max", metric.as_str());
        let min = config.get_opt_double("screen", &min_key);
        let max = config.get_opt_double("screen", &max_key);
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(SievetraderError::ConfigInvalid {
                    section: "screen".to_string(),
                    key: min_key,
                    reason: format!("{} exceeds {}", metric.as_str(), max_key),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn valid_backtest_config_passes() {
        let config = make_config(
            r#"
[backtest]
initial_capital = 10000.0
max_positions = 10
trailing_stop_pct = 2.0
start_date = 2024-01-01
end_date = 2024-06-30
"#,
        );
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn initial_capital_must_be_positive() {
        let config = make_config(
            "[backtest]\ninitial_capital = -100\nstart_date = 2024-01-01\nend_date = 2024-06-30\n",
        );
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, SievetraderError::ConfigInvalid { key, .. } if key == "initial_capital")
        );
    }

    #[test]
    fn missing_initial_capital_fails() {
        let config =
            make_config("[backtest]\nstart_date = 2024-01-01\nend_date = 2024-06-30\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, SievetraderError::ConfigInvalid { key, .. } if key == "initial_capital")
        );
    }

    #[test]
    fn max_positions_zero_fails() {
        let config = make_config("[backtest]\ninitial_capital = 100\nmax_positions = 0\nstart_date = 2024-01-01\nend_date = 2024-06-30\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, SievetraderError::ConfigInvalid { key, .. } if key == "max_positions")
        );
    }

    #[test]
    fn trailing_stop_out_of_range_fails() {
        for bad in ["0", "-2", "100", "150"] {
            let config = make_config(&format!(
                "[backtest]\ninitial_capital = 100\ntrailing_stop_pct = {bad}\nstart_date = 2024-01-01\nend_date = 2024-06-30\n"
            ));
            let err = validate_backtest_config(&config).unwrap_err();
            assert!(
                matches!(err, SievetraderError::ConfigInvalid { key, .. } if key == "trailing_stop_pct"),
                "trailing_stop_pct = {bad} should fail"
            );
        }
    }

    #[test]
    fn invalid_start_date_format_fails() {
        let config = make_config("[backtest]\ninitial_capital = 100\nstart_date = 2024/01/01\nend_date = 2024-06-30\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, SievetraderError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn missing_end_date_fails() {
        let config = make_config("[backtest]\ninitial_capital = 100\nstart_date = 2024-01-01\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, SievetraderError::ConfigMissing { key, .. } if key == "end_date"));
    }

    #[test]
    fn start_after_end_fails() {
        let config = make_config("[backtest]\ninitial_capital = 100\nstart_date = 2024-06-30\nend_date = 2024-01-01\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, SievetraderError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn single_day_range_is_allowed() {
        let config = make_config("[backtest]\ninitial_capital = 100\nstart_date = 2024-03-13\nend_date = 2024-03-13\n");
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn valid_screen_config_passes() {
        let config = make_config(
            r#"
[screen]
name = Deep Value
kind = value
allocated_capital = 25000
min_surprise_pct = 5.0
pe_ratio_max = 25
pb_ratio_min = 0.5
pb_ratio_max = 3.0
"#,
        );
        assert!(validate_screen_config(&config).is_ok());
    }

    #[test]
    fn missing_screen_name_fails() {
        let config = make_config("[screen]\nkind = value\n");
        let err = validate_screen_config(&config).unwrap_err();
        assert!(matches!(err, SievetraderError::ConfigMissing { key, .. } if key == "name"));
    }

    #[test]
    fn unknown_screen_kind_fails() {
        let config = make_config("[screen]\nname = x\nkind = growth\n");
        let err = validate_screen_config(&config).unwrap_err();
        assert!(matches!(err, SievetraderError::ConfigInvalid { key, .. } if key == "kind"));
    }

    #[test]
    fn allocated_capital_zero_fails() {
        let config = make_config("[screen]\nname = x\nkind = earnings\nallocated_capital = 0\n");
        let err = validate_screen_config(&config).unwrap_err();
        assert!(
            matches!(err, SievetraderError::ConfigInvalid { key, .. } if key == "allocated_capital")
        );
    }

    #[test]
    fn negative_surprise_threshold_fails() {
        let config = make_config("[screen]\nname = x\nkind = earnings\nmin_surprise_pct = -1\n");
        let err = validate_screen_config(&config).unwrap_err();
        assert!(
            matches!(err, SievetraderError::ConfigInvalid { key, .. } if key == "min_surprise_pct")
        );
    }

    #[test]
    fn inverted_filter_bounds_fail() {
        let config =
            make_config("[screen]\nname = x\nkind = value\npe_ratio_min = 30\npe_ratio_max = 10\n");
        let err = validate_screen_config(&config).unwrap_err();
        assert!(
            matches!(err, SievetraderError::ConfigInvalid { key, .. } if key == "pe_ratio_min")
        );
    }

    #[test]
    fn one_sided_filter_bounds_pass() {
        let config = make_config("[screen]\nname = x\nkind = value\npe_ratio_max = 25\n");
        assert!(validate_screen_config(&config).is_ok());
    }

    #[test]
    fn valid_account_config_passes() {
        let config = make_config("[account]\nmax_positions = 10\nautomation_enabled = true\n");
        assert!(validate_account_config(&config).is_ok());
    }

    #[test]
    fn account_max_positions_zero_fails() {
        let config = make_config("[account]\nmax_positions = 0\n");
        let err = validate_account_config(&config).unwrap_err();
        assert!(
            matches!(err, SievetraderError::ConfigInvalid { key, .. } if key == "max_positions")
        );
    }

    #[test]
    fn empty_account_section_uses_defaults() {
        let config = make_config("[account]\n");
        assert!(validate_account_config(&config).is_ok());
    }
}
