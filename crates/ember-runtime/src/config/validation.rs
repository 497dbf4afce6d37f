//! Configuration validation utilities.

use ember_framework::CommandSettings;

use super::error::{ConfigError, ConfigResult};
use super::schema::{CooldownBackend, CooldownConfig, EmberConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &EmberConfig) -> ConfigResult<()> {
    validate_commands(&config.commands)?;
    validate_cooldown(&config.cooldown)?;
    validate_logging(&config.logging)?;
    Ok(())
}

/// Validates command recognition settings.
fn validate_commands(commands: &CommandSettings) -> ConfigResult<()> {
    if commands.prefixes.is_empty() && !commands.mention_prefix {
        return Err(ConfigError::validation(
            "At least one prefix is required when mention prefixes are disabled",
        ));
    }

    if let Some(blank) = commands.prefixes.iter().position(|p| p.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "Command prefix #{blank} is blank"
        )));
    }

    if let Some(bot_id) = &commands.bot_id
        && bot_id.trim().is_empty()
    {
        return Err(ConfigError::validation("Bot id must not be blank"));
    }

    Ok(())
}

/// Validates cooldown settings.
fn validate_cooldown(cooldown: &CooldownConfig) -> ConfigResult<()> {
    if cooldown.cooldown_ms == 0 {
        return Err(ConfigError::validation(
            "Cooldown time must be greater than 0",
        ));
    }

    if cooldown.max_times == 0 {
        return Err(ConfigError::validation("Max times must be at least 1"));
    }

    if cooldown.backend == CooldownBackend::Redis {
        match &cooldown.redis_url {
            None => return Err(ConfigError::missing_field("cooldown.redis_url")),
            Some(url) if url.trim().is_empty() => {
                return Err(ConfigError::missing_field("cooldown.redis_url"));
            }
            Some(_) => {}
        }
        if cooldown.hash_key.is_empty() {
            return Err(ConfigError::missing_field("cooldown.hash_key"));
        }
    }

    Ok(())
}

/// Validates logging settings.
fn validate_logging(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&EmberConfig::default()).is_ok());
    }

    #[test]
    fn test_prefix_rules() {
        let mut config = EmberConfig::default();
        config.commands.prefixes.clear();
        assert!(validate_config(&config).is_ok());

        config.commands.mention_prefix = false;
        assert!(validate_config(&config).is_err());

        config.commands.prefixes = vec!["!".into(), "  ".into()];
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("#1"));
    }

    #[test]
    fn test_cooldown_rules() {
        let mut config = EmberConfig::default();
        config.cooldown.max_times = 0;
        assert!(validate_config(&config).is_err());

        let mut config = EmberConfig::default();
        config.cooldown.cooldown_ms = 0;
        assert!(validate_config(&config).is_err());

        let mut config = EmberConfig::default();
        config.cooldown.backend = CooldownBackend::Redis;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { .. })
        ));
        config.cooldown.redis_url = Some("redis://127.0.0.1/".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_file_output_needs_path() {
        let mut config = EmberConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());
        config.logging.file_path = Some("ember.log".into());
        assert!(validate_config(&config).is_ok());
    }
}
