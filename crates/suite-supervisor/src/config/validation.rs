use super::*;
use anyhow::{anyhow, Result};

/// Validate the complete configuration
pub fn validate_config(config: &SupervisorConfig) -> Result<()> {
    validate_identity(config)?;
    validate_command(config)?;
    validate_readiness(&config.readiness)?;
    Ok(())
}

fn validate_identity(config: &SupervisorConfig) -> Result<()> {
    if config.name.is_empty() {
        return Err(anyhow!("Server name cannot be empty"));
    }

    if config.name.len() > 64 {
        return Err(anyhow!("Server name too long (max 64 characters): {}", config.name));
    }

    if config.host.trim().is_empty() {
        return Err(anyhow!("Host cannot be empty"));
    }

    if config.port == 0 {
        return Err(anyhow!("Port must be between 1 and 65535, got: {}", config.port));
    }

    Ok(())
}

fn validate_command(config: &SupervisorConfig) -> Result<()> {
    suite_process::validate_command(&config.command)?;

    for key in config.environment.keys() {
        if key.is_empty() || key.contains('=') {
            return Err(anyhow!("Invalid environment variable name: '{}'", key));
        }
    }

    Ok(())
}

fn validate_readiness(readiness: &ReadinessConfig) -> Result<()> {
    if readiness.max_attempts == 0 {
        return Err(anyhow!("Readiness max_attempts must be greater than 0"));
    }

    if readiness.request_timeout.is_zero() {
        return Err(anyhow!("Readiness request_timeout must be greater than 0"));
    }

    if readiness.path.contains(char::is_whitespace) {
        return Err(anyhow!("Readiness path cannot contain whitespace: '{}'", readiness.path));
    }

    Ok(())
}
