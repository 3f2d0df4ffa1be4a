use console::style;
use meridian_core::MeridianError;
use std::fmt;

/// Error with context and suggestions, printed to stderr
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Input that is neither GeoJSON, WKT, nor a readable file
pub fn geometry_unreadable(input: &str, reason: &str) -> CliError {
    let shown: String = input.chars().take(60).collect();
    CliError::new("Cannot read geometry")
        .with_context(format!("Input: {}\n\nReason: {}", shown, reason))
        .with_suggestion("Pass GeoJSON, e.g. '{\"type\":\"Point\",\"coordinates\":[10,50]}'")
        .with_suggestion("Or WKT, e.g. 'LINESTRING(170 0, -170 0)'")
        .with_suggestion("Or the path of a file containing either")
}

/// Coordinate text no notation could read
pub fn coordinate_unparsed(text: &str) -> CliError {
    CliError::new("Could not parse coordinates")
        .with_context(format!("Text: {}", text))
        .with_suggestion("Use hemisphere letters to fix the order: 40N 105W")
        .with_suggestion("Or pass --order lat-first / --order lon-first")
        .with_help("Run: meridian parse --help")
}

/// Buffer distance refused by the engine
pub fn buffer_refused(error: &MeridianError) -> CliError {
    let err = CliError::new("Buffer not built").with_context(error.to_string());
    match error {
        MeridianError::AccuracyLimit { .. } => err
            .with_suggestion("Use a smaller distance")
            .with_suggestion("Or buffer in steps, checking the result each time"),
        MeridianError::CannotSplit { .. } => err
            .with_suggestion("Raise max_split_boxes in meridian.toml")
            .with_suggestion("Or use a smaller inward distance"),
        _ => err.with_help("Run: meridian buffer --help"),
    }
}

/// Create error for invalid configuration
pub fn invalid_config(key: &str, reason: &str) -> CliError {
    CliError::new(format!("Invalid configuration: {}", key))
        .with_context(format!("Configuration value is invalid.\n\nReason: {}", reason))
        .with_suggestion("Check meridian.toml for syntax errors")
        .with_suggestion("Or unset the matching MERIDIAN_* environment variable")
        .with_help("Run: meridian config")
}

/// Convert anyhow::Error to CliError with context
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    if let Some(cli) = error.downcast_ref::<CliError>() {
        return CliError {
            message: cli.message.clone(),
            context: cli.context.clone(),
            suggestions: cli.suggestions.clone(),
            help_command: cli.help_command.clone(),
        };
    }
    if let Some(MeridianError::ConfigInvalid { key, reason }) = error.downcast_ref::<MeridianError>() {
        return invalid_config(key, reason);
    }

    let message = format!("{:#}", error);
    if message.contains("No such file or directory") {
        CliError::new("File not found")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Check the file path and try again")
    } else if message.contains("permission denied") {
        CliError::new("Permission denied")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Check file permissions")
    } else {
        CliError::new(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_anyhow_keeps_cli_error() {
        let err = anyhow::Error::new(coordinate_unparsed("nonsense"));
        let cli = from_anyhow(err);
        assert_eq!(cli.message, "Could not parse coordinates");
        assert_eq!(cli.suggestions.len(), 2);
    }

    #[test]
    fn test_from_anyhow_maps_config_errors() {
        let err = anyhow::Error::new(MeridianError::ConfigInvalid {
            key: "spacing".to_string(),
            reason: "expected a positive value".to_string(),
        });
        assert_eq!(from_anyhow(err).message, "Invalid configuration: spacing");
    }

    #[test]
    fn test_buffer_refused_suggestions() {
        let err = buffer_refused(&MeridianError::AccuracyLimit { distance: 7e5, limit: 663_470.0 });
        assert!(err.suggestions[0].contains("smaller distance"));
    }
}
