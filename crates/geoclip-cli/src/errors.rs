use console::style;

/// Error printed to stderr when a command fails
pub struct CliError {
    pub message: String,
    pub causes: Vec<String>,
    pub suggestions: Vec<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), causes: Vec::new(), suggestions: Vec::new() }
    }

    /// Top-level message plus the chain of underlying causes
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let mut chain = err.chain().map(|cause| cause.to_string());
        let mut cli_error = Self::new(chain.next().unwrap_or_default());
        cli_error.causes = chain.collect();

        if cli_error.causes.iter().chain(std::iter::once(&cli_error.message)).any(|m| m.contains("PROJ")) {
            cli_error = cli_error.with_suggestion("Check that the PROJ database is installed and PROJ_DATA points at it");
        }
        cli_error
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}", style("✗").red().bold(), style(&self.message).red().bold());

        for cause in &self.causes {
            eprintln!("  {} {}", style("caused by:").dim(), cause);
        }

        if !self.suggestions.is_empty() {
            eprintln!();
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_from_anyhow_keeps_cause_chain() {
        let err = std::fs::read("/definitely/not/here.json")
            .context("Failed to read job file")
            .unwrap_err();

        let cli_error = CliError::from_anyhow(&err);
        assert_eq!(cli_error.message, "Failed to read job file");
        assert_eq!(cli_error.causes.len(), 1);
        assert!(cli_error.suggestions.is_empty());
    }
}
