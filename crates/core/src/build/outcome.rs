/// Result of one build tool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    successful: bool,
    output: String,
    error_output: Option<String>,
}

impl BuildOutcome {
    pub fn success(output: String) -> Self {
        Self {
            successful: true,
            output,
            error_output: None,
        }
    }

    pub fn failure(output: String, error_output: String) -> Self {
        Self {
            successful: false,
            output,
            error_output: Some(error_output),
        }
    }

    pub fn was_successful(&self) -> bool {
        self.successful
    }

    /// Full log at the configured verbosity.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Errors-only log; `None` for successful builds.
    pub fn error_output(&self) -> Option<&str> {
        self.error_output.as_deref()
    }

    pub(crate) fn into_parts(self) -> (String, Option<String>) {
        (self.output, self.error_output)
    }
}
