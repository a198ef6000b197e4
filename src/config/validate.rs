//! Configuration validation: unknown field detection and value sanity checks.

use serde_json::Value;
use std::collections::HashSet;

use super::Config;

/// Known top-level config field names.
const KNOWN_TOP_LEVEL: &[&str] = &["agent", "sessions", "provider", "gateway", "store", "logging"];

/// Known fields for each section, keyed by section name.
const KNOWN_SECTIONS: &[(&str, &[&str])] = &[
    (
        "agent",
        &[
            "system_prompt",
            "model",
            "max_tokens",
            "temperature",
            "max_tool_iterations",
            "history_window",
            "iteration_timeout_secs",
            "tool_timeout_secs",
        ],
    ),
    ("sessions", &["max_history", "ttl_secs"]),
    ("provider", &["api_base", "api_key", "max_retries", "timeout_secs"]),
    ("gateway", &["host", "port"]),
    ("store", &["documents_path"]),
    ("logging", &["format", "level", "file"]),
];

/// A validation diagnostic.
#[derive(Debug)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub path: String,
    pub message: String,
}

#[derive(Debug, PartialEq)]
pub enum DiagnosticLevel {
    Ok,
    Warn,
    Error,
}

impl Diagnostic {
    fn new(level: DiagnosticLevel, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.level {
            DiagnosticLevel::Ok => "[OK]",
            DiagnosticLevel::Warn => "[WARN]",
            DiagnosticLevel::Error => "[ERROR]",
        };
        if self.path.is_empty() {
            write!(f, "{} {}", prefix, self.message)
        } else {
            write!(f, "{} {}: {}", prefix, self.path, self.message)
        }
    }
}

/// Simple Levenshtein distance for "did you mean?" suggestions.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Suggest the closest known field name (if distance <= 3).
pub fn suggest_field(unknown: &str, known: &[&str]) -> Option<String> {
    known
        .iter()
        .map(|k| (k, levenshtein(unknown, k)))
        .filter(|(_, d)| *d <= 3)
        .min_by_key(|(_, d)| *d)
        .map(|(k, _)| format!("did you mean '{}'?", k))
}

fn unknown_field(path: String, key: &str, known: &[&str]) -> Diagnostic {
    let message = match suggest_field(key, known) {
        Some(hint) => format!("Unknown field '{}' - {}", key, hint),
        None => format!("Unknown field '{}'", key),
    };
    Diagnostic::new(DiagnosticLevel::Error, path, message)
}

/// Validate a raw JSON config value against known field names.
pub fn validate_config(raw: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let obj = match raw.as_object() {
        Some(o) => o,
        None => {
            diagnostics.push(Diagnostic::new(
                DiagnosticLevel::Error,
                "",
                "Config must be a JSON object",
            ));
            return diagnostics;
        }
    };

    diagnostics.push(Diagnostic::new(DiagnosticLevel::Ok, "", "Valid JSON"));

    let known_set: HashSet<&str> = KNOWN_TOP_LEVEL.iter().copied().collect();
    let mut has_unknown = false;
    for key in obj.keys() {
        if !known_set.contains(key.as_str()) {
            has_unknown = true;
            diagnostics.push(unknown_field(key.clone(), key, KNOWN_TOP_LEVEL));
        }
    }

    for (section, fields) in KNOWN_SECTIONS {
        let Some(inner) = obj.get(*section).and_then(|v| v.as_object()) else {
            continue;
        };
        for key in inner.keys() {
            if !fields.contains(&key.as_str()) {
                has_unknown = true;
                diagnostics.push(unknown_field(format!("{}.{}", section, key), key, fields));
            }
        }
    }

    if !has_unknown {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Ok,
            "",
            "All fields recognized",
        ));
    }

    diagnostics
}

impl Config {
    /// Check loaded values for settings the service cannot run with.
    ///
    /// Returns only `Warn` and `Error` diagnostics; an empty vector means the
    /// configuration is usable as is.
    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut out = Vec::new();

        if self.agent.max_tool_iterations == 0 {
            out.push(Diagnostic::new(
                DiagnosticLevel::Error,
                "agent.max_tool_iterations",
                "must be at least 1",
            ));
        }
        if self.agent.model.trim().is_empty() {
            out.push(Diagnostic::new(
                DiagnosticLevel::Error,
                "agent.model",
                "must not be empty",
            ));
        }
        if !(0.0..=2.0).contains(&self.agent.temperature) {
            out.push(Diagnostic::new(
                DiagnosticLevel::Error,
                "agent.temperature",
                format!("{} is outside 0.0..=2.0", self.agent.temperature),
            ));
        }
        if self.agent.iteration_timeout_secs == 0 || self.agent.tool_timeout_secs == 0 {
            out.push(Diagnostic::new(
                DiagnosticLevel::Error,
                "agent",
                "timeouts must be at least 1 second",
            ));
        }

        let cap = self.sessions.max_history;
        if cap == 0 {
            out.push(Diagnostic::new(
                DiagnosticLevel::Error,
                "sessions.max_history",
                "must be at least 2",
            ));
        } else if cap % 2 != 0 {
            out.push(Diagnostic::new(
                DiagnosticLevel::Error,
                "sessions.max_history",
                format!("{} is odd; history is trimmed in user/assistant pairs", cap),
            ));
        }
        if self.sessions.ttl_secs == 0 {
            out.push(Diagnostic::new(
                DiagnosticLevel::Error,
                "sessions.ttl_secs",
                "must be at least 1",
            ));
        }
        if cap > 0 && self.agent.history_window > cap {
            out.push(Diagnostic::new(
                DiagnosticLevel::Warn,
                "agent.history_window",
                format!(
                    "{} exceeds sessions.max_history ({}); only {} entries can ever be sent",
                    self.agent.history_window, cap, cap
                ),
            ));
        }

        if self.provider.api_base.trim().is_empty() {
            out.push(Diagnostic::new(
                DiagnosticLevel::Error,
                "provider.api_base",
                "must not be empty",
            ));
        }

        out
    }

    /// True when [`Config::validate`] reports no errors (warnings allowed).
    pub fn is_valid(&self) -> bool {
        self.validate()
            .iter()
            .all(|d| d.level != DiagnosticLevel::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("hello", "hello"), 0);
        assert_eq!(levenshtein("hello", "helo"), 1);
        assert!(levenshtein("hello", "world") > 3);
    }

    #[test]
    fn test_suggest_field_match() {
        let result = suggest_field("sesions", KNOWN_TOP_LEVEL);
        assert!(result.unwrap().contains("sessions"));
        assert!(suggest_field("xyzabc", KNOWN_TOP_LEVEL).is_none());
    }

    #[test]
    fn test_validate_valid_config() {
        let raw = json!({
            "agent": {"model": "mistral", "max_tool_iterations": 3},
            "sessions": {"ttl_secs": 60},
            "gateway": {"port": 8080}
        });
        let diags = validate_config(&raw);
        assert!(diags.iter().all(|d| d.level != DiagnosticLevel::Error));
        assert!(diags.iter().any(|d| d.message == "All fields recognized"));
    }

    #[test]
    fn test_validate_unknown_nested_field() {
        let raw = json!({"sessions": {"max_histroy": 10}});
        let diags = validate_config(&raw);
        let err = diags
            .iter()
            .find(|d| d.level == DiagnosticLevel::Error)
            .unwrap();
        assert_eq!(err.path, "sessions.max_histroy");
        assert!(err.message.contains("did you mean 'max_history'?"));
    }

    #[test]
    fn test_validate_not_an_object() {
        let diags = validate_config(&json!("not an object"));
        assert!(diags
            .iter()
            .any(|d| d.level == DiagnosticLevel::Error && d.message.contains("JSON object")));
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_empty());
        assert!(config.is_valid());
    }

    #[test]
    fn test_zero_iterations_and_odd_cap_are_errors() {
        let mut config = Config::default();
        config.agent.max_tool_iterations = 0;
        config.sessions.max_history = 7;
        let diags = config.validate();
        assert!(diags
            .iter()
            .any(|d| d.path == "agent.max_tool_iterations" && d.level == DiagnosticLevel::Error));
        assert!(diags
            .iter()
            .any(|d| d.path == "sessions.max_history" && d.message.contains("odd")));
        assert!(!config.is_valid());
    }

    #[test]
    fn test_window_larger_than_cap_is_only_a_warning() {
        let mut config = Config::default();
        config.agent.history_window = 40;
        let diags = config.validate();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].level, DiagnosticLevel::Warn);
        assert!(config.is_valid());
    }

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic::new(DiagnosticLevel::Warn, "gateway.port", "odd choice");
        assert_eq!(d.to_string(), "[WARN] gateway.port: odd choice");
        let d = Diagnostic::new(DiagnosticLevel::Ok, "", "Valid JSON");
        assert_eq!(d.to_string(), "[OK] Valid JSON");
    }
}
