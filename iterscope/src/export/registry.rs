//! Format name to reporter factory mapping.
//!
//! Built-in formats are registered by [`ReporterRegistry::builtin`]; hosts may
//! add their own at startup with [`ReporterRegistry::register`].

use std::collections::BTreeMap;

use super::{
    ChromeTraceReporter, CsvReporter, HtmlPerfReporter, HtmlReporter, PlaintextReporter, Reporter,
};
use crate::config::Settings;
use crate::domain::ExportError;

/// Builds a reporter configured from the current settings.
pub type ReporterFactory = fn(&Settings) -> Box<dyn Reporter>;

#[derive(Clone, Default)]
pub struct ReporterRegistry {
    factories: BTreeMap<String, ReporterFactory>,
}

impl std::fmt::Debug for ReporterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}

impl ReporterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in format.
    #[must_use]
    pub fn builtin() -> Self {
        let builtins: [(&str, ReporterFactory); 5] = [
            ("csv", |_| Box::new(CsvReporter)),
            ("chrome-json", |_| Box::new(ChromeTraceReporter)),
            ("html", |_| Box::new(HtmlReporter)),
            ("html-perf", |settings| Box::new(HtmlPerfReporter::from_settings(settings))),
            ("plaintext", |_| Box::new(PlaintextReporter)),
        ];

        let factories = builtins
            .into_iter()
            .map(|(key, factory)| (key.to_string(), factory))
            .collect();
        Self { factories }
    }

    /// Register `factory` under `key`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::InvalidExtension`] if the reporter's extension is
    /// empty, has a leading dot or is not lowercase.
    pub fn register(&mut self, key: &str, factory: ReporterFactory) -> Result<(), ExportError> {
        let reporter = factory(&Settings::default());
        let extension = reporter.extension();
        let valid = !extension.is_empty()
            && !extension.starts_with('.')
            && extension.chars().all(|c| !c.is_uppercase());
        if !valid {
            return Err(ExportError::InvalidExtension(extension.to_string()));
        }

        if self.factories.insert(key.to_string(), factory).is_some() {
            log::debug!("Replaced report format '{key}'");
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`ExportError::UnknownFormat`] if no format is registered as `key`.
    pub fn create(&self, key: &str, settings: &Settings) -> Result<Box<dyn Reporter>, ExportError> {
        self.factories
            .get(key)
            .map(|factory| factory(settings))
            .ok_or_else(|| ExportError::UnknownFormat(key.to_string()))
    }

    /// First format (by key) whose reporter writes `extension`.
    #[must_use]
    pub fn by_extension(&self, extension: &str, settings: &Settings) -> Option<Box<dyn Reporter>> {
        let extension = extension.trim_start_matches('.').to_lowercase();
        self.factories
            .values()
            .map(|factory| factory(settings))
            .find(|reporter| reporter.extension() == extension)
    }

    #[must_use]
    pub fn is_extension_supported(&self, extension: &str) -> bool {
        self.by_extension(extension, &Settings::default()).is_some()
    }

    /// Registered keys in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.factories.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ReportContext;

    struct UpperCase;

    impl Reporter for UpperCase {
        fn name(&self) -> &str {
            "Upper"
        }

        fn extension(&self) -> &str {
            "TXT"
        }

        fn body(&self, _ctx: &ReportContext<'_>) -> String {
            String::new()
        }
    }

    struct Markdown;

    impl Reporter for Markdown {
        fn name(&self) -> &str {
            "Markdown"
        }

        fn extension(&self) -> &str {
            "md"
        }

        fn body(&self, _ctx: &ReportContext<'_>) -> String {
            "# Report\n".to_string()
        }
    }

    #[test]
    fn test_builtin_formats() {
        let registry = ReporterRegistry::builtin();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, ["chrome-json", "csv", "html", "html-perf", "plaintext"]);

        let reporter = registry.create("chrome-json", &Settings::default()).unwrap();
        assert_eq!(reporter.extension(), "json");
    }

    #[test]
    fn test_unknown_format() {
        let registry = ReporterRegistry::builtin();
        let err = registry.create("xml", &Settings::default()).err().unwrap();
        assert!(matches!(err, ExportError::UnknownFormat(ref key) if key == "xml"));
    }

    #[test]
    fn test_register_validates_extension() {
        let mut registry = ReporterRegistry::new();
        let err = registry.register("upper", |_| Box::new(UpperCase)).unwrap_err();
        assert!(matches!(err, ExportError::InvalidExtension(ref ext) if ext == "TXT"));
        assert_eq!(registry.names().count(), 0);

        registry.register("markdown", |_| Box::new(Markdown)).unwrap();
        assert!(registry.is_extension_supported(".MD"));
        assert!(!registry.is_extension_supported("csv"));
    }

    #[test]
    fn test_by_extension() {
        let registry = ReporterRegistry::builtin();
        let settings = Settings::default();

        assert_eq!(registry.by_extension("txt", &settings).unwrap().name(), "Plaintext");
        // "html" and "html-perf" share an extension; the first key wins.
        assert_eq!(registry.by_extension("html", &settings).unwrap().name(), "HTML");
        assert!(registry.by_extension("xml", &settings).is_none());
    }
}
