//! Style registry: custom colours plus a cache of compiled styles.

use super::color::ColorLevel;
use super::compiled::Style;
use super::descriptor::{BG_PREFIX, DescriptorError, strip_bg};
use crate::error::KitschError;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// A style that failed to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleError {
    pub descriptor: String,
    pub source: DescriptorError,
}

impl fmt::Display for StyleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error compiling style \"{}\": {}",
            self.descriptor, self.source
        )
    }
}

impl std::error::Error for StyleError {}

impl From<StyleError> for KitschError {
    fn from(err: StyleError) -> Self {
        match err.source {
            DescriptorError::UnknownCustomColor(name) => KitschError::UnknownCustomColor(name),
            other => KitschError::InvalidStyle {
                token: err.descriptor,
                position: other.position(),
                message: other.to_string(),
            },
        }
    }
}

/// Compiles style strings and caches the result. Custom colours (`$name`)
/// must be registered before any style that uses them is requested.
#[derive(Debug, Default)]
pub struct Registry {
    level: ColorLevel,
    custom_colors: HashMap<String, String>,
    styles: RwLock<HashMap<String, Arc<Style>>>,
}

impl Registry {
    pub fn new(level: ColorLevel) -> Self {
        Registry {
            level,
            ..Default::default()
        }
    }

    #[cfg(test)]
    pub fn add_custom_color(&mut self, name: impl Into<String>, color: impl Into<String>) {
        self.custom_colors.insert(name.into(), color.into());
        self.clear_cache();
    }

    pub fn add_custom_colors(&mut self, colors: &HashMap<String, String>) {
        for (name, color) in colors {
            self.custom_colors.insert(name.clone(), color.clone());
        }
        self.clear_cache();
    }

    fn clear_cache(&mut self) {
        match self.styles.get_mut() {
            Ok(styles) => styles.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    /// Compile `descriptor`, or return the cached compilation.
    pub fn get(&self, descriptor: &str) -> Result<Arc<Style>, StyleError> {
        if let Ok(styles) = self.styles.read()
            && let Some(style) = styles.get(descriptor)
        {
            return Ok(Arc::clone(style));
        }

        let style = Style::compile(&self.custom_colors, descriptor, self.level).map_err(
            |source| StyleError {
                descriptor: descriptor.to_string(),
                source,
            },
        )?;
        let style = Arc::new(style);

        if let Ok(mut styles) = self.styles.write() {
            styles
                .entry(descriptor.to_string())
                .or_insert_with(|| Arc::clone(&style));
        }
        Ok(style)
    }
}

/// Convert a colour to a foreground colour: `bg:red` becomes `red`, and the
/// empty colour becomes `black`.
pub fn to_fg_color(color: &str) -> String {
    if color.is_empty() {
        return "black".to_string();
    }
    strip_bg(color).unwrap_or_else(|| color.to_string())
}

/// Convert a colour to a background colour: `red` becomes `bg:red`, and the
/// empty colour becomes `bg:black`.
pub fn to_bg_color(color: &str) -> String {
    if color.is_empty() {
        return format!("{}black", BG_PREFIX);
    }
    if strip_bg(color).is_some() {
        return color.to_string();
    }
    format!("{}{}", BG_PREFIX, color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_caches_compiled_styles() {
        let registry = Registry::new(ColorLevel::TrueColor);
        let a = registry.get("red bold").unwrap();
        let b = registry.get("red bold").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_get_reports_descriptor() {
        let registry = Registry::new(ColorLevel::TrueColor);
        let err = registry.get("red purple").unwrap_err();
        assert_eq!(
            err.to_string(),
            "error compiling style \"red purple\": unknown style \"purple\""
        );

        let err: KitschError = err.into();
        assert!(matches!(err, KitschError::InvalidStyle { position: 5, .. }));
    }

    #[test]
    fn test_unknown_custom_color() {
        let registry = Registry::new(ColorLevel::TrueColor);
        let err: KitschError = registry.get("$missing").unwrap_err().into();
        assert!(matches!(err, KitschError::UnknownCustomColor(name) if name == "$missing"));
    }

    #[test]
    fn test_custom_colors() {
        let mut registry = Registry::new(ColorLevel::TrueColor);
        registry.add_custom_color("$foreground", "white");
        assert_eq!(
            registry.get("$foreground").unwrap().apply("test"),
            "\x1b[37mtest\x1b[39m"
        );

        // Redefining a colour invalidates styles compiled with the old one.
        registry.add_custom_color("$foreground", "red");
        assert_eq!(
            registry.get("$foreground").unwrap().apply("test"),
            "\x1b[31mtest\x1b[39m"
        );
    }

    #[test]
    fn test_fg_and_bg_conversion() {
        assert_eq!(to_fg_color(""), "black");
        assert_eq!(to_fg_color("bg:red"), "red");
        assert_eq!(to_fg_color("bgRed"), "red");
        assert_eq!(to_fg_color("#fff"), "#fff");

        assert_eq!(to_bg_color(""), "bg:black");
        assert_eq!(to_bg_color("red"), "bg:red");
        assert_eq!(to_bg_color("bg:#fff"), "bg:#fff");
        assert_eq!(to_bg_color("bgBlue"), "bgBlue");
    }
}
