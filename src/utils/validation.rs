use crate::utils::error::{EtlError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_file_extensions(
    field_name: &str,
    files: &[&str],
    allowed_extensions: &[&str],
) -> Result<()> {
    let allowed_set: HashSet<String> = allowed_extensions
        .iter()
        .map(|ext| ext.to_ascii_lowercase())
        .collect();

    for file in files {
        match std::path::Path::new(file)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            Some(extension) if allowed_set.contains(&extension.to_ascii_lowercase()) => {}
            Some(extension) => {
                return Err(EtlError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.to_string(),
                    reason: format!(
                        "Unsupported file extension: {}. Allowed extensions: {}",
                        extension,
                        allowed_extensions.join(", ")
                    ),
                });
            }
            None => {
                return Err(EtlError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.to_string(),
                    reason: "File has no extension or invalid filename".to_string(),
                });
            }
        }
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    // NaN 與任何值比較都為 false，需另外擋下
    #[allow(clippy::eq_op)]
    let is_nan = value != value;
    if is_nan || value < min || value > max {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_unique_names<'a>(
    field_name: &str,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.trim().to_lowercase()) {
            return Err(EtlError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: name.to_string(),
                reason: "Duplicate name".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("providers.path", "data/uber.csv").is_ok());
        assert!(validate_path("providers.path", "").is_err());
        assert!(validate_path("providers.path", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_file_extensions() {
        let files = ["data/uber.csv", "data/CAB.CSV"];
        assert!(validate_file_extensions("providers.path", &files, &["csv"]).is_ok());

        let invalid_files = ["data.xlsx"];
        assert!(validate_file_extensions("providers.path", &invalid_files, &["csv"]).is_err());

        let no_extension = ["data/uber"];
        assert!(validate_file_extensions("providers.path", &no_extension, &["csv"]).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("surge", 1.5, 1.0, 3.0).is_ok());
        assert!(validate_range("surge", 3.0, 1.0, 3.0).is_ok());
        assert!(validate_range("surge", 3.1, 1.0, 3.0).is_err());
        assert!(validate_range("surge", f64::NAN, 1.0, 3.0).is_err());
    }

    #[test]
    fn test_validate_unique_names() {
        assert!(validate_unique_names("providers.name", ["Ola", "Uber"]).is_ok());
        assert!(validate_unique_names("providers.name", ["Ola", " ola"]).is_err());
    }
}
