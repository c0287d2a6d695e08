//! JSON report envelope for --format json
//!
//! Every report struct serializes as-is; this wraps it with a versioned
//! format tag so downstream scripts can sniff what they are reading.

use serde::Serialize;

/// Versioned envelope around one report
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport<T: Serialize> {
    /// Crate version that produced the report
    pub version: String,
    /// Format name, e.g. "evstat-actions-v1"
    pub format: String,
    pub report: T,
}

impl<T: Serialize> JsonReport<T> {
    pub fn new(format: &str, report: T) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: format.to_string(),
            report,
        }
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Print one report to stdout as a JSON envelope.
pub fn print_json<T: Serialize>(format: &str, report: T) -> anyhow::Result<()> {
    println!("{}", JsonReport::new(format, report).to_json()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Dummy {
        total: u64,
    }

    #[test]
    fn test_envelope_fields() {
        let json = JsonReport::new("evstat-actions-v1", Dummy { total: 3 })
            .to_json()
            .unwrap();
        assert!(json.contains("\"format\": \"evstat-actions-v1\""));
        assert!(json.contains("\"total\": 3"));
        assert!(json.contains("\"version\""));
    }
}
