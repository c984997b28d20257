use config::{Config, Environment, File, FileFormat};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::error::{AuditError, FreightResult};

/// Prefix of environment overrides, nested keys separated by `__`.
pub const ENV_PREFIX: &str = "FREIGHTVERIFY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub reconciliation: ReconciliationPolicy,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

/// Tolerances and optional rules applied by the audit engine.
///
/// Shipment types differ in what divergence is acceptable, so every threshold
/// is a named field here rather than a constant in the checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconciliationPolicy {
    /// Max |quantity * unit_price - total_price| per invoice line.
    #[serde(with = "rust_decimal::serde::float")]
    pub line_item_tolerance: Decimal,
    /// Max |sum(line totals) - invoice total|.
    #[serde(with = "rust_decimal::serde::float")]
    pub invoice_total_tolerance: Decimal,
    /// Max gross weight difference between packing list and bill of lading.
    #[serde(with = "rust_decimal::serde::float")]
    pub weight_tolerance_kg: Decimal,
    pub unit_count: UnitCountRule,
    pub invoice_reference_on_bill_of_lading: ReferenceRequirement,
    pub invoice_reference_on_packing_list: ReferenceRequirement,
}

impl Default for ReconciliationPolicy {
    fn default() -> Self {
        Self {
            line_item_tolerance: Decimal::new(5, 2),
            invoice_total_tolerance: Decimal::new(5, 2),
            weight_tolerance_kg: Decimal::new(5, 1),
            unit_count: UnitCountRule::default(),
            invoice_reference_on_bill_of_lading: ReferenceRequirement::IfPresent,
            invoice_reference_on_packing_list: ReferenceRequirement::IfPresent,
        }
    }
}

impl ReconciliationPolicy {
    pub fn validate(&self) -> FreightResult<()> {
        let tolerances = [
            ("line_item_tolerance", self.line_item_tolerance),
            ("invoice_total_tolerance", self.invoice_total_tolerance),
            ("weight_tolerance_kg", self.weight_tolerance_kg),
        ];

        for (name, value) in tolerances {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(AuditError::configuration(format!(
                    "{} must not be negative, got {}",
                    name, value
                )));
            }
        }

        match self.unit_count {
            UnitCountRule::Tolerance { max_divergence } | UnitCountRule::AtLeastInvoice { max_divergence }
                if max_divergence.is_sign_negative() && !max_divergence.is_zero() =>
            {
                Err(AuditError::configuration(format!(
                    "unit_count.max_divergence must not be negative, got {}",
                    max_divergence
                )))
            }
            _ => Ok(()),
        }
    }
}

/// How the packing list unit count is compared with the invoice quantities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum UnitCountRule {
    /// No unit count comparison.
    Disabled,
    /// Flag when the two counts differ by more than `max_divergence` either way.
    Tolerance {
        #[serde(with = "rust_decimal::serde::float")]
        max_divergence: Decimal,
    },
    /// Flag only when the packing list reports fewer units than invoiced.
    AtLeastInvoice {
        #[serde(with = "rust_decimal::serde::float")]
        max_divergence: Decimal,
    },
}

impl Default for UnitCountRule {
    fn default() -> Self {
        Self::Tolerance {
            max_divergence: Decimal::new(1, 2),
        }
    }
}

/// Whether a document must carry the invoice number among its references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceRequirement {
    /// Never checked.
    Skip,
    /// Checked only when the extraction populated document references.
    IfPresent,
    /// Missing references count as a mismatch.
    Required,
}

impl Default for ReferenceRequirement {
    fn default() -> Self {
        Self::IfPresent
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub enabled: bool,
    pub issuer_name: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            issuer_name: "FreightVerify".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
            file_path: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> FreightResult<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        // e.g. FREIGHTVERIFY__RECONCILIATION__WEIGHT_TOLERANCE_KG=1.0
        Self::load_from(
            Path::new("config"),
            Environment::with_prefix(ENV_PREFIX).separator("__"),
        )
    }

    /// Layer `default`, `$ENVIRONMENT` and `local` files from `dir`, then the
    /// given environment source. Later layers win.
    pub fn load_from(dir: &Path, environment: Environment) -> FreightResult<Self> {
        let layer = |name: &str| File::from(dir.join(name)).required(false);
        let profile = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .add_source(layer("default"))
            .add_source(layer(&profile))
            .add_source(layer("local"))
            .add_source(environment);

        let app_config: AppConfig = config.build()?.try_deserialize()?;
        app_config.reconciliation.validate()?;

        Ok(app_config)
    }

    pub fn from_toml_str(source: &str) -> FreightResult<Self> {
        let app_config: AppConfig = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        app_config.reconciliation.validate()?;

        Ok(app_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_policy() {
        let policy = ReconciliationPolicy::default();
        assert_eq!(policy.line_item_tolerance, dec!(0.05));
        assert_eq!(policy.invoice_total_tolerance, dec!(0.05));
        assert_eq!(policy.weight_tolerance_kg, dec!(0.5));
        assert_eq!(
            policy.unit_count,
            UnitCountRule::Tolerance { max_divergence: dec!(0.01) }
        );
        assert_eq!(policy.invoice_reference_on_bill_of_lading, ReferenceRequirement::IfPresent);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.reconciliation, ReconciliationPolicy::default());
        assert_eq!(config.logging.level, "info");
        assert!(config.report.enabled);
    }

    #[test]
    fn test_toml_overrides() {
        let config = AppConfig::from_toml_str(
            r#"
            [reconciliation]
            weight_tolerance_kg = 1.0
            invoice_reference_on_bill_of_lading = "required"

            [reconciliation.unit_count]
            mode = "at_least_invoice"
            max_divergence = 0.0

            [report]
            issuer_name = "Acme Freight"
            "#,
        )
        .unwrap();

        assert_eq!(config.reconciliation.weight_tolerance_kg, dec!(1.0));
        assert_eq!(config.reconciliation.line_item_tolerance, dec!(0.05));
        assert_eq!(
            config.reconciliation.invoice_reference_on_bill_of_lading,
            ReferenceRequirement::Required
        );
        assert_eq!(
            config.reconciliation.unit_count,
            UnitCountRule::AtLeastInvoice { max_divergence: dec!(0) }
        );
        assert_eq!(config.report.issuer_name, "Acme Freight");
    }

    #[test]
    fn test_disabled_unit_rule_parses() {
        let config = AppConfig::from_toml_str(
            r#"
            [reconciliation.unit_count]
            mode = "disabled"
            "#,
        )
        .unwrap();

        assert_eq!(config.reconciliation.unit_count, UnitCountRule::Disabled);
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let policy = ReconciliationPolicy {
            weight_tolerance_kg: dec!(-0.5),
            ..ReconciliationPolicy::default()
        };

        let error = policy.validate().unwrap_err();
        assert_eq!(error.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_files_layer_under_environment() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            "[reconciliation]\nweight_tolerance_kg = 1.0\nline_item_tolerance = 0.10\n\n[report]\nissuer_name = \"Default Co\"\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("local.toml"),
            "[reconciliation]\nweight_tolerance_kg = 2.0\n\n[report]\nissuer_name = \"Local Co\"\n",
        )
        .unwrap();

        let environment = |vars: &[(&str, &str)]| {
            Environment::with_prefix(ENV_PREFIX).separator("__").source(Some(
                vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            ))
        };

        let files_only = AppConfig::load_from(dir.path(), environment(&[])).unwrap();
        assert_eq!(files_only.reconciliation.weight_tolerance_kg, dec!(2.0));
        assert_eq!(files_only.reconciliation.line_item_tolerance, dec!(0.10));
        assert_eq!(files_only.report.issuer_name, "Local Co");

        let overridden = AppConfig::load_from(
            dir.path(),
            environment(&[
                ("FREIGHTVERIFY__RECONCILIATION__WEIGHT_TOLERANCE_KG", "1.5"),
                ("FREIGHTVERIFY__REPORT__ISSUER_NAME", "Env Co"),
            ]),
        )
        .unwrap();
        assert_eq!(overridden.reconciliation.weight_tolerance_kg, dec!(1.5));
        assert_eq!(overridden.reconciliation.line_item_tolerance, dec!(0.10));
        assert_eq!(overridden.report.issuer_name, "Env Co");
    }

    #[test]
    fn test_environment_override_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let environment = Environment::with_prefix(ENV_PREFIX).separator("__").source(Some(
            [("FREIGHTVERIFY__RECONCILIATION__WEIGHT_TOLERANCE_KG".to_string(), "-1".to_string())]
                .into_iter()
                .collect(),
        ));

        let error = AppConfig::load_from(dir.path(), environment).unwrap_err();
        assert_eq!(error.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_load_reads_process_environment() {
        let key = "FREIGHTVERIFY__RECONCILIATION__WEIGHT_TOLERANCE_KG";
        env::set_var(key, "1.5");
        let loaded = AppConfig::load();
        env::remove_var(key);

        assert_eq!(loaded.unwrap().reconciliation.weight_tolerance_kg, dec!(1.5));
    }
}
