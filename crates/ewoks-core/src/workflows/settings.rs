use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Unknown module '{0}' in module catalog")]
    UnknownModule(String),

    #[error("Setting '{setting}' is not defined for module '{module}'. Valid settings are: {}", .valid.join(", "))]
    UnknownSetting {
        module: String,
        setting: String,
        valid: Vec<String>,
    },

    #[error("No value selected for required setting '{setting}' of module '{module}'")]
    MissingSelection { module: String, setting: String },

    #[error("'{option}' is not an option of setting '{setting}'. Valid options are: {}", .valid.join(", "))]
    UnknownOption {
        setting: String,
        option: String,
        valid: Vec<String>,
    },

    #[error("Setting '{setting}' expects a decimal number, got '{value}'")]
    InvalidDecimal { setting: String, value: String },

    #[error("Setting '{setting}' value {value} is outside the allowed range [{min}, {max}]")]
    OutOfRange {
        setting: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Setting '{setting}' expects {expected}")]
    TypeMismatch {
        setting: String,
        expected: &'static str,
    },

    #[error("Module definition key '{key}' does not match its id '{id}'")]
    IdMismatch { key: String, id: String },

    #[error("Failed to read module definitions from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse module definitions in {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },
}

/// The input widget a setting is collected with, which also fixes its value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum FieldKind {
    ChoiceField,
    MultipleChoiceField,
    DecimalField,
    FileField,
    BooleanField,
    CharField,
}

/// A user selection for one setting, as it arrives from a workflow file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawSelection {
    Flag(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

pub type SelectedSettings = BTreeMap<String, RawSelection>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingSpec {
    #[serde(rename = "formtype")]
    pub form_type: FieldKind,
    /// Option label to option value, for choice fields.
    #[serde(default)]
    pub options: BTreeMap<String, toml::Value>,
    #[serde(default)]
    pub default: Option<RawSelection>,
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleSchema {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub settings: BTreeMap<String, SettingSpec>,
}

const BUILTIN_DEFINITIONS: [(&str, &str); 7] = [
    ("fasta_input.toml", include_str!("../../data/modules/fasta_input.toml")),
    ("size_exclusion.toml", include_str!("../../data/modules/size_exclusion.toml")),
    ("weight_cutoff.toml", include_str!("../../data/modules/weight_cutoff.toml")),
    (
        "isoelectric_focusing.toml",
        include_str!("../../data/modules/isoelectric_focusing.toml"),
    ),
    (
        "hydrophobic_interaction.toml",
        include_str!("../../data/modules/hydrophobic_interaction.toml"),
    ),
    ("immunodepletion.toml", include_str!("../../data/modules/immunodepletion.toml")),
    ("signal_peptide.toml", include_str!("../../data/modules/signal_peptide.toml")),
];

/// All module schemas known to a workflow, keyed by module id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleCatalog {
    modules: BTreeMap<String, ModuleSchema>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The schemas of the built-in modules.
    pub fn builtin() -> Result<Self, SettingsError> {
        let mut catalog = Self::new();
        for (origin, text) in BUILTIN_DEFINITIONS {
            catalog.add_toml(text, origin)?;
        }
        Ok(catalog)
    }

    /// Parses a TOML document of `[<module id>]` tables and adds them to the catalog.
    ///
    /// Later definitions replace earlier ones with the same id.
    pub fn add_toml(&mut self, text: &str, origin: &str) -> Result<usize, SettingsError> {
        let parsed: BTreeMap<String, ModuleSchema> =
            toml::from_str(text).map_err(|source| SettingsError::Parse {
                origin: origin.to_string(),
                source,
            })?;
        let count = parsed.len();
        for (key, schema) in parsed {
            if key != schema.id {
                return Err(SettingsError::IdMismatch { key, id: schema.id });
            }
            debug!("Registered schema for module '{}' from {}.", key, origin);
            self.modules.insert(key, schema);
        }
        Ok(count)
    }

    /// Loads every `*.toml` file of `dir`, in file-name order.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self, SettingsError> {
        let dir = dir.as_ref();
        let io_err = |source| SettingsError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(io_err)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        paths.sort();

        let mut catalog = Self::new();
        for path in &paths {
            let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
                path: path.clone(),
                source,
            })?;
            catalog.add_toml(&text, &path.display().to_string())?;
        }
        info!(
            "Loaded {} module definition(s) from {}.",
            catalog.len(),
            dir.display()
        );
        Ok(catalog)
    }

    pub fn insert(&mut self, schema: ModuleSchema) {
        self.modules.insert(schema.id.clone(), schema);
    }

    pub fn get(&self, module_id: &str) -> Option<&ModuleSchema> {
        self.modules.get(module_id)
    }

    pub fn contains(&self, module_id: &str) -> bool {
        self.modules.contains_key(module_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleSchema> {
        self.modules.values()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    fn spec(&self, setting_name: &str, module_id: &str) -> Result<&SettingSpec, SettingsError> {
        let schema = self
            .get(module_id)
            .ok_or_else(|| SettingsError::UnknownModule(module_id.to_string()))?;
        schema
            .settings
            .get(setting_name)
            .ok_or_else(|| SettingsError::UnknownSetting {
                module: module_id.to_string(),
                setting: setting_name.to_string(),
                valid: schema.settings.keys().cloned().collect(),
            })
    }
}

/// A typed setting value, as produced by [`extract_setting`].
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Choice { label: String, value: toml::Value },
    Choices(Vec<(String, toml::Value)>),
    Decimal(f64),
    File(String),
    Flag(bool),
    Text(String),
}

impl SettingValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Choice { value, .. } => value.as_str(),
            Self::File(s) | Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Decimal(v) => Some(*v),
            Self::Choice { value, .. } => toml_number(value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }

    /// The label the user picked for a single-choice setting.
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Choice { label, .. } => Some(label),
            _ => None,
        }
    }

    /// A `[low, high]` numeric option value.
    pub fn as_range(&self) -> Option<(f64, f64)> {
        match self {
            Self::Choice { value, .. } => toml_range(value),
            _ => None,
        }
    }
}

pub(crate) fn toml_number(value: &toml::Value) -> Option<f64> {
    match value {
        toml::Value::Float(f) => Some(*f),
        toml::Value::Integer(i) => Some(*i as f64),
        _ => None,
    }
}

pub(crate) fn toml_range(value: &toml::Value) -> Option<(f64, f64)> {
    match value.as_array()?.as_slice() {
        [low, high] => Some((toml_number(low)?, toml_number(high)?)),
        _ => None,
    }
}

/// Resolves the user's selection for `setting_name` into a typed value according to the
/// setting's field kind in the module schema.
///
/// Choice fields resolve option labels to their configured values. Absent selections
/// fall back to the schema default; an absent boolean is `false`.
pub fn extract_setting(
    setting_name: &str,
    module_id: &str,
    selected: &SelectedSettings,
    catalog: &ModuleCatalog,
) -> Result<SettingValue, SettingsError> {
    let spec = catalog.spec(setting_name, module_id)?;
    let selection = match selected.get(setting_name).or(spec.default.as_ref()) {
        Some(selection) => selection,
        None if spec.form_type == FieldKind::BooleanField => return Ok(SettingValue::Flag(false)),
        None => {
            return Err(SettingsError::MissingSelection {
                module: module_id.to_string(),
                setting: setting_name.to_string(),
            });
        }
    };
    convert(setting_name, spec, selection)
}

/// Like [`extract_setting`], but returns `Ok(None)` when a setting marked
/// `required = false` has neither a selection nor a default. Blank text counts as no
/// selection. A required setting without either is still a [`SettingsError::MissingSelection`].
pub fn extract_optional_setting(
    setting_name: &str,
    module_id: &str,
    selected: &SelectedSettings,
    catalog: &ModuleCatalog,
) -> Result<Option<SettingValue>, SettingsError> {
    let spec = catalog.spec(setting_name, module_id)?;
    let selection = match selected.get(setting_name) {
        Some(RawSelection::Text(s)) if s.trim().is_empty() => None,
        other => other,
    };
    match selection.or(spec.default.as_ref()) {
        Some(selection) => convert(setting_name, spec, selection).map(Some),
        None if !spec.required => Ok(None),
        None if spec.form_type == FieldKind::BooleanField => Ok(Some(SettingValue::Flag(false))),
        None => Err(SettingsError::MissingSelection {
            module: module_id.to_string(),
            setting: setting_name.to_string(),
        }),
    }
}

fn mismatch(setting: &str, expected: &'static str) -> SettingsError {
    SettingsError::TypeMismatch {
        setting: setting.to_string(),
        expected,
    }
}

fn resolve_option(
    setting: &str,
    spec: &SettingSpec,
    label: &str,
) -> Result<(String, toml::Value), SettingsError> {
    spec.options
        .get(label)
        .map(|value| (label.to_string(), value.clone()))
        .ok_or_else(|| SettingsError::UnknownOption {
            setting: setting.to_string(),
            option: label.to_string(),
            valid: spec.options.keys().cloned().collect(),
        })
}

fn convert(
    setting: &str,
    spec: &SettingSpec,
    selection: &RawSelection,
) -> Result<SettingValue, SettingsError> {
    match spec.form_type {
        FieldKind::ChoiceField => match selection {
            RawSelection::Text(label) => {
                let (label, value) = resolve_option(setting, spec, label)?;
                Ok(SettingValue::Choice { label, value })
            }
            _ => Err(mismatch(setting, "a single option label")),
        },
        FieldKind::MultipleChoiceField => {
            let labels: &[String] = match selection {
                RawSelection::List(labels) => labels,
                RawSelection::Text(label) => std::slice::from_ref(label),
                _ => return Err(mismatch(setting, "a list of option labels")),
            };
            labels
                .iter()
                .map(|label| resolve_option(setting, spec, label))
                .collect::<Result<Vec<_>, _>>()
                .map(SettingValue::Choices)
        }
        FieldKind::DecimalField => {
            let value = match selection {
                RawSelection::Number(n) => *n,
                RawSelection::Text(s) => {
                    s.trim()
                        .parse::<f64>()
                        .map_err(|_| SettingsError::InvalidDecimal {
                            setting: setting.to_string(),
                            value: s.clone(),
                        })?
                }
                _ => return Err(mismatch(setting, "a decimal number")),
            };
            if !value.is_finite() {
                return Err(SettingsError::InvalidDecimal {
                    setting: setting.to_string(),
                    value: value.to_string(),
                });
            }
            let (min, max) = (
                spec.min.unwrap_or(f64::NEG_INFINITY),
                spec.max.unwrap_or(f64::INFINITY),
            );
            if value < min || value > max {
                return Err(SettingsError::OutOfRange {
                    setting: setting.to_string(),
                    value,
                    min,
                    max,
                });
            }
            Ok(SettingValue::Decimal(value))
        }
        FieldKind::FileField => match selection {
            RawSelection::Text(path) => Ok(SettingValue::File(path.clone())),
            _ => Err(mismatch(setting, "a file path")),
        },
        FieldKind::BooleanField => match selection {
            RawSelection::Flag(b) => Ok(SettingValue::Flag(*b)),
            RawSelection::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "on" | "yes" | "1" => Ok(SettingValue::Flag(true)),
                "false" | "off" | "no" | "0" | "" => Ok(SettingValue::Flag(false)),
                _ => Err(mismatch(setting, "a boolean")),
            },
            _ => Err(mismatch(setting, "a boolean")),
        },
        FieldKind::CharField => match selection {
            RawSelection::Text(s) => Ok(SettingValue::Text(s.clone())),
            RawSelection::Number(n) => Ok(SettingValue::Text(n.to_string())),
            RawSelection::Flag(b) => Ok(SettingValue::Text(b.to_string())),
            RawSelection::List(_) => Err(mismatch(setting, "a single line of text")),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const DEMO: &str = r#"
[demo]
id = "demo"
name = "Demo module"

[demo.settings."Column"]
formtype = "ChoiceField"
options = { "Small" = [3, 70], "Large" = [10.0, 600.0] }
default = "Small"

[demo.settings."Panels"]
formtype = "MultipleChoiceField"
options = { "A" = ["A_HUMAN"], "B" = ["B_HUMAN", "C_HUMAN"] }

[demo.settings."Efficiency"]
formtype = "DecimalField"
min = 0.0
max = 1.0

[demo.settings."Input"]
formtype = "FileField"

[demo.settings."Verbose"]
formtype = "BooleanField"

[demo.settings."Proteome"]
formtype = "CharField"
required = false
"#;

    fn catalog() -> ModuleCatalog {
        let mut catalog = ModuleCatalog::new();
        catalog.add_toml(DEMO, "demo.toml").unwrap();
        catalog
    }

    fn selected(pairs: &[(&str, RawSelection)]) -> SelectedSettings {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn text(s: &str) -> RawSelection {
        RawSelection::Text(s.to_string())
    }

    #[test]
    fn choice_field_maps_label_to_option_value() {
        let value = extract_setting(
            "Column",
            "demo",
            &selected(&[("Column", text("Large"))]),
            &catalog(),
        )
        .unwrap();
        assert_eq!(value.label(), Some("Large"));
        assert_eq!(value.as_range(), Some((10.0, 600.0)));
    }

    #[test]
    fn choice_field_falls_back_to_default() {
        let value = extract_setting("Column", "demo", &SelectedSettings::new(), &catalog()).unwrap();
        assert_eq!(value.as_range(), Some((3.0, 70.0)));
    }

    #[test]
    fn unknown_option_lists_valid_labels() {
        let err = extract_setting(
            "Column",
            "demo",
            &selected(&[("Column", text("Huge"))]),
            &catalog(),
        )
        .unwrap_err();
        match err {
            SettingsError::UnknownOption { valid, .. } => assert_eq!(valid, vec!["Large", "Small"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn multiple_choice_maps_every_label() {
        let value = extract_setting(
            "Panels",
            "demo",
            &selected(&[(
                "Panels",
                RawSelection::List(vec!["A".to_string(), "B".to_string()]),
            )]),
            &catalog(),
        )
        .unwrap();
        let SettingValue::Choices(choices) = value else {
            panic!("expected choices");
        };
        assert_eq!(choices.len(), 2);
        assert_eq!(choices[1].0, "B");
        assert_eq!(choices[1].1.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn decimal_field_parses_text_and_checks_range() {
        let catalog = catalog();
        let ok = extract_setting(
            "Efficiency",
            "demo",
            &selected(&[("Efficiency", text(" 0.75 "))]),
            &catalog,
        )
        .unwrap();
        assert_eq!(ok.as_f64(), Some(0.75));

        let bad = extract_setting(
            "Efficiency",
            "demo",
            &selected(&[("Efficiency", text("lots"))]),
            &catalog,
        );
        assert!(matches!(bad, Err(SettingsError::InvalidDecimal { .. })));

        let high = extract_setting(
            "Efficiency",
            "demo",
            &selected(&[("Efficiency", RawSelection::Number(1.5))]),
            &catalog,
        );
        assert!(matches!(high, Err(SettingsError::OutOfRange { .. })));
    }

    #[test]
    fn absent_boolean_is_false_and_absent_required_value_fails() {
        let catalog = catalog();
        let none = SelectedSettings::new();
        assert_eq!(
            extract_setting("Verbose", "demo", &none, &catalog).unwrap(),
            SettingValue::Flag(false)
        );
        assert!(matches!(
            extract_setting("Input", "demo", &none, &catalog),
            Err(SettingsError::MissingSelection { .. })
        ));
    }

    #[test]
    fn file_and_char_fields_pass_text_through() {
        let catalog = catalog();
        let settings = selected(&[
            ("Input", text("data/human.fasta")),
            ("Proteome", RawSelection::Number(9606.0)),
        ]);
        assert_eq!(
            extract_setting("Input", "demo", &settings, &catalog).unwrap(),
            SettingValue::File("data/human.fasta".to_string())
        );
        assert_eq!(
            extract_setting("Proteome", "demo", &settings, &catalog)
                .unwrap()
                .as_str(),
            Some("9606")
        );
    }

    #[test]
    fn optional_setting_is_none_without_selection() {
        let catalog = catalog();
        assert_eq!(
            extract_optional_setting("Proteome", "demo", &SelectedSettings::new(), &catalog)
                .unwrap(),
            None
        );
        assert_eq!(
            extract_optional_setting(
                "Proteome",
                "demo",
                &selected(&[("Proteome", text("  "))]),
                &catalog
            )
            .unwrap(),
            None
        );
    }

    #[test]
    fn optional_extraction_still_enforces_required_settings() {
        let catalog = catalog();
        let blank = selected(&[("Input", text(" "))]);
        assert!(matches!(
            extract_optional_setting("Input", "demo", &blank, &catalog),
            Err(SettingsError::MissingSelection { .. })
        ));
        assert!(matches!(
            extract_optional_setting("Input", "demo", &SelectedSettings::new(), &catalog),
            Err(SettingsError::MissingSelection { .. })
        ));
        let column =
            extract_optional_setting("Column", "demo", &SelectedSettings::new(), &catalog)
                .unwrap()
                .unwrap();
        assert_eq!(column.label(), Some("Small"));
        assert_eq!(
            extract_optional_setting("Verbose", "demo", &SelectedSettings::new(), &catalog)
                .unwrap(),
            Some(SettingValue::Flag(false))
        );
    }

    #[test]
    fn unknown_module_and_setting_are_reported() {
        let catalog = catalog();
        let none = SelectedSettings::new();
        assert!(matches!(
            extract_setting("Column", "missing", &none, &catalog),
            Err(SettingsError::UnknownModule(_))
        ));
        match extract_setting("Colour", "demo", &none, &catalog) {
            Err(SettingsError::UnknownSetting { valid, .. }) => {
                assert!(valid.contains(&"Column".to_string()))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn key_must_match_id() {
        let mut catalog = ModuleCatalog::new();
        let err = catalog
            .add_toml("[alpha]\nid = \"beta\"\nname = \"x\"\n", "bad.toml")
            .unwrap_err();
        assert!(matches!(err, SettingsError::IdMismatch { .. }));
    }

    #[test]
    fn load_dir_reads_toml_files_only() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("demo.toml"), DEMO).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a module").unwrap();
        let catalog = ModuleCatalog::load_dir(dir.path()).unwrap();
        assert_eq!(catalog.ids().collect::<Vec<_>>(), vec!["demo"]);
    }

    #[test]
    fn builtin_catalog_parses() {
        let catalog = ModuleCatalog::builtin().unwrap();
        for id in [
            "fasta_input",
            "size_exclusion",
            "weight_cutoff",
            "isoelectric_focusing",
            "hydrophobic_interaction",
            "immunodepletion",
            "signal_peptide",
        ] {
            assert!(catalog.contains(id), "missing builtin module {id}");
        }
    }
}
