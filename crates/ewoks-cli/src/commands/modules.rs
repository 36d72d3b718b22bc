use super::load_catalog;
use crate::cli::ModulesArgs;
use crate::error::{CliError, Result};
use ewoks::workflows::settings::{FieldKind, ModuleSchema, RawSelection, SettingSpec};
use std::fmt::Write;

pub async fn run(args: ModulesArgs) -> Result<()> {
    let catalog = load_catalog(args.catalog.as_deref())?;

    match args.module.as_deref() {
        Some(id) => {
            let schema = catalog.get(id).ok_or_else(|| {
                CliError::Argument(format!(
                    "Unknown module '{}'. Available modules: {}",
                    id,
                    catalog.ids().collect::<Vec<_>>().join(", ")
                ))
            })?;
            print!("{}", describe(schema));
        }
        None => {
            for schema in catalog.iter() {
                println!("{:<26} {}", schema.id, schema.name);
            }
            println!("\nRun 'ewoks modules <MODULE>' to list a module's settings.");
        }
    }
    Ok(())
}

fn kind_label(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::ChoiceField => "choice",
        FieldKind::MultipleChoiceField => "multiple choice",
        FieldKind::DecimalField => "decimal",
        FieldKind::FileField => "file",
        FieldKind::BooleanField => "boolean",
        FieldKind::CharField => "text",
    }
}

fn selection_label(selection: &RawSelection) -> String {
    match selection {
        RawSelection::Flag(flag) => flag.to_string(),
        RawSelection::Number(number) => number.to_string(),
        RawSelection::Text(text) => format!("\"{text}\""),
        RawSelection::List(items) => format!("[{}]", items.join(", ")),
    }
}

fn describe_setting(out: &mut String, name: &str, spec: &SettingSpec) {
    let _ = write!(out, "  \"{}\" ({}", name, kind_label(spec.form_type));
    if !spec.required {
        out.push_str(", optional");
    }
    out.push(')');
    if let Some(default) = &spec.default {
        let _ = write!(out, " default {}", selection_label(default));
    }
    match (spec.min, spec.max) {
        (Some(min), Some(max)) => {
            let _ = write!(out, " range [{min}, {max}]");
        }
        (Some(min), None) => {
            let _ = write!(out, " min {min}");
        }
        (None, Some(max)) => {
            let _ = write!(out, " max {max}");
        }
        (None, None) => {}
    }
    out.push('\n');
    if let Some(help) = &spec.help {
        let _ = writeln!(out, "      {help}");
    }
    for option in spec.options.keys() {
        let _ = writeln!(out, "      - {option}");
    }
}

fn describe(schema: &ModuleSchema) -> String {
    let mut out = format!("{} ({})\n", schema.name, schema.id);
    if !schema.description.is_empty() {
        let _ = writeln!(out, "{}", schema.description);
    }
    out.push_str("\nSettings:\n");
    for (name, spec) in &schema.settings {
        describe_setting(&mut out, name, spec);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_lists_settings_with_ranges_and_options() {
        let catalog = load_catalog(None).unwrap();
        let text = describe(catalog.get("immunodepletion").unwrap());

        assert!(text.starts_with("Immunodepletion (immunodepletion)"));
        assert!(text.contains("\"Depletion efficiency\" (decimal) default 0.99 range [0, 1]"));
        assert!(text.contains("\"Depletion panel\" (multiple choice) default [Albumin, IgG]"));
        assert!(text.contains("      - Transferrin"));
    }

    #[tokio::test]
    async fn unknown_module_is_an_argument_error() {
        let result = run(ModulesArgs {
            catalog: None,
            module: Some("western_blot".to_string()),
        })
        .await;
        assert!(matches!(result, Err(CliError::Argument(_))));
    }
}
