pub mod abundance;
pub mod data;
pub mod inspect;
pub mod modules;
pub mod run;

use crate::error::Result;
use ewoks::engine::error::EngineError;
use ewoks::workflows::settings::ModuleCatalog;
use std::path::Path;
use tracing::info;

/// The built-in module catalog, with definitions from `extra_dir` layered on top.
pub(crate) fn load_catalog(extra_dir: Option<&Path>) -> Result<ModuleCatalog> {
    let mut catalog = ModuleCatalog::builtin().map_err(EngineError::from)?;
    if let Some(dir) = extra_dir {
        let extra = ModuleCatalog::load_dir(dir).map_err(EngineError::from)?;
        info!(
            "Layering {} module definition(s) from {:?} over the built-in catalog.",
            extra.len(),
            dir
        );
        for schema in extra.iter() {
            catalog.insert(schema.clone());
        }
    }
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn extra_definitions_override_builtin_schemas() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("immunodepletion.toml"),
            r#"
            [immunodepletion]
            id = "immunodepletion"
            name = "Custom depletion"

            [immunodepletion.settings."Depletion panel"]
            formtype = "MultipleChoiceField"
            options = { "Albumin" = ["ALBU_HUMAN"] }
            "#,
        )
        .unwrap();

        let builtin = load_catalog(None).unwrap();
        let layered = load_catalog(Some(dir.path())).unwrap();

        assert_eq!(layered.len(), builtin.len());
        assert_eq!(
            layered.get("immunodepletion").unwrap().name,
            "Custom depletion"
        );
        assert_eq!(
            layered.get("size_exclusion"),
            builtin.get("size_exclusion")
        );
    }
}
