use super::modules;
use super::settings::{
    ModuleCatalog, SelectedSettings, SettingValue, SettingsError, extract_optional_setting,
    extract_setting,
};
use crate::core::io::signal::SignalPeptideSource;
use crate::core::models::registry::Registry;
use crate::engine::error::EngineError;
use crate::engine::gel::{Band, GelImage, GelRenderer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Mutable state shared by the steps of one workflow run.
pub struct WorkflowContext {
    pub registry: Registry,
    /// Directory that relative file settings are resolved against.
    pub base_dir: PathBuf,
    pub signal_source: Box<dyn SignalPeptideSource>,
}

impl WorkflowContext {
    pub fn new(base_dir: impl Into<PathBuf>, signal_source: Box<dyn SignalPeptideSource>) -> Self {
        Self {
            registry: Registry::new(),
            base_dir: base_dir.into(),
            signal_source,
        }
    }

    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

/// The settings a handler is invoked with.
#[derive(Debug, Clone, Copy)]
pub struct ModuleRequest<'a> {
    pub module_id: &'a str,
    pub selected: &'a SelectedSettings,
    pub catalog: &'a ModuleCatalog,
}

impl<'a> ModuleRequest<'a> {
    pub fn new(
        module_id: &'a str,
        selected: &'a SelectedSettings,
        catalog: &'a ModuleCatalog,
    ) -> Self {
        Self {
            module_id,
            selected,
            catalog,
        }
    }

    pub fn setting(&self, name: &str) -> Result<SettingValue, SettingsError> {
        extract_setting(name, self.module_id, self.selected, self.catalog)
    }

    pub fn optional_setting(&self, name: &str) -> Result<Option<SettingValue>, SettingsError> {
        extract_optional_setting(name, self.module_id, self.selected, self.catalog)
    }

    /// All configured options of a choice setting, label to value.
    pub fn options(&self, name: &str) -> Result<&'a BTreeMap<String, toml::Value>, SettingsError> {
        let schema = self
            .catalog
            .get(self.module_id)
            .ok_or_else(|| SettingsError::UnknownModule(self.module_id.to_string()))?;
        schema
            .settings
            .get(name)
            .map(|spec| &spec.options)
            .ok_or_else(|| SettingsError::UnknownSetting {
                module: self.module_id.to_string(),
                setting: name.to_string(),
                valid: schema.settings.keys().cloned().collect(),
            })
    }
}

/// What a handler reports back besides the population it changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleOutcome {
    pub message: String,
    /// Settings the handler chose on the user's behalf, e.g. a recommended column.
    pub resolved: BTreeMap<String, String>,
}

impl ModuleOutcome {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            resolved: BTreeMap::new(),
        }
    }

    pub fn with_resolved(mut self, setting: &str, value: impl Into<String>) -> Self {
        self.resolved.insert(setting.to_string(), value.into());
        self
    }
}

/// The result of one dispatched module: its outcome and the gel of the population it left.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleResult {
    pub module_id: String,
    pub outcome: ModuleOutcome,
    pub image: GelImage,
    /// `(weight, abundance)` of every entity after the step.
    pub lane: Vec<Band>,
}

/// One workflow module: a stable identifier plus the population transformation it performs.
pub trait ModuleHandler {
    fn id(&self) -> &'static str;

    fn run(
        &self,
        request: &ModuleRequest<'_>,
        ctx: &mut WorkflowContext,
    ) -> Result<ModuleOutcome, EngineError>;
}

/// Routes module identifiers to their registered handlers and renders the result.
pub struct ModuleDispatcher {
    renderer: GelRenderer,
    handlers: BTreeMap<&'static str, Box<dyn ModuleHandler>>,
}

impl ModuleDispatcher {
    pub fn new(renderer: GelRenderer) -> Self {
        Self {
            renderer,
            handlers: BTreeMap::new(),
        }
    }

    /// A dispatcher with every built-in module registered.
    pub fn with_builtin_modules(renderer: GelRenderer) -> Self {
        let mut dispatcher = Self::new(renderer);
        for handler in modules::builtin_handlers() {
            dispatcher.handlers.insert(handler.id(), handler);
        }
        dispatcher
    }

    /// Registers a handler under its id.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateHandler`] if the id is already taken.
    pub fn register(&mut self, handler: Box<dyn ModuleHandler>) -> Result<(), EngineError> {
        let id = handler.id();
        if self.handlers.contains_key(id) {
            return Err(EngineError::DuplicateHandler(id.to_string()));
        }
        self.handlers.insert(id, handler);
        Ok(())
    }

    pub fn contains(&self, module_id: &str) -> bool {
        self.handlers.contains_key(module_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    pub fn renderer(&self) -> &GelRenderer {
        &self.renderer
    }

    /// Checks that every schema in `catalog` has a handler and every handler a schema.
    pub fn validate(&self, catalog: &ModuleCatalog) -> Result<(), EngineError> {
        let without_handler: Vec<&str> = catalog.ids().filter(|id| !self.contains(id)).collect();
        let without_schema: Vec<&str> = self.ids().filter(|id| !catalog.contains(id)).collect();
        if without_handler.is_empty() && without_schema.is_empty() {
            return Ok(());
        }
        let mut problems = Vec::new();
        if !without_handler.is_empty() {
            problems.push(format!("no handler for {}", without_handler.join(", ")));
        }
        if !without_schema.is_empty() {
            problems.push(format!("no schema for {}", without_schema.join(", ")));
        }
        Err(EngineError::CatalogMismatch(problems.join("; ")))
    }

    /// Runs `module_id` against the context's population, then renders one gel of the
    /// resulting population.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownModule`] without touching the population if no
    /// handler is registered for `module_id`, or the handler's error.
    #[instrument(skip_all, name = "dispatch", fields(module = module_id))]
    pub fn dispatch(
        &self,
        module_id: &str,
        selected: &SelectedSettings,
        catalog: &ModuleCatalog,
        ctx: &mut WorkflowContext,
    ) -> Result<ModuleResult, EngineError> {
        let handler = self
            .handlers
            .get(module_id)
            .ok_or_else(|| EngineError::UnknownModule(module_id.to_string()))?;

        let request = ModuleRequest::new(module_id, selected, catalog);
        let outcome = handler.run(&request, ctx)?;
        info!("{}", outcome.message);

        let snapshot = ctx.registry.get_all();
        let image = self.renderer.render(&snapshot);
        let lane = snapshot.iter().map(Band::of).collect();

        Ok(ModuleResult {
            module_id: module_id.to_string(),
            outcome,
            image,
            lane,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::signal::StaticSignalSource;
    use crate::core::models::protein::ProteinEntity;
    use crate::engine::config::GelConfig;
    use crate::workflows::settings::{ModuleSchema, RawSelection};

    struct DoubleAbundance;

    impl ModuleHandler for DoubleAbundance {
        fn id(&self) -> &'static str {
            "double"
        }

        fn run(
            &self,
            _request: &ModuleRequest<'_>,
            ctx: &mut WorkflowContext,
        ) -> Result<ModuleOutcome, EngineError> {
            for protein in ctx.registry.iter_mut() {
                protein.set_abundance(protein.abundance() * 2.0)?;
            }
            Ok(ModuleOutcome::new("doubled"))
        }
    }

    fn context() -> WorkflowContext {
        let mut ctx = WorkflowContext::new("/tmp", Box::new(StaticSignalSource::new()));
        ctx.registry
            .insert(ProteinEntity::from_record("sp|P1|A_TEST AB=1.5", "MKWVTFISLLFLFSSAYS").unwrap())
            .unwrap();
        ctx
    }

    fn catalog_with(id: &str) -> ModuleCatalog {
        let mut catalog = ModuleCatalog::new();
        catalog.insert(ModuleSchema {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            settings: BTreeMap::new(),
        });
        catalog
    }

    #[test]
    fn dispatch_runs_handler_and_renders_once() {
        let mut dispatcher = ModuleDispatcher::new(GelRenderer::new(GelConfig::default()));
        dispatcher.register(Box::new(DoubleAbundance)).unwrap();
        let mut ctx = context();

        let result = dispatcher
            .dispatch("double", &SelectedSettings::new(), &catalog_with("double"), &mut ctx)
            .unwrap();

        assert_eq!(result.outcome.message, "doubled");
        assert_eq!(result.lane.len(), 1);
        assert_eq!(result.lane[0].abundance, 3.0);
        assert!(!result.image.is_blank());
    }

    #[test]
    fn unknown_module_fails_without_touching_population() {
        let dispatcher = ModuleDispatcher::with_builtin_modules(GelRenderer::default());
        let mut ctx = context();
        let result = dispatcher.dispatch(
            "centrifugation",
            &SelectedSettings::new(),
            &ModuleCatalog::new(),
            &mut ctx,
        );
        assert!(matches!(result, Err(EngineError::UnknownModule(id)) if id == "centrifugation"));
        assert_eq!(ctx.registry.get("A_TEST").unwrap().abundance(), 1.5);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut dispatcher = ModuleDispatcher::new(GelRenderer::default());
        dispatcher.register(Box::new(DoubleAbundance)).unwrap();
        assert!(matches!(
            dispatcher.register(Box::new(DoubleAbundance)),
            Err(EngineError::DuplicateHandler(_))
        ));
    }

    #[test]
    fn builtin_handlers_match_builtin_catalog() {
        let dispatcher = ModuleDispatcher::with_builtin_modules(GelRenderer::default());
        let catalog = ModuleCatalog::builtin().unwrap();
        dispatcher.validate(&catalog).unwrap();
    }

    #[test]
    fn validate_reports_both_directions() {
        let mut dispatcher = ModuleDispatcher::new(GelRenderer::default());
        dispatcher.register(Box::new(DoubleAbundance)).unwrap();
        let err = dispatcher.validate(&catalog_with("triple")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("no handler for triple"));
        assert!(message.contains("no schema for double"));
    }

    #[test]
    fn request_exposes_catalog_options() {
        let catalog = ModuleCatalog::builtin().unwrap();
        let selected =
            SelectedSettings::from([("SEC mode".to_string(), RawSelection::Text("Simulate column".into()))]);
        let request = ModuleRequest::new("size_exclusion", &selected, &catalog);
        assert_eq!(request.options("SEC column").unwrap().len(), 4);
        assert_eq!(
            request.setting("SEC mode").unwrap().as_str(),
            Some("simulate")
        );
    }

    #[test]
    fn relative_paths_resolve_against_base_dir() {
        let ctx = context();
        assert_eq!(ctx.resolve_path("a.fasta"), PathBuf::from("/tmp/a.fasta"));
        assert_eq!(ctx.resolve_path("/data/b.fasta"), PathBuf::from("/data/b.fasta"));
    }
}
