//! `quill render` command implementation.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Args;

use quill_config::{CliSettings, Config, Dialect};
use quill_pipeline::{
    ChainBuilder, EvaluationContext, ExportTarget, StatusEvent, StatusSender,
};
use quill_vars::interpolate;

use crate::definitions::definition_tree;
use crate::engine::{UnavailableEvaluator, XsltprocEngine};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Source document to render (dialect chosen by extension).
    file: PathBuf,

    /// YAML definition file supplying variable values.
    #[arg(short, long)]
    definitions: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover quill.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Script bootstrap file (overrides config).
    #[arg(long)]
    bootstrap: Option<PathBuf>,

    /// Script working directory (overrides config).
    #[arg(long)]
    working_dir: Option<PathBuf>,

    /// Emit plain Markdown instead of HTML.
    #[arg(long)]
    markdown: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error when configuration, definition loading, chain
    /// assembly, or a stylesheet transform fails.
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            bootstrap: self.bootstrap.clone(),
            working_dir: self.working_dir.clone(),
            cache_capacity: None,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let text = std::fs::read_to_string(&self.file)?;
        let dialect = Dialect::from_path(&self.file);
        tracing::info!(?dialect, file = %self.file.display(), "rendering");

        let flat = self.load_definitions()?;
        let resolution = interpolate(flat, &config.sigils().definitions);

        let (status, events) = StatusSender::channel();
        status.report_resolution(&resolution);

        let target = if self.markdown {
            ExportTarget::MarkdownPlain
        } else {
            ExportTarget::Html
        };

        let mut builder = ChainBuilder::new(dialect, target)
            .with_definitions(resolution.map)
            .with_sigils(config.sigils().clone())
            .with_source_path(self.file.clone())
            .with_status(status);

        if dialect.is_scripted() {
            builder = builder.with_evaluation_context(self.evaluation_context(&config)?);
        }
        if dialect.is_xml() {
            builder = builder.with_stylesheet_engine(Arc::new(XsltprocEngine));
        }

        let mut chain = builder.build()?;
        let rendered = chain.apply(text)?;

        for event in events.try_iter() {
            output.warning(&describe(&event));
        }

        if let Some(rendered) = rendered {
            self.write(&rendered)?;
            if let Some(path) = &self.output {
                output.success(&format!("Wrote {}", path.display()));
            }
        } else {
            output.info("Output delivered to sink; nothing to write.");
        }

        Ok(())
    }

    fn load_definitions(&self) -> Result<HashMap<String, String>, CliError> {
        let Some(path) = &self.definitions else {
            return Ok(HashMap::new());
        };

        let raw = std::fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&raw)?;
        Ok(definition_tree(&value).flatten())
    }

    fn evaluation_context(
        &self,
        config: &Config,
    ) -> Result<Arc<Mutex<EvaluationContext>>, CliError> {
        let script = config.script();
        let mut context =
            EvaluationContext::with_capacity(UnavailableEvaluator, script.cache_capacity);

        if let Some(bootstrap) = &script.bootstrap {
            context.set_bootstrap(std::fs::read_to_string(bootstrap)?);
        }
        if let Some(working_dir) = &script.working_dir {
            context.set_working_dir(working_dir.clone());
        }

        Ok(Arc::new(Mutex::new(context)))
    }

    fn write(&self, rendered: &str) -> Result<(), CliError> {
        match &self.output {
            Some(path) => std::fs::write(path, rendered)?,
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(rendered.as_bytes())?;
                stdout.write_all(b"\n")?;
            }
        }
        Ok(())
    }
}

/// Render a status event as status-bar text.
fn describe(event: &StatusEvent) -> String {
    match event {
        StatusEvent::ParseError {
            preview,
            message,
            offset,
        } => {
            format!("script error at offset {offset}: {message} (in `{preview}`)")
        }
        StatusEvent::CyclicDefinition { keys } => {
            format!("cyclic definition references: {}", keys.join(", "))
        }
        StatusEvent::MissingDefinition { key } => {
            format!("missing definition: {key}")
        }
    }
}
