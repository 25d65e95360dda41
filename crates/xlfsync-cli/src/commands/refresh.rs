use crate::settings::Settings;
use crate::Format;
use color_eyre::eyre::bail;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use xlfsync_domain::BatchReport;

#[derive(Debug)]
pub struct RefreshArgs {
    pub generator: Option<PathBuf>,
    pub targets: Vec<PathBuf>,
    pub dir: Option<PathBuf>,
    pub sort_only: bool,
    pub mode: Option<String>,
    pub no_match: bool,
    pub suggestions: Vec<PathBuf>,
    pub all_or_nothing: bool,
}

pub fn run_refresh(args: RefreshArgs, format: Format, use_color: bool) -> color_eyre::Result<()> {
    tracing::debug!(event = "refresh_args", args = ?args);
    let settings = Settings::load()?;
    let refresh = settings.refresh_options(args.mode.as_deref(), args.sort_only, args.no_match)?;
    let opts = settings.batch_options(refresh, args.suggestions, args.all_or_nothing);
    let mut cache = settings.cache();

    let report = match (&args.dir, &args.generator) {
        (Some(dir), _) => xlfsync_services::refresh_all(dir, &opts, None, None, Some(&mut cache))?,
        (None, Some(generator)) => {
            let targets = if args.targets.is_empty() {
                sibling_targets(generator)?
            } else {
                args.targets.clone()
            };
            xlfsync_services::refresh_files(generator, &targets, &opts, None, None, Some(&mut cache))?
        }
        (None, None) => bail!("either --generator or --dir is required"),
    };

    if super::is_json(format) {
        super::print_json(&report)?;
    } else {
        print_report(&report, use_color);
    }
    if !report.failures.is_empty() {
        bail!("{} file(s) could not be refreshed", report.failures.len());
    }
    Ok(())
}

/// Every other `.xlf` in the generator's folder.
fn sibling_targets(generator: &Path) -> color_eyre::Result<Vec<PathBuf>> {
    let dir = generator
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let own_name = generator.file_name();
    let targets = xlfsync_services::batch::target_files(dir)?
        .into_iter()
        .filter(|p| p.file_name() != own_name)
        .collect();
    Ok(targets)
}

fn print_report(report: &BatchReport, use_color: bool) {
    for f in &report.files {
        let name = Path::new(&f.path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| f.path.clone());
        let line = f.report.summary(Some(&name));
        if use_color && f.report.is_changed() {
            crate::ui_ok!("{}", line.green());
        } else {
            crate::ui_ok!("{}", line);
        }
    }
    for failure in &report.failures {
        if use_color {
            crate::ui_err!("{}: {}", failure.path.red(), failure.error);
        } else {
            crate::ui_err!("{}: {}", failure.path, failure.error);
        }
    }
    if report.cancelled {
        crate::ui_warn!("refresh cancelled before all files were processed");
    }
    crate::ui_out!("{}", report.total.summary(None));
}
