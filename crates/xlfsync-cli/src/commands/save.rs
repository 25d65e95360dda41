use crate::settings::Settings;
use crate::Format;
use color_eyre::eyre::WrapErr;
use std::path::PathBuf;
use xlfsync_domain::TranslationToSave;

pub fn run_save(
    file: PathBuf,
    input: PathBuf,
    mode: Option<String>,
    format: Format,
) -> color_eyre::Result<()> {
    tracing::debug!(event = "save_args", file = ?file, input = ?input, mode = ?mode);
    let raw = std::fs::read_to_string(&input)
        .wrap_err_with(|| format!("failed to read {}", input.display()))?;
    let items: Vec<TranslationToSave> = serde_json::from_str(&raw)
        .wrap_err_with(|| format!("{} is not a list of translations", input.display()))?;

    let settings = Settings::load()?;
    let mode = settings.mode(mode.as_deref())?;
    let mut cache = settings.cache();
    let summary = xlfsync_services::save_translations(
        &file,
        &items,
        mode,
        &settings.serialize_options(),
        Some(&mut cache),
    )?;

    if super::is_json(format) {
        return super::print_json(&summary);
    }
    crate::ui_ok!("Saved {} translation(s) to {}", summary.saved, summary.path);
    Ok(())
}
