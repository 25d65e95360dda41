use crate::settings::Settings;
use crate::Format;
use owo_colors::OwoColorize;
use std::path::PathBuf;

pub fn run_create_target(
    generator: PathBuf,
    lang: String,
    overwrite: bool,
    mode: Option<String>,
    no_match: bool,
    format: Format,
    use_color: bool,
) -> color_eyre::Result<()> {
    tracing::debug!(event = "create_target_args", generator = ?generator, lang = %lang, overwrite = overwrite);
    let settings = Settings::load()?;
    let refresh = settings.refresh_options(mode.as_deref(), false, no_match)?;
    let opts = settings.batch_options(refresh, Vec::new(), false);
    let mut cache = settings.cache();
    let created = xlfsync_services::create_target_file(
        &generator,
        &lang,
        overwrite,
        &opts,
        None,
        Some(&mut cache),
    )?;

    if super::is_json(format) {
        return super::print_json(&created);
    }
    let path = if use_color {
        format!("{}", created.path.green())
    } else {
        created.path.clone()
    };
    crate::ui_ok!(
        "Created {} with {} unit(s), {} matched suggestion(s)",
        path,
        created.units,
        created.number_of_matches
    );
    Ok(())
}
