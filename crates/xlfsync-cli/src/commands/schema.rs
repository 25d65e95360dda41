use std::fs;
use std::path::PathBuf;

pub fn run_schema(out_dir: PathBuf) -> color_eyre::Result<()> {
    let settings = crate::settings::Settings::load()?;
    let out_dir = if out_dir.as_os_str().is_empty() {
        PathBuf::from(
            settings
                .schema_dir()
                .unwrap_or_else(|| "./docs/schemas".to_string()),
        )
    } else {
        out_dir
    };
    fs::create_dir_all(&out_dir)?;
    macro_rules! dump {
        ($ty:ty, $name:literal) => {{
            let schema = schemars::schema_for!($ty);
            let path = out_dir.join($name);
            let f = std::fs::File::create(&path)?;
            serde_json::to_writer_pretty(f, &schema)?;
        }};
    }
    dump!(xlfsync_domain::BatchReport, "batch_report.schema.json");
    dump!(xlfsync_domain::UntranslatedText, "untranslated_text.schema.json");
    dump!(xlfsync_domain::TranslatedText, "translated_text.schema.json");
    dump!(xlfsync_domain::TranslatedTextWithState, "translated_text_with_state.schema.json");
    dump!(xlfsync_domain::TranslationToSave, "translation_to_save.schema.json");
    dump!(xlfsync_domain::SaveSummary, "save_summary.schema.json");
    dump!(xlfsync_domain::CreatedTarget, "created_target.schema.json");
    crate::ui_ok!("Schemas written to {}", out_dir.display());
    Ok(())
}
