use ab_glyph::FontArc;
use anyhow::{anyhow, Context};
use std::fs;
use std::path::Path;

/// Common install locations tried when no font is given on the command line.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub fn read_font(path: &Path) -> anyhow::Result<FontArc> {
    let bytes = fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
    FontArc::try_from_vec(bytes).map_err(|err| anyhow!("parsing font {}: {}", path.display(), err))
}

/// An explicit font must load; otherwise the first usable system font wins and
/// titles are skipped when none is found.
pub fn load_font(explicit: Option<&Path>) -> anyhow::Result<Option<FontArc>> {
    if let Some(path) = explicit {
        return read_font(path).map(Some);
    }

    for candidate in SYSTEM_FONTS.iter().map(Path::new) {
        if !candidate.is_file() {
            continue;
        }
        match read_font(candidate) {
            Ok(font) => {
                log::debug!("Using font {}", candidate.display());
                return Ok(Some(font));
            }
            Err(err) => log::debug!("Skipping font: {:#}", err),
        }
    }

    log::warn!("No usable font found; titles and colour-bar labels will be omitted");
    Ok(None)
}
