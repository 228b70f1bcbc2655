use anyhow::Context;
use image::RgbaImage;
use std::fs;
use std::path::{Path, PathBuf};
use surveycore::survey::{parse_records, Dataset};

/// Default measurement file for a survey title: `<title>.json`.
pub fn data_path_for_title(title: &str) -> PathBuf {
    PathBuf::from(format!("{}.json", title))
}

pub fn load_background(path: &Path) -> anyhow::Result<RgbaImage> {
    let image = image::open(path)
        .with_context(|| format!("reading background image {}", path.display()))?;
    Ok(image.to_rgba8())
}

/// Reads the measurement records and binds them to the background's extent.
pub fn load_dataset(path: &Path, width: u32, height: u32) -> anyhow::Result<Dataset> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading measurements {}", path.display()))?;
    let points = parse_records(&contents)
        .with_context(|| format!("parsing measurements {}", path.display()))?;
    log::info!("Loaded {} measurement points from {}", points.len(), path.display());
    Dataset::new(points, width, height)
        .with_context(|| format!("validating measurements {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn data_path_uses_title() {
        assert_eq!(data_path_for_title("office"), PathBuf::from("office.json"));
    }

    #[test]
    fn load_dataset_reads_records() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            br#"[{"x": 10, "y": 20, "result": {"iwconfig": {"stats": {"level": -48, "quality": 62}}}}]"#,
        )
        .unwrap();
        let path = temp.into_temp_path();
        let dataset = load_dataset(&path, 64, 48).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!((dataset.width(), dataset.height()), (64, 48));
    }

    #[test]
    fn load_dataset_rejects_points_outside_the_image() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(br#"[{"x": 500, "y": 20, "result": {}}]"#).unwrap();
        let path = temp.into_temp_path();
        assert!(load_dataset(&path, 64, 48).is_err());
    }

    #[test]
    fn missing_files_are_reported() {
        let dir = tempdir().unwrap();
        assert!(load_dataset(&dir.path().join("absent.json"), 10, 10).is_err());
        assert!(load_background(&dir.path().join("absent.png")).is_err());
    }

    #[test]
    fn load_background_returns_rgba_pixels() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plan.png");
        RgbaImage::from_pixel(12, 8, Rgba([1, 2, 3, 255]))
            .save(&path)
            .unwrap();
        let image = load_background(&path).unwrap();
        assert_eq!(image.dimensions(), (12, 8));
        assert_eq!(*image.get_pixel(0, 0), Rgba([1, 2, 3, 255]));
    }
}
