//! Turns filename settings into full paths.
//!
//! Relative filenames live in the `gis` directory under `basin_data_path`,
//! except for a few settings that sit in `basin_data_path` itself. Some
//! settings accept the value `default`, which is replaced by another setting
//! or by a fixed filename.

use std::path::{Path, PathBuf};

use log::debug;

use crate::control::{ControlPath, SettingSource};
use crate::error::Result;

pub const BASIN_DATA_PATH: &str = "basin_data_path";
pub const GIS_DIR: &str = "gis";
pub const DEFAULT_VALUE: &str = "default";

/// What a `default` value is replaced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultFile {
    /// The value of another setting.
    Setting(&'static str),
    /// A fixed filename.
    Literal(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    BaseDir,
    GisDir,
    GisDirWithDefault(DefaultFile),
}

const PLACEMENTS: &[(&str, Placement)] = &[
    ("basin_gruId_txt", Placement::BaseDir),
    ("basin_gruNo_gruId_txt", Placement::BaseDir),
    (
        "refraster",
        Placement::GisDirWithDefault(DefaultFile::Setting("basin_dem_raster")),
    ),
    // Written by the pipeline, so there is nothing to read a name from.
    (
        "basin_gru_shp",
        Placement::GisDirWithDefault(DefaultFile::Literal("gru.shp")),
    ),
];

/// Settings not in the table go to the GIS directory.
pub fn placement_for(setting: &str) -> Placement {
    PLACEMENTS
        .iter()
        .find(|(name, _)| *name == setting)
        .map_or(Placement::GisDir, |(_, placement)| *placement)
}

/// Resolves the filename stored under `setting` against the basin data
/// directories, looking settings up in `source`.
///
/// Absolute values are returned unchanged. Nothing is checked on disk.
pub fn resolve_filename<S>(source: &S, setting: &str) -> Result<PathBuf>
where
    S: SettingSource + ?Sized,
{
    let file_name = source.setting(setting)?;
    let basin_data_path = PathBuf::from(source.setting(BASIN_DATA_PATH)?);
    let gis_path = basin_data_path.join(GIS_DIR);

    if Path::new(&file_name).is_absolute() {
        return Ok(PathBuf::from(file_name));
    }

    let resolved = match placement_for(setting) {
        Placement::BaseDir => basin_data_path.join(&file_name),
        Placement::GisDirWithDefault(default) if file_name == DEFAULT_VALUE => {
            let name = match default {
                DefaultFile::Setting(key) => source.setting(key)?,
                DefaultFile::Literal(name) => name.to_string(),
            };
            gis_path.join(name)
        }
        Placement::GisDir | Placement::GisDirWithDefault(_) => {
            gis_path.join(&file_name)
        }
    };

    debug!("{} -> {}", setting, resolved.display());
    Ok(resolved)
}

/// [`resolve_filename`] against the control file at `control_file`.
pub fn set_filename(control_file: &Path, setting: &str) -> Result<PathBuf> {
    resolve_filename(&ControlPath(control_file), setting)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ControlFile;
    use crate::error::ControlError;

    const CONTROL: &str = "\
basin_data_path       | /data/
basin_dem_raster      | dem.tif
basin_gruId_txt       | ids.txt
basin_gruNo_gruId_txt | gru_ids.txt
refraster             | default
basin_gru_shp         | default   # created later
river_network_shp     | rivers.shp
absolute_raster       | /elsewhere/soil.tif
";

    fn write_control(text: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("control_active.txt");
        std::fs::write(&path, text).unwrap();
        (dir, path)
    }

    #[test]
    fn placement_table() {
        assert_eq!(placement_for("basin_gruId_txt"), Placement::BaseDir);
        assert_eq!(placement_for("basin_gruNo_gruId_txt"), Placement::BaseDir);
        assert_eq!(
            placement_for("refraster"),
            Placement::GisDirWithDefault(DefaultFile::Setting("basin_dem_raster"))
        );
        assert_eq!(
            placement_for("basin_gru_shp"),
            Placement::GisDirWithDefault(DefaultFile::Literal("gru.shp"))
        );
        assert_eq!(placement_for("anything_else"), Placement::GisDir);
    }

    #[test]
    fn absolute_value_is_unchanged() {
        let (_dir, path) = write_control(CONTROL);
        assert_eq!(
            set_filename(&path, "absolute_raster").unwrap(),
            PathBuf::from("/elsewhere/soil.tif")
        );
    }

    #[test]
    fn base_dir_settings() {
        let (_dir, path) = write_control(CONTROL);
        assert_eq!(
            set_filename(&path, "basin_gruId_txt").unwrap(),
            PathBuf::from("/data/ids.txt")
        );
        assert_eq!(
            set_filename(&path, "basin_gruNo_gruId_txt").unwrap(),
            PathBuf::from("/data/gru_ids.txt")
        );
    }

    #[test]
    fn refraster_default_uses_dem() {
        let (_dir, path) = write_control(CONTROL);
        assert_eq!(
            set_filename(&path, "refraster").unwrap(),
            PathBuf::from("/data/gis/dem.tif")
        );
    }

    #[test]
    fn gru_shp_default_is_fixed_name() {
        let (_dir, path) = write_control(CONTROL);
        assert_eq!(
            set_filename(&path, "basin_gru_shp").unwrap(),
            PathBuf::from("/data/gis/gru.shp")
        );
    }

    #[test]
    fn non_default_values_keep_their_name() {
        let (_dir, path) = write_control(
            "basin_data_path | /data/\nrefraster | mine.tif\nbasin_gru_shp | catchments.shp\n",
        );
        assert_eq!(
            set_filename(&path, "refraster").unwrap(),
            PathBuf::from("/data/gis/mine.tif")
        );
        assert_eq!(
            set_filename(&path, "basin_gru_shp").unwrap(),
            PathBuf::from("/data/gis/catchments.shp")
        );
    }

    #[test]
    fn other_settings_go_to_gis_dir() {
        let (_dir, path) = write_control(CONTROL);
        assert_eq!(
            set_filename(&path, "river_network_shp").unwrap(),
            PathBuf::from("/data/gis/rivers.shp")
        );
    }

    #[test]
    fn data_path_without_trailing_slash() {
        let (_dir, path) =
            write_control("basin_data_path | /data\nbasin_gruId_txt | ids.txt\n");
        assert_eq!(
            set_filename(&path, "basin_gruId_txt").unwrap(),
            PathBuf::from("/data/ids.txt")
        );
    }

    #[test]
    fn missing_data_path_is_an_error() {
        let (_dir, path) = write_control("river_network_shp | rivers.shp\n");
        assert!(matches!(
            set_filename(&path, "river_network_shp"),
            Err(ControlError::SettingNotFound { ref setting, .. }) if setting == BASIN_DATA_PATH
        ));
    }

    #[test]
    fn missing_dem_for_default_refraster() {
        let (_dir, path) = write_control("basin_data_path | /data/\nrefraster | default\n");
        assert!(matches!(
            set_filename(&path, "refraster"),
            Err(ControlError::SettingNotFound { ref setting, .. }) if setting == "basin_dem_raster"
        ));
    }

    #[test]
    fn in_memory_source_resolves_the_same() {
        let (_dir, path) = write_control(CONTROL);
        let file = ControlFile::load(&path).unwrap();
        for setting in ["basin_gruId_txt", "refraster", "basin_gru_shp", "river_network_shp"] {
            assert_eq!(
                resolve_filename(&file, setting).unwrap(),
                set_filename(&path, setting).unwrap()
            );
        }
    }
}
