//! High-level types for loaded game data.

use std::path::{Path, PathBuf};

use wipeout_decode::{SectionGraph, TrackFace, TrackGeometry, TrackSection};

/// Locations of the files that make up one track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackPaths {
    /// Track vertex file (`.trv`).
    pub vertices: PathBuf,
    /// Track face file (`.trf`).
    pub faces: PathBuf,
    /// Track section file (`.trs`). Tracks load without one.
    pub sections: Option<PathBuf>,
}

impl TrackPaths {
    /// Create paths for a track without section data.
    #[must_use]
    pub fn new(vertices: impl Into<PathBuf>, faces: impl Into<PathBuf>) -> Self {
        Self {
            vertices: vertices.into(),
            faces: faces.into(),
            sections: None,
        }
    }

    /// Use the conventional `track.trv`, `track.trf` and `track.trs` names
    /// inside a track directory.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            vertices: dir.join("track.trv"),
            faces: dir.join("track.trf"),
            sections: Some(dir.join("track.trs")),
        }
    }

    #[must_use]
    pub fn with_sections(mut self, sections: impl Into<PathBuf>) -> Self {
        self.sections = Some(sections.into());
        self
    }

    /// Name used for the assembled mesh: the vertex file's parent directory,
    /// or its stem when it has no parent.
    #[must_use]
    pub fn name(&self) -> String {
        self.vertices
            .parent()
            .and_then(Path::file_name)
            .or_else(|| self.vertices.file_stem())
            .map_or_else(|| "track".to_string(), |n| n.to_string_lossy().into_owned())
    }
}

/// A fully loaded track: renderable geometry plus its section graph.
#[derive(Debug, Clone)]
pub struct Track {
    pub geometry: TrackGeometry,
    /// Empty when the track was loaded without a section file.
    pub sections: SectionGraph,
}

impl Track {
    /// Track faces covered by a section.
    ///
    /// The section's face range is clamped to the faces that actually
    /// decoded, so damaged section data yields a shorter (possibly empty)
    /// slice rather than a panic.
    #[must_use]
    pub fn section_faces(&self, section: &TrackSection) -> &[TrackFace] {
        let faces = &self.geometry.faces;
        let range = section.faces();
        let end = range.end.min(faces.len());
        let start = range.start.min(end);
        &faces[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conventional_track_paths() {
        let paths = TrackPaths::in_dir("wipeout/track02");
        assert_eq!(paths.vertices, Path::new("wipeout/track02/track.trv"));
        assert_eq!(paths.faces, Path::new("wipeout/track02/track.trf"));
        assert_eq!(
            paths.sections.as_deref(),
            Some(Path::new("wipeout/track02/track.trs"))
        );
        assert_eq!(paths.name(), "track02");
    }

    #[test]
    fn test_name_falls_back_to_stem() {
        assert_eq!(TrackPaths::new("altima.trv", "altima.trf").name(), "altima");
    }
}
