//! Whole-file loading on top of the synchronous decoders.

use std::path::Path;

use wipeout_decode::{
    DecodeSession, Decoded, Mesh, ObjectEntry, SectionGraph, TrackGeometry, decode_object,
    decode_objects, decode_track_geometry, decode_track_sections, mock_mesh, scan_objects,
};

use crate::cache::{Cache, MemoryCache, NoCache};
use crate::error::{Error, Result};
use crate::types::{Track, TrackPaths};

/// Runtime options for a [`Loader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Substitute a procedural mesh when [`Loader::load_object_or_mock`]
    /// cannot load the requested object.
    pub fallback_to_mock: bool,
    /// Byte limit for the cache built by [`Loader::with_memory_cache`].
    pub cache_max_bytes: Option<usize>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            fallback_to_mock: true,
            cache_max_bytes: None,
        }
    }
}

/// Reads game files from disk (or a cache) and decodes them.
///
/// Every call decodes with a fresh [`DecodeSession`], so a loader holds no
/// decode state and can be shared freely.
#[derive(Debug, Clone)]
pub struct Loader<C: Cache = NoCache> {
    config: LoaderConfig,
    cache: C,
}

impl Loader<NoCache> {
    /// Create a loader with default settings and no cache.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(LoaderConfig::default())
    }

    #[must_use]
    pub fn with_config(config: LoaderConfig) -> Self {
        Self {
            config,
            cache: NoCache,
        }
    }
}

impl Default for Loader<NoCache> {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader<MemoryCache> {
    /// Create a loader backed by a memory cache sized from `config`.
    #[must_use]
    pub fn with_memory_cache(config: LoaderConfig) -> Self {
        let cache = config
            .cache_max_bytes
            .map_or_else(MemoryCache::new, MemoryCache::with_max_size);
        Self { config, cache }
    }
}

impl<C: Cache> Loader<C> {
    /// Replace the cache, keeping the configuration.
    #[must_use]
    pub fn with_cache<D: Cache>(self, cache: D) -> Loader<D> {
        Loader {
            config: self.config,
            cache,
        }
    }

    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    #[must_use]
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Read a whole file, consulting the cache first.
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        if let Some(data) = self.cache.get(path)? {
            tracing::debug!(path = %path.display(), bytes = data.len(), "cache hit");
            return Ok(data);
        }

        let data = std::fs::read(path).map_err(|e| Error::io(path, &e))?;
        tracing::debug!(path = %path.display(), bytes = data.len(), "read file");
        self.cache.put(path, &data)?;
        Ok(data)
    }

    /// Load the `index`-th vertex-bearing object of a container.
    pub fn load_object(&self, path: impl AsRef<Path>, index: usize) -> Result<Decoded<Mesh>> {
        let path = path.as_ref();
        let data = self.read(path)?;
        let mut session = DecodeSession::new();
        let decoded =
            decode_object(&data, index, &mut session).map_err(|e| Error::decode_at(path, e))?;
        log_partial(path, &decoded);
        Ok(decoded)
    }

    /// Load an object, substituting a procedural mesh if that fails and
    /// [`LoaderConfig::fallback_to_mock`] is set.
    ///
    /// A partially decoded object is still returned as decoded.
    pub fn load_object_or_mock(&self, path: impl AsRef<Path>, index: usize) -> Result<Mesh> {
        let path = path.as_ref();
        match self.load_object(path, index) {
            Ok(decoded) => Ok(decoded.into_value()),
            Err(error) if self.config.fallback_to_mock => {
                tracing::warn!(
                    path = %path.display(),
                    index,
                    %error,
                    "substituting mock mesh"
                );
                let stem = path.file_stem().map_or_else(
                    || "object".into(),
                    |s| s.to_string_lossy().into_owned(),
                );
                let seed = u32::try_from(index).unwrap_or(u32::MAX);
                Ok(mock_mesh(&format!("{stem}:{index}"), seed))
            }
            Err(error) => Err(error),
        }
    }

    /// List a container's vertex-bearing objects.
    pub fn scan_objects(&self, path: impl AsRef<Path>) -> Result<Decoded<Vec<ObjectEntry>>> {
        let path = path.as_ref();
        let scan = scan_objects(&self.read(path)?);
        log_partial(path, &scan);
        Ok(scan)
    }

    /// Decode every vertex-bearing object of a container.
    pub fn load_objects(&self, path: impl AsRef<Path>) -> Result<Decoded<Vec<Mesh>>> {
        let path = path.as_ref();
        let data = self.read(path)?;
        let mut session = DecodeSession::new();
        let meshes = decode_objects(&data, &mut session);
        tracing::info!(
            path = %path.display(),
            objects = meshes.value.len(),
            kinds = session.seen_kinds().len(),
            "loaded container"
        );
        log_partial(path, &meshes);
        Ok(meshes)
    }

    /// Load and assemble a track mesh from its vertex and face files.
    pub fn load_track_geometry(
        &self,
        vertices_path: impl AsRef<Path>,
        faces_path: impl AsRef<Path>,
    ) -> Result<TrackGeometry> {
        let paths = TrackPaths::new(vertices_path.as_ref(), faces_path.as_ref());
        self.track_geometry(&paths)
    }

    fn track_geometry(&self, paths: &TrackPaths) -> Result<TrackGeometry> {
        let vertex_data = self.read(&paths.vertices)?;
        let face_data = self.read(&paths.faces)?;
        Ok(decode_track_geometry(&paths.name(), &vertex_data, &face_data)?)
    }

    /// Load and link a track's sections.
    pub fn load_track_sections(&self, path: impl AsRef<Path>) -> Result<SectionGraph> {
        Ok(decode_track_sections(&self.read(path.as_ref())?)?)
    }

    /// Load a whole track. Without a section path the section graph is empty.
    pub fn load_track(&self, paths: &TrackPaths) -> Result<Track> {
        let geometry = self.track_geometry(paths)?;
        let sections = match &paths.sections {
            Some(path) => self.load_track_sections(path)?,
            None => SectionGraph::default(),
        };

        let faces = geometry.faces.len();
        let overrunning = sections.iter().filter(|s| s.faces().end > faces).count();
        if overrunning > 0 {
            tracing::warn!(
                sections = overrunning,
                faces,
                "track sections reference faces past the end of the face list"
            );
        }

        tracing::info!(
            track = %paths.name(),
            vertices = geometry.mesh.vertices.len(),
            faces,
            sections = sections.len(),
            "loaded track"
        );
        Ok(Track { geometry, sections })
    }
}

fn log_partial<T>(path: &Path, decoded: &Decoded<T>) {
    if let Some(reason) = decoded.reason() {
        tracing::warn!(path = %path.display(), %reason, "container decoded partially");
    }
}
