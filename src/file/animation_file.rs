use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::render::arena::FileId;
use crate::render::renderer::Renderer;
use crate::runtime::{
    AssetKind, AssetLoader, Factory, FileAsset, FileImporter, FileVersion, ImportResult,
    NativeFile, ResourceHandle,
};

static NEXT_FILE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
/// Asset reference held in a file's registry.
pub struct EmbeddedAsset {
    /// Reference as reported by the importer.
    pub asset: FileAsset,
    /// Device resource decoded from in-band bytes, if any.
    pub resource: Option<ResourceHandle>,
    /// Size of the in-band bytes; `0` for external assets.
    pub inband_len: usize,
}

#[derive(Default)]
/// Default [`AssetLoader`]: records every reference and decodes in-band images.
pub struct RegistryAssetLoader {
    registry: BTreeMap<u32, EmbeddedAsset>,
}

impl RegistryAssetLoader {
    /// Recorded references keyed by asset id.
    pub fn into_registry(self) -> BTreeMap<u32, EmbeddedAsset> {
        self.registry
    }
}

impl AssetLoader for RegistryAssetLoader {
    fn load_contents(&mut self, asset: &FileAsset, inband: &[u8], factory: &dyn Factory) -> bool {
        let resource = match asset.kind {
            AssetKind::Image if !inband.is_empty() => factory.decode_image(inband),
            _ => None,
        };
        if asset.kind == AssetKind::Image && !inband.is_empty() && resource.is_none() {
            tracing::warn!(asset = %asset.name, "embedded image could not be decoded");
        }
        self.registry.insert(
            asset.id,
            EmbeddedAsset {
                asset: asset.clone(),
                resource,
                inband_len: inband.len(),
            },
        );
        resource.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Which artboard of a file to use.
pub enum ArtboardSelector {
    /// By position; out-of-range indices clamp to the last artboard.
    Index(usize),
    /// By name; unknown names fall back to the default artboard. Empty means default.
    Name(String),
}

impl Default for ArtboardSelector {
    fn default() -> Self {
        Self::Index(0)
    }
}

impl From<usize> for ArtboardSelector {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

impl From<&str> for ArtboardSelector {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

#[derive(Clone)]
/// Resolved artboard of one specific import of a file.
pub struct ArtboardHandle {
    file: FileId,
    generation: u64,
    index: usize,
    name: String,
    native: Arc<dyn NativeFile>,
}

impl ArtboardHandle {
    /// Owning file.
    pub fn file(&self) -> FileId {
        self.file
    }

    /// Import generation the handle belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Artboard index within the file.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Artboard name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn native_file(&self) -> &Arc<dyn NativeFile> {
        &self.native
    }
}

impl PartialEq for ArtboardHandle {
    fn eq(&self, other: &Self) -> bool {
        self.file == other.file && self.generation == other.generation && self.index == other.index
    }
}

impl Eq for ArtboardHandle {}

impl fmt::Debug for ArtboardHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtboardHandle")
            .field("file", &self.file)
            .field("generation", &self.generation)
            .field("index", &self.index)
            .field("name", &self.name)
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
/// Diagnostic counts for an imported file.
pub struct FileStats {
    /// Runtime format version.
    pub version: FileVersion,
    /// Number of artboards.
    pub artboards: usize,
    /// Number of registered assets.
    pub assets: usize,
    /// Linear animations on the default artboard.
    pub default_artboard_animations: usize,
}

/// Parsed animation file and the artboards instanced from it.
///
/// Dropping the file (or calling [`teardown`](Self::teardown)) resets every artboard
/// instance built from it. A successful re-import resets instances of the previous
/// import.
pub struct AnimationFile {
    id: FileId,
    renderer: Arc<Renderer>,
    generation: u64,
    native: Option<Arc<dyn NativeFile>>,
    assets: BTreeMap<u32, EmbeddedAsset>,
}

impl AnimationFile {
    /// Empty file bound to `renderer`.
    pub fn new(renderer: Arc<Renderer>) -> Self {
        Self {
            id: FileId(NEXT_FILE_ID.fetch_add(1, Ordering::Relaxed)),
            renderer,
            generation: 0,
            native: None,
            assets: BTreeMap::new(),
        }
    }

    /// File identity.
    pub fn id(&self) -> FileId {
        self.id
    }

    /// Current import generation; `0` before the first successful import.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Import `bytes`, recording assets with a [`RegistryAssetLoader`].
    pub fn import(
        &mut self,
        bytes: &[u8],
        importer: &dyn FileImporter,
        factory: &dyn Factory,
    ) -> ImportResult {
        let mut loader = RegistryAssetLoader::default();
        match self.parse(bytes, importer, factory, &mut loader) {
            Ok(native) => {
                self.commit(native, loader.into_registry());
                ImportResult::Success
            }
            Err(result) => result,
        }
    }

    /// Import `bytes`, resolving assets with a caller-provided loader.
    ///
    /// The registry then lists every reported asset without decoded resources.
    pub fn import_with_loader(
        &mut self,
        bytes: &[u8],
        importer: &dyn FileImporter,
        factory: &dyn Factory,
        loader: &mut dyn AssetLoader,
    ) -> ImportResult {
        match self.parse(bytes, importer, factory, loader) {
            Ok(native) => {
                let registry = native
                    .assets()
                    .into_iter()
                    .map(|asset| {
                        (
                            asset.id,
                            EmbeddedAsset {
                                asset,
                                resource: None,
                                inband_len: 0,
                            },
                        )
                    })
                    .collect();
                self.commit(native, registry);
                ImportResult::Success
            }
            Err(result) => result,
        }
    }

    #[tracing::instrument(skip_all, fields(file = self.id.0, bytes = bytes.len()))]
    fn parse(
        &self,
        bytes: &[u8],
        importer: &dyn FileImporter,
        factory: &dyn Factory,
        loader: &mut dyn AssetLoader,
    ) -> Result<Arc<dyn NativeFile>, ImportResult> {
        match importer.import(bytes, factory, loader) {
            Ok(native) if native.artboard_count() > 0 => Ok(native),
            Ok(_) => {
                tracing::error!("imported file has no artboards");
                Err(ImportResult::Malformed)
            }
            Err(failure) => {
                let result = ImportResult::from(failure);
                tracing::error!(result = ?result, "import failed, previous file kept");
                Err(result)
            }
        }
    }

    fn commit(&mut self, native: Arc<dyn NativeFile>, assets: BTreeMap<u32, EmbeddedAsset>) {
        let previous = self.generation;
        self.generation += 1;
        {
            let mut arena = self.renderer.thread_lock().lock();
            if self.native.is_some() {
                let reset = arena.invalidate_file_generation(self.id, previous);
                tracing::debug!(file = self.id.0, reset, "instances of previous import reset");
            }
            arena.register_file(self.id, self.generation);
        }
        self.native = Some(native);
        self.assets = assets;
        self.log_stats();
    }

    /// `true` once an import succeeded and the file was not torn down.
    pub fn is_imported(&self) -> bool {
        self.native.is_some()
    }

    /// Resolve an artboard, degrading to a usable default.
    ///
    /// Out-of-range indices clamp to the last artboard with a warning. Unknown names
    /// resolve to the default artboard with an error. `None` only when nothing is
    /// imported.
    pub fn get_artboard(&self, selector: &ArtboardSelector) -> Option<ArtboardHandle> {
        let Some(native) = self.native.as_ref() else {
            tracing::error!(file = self.id.0, "no file imported, artboard unavailable");
            return None;
        };
        let count = native.artboard_count();
        let index = match selector {
            ArtboardSelector::Index(i) if *i < count => *i,
            ArtboardSelector::Index(i) => {
                tracing::warn!(
                    requested = *i,
                    count,
                    "artboard index out of range, using the last artboard"
                );
                count.saturating_sub(1)
            }
            ArtboardSelector::Name(name) if name.is_empty() => 0,
            ArtboardSelector::Name(name) => match native.artboard_index(name) {
                Some(i) => i,
                None => {
                    tracing::error!(artboard = %name, "artboard not found, using the default");
                    0
                }
            },
        };
        Some(ArtboardHandle {
            file: self.id,
            generation: self.generation,
            index,
            name: native.artboard_name(index).unwrap_or_default(),
            native: Arc::clone(native),
        })
    }

    /// Number of artboards; `0` when nothing is imported.
    pub fn artboard_count(&self) -> usize {
        self.native.as_ref().map_or(0, |n| n.artboard_count())
    }

    /// Artboard names in file order.
    pub fn artboard_names(&self) -> Vec<String> {
        let Some(native) = self.native.as_ref() else {
            return Vec::new();
        };
        (0..native.artboard_count())
            .filter_map(|i| native.artboard_name(i))
            .collect()
    }

    /// Number of registered assets.
    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    /// Registered assets keyed by id.
    pub fn assets(&self) -> &BTreeMap<u32, EmbeddedAsset> {
        &self.assets
    }

    /// Linear animations on the default artboard.
    pub fn default_artboard_animation_count(&self) -> usize {
        self.native
            .as_ref()
            .map_or(0, |n| n.artboard_animation_count(0))
    }

    /// Format version of the imported file.
    pub fn version(&self) -> Option<FileVersion> {
        self.native.as_ref().map(|n| n.version())
    }

    /// Diagnostic counts; `None` when nothing is imported.
    pub fn stats(&self) -> Option<FileStats> {
        Some(FileStats {
            version: self.version()?,
            artboards: self.artboard_count(),
            assets: self.asset_count(),
            default_artboard_animations: self.default_artboard_animation_count(),
        })
    }

    /// Log [`stats`](Self::stats) at info level.
    pub fn log_stats(&self) {
        if let Some(s) = self.stats() {
            tracing::info!(
                file = self.id.0,
                runtime = %format!("{}.{}", s.version.major, s.version.minor),
                artboards = s.artboards,
                assets = s.assets,
                animations = s.default_artboard_animations,
                "animation file loaded"
            );
        }
    }

    /// Release the parsed file and reset every artboard built from it.
    pub fn teardown(&mut self) {
        if self.native.take().is_none() {
            return;
        }
        self.assets.clear();
        let reset = self.renderer.thread_lock().lock().retire_file(self.id);
        tracing::debug!(file = self.id.0, reset, "animation file torn down");
    }
}

impl Drop for AnimationFile {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/file/animation_file.rs"]
mod tests;
