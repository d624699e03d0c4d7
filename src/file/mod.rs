pub mod animation_file;

pub use animation_file::{
    AnimationFile, ArtboardHandle, ArtboardSelector, EmbeddedAsset, FileStats,
    RegistryAssetLoader,
};
