//! Replay player: re-issues captured commands against a backend.

use std::collections::HashMap;
use std::sync::Arc;

use crate::backend::TextureBackend;
use crate::fill::TexelFiller;
use crate::rng::RandomSource;
use crate::texture::FakeTexture;

use super::ReplayCommand;

/// Drives textures keyed by externally supplied ids.
///
/// Individual command failures are logged and skipped, never fatal: a
/// truncated or slightly damaged capture should still replay as far as it
/// can. All replay state lives here; there are no globals.
pub struct Playback {
    backend: Arc<dyn TextureBackend>,
    filler: TexelFiller,
    rng: RandomSource,
    textures: HashMap<u64, FakeTexture>,
}

impl Playback {
    /// Create an empty player.
    pub fn new(backend: Arc<dyn TextureBackend>, filler: TexelFiller, rng: RandomSource) -> Self {
        Self {
            backend,
            filler,
            rng,
            textures: HashMap::new(),
        }
    }

    /// Apply one command.
    pub fn apply(&mut self, command: ReplayCommand) {
        match command {
            ReplayCommand::CreateTexture { id } => {
                match FakeTexture::acquire(self.backend.clone()) {
                    Ok(texture) => {
                        // A duplicate id means the capture restarted; the
                        // replaced texture releases its handle on drop.
                        if self.textures.insert(id, texture).is_some() {
                            log::warn!("texture {id} created twice, replacing");
                        }
                    }
                    Err(err) => log::warn!("create_texture({id}) failed: {err}"),
                }
            }
            ReplayCommand::MipUpload {
                id,
                level,
                width,
                height,
            } => match self.textures.get_mut(&id) {
                Some(texture) => {
                    if let Err(err) =
                        texture.upload_mip(level, width, height, &mut self.filler, &mut self.rng)
                    {
                        log::warn!("mip_upload({id}, {level}) failed: {err}");
                    }
                }
                None => log::warn!("mip_upload for unknown texture {id}, skipping"),
            },
            ReplayCommand::UpdateMip {
                id,
                level,
                x,
                y,
                width,
                height,
            } => match self.textures.get_mut(&id) {
                Some(texture) => {
                    if let Err(err) = texture.update_region(
                        level,
                        x,
                        y,
                        width,
                        height,
                        &mut self.filler,
                        &mut self.rng,
                    ) {
                        log::warn!("update_mip({id}, {level}) failed: {err}");
                    }
                }
                None => log::warn!("update_mip for unknown texture {id}, skipping"),
            },
            ReplayCommand::DeleteTexture { id } => {
                if self.textures.remove(&id).is_none() {
                    log::warn!("delete_texture for unknown texture {id}, skipping");
                }
            }
            ReplayCommand::Draw => {
                for texture in self.textures.values() {
                    texture.draw(&mut self.rng);
                }
                if let Err(err) = self.backend.query_error() {
                    log::error!("backend error during draw: {err}");
                }
            }
            ReplayCommand::Swap => self.backend.finish_frame(),
        }
    }

    /// Apply a whole script in order.
    pub fn run_script(&mut self, script: &[ReplayCommand]) {
        for &command in script {
            self.apply(command);
        }
    }

    /// Number of currently live replayed textures.
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Total bytes accumulated by mip uploads across live textures.
    pub fn bytes_used(&self) -> usize {
        self.textures.values().map(FakeTexture::size_bytes).sum()
    }
}

impl std::fmt::Debug for Playback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Playback")
            .field("live_textures", &self.textures.len())
            .field("bytes_used", &self.bytes_used())
            .finish()
    }
}
