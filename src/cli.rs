//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::controller::DEFAULT_DENOISE_INTERVAL;
use crate::render::preview::DEFAULT_TILES_PER_FRAME;

#[derive(Parser, Debug)]
#[command(name = "pathview", about = "Interactive progressive path tracer viewer")]
pub struct CliArgs {
    /// Scene file to load at startup; skips asset directory discovery.
    #[arg(short = 's', long = "scene")]
    pub scene: Option<PathBuf>,

    /// Directory scanned for `.scene` files.
    #[arg(long, default_value = "assets")]
    pub assets: PathBuf,

    /// Directory screenshots are written to.
    #[arg(long, default_value = ".")]
    pub screenshots: PathBuf,

    /// Samples between automatic denoise passes while the denoiser is enabled.
    #[arg(long, default_value_t = DEFAULT_DENOISE_INTERVAL)]
    pub denoise_interval: u32,

    /// Most tile bands the preview renderer traces per frame.
    #[arg(long, default_value_t = DEFAULT_TILES_PER_FRAME)]
    pub tiles_per_frame: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_flags() {
        let args = CliArgs::try_parse_from(["pathview"]).unwrap();
        assert!(args.scene.is_none());
        assert_eq!(args.assets, PathBuf::from("assets"));
        assert_eq!(args.screenshots, PathBuf::from("."));
        assert_eq!(args.denoise_interval, DEFAULT_DENOISE_INTERVAL);
        assert_eq!(args.tiles_per_frame, DEFAULT_TILES_PER_FRAME);
    }

    #[test]
    fn tiles_per_frame_flag() {
        let args = CliArgs::try_parse_from(["pathview", "--tiles-per-frame", "3"]).unwrap();
        assert_eq!(args.tiles_per_frame, 3);
    }

    #[test]
    fn short_and_long_scene_flags() {
        let short = CliArgs::try_parse_from(["pathview", "-s", "a.scene"]).unwrap();
        let long = CliArgs::try_parse_from(["pathview", "--scene", "b.scene"]).unwrap();
        assert_eq!(short.scene, Some(PathBuf::from("a.scene")));
        assert_eq!(long.scene, Some(PathBuf::from("b.scene")));
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let err = CliArgs::try_parse_from(["pathview", "--bogus"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
