//! CPU progressive renderer used as the default [`Renderer`].
//!
//! Mesh instances are drawn as proxy spheres (instance translation as center,
//! largest axis scale as radius) so the interactive loop has something to
//! accumulate without a GPU path tracer attached.
//!
//! The frame is split into bands of [`TILE_ROWS`] rows. Each `render()` call
//! traces at most a budget of bands (in parallel), so a full pass spans
//! several frames at large resolutions and the UI stays responsive. The
//! sample counter only advances when a pass completes.

use super::{FrameBuffer, RenderError, Renderer, RendererFactory};
use crate::scene::Scene;
use glam::{Mat4, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::ops::Range;

const RAY_EPSILON: f32 = 1e-3;

/// Rows per tile band.
pub const TILE_ROWS: usize = 16;
pub const DEFAULT_TILES_PER_FRAME: u32 = 8;
/// Frame time the tile budget is steered towards.
const TARGET_FRAME_SECONDS: f32 = 1.0 / 30.0;

#[derive(Debug, Clone, Copy)]
pub struct PreviewRendererFactory {
    seed: u64,
    tiles_per_frame: u32,
}

impl Default for PreviewRendererFactory {
    fn default() -> Self {
        Self {
            seed: 0,
            tiles_per_frame: DEFAULT_TILES_PER_FRAME,
        }
    }
}

impl PreviewRendererFactory {
    /// Upper bound on tile bands traced per `render()` call.
    pub fn with_tiles_per_frame(mut self, tiles: u32) -> Self {
        self.tiles_per_frame = tiles.max(1);
        self
    }
}

impl RendererFactory for PreviewRendererFactory {
    type Renderer = PreviewRenderer;

    fn create(&mut self, scene: &Scene) -> Result<PreviewRenderer, RenderError> {
        self.seed = self.seed.wrapping_add(1);
        PreviewRenderer::new(scene, self.seed, self.tiles_per_frame)
    }
}

/// Options baked in at construction; changing any of them needs a new handle.
#[derive(Debug, Clone, Copy)]
struct StructuralState {
    use_env_map: bool,
    enable_rr: bool,
    rr_depth: u32,
    use_constant_bg: bool,
}

#[derive(Debug, Clone, Copy)]
struct Sphere {
    center: Vec3,
    radius: f32,
    material: usize,
}

#[derive(Debug, Clone, Copy)]
struct Surface {
    albedo: Vec3,
    emission: Vec3,
    metallic: f32,
    roughness: f32,
}

#[derive(Debug, Clone, Copy)]
struct View {
    position: Vec3,
    inverse_view_projection: Mat4,
}

/// Per-sample data refreshed on every accumulation reset.
#[derive(Debug, Clone)]
struct TraceScene {
    view: View,
    spheres: Vec<Sphere>,
    surfaces: Vec<Surface>,
    max_depth: u32,
    hdr_multiplier: f32,
    background_color: Vec3,
}

impl TraceScene {
    fn from_scene(scene: &Scene) -> Self {
        let camera = scene.camera();
        let options = scene.render_options();
        let (view, projection) = camera.view_projection(options.aspect());
        let spheres = scene
            .mesh_instances()
            .iter()
            .map(|instance| {
                let m = instance.transform;
                let radius = m
                    .x_axis
                    .truncate()
                    .length()
                    .max(m.y_axis.truncate().length())
                    .max(m.z_axis.truncate().length());
                Sphere {
                    center: m.w_axis.truncate(),
                    radius,
                    material: instance.material_id(),
                }
            })
            .collect();
        let surfaces = scene
            .materials()
            .iter()
            .map(|material| Surface {
                albedo: Vec3::from(material.albedo),
                emission: Vec3::from(material.emission),
                metallic: material.metallic,
                roughness: material.roughness,
            })
            .collect();

        Self {
            view: View {
                position: camera.position(),
                inverse_view_projection: (projection * view).inverse(),
            },
            spheres,
            surfaces,
            max_depth: options.max_depth.max(1),
            hdr_multiplier: options.hdr_multiplier,
            background_color: Vec3::from(options.background_color),
        }
    }

    fn intersect(&self, origin: Vec3, dir: Vec3) -> Option<(f32, usize)> {
        let mut closest: Option<(f32, usize)> = None;
        for (index, sphere) in self.spheres.iter().enumerate() {
            let oc = origin - sphere.center;
            let b = oc.dot(dir);
            let c = oc.length_squared() - sphere.radius * sphere.radius;
            let disc = b * b - c;
            if disc < 0.0 {
                continue;
            }
            let sqrt_disc = disc.sqrt();
            let mut t = -b - sqrt_disc;
            if t < RAY_EPSILON {
                t = -b + sqrt_disc;
            }
            if t < RAY_EPSILON {
                continue;
            }
            if closest.map_or(true, |(best, _)| t < best) {
                closest = Some((t, index));
            }
        }
        closest
    }

    fn background(&self, structural: &StructuralState, dir: Vec3) -> Vec3 {
        if structural.use_constant_bg {
            self.background_color
        } else if structural.use_env_map {
            let t = 0.5 * (dir.y + 1.0);
            Vec3::ONE.lerp(Vec3::new(0.5, 0.7, 1.0), t) * self.hdr_multiplier
        } else {
            Vec3::ZERO
        }
    }

    fn trace(&self, structural: &StructuralState, mut origin: Vec3, mut dir: Vec3, rng: &mut StdRng) -> Vec3 {
        let mut radiance = Vec3::ZERO;
        let mut throughput = Vec3::ONE;

        for depth in 0..self.max_depth {
            let Some((t, index)) = self.intersect(origin, dir) else {
                radiance += throughput * self.background(structural, dir);
                break;
            };
            let sphere = self.spheres[index];
            let surface = self.surfaces[sphere.material];
            let point = origin + dir * t;
            let mut normal = (point - sphere.center) / sphere.radius;
            if normal.dot(dir) > 0.0 {
                normal = -normal;
            }

            radiance += throughput * surface.emission;

            dir = if rng.gen::<f32>() < surface.metallic {
                let reflected = dir - 2.0 * dir.dot(normal) * normal;
                (reflected + random_unit_vector(rng) * surface.roughness).normalize_or(normal)
            } else {
                (normal + random_unit_vector(rng)).normalize_or(normal)
            };
            origin = point + normal * RAY_EPSILON;
            throughput *= surface.albedo;

            if structural.enable_rr && depth >= structural.rr_depth {
                let survive = throughput.max_element().clamp(0.05, 0.95);
                if rng.gen::<f32>() > survive {
                    break;
                }
                throughput /= survive;
            }
        }
        radiance
    }
}

fn random_unit_vector(rng: &mut StdRng) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let len2 = v.length_squared();
        if len2 > 1e-6 && len2 <= 1.0 {
            return v / len2.sqrt();
        }
    }
}

pub struct PreviewRenderer {
    width: u32,
    height: u32,
    structural: StructuralState,
    trace_scene: TraceScene,
    accumulation: Vec<Vec3>,
    /// Completed full passes since the last reset.
    samples: u32,
    next_tile: usize,
    tiles_per_frame: u32,
    max_tiles_per_frame: u32,
    display: FrameBuffer,
    seed: u64,
    batch: u64,
}

impl PreviewRenderer {
    pub fn new(scene: &Scene, seed: u64, tiles_per_frame: u32) -> Result<Self, RenderError> {
        let options = scene.render_options();
        let [width, height] = options.resolution;
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidResolution(width, height));
        }
        let tiles_per_frame = tiles_per_frame.max(1);
        log::info!(
            "Preview renderer created at {}x{} ({} tiles per frame)",
            width,
            height,
            tiles_per_frame
        );

        Ok(Self {
            width,
            height,
            structural: StructuralState {
                use_env_map: options.use_env_map,
                enable_rr: options.enable_rr,
                rr_depth: options.rr_depth,
                use_constant_bg: options.use_constant_bg,
            },
            trace_scene: TraceScene::from_scene(scene),
            accumulation: vec![Vec3::ZERO; width as usize * height as usize],
            samples: 0,
            next_tile: 0,
            tiles_per_frame,
            max_tiles_per_frame: tiles_per_frame,
            display: FrameBuffer::new(width, height),
            seed,
            batch: 0,
        })
    }

    fn tile_count(&self) -> usize {
        (self.height as usize).div_ceil(TILE_ROWS)
    }

    fn tile_seed(&self, tile: usize) -> u64 {
        self.seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ (self.batch << 20) ^ tile as u64
    }

    /// Re-maps `rows` of the accumulation into the display image; those rows
    /// hold `samples` contributions each.
    fn resolve_rows(&mut self, rows: Range<usize>, samples: u32) {
        let width = self.width as usize;
        let inv = 1.0 / samples.max(1) as f32;
        let pixels = &mut self.display.pixels[rows.start * width * 3..rows.end * width * 3];
        let sums = &self.accumulation[rows.start * width..rows.end * width];
        for (pixel, sum) in pixels.chunks_exact_mut(3).zip(sums) {
            let color = *sum * inv;
            pixel[0] = to_srgb8(color.x);
            pixel[1] = to_srgb8(color.y);
            pixel[2] = to_srgb8(color.z);
        }
    }
}

impl Renderer for PreviewRenderer {
    fn resolution(&self) -> [u32; 2] {
        [self.width, self.height]
    }

    fn reset_accumulation(&mut self, scene: &Scene) {
        self.trace_scene = TraceScene::from_scene(scene);
        self.accumulation.fill(Vec3::ZERO);
        self.samples = 0;
        self.next_tile = 0;
    }

    /// Steers the tile budget towards [`TARGET_FRAME_SECONDS`]: slow frames
    /// halve it, fast ones grow it back up to the configured maximum.
    fn update(&mut self, seconds_elapsed: f32) {
        if seconds_elapsed > TARGET_FRAME_SECONDS {
            self.tiles_per_frame = (self.tiles_per_frame / 2).max(1);
        } else if seconds_elapsed > 0.0 && seconds_elapsed < TARGET_FRAME_SECONDS * 0.5 {
            self.tiles_per_frame = (self.tiles_per_frame + 1).min(self.max_tiles_per_frame);
        }
    }

    fn render(&mut self) {
        let (width, height) = (self.width as usize, self.height as usize);
        let tile_count = self.tile_count();
        let first = self.next_tile;
        let end = (first + self.tiles_per_frame as usize).min(tile_count);
        let rows = first * TILE_ROWS..(end * TILE_ROWS).min(height);
        let seeds: Vec<u64> = (first..end).map(|tile| self.tile_seed(tile)).collect();
        self.batch = self.batch.wrapping_add(1);

        let view = self.trace_scene.view;
        let trace_scene = &self.trace_scene;
        let structural = &self.structural;
        self.accumulation[rows.start * width..rows.end * width]
            .par_chunks_mut(TILE_ROWS * width)
            .zip(seeds)
            .enumerate()
            .for_each(|(offset, (band, seed))| {
                let mut rng = StdRng::seed_from_u64(seed);
                let first_row = (first + offset) * TILE_ROWS;
                for (index, sum) in band.iter_mut().enumerate() {
                    let (x, y) = (index % width, first_row + index / width);
                    let u = ((x as f32 + rng.gen::<f32>()) / width as f32) * 2.0 - 1.0;
                    let v = 1.0 - ((y as f32 + rng.gen::<f32>()) / height as f32) * 2.0;
                    let far = view
                        .inverse_view_projection
                        .project_point3(Vec3::new(u, v, 1.0));
                    let dir = (far - view.position).normalize();
                    let sample = trace_scene.trace(structural, view.position, dir, &mut rng);
                    if sample.is_finite() {
                        *sum += sample;
                    }
                }
            });

        self.resolve_rows(rows, self.samples + 1);
        if end == tile_count {
            self.samples += 1;
            self.next_tile = 0;
        } else {
            self.next_tile = end;
        }
    }

    fn sample_count(&self) -> u32 {
        self.samples
    }

    fn output_buffer(&self) -> FrameBuffer {
        let row = self.width as usize * 3;
        let mut flipped = FrameBuffer::new(self.width, self.height);
        for (dst, src) in flipped
            .pixels
            .chunks_exact_mut(row)
            .zip(self.display.pixels.chunks_exact(row).rev())
        {
            dst.copy_from_slice(src);
        }
        flipped
    }

    fn presentable_image(&self) -> &FrameBuffer {
        &self.display
    }

    fn denoise(&mut self) -> FrameBuffer {
        log::info!("Denoising preview output at {} samples", self.samples);
        box_filter(&self.display)
    }
}

fn to_srgb8(linear: f32) -> u8 {
    let mapped = linear.max(0.0) / (1.0 + linear.max(0.0));
    (mapped.powf(1.0 / 2.2) * 255.0 + 0.5).clamp(0.0, 255.0) as u8
}

fn box_filter(source: &FrameBuffer) -> FrameBuffer {
    let (w, h) = (source.width as i64, source.height as i64);
    let mut out = FrameBuffer::new(source.width, source.height);
    for y in 0..h {
        for x in 0..w {
            let mut sum = [0u32; 3];
            let mut count = 0u32;
            for ny in (y - 1).max(0)..=(y + 1).min(h - 1) {
                for nx in (x - 1).max(0)..=(x + 1).min(w - 1) {
                    let offset = ((ny * w + nx) * 3) as usize;
                    for (channel, total) in sum.iter_mut().enumerate() {
                        *total += source.pixels[offset + channel] as u32;
                    }
                    count += 1;
                }
            }
            let offset = ((y * w + x) * 3) as usize;
            for (channel, total) in sum.iter().enumerate() {
                out.pixels[offset + channel] = (total / count) as u8;
            }
        }
    }
    out
}
