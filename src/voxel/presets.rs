//! Procedural volume presets.
//!
//! Stands in for the texture provider feeding the extractor: builds CPU-side
//! RGBA8 volumes with their full mip chain precomputed, ready for upload.
//! Alpha is the occupancy signal; coarser levels are 2x2x2 box filters of
//! the level below, so occupied regions persist up the chain.

use crate::voxel::extraction::expected_mip_levels;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// The cyclable set of built-in volumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumePreset {
    /// Filled ball with position-derived coloring
    Sphere,
    /// Hollow shell, empty core
    Shell,
    /// Value-noise blob field
    Noise,
    /// Fully transparent volume, exercises the zero-instance path
    Empty,
}

impl VolumePreset {
    pub const ALL: [VolumePreset; 4] = [
        VolumePreset::Sphere,
        VolumePreset::Shell,
        VolumePreset::Noise,
        VolumePreset::Empty,
    ];

    pub fn name(self) -> &'static str {
        match self {
            VolumePreset::Sphere => "sphere",
            VolumePreset::Shell => "shell",
            VolumePreset::Noise => "noise",
            VolumePreset::Empty => "empty",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|&p| p == self).unwrap_or(0)
    }

    /// Following preset, wrapping at the end of the set.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Preceding preset, wrapping at the start of the set.
    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl Default for VolumePreset {
    fn default() -> Self {
        VolumePreset::Sphere
    }
}

/// CPU-side volume with every mip level populated.
///
/// `mips[i]` holds tightly packed RGBA8 texels of the `edge >> i` grid,
/// x fastest, then y, then z.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeData {
    pub edge_length: u32,
    pub mips: Vec<Vec<u8>>,
}

impl VolumeData {
    pub fn level_count(&self) -> u32 {
        self.mips.len() as u32
    }
}

/// Build a preset volume. Deterministic for a given (preset, edge) pair;
/// `edge_length` must be a positive power of two.
pub fn generate(preset: VolumePreset, edge_length: u32) -> VolumeData {
    let base = match preset {
        VolumePreset::Sphere => fill_base(edge_length, sphere_texel),
        VolumePreset::Shell => fill_base(edge_length, shell_texel),
        VolumePreset::Noise => fill_base(edge_length, noise_texel),
        VolumePreset::Empty => vec![0u8; (edge_length as usize).pow(3) * 4],
    };

    let mut mips = Vec::with_capacity(expected_mip_levels(edge_length) as usize);
    mips.push(base);
    let mut edge = edge_length;
    while edge > 1 {
        let coarser = downsample(mips.last().map_or(&[], |m| m.as_slice()), edge);
        mips.push(coarser);
        edge /= 2;
    }

    VolumeData { edge_length, mips }
}

/// Fill the finest level, calling `texel` with each cell center normalized
/// to [-1, 1] on every axis.
fn fill_base(edge_length: u32, texel: impl Fn(Vec3) -> [u8; 4]) -> Vec<u8> {
    let edge = edge_length as usize;
    let mut data = vec![0u8; edge * edge * edge * 4];

    for x in 0..edge {
        for y in 0..edge {
            for z in 0..edge {
                let index = (x + y * edge + z * edge * edge) * 4;
                let centered = Vec3::new(
                    (x as f32 + 0.5) / edge_length as f32 * 2.0 - 1.0,
                    (y as f32 + 0.5) / edge_length as f32 * 2.0 - 1.0,
                    (z as f32 + 0.5) / edge_length as f32 * 2.0 - 1.0,
                );
                data[index..index + 4].copy_from_slice(&texel(centered));
            }
        }
    }

    data
}

fn sphere_texel(p: Vec3) -> [u8; 4] {
    if p.length() > 0.9 {
        return [0, 0, 0, 0];
    }
    [
        channel((p.x + 1.0) * 0.5),
        channel((p.y + 1.0) * 0.5),
        channel((p.z + 1.0) * 0.5),
        255,
    ]
}

fn shell_texel(p: Vec3) -> [u8; 4] {
    let r = p.length();
    if !(0.7..=0.9).contains(&r) {
        return [0, 0, 0, 0];
    }
    let height = (p.y + 1.0) * 0.5;
    [channel(0.9), channel(0.3 + 0.4 * height), channel(0.1), 255]
}

fn noise_texel(p: Vec3) -> [u8; 4] {
    // Four noise cells across the volume keeps blobs a few voxels wide.
    let density = fbm(p * 4.0, 7);
    if density <= 0.5 {
        return [0, 0, 0, 0];
    }
    let t = ((density - 0.5) * 4.0).min(1.0);
    [
        channel(0.2 + 0.3 * t),
        channel(0.5 + 0.4 * t),
        channel(0.25),
        255,
    ]
}

fn channel(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0) as u8
}

/// Box-filter one level into the next coarser one: every destination texel
/// is the channel-wise rounded average of its eight children.
fn downsample(src: &[u8], src_edge: u32) -> Vec<u8> {
    let src_edge = src_edge as usize;
    let dst_edge = src_edge / 2;
    let mut dst = vec![0u8; dst_edge * dst_edge * dst_edge * 4];

    for x in 0..dst_edge {
        for y in 0..dst_edge {
            for z in 0..dst_edge {
                let mut sums = [0u32; 4];
                for dz in 0..2 {
                    for dy in 0..2 {
                        for dx in 0..2 {
                            let sx = x * 2 + dx;
                            let sy = y * 2 + dy;
                            let sz = z * 2 + dz;
                            let src_index =
                                (sx + sy * src_edge + sz * src_edge * src_edge) * 4;
                            for (c, sum) in sums.iter_mut().enumerate() {
                                *sum += src[src_index + c] as u32;
                            }
                        }
                    }
                }
                let dst_index = (x + y * dst_edge + z * dst_edge * dst_edge) * 4;
                for (c, sum) in sums.iter().enumerate() {
                    dst[dst_index + c] = ((sum + 4) / 8) as u8;
                }
            }
        }
    }

    dst
}

/// Hash function for a single random value at integer coordinates.
fn hash1(x: i32, y: i32, z: i32, seed: u32) -> f32 {
    let mut h = seed;
    h = h.wrapping_mul(374761393).wrapping_add(x as u32);
    h = h.wrapping_mul(668265263).wrapping_add(y as u32);
    h = h.wrapping_mul(1274126177).wrapping_add(z as u32);
    h ^= h >> 13;
    h = h.wrapping_mul(1274126177);
    h ^= h >> 16;

    h as f32 / u32::MAX as f32
}

fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// 3D value noise, trilinearly interpolating random lattice values.
fn value_noise_3d(pos: Vec3, seed: u32) -> f32 {
    let ix = pos.x.floor() as i32;
    let iy = pos.y.floor() as i32;
    let iz = pos.z.floor() as i32;

    let ux = smoothstep(pos.x - pos.x.floor());
    let uy = smoothstep(pos.y - pos.y.floor());
    let uz = smoothstep(pos.z - pos.z.floor());

    let c000 = hash1(ix, iy, iz, seed);
    let c100 = hash1(ix + 1, iy, iz, seed);
    let c010 = hash1(ix, iy + 1, iz, seed);
    let c110 = hash1(ix + 1, iy + 1, iz, seed);
    let c001 = hash1(ix, iy, iz + 1, seed);
    let c101 = hash1(ix + 1, iy, iz + 1, seed);
    let c011 = hash1(ix, iy + 1, iz + 1, seed);
    let c111 = hash1(ix + 1, iy + 1, iz + 1, seed);

    let mix = |a: f32, b: f32, t: f32| a + (b - a) * t;

    let x00 = mix(c000, c100, ux);
    let x10 = mix(c010, c110, ux);
    let x01 = mix(c001, c101, ux);
    let x11 = mix(c011, c111, ux);

    let y0 = mix(x00, x10, uy);
    let y1 = mix(x01, x11, uy);

    mix(y0, y1, uz)
}

/// Fractal Brownian Motion over four octaves of value noise.
fn fbm(pos: Vec3, seed: u32) -> f32 {
    let mut value = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for octave in 0..4u32 {
        let octave_seed = seed.wrapping_add(octave * 1337);
        value += amplitude * value_noise_3d(pos * frequency, octave_seed);
        max_value += amplitude;
        amplitude *= 0.5;
        frequency *= 2.0;
    }

    value / max_value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occupied_cells(level: &[u8]) -> usize {
        level.chunks_exact(4).filter(|texel| texel[3] != 0).count()
    }

    #[test]
    fn presets_cycle_through_the_whole_set_and_wrap() {
        let mut preset = VolumePreset::Sphere;
        let mut seen = Vec::new();
        for _ in 0..VolumePreset::ALL.len() {
            seen.push(preset);
            preset = preset.next();
        }
        assert_eq!(seen, VolumePreset::ALL);
        assert_eq!(preset, VolumePreset::Sphere);

        assert_eq!(VolumePreset::Sphere.previous(), VolumePreset::Empty);
        assert_eq!(VolumePreset::Empty.next(), VolumePreset::Sphere);
        for p in VolumePreset::ALL {
            assert_eq!(p.next().previous(), p);
        }
    }

    #[test]
    fn generated_volumes_carry_the_full_mip_chain() {
        let volume = generate(VolumePreset::Sphere, 32);
        assert_eq!(volume.level_count(), 6);
        for (level, mip) in volume.mips.iter().enumerate() {
            let edge = (32usize >> level).max(1);
            assert_eq!(mip.len(), edge * edge * edge * 4, "level {}", level);
        }
    }

    #[test]
    fn sphere_has_both_occupied_and_empty_cells() {
        let volume = generate(VolumePreset::Sphere, 32);
        let occupied = occupied_cells(&volume.mips[0]);
        assert!(occupied > 0, "sphere should have occupied voxels");
        assert!(occupied < 32 * 32 * 32, "sphere should have empty corners");
    }

    #[test]
    fn shell_core_is_empty() {
        let volume = generate(VolumePreset::Shell, 32);
        let edge = 32usize;
        // Center cell of the finest level sits inside the hollow core.
        let center = edge / 2;
        let index = (center + center * edge + center * edge * edge) * 4;
        assert_eq!(volume.mips[0][index + 3], 0);
        assert!(occupied_cells(&volume.mips[0]) > 0);
    }

    #[test]
    fn noise_is_deterministic_and_mixed() {
        let a = generate(VolumePreset::Noise, 32);
        let b = generate(VolumePreset::Noise, 32);
        assert_eq!(a, b);

        let occupied = occupied_cells(&a.mips[0]);
        assert!(occupied > 0, "noise should have occupied voxels");
        assert!(occupied < 32 * 32 * 32, "noise should have empty voxels");
    }

    #[test]
    fn empty_preset_is_fully_transparent_at_every_level() {
        let volume = generate(VolumePreset::Empty, 16);
        for mip in &volume.mips {
            assert_eq!(occupied_cells(mip), 0);
        }
    }

    #[test]
    fn downsampling_keeps_a_block_with_one_opaque_child_occupied() {
        let mut level = vec![0u8; 4 * 4 * 4 * 4];
        // One fully opaque white texel at (0, 0, 0).
        level[0..4].copy_from_slice(&[255, 255, 255, 255]);

        let coarser = downsample(&level, 4);
        assert_eq!(coarser.len(), 2 * 2 * 2 * 4);
        // Its parent block averages to a definite nonzero alpha.
        assert_eq!(coarser[3], 32);
        // The other seven parents stay empty.
        for texel in coarser.chunks_exact(4).skip(1) {
            assert_eq!(texel[3], 0);
        }
    }

    #[test]
    fn occupancy_survives_to_the_coarsest_level() {
        let volume = generate(VolumePreset::Sphere, 32);
        let coarsest = volume.mips.last().unwrap();
        assert_eq!(coarsest.len(), 4);
        assert!(coarsest[3] != 0, "sphere must stay visible at 1x1x1");
    }

    #[test]
    fn single_cell_volume_has_one_level() {
        let volume = generate(VolumePreset::Sphere, 1);
        assert_eq!(volume.level_count(), 1);
        assert_eq!(volume.mips[0].len(), 4);
    }
}
