//! Mip-level voxel extraction.
//!
//! Walks every mip level of an RGBA8 volume snapshot, discards cells whose
//! alpha byte is zero, and packs the survivors into one flat instance
//! sequence plus a per-level `{offset, count}` index. Extraction is pure
//! CPU work over already-read-back texel data, so it runs the same with or
//! without a GPU attached.

use crate::rendering::voxel_renderer::VoxelInstance;
use crate::voxel::VoxelError;

/// Contiguous slice of the flat record sequence holding one mip level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelRange {
    /// Flat sequence length before this level begins
    pub offset: u32,
    /// Records appended during this level
    pub count: u32,
}

impl LevelRange {
    /// Instance range for an instanced draw of this level.
    pub fn instances(&self) -> std::ops::Range<u32> {
        self.offset..self.offset + self.count
    }
}

/// Per-level index over the flat record sequence, finest level first.
///
/// Ranges tile the sequence exactly: `offset[0] == 0`,
/// `offset[i + 1] == offset[i] + count[i]`, and the last range ends at the
/// sequence length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelIndex {
    ranges: Vec<LevelRange>,
}

impl LevelIndex {
    pub fn level_count(&self) -> u32 {
        self.ranges.len() as u32
    }

    pub fn range(&self, level: u32) -> Option<LevelRange> {
        self.ranges.get(level as usize).copied()
    }

    pub fn ranges(&self) -> &[LevelRange] {
        &self.ranges
    }

    /// Total records across all levels.
    pub fn total_count(&self) -> u32 {
        self.ranges.last().map_or(0, |r| r.offset + r.count)
    }
}

/// Output of one extraction run: the flat record sequence and its index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedLevels {
    pub records: Vec<VoxelInstance>,
    pub index: LevelIndex,
}

/// Mip levels a volume with the given edge length carries, counting down
/// to the 1x1x1 level. The edge must be a positive power of two.
pub fn expected_mip_levels(edge_length: u32) -> u32 {
    edge_length.ilog2() + 1
}

/// Extract occupied voxels from every mip level of a volume.
///
/// `levels[i]` holds the tightly packed RGBA8 texels of mip level `i`,
/// with x varying fastest, then y, then z. The slice must cover the full
/// chain from `edge_length` down to a single cell; anything else is a
/// caller contract violation and fails with an explicit error instead of
/// producing a truncated index.
///
/// A cell survives iff its alpha byte is nonzero; the byte is compared
/// before any float conversion, so quantization never blurs the test.
/// Survivors are appended with x as the outer axis, then y, then z.
pub fn extract_levels(
    edge_length: u32,
    levels: &[Vec<u8>],
) -> Result<ExtractedLevels, VoxelError> {
    if !edge_length.is_power_of_two() {
        return Err(VoxelError::EdgeNotPowerOfTwo(edge_length));
    }

    let expected = expected_mip_levels(edge_length);
    if levels.len() as u32 != expected {
        return Err(VoxelError::MipCountMismatch {
            edge_length,
            expected,
            actual: levels.len() as u32,
        });
    }

    let mut records = Vec::new();
    let mut ranges = Vec::with_capacity(levels.len());

    // The cell scale starts at one texel of the finest level and doubles
    // per coarser level while the grid edge halves.
    let mut edge = edge_length;
    let mut scale = 1.0 / edge_length as f32;

    for (level, texels) in levels.iter().enumerate() {
        let cell_count = (edge as usize).pow(3);
        if texels.len() != cell_count * 4 {
            return Err(VoxelError::LevelSizeMismatch {
                level: level as u32,
                expected: cell_count * 4,
                actual: texels.len(),
            });
        }

        let offset = records.len() as u32;

        // Shift the lattice so the volume is centered at the origin and
        // positions land on cell centers rather than corners.
        let centering = -(edge as f32) * scale / 2.0 + scale / 2.0;

        for x in 0..edge {
            for y in 0..edge {
                for z in 0..edge {
                    let texel = ((x + y * edge + z * edge * edge) * 4) as usize;
                    let alpha = texels[texel + 3];
                    if alpha == 0 {
                        continue;
                    }
                    records.push(VoxelInstance {
                        position: [
                            x as f32 * scale + centering,
                            y as f32 * scale + centering,
                            z as f32 * scale + centering,
                        ],
                        scale,
                        color: [
                            texels[texel] as f32 / 255.0,
                            texels[texel + 1] as f32 / 255.0,
                            texels[texel + 2] as f32 / 255.0,
                            alpha as f32 / 255.0,
                        ],
                    });
                }
            }
        }

        ranges.push(LevelRange {
            offset,
            count: records.len() as u32 - offset,
        });
        scale *= 2.0;
        edge /= 2;
    }

    Ok(ExtractedLevels {
        records,
        index: LevelIndex { ranges },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Full mip chain where every level is filled with one RGBA value.
    fn solid_levels(edge_length: u32, rgba: [u8; 4]) -> Vec<Vec<u8>> {
        (0..expected_mip_levels(edge_length))
            .map(|level| {
                let edge = (edge_length >> level) as usize;
                rgba.repeat(edge * edge * edge)
            })
            .collect()
    }

    /// Full mip chain of completely transparent texels.
    fn empty_levels(edge_length: u32) -> Vec<Vec<u8>> {
        solid_levels(edge_length, [0, 0, 0, 0])
    }

    #[test]
    fn mip_level_counts() {
        assert_eq!(expected_mip_levels(1), 1);
        assert_eq!(expected_mip_levels(2), 2);
        assert_eq!(expected_mip_levels(4), 3);
        assert_eq!(expected_mip_levels(32), 6);
        assert_eq!(expected_mip_levels(128), 8);
    }

    #[test]
    fn ranges_tile_the_flat_sequence() {
        // Sprinkle a deterministic pattern so levels have uneven counts.
        let edge_length = 8u32;
        let levels: Vec<Vec<u8>> = (0..expected_mip_levels(edge_length))
            .map(|level| {
                let edge = edge_length >> level;
                let mut data = vec![0u8; (edge as usize).pow(3) * 4];
                for cell in 0..(edge as usize).pow(3) {
                    if cell % 3 == 0 {
                        data[cell * 4 + 3] = 255;
                    }
                }
                data
            })
            .collect();

        let extracted = extract_levels(edge_length, &levels).unwrap();
        let ranges = extracted.index.ranges();

        assert_eq!(ranges.len(), 4);
        assert_eq!(ranges[0].offset, 0);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].offset + pair[0].count, pair[1].offset);
        }
        assert_eq!(
            extracted.index.total_count() as usize,
            extracted.records.len()
        );
    }

    #[test]
    fn full_volume_reaches_per_level_capacity() {
        let edge_length = 8u32;
        let levels = solid_levels(edge_length, [10, 20, 30, 255]);
        let extracted = extract_levels(edge_length, &levels).unwrap();

        for (level, range) in extracted.index.ranges().iter().enumerate() {
            let edge = edge_length >> level;
            assert_eq!(range.count, edge * edge * edge);
        }
        assert_eq!(extracted.records.len(), 512 + 64 + 8 + 1);
    }

    #[test]
    fn empty_volume_yields_zero_counts_everywhere() {
        let edge_length = 16u32;
        let extracted = extract_levels(edge_length, &empty_levels(edge_length)).unwrap();

        assert!(extracted.records.is_empty());
        assert_eq!(extracted.index.level_count(), 5);
        for range in extracted.index.ranges() {
            assert_eq!(range.count, 0);
        }
        // Offsets stay valid without advancing.
        for range in extracted.index.ranges() {
            assert_eq!(range.offset, 0);
            assert!(range.instances().is_empty());
        }
    }

    #[test]
    fn extraction_is_idempotent() {
        let edge_length = 8u32;
        let levels: Vec<Vec<u8>> = (0..expected_mip_levels(edge_length))
            .map(|level| {
                let edge = edge_length >> level;
                let mut data = vec![0u8; (edge as usize).pow(3) * 4];
                for (cell, chunk) in data.chunks_exact_mut(4).enumerate() {
                    chunk[0] = (cell % 251) as u8;
                    chunk[3] = (cell % 7) as u8;
                }
                data
            })
            .collect();

        let first = extract_levels(edge_length, &levels).unwrap();
        let second = extract_levels(edge_length, &levels).unwrap();

        assert_eq!(first.index, second.index);
        assert_eq!(
            bytemuck::cast_slice::<_, u8>(&first.records),
            bytemuck::cast_slice::<_, u8>(&second.records)
        );
    }

    #[test]
    fn single_voxel_lands_at_the_centered_cell_position() {
        let edge_length = 4u32;
        let mut levels = empty_levels(edge_length);
        // Occupy only texel (0, 0, 0) of the finest level.
        levels[0][3] = 255;

        let extracted = extract_levels(edge_length, &levels).unwrap();

        assert_eq!(extracted.records.len(), 1);
        let record = extracted.records[0];
        assert_eq!(record.position, [-0.375, -0.375, -0.375]);
        assert_eq!(record.scale, 0.25);
        assert_eq!(extracted.index.range(0).unwrap().count, 1);
        assert_eq!(extracted.index.range(1).unwrap().count, 0);
    }

    #[test]
    fn colors_normalize_by_255() {
        let edge_length = 2u32;
        let mut levels = empty_levels(edge_length);
        levels[0][0..4].copy_from_slice(&[255, 128, 0, 255]);

        let extracted = extract_levels(edge_length, &levels).unwrap();
        let color = extracted.records[0].color;

        assert!((color[0] - 1.0).abs() < 1e-6);
        assert!((color[1] - 0.502).abs() < 1e-3);
        assert!((color[2] - 0.0).abs() < 1e-6);
        assert!((color[3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cells_append_with_x_outer_then_y_then_z() {
        let edge_length = 2u32;
        let mut levels = empty_levels(edge_length);
        let occupy = |data: &mut Vec<u8>, x: u32, y: u32, z: u32| {
            data[((x + y * 2 + z * 4) * 4 + 3) as usize] = 255;
        };
        occupy(&mut levels[0], 1, 0, 0);
        occupy(&mut levels[0], 0, 1, 0);
        occupy(&mut levels[0], 0, 0, 1);

        let extracted = extract_levels(edge_length, &levels).unwrap();

        // Iteration (x, y, z) visits (0,0,1) before (0,1,0) before (1,0,0).
        let positions: Vec<[f32; 3]> =
            extracted.records.iter().map(|r| r.position).collect();
        assert_eq!(
            positions,
            vec![
                [-0.25, -0.25, 0.25],
                [-0.25, 0.25, -0.25],
                [0.25, -0.25, -0.25],
            ]
        );
    }

    #[test]
    fn coarsest_level_is_a_single_origin_cell() {
        let edge_length = 4u32;
        let levels = solid_levels(edge_length, [200, 200, 200, 255]);
        let extracted = extract_levels(edge_length, &levels).unwrap();

        let coarsest = extracted.index.range(2).unwrap();
        assert_eq!(coarsest.count, 1);
        let record = extracted.records[coarsest.offset as usize];
        assert_eq!(record.position, [0.0, 0.0, 0.0]);
        assert_eq!(record.scale, 1.0);

        // Scale doubles per level, starting at one finest-level texel.
        assert_eq!(extracted.records[0].scale, 0.25);
        let mid = extracted.index.range(1).unwrap();
        assert_eq!(extracted.records[mid.offset as usize].scale, 0.5);
    }

    #[test]
    fn alpha_one_is_occupied() {
        // The occupancy test is alpha != 0 on the raw byte, no epsilon.
        let edge_length = 2u32;
        let mut levels = empty_levels(edge_length);
        levels[0][3] = 1;

        let extracted = extract_levels(edge_length, &levels).unwrap();
        assert_eq!(extracted.records.len(), 1);
        assert!((extracted.records[0].color[3] - 1.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn mip_count_mismatch_is_rejected() {
        let edge_length = 8u32;
        let mut levels = solid_levels(edge_length, [0, 0, 0, 255]);
        levels.pop();

        let err = extract_levels(edge_length, &levels).unwrap_err();
        match err {
            VoxelError::MipCountMismatch {
                edge_length: 8,
                expected: 4,
                actual: 3,
            } => {}
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn wrong_level_payload_size_is_rejected() {
        let edge_length = 4u32;
        let mut levels = solid_levels(edge_length, [0, 0, 0, 255]);
        levels[1].truncate(7);

        let err = extract_levels(edge_length, &levels).unwrap_err();
        match err {
            VoxelError::LevelSizeMismatch {
                level: 1,
                expected: 32,
                actual: 7,
            } => {}
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_power_of_two_edge_is_rejected() {
        let err = extract_levels(12, &[]).unwrap_err();
        assert!(matches!(err, VoxelError::EdgeNotPowerOfTwo(12)));

        let err = extract_levels(0, &[]).unwrap_err();
        assert!(matches!(err, VoxelError::EdgeNotPowerOfTwo(0)));
    }
}
