//! Track section decoding.
//!
//! Sections are the track's navigation graph: each one has a position, links
//! to the next and previous sections (plus an optional junction branch) and
//! the run of track faces it covers.

use std::ops::Range;

use bitflags::bitflags;
use glam::Vec3;

use crate::cursor::Cursor;
use crate::error::DecodeResult;

/// Size of one section record.
pub const TRACK_SECTION_LEN: usize = 152;

/// Converts stored section positions to world units.
pub const SECTION_POSITION_SCALE: f32 = 1.0 / 1000.0;

/// Bytes between the position and the face range that carry nothing we use.
const SECTION_PADDING_LEN: usize = 116;

bitflags! {
    /// Per-section flags.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct SectionFlags: u16 {
        const JUMP = 1;
        const JUNCTION_END = 1 << 3;
        const JUNCTION_START = 1 << 4;
        const JUNCTION = 1 << 5;
    }
}

/// One section of the track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSection {
    pub index: usize,
    /// Position in world units.
    pub position: Vec3,
    /// Resolved link to the following section.
    pub next: Option<usize>,
    /// Resolved link to the preceding section.
    pub previous: Option<usize>,
    /// Resolved link to a branching section.
    pub junction: Option<usize>,
    pub raw_next: i32,
    pub raw_previous: i32,
    pub raw_junction: i32,
    /// First face of this section. Negative stored values become 0.
    pub face_start: usize,
    /// Faces covered. Negative stored values become 0.
    pub face_count: usize,
    pub flags: SectionFlags,
}

impl TrackSection {
    #[allow(clippy::cast_precision_loss)]
    fn read(cursor: &mut Cursor<'_>, index: usize) -> DecodeResult<Self> {
        let raw_junction = cursor.read_i32()?;
        let raw_previous = cursor.read_i32()?;
        let raw_next = cursor.read_i32()?;
        let x = cursor.read_i32()?;
        let y = cursor.read_i32()?;
        let z = cursor.read_i32()?;
        cursor.skip(SECTION_PADDING_LEN)?;
        let face_start = cursor.read_i32()?;
        let face_count = cursor.read_i16()?;
        cursor.skip(4)?;
        let flags = SectionFlags::from_bits_retain(cursor.read_u16()?);

        Ok(Self {
            index,
            position: Vec3::new(x as f32, y as f32, z as f32) * SECTION_POSITION_SCALE,
            next: None,
            previous: None,
            junction: None,
            raw_next,
            raw_previous,
            raw_junction,
            face_start: usize::try_from(face_start).unwrap_or(0),
            face_count: usize::try_from(face_count).unwrap_or(0),
            flags,
        })
    }

    /// Indices into the track's face list covered by this section.
    #[must_use]
    pub fn faces(&self) -> Range<usize> {
        self.face_start..self.face_start + self.face_count
    }
}

/// Resolve a stored link: anything outside `[0, count)` is no link at all.
fn resolve(raw: i32, count: usize) -> Option<usize> {
    usize::try_from(raw).ok().filter(|&index| index < count)
}

/// Sections with their links resolved to indices.
#[derive(Debug, Clone, Default)]
pub struct SectionGraph {
    sections: Vec<TrackSection>,
}

impl SectionGraph {
    /// Build a graph, resolving every section's links by index.
    #[must_use]
    pub fn new(mut sections: Vec<TrackSection>) -> Self {
        let count = sections.len();
        for section in &mut sections {
            section.next = resolve(section.raw_next, count);
            section.previous = resolve(section.raw_previous, count);
            section.junction = resolve(section.raw_junction, count);
        }
        Self { sections }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TrackSection> {
        self.sections.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrackSection> {
        self.sections.iter()
    }

    #[must_use]
    pub fn next(&self, index: usize) -> Option<&TrackSection> {
        self.get(index)?.next.and_then(|i| self.get(i))
    }

    #[must_use]
    pub fn previous(&self, index: usize) -> Option<&TrackSection> {
        self.get(index)?.previous.and_then(|i| self.get(i))
    }

    #[must_use]
    pub fn junction(&self, index: usize) -> Option<&TrackSection> {
        self.get(index)?.junction.and_then(|i| self.get(i))
    }

    /// Follow `next` links from `start`.
    ///
    /// Stops at a missing link or when a section would be visited twice, so
    /// a closed circuit yields each of its sections once.
    #[must_use]
    pub fn walk_forward(&self, start: usize) -> WalkForward<'_> {
        WalkForward {
            graph: self,
            current: self.get(start).map(|s| s.index),
            visited: vec![false; self.len()],
        }
    }
}

impl<'a> IntoIterator for &'a SectionGraph {
    type Item = &'a TrackSection;
    type IntoIter = std::slice::Iter<'a, TrackSection>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`SectionGraph::walk_forward`].
#[derive(Debug)]
pub struct WalkForward<'a> {
    graph: &'a SectionGraph,
    current: Option<usize>,
    visited: Vec<bool>,
}

impl<'a> Iterator for WalkForward<'a> {
    type Item = &'a TrackSection;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.current?;
        if std::mem::replace(&mut self.visited[index], true) {
            self.current = None;
            return None;
        }
        let section = self.graph.get(index)?;
        self.current = section.next;
        Some(section)
    }
}

/// Decode a section file and link its records.
pub fn decode_track_sections(data: &[u8]) -> DecodeResult<SectionGraph> {
    let mut cursor = Cursor::new(data);
    let sections = (0..data.len() / TRACK_SECTION_LEN)
        .map(|index| TrackSection::read(&mut cursor, index))
        .collect::<DecodeResult<Vec<_>>>()?;

    let graph = SectionGraph::new(sections);
    tracing::debug!(sections = graph.len(), "decoded track sections");
    Ok(graph)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) struct RawSection {
        pub(crate) junction: i32,
        pub(crate) previous: i32,
        pub(crate) next: i32,
        pub(crate) position: [i32; 3],
        pub(crate) face_start: i32,
        pub(crate) face_count: i16,
        pub(crate) flags: u16,
    }

    impl RawSection {
        pub(crate) fn linked(previous: i32, next: i32) -> Self {
            Self {
                junction: -1,
                previous,
                next,
                position: [0; 3],
                face_start: 0,
                face_count: 0,
                flags: 0,
            }
        }

        pub(crate) fn bytes(&self) -> Vec<u8> {
            let mut out = Vec::with_capacity(TRACK_SECTION_LEN);
            for v in [self.junction, self.previous, self.next] {
                out.extend_from_slice(&v.to_be_bytes());
            }
            for v in self.position {
                out.extend_from_slice(&v.to_be_bytes());
            }
            out.extend_from_slice(&[0xCD; SECTION_PADDING_LEN]);
            out.extend_from_slice(&self.face_start.to_be_bytes());
            out.extend_from_slice(&self.face_count.to_be_bytes());
            out.extend_from_slice(&[0; 4]);
            out.extend_from_slice(&self.flags.to_be_bytes());
            assert_eq!(out.len(), TRACK_SECTION_LEN);
            out
        }
    }

    pub(crate) fn section_bytes(sections: &[RawSection]) -> Vec<u8> {
        sections.iter().flat_map(RawSection::bytes).collect()
    }

    #[test]
    fn test_decode_section_fields() {
        let data = section_bytes(&[RawSection {
            junction: -1,
            previous: -1,
            next: -1,
            position: [1500, -2000, 250_000],
            face_start: 40,
            face_count: 6,
            flags: SectionFlags::JUMP.bits() | SectionFlags::JUNCTION.bits(),
        }]);

        let graph = decode_track_sections(&data).unwrap();
        let section = graph.get(0).unwrap();
        assert!((section.position - Vec3::new(1.5, -2.0, 250.0)).length() < 1e-4);
        assert_eq!(section.faces(), 40..46);
        assert!(section.flags.contains(SectionFlags::JUMP | SectionFlags::JUNCTION));
    }

    #[test]
    fn test_links_resolve_by_index() {
        let data = section_bytes(&[
            RawSection::linked(2, 1),
            RawSection::linked(0, 2),
            RawSection::linked(1, 0),
        ]);
        let graph = decode_track_sections(&data).unwrap();

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.next(0).map(|s| s.index), Some(1));
        assert_eq!(graph.previous(0).map(|s| s.index), Some(2));
        assert_eq!(graph.next(2).map(|s| s.index), Some(0));
    }

    #[test]
    fn test_out_of_range_links_are_absent() {
        let mut branch = RawSection::linked(-1, 7);
        branch.junction = 1;
        let data = section_bytes(&[branch, RawSection::linked(0, -1)]);
        let graph = decode_track_sections(&data).unwrap();

        let first = graph.get(0).unwrap();
        assert_eq!(first.next, None);
        assert_eq!(first.raw_next, 7);
        assert_eq!(first.previous, None);
        assert_eq!(first.junction, Some(1));
        assert_eq!(graph.junction(0).map(|s| s.index), Some(1));
        assert!(graph.next(1).is_none());
    }

    #[test]
    fn test_walk_forward_stops_on_cycle() {
        let data = section_bytes(&[
            RawSection::linked(2, 1),
            RawSection::linked(0, 2),
            RawSection::linked(1, 0),
        ]);
        let graph = decode_track_sections(&data).unwrap();

        let order: Vec<_> = graph.walk_forward(1).map(|s| s.index).collect();
        assert_eq!(order, [1, 2, 0]);
    }

    #[test]
    fn test_walk_forward_stops_at_missing_link() {
        let data = section_bytes(&[RawSection::linked(-1, 1), RawSection::linked(0, 99)]);
        let graph = decode_track_sections(&data).unwrap();

        assert_eq!(graph.walk_forward(0).count(), 2);
        assert_eq!(graph.walk_forward(5).count(), 0);
    }

    #[test]
    fn test_trailing_partial_record_is_ignored() {
        let mut data = section_bytes(&[RawSection::linked(-1, -1)]);
        data.extend_from_slice(&[0; TRACK_SECTION_LEN - 1]);
        assert_eq!(decode_track_sections(&data).unwrap().len(), 1);
    }
}
