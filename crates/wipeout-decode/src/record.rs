//! Primitive record decoding.
//!
//! Every primitive record starts with a 2-byte tag and a 2-byte flags word,
//! followed by a payload whose length is fixed by the tag. Payloads are
//! decoded from a slice of exactly that length, so a rejected record never
//! moves the surrounding stream out of step.

use crate::cursor::Cursor;
use crate::error::{DecodeError, DecodeResult};
use crate::mesh::{Polygon, Rgba, Uv};

/// Bytes taken by the tag and flags words that open every record.
pub const RECORD_HEADER_LEN: usize = 4;

/// Every record kind the container format can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    FlatTriangle,
    FlatTexturedTriangle,
    FlatQuad,
    FlatTexturedQuad,
    GouraudTriangle,
    GouraudTexturedTriangle,
    GouraudQuad,
    GouraudTexturedQuad,
    TransparentSprite,
    BillboardSprite,
    LitFlatTriangle,
    LitFlatTexturedTriangle,
    LitFlatQuad,
    LitFlatTexturedQuad,
    LitGouraudTriangle,
    LitGouraudTexturedTriangle,
    Spline,
    InfiniteLight,
    PointLight,
    SpotLight,
}

impl PrimitiveKind {
    /// All kinds, in tag order.
    pub const ALL: [Self; 20] = [
        Self::FlatTriangle,
        Self::FlatTexturedTriangle,
        Self::FlatQuad,
        Self::FlatTexturedQuad,
        Self::GouraudTriangle,
        Self::GouraudTexturedTriangle,
        Self::GouraudQuad,
        Self::GouraudTexturedQuad,
        Self::TransparentSprite,
        Self::BillboardSprite,
        Self::LitFlatTriangle,
        Self::LitFlatTexturedTriangle,
        Self::LitFlatQuad,
        Self::LitFlatTexturedQuad,
        Self::LitGouraudTriangle,
        Self::LitGouraudTexturedTriangle,
        Self::Spline,
        Self::InfiniteLight,
        Self::PointLight,
        Self::SpotLight,
    ];

    /// Look up the kind for a record tag.
    #[must_use]
    pub fn from_tag(tag: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// The on-disk tag.
    #[must_use]
    pub const fn tag(self) -> i16 {
        match self {
            Self::FlatTriangle => 1,
            Self::FlatTexturedTriangle => 2,
            Self::FlatQuad => 3,
            Self::FlatTexturedQuad => 4,
            Self::GouraudTriangle => 5,
            Self::GouraudTexturedTriangle => 6,
            Self::GouraudQuad => 7,
            Self::GouraudTexturedQuad => 8,
            Self::TransparentSprite => 10,
            Self::BillboardSprite => 11,
            Self::LitFlatTriangle => 12,
            Self::LitFlatTexturedTriangle => 13,
            Self::LitFlatQuad => 14,
            Self::LitFlatTexturedQuad => 15,
            Self::LitGouraudTriangle => 16,
            Self::LitGouraudTexturedTriangle => 17,
            Self::Spline => 20,
            Self::InfiniteLight => 21,
            Self::PointLight => 22,
            Self::SpotLight => 23,
        }
    }

    /// Payload bytes following the 4-byte record header.
    #[must_use]
    pub const fn payload_len(self) -> usize {
        match self {
            Self::FlatTriangle
            | Self::FlatQuad
            | Self::LitFlatTriangle
            | Self::InfiniteLight => 12,
            Self::TransparentSprite | Self::BillboardSprite => 14,
            Self::LitFlatQuad => 16,
            Self::GouraudTriangle => 20,
            Self::FlatTexturedTriangle
            | Self::GouraudQuad
            | Self::LitFlatTexturedTriangle
            | Self::LitGouraudTriangle
            | Self::PointLight => 24,
            Self::FlatTexturedQuad => 28,
            Self::LitFlatTexturedQuad => 30,
            Self::GouraudTexturedTriangle => 32,
            Self::LitGouraudTexturedTriangle | Self::SpotLight => 36,
            Self::GouraudTexturedQuad => 40,
            Self::Spline => 52,
        }
    }

    /// Number of polygons a well-formed record of this kind produces.
    #[must_use]
    pub const fn polygon_count(self) -> usize {
        match self {
            Self::FlatTriangle
            | Self::FlatTexturedTriangle
            | Self::FlatQuad
            | Self::FlatTexturedQuad
            | Self::GouraudTriangle
            | Self::GouraudTexturedTriangle
            | Self::GouraudQuad
            | Self::LitFlatTriangle
            | Self::LitFlatTexturedTriangle => 1,
            Self::GouraudTexturedQuad => 2,
            // Light-sourced quads and Gouraud variants await lighting support.
            Self::LitFlatQuad
            | Self::LitFlatTexturedQuad
            | Self::LitGouraudTriangle
            | Self::LitGouraudTexturedTriangle
            | Self::TransparentSprite
            | Self::BillboardSprite
            | Self::Spline
            | Self::InfiniteLight
            | Self::PointLight
            | Self::SpotLight => 0,
        }
    }
}

/// One primitive record split out of a stream.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub kind: PrimitiveKind,
    pub flags: u16,
    /// Offset of the record's tag in the source buffer.
    pub offset: usize,
    /// Exactly [`PrimitiveKind::payload_len`] bytes.
    pub payload: &'a [u8],
}

impl Record<'_> {
    /// Bytes the record occupies, header included.
    #[must_use]
    pub fn total_len(&self) -> usize {
        RECORD_HEADER_LEN + self.payload.len()
    }
}

/// Split the next record off the cursor.
///
/// An unknown tag is a hard failure: its length cannot be known, so nothing
/// after it can be trusted.
pub fn next_record<'a>(cursor: &mut Cursor<'a>) -> DecodeResult<Record<'a>> {
    let offset = cursor.position();
    let tag = cursor.read_i16()?;
    let flags = cursor.read_u16()?;
    let kind =
        PrimitiveKind::from_tag(tag).ok_or(DecodeError::UnknownPrimitive { tag, offset })?;
    let payload = cursor.read_bytes(kind.payload_len())?;

    Ok(Record {
        kind,
        flags,
        offset,
        payload,
    })
}

/// Polygons produced by one record: zero, one or two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emitted {
    None,
    One(Polygon),
    Two(Polygon, Polygon),
}

impl Emitted {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::One(_) => 1,
            Self::Two(..) => 2,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl IntoIterator for Emitted {
    type Item = Polygon;
    type IntoIter =
        std::iter::Chain<std::option::IntoIter<Polygon>, std::option::IntoIter<Polygon>>;

    fn into_iter(self) -> Self::IntoIter {
        let (first, second) = match self {
            Self::None => (None, None),
            Self::One(a) => (Some(a), None),
            Self::Two(a, b) => (Some(a), Some(b)),
        };
        first.into_iter().chain(second)
    }
}

/// Decode the polygons of a record.
///
/// Every vertex index is checked against `vertex_count`; a record that
/// references a missing vertex fails with [`DecodeError::IndexOutOfBounds`]
/// and the caller may skip it.
pub fn decode_record(record: &Record<'_>, vertex_count: usize) -> DecodeResult<Emitted> {
    let mut payload = Payload {
        cursor: Cursor::new(record.payload),
        vertex_count,
    };

    let emitted = match record.kind {
        PrimitiveKind::FlatTriangle => {
            let indices = payload.indices::<3>()?;
            payload.pad()?;
            let color = payload.color()?;
            Emitted::One(Polygon::FlatTriangle { indices, color })
        }
        PrimitiveKind::FlatTexturedTriangle => {
            let indices = payload.indices::<3>()?;
            let texture = payload.texture()?;
            let uvs = payload.uvs::<3>()?;
            payload.pad()?;
            let color = payload.color()?;
            Emitted::One(Polygon::FlatTexturedTriangle {
                indices,
                texture,
                uvs,
                color,
            })
        }
        PrimitiveKind::FlatQuad => {
            let indices = payload.indices::<4>()?;
            let color = payload.color()?;
            Emitted::One(Polygon::FlatQuad { indices, color })
        }
        PrimitiveKind::FlatTexturedQuad => {
            let indices = payload.indices::<4>()?;
            let texture = payload.texture()?;
            let uvs = payload.uvs::<4>()?;
            payload.pad()?;
            let color = payload.color()?;
            Emitted::One(Polygon::FlatTexturedQuad {
                indices,
                texture,
                uvs,
                color,
            })
        }
        PrimitiveKind::GouraudTriangle => {
            let indices = payload.indices::<3>()?;
            payload.pad()?;
            let colors = payload.colors::<3>()?;
            Emitted::One(Polygon::GouraudTriangle { indices, colors })
        }
        PrimitiveKind::GouraudTexturedTriangle => {
            let indices = payload.indices::<3>()?;
            let texture = payload.texture()?;
            let uvs = payload.uvs::<3>()?;
            payload.pad()?;
            let colors = payload.colors::<3>()?;
            Emitted::One(Polygon::GouraudTexturedTriangle {
                indices,
                texture,
                uvs,
                colors,
            })
        }
        PrimitiveKind::GouraudQuad => {
            let indices = payload.indices::<4>()?;
            let colors = payload.colors::<4>()?;
            Emitted::One(Polygon::GouraudQuad { indices, colors })
        }
        PrimitiveKind::GouraudTexturedQuad => {
            let [i0, i1, i2, i3] = payload.indices::<4>()?;
            let texture = payload.texture()?;
            let [uv0, uv1, uv2, uv3] = payload.uvs::<4>()?;
            payload.pad()?;
            let [c0, c1, c2, c3] = payload.colors::<4>()?;

            // The second triangle uses the (i1, i3, i2) diagonal.
            Emitted::Two(
                Polygon::GouraudTexturedTriangle {
                    indices: [i0, i1, i2],
                    texture,
                    uvs: [uv0, uv1, uv2],
                    colors: [c0, c1, c2],
                },
                Polygon::GouraudTexturedTriangle {
                    indices: [i1, i3, i2],
                    texture,
                    uvs: [uv1, uv3, uv2],
                    colors: [c1, c3, c2],
                },
            )
        }
        PrimitiveKind::LitFlatTriangle => {
            let indices = payload.indices::<3>()?;
            let _normal = payload.cursor.read_i16()?;
            let color = payload.color()?;
            Emitted::One(Polygon::LitFlatTriangle { indices, color })
        }
        PrimitiveKind::LitFlatTexturedTriangle => {
            let indices = payload.indices::<3>()?;
            let _normal = payload.cursor.read_i16()?;
            let texture = payload.texture()?;
            let uvs = payload.uvs::<3>()?;
            let color = payload.color()?;
            Emitted::One(Polygon::LitFlatTexturedTriangle {
                indices,
                texture,
                uvs,
                color,
            })
        }
        PrimitiveKind::LitFlatQuad
        | PrimitiveKind::LitFlatTexturedQuad
        | PrimitiveKind::LitGouraudTriangle
        | PrimitiveKind::LitGouraudTexturedTriangle
        | PrimitiveKind::TransparentSprite
        | PrimitiveKind::BillboardSprite
        | PrimitiveKind::Spline
        | PrimitiveKind::InfiniteLight
        | PrimitiveKind::PointLight
        | PrimitiveKind::SpotLight => return Ok(Emitted::None),
    };

    debug_assert!(
        payload.cursor.is_empty(),
        "{:?} payload not fully consumed",
        record.kind
    );
    Ok(emitted)
}

/// Field readers shared by the record layouts.
struct Payload<'a> {
    cursor: Cursor<'a>,
    vertex_count: usize,
}

impl Payload<'_> {
    fn indices<const N: usize>(&mut self) -> DecodeResult<[u16; N]> {
        let mut indices = [0; N];
        for index in &mut indices {
            let raw = self.cursor.read_i16()?;
            let unsigned = raw.cast_unsigned();
            if raw < 0 || usize::from(unsigned) >= self.vertex_count {
                return Err(DecodeError::IndexOutOfBounds {
                    index: usize::from(unsigned),
                    len: self.vertex_count,
                });
            }
            *index = unsigned;
        }
        Ok(indices)
    }

    /// Texture id followed by the CLUT and texture-page words, which are unused.
    fn texture(&mut self) -> DecodeResult<i16> {
        let texture = self.cursor.read_i16()?;
        let _cba = self.cursor.read_u16()?;
        let _tsb = self.cursor.read_u16()?;
        Ok(texture)
    }

    fn uvs<const N: usize>(&mut self) -> DecodeResult<[Uv; N]> {
        let mut uvs = [Uv::default(); N];
        for uv in &mut uvs {
            *uv = Uv::new(self.cursor.read_u8()?, self.cursor.read_u8()?);
        }
        Ok(uvs)
    }

    fn pad(&mut self) -> DecodeResult<()> {
        self.cursor.skip(2)
    }

    fn color(&mut self) -> DecodeResult<Rgba> {
        Ok(Rgba::from_packed(self.cursor.read_u32()?))
    }

    fn colors<const N: usize>(&mut self) -> DecodeResult<[Rgba; N]> {
        let mut colors = [Rgba::default(); N];
        for color in &mut colors {
            *color = self.color()?;
        }
        Ok(colors)
    }
}
